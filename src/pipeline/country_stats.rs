//! Country aggregator: averages over each country's top-50-by-weighted-pp
//! cohort. Countries that cannot field a full cohort are skipped this cycle.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tokio::time::Instant;
use tracing::info;

use crate::models::{CountryData, Profile, ProfileData};
use crate::store::Store;

pub const COHORT_SIZE: usize = 50;

/// Build the country aggregates. Profiles are walked in weighted-pp
/// descending order; each country's first `COHORT_SIZE` profiles form its
/// cohort and anything beyond is ignored. Only full cohorts materialize.
pub fn aggregate_countries(
    profile_datas: &[ProfileData],
    country_of: &HashMap<String, String>,
) -> Vec<CountryData> {
    let mut ordered: Vec<&ProfileData> = profile_datas.iter().collect();
    ordered.sort_by(|a, b| b.weighted_pp.total_cmp(&a.weighted_pp));

    // BTreeMap keeps the output order deterministic across cycles.
    let mut cohorts: BTreeMap<&str, Vec<&ProfileData>> = BTreeMap::new();
    for data in ordered {
        let Some(country) = country_of.get(&data.ssid) else {
            continue;
        };
        let cohort = cohorts.entry(country.as_str()).or_default();
        if cohort.len() < COHORT_SIZE {
            cohort.push(data);
        }
    }

    cohorts
        .into_iter()
        .filter(|(_, cohort)| cohort.len() == COHORT_SIZE)
        .map(|(country, cohort)| average_cohort(country, &cohort))
        .collect()
}

fn average_cohort(country: &str, cohort: &[&ProfileData]) -> CountryData {
    let mut data = CountryData {
        country: country.to_string(),
        ..CountryData::default()
    };

    for member in cohort {
        data.weighted_pp_average += member.weighted_pp;
        data.raw_pp_average += member.raw_pp;
        data.average_score_percentage += member.average_score_percentage;
        data.best_rank_average += member.best_rank as f64;
        data.weighted_rank_average += member.weighted_average_rank;
        data.rank_average += member.average_rank;
        data.weighted_average_score_percentage += member.weighted_average_score_percentage;
        data.top_pp_average += member.top_pp;
        // Count-type metrics are summed, not averaged.
        data.ranked_played_sum += member.ranked_played;
        data.above_95_sum += member.above_95;
        data.above_325_sum += member.above_325;
        data.top_tens_sum += member.top_tens;
    }

    let n = COHORT_SIZE as f64;
    data.weighted_pp_average /= n;
    data.raw_pp_average /= n;
    data.average_score_percentage /= n;
    data.best_rank_average /= n;
    data.weighted_rank_average /= n;
    data.rank_average /= n;
    data.weighted_average_score_percentage /= n;
    data.top_pp_average /= n;

    data
}

pub async fn run(
    store: &Store,
    profile_datas: &[ProfileData],
    profiles: &[Profile],
) -> Result<Vec<CountryData>> {
    let started = Instant::now();
    let country_of: HashMap<String, String> = profiles
        .iter()
        .map(|p| (p.ssid.clone(), p.country.clone()))
        .collect();

    let country_datas = aggregate_countries(profile_datas, &country_of);
    for data in &country_datas {
        store.replace_country_data(data).await?;
    }

    info!(
        elapsed = ?started.elapsed(),
        countries = country_datas.len(),
        "country data generated"
    );
    Ok(country_datas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_data(ssid: &str, weighted_pp: f64) -> ProfileData {
        ProfileData {
            ssid: ssid.to_string(),
            weighted_pp,
            raw_pp: weighted_pp + 10.0,
            average_score_percentage: 0.9,
            best_rank: 5,
            weighted_average_rank: 20.0,
            average_rank: 30.0,
            weighted_average_score_percentage: 0.92,
            top_pp: weighted_pp / 2.0,
            ranked_played: 3,
            above_95: 1,
            above_325: 2,
            top_tens: 1,
            ..ProfileData::default()
        }
    }

    fn populate(country: &str, count: usize, base_pp: f64) -> (Vec<ProfileData>, HashMap<String, String>) {
        let mut datas = Vec::new();
        let mut country_of = HashMap::new();
        for i in 0..count {
            let ssid = format!("{country}-{i}");
            datas.push(profile_data(&ssid, base_pp - i as f64));
            country_of.insert(ssid, country.to_string());
        }
        (datas, country_of)
    }

    #[test]
    fn under_full_cohort_is_skipped() {
        let (datas, country_of) = populate("FR", COHORT_SIZE - 1, 1000.0);
        assert!(aggregate_countries(&datas, &country_of).is_empty());
    }

    #[test]
    fn exactly_full_cohort_materializes() {
        let (datas, country_of) = populate("FR", COHORT_SIZE, 1000.0);
        let out = aggregate_countries(&datas, &country_of);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].country, "FR");
    }

    #[test]
    fn cohort_never_exceeds_fifty_members() {
        // 60 players: only the top 50 by weighted pp may contribute.
        let (datas, country_of) = populate("FR", 60, 1000.0);
        let out = aggregate_countries(&datas, &country_of);
        assert_eq!(out.len(), 1);

        // Top 50 weighted pp are 1000..951; their mean is 975.5.
        assert!((out[0].weighted_pp_average - 975.5).abs() < 1e-9);
        // Sums likewise cover exactly 50 members.
        assert_eq!(out[0].ranked_played_sum, 50 * 3);
        assert_eq!(out[0].above_95_sum, 50);
        assert_eq!(out[0].above_325_sum, 100);
        assert_eq!(out[0].top_tens_sum, 50);
    }

    #[test]
    fn metrics_are_exact_arithmetic_means() {
        let (datas, country_of) = populate("DE", COHORT_SIZE, 500.0);
        let out = aggregate_countries(&datas, &country_of);
        let data = &out[0];

        let expected_weighted: f64 =
            (0..COHORT_SIZE).map(|i| 500.0 - i as f64).sum::<f64>() / COHORT_SIZE as f64;
        assert!((data.weighted_pp_average - expected_weighted).abs() < 1e-9);
        assert!((data.raw_pp_average - (expected_weighted + 10.0)).abs() < 1e-9);
        assert!((data.average_score_percentage - 0.9).abs() < 1e-9);
        assert!((data.best_rank_average - 5.0).abs() < 1e-9);
        assert!((data.weighted_rank_average - 20.0).abs() < 1e-9);
        assert!((data.rank_average - 30.0).abs() < 1e-9);
        assert!((data.weighted_average_score_percentage - 0.92).abs() < 1e-9);
        assert!((data.top_pp_average - expected_weighted / 2.0).abs() < 1e-9);
    }

    #[test]
    fn countries_are_independent() {
        let (mut datas, mut country_of) = populate("FR", COHORT_SIZE, 1000.0);
        let (de_datas, de_countries) = populate("DE", 10, 2000.0);
        datas.extend(de_datas);
        country_of.extend(de_countries);

        let out = aggregate_countries(&datas, &country_of);
        // DE's 10 high performers don't make a cohort; FR still does.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].country, "FR");
    }
}
