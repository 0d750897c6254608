//! Profile aggregator: weighted and unweighted performance statistics per
//! player, folded over the player's scores in descending-pp order.

use std::collections::HashMap;

use anyhow::Result;
use tokio::time::Instant;
use tracing::info;

use crate::models::{Map, Profile, ProfileData, Score};
use crate::store::Store;

/// Positional weight base: score j (0-based, pp-descending) weighs 0.965^j.
pub const WEIGHT_FALLOFF: f64 = 0.965;

/// Aggregate one player's scores. Returns `None` for a player with no
/// stored scores; averages over an empty set are meaningless and such a
/// player cannot appear on any board.
pub fn aggregate_profile(
    ssid: &str,
    mut scores: Vec<&Score>,
    max_by_map: &HashMap<&str, i64>,
) -> Option<ProfileData> {
    if scores.is_empty() {
        return None;
    }
    scores.sort_by(|a, b| b.pp.total_cmp(&a.pp));

    let mut data = ProfileData {
        ssid: ssid.to_string(),
        ..ProfileData::default()
    };
    let mut weight_sum = 0.0;

    for (j, score) in scores.iter().enumerate() {
        let weight = WEIGHT_FALLOFF.powi(j as i32);
        weight_sum += weight;
        let max = max_by_map.get(score.ldid.as_str()).copied().unwrap_or(0);
        let percent = if max > 0 {
            score.score as f64 / max as f64
        } else {
            0.0
        };

        data.weighted_pp += score.pp * weight;
        data.raw_pp += score.pp;
        data.average_score_percentage += percent;
        data.weighted_average_score_percentage += percent * weight;
        data.average_rank += score.rank as f64;
        data.weighted_average_rank += score.rank as f64 * weight;
        data.average_country_rank += score.country_rank as f64;
        data.weighted_average_country_rank += score.country_rank as f64 * weight;
        data.ranked_played += 1;

        if score.pp > 325.0 {
            data.above_325 += 1;
        }
        if data.best_rank == 0 || score.rank < data.best_rank {
            data.best_rank = score.rank;
        }
        if percent > 0.95 {
            data.above_95 += 1;
        }
        if data.top_pp == 0.0 {
            // First in pp-descending order, hence the highest.
            data.top_pp = score.pp;
        }
        if score.country_rank == 1 {
            data.country_firsts += 1;
        }
        if score.rank == 1 {
            data.firsts += 1;
        }
        if score.rank <= 10 {
            data.top_tens += 1;
        }

        // First crossing in pp order, not percentage order: a later,
        // lower-pp score may be the one that first exceeds a threshold.
        if percent > 0.99 && data.highest_99 == 0.0 {
            data.highest_99 = score.pp;
        }
        if percent > 0.98 && data.highest_98 == 0.0 {
            data.highest_98 = score.pp;
        }
        if percent > 0.97 && data.highest_97 == 0.0 {
            data.highest_97 = score.pp;
        }
        if percent > 0.96 && data.highest_96 == 0.0 {
            data.highest_96 = score.pp;
        }
    }

    let played = data.ranked_played as f64;
    data.average_score_percentage /= played;
    data.weighted_average_score_percentage /= weight_sum;
    data.average_rank /= played;
    data.weighted_average_rank /= weight_sum;
    data.average_country_rank /= played;
    data.weighted_average_country_rank /= weight_sum;

    Some(data)
}

/// Recompute and persist every player's aggregate as a full replace.
pub async fn run(
    store: &Store,
    scores: &[Score],
    maps: &[Map],
    profiles: &[Profile],
) -> Result<Vec<ProfileData>> {
    let started = Instant::now();
    let max_by_map: HashMap<&str, i64> =
        maps.iter().map(|m| (m.ldid.as_str(), m.max_score)).collect();

    let mut by_player: HashMap<&str, Vec<&Score>> = HashMap::new();
    for score in scores {
        by_player.entry(score.ssid.as_str()).or_default().push(score);
    }

    let mut out = Vec::new();
    for profile in profiles {
        let Some(player_scores) = by_player.remove(profile.ssid.as_str()) else {
            continue;
        };
        if let Some(data) = aggregate_profile(&profile.ssid, player_scores, &max_by_map) {
            store.replace_profile_data(&data).await?;
            out.push(data);
        }
    }

    info!(
        elapsed = ?started.elapsed(),
        players = out.len(),
        "profile data generated"
    );
    Ok(out)
}
