//! Rank engine: per map, recompute the global and per-country rank of every
//! stored score.

use std::collections::HashMap;

use anyhow::Result;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::models::{Map, Profile, Score};
use crate::store::Store;

/// Rank one map's scores: descending by value, ties broken by descending
/// submission timestamp (the later submission ranks higher). Global rank is
/// the 1-based position; country rank is a per-country running counter in
/// the same order.
pub fn rank_map_scores(
    mut scores: Vec<Score>,
    country_of: &HashMap<String, String>,
) -> Vec<Score> {
    scores.sort_by(|a, b| b.score.cmp(&a.score).then(b.time_set.cmp(&a.time_set)));

    let mut country_counters: HashMap<&str, u32> = HashMap::new();
    for (idx, score) in scores.iter_mut().enumerate() {
        score.rank = idx as u32 + 1;
        // Scores are only ingested for rostered profiles, so every owner
        // should resolve to a country. An orphaned score still gets ranked,
        // in a shared ownerless bucket, but loudly.
        let country = match country_of.get(&score.ssid) {
            Some(country) => country.as_str(),
            None => {
                warn!(ssid = %score.ssid, ldid = %score.ldid, "score owner has no profile");
                ""
            }
        };
        let counter = country_counters.entry(country).or_insert(0);
        *counter += 1;
        score.country_rank = *counter;
    }

    scores
}

/// Rank every map's scores and persist only the ones whose rank or country
/// rank actually changed.
pub async fn run(
    store: &Store,
    scores: Vec<Score>,
    maps: &[Map],
    profiles: &[Profile],
) -> Result<Vec<Score>> {
    let started = Instant::now();
    let country_of: HashMap<String, String> = profiles
        .iter()
        .map(|p| (p.ssid.clone(), p.country.clone()))
        .collect();

    let mut by_map: HashMap<String, Vec<Score>> = HashMap::new();
    for score in scores {
        by_map.entry(score.ldid.clone()).or_default().push(score);
    }

    let mut ranked_all = Vec::new();
    let mut written = 0usize;
    for map in maps {
        let Some(map_scores) = by_map.remove(&map.ldid) else {
            continue;
        };
        // One score per (ssid, ldid), so ssid identifies the previous ranks.
        let previous: HashMap<String, (u32, u32)> = map_scores
            .iter()
            .map(|s| (s.ssid.clone(), (s.rank, s.country_rank)))
            .collect();

        let ranked = rank_map_scores(map_scores, &country_of);
        for score in &ranked {
            let changed = previous
                .get(&score.ssid)
                .map(|&(rank, country_rank)| {
                    rank != score.rank || country_rank != score.country_rank
                })
                .unwrap_or(true);
            if changed {
                store.replace_score(score).await?;
                written += 1;
            }
        }
        ranked_all.extend(ranked);
    }

    info!(
        elapsed = ?started.elapsed(),
        maps = maps.len(),
        rewritten = written,
        "ranks generated"
    );
    Ok(ranked_all)
}
