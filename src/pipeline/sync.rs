//! Score synchronizer: for every profile, incrementally fetch new scores
//! since the profile's last-seen timestamp, filter invalid submissions,
//! discover new maps, and upsert everything with replace semantics.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::models::ScoreEntry;
use crate::api::ScoreSource;
use crate::error::ApiError;
use crate::models::{Map, Profile, Score};
use crate::store::Store;

/// Per-modifier multiplier deltas, applied on top of a 1.0 base.
pub const MODIFIER_DELTAS: &[(&str, f64)] = &[
    ("DA", 0.02),
    ("SS", -0.30),
    ("FS", 0.08),
    ("SF", 0.10),
    ("GN", 0.04),
    ("NA", -0.30),
    ("NB", -0.10),
    ("NF", -0.50),
    ("NO", -0.05),
];

/// Total multiplier for a comma-separated modifier list. Each known code
/// counts once regardless of repetition; unknown codes are ignored.
pub fn modifier_multiplier(mods: &str) -> f64 {
    let present: Vec<&str> = mods.split(',').map(str::trim).collect();
    1.0 + MODIFIER_DELTAS
        .iter()
        .filter(|(code, _)| present.contains(code))
        .map(|(_, delta)| delta)
        .sum::<f64>()
}

/// The score value to store, or `None` when the submission must be
/// discarded. No modifiers: the raw value. Modifiers with a multiplier
/// below 1.0: discarded. Otherwise the unmodified value, so boosted runs
/// don't inflate the board.
pub fn effective_value(entry: &ScoreEntry) -> Option<i64> {
    let mods = entry.mods.trim();
    if mods.is_empty() {
        return Some(entry.score);
    }
    if modifier_multiplier(mods) < 1.0 {
        None
    } else {
        Some(entry.unmodified_score)
    }
}

/// A score accepted for ingestion, still carrying the map's max score so
/// unseen maps can be registered before the score is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedScore {
    pub score: Score,
    pub max_score: i64,
}

/// Immutable result of scanning one profile's pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileScan {
    pub ingested: Vec<IngestedScore>,
    /// New `last` value to persist, when the stored one is stale. Existing
    /// profiles take the first page's newest score timestamp; new profiles
    /// take `now`, because their top-performance listing is not
    /// chronologically ordered.
    pub new_last: Option<DateTime<Utc>>,
}

/// Page through one profile's scores. New profiles (no `last`) read the
/// top-performance listing, where ranked scores surface first; everyone
/// else reads the recent-activity listing. Scanning stops at an empty page,
/// at a page whose first score is unranked (new profiles only), or at the
/// first score not newer than the stored `last` boundary.
pub async fn scan_profile<S: ScoreSource>(
    source: &S,
    profile: &Profile,
    now: DateTime<Utc>,
) -> Result<ProfileScan, ApiError> {
    let is_new = profile.last.is_none();
    let boundary = profile.last;
    let mut scan = ProfileScan::default();
    let mut page: u32 = 1;

    'pages: loop {
        let response = if is_new {
            source.top_scores(&profile.ssid, page).await?
        } else {
            source.recent_scores(&profile.ssid, page).await?
        };

        let Some(first) = response.scores.first() else {
            break;
        };
        if is_new && first.pp == 0.0 {
            break;
        }

        if page == 1 && boundary != Some(first.time_set) {
            scan.new_last = Some(if is_new { now } else { first.time_set });
        }

        for entry in &response.scores {
            if let Some(last) = boundary {
                if entry.time_set <= last {
                    break 'pages;
                }
            }
            if entry.pp <= 0.0 {
                continue;
            }
            let Some(value) = effective_value(entry) else {
                continue;
            };
            scan.ingested.push(IngestedScore {
                score: Score {
                    ssid: profile.ssid.clone(),
                    ldid: entry.leaderboard_id.to_string(),
                    score: value,
                    pp: entry.pp,
                    time_set: entry.time_set,
                    rank: 0,
                    country_rank: 0,
                },
                max_score: entry.max_score,
            });
        }

        page += 1;
    }

    Ok(scan)
}

/// Scan every profile, persist what the scans produced, and hand back the
/// refreshed map list plus the full stored score set for the rank engine.
pub async fn run<S: ScoreSource>(
    store: &Store,
    source: &S,
    profiles: &[Profile],
) -> Result<(Vec<Map>, Vec<Score>)> {
    let started = Instant::now();
    let mut maps = store.load_maps().await?;
    let mut known: HashSet<String> = maps.iter().map(|m| m.ldid.clone()).collect();
    let mut total = 0usize;

    for profile in profiles {
        let scan = scan_profile(source, profile, Utc::now()).await?;

        for ingested in &scan.ingested {
            if known.insert(ingested.score.ldid.clone()) {
                let map = Map {
                    ldid: ingested.score.ldid.clone(),
                    max_score: ingested.max_score,
                };
                store.insert_map(&map).await?;
                maps.push(map);
            }
            store.replace_score(&ingested.score).await?;
        }
        if let Some(last) = scan.new_last {
            store.update_profile_last(&profile.ssid, last).await?;
        }

        total += scan.ingested.len();
        debug!(
            ssid = %profile.ssid,
            nickname = %profile.nickname,
            scores = scan.ingested.len(),
            "profile synchronized"
        );
    }

    let scores = store.load_scores().await?;
    info!(
        elapsed = ?started.elapsed(),
        ingested = total,
        stored = scores.len(),
        "player scores refreshed"
    );
    Ok((maps, scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{RosterPage, ScoresPage};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;

    struct FakeSource {
        recent: HashMap<(String, u32), ScoresPage>,
        top: HashMap<(String, u32), ScoresPage>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                recent: HashMap::new(),
                top: HashMap::new(),
            }
        }

        fn recent_page(mut self, ssid: &str, page: u32, scores: Vec<ScoreEntry>) -> Self {
            self.recent.insert((ssid.to_string(), page), ScoresPage { scores });
            self
        }

        fn top_page(mut self, ssid: &str, page: u32, scores: Vec<ScoreEntry>) -> Self {
            self.top.insert((ssid.to_string(), page), ScoresPage { scores });
            self
        }
    }

    #[async_trait]
    impl ScoreSource for FakeSource {
        async fn roster_page(&self, _page: u32) -> Result<RosterPage, ApiError> {
            Ok(RosterPage::default())
        }

        async fn recent_scores(&self, ssid: &str, page: u32) -> Result<ScoresPage, ApiError> {
            Ok(self
                .recent
                .get(&(ssid.to_string(), page))
                .cloned()
                .unwrap_or_default())
        }

        async fn top_scores(&self, ssid: &str, page: u32) -> Result<ScoresPage, ApiError> {
            Ok(self
                .top
                .get(&(ssid.to_string(), page))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn entry(ldid: i64, score: i64, mods: &str, time_secs: i64, pp: f64) -> ScoreEntry {
        ScoreEntry {
            leaderboard_id: ldid,
            score,
            // Boosted runs report a lower unmodified value.
            unmodified_score: score - 1000,
            max_score: 1_000_000,
            mods: mods.to_string(),
            time_set: ts(time_secs),
            pp,
        }
    }

    fn new_profile(ssid: &str) -> Profile {
        Profile {
            ssid: ssid.to_string(),
            nickname: "p".to_string(),
            avatar_path: String::new(),
            country: "FR".to_string(),
            last: None,
        }
    }

    fn existing_profile(ssid: &str, last_secs: i64) -> Profile {
        Profile {
            last: Some(ts(last_secs)),
            ..new_profile(ssid)
        }
    }

    #[test]
    fn multiplier_applies_table_deltas() {
        assert!((modifier_multiplier("DA") - 1.02).abs() < 1e-9);
        assert!((modifier_multiplier("GN,DA") - 1.06).abs() < 1e-9);
        assert!(modifier_multiplier("NF") < 1.0);
        // Unknown codes contribute nothing.
        assert_eq!(modifier_multiplier("ZZ"), 1.0);
    }

    #[test]
    fn negative_modifier_runs_are_discarded() {
        let e = entry(1, 500_000, "SS", 10, 100.0);
        assert_eq!(effective_value(&e), None);
        // A boost does not rescue a net-negative combination.
        let e = entry(1, 500_000, "NF,DA", 10, 100.0);
        assert_eq!(effective_value(&e), None);
    }

    #[test]
    fn boosted_runs_store_the_unmodified_value() {
        let e = entry(1, 500_000, "SF", 10, 100.0);
        assert_eq!(effective_value(&e), Some(499_000));
        // Net-1.0 combinations with modifiers present also take the
        // unmodified value.
        let e = entry(1, 500_000, "SF,NB", 10, 100.0);
        assert_eq!(effective_value(&e), Some(499_000));
    }

    #[test]
    fn plain_runs_store_the_raw_value() {
        let e = entry(1, 500_000, "", 10, 100.0);
        assert_eq!(effective_value(&e), Some(500_000));
    }

    #[tokio::test]
    async fn existing_profile_stops_at_last_boundary() {
        let profile = existing_profile("p1", 50);
        let source = FakeSource::new().recent_page(
            "p1",
            1,
            vec![
                entry(10, 900_000, "", 80, 200.0),
                entry(11, 800_000, "", 60, 150.0),
                // Exactly at the boundary: already covered by a previous cycle.
                entry(12, 700_000, "", 50, 120.0),
                entry(13, 600_000, "", 40, 110.0),
            ],
        );

        let scan = scan_profile(&source, &profile, ts(1000)).await.unwrap();

        assert_eq!(scan.ingested.len(), 2);
        assert_eq!(scan.ingested[0].score.ldid, "10");
        assert_eq!(scan.ingested[1].score.ldid, "11");
        // Seeded from the newest score on the first page, not the fetch time.
        assert_eq!(scan.new_last, Some(ts(80)));
    }

    #[tokio::test]
    async fn new_profile_last_uses_fetch_time() {
        let profile = new_profile("p1");
        let now = ts(9999);
        let source = FakeSource::new().top_page("p1", 1, vec![entry(10, 900_000, "", 80, 200.0)]);

        let scan = scan_profile(&source, &profile, now).await.unwrap();

        // The top listing is not chronological, so the score's own timestamp
        // would be wrong here.
        assert_eq!(scan.new_last, Some(now));
        assert_eq!(scan.ingested.len(), 1);
    }

    #[tokio::test]
    async fn new_profile_with_no_ranked_scores_scans_nothing() {
        let profile = new_profile("p1");
        let source = FakeSource::new().top_page(
            "p1",
            1,
            vec![entry(10, 900_000, "", 80, 0.0), entry(11, 800_000, "", 70, 0.0)],
        );

        let scan = scan_profile(&source, &profile, ts(1000)).await.unwrap();

        assert!(scan.ingested.is_empty());
        assert_eq!(scan.new_last, None);
    }

    #[tokio::test]
    async fn new_profile_pages_until_unranked_page_start() {
        let profile = new_profile("p1");
        let source = FakeSource::new()
            .top_page("p1", 1, vec![entry(10, 900_000, "", 80, 200.0)])
            .top_page("p1", 2, vec![entry(11, 800_000, "", 70, 150.0)])
            // Page starting with an unranked score ends the scan.
            .top_page("p1", 3, vec![entry(12, 700_000, "", 60, 0.0)]);

        let scan = scan_profile(&source, &profile, ts(1000)).await.unwrap();

        assert_eq!(scan.ingested.len(), 2);
    }

    #[tokio::test]
    async fn unranked_scores_mid_page_are_skipped() {
        let profile = existing_profile("p1", 10);
        let source = FakeSource::new().recent_page(
            "p1",
            1,
            vec![
                entry(10, 900_000, "", 80, 200.0),
                entry(11, 800_000, "", 70, 0.0),
                entry(12, 700_000, "", 60, 120.0),
            ],
        );

        let scan = scan_profile(&source, &profile, ts(1000)).await.unwrap();

        let ldids: Vec<&str> = scan.ingested.iter().map(|i| i.score.ldid.as_str()).collect();
        assert_eq!(ldids, vec!["10", "12"]);
    }

    #[tokio::test]
    async fn rescan_with_no_new_remote_data_is_a_no_op() {
        let profile = existing_profile("p1", 80);
        let source = FakeSource::new().recent_page(
            "p1",
            1,
            vec![entry(10, 900_000, "", 80, 200.0), entry(11, 800_000, "", 60, 150.0)],
        );

        let scan = scan_profile(&source, &profile, ts(1000)).await.unwrap();

        assert!(scan.ingested.is_empty());
        assert_eq!(scan.new_last, None);
    }

    #[tokio::test]
    async fn scan_spans_pages_until_empty() {
        let profile = existing_profile("p1", 10);
        let source = FakeSource::new()
            .recent_page("p1", 1, vec![entry(10, 900_000, "", 80, 200.0)])
            .recent_page("p1", 2, vec![entry(11, 800_000, "", 70, 150.0)]);
        // Page 3 is absent and resolves to an empty page.

        let scan = scan_profile(&source, &profile, ts(1000)).await.unwrap();

        assert_eq!(scan.ingested.len(), 2);
        assert_eq!(scan.new_last, Some(ts(80)));
    }
}
