//! Persisted entities. One collection per type; field names serialize
//! camelCase to match the store's document shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A tracked player. Created on first sight in the roster, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// External player id (SSID).
    pub ssid: String,
    pub nickname: String,
    pub avatar_path: String,
    pub country: String,
    /// Timestamp of the most recently ingested score. `None` marks a newly
    /// discovered profile that has never been scanned.
    #[serde(default)]
    pub last: Option<DateTime<Utc>>,
}

/// A scored map. Registered the first time any score references it,
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Map {
    /// External leaderboard id (LDID).
    pub ldid: String,
    pub max_score: i64,
}

/// One stored score per (ssid, ldid). `score` is the effective value after
/// the modifier rule; rank fields are written only by the rank engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub ssid: String,
    pub ldid: String,
    pub score: i64,
    pub pp: f64,
    pub time_set: DateTime<Utc>,
    pub rank: u32,
    pub country_rank: u32,
}

/// Per-player aggregates, fully recomputed each cycle from the player's
/// current score set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub ssid: String,
    pub weighted_pp: f64,
    pub raw_pp: f64,
    pub average_score_percentage: f64,
    pub weighted_average_score_percentage: f64,
    pub average_rank: f64,
    pub weighted_average_rank: f64,
    pub average_country_rank: f64,
    pub weighted_average_country_rank: f64,
    /// pp of the highest-pp score.
    pub top_pp: f64,
    /// pp of the first score (in pp-descending order) whose score percentage
    /// exceeds the threshold. Zero if never crossed.
    pub highest_96: f64,
    pub highest_97: f64,
    pub highest_98: f64,
    pub highest_99: f64,
    pub ranked_played: u32,
    pub above_95: u32,
    pub above_325: u32,
    pub best_rank: u32,
    pub firsts: u32,
    pub country_firsts: u32,
    pub top_tens: u32,
}

/// Per-country aggregates over the country's top-50-by-weighted-pp cohort.
/// Only materialized when the cohort reaches exactly 50 members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryData {
    pub country: String,
    pub weighted_pp_average: f64,
    pub raw_pp_average: f64,
    pub average_score_percentage: f64,
    pub best_rank_average: f64,
    pub weighted_rank_average: f64,
    pub rank_average: f64,
    pub weighted_average_score_percentage: f64,
    pub top_pp_average: f64,
    pub ranked_played_sum: u32,
    pub above_95_sum: u32,
    pub above_325_sum: u32,
    pub top_tens_sum: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub value: f64,
}

/// One named category; entries are pre-sorted in the category's direction
/// and the whole collection is replaced each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub category: String,
    pub entries: Vec<LeaderboardEntry>,
}

/// Immutable dated copy of one leaderboard, captured once per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub category: String,
    pub date: NaiveDate,
    pub entries: Vec<LeaderboardEntry>,
}

impl Snapshot {
    pub fn of(leaderboard: &Leaderboard, date: NaiveDate) -> Self {
        Self {
            category: leaderboard.category.clone(),
            date,
            entries: leaderboard.entries.clone(),
        }
    }
}
