//! Wire types for the scoring API's paginated endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterPage {
    #[serde(default)]
    pub players: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "playerName")]
    pub player_name: String,
    pub avatar: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoresPage {
    #[serde(default)]
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreEntry {
    #[serde(rename = "leaderboardId")]
    pub leaderboard_id: i64,
    /// Score value as achieved, including any modifier boost.
    pub score: i64,
    /// The misspelling is the API's own field name.
    #[serde(rename = "unmodififiedScore")]
    pub unmodified_score: i64,
    #[serde(rename = "maxScore")]
    pub max_score: i64,
    /// Comma-separated modifier codes, possibly empty.
    #[serde(default)]
    pub mods: String,
    #[serde(rename = "timeSet")]
    pub time_set: DateTime<Utc>,
    pub pp: f64,
}
