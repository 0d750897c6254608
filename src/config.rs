//! Environment-driven configuration: dotenv loading and typed getters.
//!
//! Everything is collected into a [`Config`] once at startup and passed down
//! explicitly; no module reads ambient env state after boot.

use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times; main calls it before
/// the tracing filter is built so a RUST_LOG in .env takes effect.
pub fn load_dotenv() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get optional env var (None if unset or empty).
fn env_opt(key: &str) -> Option<String> {
    load_dotenv();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    load_dotenv();
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Players per roster page; fixed by the source API.
pub const ROSTER_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the scoring API.
    pub api_root: String,
    /// Document store connection string.
    pub mongo_url: String,
    /// Document store database name.
    pub db_name: String,
    /// How many top-ranked players to track; roster pages = roster_size / 50.
    pub roster_size: u32,
    /// Minimum interval between outbound API requests, in milliseconds.
    pub pace_delay_ms: u64,
    /// Per-request HTTP timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_root: env_opt("API_ROOT")
                .unwrap_or_else(|| "https://new.scoresaber.com".to_string()),
            mongo_url: env_opt("MONGO_URL")
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            db_name: env_opt("MONGO_DB").unwrap_or_else(|| "rankline".to_string()),
            roster_size: env_parse("ROSTER_SIZE", 3000),
            pace_delay_ms: env_parse("PACE_DELAY_MS", 1000),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_dotenv_loads_are_harmless() {
        load_dotenv();
        load_dotenv();
        // The getters route through the same guarded loader.
        assert_eq!(env_opt("RANKLINE_TEST_UNSET"), None);
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("RANKLINE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse::<u32>("RANKLINE_TEST_GARBAGE", 7), 7);
        std::env::remove_var("RANKLINE_TEST_GARBAGE");
    }

    #[test]
    fn env_opt_treats_blank_as_missing() {
        std::env::set_var("RANKLINE_TEST_BLANK", "   ");
        assert_eq!(env_opt("RANKLINE_TEST_BLANK"), None);
        std::env::remove_var("RANKLINE_TEST_BLANK");
    }
}
