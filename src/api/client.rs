//! HTTP client for the scoring API: throttled, typed, with bounded retry.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::api::models::{RosterPage, ScoresPage};
use crate::api::throttle::RequestThrottle;
use crate::config::Config;
use crate::error::ApiError;

/// Delay schedule between retries of a failing page request. Once the
/// schedule is exhausted the failure surfaces as `ApiError::TransientFetch`.
const RETRY_DELAYS_SECS: &[u64] = &[5, 10, 15, 20];

/// The paginated read surface the pipeline consumes. Implemented by
/// [`ApiClient`] in production and by in-test fakes.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// One page of the ranked-player roster (1-based).
    async fn roster_page(&self, page: u32) -> Result<RosterPage, ApiError>;
    /// One page of a player's scores, most recent first.
    async fn recent_scores(&self, ssid: &str, page: u32) -> Result<ScoresPage, ApiError>;
    /// One page of a player's scores, highest pp first.
    async fn top_scores(&self, ssid: &str, page: u32) -> Result<ScoresPage, ApiError>;
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    throttle: RequestThrottle,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("rankline/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.api_root.trim_end_matches('/').to_string(),
            throttle: RequestThrottle::new(Duration::from_millis(cfg.pace_delay_ms)),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            self.throttle.wait().await;

            let outcome = match self
                .http
                .get(&url)
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
            {
                Ok(resp) => resp.json::<T>().await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(parsed) => return Ok(parsed),
                Err(source) => {
                    attempt += 1;
                    let Some(delay_secs) = RETRY_DELAYS_SECS.get(attempt as usize - 1) else {
                        return Err(ApiError::TransientFetch {
                            url,
                            attempts: attempt,
                            source,
                        });
                    };
                    warn!(%url, attempt, delay_secs, error = %source, "page request failed, retrying");
                    sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }
    }
}

#[async_trait]
impl ScoreSource for ApiClient {
    async fn roster_page(&self, page: u32) -> Result<RosterPage, ApiError> {
        self.get_json(format!("{}/api/players/{page}", self.base_url))
            .await
    }

    async fn recent_scores(&self, ssid: &str, page: u32) -> Result<ScoresPage, ApiError> {
        self.get_json(format!(
            "{}/api/player/{ssid}/scores/recent/{page}",
            self.base_url
        ))
        .await
    }

    async fn top_scores(&self, ssid: &str, page: u32) -> Result<ScoresPage, ApiError> {
        self.get_json(format!(
            "{}/api/player/{ssid}/scores/top/{page}",
            self.base_url
        ))
        .await
    }
}
