use thiserror::Error;

/// Failure surface of the scoring API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A page request kept failing (network or deserialization) after every
    /// retry in the schedule. Stalls the current cycle by design; the next
    /// cycle starts fresh.
    #[error("transient fetch failure for {url} after {attempts} attempts")]
    TransientFetch {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}
