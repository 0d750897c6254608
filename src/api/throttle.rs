use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Enforces a fixed minimum interval between outbound requests so the
/// source API's request budget is respected.
#[derive(Clone)]
pub struct RequestThrottle {
    interval: Duration,
    next_allowed: Arc<Mutex<Instant>>,
}

impl RequestThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_allowed: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut next_allowed = self.next_allowed.lock().await;
        let now = Instant::now();
        let wait_until = (*next_allowed).max(now);
        *next_allowed = wait_until + self.interval;
        drop(next_allowed);

        let pause = wait_until.saturating_duration_since(now);
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }
}
