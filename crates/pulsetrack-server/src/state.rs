use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use pulsetrack_core::config::Config;
use pulsetrack_ingest::IngestPipeline;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// The ingestion decision pipeline. Stateless and reentrant; all shared
    /// state lives in the TTL store behind it.
    pub pipeline: IngestPipeline,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Per-IP sliding-window rate limiter for the ingestion endpoints.
    ///
    /// Key: IP address string. Value: deque of request timestamps within the
    /// last 60 seconds. Limit: `config.rate_limit_per_minute`. This is the
    /// transport-boundary cap the tracking core expects its caller to
    /// enforce.
    rate_limiter: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl AppState {
    pub fn new(pipeline: IngestPipeline, config: Config) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
            rate_limiter: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether `ip` is within the per-minute rate limit.
    ///
    /// Returns `true` if the request should proceed, `false` if it should be
    /// rejected with 429. Slides the window on every call.
    pub async fn check_rate_limit(&self, ip: &str) -> bool {
        if self.config.rate_limit_disable {
            return true;
        }
        let limit = self.config.rate_limit_per_minute as usize;
        let mut map = self.rate_limiter.lock().await;
        let window = map.entry(ip.to_string()).or_default();
        let cutoff = Instant::now() - Duration::from_secs(60);
        // Drop timestamps older than the 60-second window.
        while window.front().is_some_and(|t| *t < cutoff) {
            window.pop_front();
        }
        if window.len() >= limit {
            return false; // limit reached
        }
        window.push_back(Instant::now());
        true
    }
}
