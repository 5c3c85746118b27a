//! Request throttling with exponential backoff.
//!
//! After Chromium's `URLRequestThrottlerManager`: every URL (without query
//! or fragment) maps to an entry that counts consecutive server errors.
//! Past a tolerance, further requests are rejected with
//! `TemporarilyThrottled` until the backoff delay elapses.

use crate::base::loadflags::LoadFlags;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Backoff policy for throttling entries.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Consecutive errors tolerated before backoff starts (default: 2).
    pub num_errors_to_ignore: u32,
    /// Delay after the first counted error in milliseconds (default: 700).
    pub initial_delay_ms: u64,
    /// Growth factor per further error (default: 1.4).
    pub multiply_factor: f64,
    /// Maximum delay cap in milliseconds (default: 15 minutes).
    pub max_delay_ms: u64,
    /// Fraction of the delay removed at random (default: 0.4).
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            num_errors_to_ignore: 2,
            initial_delay_ms: 700,
            multiply_factor: 1.4,
            max_delay_ms: 15 * 60 * 1000,
            jitter_factor: 0.4,
        }
    }
}

impl BackoffConfig {
    /// A policy that never throttles.
    pub fn disabled() -> Self {
        Self {
            num_errors_to_ignore: u32::MAX,
            ..Default::default()
        }
    }
}

/// Delay after `failure_count` consecutive failures.
///
/// `initial * factor^(n - ignored - 1)`, capped at `max_delay_ms`, then
/// reduced by a deterministic share of the jitter range.
pub fn calculate_backoff(failure_count: u32, config: &BackoffConfig) -> Duration {
    if failure_count <= config.num_errors_to_ignore {
        return Duration::ZERO;
    }
    let exponent = (failure_count - config.num_errors_to_ignore - 1).min(64) as i32;
    let delay_ms = (config.initial_delay_ms as f64) * config.multiply_factor.powi(exponent);
    let capped_ms = delay_ms.min(config.max_delay_ms as f64);

    let jitter_range = capped_ms * config.jitter_factor;
    let jitter = if jitter_range >= 1.0 {
        ((failure_count as u64 * 7) % jitter_range as u64) as f64
    } else {
        0.0
    };
    Duration::from_millis((capped_ms - jitter).max(0.0).round() as u64)
}

/// Responses the throttler treats as the server struggling.
pub fn is_considered_error(response_code: u16) -> bool {
    matches!(response_code, 500 | 503 | 509)
}

/// Throttling state of one URL.
pub trait ThrottlingEntry: Send + Sync {
    fn should_reject_request(&self, load_flags: LoadFlags) -> bool;

    /// Feeds a response code back into the backoff state.
    fn update_with_response(&self, response_code: u16);
}

/// Maps URLs to their throttling entries.
pub trait Throttler: Send + Sync {
    fn register_request_url(&self, url: &Url) -> Arc<dyn ThrottlingEntry>;
}

#[derive(Debug, Clone, Default)]
struct EntryState {
    failure_count: u32,
    release_time: Option<Instant>,
}

/// In-memory [`Throttler`] using [`BackoffConfig`].
#[derive(Debug, Clone, Default)]
pub struct BackoffThrottler {
    entries: Arc<DashMap<String, EntryState>>,
    config: Arc<BackoffConfig>,
}

impl BackoffThrottler {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    /// Entry key: the URL without query, fragment or credentials.
    pub fn url_id(url: &Url) -> String {
        let mut id = url.clone();
        id.set_query(None);
        id.set_fragment(None);
        // Only fails for cannot-be-a-base URLs, which have no credentials.
        let _ = id.set_username("");
        let _ = id.set_password(None);
        id.to_string().to_ascii_lowercase()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Throttler for BackoffThrottler {
    fn register_request_url(&self, url: &Url) -> Arc<dyn ThrottlingEntry> {
        let key = Self::url_id(url);
        self.entries.entry(key.clone()).or_default();
        Arc::new(BackoffEntry {
            key,
            entries: Arc::clone(&self.entries),
            config: Arc::clone(&self.config),
        })
    }
}

struct BackoffEntry {
    key: String,
    entries: Arc<DashMap<String, EntryState>>,
    config: Arc<BackoffConfig>,
}

impl ThrottlingEntry for BackoffEntry {
    fn should_reject_request(&self, load_flags: LoadFlags) -> bool {
        if load_flags.contains(LoadFlags::MAYBE_USER_GESTURE) {
            return false;
        }
        let reject = self
            .entries
            .get(&self.key)
            .and_then(|state| state.release_time)
            .is_some_and(|release| Instant::now() < release);
        if reject {
            tracing::debug!(url = %self.key, "request throttled");
        }
        reject
    }

    fn update_with_response(&self, response_code: u16) {
        let mut state = self.entries.entry(self.key.clone()).or_default();
        if is_considered_error(response_code) {
            state.failure_count = state.failure_count.saturating_add(1);
            let delay = calculate_backoff(state.failure_count, &self.config);
            if !delay.is_zero() {
                state.release_time = Some(Instant::now() + delay);
                tracing::debug!(
                    url = %self.key,
                    failures = state.failure_count,
                    delay_ms = delay.as_millis() as u64,
                    "backing off"
                );
            }
        } else {
            state.failure_count = 0;
            state.release_time = None;
        }
    }
}
