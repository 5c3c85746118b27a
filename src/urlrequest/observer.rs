//! Metrics hooks for jobs.
//!
//! Jobs report timing and completion to an injectable observer instead of
//! global histograms.

use crate::base::priority::RequestPriority;
use std::time::Duration;
use url::Url;

/// Why a job finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCause {
    /// Body fully read, or the job failed.
    Finished,
    /// Killed, or the transaction was torn down early.
    Aborted,
}

/// Facts reported once per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCompletion {
    pub cause: CompletionCause,
    /// Since the last transaction start; `None` if none started.
    pub total_time: Option<Duration>,
    pub priority: RequestPriority,
    pub was_cached: bool,
    pub prefilter_bytes_read: u64,
    pub postfilter_bytes_read: u64,
}

pub trait JobObserver: Send + Sync {
    fn on_start_transaction(&self, _url: &Url) {}

    /// Time from the (re)start of the transaction to its start completion.
    fn on_time_to_first_byte(&self, _elapsed: Duration) {}

    fn on_headers_received(&self, _url: &Url, _response_code: u16, _was_cached: bool) {}

    fn on_completed(&self, _completion: &JobCompletion) {}
}

/// Logs every hook through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl JobObserver for TracingObserver {
    fn on_start_transaction(&self, url: &Url) {
        tracing::debug!(%url, "transaction starting");
    }

    fn on_time_to_first_byte(&self, elapsed: Duration) {
        tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "time to first byte");
    }

    fn on_headers_received(&self, url: &Url, response_code: u16, was_cached: bool) {
        tracing::debug!(%url, response_code, was_cached, "headers received");
    }

    fn on_completed(&self, completion: &JobCompletion) {
        tracing::debug!(
            cause = ?completion.cause,
            total_ms = completion.total_time.map(|t| t.as_millis() as u64),
            prefilter = completion.prefilter_bytes_read,
            postfilter = completion.postfilter_bytes_read,
            "job completed"
        );
    }
}
