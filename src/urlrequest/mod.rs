//! The request job and its collaborators.
//!
//! | Chromium (C++) | netjob (Rust) |
//! |----------------|---------------|
//! | `net::URLRequest` | [`URLRequest`] |
//! | `net::URLRequestHttpJob` | [`URLRequestHttpJob`] |
//! | `net::URLRequestRedirectJob` | [`URLRequestRedirectJob`] |
//! | `net::URLRequestContext` | [`URLRequestContext`] |
//! | `net::NetworkDelegate` | [`NetworkDelegate`] |
//! | `net::URLRequestThrottlerManager` | [`BackoffThrottler`] |

pub mod auth;
pub mod context;
pub mod delegate;
pub mod factory;
pub mod job;
pub mod observer;
pub mod request;
pub mod throttle;

pub use auth::{AuthCoordinator, AuthState, AuthTarget};
pub use context::{HttpUserAgentSettings, URLRequestContext, URLRequestContextConfig};
pub use delegate::{HeadersReceivedDecision, HeaderOverrideDelegate, NetworkDelegate};
pub use factory::{create_job, URLRequestJob, URLRequestRedirectJob};
pub use job::{JobEvent, JobPhase, ResponseHeadersSource, ResponseSnapshot, URLRequestHttpJob};
pub use observer::{CompletionCause, JobCompletion, JobObserver, TracingObserver};
pub use request::URLRequest;
pub use throttle::{BackoffConfig, BackoffThrottler, Throttler, ThrottlingEntry};
