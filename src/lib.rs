//! # netjob
//!
//! Chromium-style orchestration of a single HTTP request around a
//! pluggable wire transaction.
//!
//! `netjob` sequences everything that happens *around* the exchange
//! itself: request headers, cookie lookup and storage, network delegate
//! gates, transport-security headers, authentication restarts,
//! certificate decisions, content decoding and byte/time accounting.
//! Connection setup, TLS and byte transfer stay behind the
//! [`HttpTransaction`](http::transaction::HttpTransaction) trait.
//!
//! ## Features
//!
//! - **Job state machine**: cancel-safe event loop, restarts for auth and
//!   certificates, completion reported exactly once
//! - **Cookies**: RFC 6265 parsing with PSL validation, same-site contexts,
//!   delegate blocking, concurrent store writes joined in header order
//! - **Transport security**: HSTS upgrade redirects, `Strict-Transport-Security`
//!   and `Expect-CT` processing
//! - **Content decoding**: gzip, deflate and (with the `brotli` feature) br
//! - **Throttling**: exponential backoff on server errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use netjob::urlrequest::{create_job, JobEvent, URLRequest, URLRequestContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let context = Arc::new(
//!         URLRequestContext::builder()
//!             .transaction_factory(my_transaction_factory())
//!             .build()
//!             .unwrap(),
//!     );
//!     let request = URLRequest::new("https://example.com").unwrap();
//!     let mut job = create_job(request, context).unwrap();
//!     job.start().unwrap();
//!     while let Some(event) = job.next_event().await {
//!         if let JobEvent::HeadersComplete = event {
//!             println!("Status: {:?}", job.response_code());
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes, load flags, priorities and isolation types
//! - [`cookies`] - Cookie parsing, storage and the job's cookie phases
//! - [`filter`] - `Content-Encoding` decoding chain
//! - [`http`] - Request/response headers and the transaction seam
//! - [`tls`] - SSL facts, HSTS and Expect-CT
//! - [`urlrequest`] - The request job, its context and collaborators

pub mod base;
pub mod cookies;
pub mod filter;
pub mod http;
pub mod tls;
pub mod urlrequest;
