//! Response body decoding.
//!
//! Mirrors Chromium's `SourceStream` stack: `Content-Encoding` is parsed
//! into [`SourceType`]s and turned into a [`DecodeChain`] of
//! [`FilterStream`] layers built by a [`FilterFactory`].

#[cfg(feature = "brotli")]
pub mod brotli;
pub mod chain;
pub mod filterstream;
pub mod gzip;
pub mod sourcetype;

pub use chain::DecodeChain;
pub use filterstream::{DefaultFilterFactory, FilterFactory, FilterStream};
pub use sourcetype::{AcceptedEncodings, SourceType};
