//! HTTP request/response primitives and the transaction seam.

pub mod auth;
pub mod requestheaders;
pub mod responseheaders;
pub mod responseinfo;
pub mod transaction;
pub mod upload;

// Re-exports for convenience
pub use auth::{AuthChallengeInfo, AuthCredentials};
pub use requestheaders::HttpRequestHeaders;
pub use responseheaders::HttpResponseHeaders;
pub use responseinfo::HttpResponseInfo;
pub use transaction::{HttpRequestInfo, HttpTransaction, HttpTransactionFactory};
pub use upload::UploadDataStream;
