use crate::http::auth::AuthChallengeInfo;
use crate::http::responseheaders::HttpResponseHeaders;
use crate::tls::sslinfo::{SslCertRequestInfo, SslInfo};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

/// Everything the transaction knows about a response once headers arrive.
#[derive(Debug, Clone, Default)]
pub struct HttpResponseInfo {
    pub headers: Option<Arc<HttpResponseHeaders>>,
    pub ssl_info: SslInfo,
    /// Served from the HTTP cache rather than the network.
    pub was_cached: bool,
    pub was_fetched_via_proxy: bool,
    pub auth_challenge: Option<AuthChallengeInfo>,
    pub cert_request_info: Option<SslCertRequestInfo>,
    pub remote_endpoint: Option<SocketAddr>,
    pub request_time: Option<SystemTime>,
    pub response_time: Option<SystemTime>,
}

impl HttpResponseInfo {
    pub fn with_headers(headers: HttpResponseHeaders) -> Self {
        Self {
            headers: Some(Arc::new(headers)),
            ..Default::default()
        }
    }

    pub fn response_code(&self) -> Option<u16> {
        self.headers.as_ref().map(|h| h.response_code())
    }
}
