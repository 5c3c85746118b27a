//! The pluggable wire transaction.
//!
//! A transaction performs one HTTP exchange (possibly restarted for auth or
//! certificate selection). The job owns at most one at a time and drives it
//! through [`Completion`] results, so implementations decide per call
//! whether to answer synchronously.

use crate::base::completion::Completion;
use crate::base::isolation::NetworkIsolationKey;
use crate::base::loadflags::LoadFlags;
use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::base::priority::RequestPriority;
use crate::http::auth::AuthCredentials;
use crate::http::requestheaders::HttpRequestHeaders;
use crate::http::responseinfo::HttpResponseInfo;
use crate::http::upload::UploadDataStream;
use crate::tls::sslinfo::ClientCertificate;
use bytes::Bytes;
use http::Method;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Whether credentials and stored state may be used for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivacyMode {
    #[default]
    Disabled,
    Enabled,
    /// Enabled only for partitioned-state (`CHIPS`) lookups.
    EnabledWithoutClientCerts,
}

impl PrivacyMode {
    pub fn is_enabled(self) -> bool {
        self != PrivacyMode::Disabled
    }
}

/// Immutable description of the request handed to the transaction.
#[derive(Debug, Clone)]
pub struct HttpRequestInfo {
    pub url: Url,
    pub method: Method,
    pub extra_headers: HttpRequestHeaders,
    pub load_flags: LoadFlags,
    pub privacy_mode: PrivacyMode,
    pub network_isolation_key: NetworkIsolationKey,
    pub upload_data_stream: Option<UploadDataStream>,
}

impl HttpRequestInfo {
    pub fn new(url: Url, method: Method) -> Self {
        Self {
            url,
            method,
            extra_headers: HttpRequestHeaders::new(),
            load_flags: LoadFlags::empty(),
            privacy_mode: PrivacyMode::Disabled,
            network_isolation_key: NetworkIsolationKey::default(),
            upload_data_stream: None,
        }
    }
}

/// Timing marks of the current transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadTimingInfo {
    pub socket_reused: bool,
    pub request_start: Option<Instant>,
    pub send_start: Option<Instant>,
    pub send_end: Option<Instant>,
    pub receive_headers_end: Option<Instant>,
}

/// Helper installed on WebSocket handshakes; carries the requested
/// subprotocols to the transaction's stream.
pub trait WebSocketHandshakeStreamCreateHelper: Send + Sync {
    fn requested_subprotocols(&self) -> Vec<String> {
        Vec::new()
    }
}

pub type TransactionResult = Completion<Result<(), NetError>>;

/// A single HTTP exchange.
///
/// `read` returns an empty buffer at end of body.
pub trait HttpTransaction: Send {
    fn start(&mut self, request_info: &HttpRequestInfo) -> TransactionResult;

    /// Retries with `credentials`. `request_info` carries headers the job
    /// recomputed for the retry, such as a fresh `Cookie` line.
    fn restart_with_auth(
        &mut self,
        request_info: &HttpRequestInfo,
        credentials: &AuthCredentials,
    ) -> TransactionResult;

    fn restart_with_certificate(
        &mut self,
        client_cert: Option<Arc<ClientCertificate>>,
    ) -> TransactionResult;

    fn restart_ignoring_last_error(&mut self) -> TransactionResult;

    fn read(&mut self, buf_size: usize) -> Completion<Result<Bytes, NetError>>;

    /// Snapshot of the response so far; `None` before headers arrive.
    fn response_info(&self) -> Option<HttpResponseInfo>;

    fn total_sent_bytes(&self) -> u64;

    fn total_received_bytes(&self) -> u64;

    /// Whether the transaction can retry auth on its own (cached or ambient
    /// credentials) without asking the embedder.
    fn is_ready_to_restart_for_auth(&self) -> bool {
        false
    }

    fn set_priority(&mut self, _priority: RequestPriority) {}

    fn load_state(&self) -> LoadState {
        LoadState::Idle
    }

    fn load_timing_info(&self) -> Option<LoadTimingInfo> {
        None
    }

    fn remote_endpoint(&self) -> Option<SocketAddr> {
        None
    }

    fn close_connection_on_destruction(&mut self) {}

    fn done_reading(&mut self) {}

    fn stop_caching(&mut self) {}

    fn set_websocket_handshake_helper(
        &mut self,
        _helper: Arc<dyn WebSocketHandshakeStreamCreateHelper>,
    ) {
    }
}

/// Creates transactions; usually backed by a network session or cache.
pub trait HttpTransactionFactory: Send + Sync {
    fn create_transaction(
        &self,
        priority: RequestPriority,
    ) -> Result<Box<dyn HttpTransaction>, NetError>;
}
