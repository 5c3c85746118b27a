use std::fmt;

/// What a request is currently blocked on.
/// This roughly matches net/base/load_states.h
///
/// A job with no transaction reports [`LoadState::Idle`]; otherwise the
/// transaction decides, except while the job itself waits on its delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The request is idle.
    #[default]
    Idle,

    /// Waiting for a socket from the pool.
    WaitingForStalledSocketPool,

    /// Waiting for an available socket.
    WaitingForAvailableSocket,

    /// Waiting for the delegate to let the job continue.
    WaitingForDelegate,

    /// Waiting for the cache lock.
    WaitingForCache,

    /// Resolving the proxy.
    ResolvingProxyForUrl,

    /// Establishing proxy tunnel.
    EstablishingProxyTunnel,

    /// Resolving the host.
    ResolvingHost,

    /// Connecting to the host (TCP handshake).
    Connecting,

    /// Establishing an SSL connection.
    SslHandshake,

    /// Sending the HTTP request.
    SendingRequest,

    /// Waiting for the server response (TTFB).
    WaitingForResponse,

    /// Reading the response body.
    ReadingResponse,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::Idle => "idle",
            LoadState::WaitingForStalledSocketPool => "waiting for stalled socket pool",
            LoadState::WaitingForAvailableSocket => "waiting for available socket",
            LoadState::WaitingForDelegate => "waiting for delegate",
            LoadState::WaitingForCache => "waiting for cache",
            LoadState::ResolvingProxyForUrl => "resolving proxy",
            LoadState::EstablishingProxyTunnel => "establishing proxy tunnel",
            LoadState::ResolvingHost => "resolving host",
            LoadState::Connecting => "connecting",
            LoadState::SslHandshake => "ssl handshake",
            LoadState::SendingRequest => "sending request",
            LoadState::WaitingForResponse => "waiting for response",
            LoadState::ReadingResponse => "reading response",
        };
        f.write_str(name)
    }
}
