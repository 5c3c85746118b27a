use thiserror::Error;

/// Network error codes.
///
/// Numeric values follow Chromium's `net_error_list.h`; errors that have no
/// Chromium counterpart use the custom range starting at -10000.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NetError {
    // Generic Errors
    #[error("Generic failure")]
    Failed,
    #[error("Operation aborted")]
    Aborted,
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Unexpected error")]
    Unexpected,
    #[error("Access denied")]
    AccessDenied,
    #[error("Not implemented")]
    NotImplemented,
    #[error("Blocked by client")]
    BlockedByClient,
    #[error("Cleartext not permitted")]
    CleartextNotPermitted,

    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Internet disconnected")]
    InternetDisconnected,
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("SSL client auth cert needed")]
    SslClientAuthCertNeeded,
    #[error("Tunnel connection failed")]
    TunnelConnectionFailed,
    #[error("Proxy auth unsupported")]
    ProxyAuthUnsupported,
    #[error("Bad SSL client auth cert")]
    BadSslClientAuthCert,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Proxy auth requested")]
    ProxyAuthRequested,
    #[error("Proxy connection failed")]
    ProxyConnectionFailed,
    #[error("Temporarily throttled")]
    TemporarilyThrottled,
    #[error("SSL pinned key not in cert chain")]
    SslPinnedKeyNotInCertChain,

    // Certificate Errors
    #[error("Certificate common name invalid")]
    CertCommonNameInvalid,
    #[error("Certificate date invalid")]
    CertDateInvalid,
    #[error("Certificate authority invalid")]
    CertAuthorityInvalid,
    #[error("Certificate contains errors")]
    CertContainsErrors,
    #[error("Certificate has no revocation mechanism")]
    CertNoRevocationMechanism,
    #[error("Unable to check certificate revocation")]
    CertUnableToCheckRevocation,
    #[error("Certificate revoked")]
    CertRevoked,
    #[error("Certificate invalid")]
    CertInvalid,
    #[error("Certificate uses a weak signature algorithm")]
    CertWeakSignatureAlgorithm,
    #[error("Certificate non-unique name")]
    CertNonUniqueName,
    #[error("Certificate weak key")]
    CertWeakKey,
    #[error("Certificate name constraint violation")]
    CertNameConstraintViolation,
    #[error("Certificate validity too long")]
    CertValidityTooLong,
    #[error("Certificate transparency required")]
    CertificateTransparencyRequired,
    #[error("Certificate known interception blocked")]
    CertKnownInterceptionBlocked,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("Invalid redirect")]
    InvalidRedirect,
    #[error("Too many redirects")]
    TooManyRedirects,
    #[error("Unsafe redirect")]
    UnsafeRedirect,
    #[error("Unsafe port")]
    UnsafePort,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Invalid chunked encoding")]
    InvalidChunkedEncoding,
    #[error("Method not supported")]
    MethodNotSupported,
    #[error("Unexpected proxy auth")]
    UnexpectedProxyAuth,
    #[error("Empty response")]
    EmptyResponse,
    #[error("Response headers too big")]
    ResponseHeadersTooBig,
    #[error("Content decoding failed")]
    ContentDecodingFailed,
    #[error("Invalid auth credentials")]
    InvalidAuthCredentials,
    #[error("Unsupported auth scheme")]
    UnsupportedAuthScheme,
    #[error("Missing auth credentials")]
    MissingAuthCredentials,
    #[error("Content-Length mismatch")]
    ContentLengthMismatch,
    #[error("Incomplete chunked encoding")]
    IncompleteChunkedEncoding,
    #[error("Content decoding init failed")]
    ContentDecodingInitFailed,
    #[error("Too many retries")]
    TooManyRetries,

    // Custom errors (no Chromium counterpart)
    #[error("Redirect cycle detected")]
    RedirectCycleDetected,
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Cookie prefix validation failed")]
    CookieInvalidPrefix,
    #[error("Cookie domain is a public suffix")]
    CookiePublicSuffix,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

/// First code of the certificate error range (inclusive).
const CERT_BEGIN: i32 = -200;
/// End of the certificate error range (exclusive).
const CERT_END: i32 = -219;

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Failed => -2,
            NetError::Aborted => -3,
            NetError::InvalidArgument => -4,
            NetError::Unexpected => -9,
            NetError::AccessDenied => -10,
            NetError::NotImplemented => -11,
            NetError::BlockedByClient => -20,
            NetError::CleartextNotPermitted => -29,

            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::InternetDisconnected => -106,
            NetError::SslProtocolError => -107,
            NetError::SslClientAuthCertNeeded => -110,
            NetError::TunnelConnectionFailed => -111,
            NetError::ProxyAuthUnsupported => -115,
            NetError::BadSslClientAuthCert => -117,
            NetError::ConnectionTimedOut => -118,
            NetError::ProxyAuthRequested => -127,
            NetError::ProxyConnectionFailed => -130,
            NetError::TemporarilyThrottled => -139,
            NetError::SslPinnedKeyNotInCertChain => -150,

            NetError::CertCommonNameInvalid => -200,
            NetError::CertDateInvalid => -201,
            NetError::CertAuthorityInvalid => -202,
            NetError::CertContainsErrors => -203,
            NetError::CertNoRevocationMechanism => -204,
            NetError::CertUnableToCheckRevocation => -205,
            NetError::CertRevoked => -206,
            NetError::CertInvalid => -207,
            NetError::CertWeakSignatureAlgorithm => -208,
            NetError::CertNonUniqueName => -210,
            NetError::CertWeakKey => -211,
            NetError::CertNameConstraintViolation => -212,
            NetError::CertValidityTooLong => -213,
            NetError::CertificateTransparencyRequired => -214,
            NetError::CertKnownInterceptionBlocked => -217,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::UnknownUrlScheme => -302,
            NetError::InvalidRedirect => -303,
            NetError::TooManyRedirects => -310,
            NetError::UnsafeRedirect => -311,
            NetError::UnsafePort => -312,
            NetError::InvalidResponse => -320,
            NetError::InvalidChunkedEncoding => -321,
            NetError::MethodNotSupported => -322,
            NetError::UnexpectedProxyAuth => -323,
            NetError::EmptyResponse => -324,
            NetError::ResponseHeadersTooBig => -325,
            NetError::ContentDecodingFailed => -330,
            NetError::InvalidAuthCredentials => -338,
            NetError::UnsupportedAuthScheme => -339,
            NetError::MissingAuthCredentials => -341,
            NetError::ContentLengthMismatch => -354,
            NetError::IncompleteChunkedEncoding => -355,
            NetError::ContentDecodingInitFailed => -371,
            NetError::TooManyRetries => -375,

            NetError::RedirectCycleDetected => -10000,
            NetError::InvalidHeader => -10001,
            NetError::CookieInvalidPrefix => -10002,
            NetError::CookiePublicSuffix => -10003,
            NetError::Unknown(code) => *code,
        }
    }

    /// Whether this is a server certificate error (Chromium's
    /// `IsCertificateError`). These are recoverable: the consumer decides
    /// whether to continue.
    pub fn is_certificate_error(&self) -> bool {
        let code = self.as_i32();
        code <= CERT_BEGIN && code > CERT_END
    }

    /// Whether this error indicates a problem with the client certificate.
    pub fn is_client_certificate_error(&self) -> bool {
        matches!(
            self,
            NetError::BadSslClientAuthCert | NetError::SslClientAuthCertNeeded
        )
    }

    /// Errors that can be cleared when the decoded body length matches the
    /// declared `Content-Length`.
    pub fn is_length_mismatch(&self) -> bool {
        matches!(
            self,
            NetError::ContentLengthMismatch | NetError::IncompleteChunkedEncoding
        )
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -2 => NetError::Failed,
            -3 => NetError::Aborted,
            -4 => NetError::InvalidArgument,
            -9 => NetError::Unexpected,
            -10 => NetError::AccessDenied,
            -11 => NetError::NotImplemented,
            -20 => NetError::BlockedByClient,
            -29 => NetError::CleartextNotPermitted,

            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -106 => NetError::InternetDisconnected,
            -107 => NetError::SslProtocolError,
            -110 => NetError::SslClientAuthCertNeeded,
            -111 => NetError::TunnelConnectionFailed,
            -115 => NetError::ProxyAuthUnsupported,
            -117 => NetError::BadSslClientAuthCert,
            -118 => NetError::ConnectionTimedOut,
            -127 => NetError::ProxyAuthRequested,
            -130 => NetError::ProxyConnectionFailed,
            -139 => NetError::TemporarilyThrottled,
            -150 => NetError::SslPinnedKeyNotInCertChain,

            -200 => NetError::CertCommonNameInvalid,
            -201 => NetError::CertDateInvalid,
            -202 => NetError::CertAuthorityInvalid,
            -203 => NetError::CertContainsErrors,
            -204 => NetError::CertNoRevocationMechanism,
            -205 => NetError::CertUnableToCheckRevocation,
            -206 => NetError::CertRevoked,
            -207 => NetError::CertInvalid,
            -208 => NetError::CertWeakSignatureAlgorithm,
            -210 => NetError::CertNonUniqueName,
            -211 => NetError::CertWeakKey,
            -212 => NetError::CertNameConstraintViolation,
            -213 => NetError::CertValidityTooLong,
            -214 => NetError::CertificateTransparencyRequired,
            -217 => NetError::CertKnownInterceptionBlocked,

            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -302 => NetError::UnknownUrlScheme,
            -303 => NetError::InvalidRedirect,
            -310 => NetError::TooManyRedirects,
            -311 => NetError::UnsafeRedirect,
            -312 => NetError::UnsafePort,
            -320 => NetError::InvalidResponse,
            -321 => NetError::InvalidChunkedEncoding,
            -322 => NetError::MethodNotSupported,
            -323 => NetError::UnexpectedProxyAuth,
            -324 => NetError::EmptyResponse,
            -325 => NetError::ResponseHeadersTooBig,
            -330 => NetError::ContentDecodingFailed,
            -338 => NetError::InvalidAuthCredentials,
            -339 => NetError::UnsupportedAuthScheme,
            -341 => NetError::MissingAuthCredentials,
            -354 => NetError::ContentLengthMismatch,
            -355 => NetError::IncompleteChunkedEncoding,
            -371 => NetError::ContentDecodingInitFailed,
            -375 => NetError::TooManyRetries,

            -10000 => NetError::RedirectCycleDetected,
            -10001 => NetError::InvalidHeader,
            -10002 => NetError::CookieInvalidPrefix,
            -10003 => NetError::CookiePublicSuffix,
            _ => NetError::Unknown(code),
        }
    }
}
