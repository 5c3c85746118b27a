//! TLS connection facts reported by the transaction.

use bitflags::bitflags;
use bytes::Bytes;

bitflags! {
    /// Certificate verification status, after Chromium's `cert_status_flags.h`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CertStatus: u32 {
        const COMMON_NAME_INVALID = 1 << 0;
        const DATE_INVALID = 1 << 1;
        const AUTHORITY_INVALID = 1 << 2;
        const NO_REVOCATION_MECHANISM = 1 << 4;
        const UNABLE_TO_CHECK_REVOCATION = 1 << 5;
        const REVOKED = 1 << 6;
        const INVALID = 1 << 7;
        const WEAK_SIGNATURE_ALGORITHM = 1 << 8;
        const NON_UNIQUE_NAME = 1 << 10;
        const WEAK_KEY = 1 << 11;
        const PINNED_KEY_MISSING = 1 << 13;
        const NAME_CONSTRAINT_VIOLATION = 1 << 14;
        const VALIDITY_TOO_LONG = 1 << 15;
        const CERTIFICATE_TRANSPARENCY_REQUIRED = 1 << 24;
        const KNOWN_INTERCEPTION_BLOCKED = 1 << 26;

        // Informational bits, never errors.
        const IS_EV = 1 << 16;
        const REV_CHECKING_ENABLED = 1 << 17;
        const CT_COMPLIANCE_FAILED = 1 << 20;
    }
}

impl CertStatus {
    const ERROR_MASK: CertStatus = CertStatus::COMMON_NAME_INVALID
        .union(CertStatus::DATE_INVALID)
        .union(CertStatus::AUTHORITY_INVALID)
        .union(CertStatus::NO_REVOCATION_MECHANISM)
        .union(CertStatus::UNABLE_TO_CHECK_REVOCATION)
        .union(CertStatus::REVOKED)
        .union(CertStatus::INVALID)
        .union(CertStatus::WEAK_SIGNATURE_ALGORITHM)
        .union(CertStatus::NON_UNIQUE_NAME)
        .union(CertStatus::WEAK_KEY)
        .union(CertStatus::PINNED_KEY_MISSING)
        .union(CertStatus::NAME_CONSTRAINT_VIOLATION)
        .union(CertStatus::VALIDITY_TOO_LONG)
        .union(CertStatus::CERTIFICATE_TRANSPARENCY_REQUIRED)
        .union(CertStatus::KNOWN_INTERCEPTION_BLOCKED);

    /// Whether any error bit is set.
    pub fn is_error(self) -> bool {
        self.intersects(Self::ERROR_MASK)
    }
}

/// Free-function form kept for call sites that read like Chromium's.
pub fn is_cert_status_error(status: CertStatus) -> bool {
    status.is_error()
}

/// SSL facts of a response. A response without a server certificate has
/// invalid SSL info (plain HTTP, or a cached response without TLS data).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslInfo {
    /// DER of the leaf certificate.
    pub certificate: Option<Bytes>,
    pub cert_status: CertStatus,
    pub is_issued_by_known_root: bool,
}

impl SslInfo {
    pub fn is_valid(&self) -> bool {
        self.certificate.is_some()
    }
}

/// Details of a server's client-certificate request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslCertRequestInfo {
    pub host_and_port: String,
    pub is_proxy: bool,
    /// DER-encoded distinguished names of acceptable CAs.
    pub cert_authorities: Vec<Bytes>,
}

/// Client certificate chosen by the embedder in response to a
/// [`SslCertRequestInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub der: Bytes,
}
