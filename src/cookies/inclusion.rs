//! Why a cookie was or was not sent or stored.
//!
//! Modeled after Chromium's `net::CookieInclusionStatus`: an empty reason
//! set means the cookie is included.

use crate::cookies::canonicalcookie::CanonicalCookie;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExclusionReasons: u32 {
        const UNKNOWN_ERROR = 1 << 0;
        const HTTP_ONLY = 1 << 1;
        const SECURE_ONLY = 1 << 2;
        const DOMAIN_MISMATCH = 1 << 3;
        const NOT_ON_PATH = 1 << 4;
        const SAMESITE_STRICT = 1 << 5;
        const SAMESITE_LAX = 1 << 6;
        const SAMESITE_UNSPECIFIED_TREATED_AS_LAX = 1 << 7;
        const SAMESITE_NONE_INSECURE = 1 << 8;
        /// Blocked by the embedder's cookie settings or privacy mode.
        const USER_PREFERENCES = 1 << 9;
        const FAILURE_TO_STORE = 1 << 10;
        const NONCOOKIEABLE_SCHEME = 1 << 11;
        const OVERWRITE_SECURE = 1 << 12;
        const OVERWRITE_HTTP_ONLY = 1 << 13;
        const INVALID_DOMAIN = 1 << 14;
        const INVALID_PREFIX = 1 << 15;
        const DISALLOWED_CHARACTER = 1 << 16;
        const NO_COOKIE_CONTENT = 1 << 17;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CookieInclusionStatus {
    exclusion_reasons: ExclusionReasons,
}

impl CookieInclusionStatus {
    /// An including status.
    pub fn include() -> Self {
        Self::default()
    }

    pub fn excluded(reasons: ExclusionReasons) -> Self {
        Self {
            exclusion_reasons: reasons,
        }
    }

    pub fn is_include(&self) -> bool {
        self.exclusion_reasons.is_empty()
    }

    pub fn exclusion_reasons(&self) -> ExclusionReasons {
        self.exclusion_reasons
    }

    pub fn has_exclusion_reason(&self, reason: ExclusionReasons) -> bool {
        self.exclusion_reasons.contains(reason)
    }

    /// Whether `reason` is the only reason for exclusion.
    pub fn has_only_exclusion_reason(&self, reason: ExclusionReasons) -> bool {
        self.exclusion_reasons == reason
    }

    pub fn add_exclusion_reason(&mut self, reason: ExclusionReasons) {
        self.exclusion_reasons.insert(reason);
    }

    pub fn remove_exclusion_reason(&mut self, reason: ExclusionReasons) {
        self.exclusion_reasons.remove(reason);
    }
}

/// A cookie considered for a request, with the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieWithAccessResult {
    pub cookie: CanonicalCookie,
    pub status: CookieInclusionStatus,
}

pub type CookieAccessResultList = Vec<CookieWithAccessResult>;

/// A `Set-Cookie` line from a response, the cookie parsed from it (if
/// parsing succeeded) and the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAndLineWithAccessResult {
    pub cookie: Option<CanonicalCookie>,
    pub cookie_string: String,
    pub status: CookieInclusionStatus,
}

pub type CookieAndLineAccessResultList = Vec<CookieAndLineWithAccessResult>;
