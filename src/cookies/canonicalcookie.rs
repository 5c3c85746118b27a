use crate::base::isolation::{is_localhost, scheme_is_cryptographic};
use crate::base::neterror::NetError;
use crate::cookies::inclusion::{CookieInclusionStatus, CookieWithAccessResult, ExclusionReasons};
use crate::cookies::psl;
use time::OffsetDateTime;
use url::Url;

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub last_access_time: OffsetDateTime,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
    pub priority: CookiePriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CookiePriority {
    Low,
    Medium,
    High,
}

/// Schemes that may carry cookies.
pub fn is_cookieable_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https" | "ws" | "wss")
}

/// Whether `url` counts as a secure origin for `Secure` cookies.
pub fn is_secure_origin(url: &Url) -> bool {
    scheme_is_cryptographic(url) || is_localhost(url)
}

/// RFC 6265 default-path: the URL path up to, not including, its last `/`.
pub fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

impl CanonicalCookie {
    pub fn new(
        name: String,
        value: String,
        domain: String,
        path: String,
        creation_time: OffsetDateTime,
        expiration_time: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            name,
            value,
            domain,
            path,
            creation_time,
            expiration_time,
            last_access_time: creation_time,
            secure: false,
            http_only: false,
            host_only: true,
            same_site: SameSite::Unspecified,
            priority: CookiePriority::Medium,
        }
    }

    /// Parses one `Set-Cookie` line received from `url`.
    ///
    /// `server_time` is the response's `Date`; when present, `Expires` is
    /// interpreted relative to it so a skewed server clock does not shorten
    /// or extend the cookie's lifetime.
    pub fn create(
        url: &Url,
        cookie_line: &str,
        creation_time: OffsetDateTime,
        server_time: Option<OffsetDateTime>,
    ) -> Result<Self, CookieInclusionStatus> {
        let fail = |reason| Err(CookieInclusionStatus::excluded(reason));

        if !is_cookieable_scheme(url) {
            return fail(ExclusionReasons::NONCOOKIEABLE_SCHEME);
        }
        if cookie_line.chars().any(|c| matches!(c, '\0' | '\r' | '\n')) {
            return fail(ExclusionReasons::DISALLOWED_CHARACTER);
        }

        let parsed = match cookie::Cookie::parse(cookie_line) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(error = %err, "failed to parse cookie line");
                return fail(ExclusionReasons::FAILURE_TO_STORE);
            }
        };
        if parsed.name().is_empty() && parsed.value().is_empty() {
            return fail(ExclusionReasons::NO_COOKIE_CONTENT);
        }

        let (domain, host_only) = match psl::cookie_domain(url, parsed.domain()) {
            Ok(resolved) => resolved,
            Err(_) => return fail(ExclusionReasons::INVALID_DOMAIN),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url),
        };

        let expiration_time = if let Some(max_age) = parsed.max_age() {
            if max_age.is_positive() {
                Some(creation_time + max_age)
            } else {
                Some(OffsetDateTime::UNIX_EPOCH)
            }
        } else {
            parsed
                .expires()
                .and_then(|e| e.datetime())
                .map(|expires| match server_time {
                    Some(server) => creation_time + (expires - server),
                    None => expires,
                })
        };

        let same_site = match parsed.same_site() {
            Some(cookie::SameSite::Lax) => SameSite::Lax,
            Some(cookie::SameSite::Strict) => SameSite::Strict,
            Some(cookie::SameSite::None) => SameSite::NoRestriction,
            None => SameSite::Unspecified,
        };

        let cookie = CanonicalCookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            creation_time,
            expiration_time,
            last_access_time: creation_time,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
            same_site,
            priority: CookiePriority::Medium,
        };

        if cookie.validate_prefix(is_secure_origin(url)).is_err() {
            return fail(ExclusionReasons::INVALID_PREFIX);
        }
        Ok(cookie)
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        self.expiration_time
            .is_some_and(|expiry| expiry <= current_time)
    }

    pub fn is_persistent(&self) -> bool {
        self.expiration_time.is_some()
    }

    pub fn is_domain_cookie(&self) -> bool {
        !self.host_only
    }

    /// Same name, domain and path: a newer cookie replaces an older one.
    pub fn is_equivalent(&self, other: &CanonicalCookie) -> bool {
        self.name == other.name
            && self.domain.eq_ignore_ascii_case(&other.domain)
            && self.path == other.path
    }

    /// Validate __Secure- and __Host- cookie prefixes per RFC 6265bis.
    /// - __Secure- cookies MUST have the Secure attribute
    /// - __Host- cookies MUST have Secure, Path="/", and no Domain attribute
    pub fn validate_prefix(&self, secure_origin: bool) -> Result<(), NetError> {
        if self.name.starts_with("__Secure-") && (!self.secure || !secure_origin) {
            return Err(NetError::CookieInvalidPrefix);
        }

        if self.name.starts_with("__Host-")
            && (!self.secure || self.path != "/" || !self.host_only || !secure_origin)
        {
            return Err(NetError::CookieInvalidPrefix);
        }

        Ok(())
    }

    /// `name=value`, or just `value` for a nameless cookie.
    pub fn pair(&self) -> String {
        if self.name.is_empty() {
            self.value.clone()
        } else {
            format!("{}={}", self.name, self.value)
        }
    }
}

/// Builds a `Cookie` request header value from the included cookies.
pub fn build_cookie_line(cookies: &[CookieWithAccessResult]) -> String {
    cookies
        .iter()
        .map(|c| c.cookie.pair())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn now() -> OffsetDateTime {
        datetime!(2024-01-01 00:00:00 UTC)
    }

    #[test]
    fn test_create_host_only_cookie() {
        let c = CanonicalCookie::create(&url("https://www.example.com/a/b"), "id=42", now(), None)
            .unwrap();
        assert_eq!(c.name, "id");
        assert_eq!(c.value, "42");
        assert_eq!(c.domain, "www.example.com");
        assert!(c.host_only);
        assert_eq!(c.path, "/a");
        assert!(!c.is_persistent());
    }

    #[test]
    fn test_create_domain_cookie_with_attributes() {
        let c = CanonicalCookie::create(
            &url("https://www.example.com/"),
            "sid=abc; Domain=example.com; Path=/app; Secure; HttpOnly; SameSite=Strict",
            now(),
            None,
        )
        .unwrap();
        assert_eq!(c.domain, "example.com");
        assert!(c.is_domain_cookie());
        assert_eq!(c.path, "/app");
        assert!(c.secure);
        assert!(c.http_only);
        assert_eq!(c.same_site, SameSite::Strict);
    }

    #[test]
    fn test_create_rejects_foreign_domain() {
        let status = CanonicalCookie::create(
            &url("https://www.example.com/"),
            "a=b; Domain=evil.com",
            now(),
            None,
        )
        .unwrap_err();
        assert!(status.has_exclusion_reason(ExclusionReasons::INVALID_DOMAIN));
    }

    #[test]
    fn test_create_rejects_public_suffix_domain() {
        let status =
            CanonicalCookie::create(&url("https://example.co.uk/"), "a=b; Domain=co.uk", now(), None)
                .unwrap_err();
        assert!(status.has_only_exclusion_reason(ExclusionReasons::INVALID_DOMAIN));
    }

    #[test]
    fn test_create_rejects_noncookieable_scheme() {
        let status =
            CanonicalCookie::create(&url("ftp://example.com/"), "a=b", now(), None).unwrap_err();
        assert!(status.has_exclusion_reason(ExclusionReasons::NONCOOKIEABLE_SCHEME));
    }

    #[test]
    fn test_create_invalid_prefix() {
        let status = CanonicalCookie::create(
            &url("http://example.com/"),
            "__Secure-token=1; Secure",
            now(),
            None,
        )
        .unwrap_err();
        assert!(status.has_exclusion_reason(ExclusionReasons::INVALID_PREFIX));

        assert!(CanonicalCookie::create(
            &url("https://example.com/"),
            "__Host-token=1; Secure; Path=/",
            now(),
            None
        )
        .is_ok());
    }

    #[test]
    fn test_max_age_wins_over_expires() {
        let c = CanonicalCookie::create(
            &url("https://example.com/"),
            "a=b; Max-Age=60; Expires=Wed, 21 Oct 2037 07:28:00 GMT",
            now(),
            None,
        )
        .unwrap();
        assert_eq!(c.expiration_time, Some(now() + time::Duration::seconds(60)));
    }

    #[test]
    fn test_expires_adjusted_by_server_time() {
        // Server clock is one hour ahead; the cookie lives one day.
        let server = now() + time::Duration::hours(1);
        let c = CanonicalCookie::create(
            &url("https://example.com/"),
            "a=b; Expires=Tue, 02 Jan 2024 01:00:00 GMT",
            now(),
            Some(server),
        )
        .unwrap();
        assert_eq!(c.expiration_time, Some(now() + time::Duration::days(1)));
    }

    #[test]
    fn test_non_positive_max_age_is_expired() {
        let c =
            CanonicalCookie::create(&url("https://example.com/"), "a=b; Max-Age=0", now(), None)
                .unwrap();
        assert!(c.is_expired(now()));
    }

    #[test]
    fn test_default_path() {
        assert_eq!(default_path(&url("https://e.com")), "/");
        assert_eq!(default_path(&url("https://e.com/file")), "/");
        assert_eq!(default_path(&url("https://e.com/dir/file")), "/dir");
    }

    #[test]
    fn test_build_cookie_line() {
        let make = |name: &str, value: &str| CookieWithAccessResult {
            cookie: CanonicalCookie::new(
                name.into(),
                value.into(),
                "e.com".into(),
                "/".into(),
                now(),
                None,
            ),
            status: CookieInclusionStatus::include(),
        };
        assert_eq!(
            build_cookie_line(&[make("a", "1"), make("b", "2")]),
            "a=1; b=2"
        );
        assert_eq!(build_cookie_line(&[]), "");
    }
}
