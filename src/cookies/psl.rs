//! Public Suffix List lookups for cookie domains and sites.
//!
//! Uses Mozilla's list via the `psl` crate. A cookie may never be scoped to
//! a public suffix such as `com` or `co.uk` unless that suffix is the
//! request host itself, in which case it becomes host-only.

use crate::base::neterror::NetError;
use psl::{List, Psl};
use url::{Host, Url};

/// Whether `domain` is itself a public suffix.
pub fn is_public_suffix(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    List.suffix(domain.as_bytes())
        .is_some_and(|suffix| suffix.as_bytes() == domain.as_bytes())
}

/// eTLD+1 of `domain`, or `None` when `domain` is a public suffix.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    psl::domain(domain.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(str::to_string)
}

/// Resolves a `Domain` attribute against the URL it was received from.
///
/// Returns the cookie's domain and whether it is host-only.
pub fn cookie_domain(url: &Url, domain_attr: Option<&str>) -> Result<(String, bool), NetError> {
    let host = url
        .host_str()
        .ok_or(NetError::InvalidUrl)?
        .trim_end_matches('.')
        .to_ascii_lowercase();

    let attr = domain_attr
        .map(|d| d.trim().trim_start_matches('.').trim_end_matches('.').to_ascii_lowercase())
        .unwrap_or_default();
    if attr.is_empty() {
        return Ok((host, true));
    }

    // IP literals only accept a Domain equal to themselves.
    if matches!(url.host(), Some(Host::Ipv4(_)) | Some(Host::Ipv6(_))) {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        let attr_bare = attr.trim_start_matches('[').trim_end_matches(']');
        return if bare == attr_bare {
            Ok((host, true))
        } else {
            Err(NetError::InvalidArgument)
        };
    }

    if is_public_suffix(&attr) {
        if attr == host {
            return Ok((host, true));
        }
        tracing::debug!(domain = %attr, "rejecting cookie scoped to public suffix");
        return Err(NetError::CookiePublicSuffix);
    }

    if host == attr || host.ends_with(&format!(".{attr}")) {
        Ok((attr, false))
    } else {
        Err(NetError::InvalidArgument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_is_public_suffix() {
        assert!(is_public_suffix("com"));
        assert!(is_public_suffix("CO.UK"));
        assert!(is_public_suffix("github.io"));
        assert!(!is_public_suffix("example.com"));
        assert!(!is_public_suffix("sub.example.com"));
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("deep.sub.example.com").as_deref(), Some("example.com"));
        assert_eq!(registrable_domain("sub.example.co.uk").as_deref(), Some("example.co.uk"));
        assert_eq!(registrable_domain("co.uk"), None);
    }

    #[test]
    fn test_cookie_domain_host_only() {
        let u = url("https://www.example.com/");
        assert_eq!(cookie_domain(&u, None).unwrap(), ("www.example.com".to_string(), true));
        assert_eq!(cookie_domain(&u, Some("")).unwrap(), ("www.example.com".to_string(), true));
    }

    #[test]
    fn test_cookie_domain_parent() {
        let u = url("https://www.example.com/");
        assert_eq!(
            cookie_domain(&u, Some(".Example.com")).unwrap(),
            ("example.com".to_string(), false)
        );
    }

    #[test]
    fn test_cookie_domain_mismatch_and_suffix() {
        let u = url("https://www.example.com/");
        assert_eq!(cookie_domain(&u, Some("other.com")), Err(NetError::InvalidArgument));
        assert_eq!(cookie_domain(&u, Some("com")), Err(NetError::CookiePublicSuffix));
        assert_eq!(cookie_domain(&u, Some("ample.com")), Err(NetError::InvalidArgument));
    }

    #[test]
    fn test_cookie_domain_ip_host() {
        let u = url("http://192.168.0.1/");
        assert_eq!(
            cookie_domain(&u, Some("192.168.0.1")).unwrap(),
            ("192.168.0.1".to_string(), true)
        );
        assert!(cookie_domain(&u, Some("168.0.1")).is_err());
    }
}
