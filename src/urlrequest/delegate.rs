//! Embedder policy hooks consulted by the job.
//!
//! Mirrors Chromium's `NetworkDelegate`. Every hook has a permissive
//! default so implementors override only what they need.

use crate::base::completion::Completion;
use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::inclusion::{CookieAccessResultList, ExclusionReasons};
use crate::cookies::options::CookieOptions;
use crate::http::requestheaders::HttpRequestHeaders;
use crate::http::responseheaders::HttpResponseHeaders;
use crate::urlrequest::request::URLRequest;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use url::Url;

/// What the delegate decided after seeing the response headers.
#[derive(Debug, Clone, Default)]
pub struct HeadersReceivedDecision {
    /// Replaces the transaction's headers for everything downstream.
    pub override_response_headers: Option<Arc<HttpResponseHeaders>>,
    /// A redirect to exactly this URL keeps its own fragment.
    pub preserve_fragment_on_redirect_url: Option<Url>,
}

pub type BeforeStartResult = Completion<Result<HttpRequestHeaders, NetError>>;
pub type HeadersReceivedResult = Completion<Result<HeadersReceivedDecision, NetError>>;

pub trait NetworkDelegate: Send + Sync {
    /// Last chance to edit request headers. An error cancels the request.
    fn before_start_transaction(
        &self,
        _request: &URLRequest,
        headers: HttpRequestHeaders,
    ) -> BeforeStartResult {
        Completion::Ready(Ok(headers))
    }

    /// Called when response headers arrive. An error cancels the request.
    fn on_headers_received(
        &self,
        _request: &URLRequest,
        _original_headers: &Arc<HttpResponseHeaders>,
        _remote_endpoint: Option<SocketAddr>,
    ) -> HeadersReceivedResult {
        Completion::Ready(Ok(HeadersReceivedDecision::default()))
    }

    fn can_set_cookie(
        &self,
        _request: &URLRequest,
        _cookie: &CanonicalCookie,
        _options: &CookieOptions,
    ) -> bool {
        true
    }

    /// Moves cookies the user blocked from `included` to `excluded`,
    /// tagging them with [`ExclusionReasons::USER_PREFERENCES`]. Returns
    /// whether any cookies may be sent.
    fn annotate_and_move_user_blocked_cookies(
        &self,
        _request: &URLRequest,
        _included: &mut CookieAccessResultList,
        _excluded: &mut CookieAccessResultList,
    ) -> bool {
        true
    }
}

/// Moves every cookie in `included` to `excluded` as blocked by the user.
pub fn move_all_to_user_blocked(
    included: &mut CookieAccessResultList,
    excluded: &mut CookieAccessResultList,
) {
    for mut cookie in included.drain(..) {
        cookie
            .status
            .add_exclusion_reason(ExclusionReasons::USER_PREFERENCES);
        excluded.push(cookie);
    }
}

/// One host-specific header override.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HeaderOverrideRule {
    /// Substring the request host must contain.
    pub host_contains: String,
    /// Substring the path must contain, if set.
    #[serde(default)]
    pub path_contains: Option<String>,
    /// Headers set (replacing any existing value) when the rule matches.
    pub headers: Vec<(String, String)>,
}

impl HeaderOverrideRule {
    fn matches(&self, url: &Url) -> bool {
        let host_ok = url
            .host_str()
            .is_some_and(|h| h.contains(self.host_contains.as_str()));
        let path_ok = self
            .path_contains
            .as_deref()
            .map_or(true, |p| url.path().contains(p));
        host_ok && path_ok
    }
}

/// Applies per-host request header overrides (typically `User-Agent`)
/// before the transaction starts. The first matching rule wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderOverrideDelegate {
    pub rules: Vec<HeaderOverrideRule>,
}

impl HeaderOverrideDelegate {
    pub fn new(rules: Vec<HeaderOverrideRule>) -> Self {
        Self { rules }
    }

    /// Loads rules from a JSON document: `{"rules": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| {
            tracing::warn!(error = %e, "invalid header override rules");
            NetError::InvalidArgument
        })
    }

    pub fn apply(&self, url: &Url, headers: &mut HttpRequestHeaders) -> Result<(), NetError> {
        if let Some(rule) = self.rules.iter().find(|r| r.matches(url)) {
            tracing::debug!(host = %rule.host_contains, "applying header override");
            for (name, value) in &rule.headers {
                headers.set_header(name, value)?;
            }
        }
        Ok(())
    }
}

impl NetworkDelegate for HeaderOverrideDelegate {
    fn before_start_transaction(
        &self,
        request: &URLRequest,
        mut headers: HttpRequestHeaders,
    ) -> BeforeStartResult {
        Completion::Ready(self.apply(request.url(), &mut headers).map(|()| headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::inclusion::{CookieInclusionStatus, CookieWithAccessResult};
    use time::OffsetDateTime;

    const RULES: &str = r#"{
        "rules": [
            {
                "host_contains": "news.example.com",
                "path_contains": "/mobile",
                "headers": [["User-Agent", "MobileUA/1.0"], ["Cookie", "CONSENT=YES"]]
            },
            {
                "host_contains": "example.com",
                "headers": [["User-Agent", "DesktopUA/1.0"]]
            }
        ]
    }"#;

    #[test]
    fn test_rules_from_json() {
        let delegate = HeaderOverrideDelegate::from_json(RULES).unwrap();
        assert_eq!(delegate.rules.len(), 2);
        assert_eq!(delegate.rules[0].path_contains.as_deref(), Some("/mobile"));
        assert!(HeaderOverrideDelegate::from_json("{").is_err());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let delegate = HeaderOverrideDelegate::from_json(RULES).unwrap();
        let mut headers = HttpRequestHeaders::new();
        headers.set_header("User-Agent", "Default").unwrap();

        let url = Url::parse("https://news.example.com/mobile/feed").unwrap();
        delegate.apply(&url, &mut headers).unwrap();
        assert_eq!(headers.get_header("User-Agent"), Some("MobileUA/1.0"));
        assert_eq!(headers.get_header("Cookie"), Some("CONSENT=YES"));

        let mut headers = HttpRequestHeaders::new();
        let url = Url::parse("https://news.example.com/desktop").unwrap();
        delegate.apply(&url, &mut headers).unwrap();
        assert_eq!(headers.get_header("User-Agent"), Some("DesktopUA/1.0"));
        assert!(!headers.has_header("Cookie"));
    }

    #[test]
    fn test_no_match_leaves_headers() {
        let delegate = HeaderOverrideDelegate::from_json(RULES).unwrap();
        let mut headers = HttpRequestHeaders::new();
        delegate
            .apply(&Url::parse("https://other.org/").unwrap(), &mut headers)
            .unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_move_all_to_user_blocked() {
        let cookie = CanonicalCookie::new(
            "a".into(),
            "1".into(),
            "e.com".into(),
            "/".into(),
            OffsetDateTime::now_utc(),
            None,
        );
        let mut included = vec![CookieWithAccessResult {
            cookie,
            status: CookieInclusionStatus::include(),
        }];
        let mut excluded = Vec::new();
        move_all_to_user_blocked(&mut included, &mut excluded);
        assert!(included.is_empty());
        assert!(excluded[0]
            .status
            .has_only_exclusion_reason(ExclusionReasons::USER_PREFERENCES));
    }
}
