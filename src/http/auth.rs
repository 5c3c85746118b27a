//! Authentication challenge and credential types.
//!
//! The job never negotiates authentication itself; it surfaces the
//! transaction's challenge and hands credentials back on restart.

use base64::{engine::general_purpose, Engine as _};

/// Authentication scheme announced by a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Digest,
    Ntlm,
    Negotiate,
    Other,
}

impl AuthScheme {
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "basic" => AuthScheme::Basic,
            "digest" => AuthScheme::Digest,
            "ntlm" => AuthScheme::Ntlm,
            "negotiate" => AuthScheme::Negotiate,
            _ => AuthScheme::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "basic",
            AuthScheme::Digest => "digest",
            AuthScheme::Ntlm => "ntlm",
            AuthScheme::Negotiate => "negotiate",
            AuthScheme::Other => "other",
        }
    }
}

/// Username/password pair supplied in answer to a challenge.
///
/// Empty credentials are legal: they ask the transaction to retry with
/// whatever identity it can find on its own (cached or ambient).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthCredentials {
    pub username: String,
    pub password: String,
}

impl AuthCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }

    /// `Authorization` value for the Basic scheme.
    pub fn basic_header_value(&self) -> String {
        let creds = format!("{}:{}", self.username, self.password);
        format!("Basic {}", general_purpose::STANDARD.encode(creds))
    }
}

impl std::fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A challenge from a proxy (407) or an origin server (401).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallengeInfo {
    pub is_proxy: bool,
    /// Origin (or proxy host:port) that issued the challenge.
    pub challenger: String,
    pub scheme: AuthScheme,
    pub realm: String,
    /// Raw challenge value as received.
    pub challenge: String,
}

impl AuthChallengeInfo {
    /// Parses the first challenge of a `WWW-Authenticate` or
    /// `Proxy-Authenticate` value.
    pub fn parse(challenger: impl Into<String>, is_proxy: bool, value: &str) -> Option<Self> {
        let value = value.trim();
        let (scheme, params) = match value.split_once(char::is_whitespace) {
            Some((scheme, params)) => (scheme, params),
            None => (value, ""),
        };
        if scheme.is_empty() {
            return None;
        }
        let realm = params
            .split(',')
            .filter_map(|p| p.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("realm"))
            .map(|(_, v)| v.trim().trim_matches('"').to_string())
            .unwrap_or_default();

        Some(Self {
            is_proxy,
            challenger: challenger.into(),
            scheme: AuthScheme::parse(scheme),
            realm,
            challenge: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_header_value() {
        let creds = AuthCredentials::new("user", "pass");
        // base64("user:pass") = "dXNlcjpwYXNz"
        assert_eq!(creds.basic_header_value(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_empty_credentials() {
        assert!(AuthCredentials::default().is_empty());
        assert!(!AuthCredentials::new("u", "").is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = AuthCredentials::new("user", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_parse_challenge() {
        let info =
            AuthChallengeInfo::parse("https://example.com", false, "Basic realm=\"Secure Area\"")
                .unwrap();
        assert_eq!(info.scheme, AuthScheme::Basic);
        assert_eq!(info.realm, "Secure Area");
        assert!(!info.is_proxy);

        let digest = AuthChallengeInfo::parse(
            "proxy:8080",
            true,
            "Digest nonce=\"abc\", realm=\"corp\", qop=\"auth\"",
        )
        .unwrap();
        assert_eq!(digest.scheme, AuthScheme::Digest);
        assert_eq!(digest.realm, "corp");
        assert!(digest.is_proxy);
    }

    #[test]
    fn test_parse_bare_scheme() {
        let info = AuthChallengeInfo::parse("https://example.com", false, "Negotiate").unwrap();
        assert_eq!(info.scheme, AuthScheme::Negotiate);
        assert!(info.realm.is_empty());
        assert!(AuthChallengeInfo::parse("x", false, "   ").is_none());
    }
}
