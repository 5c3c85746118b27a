use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::fmt;
use std::str::FromStr;

pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
pub const AUTHORIZATION: &str = "Authorization";
pub const COOKIE: &str = "Cookie";
pub const PROXY_AUTHORIZATION: &str = "Proxy-Authorization";
pub const RANGE: &str = "Range";
pub const REFERER: &str = "Referer";
pub const USER_AGENT: &str = "User-Agent";

/// Request headers that strictly preserve insertion order.
///
/// Setting an existing header (case-insensitive match) updates it in place,
/// so the wire order is the order in which each name was first set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequestHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl HttpRequestHeaders {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let name = HeaderName::from_str(name).map_err(|_| NetError::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;

        if let Some((_, v)) = self.headers.iter_mut().find(|(n, _)| *n == name) {
            *v = value;
        } else {
            self.headers.push((name, value));
        }
        Ok(())
    }

    /// Sets `name` only if it is not already present.
    pub fn set_header_if_missing(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        if self.has_header(name) {
            return Ok(());
        }
        self.set_header(name, value)
    }

    pub fn remove_header(&mut self, name: &str) {
        if let Ok(target) = HeaderName::from_str(name) {
            self.headers.retain(|(n, _)| *n != target);
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        let target = HeaderName::from_str(name).ok()?;
        self.headers
            .iter()
            .find(|(n, _)| *n == target)
            .map(|(_, v)| v)
    }

    /// Returns the header value as a string, if present and visible ASCII.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    /// Copies every header of `other` into `self`, overwriting duplicates.
    pub fn merge_from(&mut self, other: &HttpRequestHeaders) {
        for (name, value) in &other.headers {
            if let Some((_, v)) = self.headers.iter_mut().find(|(n, _)| n == name) {
                *v = value.clone();
            } else {
                self.headers.push((name.clone(), value.clone()));
            }
        }
    }

    pub fn clear(&mut self) {
        self.headers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Converts into a standard `http::HeaderMap`, keeping insertion order.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            map.append(name.clone(), value.clone());
        }
        map
    }
}

impl fmt::Display for HttpRequestHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write!(f, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()))?;
        }
        write!(f, "\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut headers = HttpRequestHeaders::new();
        headers.set_header("Content-Type", "application/json").unwrap();
        assert_eq!(headers.get_header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_update_in_place_keeps_order() {
        let mut headers = HttpRequestHeaders::new();
        headers.set_header("Host", "example.com").unwrap();
        headers.set_header("Accept", "text/html").unwrap();
        headers.set_header("HOST", "updated.com").unwrap();

        let names: Vec<_> = headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["host", "accept"]);
        assert_eq!(headers.get_header("Host"), Some("updated.com"));
    }

    #[test]
    fn test_set_header_if_missing() {
        let mut headers = HttpRequestHeaders::new();
        headers.set_header(USER_AGENT, "custom").unwrap();
        headers.set_header_if_missing(USER_AGENT, "default").unwrap();
        headers.set_header_if_missing(ACCEPT_LANGUAGE, "en-US").unwrap();
        assert_eq!(headers.get_header(USER_AGENT), Some("custom"));
        assert_eq!(headers.get_header(ACCEPT_LANGUAGE), Some("en-US"));
    }

    #[test]
    fn test_remove_header() {
        let mut headers = HttpRequestHeaders::new();
        headers.set_header(REFERER, "https://evil.example/").unwrap();
        headers.remove_header("referer");
        assert!(!headers.has_header(REFERER));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut headers = HttpRequestHeaders::new();
        assert_eq!(
            headers.set_header("Bad Name", "v"),
            Err(NetError::InvalidHeader)
        );
        assert_eq!(
            headers.set_header("X-Ok", "line\nbreak"),
            Err(NetError::InvalidHeader)
        );
    }

    #[test]
    fn test_merge_from() {
        let mut base = HttpRequestHeaders::new();
        base.set_header("A", "1").unwrap();
        let mut extra = HttpRequestHeaders::new();
        extra.set_header("a", "2").unwrap();
        extra.set_header("B", "3").unwrap();
        base.merge_from(&extra);
        assert_eq!(base.get_header("A"), Some("2"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_display_wire_format() {
        let mut headers = HttpRequestHeaders::new();
        headers.set_header("Host", "example.com").unwrap();
        assert_eq!(headers.to_string(), "host: example.com\r\n\r\n");
    }
}
