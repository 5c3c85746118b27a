//! Parsed HTTP response headers.
//!
//! Based on Chromium's `HttpResponseHeaders`: a status line plus an ordered
//! multimap. Values are kept exactly as received; helpers expose the
//! comma-split and normalized views the job needs.

use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode, Version};
use std::str::FromStr;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct HttpResponseHeaders {
    version: Version,
    status: StatusCode,
    reason: String,
    headers: HeaderMap,
}

impl HttpResponseHeaders {
    /// Creates headers with the given status and no fields.
    pub fn new(status: u16) -> Result<Self, NetError> {
        let status = StatusCode::from_u16(status).map_err(|_| NetError::InvalidResponse)?;
        Ok(Self {
            version: Version::HTTP_11,
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
        })
    }

    /// Parses a raw header block (`HTTP/1.1 200 OK\r\nName: value\r\n...`).
    ///
    /// Both `\r\n` and bare `\n` line endings are accepted. Parsing stops at
    /// the first empty line.
    pub fn parse(raw: &str) -> Result<Self, NetError> {
        let mut lines = raw.split('\n').map(|l| l.trim_end_matches('\r'));
        let status_line = lines.next().ok_or(NetError::InvalidResponse)?;

        let mut parts = status_line.splitn(3, ' ');
        let version = match parts.next() {
            Some("HTTP/1.0") => Version::HTTP_10,
            Some("HTTP/1.1") => Version::HTTP_11,
            Some("HTTP/2") | Some("HTTP/2.0") => Version::HTTP_2,
            Some("HTTP/3") => Version::HTTP_3,
            _ => return Err(NetError::InvalidResponse),
        };
        let code = parts
            .next()
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or(NetError::InvalidResponse)?;
        let status = StatusCode::from_u16(code).map_err(|_| NetError::InvalidResponse)?;
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let mut headers = HeaderMap::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').ok_or(NetError::InvalidResponse)?;
            let name = HeaderName::from_str(name.trim()).map_err(|_| NetError::InvalidHeader)?;
            let value =
                HeaderValue::from_str(value.trim()).map_err(|_| NetError::InvalidHeader)?;
            headers.append(name, value);
        }

        Ok(Self {
            version,
            status,
            reason,
            headers,
        })
    }

    /// Builder-style append, used when synthesizing responses.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, NetError> {
        self.add_header(name, value)?;
        Ok(self)
    }

    pub fn add_header(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let name = HeaderName::from_str(name).map_err(|_| NetError::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;
        self.headers.append(name, value);
        Ok(())
    }

    pub fn remove_header(&mut self, name: &str) {
        if let Ok(name) = HeaderName::from_str(name) {
            self.headers.remove(name);
        }
    }

    pub fn response_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.reason
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name.to_ascii_lowercase().as_str())
    }

    /// First value of `name`.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    /// Every line carrying `name`, in received order. Values are not
    /// comma-split, which is what `Set-Cookie` requires.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let name = name.to_ascii_lowercase();
        self.headers
            .get_all(name.as_str())
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Comma-separated values of `name` across all lines, trimmed, empty
    /// items dropped.
    pub fn enumerate_header_values(&self, name: &str) -> Vec<String> {
        self.get_all(name)
            .flat_map(|line| line.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// All lines of `name` joined with `", "`.
    pub fn get_normalized_header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self.get_all(name).collect();
        if values.is_empty() {
            return None;
        }
        Some(values.join(", "))
    }

    /// Lowercased media type of `Content-Type`, without parameters.
    pub fn mime_type(&self) -> Option<String> {
        let content_type = self.get_header("content-type")?;
        let mime = content_type.split(';').next()?.trim();
        if mime.is_empty() {
            return None;
        }
        Some(mime.to_ascii_lowercase())
    }

    /// Lowercased `charset` parameter of `Content-Type`.
    pub fn charset(&self) -> Option<String> {
        let content_type = self.get_header("content-type")?;
        content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("charset") {
                return None;
            }
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_ascii_lowercase())
        })
    }

    pub fn content_length(&self) -> Option<u64> {
        self.get_header("content-length")?.trim().parse().ok()
    }

    /// Value of the `Date` header.
    pub fn date(&self) -> Option<OffsetDateTime> {
        parse_http_date(self.get_header("date")?)
    }

    /// Location of a redirect response, if this is one.
    pub fn redirect_location(&self) -> Option<&str> {
        if !is_redirect_status(self.response_code()) {
            return None;
        }
        self.get_header("location").filter(|l| !l.is_empty())
    }
}

pub fn is_redirect_status(code: u16) -> bool {
    matches!(code, 300 | 301 | 302 | 303 | 307 | 308)
}

/// Parses an HTTP date in IMF-fixdate (RFC 1123) form.
pub fn parse_http_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(date) = OffsetDateTime::parse(value, &Rfc2822) {
        return Some(date);
    }
    let numeric = value
        .strip_suffix(" GMT")
        .or_else(|| value.strip_suffix(" UTC"))
        .map(|v| format!("{v} +0000"))?;
    OffsetDateTime::parse(&numeric, &Rfc2822).ok()
}
