//! HTTP Strict Transport Security state.
//!
//! Holds preloaded and dynamically learned HSTS hosts and parses
//! `Strict-Transport-Security` values the way Chromium's
//! `ParseHSTSHeader` does: `max-age` is required, directives may not
//! repeat, and unknown directives are ignored.

use crate::base::neterror::NetError;
use dashmap::DashMap;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Upper bound applied to `max-age` (one year).
pub const MAX_HSTS_AGE_SECS: u64 = 86_400 * 365;

/// Parsed `Strict-Transport-Security` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StsDirectives {
    pub max_age: u64,
    pub include_subdomains: bool,
}

impl StsDirectives {
    pub fn parse(value: &str) -> Result<Self, NetError> {
        let mut max_age = None;
        let mut include_subdomains = false;

        for directive in value.split(';') {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }
            let (name, arg) = match directive.split_once('=') {
                Some((name, arg)) => (name.trim(), Some(arg.trim())),
                None => (directive, None),
            };

            if name.eq_ignore_ascii_case("max-age") {
                if max_age.is_some() {
                    return Err(NetError::InvalidHeader);
                }
                let arg = arg.ok_or(NetError::InvalidHeader)?;
                let arg = arg.trim_matches('"');
                if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(NetError::InvalidHeader);
                }
                // Overlong values saturate instead of failing.
                let secs = arg.parse::<u64>().unwrap_or(u64::MAX);
                max_age = Some(secs.min(MAX_HSTS_AGE_SECS));
            } else if name.eq_ignore_ascii_case("includesubdomains") {
                if include_subdomains || arg.is_some() {
                    return Err(NetError::InvalidHeader);
                }
                include_subdomains = true;
            }
        }

        Ok(Self {
            max_age: max_age.ok_or(NetError::InvalidHeader)?,
            include_subdomains,
        })
    }
}

/// One HSTS host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HstsEntry {
    pub include_subdomains: bool,
    /// `None` for preloaded entries, which never expire.
    pub expiry: Option<OffsetDateTime>,
}

impl HstsEntry {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expiry.map_or(true, |expiry| now < expiry)
    }
}

fn canonical_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Thread-safe HSTS host set. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct HstsStore {
    entries: Arc<DashMap<String, HstsEntry>>,
}

impl HstsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `(host, include_subdomains)` preload pairs.
    pub fn with_preloaded<'a>(hosts: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let store = Self::new();
        for (host, include_subdomains) in hosts {
            store.add_preloaded(host, include_subdomains);
        }
        store
    }

    pub fn add_preloaded(&self, host: &str, include_subdomains: bool) {
        self.entries.insert(
            canonical_host(host),
            HstsEntry {
                include_subdomains,
                expiry: None,
            },
        );
    }

    /// Whether `host` (or a parent covering subdomains) is a live HSTS host.
    pub fn should_upgrade(&self, host: &str) -> bool {
        self.should_upgrade_at(host, OffsetDateTime::now_utc())
    }

    pub fn should_upgrade_at(&self, host: &str, now: OffsetDateTime) -> bool {
        let host = canonical_host(host);
        if self.entries.get(&host).is_some_and(|e| e.is_live(now)) {
            return true;
        }
        let mut rest = host.as_str();
        while let Some((_, parent)) = rest.split_once('.') {
            if let Some(entry) = self.entries.get(parent) {
                if entry.include_subdomains && entry.is_live(now) {
                    return true;
                }
            }
            rest = parent;
        }
        false
    }

    /// Applies a `Strict-Transport-Security` value received from `host`.
    /// `max-age=0` forgets the host.
    pub fn add_hsts_header(&self, host: &str, value: &str) -> Result<(), NetError> {
        self.add_hsts_header_at(host, value, OffsetDateTime::now_utc())
    }

    pub fn add_hsts_header_at(
        &self,
        host: &str,
        value: &str,
        now: OffsetDateTime,
    ) -> Result<(), NetError> {
        let directives = StsDirectives::parse(value)?;
        let host = canonical_host(host);
        if directives.max_age == 0 {
            tracing::debug!(%host, "hsts entry removed");
            self.entries.remove(&host);
            return Ok(());
        }
        tracing::debug!(
            %host,
            max_age = directives.max_age,
            include_subdomains = directives.include_subdomains,
            "hsts entry added"
        );
        self.entries.insert(
            host,
            HstsEntry {
                include_subdomains: directives.include_subdomains,
                expiry: Some(now + Duration::seconds(directives.max_age as i64)),
            },
        );
        Ok(())
    }

    pub fn get(&self, host: &str) -> Option<HstsEntry> {
        self.entries.get(&canonical_host(host)).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
