//! Expect-CT state.
//!
//! Hosts opt into Certificate Transparency enforcement with
//! `Expect-CT: max-age=86400, enforce, report-uri="https://..."`.
//! Entries are partitioned by network isolation key, as in Chromium's
//! `TransportSecurityState::ProcessExpectCTHeader`.

use crate::base::isolation::{HostPortPair, NetworkIsolationKey};
use crate::base::neterror::NetError;
use crate::tls::sslinfo::SslInfo;
use dashmap::DashMap;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use url::Url;

/// Upper bound applied to `max-age` (30 days).
pub const MAX_EXPECT_CT_AGE_SECS: u64 = 86_400 * 30;

/// What a host asked of its certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtRequirement {
    NotRequired,
    /// Report violations, keep the connection.
    ReportOnly,
    /// Connections without compliant CT fail.
    Required,
}

/// Parsed `Expect-CT` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectCtDirectives {
    pub max_age: u64,
    pub enforce: bool,
    pub report_uri: Option<Url>,
}

impl ExpectCtDirectives {
    pub fn parse(value: &str) -> Result<Self, NetError> {
        let mut max_age = None;
        let mut enforce = false;
        let mut report_uri = None;

        for directive in value.split(',') {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }
            let (name, arg) = match directive.split_once('=') {
                Some((name, arg)) => (name.trim(), Some(arg.trim().trim_matches('"'))),
                None => (directive, None),
            };

            if name.eq_ignore_ascii_case("max-age") {
                let arg = arg.ok_or(NetError::InvalidHeader)?;
                if max_age.is_some() || !arg.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(NetError::InvalidHeader);
                }
                let secs = arg.parse::<u64>().map_err(|_| NetError::InvalidHeader)?;
                max_age = Some(secs.min(MAX_EXPECT_CT_AGE_SECS));
            } else if name.eq_ignore_ascii_case("enforce") {
                if enforce || arg.is_some() {
                    return Err(NetError::InvalidHeader);
                }
                enforce = true;
            } else if name.eq_ignore_ascii_case("report-uri") {
                let arg = arg.ok_or(NetError::InvalidHeader)?;
                if report_uri.is_some() {
                    return Err(NetError::InvalidHeader);
                }
                report_uri = Some(Url::parse(arg).map_err(|_| NetError::InvalidHeader)?);
            }
        }

        Ok(Self {
            max_age: max_age.ok_or(NetError::InvalidHeader)?,
            enforce,
            report_uri,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectCtEntry {
    pub expiry: OffsetDateTime,
    pub enforce: bool,
    pub report_uri: Option<Url>,
}

type ExpectCtKey = (String, NetworkIsolationKey);

/// Expect-CT hosts, keyed by host and network isolation key.
#[derive(Debug, Clone, Default)]
pub struct ExpectCtStore {
    entries: Arc<DashMap<ExpectCtKey, ExpectCtEntry>>,
}

impl ExpectCtStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a host's `Expect-CT` value. Headers are ignored unless the
    /// connection chained to a publicly trusted root.
    pub fn process_header(
        &self,
        value: &str,
        host_port: &HostPortPair,
        ssl_info: &SslInfo,
        network_isolation_key: &NetworkIsolationKey,
    ) -> Result<(), NetError> {
        self.process_header_at(
            value,
            host_port,
            ssl_info,
            network_isolation_key,
            OffsetDateTime::now_utc(),
        )
    }

    pub fn process_header_at(
        &self,
        value: &str,
        host_port: &HostPortPair,
        ssl_info: &SslInfo,
        network_isolation_key: &NetworkIsolationKey,
        now: OffsetDateTime,
    ) -> Result<(), NetError> {
        if !ssl_info.is_issued_by_known_root {
            tracing::trace!(host = %host_port, "expect-ct ignored for private root");
            return Ok(());
        }
        let directives = ExpectCtDirectives::parse(value)?;
        let key = (host_port.host.to_ascii_lowercase(), network_isolation_key.clone());
        if directives.max_age == 0 {
            self.entries.remove(&key);
            return Ok(());
        }
        tracing::debug!(
            host = %host_port,
            enforce = directives.enforce,
            max_age = directives.max_age,
            "expect-ct entry added"
        );
        self.entries.insert(
            key,
            ExpectCtEntry {
                expiry: now + Duration::seconds(directives.max_age as i64),
                enforce: directives.enforce,
                report_uri: directives.report_uri,
            },
        );
        Ok(())
    }

    pub fn requirement(&self, host: &str, network_isolation_key: &NetworkIsolationKey) -> CtRequirement {
        self.requirement_at(host, network_isolation_key, OffsetDateTime::now_utc())
    }

    pub fn requirement_at(
        &self,
        host: &str,
        network_isolation_key: &NetworkIsolationKey,
        now: OffsetDateTime,
    ) -> CtRequirement {
        let key = (host.to_ascii_lowercase(), network_isolation_key.clone());
        match self.entries.get(&key) {
            Some(entry) if now < entry.expiry => {
                if entry.enforce {
                    CtRequirement::Required
                } else {
                    CtRequirement::ReportOnly
                }
            }
            _ => CtRequirement::NotRequired,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
