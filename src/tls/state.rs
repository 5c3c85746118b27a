//! Transport security state consulted by the job.

use crate::base::isolation::{HostPortPair, NetworkIsolationKey};
use crate::tls::expectct::{CtRequirement, ExpectCtStore};
use crate::tls::hsts::HstsStore;
use crate::tls::sslinfo::SslInfo;

/// Sink for HSTS and Expect-CT headers, and source of upgrade and
/// error-fatality decisions. Equivalent to Chromium's
/// `TransportSecurityState`.
pub trait TransportSecurityState: Send + Sync {
    fn should_upgrade_to_ssl(&self, host: &str) -> bool;

    fn add_hsts_header(&self, host: &str, value: &str);

    fn process_expect_ct_header(
        &self,
        value: &str,
        host_port: &HostPortPair,
        ssl_info: &SslInfo,
        network_isolation_key: &NetworkIsolationKey,
    );

    /// Certificate errors on HSTS hosts may not be clicked through.
    fn should_ssl_errors_be_fatal(&self, host: &str) -> bool;
}

/// In-memory state backed by [`HstsStore`] and [`ExpectCtStore`].
#[derive(Debug, Clone, Default)]
pub struct DefaultTransportSecurityState {
    hsts: HstsStore,
    expect_ct: ExpectCtStore,
}

impl DefaultTransportSecurityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hsts(hsts: HstsStore) -> Self {
        Self {
            hsts,
            expect_ct: ExpectCtStore::new(),
        }
    }

    pub fn hsts(&self) -> &HstsStore {
        &self.hsts
    }

    pub fn expect_ct(&self) -> &ExpectCtStore {
        &self.expect_ct
    }

    pub fn ct_requirement(&self, host: &str, network_isolation_key: &NetworkIsolationKey) -> CtRequirement {
        self.expect_ct.requirement(host, network_isolation_key)
    }
}

impl TransportSecurityState for DefaultTransportSecurityState {
    fn should_upgrade_to_ssl(&self, host: &str) -> bool {
        self.hsts.should_upgrade(host)
    }

    fn add_hsts_header(&self, host: &str, value: &str) {
        if let Err(e) = self.hsts.add_hsts_header(host, value) {
            tracing::debug!(%host, error = %e, "ignoring malformed Strict-Transport-Security");
        }
    }

    fn process_expect_ct_header(
        &self,
        value: &str,
        host_port: &HostPortPair,
        ssl_info: &SslInfo,
        network_isolation_key: &NetworkIsolationKey,
    ) {
        if let Err(e) = self
            .expect_ct
            .process_header(value, host_port, ssl_info, network_isolation_key)
        {
            tracing::debug!(host = %host_port, error = %e, "ignoring malformed Expect-CT");
        }
    }

    fn should_ssl_errors_be_fatal(&self, host: &str) -> bool {
        self.hsts.should_upgrade(host)
    }
}
