//! Forwards a response's transport-security headers to the security state.

use crate::base::isolation::{host_is_ip_address, HostPortPair, NetworkIsolationKey};
use crate::http::responseheaders::HttpResponseHeaders;
use crate::tls::sslinfo::SslInfo;
use crate::tls::state::TransportSecurityState;
use url::Url;

pub const STRICT_TRANSPORT_SECURITY: &str = "strict-transport-security";
pub const EXPECT_CT: &str = "expect-ct";

/// Headers are only trusted over a valid TLS connection with no
/// certificate errors. IP literal hosts never record transport security.
fn accepts_security_headers(url: &Url, ssl_info: &SslInfo) -> bool {
    ssl_info.is_valid() && !ssl_info.cert_status.is_error() && !host_is_ip_address(url)
}

/// Forwards the first `Strict-Transport-Security` value verbatim.
pub fn process_strict_transport_security(
    state: &dyn TransportSecurityState,
    url: &Url,
    headers: &HttpResponseHeaders,
    ssl_info: &SslInfo,
) {
    if !accepts_security_headers(url, ssl_info) {
        return;
    }
    let Some(host) = url.host_str() else {
        return;
    };
    if let Some(value) = headers
        .enumerate_header_values(STRICT_TRANSPORT_SECURITY)
        .into_iter()
        .next()
    {
        tracing::trace!(%host, %value, "forwarding hsts header");
        state.add_hsts_header(host, &value);
    }
}

/// Forwards the comma-joined `Expect-CT` value.
pub fn process_expect_ct(
    state: &dyn TransportSecurityState,
    url: &Url,
    headers: &HttpResponseHeaders,
    ssl_info: &SslInfo,
    network_isolation_key: &NetworkIsolationKey,
) {
    if !accepts_security_headers(url, ssl_info) {
        return;
    }
    let (Some(value), Some(host_port)) = (
        headers.get_normalized_header(EXPECT_CT),
        HostPortPair::from_url(url),
    ) else {
        return;
    };
    state.process_expect_ct_header(&value, &host_port, ssl_info, network_isolation_key);
}

/// Runs both processors; a missing state disables processing.
pub fn process_security_headers(
    state: Option<&dyn TransportSecurityState>,
    url: &Url,
    headers: &HttpResponseHeaders,
    ssl_info: &SslInfo,
    network_isolation_key: &NetworkIsolationKey,
) {
    let Some(state) = state else {
        return;
    };
    process_strict_transport_security(state, url, headers, ssl_info);
    process_expect_ct(state, url, headers, ssl_info, network_isolation_key);
}
