//! Site and isolation primitives.
//!
//! Mirrors Chromium's `SchemefulSite`, `SiteForCookies`,
//! `NetworkIsolationKey` and `IsolationInfo`, reduced to what request
//! orchestration needs: same-site comparisons and a partition key that is
//! handed to the transport-security state.

use crate::cookies::psl;
use std::fmt;
use url::{Host, Url};

/// A scheme plus registrable domain (eTLD+1), e.g. `https://example.com`.
///
/// Hosts without a registrable domain (IP literals, `localhost`, bare public
/// suffixes) use the full host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemefulSite {
    scheme: String,
    site: String,
}

impl SchemefulSite {
    pub fn new(url: &Url) -> Self {
        let scheme = match url.scheme() {
            "wss" => "https",
            "ws" => "http",
            other => other,
        }
        .to_string();
        let site = match url.host() {
            Some(Host::Domain(domain)) => {
                psl::registrable_domain(domain).unwrap_or_else(|| domain.to_lowercase())
            }
            Some(host) => host.to_string(),
            None => String::new(),
        };
        Self { scheme, site }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn registrable_domain_or_host(&self) -> &str {
        &self.site
    }

    pub fn is_same_site(&self, url: &Url) -> bool {
        *self == SchemefulSite::new(url)
    }
}

impl fmt::Display for SchemefulSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.site)
    }
}

/// The site used for first-party checks of cookies. `None` means the
/// request has no first party (always cross-site).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiteForCookies {
    site: Option<SchemefulSite>,
}

impl SiteForCookies {
    pub fn from_url(url: &Url) -> Self {
        Self {
            site: Some(SchemefulSite::new(url)),
        }
    }

    /// A site-for-cookies that matches nothing.
    pub fn null() -> Self {
        Self { site: None }
    }

    pub fn is_null(&self) -> bool {
        self.site.is_none()
    }

    /// Whether `url` is first-party with respect to this site.
    pub fn is_first_party(&self, url: &Url) -> bool {
        self.site.as_ref().is_some_and(|s| s.is_same_site(url))
    }
}

/// Cache/partition key: (top frame site, frame site).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NetworkIsolationKey {
    top_frame_site: Option<SchemefulSite>,
    frame_site: Option<SchemefulSite>,
}

impl NetworkIsolationKey {
    pub fn new(top_frame_site: SchemefulSite, frame_site: SchemefulSite) -> Self {
        Self {
            top_frame_site: Some(top_frame_site),
            frame_site: Some(frame_site),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top_frame_site.is_none() && self.frame_site.is_none()
    }

    pub fn top_frame_site(&self) -> Option<&SchemefulSite> {
        self.top_frame_site.as_ref()
    }

    pub fn frame_site(&self) -> Option<&SchemefulSite> {
        self.frame_site.as_ref()
    }
}

/// Which kind of frame a request is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestType {
    MainFrame,
    SubFrame,
    #[default]
    Other,
}

/// Isolation context of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IsolationInfo {
    pub request_type: RequestType,
    pub top_frame_origin: Option<Url>,
    pub network_isolation_key: NetworkIsolationKey,
}

impl IsolationInfo {
    /// Isolation info for a top-level navigation to `url`.
    pub fn for_main_frame(url: &Url) -> Self {
        let site = SchemefulSite::new(url);
        Self {
            request_type: RequestType::MainFrame,
            top_frame_origin: Some(url.clone()),
            network_isolation_key: NetworkIsolationKey::new(site.clone(), site),
        }
    }

    pub fn is_main_frame(&self) -> bool {
        self.request_type == RequestType::MainFrame
    }

    pub fn is_sub_frame(&self) -> bool {
        self.request_type == RequestType::SubFrame
    }
}

/// Host and port of a URL, as handed to the Expect-CT processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPortPair {
    pub host: String,
    pub port: u16,
}

impl HostPortPair {
    pub fn from_url(url: &Url) -> Option<Self> {
        Some(Self {
            host: url.host_str()?.to_string(),
            port: url.port_or_known_default()?,
        })
    }
}

impl fmt::Display for HostPortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Whether `url` points at the local machine.
pub fn is_localhost(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Whether the URL's host is an IP literal.
pub fn host_is_ip_address(url: &Url) -> bool {
    matches!(url.host(), Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)))
}

/// Whether the scheme is cryptographic (`https` or `wss`).
pub fn scheme_is_cryptographic(url: &Url) -> bool {
    matches!(url.scheme(), "https" | "wss")
}
