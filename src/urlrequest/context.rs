//! URL Request Context - the collaborators shared by every job.
//!
//! Based on Chromium's net::URLRequestContext: the transaction factory,
//! cookie store, transport security state, delegate, throttler and
//! observer are all injected here and handed to jobs as one `Arc`.

use crate::base::neterror::NetError;
use crate::cookies::store::CookieStore;
use crate::filter::filterstream::{DefaultFilterFactory, FilterFactory};
use crate::http::transaction::HttpTransactionFactory;
use crate::tls::state::TransportSecurityState;
use crate::urlrequest::delegate::NetworkDelegate;
use crate::urlrequest::observer::JobObserver;
use crate::urlrequest::throttle::Throttler;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// `User-Agent` and `Accept-Language` defaults for requests that do not
/// set their own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpUserAgentSettings {
    pub user_agent: String,
    /// Empty disables the header.
    #[serde(default)]
    pub accept_language: String,
}

impl Default for HttpUserAgentSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl HttpUserAgentSettings {
    pub fn new(user_agent: impl Into<String>, accept_language: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept_language: accept_language.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| {
            tracing::warn!(error = %e, "invalid user agent settings");
            NetError::InvalidArgument
        })
    }
}

/// Configuration options for URLRequestContext.
#[derive(Clone)]
pub struct URLRequestContextConfig {
    /// Advertise and decode `br` (secure or localhost origins only).
    pub enable_brotli: bool,

    /// Non-HTTP schemes a redirect may target.
    pub safe_redirect_schemes: Vec<String>,
}

impl Default for URLRequestContextConfig {
    fn default() -> Self {
        Self {
            enable_brotli: cfg!(feature = "brotli"),
            safe_redirect_schemes: Vec::new(),
        }
    }
}

impl std::fmt::Debug for URLRequestContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("URLRequestContextConfig")
            .field("enable_brotli", &self.enable_brotli)
            .field("safe_redirect_schemes", &self.safe_redirect_schemes)
            .finish()
    }
}

/// Shared configuration and collaborators for jobs.
pub struct URLRequestContext {
    config: URLRequestContextConfig,
    transaction_factory: Arc<dyn HttpTransactionFactory>,
    cookie_store: Option<Arc<dyn CookieStore>>,
    transport_security_state: Option<Arc<dyn TransportSecurityState>>,
    network_delegate: Option<Arc<dyn NetworkDelegate>>,
    throttler: Option<Arc<dyn Throttler>>,
    observer: Option<Arc<dyn JobObserver>>,
    filter_factory: Arc<dyn FilterFactory>,
    user_agent_settings: Option<HttpUserAgentSettings>,
}

impl URLRequestContext {
    pub fn builder() -> URLRequestContextBuilder {
        URLRequestContextBuilder::default()
    }

    pub fn config(&self) -> &URLRequestContextConfig {
        &self.config
    }

    pub fn enable_brotli(&self) -> bool {
        self.config.enable_brotli
    }

    pub fn transaction_factory(&self) -> &Arc<dyn HttpTransactionFactory> {
        &self.transaction_factory
    }

    pub fn cookie_store(&self) -> Option<&Arc<dyn CookieStore>> {
        self.cookie_store.as_ref()
    }

    pub fn transport_security_state(&self) -> Option<&Arc<dyn TransportSecurityState>> {
        self.transport_security_state.as_ref()
    }

    pub fn network_delegate(&self) -> Option<&Arc<dyn NetworkDelegate>> {
        self.network_delegate.as_ref()
    }

    pub fn throttler(&self) -> Option<&Arc<dyn Throttler>> {
        self.throttler.as_ref()
    }

    pub fn observer(&self) -> Option<&Arc<dyn JobObserver>> {
        self.observer.as_ref()
    }

    pub fn filter_factory(&self) -> &Arc<dyn FilterFactory> {
        &self.filter_factory
    }

    pub fn user_agent_settings(&self) -> Option<&HttpUserAgentSettings> {
        self.user_agent_settings.as_ref()
    }

    /// Whether a redirect to a non-HTTP `location` is allowed.
    pub fn is_safe_redirect_target(&self, location: &Url) -> bool {
        self.config
            .safe_redirect_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(location.scheme()))
    }
}

impl std::fmt::Debug for URLRequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("URLRequestContext")
            .field("config", &self.config)
            .field("cookie_store", &self.cookie_store.is_some())
            .field("transport_security_state", &self.transport_security_state.is_some())
            .field("network_delegate", &self.network_delegate.is_some())
            .field("throttler", &self.throttler.is_some())
            .field("observer", &self.observer.is_some())
            .field("user_agent_settings", &self.user_agent_settings)
            .finish()
    }
}

/// Builder for [`URLRequestContext`]. Only the transaction factory is
/// required.
#[derive(Default)]
pub struct URLRequestContextBuilder {
    config: URLRequestContextConfig,
    transaction_factory: Option<Arc<dyn HttpTransactionFactory>>,
    cookie_store: Option<Arc<dyn CookieStore>>,
    transport_security_state: Option<Arc<dyn TransportSecurityState>>,
    network_delegate: Option<Arc<dyn NetworkDelegate>>,
    throttler: Option<Arc<dyn Throttler>>,
    observer: Option<Arc<dyn JobObserver>>,
    filter_factory: Option<Arc<dyn FilterFactory>>,
    user_agent_settings: Option<HttpUserAgentSettings>,
}

impl URLRequestContextBuilder {
    pub fn config(mut self, config: URLRequestContextConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transaction_factory(mut self, factory: Arc<dyn HttpTransactionFactory>) -> Self {
        self.transaction_factory = Some(factory);
        self
    }

    pub fn cookie_store(mut self, store: Arc<dyn CookieStore>) -> Self {
        self.cookie_store = Some(store);
        self
    }

    pub fn transport_security_state(mut self, state: Arc<dyn TransportSecurityState>) -> Self {
        self.transport_security_state = Some(state);
        self
    }

    pub fn network_delegate(mut self, delegate: Arc<dyn NetworkDelegate>) -> Self {
        self.network_delegate = Some(delegate);
        self
    }

    pub fn throttler(mut self, throttler: Arc<dyn Throttler>) -> Self {
        self.throttler = Some(throttler);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn filter_factory(mut self, factory: Arc<dyn FilterFactory>) -> Self {
        self.filter_factory = Some(factory);
        self
    }

    pub fn user_agent_settings(mut self, settings: HttpUserAgentSettings) -> Self {
        self.user_agent_settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<URLRequestContext, NetError> {
        let Some(transaction_factory) = self.transaction_factory else {
            tracing::warn!("URLRequestContext built without a transaction factory");
            return Err(NetError::InvalidArgument);
        };
        Ok(URLRequestContext {
            config: self.config,
            transaction_factory,
            cookie_store: self.cookie_store,
            transport_security_state: self.transport_security_state,
            network_delegate: self.network_delegate,
            throttler: self.throttler,
            observer: self.observer,
            filter_factory: self
                .filter_factory
                .unwrap_or_else(|| Arc::new(DefaultFilterFactory)),
            user_agent_settings: self.user_agent_settings,
        })
    }
}
