use crate::base::isolation::{IsolationInfo, SiteForCookies};
use crate::base::loadflags::LoadFlags;
use crate::base::neterror::NetError;
use crate::base::priority::RequestPriority;
use crate::cookies::inclusion::{CookieAccessResultList, CookieAndLineAccessResultList};
use crate::filter::sourcetype::AcceptedEncodings;
use crate::http::requestheaders::HttpRequestHeaders;
use crate::http::transaction::{PrivacyMode, WebSocketHandshakeStreamCreateHelper};
use crate::http::upload::UploadDataStream;
use http::Method;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// The logical request a job works on.
///
/// Holds what the embedder decided about the request (URL chain, method,
/// referrer, cookie policy inputs) plus the records the job publishes back:
/// which cookies were considered for sending and storing, and the body
/// length received.
pub struct URLRequest {
    url_chain: Vec<Url>,
    method: Method,
    referrer: Option<Url>,
    site_for_cookies: SiteForCookies,
    initiator: Option<Url>,
    isolation_info: IsolationInfo,
    force_ignore_site_for_cookies: bool,
    allow_credentials: bool,
    privacy_mode: PrivacyMode,
    load_flags: LoadFlags,
    priority: RequestPriority,
    extra_request_headers: HttpRequestHeaders,
    upload: Option<UploadDataStream>,
    accepted_stream_types: AcceptedEncodings,
    websocket_helper: Option<Arc<dyn WebSocketHandshakeStreamCreateHelper>>,

    maybe_sent_cookies: CookieAccessResultList,
    maybe_stored_cookies: CookieAndLineAccessResultList,
    received_response_content_length: u64,
}

impl URLRequest {
    pub fn new(url_str: &str) -> Result<Self, NetError> {
        let url = Url::parse(url_str).map_err(|_| NetError::InvalidUrl)?;
        Ok(Self::from_url(url))
    }

    /// A GET request for `url` whose site-for-cookies is the URL itself.
    pub fn from_url(url: Url) -> Self {
        Self {
            site_for_cookies: SiteForCookies::from_url(&url),
            url_chain: vec![url],
            method: Method::GET,
            referrer: None,
            initiator: None,
            isolation_info: IsolationInfo::default(),
            force_ignore_site_for_cookies: false,
            allow_credentials: true,
            privacy_mode: PrivacyMode::Disabled,
            load_flags: LoadFlags::empty(),
            priority: RequestPriority::default(),
            extra_request_headers: HttpRequestHeaders::new(),
            upload: None,
            accepted_stream_types: AcceptedEncodings::default(),
            websocket_helper: None,
            maybe_sent_cookies: Vec::new(),
            maybe_stored_cookies: Vec::new(),
            received_response_content_length: 0,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the validated referrer. Any `Referer` in the extra headers is
    /// ignored in favor of this value.
    pub fn with_referrer(mut self, referrer: Url) -> Self {
        self.referrer = Some(referrer);
        self
    }

    pub fn with_site_for_cookies(mut self, site_for_cookies: SiteForCookies) -> Self {
        self.site_for_cookies = site_for_cookies;
        self
    }

    pub fn with_initiator(mut self, initiator: Url) -> Self {
        self.initiator = Some(initiator);
        self
    }

    pub fn with_isolation_info(mut self, isolation_info: IsolationInfo) -> Self {
        self.isolation_info = isolation_info;
        self
    }

    pub fn with_force_ignore_site_for_cookies(mut self, force: bool) -> Self {
        self.force_ignore_site_for_cookies = force;
        self
    }

    pub fn with_allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    pub fn with_privacy_mode(mut self, privacy_mode: PrivacyMode) -> Self {
        self.privacy_mode = privacy_mode;
        self
    }

    pub fn with_load_flags(mut self, load_flags: LoadFlags) -> Self {
        self.load_flags = load_flags;
        self
    }

    pub fn with_priority(mut self, priority: RequestPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_extra_request_headers(mut self, headers: HttpRequestHeaders) -> Self {
        self.extra_request_headers = headers;
        self
    }

    pub fn with_upload(mut self, upload: UploadDataStream) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn with_accepted_stream_types(mut self, accepted: AcceptedEncodings) -> Self {
        self.accepted_stream_types = accepted;
        self
    }

    pub fn with_websocket_helper(
        mut self,
        helper: Arc<dyn WebSocketHandshakeStreamCreateHelper>,
    ) -> Self {
        self.websocket_helper = Some(helper);
        self
    }

    /// Appends a redirect target to the URL chain.
    pub fn push_url(&mut self, url: Url) {
        self.url_chain.push(url);
    }

    /// Current URL: the last entry of the chain.
    pub fn url(&self) -> &Url {
        // The chain is created non-empty and only ever grows.
        &self.url_chain[self.url_chain.len() - 1]
    }

    pub fn original_url(&self) -> &Url {
        &self.url_chain[0]
    }

    pub fn url_chain(&self) -> &[Url] {
        &self.url_chain
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn referrer(&self) -> Option<&Url> {
        self.referrer.as_ref()
    }

    pub fn site_for_cookies(&self) -> &SiteForCookies {
        &self.site_for_cookies
    }

    pub fn initiator(&self) -> Option<&Url> {
        self.initiator.as_ref()
    }

    pub fn isolation_info(&self) -> &IsolationInfo {
        &self.isolation_info
    }

    pub fn force_ignore_site_for_cookies(&self) -> bool {
        self.force_ignore_site_for_cookies
    }

    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    pub fn privacy_mode(&self) -> PrivacyMode {
        self.privacy_mode
    }

    pub fn load_flags(&self) -> LoadFlags {
        self.load_flags
    }

    pub fn priority(&self) -> RequestPriority {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: RequestPriority) {
        self.priority = priority;
    }

    pub fn extra_request_headers(&self) -> &HttpRequestHeaders {
        &self.extra_request_headers
    }

    pub(crate) fn set_extra_request_headers(&mut self, headers: HttpRequestHeaders) {
        self.extra_request_headers = headers;
    }

    pub fn upload(&self) -> Option<&UploadDataStream> {
        self.upload.as_ref()
    }

    pub(crate) fn set_upload(&mut self, upload: Option<UploadDataStream>) {
        self.upload = upload;
    }

    pub fn accepted_stream_types(&self) -> AcceptedEncodings {
        self.accepted_stream_types
    }

    pub fn websocket_helper(&self) -> Option<&Arc<dyn WebSocketHandshakeStreamCreateHelper>> {
        self.websocket_helper.as_ref()
    }

    /// Cookies considered for the request: excluded ones first, then the
    /// ones that were sent.
    pub fn maybe_sent_cookies(&self) -> &CookieAccessResultList {
        &self.maybe_sent_cookies
    }

    pub(crate) fn set_maybe_sent_cookies(&mut self, cookies: CookieAccessResultList) {
        self.maybe_sent_cookies = cookies;
    }

    /// Outcome of every `Set-Cookie` line of the last response, in header
    /// order.
    pub fn maybe_stored_cookies(&self) -> &CookieAndLineAccessResultList {
        &self.maybe_stored_cookies
    }

    pub(crate) fn set_maybe_stored_cookies(&mut self, cookies: CookieAndLineAccessResultList) {
        self.maybe_stored_cookies = cookies;
    }

    pub fn received_response_content_length(&self) -> u64 {
        self.received_response_content_length
    }

    pub(crate) fn set_received_response_content_length(&mut self, length: u64) {
        self.received_response_content_length = length;
    }
}

impl fmt::Debug for URLRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("URLRequest")
            .field("url", &self.url().as_str())
            .field("method", &self.method)
            .field("load_flags", &self.load_flags)
            .field("privacy_mode", &self.privacy_mode)
            .field("priority", &self.priority)
            .field("has_upload", &self.upload.is_some())
            .field("websocket", &self.websocket_helper.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_parses_url() {
        let request = URLRequest::new("https://example.com/a").unwrap();
        assert_eq!(request.url().as_str(), "https://example.com/a");
        assert_eq!(request.method(), Method::GET);
        assert!(request.allow_credentials());
        assert!(URLRequest::new("not a url").is_err());
    }

    #[test]
    fn test_url_chain_grows() {
        let mut request = URLRequest::new("http://example.com/").unwrap();
        request.push_url(Url::parse("https://example.com/").unwrap());
        assert_eq!(request.url_chain().len(), 2);
        assert_eq!(request.original_url().scheme(), "http");
        assert_eq!(request.url().scheme(), "https");
    }

    #[test]
    fn test_builder_methods() {
        let request = URLRequest::new("https://example.com/")
            .unwrap()
            .with_method(Method::POST)
            .with_upload("body".into())
            .with_load_flags(LoadFlags::DO_NOT_SAVE_COOKIES)
            .with_privacy_mode(PrivacyMode::Enabled);
        assert_eq!(request.method(), Method::POST);
        assert!(request.upload().is_some());
        assert!(request.load_flags().contains(LoadFlags::DO_NOT_SAVE_COOKIES));
        assert!(request.privacy_mode().is_enabled());
    }
}
