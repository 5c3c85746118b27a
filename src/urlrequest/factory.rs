//! Job creation with the HSTS pre-check.
//!
//! Plain-text requests to hosts with a Strict-Transport-Security policy
//! never reach the network: they get a synthetic 307 redirect to the
//! secure scheme, which preserves the method and body.

use crate::base::isolation::scheme_is_cryptographic;
use crate::base::neterror::NetError;
use crate::http::responseheaders::HttpResponseHeaders;
use crate::http::responseinfo::HttpResponseInfo;
use crate::urlrequest::context::URLRequestContext;
use crate::urlrequest::job::{JobEvent, URLRequestHttpJob};
use crate::urlrequest::request::URLRequest;
use std::sync::Arc;
use std::time::SystemTime;
use url::Url;

pub const HSTS_REDIRECT_REASON: &str = "HSTS";

/// Status codes a synthetic redirect may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectResponseCode {
    Redirect302Found = 302,
    Redirect307TemporaryRedirect = 307,
    Redirect308PermanentRedirect = 308,
}

/// Answers a request with a redirect without creating a transaction.
#[derive(Debug)]
pub struct URLRequestRedirectJob {
    request: URLRequest,
    redirect_destination: Url,
    response_code: RedirectResponseCode,
    redirect_reason: String,
    response: Option<HttpResponseInfo>,
    headers_pending: bool,
}

impl URLRequestRedirectJob {
    pub fn new(
        request: URLRequest,
        redirect_destination: Url,
        response_code: RedirectResponseCode,
        redirect_reason: impl Into<String>,
    ) -> Self {
        Self {
            request,
            redirect_destination,
            response_code,
            redirect_reason: redirect_reason.into(),
            response: None,
            headers_pending: false,
        }
    }

    pub fn request(&self) -> &URLRequest {
        &self.request
    }

    pub fn redirect_destination(&self) -> &Url {
        &self.redirect_destination
    }

    pub fn redirect_reason(&self) -> &str {
        &self.redirect_reason
    }

    /// Synthesizes the redirect headers; reported by the next
    /// [`Self::next_event`].
    pub fn start(&mut self) -> Result<(), NetError> {
        if self.response.is_some() {
            tracing::warn!(url = %self.request.url(), "redirect job started twice");
            return Ok(());
        }
        let mut raw = format!(
            "HTTP/1.1 {} Internal Redirect\n\
             Location: {}\n\
             Cross-Origin-Resource-Policy: Cross-Origin\n\
             Non-Authoritative-Reason: {}",
            self.response_code as u16, self.redirect_destination, self.redirect_reason
        );
        // Cross-origin requests must be able to follow the redirect.
        if let Some(origin) = self.request.extra_request_headers().get_header("Origin") {
            raw.push_str(&format!(
                "\nAccess-Control-Allow-Origin: {origin}\nAccess-Control-Allow-Credentials: true"
            ));
        }
        let headers = HttpResponseHeaders::parse(&raw)?;
        let now = SystemTime::now();
        self.response = Some(HttpResponseInfo {
            request_time: Some(now),
            response_time: Some(now),
            ..HttpResponseInfo::with_headers(headers)
        });
        self.headers_pending = true;
        tracing::debug!(
            from = %self.request.url(),
            to = %self.redirect_destination,
            reason = %self.redirect_reason,
            "internal redirect"
        );
        Ok(())
    }

    pub async fn next_event(&mut self) -> Option<JobEvent> {
        if std::mem::take(&mut self.headers_pending) {
            Some(JobEvent::HeadersComplete)
        } else {
            None
        }
    }

    pub fn kill(&mut self) {
        self.headers_pending = false;
    }

    pub fn response_info(&self) -> Option<&HttpResponseInfo> {
        self.response.as_ref()
    }

    pub fn response_code(&self) -> Option<u16> {
        self.response.as_ref().and_then(|r| r.response_code())
    }

    /// The destination keeps its own fragment.
    pub fn copy_fragment_on_redirect(&self, _location: &Url) -> bool {
        false
    }
}

/// A job as handed out by [`create_job`].
#[derive(Debug)]
pub enum URLRequestJob {
    Http(Box<URLRequestHttpJob>),
    Redirect(URLRequestRedirectJob),
}

impl URLRequestJob {
    pub fn request(&self) -> &URLRequest {
        match self {
            URLRequestJob::Http(job) => job.request(),
            URLRequestJob::Redirect(job) => job.request(),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, URLRequestJob::Redirect(_))
    }

    pub fn as_http(&mut self) -> Option<&mut URLRequestHttpJob> {
        match self {
            URLRequestJob::Http(job) => Some(&mut **job),
            URLRequestJob::Redirect(_) => None,
        }
    }

    pub fn start(&mut self) -> Result<(), NetError> {
        match self {
            URLRequestJob::Http(job) => {
                job.start();
                Ok(())
            }
            URLRequestJob::Redirect(job) => job.start(),
        }
    }

    pub async fn next_event(&mut self) -> Option<JobEvent> {
        match self {
            URLRequestJob::Http(job) => job.next_event().await,
            URLRequestJob::Redirect(job) => job.next_event().await,
        }
    }

    pub fn kill(&mut self) {
        match self {
            URLRequestJob::Http(job) => job.kill(),
            URLRequestJob::Redirect(job) => job.kill(),
        }
    }

    pub fn response_info(&self) -> Option<&HttpResponseInfo> {
        match self {
            URLRequestJob::Http(job) => job.response_info(),
            URLRequestJob::Redirect(job) => job.response_info(),
        }
    }

    pub fn response_code(&self) -> Option<u16> {
        match self {
            URLRequestJob::Http(job) => job.response_code(),
            URLRequestJob::Redirect(job) => job.response_code(),
        }
    }
}

/// `http` becomes `https` and `ws` becomes `wss`; the rest of the URL is
/// kept.
pub fn upgrade_scheme_to_cryptographic(url: &Url) -> Result<Url, NetError> {
    let scheme = match url.scheme() {
        "http" => "https",
        "ws" => "wss",
        _ => return Err(NetError::UnknownUrlScheme),
    };
    let mut upgraded = url.clone();
    upgraded
        .set_scheme(scheme)
        .map_err(|_| NetError::InvalidUrl)?;
    Ok(upgraded)
}

/// Creates the job for `request`.
///
/// Only `http`, `https`, `ws` and `wss` URLs are handled. A plain-text URL
/// whose host must be upgraded gets a 307 redirect job instead of a
/// network job.
pub fn create_job(
    request: URLRequest,
    context: Arc<URLRequestContext>,
) -> Result<URLRequestJob, NetError> {
    let url = request.url();
    if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
        tracing::warn!(%url, "no job for scheme");
        return Err(NetError::UnknownUrlScheme);
    }

    if !scheme_is_cryptographic(url) {
        let upgrade = match (context.transport_security_state(), url.host_str()) {
            (Some(state), Some(host)) => state.should_upgrade_to_ssl(host),
            _ => false,
        };
        if upgrade {
            let destination = upgrade_scheme_to_cryptographic(url)?;
            return Ok(URLRequestJob::Redirect(URLRequestRedirectJob::new(
                request,
                destination,
                RedirectResponseCode::Redirect307TemporaryRedirect,
                HSTS_REDIRECT_REASON,
            )));
        }
    }

    Ok(URLRequestJob::Http(Box::new(URLRequestHttpJob::new(
        request, context,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_scheme() {
        let http = Url::parse("http://example.com:8080/a?b#c").unwrap();
        assert_eq!(
            upgrade_scheme_to_cryptographic(&http).unwrap().as_str(),
            "https://example.com:8080/a?b#c"
        );
        let ws = Url::parse("ws://example.com/socket").unwrap();
        assert_eq!(
            upgrade_scheme_to_cryptographic(&ws).unwrap().as_str(),
            "wss://example.com/socket"
        );
        let ftp = Url::parse("ftp://example.com/").unwrap();
        assert_eq!(
            upgrade_scheme_to_cryptographic(&ftp).unwrap_err(),
            NetError::UnknownUrlScheme
        );
    }

    #[tokio::test]
    async fn test_redirect_job_headers() {
        let request = URLRequest::new("http://example.com/")
            .unwrap()
            .with_extra_request_headers({
                let mut headers = crate::http::requestheaders::HttpRequestHeaders::new();
                headers.set_header("Origin", "https://other.test").unwrap();
                headers
            });
        let mut job = URLRequestRedirectJob::new(
            request,
            Url::parse("https://example.com/").unwrap(),
            RedirectResponseCode::Redirect307TemporaryRedirect,
            HSTS_REDIRECT_REASON,
        );
        assert!(job.next_event().await.is_none());
        job.start().unwrap();

        assert!(matches!(job.next_event().await, Some(JobEvent::HeadersComplete)));
        assert!(job.next_event().await.is_none());

        let headers = job.response_info().unwrap().headers.clone().unwrap();
        assert_eq!(headers.response_code(), 307);
        assert_eq!(headers.status_text(), "Internal Redirect");
        assert_eq!(headers.get_header("location"), Some("https://example.com/"));
        assert_eq!(headers.get_header("non-authoritative-reason"), Some("HSTS"));
        assert_eq!(
            headers.get_header("access-control-allow-origin"),
            Some("https://other.test")
        );
        assert!(!job.copy_fragment_on_redirect(&Url::parse("https://example.com/#x").unwrap()));
    }
}
