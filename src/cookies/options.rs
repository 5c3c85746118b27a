//! Cookie access options and same-site context computation.
//!
//! After Chromium's `net::CookieOptions` and the `cookie_util`
//! `ComputeSameSiteContextFor*` helpers.

use crate::base::isolation::{SchemefulSite, SiteForCookies};
use http::Method;
use std::fmt;
use url::Url;

/// How same-site a request (or the response being processed) is.
///
/// Ordered from least to most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SameSiteContext {
    #[default]
    CrossSite,
    /// Same-site top-level navigation with an unsafe method (e.g. POST).
    SameSiteLaxMethodUnsafe,
    SameSiteLax,
    SameSiteStrict,
}

impl fmt::Display for SameSiteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SameSiteContext::CrossSite => "cross-site",
            SameSiteContext::SameSiteLaxMethodUnsafe => "lax-method-unsafe",
            SameSiteContext::SameSiteLax => "lax",
            SameSiteContext::SameSiteStrict => "strict",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    exclude_httponly: bool,
    same_site_cookie_context: SameSiteContext,
    update_access_time: bool,
    return_excluded_cookies: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            exclude_httponly: true,
            same_site_cookie_context: SameSiteContext::CrossSite,
            update_access_time: true,
            return_excluded_cookies: false,
        }
    }
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_include_httponly(&mut self) {
        self.exclude_httponly = false;
    }

    pub fn exclude_httponly(&self) -> bool {
        self.exclude_httponly
    }

    pub fn set_same_site_cookie_context(&mut self, context: SameSiteContext) {
        self.same_site_cookie_context = context;
    }

    pub fn same_site_cookie_context(&self) -> SameSiteContext {
        self.same_site_cookie_context
    }

    pub fn set_do_not_update_access_time(&mut self) {
        self.update_access_time = false;
    }

    pub fn update_access_time(&self) -> bool {
        self.update_access_time
    }

    pub fn set_return_excluded_cookies(&mut self) {
        self.return_excluded_cookies = true;
    }

    pub fn return_excluded_cookies(&self) -> bool {
        self.return_excluded_cookies
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Every URL of the chain is first-party to `site_for_cookies`.
fn chain_is_first_party(url_chain: &[Url], site_for_cookies: &SiteForCookies) -> bool {
    !url_chain.is_empty() && url_chain.iter().all(|u| site_for_cookies.is_first_party(u))
}

fn initiator_is_same_site(initiator: Option<&Url>, url: &Url) -> bool {
    initiator.map_or(true, |i| SchemefulSite::new(i) == SchemefulSite::new(url))
}

/// Same-site context used when reading cookies for a request.
pub fn compute_same_site_context_for_request(
    method: &Method,
    url_chain: &[Url],
    site_for_cookies: &SiteForCookies,
    initiator: Option<&Url>,
    is_main_frame_navigation: bool,
    force_ignore_site_for_cookies: bool,
) -> SameSiteContext {
    if force_ignore_site_for_cookies {
        return SameSiteContext::SameSiteStrict;
    }
    let Some(url) = url_chain.last() else {
        return SameSiteContext::CrossSite;
    };
    if !chain_is_first_party(url_chain, site_for_cookies) {
        return SameSiteContext::CrossSite;
    }
    if initiator_is_same_site(initiator, url) {
        return SameSiteContext::SameSiteStrict;
    }
    if is_main_frame_navigation {
        if is_safe_method(method) {
            return SameSiteContext::SameSiteLax;
        }
        return SameSiteContext::SameSiteLaxMethodUnsafe;
    }
    SameSiteContext::CrossSite
}

/// Same-site context used when storing cookies from a response.
///
/// Lax is the most permissive context for setting cookies.
pub fn compute_same_site_context_for_response(
    url_chain: &[Url],
    site_for_cookies: &SiteForCookies,
    initiator: Option<&Url>,
    is_main_frame_navigation: bool,
    force_ignore_site_for_cookies: bool,
) -> SameSiteContext {
    if force_ignore_site_for_cookies {
        return SameSiteContext::SameSiteLax;
    }
    let Some(url) = url_chain.last() else {
        return SameSiteContext::CrossSite;
    };
    if !chain_is_first_party(url_chain, site_for_cookies) {
        return SameSiteContext::CrossSite;
    }
    if is_main_frame_navigation || initiator_is_same_site(initiator, url) {
        return SameSiteContext::SameSiteLax;
    }
    SameSiteContext::CrossSite
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_default_options() {
        let mut options = CookieOptions::new();
        assert!(options.exclude_httponly());
        assert_eq!(options.same_site_cookie_context(), SameSiteContext::CrossSite);
        options.set_include_httponly();
        options.set_return_excluded_cookies();
        assert!(!options.exclude_httponly());
        assert!(options.return_excluded_cookies());
    }

    #[test]
    fn test_same_site_request_strict() {
        let target = url("https://www.example.com/page");
        let sfc = SiteForCookies::from_url(&target);
        let ctx = compute_same_site_context_for_request(
            &Method::GET,
            &[target.clone()],
            &sfc,
            Some(&url("https://example.com")),
            false,
            false,
        );
        assert_eq!(ctx, SameSiteContext::SameSiteStrict);
    }

    #[test]
    fn test_cross_site_navigation_is_lax() {
        let target = url("https://example.com/");
        let sfc = SiteForCookies::from_url(&target);
        let initiator = url("https://other.com");

        let get = compute_same_site_context_for_request(
            &Method::GET,
            &[target.clone()],
            &sfc,
            Some(&initiator),
            true,
            false,
        );
        assert_eq!(get, SameSiteContext::SameSiteLax);

        let post = compute_same_site_context_for_request(
            &Method::POST,
            &[target.clone()],
            &sfc,
            Some(&initiator),
            true,
            false,
        );
        assert_eq!(post, SameSiteContext::SameSiteLaxMethodUnsafe);

        let subresource = compute_same_site_context_for_request(
            &Method::GET,
            &[target],
            &sfc,
            Some(&initiator),
            false,
            false,
        );
        assert_eq!(subresource, SameSiteContext::CrossSite);
    }

    #[test]
    fn test_cross_site_redirect_chain_downgrades() {
        let first = url("https://tracker.com/redirect");
        let target = url("https://example.com/");
        let sfc = SiteForCookies::from_url(&target);
        let ctx =
            compute_same_site_context_for_request(&Method::GET, &[first, target], &sfc, None, false, false);
        assert_eq!(ctx, SameSiteContext::CrossSite);
    }

    #[test]
    fn test_force_ignore_site_for_cookies() {
        let target = url("https://example.com/");
        let ctx = compute_same_site_context_for_request(
            &Method::GET,
            &[target.clone()],
            &SiteForCookies::null(),
            None,
            false,
            true,
        );
        assert_eq!(ctx, SameSiteContext::SameSiteStrict);
        let resp =
            compute_same_site_context_for_response(&[target], &SiteForCookies::null(), None, false, true);
        assert_eq!(resp, SameSiteContext::SameSiteLax);
    }

    #[test]
    fn test_response_context() {
        let target = url("https://example.com/");
        let sfc = SiteForCookies::from_url(&target);
        assert_eq!(
            compute_same_site_context_for_response(&[target.clone()], &sfc, None, false, false),
            SameSiteContext::SameSiteLax
        );
        assert_eq!(
            compute_same_site_context_for_response(
                &[target],
                &SiteForCookies::null(),
                None,
                false,
                false
            ),
            SameSiteContext::CrossSite
        );
    }
}
