use crate::base::completion::Pending;
use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::inclusion::{CookieAccessResultList, CookieInclusionStatus};
use crate::cookies::options::CookieOptions;
use url::Url;

/// Result of a cookie lookup: cookies to send, and cookies that matched
/// the URL but were excluded (only when the options ask for them).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieList {
    pub included: CookieAccessResultList,
    pub excluded: CookieAccessResultList,
}

/// Asynchronous cookie storage, equivalent to Chromium's `CookieStore`.
///
/// Implementations must be thread-safe; the returned futures own whatever
/// they need and may complete in any order.
pub trait CookieStore: Send + Sync {
    fn get_cookie_list_with_options(&self, url: &Url, options: &CookieOptions) -> Pending<CookieList>;

    fn set_canonical_cookie(
        &self,
        cookie: CanonicalCookie,
        source_url: &Url,
        options: &CookieOptions,
    ) -> Pending<CookieInclusionStatus>;
}
