use crate::base::completion::Pending;
use crate::cookies::canonicalcookie::{is_secure_origin, CanonicalCookie, SameSite};
use crate::cookies::inclusion::{CookieInclusionStatus, CookieWithAccessResult, ExclusionReasons};
use crate::cookies::options::{CookieOptions, SameSiteContext};
use crate::cookies::store::{CookieList, CookieStore};
use dashmap::DashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies.
/// Chromium uses 3300, but we use a slightly lower limit to keep memory usage predictable.
const MAX_COOKIES_TOTAL: usize = 3000;

/// In-memory cookie jar.
/// Modeled after Chromium's `net::CookieMonster`.
///
/// Every operation completes synchronously; the [`CookieStore`] futures are
/// ready on first poll.
pub struct CookieMonster {
    // Map<Domain, List<Cookie>>
    store: Arc<DashMap<String, Vec<CanonicalCookie>>>,
}

impl Default for CookieMonster {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieMonster {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Checks whether `cookie` may be set from `source_url` and stores it.
    pub fn set_cookie_with_options(
        &self,
        cookie: CanonicalCookie,
        source_url: &Url,
        options: &CookieOptions,
    ) -> CookieInclusionStatus {
        let mut status = CookieInclusionStatus::include();
        let secure_source = is_secure_origin(source_url);
        let host = source_url.host_str().unwrap_or("");

        if !Self::domain_matches(&cookie.domain, host, cookie.host_only) {
            status.add_exclusion_reason(ExclusionReasons::DOMAIN_MISMATCH);
        }
        if cookie.secure && !secure_source {
            status.add_exclusion_reason(ExclusionReasons::SECURE_ONLY);
        }
        if cookie.http_only && options.exclude_httponly() {
            status.add_exclusion_reason(ExclusionReasons::HTTP_ONLY);
        }
        if cookie.same_site == SameSite::NoRestriction && !cookie.secure {
            status.add_exclusion_reason(ExclusionReasons::SAMESITE_NONE_INSECURE);
        }
        if let Some(reason) =
            Self::same_site_exclusion(cookie.same_site, options.same_site_cookie_context(), true)
        {
            status.add_exclusion_reason(reason);
        }

        if let Some(existing) = self.find_equivalent(&cookie) {
            if existing.secure && !secure_source {
                status.add_exclusion_reason(ExclusionReasons::OVERWRITE_SECURE);
            }
            if existing.http_only && options.exclude_httponly() {
                status.add_exclusion_reason(ExclusionReasons::OVERWRITE_HTTP_ONLY);
            }
        }

        if !status.is_include() {
            tracing::trace!(name = %cookie.name, ?status, "cookie rejected by store");
            return status;
        }

        if cookie.is_expired(OffsetDateTime::now_utc()) {
            // An already-expired cookie deletes its equivalent.
            self.delete_equivalent(&cookie);
        } else {
            self.insert(cookie);
        }
        status
    }

    /// Cookies for `url`, split into included and excluded.
    pub fn get_cookie_list(&self, url: &Url, options: &CookieOptions) -> CookieList {
        let mut list = CookieList::default();
        let host = url.host_str().unwrap_or("");
        let secure_url = is_secure_origin(url);
        let now = OffsetDateTime::now_utc();

        for domain in Self::get_matching_domains(host) {
            let Some(mut entry) = self.store.get_mut(&domain) else {
                continue;
            };
            entry.retain(|c| !c.is_expired(now));
            for cookie in entry.iter_mut() {
                if !Self::domain_matches(&cookie.domain, host, cookie.host_only) {
                    continue;
                }
                if !Self::path_matches(&cookie.path, url.path()) {
                    continue;
                }

                let mut status = CookieInclusionStatus::include();
                if cookie.secure && !secure_url {
                    status.add_exclusion_reason(ExclusionReasons::SECURE_ONLY);
                }
                if cookie.http_only && options.exclude_httponly() {
                    status.add_exclusion_reason(ExclusionReasons::HTTP_ONLY);
                }
                if let Some(reason) = Self::same_site_exclusion(
                    cookie.same_site,
                    options.same_site_cookie_context(),
                    false,
                ) {
                    status.add_exclusion_reason(reason);
                }

                if status.is_include() {
                    if options.update_access_time() {
                        cookie.last_access_time = now;
                    }
                    list.included.push(CookieWithAccessResult {
                        cookie: cookie.clone(),
                        status,
                    });
                } else if options.return_excluded_cookies() {
                    list.excluded.push(CookieWithAccessResult {
                        cookie: cookie.clone(),
                        status,
                    });
                }
            }
        }

        // Longest path first, then oldest first.
        list.included.sort_by(|a, b| {
            b.cookie
                .path
                .len()
                .cmp(&a.cookie.path.len())
                .then_with(|| a.cookie.creation_time.cmp(&b.cookie.creation_time))
        });
        list
    }

    fn same_site_exclusion(
        same_site: SameSite,
        context: SameSiteContext,
        for_set: bool,
    ) -> Option<ExclusionReasons> {
        match same_site {
            SameSite::Strict => {
                // Setting only needs a lax context; sending needs strict.
                let required = if for_set {
                    SameSiteContext::SameSiteLax
                } else {
                    SameSiteContext::SameSiteStrict
                };
                (context < required).then_some(ExclusionReasons::SAMESITE_STRICT)
            }
            SameSite::Lax => {
                (context < SameSiteContext::SameSiteLax).then_some(ExclusionReasons::SAMESITE_LAX)
            }
            SameSite::Unspecified => (context < SameSiteContext::SameSiteLax)
                .then_some(ExclusionReasons::SAMESITE_UNSPECIFIED_TREATED_AS_LAX),
            SameSite::NoRestriction => None,
        }
    }

    fn find_equivalent(&self, cookie: &CanonicalCookie) -> Option<CanonicalCookie> {
        self.store
            .get(&cookie.domain)
            .and_then(|entry| entry.iter().find(|c| c.is_equivalent(cookie)).cloned())
    }

    fn delete_equivalent(&self, cookie: &CanonicalCookie) {
        if let Some(mut entry) = self.store.get_mut(&cookie.domain) {
            entry.retain(|c| !c.is_equivalent(cookie));
        }
    }

    /// Stores `cookie` unconditionally, replacing an equivalent one.
    pub fn insert(&self, mut cookie: CanonicalCookie) {
        let mut entry = self.store.entry(cookie.domain.clone()).or_default();

        if let Some(pos) = entry.iter().position(|c| c.is_equivalent(&cookie)) {
            // Replacement keeps the original creation time.
            cookie.creation_time = entry[pos].creation_time;
            entry.remove(pos);
        }

        // Enforce per-domain limit with LRU eviction
        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            if let Some(oldest_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.last_access_time)
                .map(|(i, _)| i)
            {
                entry.remove(oldest_idx);
            } else {
                break;
            }
        }

        entry.push(cookie);
        drop(entry); // Release lock before checking global count

        self.enforce_global_limit();
    }

    /// Enforce the global cookie limit by evicting least recently used cookies.
    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > MAX_COOKIES_TOTAL {
            let mut oldest: Option<(String, usize, OffsetDateTime)> = None;

            for entry in self.store.iter() {
                for (idx, cookie) in entry.value().iter().enumerate() {
                    let older = oldest
                        .as_ref()
                        .map_or(true, |(_, _, t)| cookie.last_access_time < *t);
                    if older {
                        oldest = Some((entry.key().clone(), idx, cookie.last_access_time));
                    }
                }
            }

            let Some((domain, idx, _)) = oldest else {
                break;
            };
            if let Some(mut entry) = self.store.get_mut(&domain) {
                if idx < entry.len() {
                    entry.remove(idx);
                }
            }
        }
    }

    /// RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only {
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        let cookie_domain = cookie_domain.trim_start_matches('.');
        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        request_host.len() > cookie_domain.len()
            && request_host.as_bytes()[..request_host.len() - cookie_domain.len()].ends_with(b".")
            && request_host[request_host.len() - cookie_domain.len()..]
                .eq_ignore_ascii_case(cookie_domain)
    }

    /// RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }
        if let Some(rest) = request_path.strip_prefix(cookie_path) {
            return cookie_path.ends_with('/') || rest.starts_with('/');
        }
        false
    }

    /// The host itself and all parent domains.
    fn get_matching_domains(host: &str) -> Vec<String> {
        let host = host.to_ascii_lowercase();
        let parts: Vec<&str> = host.split('.').collect();
        let mut domains = vec![host.clone()];
        for i in 1..parts.len().saturating_sub(1) {
            domains.push(parts[i..].join("."));
        }
        domains
    }

    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn iter_all_cookies(&self) -> impl Iterator<Item = CanonicalCookie> + '_ {
        self.store.iter().flat_map(|entry| entry.value().clone())
    }
}

impl CookieStore for CookieMonster {
    fn get_cookie_list_with_options(&self, url: &Url, options: &CookieOptions) -> Pending<CookieList> {
        Box::pin(std::future::ready(self.get_cookie_list(url, options)))
    }

    fn set_canonical_cookie(
        &self,
        cookie: CanonicalCookie,
        source_url: &Url,
        options: &CookieOptions,
    ) -> Pending<CookieInclusionStatus> {
        Box::pin(std::future::ready(
            self.set_cookie_with_options(cookie, source_url, options),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::canonicalcookie::CookiePriority;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn lax_options() -> CookieOptions {
        let mut options = CookieOptions::new();
        options.set_include_httponly();
        options.set_same_site_cookie_context(SameSiteContext::SameSiteStrict);
        options.set_return_excluded_cookies();
        options
    }

    fn make_cookie(name: &str, domain: &str, host_only: bool) -> CanonicalCookie {
        let now = OffsetDateTime::now_utc();
        CanonicalCookie {
            name: name.to_string(),
            value: "v".to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            creation_time: now,
            expiration_time: Some(now + time::Duration::days(30)),
            last_access_time: now,
            secure: false,
            http_only: false,
            host_only,
            same_site: SameSite::Lax,
            priority: CookiePriority::Medium,
        }
    }

    fn set_line(jar: &CookieMonster, u: &str, line: &str) -> CookieInclusionStatus {
        let u = url(u);
        let cookie = CanonicalCookie::create(&u, line, OffsetDateTime::now_utc(), None).unwrap();
        jar.set_cookie_with_options(cookie, &u, &lax_options())
    }

    #[test]
    fn test_set_and_get() {
        let jar = CookieMonster::new();
        assert!(set_line(&jar, "https://www.example.com/", "a=1; Domain=example.com").is_include());
        assert!(set_line(&jar, "https://www.example.com/", "b=2").is_include());

        let list = jar.get_cookie_list(&url("https://api.example.com/"), &lax_options());
        let names: Vec<_> = list.included.iter().map(|c| c.cookie.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_replace_equivalent_cookie() {
        let jar = CookieMonster::new();
        set_line(&jar, "https://example.com/", "a=1");
        set_line(&jar, "https://example.com/", "a=2");
        assert_eq!(jar.total_cookie_count(), 1);
        let list = jar.get_cookie_list(&url("https://example.com/"), &lax_options());
        assert_eq!(list.included[0].cookie.value, "2");
    }

    #[test]
    fn test_expired_cookie_deletes() {
        let jar = CookieMonster::new();
        set_line(&jar, "https://example.com/", "a=1");
        assert!(set_line(&jar, "https://example.com/", "a=1; Max-Age=0").is_include());
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_secure_cookie_excluded_on_http() {
        let jar = CookieMonster::new();
        set_line(&jar, "https://example.com/", "s=1; Secure");
        let list = jar.get_cookie_list(&url("http://example.com/"), &lax_options());
        assert!(list.included.is_empty());
        assert!(list.excluded[0]
            .status
            .has_exclusion_reason(ExclusionReasons::SECURE_ONLY));
    }

    #[test]
    fn test_secure_cookie_rejected_from_insecure_source() {
        let jar = CookieMonster::new();
        let status = set_line(&jar, "http://example.com/", "s=1; Secure");
        assert!(status.has_exclusion_reason(ExclusionReasons::SECURE_ONLY));
    }

    #[test]
    fn test_samesite_lax_excluded_cross_site() {
        let jar = CookieMonster::new();
        set_line(&jar, "https://example.com/", "l=1; SameSite=Lax");
        set_line(&jar, "https://example.com/", "n=1; SameSite=None; Secure");

        let mut options = CookieOptions::new();
        options.set_return_excluded_cookies();
        let list = jar.get_cookie_list(&url("https://example.com/"), &options);
        assert_eq!(list.included.len(), 1);
        assert_eq!(list.included[0].cookie.name, "n");
        assert!(list.excluded[0]
            .status
            .has_exclusion_reason(ExclusionReasons::SAMESITE_LAX));
    }

    #[test]
    fn test_samesite_none_requires_secure() {
        let jar = CookieMonster::new();
        let status = set_line(&jar, "https://example.com/", "n=1; SameSite=None");
        assert!(status.has_exclusion_reason(ExclusionReasons::SAMESITE_NONE_INSECURE));
    }

    #[test]
    fn test_path_matching_and_order() {
        let jar = CookieMonster::new();
        set_line(&jar, "https://example.com/", "root=1; Path=/");
        set_line(&jar, "https://example.com/", "deep=1; Path=/app");
        set_line(&jar, "https://example.com/", "other=1; Path=/apple");

        let list = jar.get_cookie_list(&url("https://example.com/app/page"), &lax_options());
        let names: Vec<_> = list.included.iter().map(|c| c.cookie.name.as_str()).collect();
        assert_eq!(names, vec!["deep", "root"]);
    }

    #[test]
    fn test_domain_matching() {
        assert!(CookieMonster::domain_matches("example.com", "a.example.com", false));
        assert!(!CookieMonster::domain_matches("example.com", "badexample.com", false));
        assert!(!CookieMonster::domain_matches("example.com", "a.example.com", true));
    }

    #[test]
    fn test_per_domain_limit() {
        let jar = CookieMonster::new();
        for i in 0..(MAX_COOKIES_PER_DOMAIN + 5) {
            jar.insert(make_cookie(&format!("c{i}"), "example.com", true));
        }
        assert_eq!(jar.total_cookie_count(), MAX_COOKIES_PER_DOMAIN);
    }

    #[tokio::test]
    async fn test_cookie_store_trait() {
        let jar = CookieMonster::new();
        let u = url("https://example.com/");
        let cookie = make_cookie("t", "example.com", true);
        let status = CookieStore::set_canonical_cookie(&jar, cookie, &u, &lax_options()).await;
        assert!(status.is_include());
        let list = jar.get_cookie_list_with_options(&u, &lax_options()).await;
        assert_eq!(list.included.len(), 1);
    }
}
