//! Cookie read and write phases of a job.
//!
//! The read phase computes options for the store lookup and turns the
//! result into a `Cookie` request header. The write phase parses every
//! `Set-Cookie` line of a response and fans the accepted ones out to the
//! store; [`CookieWriteSet`] joins the outcomes back in header order.

use crate::base::completion::{Completion, Pending};
use crate::cookies::canonicalcookie::{build_cookie_line, CanonicalCookie};
use crate::cookies::inclusion::{
    CookieAccessResultList, CookieAndLineAccessResultList, CookieAndLineWithAccessResult,
    CookieInclusionStatus, ExclusionReasons,
};
use crate::cookies::options::{
    compute_same_site_context_for_request, compute_same_site_context_for_response, CookieOptions,
    SameSiteContext,
};
use crate::cookies::store::{CookieList, CookieStore};
use crate::http::responseheaders::HttpResponseHeaders;
use crate::urlrequest::delegate::{move_all_to_user_blocked, NetworkDelegate};
use crate::urlrequest::request::URLRequest;
use futures::future::join_all;
use futures::FutureExt;
use time::OffsetDateTime;

/// Options for reading the cookies a request may send.
pub fn read_options(request: &URLRequest) -> CookieOptions {
    let context = compute_same_site_context_for_request(
        request.method(),
        request.url_chain(),
        request.site_for_cookies(),
        request.initiator(),
        request.isolation_info().is_main_frame(),
        request.force_ignore_site_for_cookies(),
    );
    let mut options = base_options(context);
    options.set_return_excluded_cookies();
    options
}

/// Options for storing the cookies a response sets.
pub fn write_options(request: &URLRequest) -> CookieOptions {
    let context = compute_same_site_context_for_response(
        request.url_chain(),
        request.site_for_cookies(),
        request.initiator(),
        request.isolation_info().is_main_frame(),
        request.force_ignore_site_for_cookies(),
    );
    let mut options = base_options(context);
    options.set_return_excluded_cookies();
    options
}

fn base_options(context: SameSiteContext) -> CookieOptions {
    let mut options = CookieOptions::new();
    options.set_include_httponly();
    options.set_same_site_cookie_context(context);
    options
}

/// What the read phase produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieReadOutcome {
    /// Value for the `Cookie` request header, if anything is sent.
    pub cookie_line: Option<String>,
    /// Excluded cookies followed by the included ones.
    pub maybe_sent_cookies: CookieAccessResultList,
}

/// Applies privacy mode and user blocking to a store lookup result.
pub fn complete_read(
    request: &URLRequest,
    list: CookieList,
    delegate: Option<&dyn NetworkDelegate>,
) -> CookieReadOutcome {
    let CookieList {
        mut included,
        mut excluded,
    } = list;

    let can_get_cookies = if request.privacy_mode().is_enabled() {
        move_all_to_user_blocked(&mut included, &mut excluded);
        false
    } else {
        match delegate {
            Some(delegate) => {
                delegate.annotate_and_move_user_blocked_cookies(request, &mut included, &mut excluded)
            }
            None => true,
        }
    };

    let cookie_line = if can_get_cookies && !included.is_empty() {
        Some(build_cookie_line(&included))
    } else {
        None
    };

    tracing::debug!(
        included = included.len(),
        excluded = excluded.len(),
        sent = cookie_line.is_some(),
        "cookie read complete"
    );

    let mut maybe_sent_cookies = excluded;
    maybe_sent_cookies.append(&mut included);
    CookieReadOutcome {
        cookie_line,
        maybe_sent_cookies,
    }
}

enum WriteSlot {
    Ready(CookieAndLineWithAccessResult),
    Pending {
        cookie: CanonicalCookie,
        line: String,
        status: Pending<CookieInclusionStatus>,
    },
}

/// Outcomes of one response's `Set-Cookie` lines, some of which may still
/// be waiting on the store.
pub struct CookieWriteSet {
    slots: Vec<WriteSlot>,
}

impl CookieWriteSet {
    fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, WriteSlot::Pending { .. }))
            .count()
    }

    fn record(&mut self, cookie: Option<CanonicalCookie>, line: &str, status: CookieInclusionStatus) {
        self.slots.push(WriteSlot::Ready(CookieAndLineWithAccessResult {
            cookie,
            cookie_string: line.to_string(),
            status,
        }));
    }

    /// Resolves once every store write has; outcomes keep header order.
    /// Ready without any store round trip when nothing is pending.
    pub fn into_completion(self) -> Completion<CookieAndLineAccessResultList> {
        if self.pending_count() == 0 {
            let results = self
                .slots
                .into_iter()
                .filter_map(|slot| match slot {
                    WriteSlot::Ready(result) => Some(result),
                    WriteSlot::Pending { .. } => None,
                })
                .collect();
            return Completion::Ready(results);
        }

        let outcomes = self.slots.into_iter().map(|slot| match slot {
            WriteSlot::Ready(result) => futures::future::ready(result).left_future(),
            WriteSlot::Pending {
                cookie,
                line,
                status,
            } => status
                .map(move |status| CookieAndLineWithAccessResult {
                    cookie: Some(cookie),
                    cookie_string: line,
                    status,
                })
                .right_future(),
        });
        Completion::pending(join_all(outcomes))
    }
}

impl std::fmt::Debug for CookieWriteSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieWriteSet")
            .field("lines", &self.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Parses every `Set-Cookie` line of `headers` and issues the store writes.
pub fn save_cookies(
    request: &URLRequest,
    headers: &HttpResponseHeaders,
    store: &dyn CookieStore,
    delegate: Option<&dyn NetworkDelegate>,
    now: OffsetDateTime,
) -> CookieWriteSet {
    let mut set = CookieWriteSet::new();
    let url = request.url();
    let options = write_options(request);
    let server_time = headers.date();
    let privacy = request.privacy_mode().is_enabled();

    for line in headers.get_all("set-cookie") {
        match CanonicalCookie::create(url, line, now, server_time) {
            Err(status) => {
                tracing::debug!(reasons = ?status.exclusion_reasons(), "set-cookie rejected on parse");
                set.record(None, line, status);
            }
            Ok(cookie) => {
                let allowed = !privacy
                    && delegate.map_or(true, |d| d.can_set_cookie(request, &cookie, &options));
                if !allowed {
                    set.record(
                        Some(cookie),
                        line,
                        CookieInclusionStatus::excluded(ExclusionReasons::USER_PREFERENCES),
                    );
                    continue;
                }
                let status = store.set_canonical_cookie(cookie.clone(), url, &options);
                set.slots.push(WriteSlot::Pending {
                    cookie,
                    line: line.to_string(),
                    status,
                });
            }
        }
    }
    tracing::debug!(lines = set.len(), pending = set.pending_count(), "cookie write issued");
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::isolation::SiteForCookies;
    use crate::cookies::inclusion::CookieWithAccessResult;
    use crate::cookies::monster::CookieMonster;
    use crate::http::transaction::PrivacyMode;
    use url::Url;

    fn cookie(name: &str) -> CookieWithAccessResult {
        CookieWithAccessResult {
            cookie: CanonicalCookie::new(
                name.into(),
                "v".into(),
                "example.com".into(),
                "/".into(),
                OffsetDateTime::now_utc(),
                None,
            ),
            status: CookieInclusionStatus::include(),
        }
    }

    struct BlockNamed(&'static str);

    impl NetworkDelegate for BlockNamed {
        fn annotate_and_move_user_blocked_cookies(
            &self,
            _request: &URLRequest,
            included: &mut CookieAccessResultList,
            excluded: &mut CookieAccessResultList,
        ) -> bool {
            let (blocked, kept): (Vec<_>, Vec<_>) =
                included.drain(..).partition(|c| c.cookie.name == self.0);
            *included = kept;
            for mut c in blocked {
                c.status.add_exclusion_reason(ExclusionReasons::USER_PREFERENCES);
                excluded.push(c);
            }
            true
        }

        fn can_set_cookie(
            &self,
            _request: &URLRequest,
            cookie: &CanonicalCookie,
            _options: &CookieOptions,
        ) -> bool {
            cookie.name != self.0
        }
    }

    #[test]
    fn test_read_options_same_site() {
        let request = URLRequest::new("https://example.com/").unwrap();
        let options = read_options(&request);
        assert!(!options.exclude_httponly());
        assert!(options.return_excluded_cookies());
        assert_eq!(options.same_site_cookie_context(), SameSiteContext::SameSiteStrict);

        let cross = URLRequest::new("https://example.com/")
            .unwrap()
            .with_site_for_cookies(SiteForCookies::from_url(&Url::parse("https://other.org/").unwrap()));
        assert_eq!(
            read_options(&cross).same_site_cookie_context(),
            SameSiteContext::CrossSite
        );
    }

    #[test]
    fn test_complete_read_builds_line() {
        let request = URLRequest::new("https://example.com/").unwrap();
        let list = CookieList {
            included: vec![cookie("a"), cookie("b")],
            excluded: vec![],
        };
        let outcome = complete_read(&request, list, None);
        assert_eq!(outcome.cookie_line.as_deref(), Some("a=v; b=v"));
        assert_eq!(outcome.maybe_sent_cookies.len(), 2);
    }

    #[test]
    fn test_complete_read_privacy_mode_blocks_all() {
        let request = URLRequest::new("https://example.com/")
            .unwrap()
            .with_privacy_mode(PrivacyMode::Enabled);
        let list = CookieList {
            included: vec![cookie("a")],
            excluded: vec![],
        };
        let outcome = complete_read(&request, list, None);
        assert!(outcome.cookie_line.is_none());
        assert!(outcome.maybe_sent_cookies[0]
            .status
            .has_exclusion_reason(ExclusionReasons::USER_PREFERENCES));
    }

    #[test]
    fn test_complete_read_delegate_blocks_some() {
        let request = URLRequest::new("https://example.com/").unwrap();
        let list = CookieList {
            included: vec![cookie("a"), cookie("tracker")],
            excluded: vec![],
        };
        let outcome = complete_read(&request, list, Some(&BlockNamed("tracker")));
        assert_eq!(outcome.cookie_line.as_deref(), Some("a=v"));
        // Excluded first, then included.
        assert_eq!(outcome.maybe_sent_cookies[0].cookie.name, "tracker");
        assert_eq!(outcome.maybe_sent_cookies[1].cookie.name, "a");
    }

    #[tokio::test]
    async fn test_save_cookies_mixed_outcomes() {
        let request = URLRequest::new("https://www.example.com/").unwrap();
        let headers = HttpResponseHeaders::new(200)
            .unwrap()
            .with_header("Set-Cookie", "good=1")
            .unwrap()
            .with_header("Set-Cookie", "bad=1; Domain=evil.com")
            .unwrap()
            .with_header("Set-Cookie", "tracker=1")
            .unwrap();
        let store = CookieMonster::new();
        let set = save_cookies(
            &request,
            &headers,
            &store,
            Some(&BlockNamed("tracker")),
            OffsetDateTime::now_utc(),
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.pending_count(), 1);

        let results = set.into_completion().into_future().await;
        assert_eq!(results[0].cookie_string, "good=1");
        assert!(results[0].status.is_include());
        assert!(results[1].cookie.is_none());
        assert!(results[1]
            .status
            .has_exclusion_reason(ExclusionReasons::INVALID_DOMAIN));
        assert!(results[2]
            .status
            .has_only_exclusion_reason(ExclusionReasons::USER_PREFERENCES));
        assert_eq!(store.total_cookie_count(), 1);
    }

    #[test]
    fn test_save_cookies_without_writes_is_ready() {
        let request = URLRequest::new("https://example.com/").unwrap();
        let headers = HttpResponseHeaders::new(200).unwrap();
        let set = save_cookies(
            &request,
            &headers,
            &CookieMonster::new(),
            None,
            OffsetDateTime::now_utc(),
        );
        assert!(set.is_empty());
        assert!(set.into_completion().is_ready());
    }
}
