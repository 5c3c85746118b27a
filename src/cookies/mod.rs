//! Cookie parsing, storage and the job's cookie phases.
//!
//! # Architecture
//!
//! | Chromium (C++) | netjob (Rust) | Responsibility |
//! |----------------|---------------|----------------|
//! | `net::CookieStore` | [`CookieStore`](store::CookieStore) | Async store interface |
//! | `net::CookieMonster` | [`CookieMonster`](monster::CookieMonster) | In-memory jar with LRU eviction |
//! | `net::CanonicalCookie` | [`CanonicalCookie`](canonicalcookie::CanonicalCookie) | Single cookie representation |
//! | `net::CookieOptions` | [`CookieOptions`](options::CookieOptions) | Access options and same-site context |
//! | `URLRequestHttpJob` cookie code | [`negotiator`] | Read and write phases |
//!
//! # Example
//!
//! ```rust
//! use netjob::cookies::canonicalcookie::CanonicalCookie;
//! use netjob::cookies::monster::CookieMonster;
//! use netjob::cookies::options::CookieOptions;
//! use time::OffsetDateTime;
//! use url::Url;
//!
//! let jar = CookieMonster::new();
//! let url = Url::parse("https://example.com/").unwrap();
//! let cookie = CanonicalCookie::create(&url, "id=1", OffsetDateTime::now_utc(), None).unwrap();
//! let mut options = CookieOptions::new();
//! options.set_include_httponly();
//! assert!(jar.set_cookie_with_options(cookie, &url, &options).is_include());
//! assert_eq!(jar.total_cookie_count(), 1);
//! ```

pub mod canonicalcookie;
pub mod inclusion;
pub mod monster;
pub mod negotiator;
pub mod options;
pub mod psl;
pub mod store;

pub use canonicalcookie::CanonicalCookie;
pub use inclusion::{CookieInclusionStatus, ExclusionReasons};
pub use monster::CookieMonster;
pub use options::{CookieOptions, SameSiteContext};
pub use store::{CookieList, CookieStore};
