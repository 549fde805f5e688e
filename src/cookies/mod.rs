//! Cookie records and the host cookie store boundary.
//!
//! - **Records**: [`CookieRecord`](record::CookieRecord) as enumerated from the
//!   host, and [`CookieWrite`](record::CookieWrite) as handed back to it
//! - **Store seam**: the [`CookieStore`](store::CookieStore) trait
//! - **Memory store**: [`MemoryCookieStore`](memory::MemoryCookieStore), a
//!   jar that enforces browser acceptance rules
//! - **PSL**: public suffix checks and registrable-root derivation
//!
//! # Seeding a session
//!
//! ```rust,no_run
//! use splitsync::cookies::memory::MemoryCookieStore;
//! use url::Url;
//!
//! let store = MemoryCookieStore::new();
//! let url = Url::parse("https://example.com/")?;
//! store.parse_and_save(&url, "sessionid=abc; Path=/; Secure; HttpOnly")?;
//! assert_eq!(store.total_cookie_count(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod memory;
pub mod psl;
pub mod record;
pub mod store;
