//! The host cookie store seam.
//!
//! This module defines the `CookieStore` trait that every sync component
//! reads from and writes to. The host environment (a browser extension
//! bridge, a test double, or [`MemoryCookieStore`]) provides the
//! implementation.
//!
//! [`MemoryCookieStore`]: crate::cookies::memory::MemoryCookieStore

use crate::base::syncerror::SyncError;
use crate::cookies::record::{CookieRecord, CookieWrite};
use futures::future::BoxFuture;
use std::sync::Arc;
use url::Url;

/// Alias for the `Future` type returned by cookie store operations.
pub type CookieFuture<'a, T> = BoxFuture<'a, Result<T, SyncError>>;

/// Trait for the host cookie store.
///
/// # Design Notes
///
/// - Uses `&self` so one store can be shared by concurrent syncs.
/// - Writes are upserts keyed by (name, domain, path); there is no
///   transactional isolation between writers.
/// - Returns boxed futures for trait object compatibility.
pub trait CookieStore: Send + Sync {
    /// Enumerate cookies whose domain equals or is a subdomain of `domain`.
    /// A leading dot on `domain` is ignored.
    fn get_all<'a>(&'a self, domain: &'a str) -> CookieFuture<'a, Vec<CookieRecord>>;

    /// Upsert one cookie. Rejected attribute combinations return
    /// [`SyncError::CookieRejected`] (or a prefix/public-suffix error).
    fn set<'a>(&'a self, write: &'a CookieWrite) -> CookieFuture<'a, CookieRecord>;

    /// Delete the cookie called `name` visible to `url`. Returns whether anything was removed.
    fn remove<'a>(&'a self, url: &'a Url, name: &'a str) -> CookieFuture<'a, bool>;
}

/// Blanket implementation for Arc-wrapped stores.
impl<S: CookieStore + ?Sized> CookieStore for Arc<S> {
    fn get_all<'a>(&'a self, domain: &'a str) -> CookieFuture<'a, Vec<CookieRecord>> {
        (**self).get_all(domain)
    }

    fn set<'a>(&'a self, write: &'a CookieWrite) -> CookieFuture<'a, CookieRecord> {
        (**self).set(write)
    }

    fn remove<'a>(&'a self, url: &'a Url, name: &'a str) -> CookieFuture<'a, bool> {
        (**self).remove(url, name)
    }
}
