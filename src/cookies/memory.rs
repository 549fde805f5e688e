use crate::base::syncerror::SyncError;
use crate::cookies::psl;
use crate::cookies::record::{CookieRecord, CookieWrite, SameSite};
use crate::cookies::store::{CookieFuture, CookieStore};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

#[derive(Debug, Clone)]
struct StoredCookie {
    record: CookieRecord,
    seq: u64,
}

/// In-memory cookie store that enforces the acceptance rules of a browser
/// cookie jar: domain matching, public suffix rejection, SameSite=None
/// requiring Secure, Secure requiring https, and cookie name prefixes.
pub struct MemoryCookieStore {
    // Store: Map<registrable key (domain without leading dot), List<Cookie>>
    store: Arc<DashMap<String, Vec<StoredCookie>>>,
    next_seq: AtomicU64,
}

impl Default for MemoryCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Validate and upsert one write. Shared by [`CookieStore::set`] and
    /// [`MemoryCookieStore::parse_and_save`].
    pub fn accept(&self, write: &CookieWrite) -> Result<CookieRecord, SyncError> {
        let host = write
            .url
            .host_str()
            .ok_or(SyncError::InvalidTargetUrl)?
            .to_lowercase();
        let secure_origin = write.url.scheme() == "https";

        let domain = match &write.domain {
            Some(d) => {
                let bare = d.trim_start_matches('.').to_lowercase();
                if psl::is_public_suffix(&bare) {
                    return Err(SyncError::CookiePublicSuffix);
                }
                if !psl::is_valid_cookie_domain(&bare, &host) {
                    return Err(SyncError::cookie_rejected(
                        &write.name,
                        format!("domain {} does not match {}", bare, host),
                    ));
                }
                // Explicit Domain attributes always widen to subdomains.
                format!(".{}", bare)
            }
            None => host,
        };

        if write.same_site == SameSite::NoRestriction && !write.secure {
            return Err(SyncError::cookie_rejected(
                &write.name,
                "SameSite=None requires Secure",
            ));
        }

        if write.secure && !secure_origin {
            return Err(SyncError::cookie_rejected(
                &write.name,
                "Secure cookies require an https URL",
            ));
        }

        let record = CookieRecord {
            name: write.name.clone(),
            value: write.value.clone(),
            domain,
            path: if write.path.is_empty() {
                "/".to_string()
            } else {
                write.path.clone()
            },
            secure: write.secure,
            http_only: write.http_only,
            same_site: write.same_site,
            expiration_date: write.expiration_date,
        };

        record.validate_prefix(secure_origin)?;

        if record.is_expired(OffsetDateTime::now_utc()) {
            // Writing an already-expired cookie deletes the existing one.
            self.delete_exact(&record);
        } else {
            self.set_record(record.clone());
        }

        Ok(record)
    }

    /// Upsert a record without acceptance checks (used to seed the source session).
    pub fn set_record(&self, record: CookieRecord) {
        let key = record.domain.trim_start_matches('.').to_lowercase();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut entry = self.store.entry(key).or_default();

        // Remove existing if name/domain/path match
        entry.retain(|c| {
            c.record.name != record.name
                || c.record.path != record.path
                || c.record.domain != record.domain
        });

        // Enforce per-domain limit, evicting the oldest write
        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            if let Some(oldest_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.seq)
                .map(|(i, _)| i)
            {
                entry.remove(oldest_idx);
            } else {
                break;
            }
        }

        entry.push(StoredCookie { record, seq });
    }

    fn delete_exact(&self, record: &CookieRecord) {
        let key = record.domain.trim_start_matches('.').to_lowercase();
        if let Some(mut entry) = self.store.get_mut(&key) {
            entry.retain(|c| {
                c.record.name != record.name
                    || c.record.path != record.path
                    || c.record.domain != record.domain
            });
        }
    }

    /// Parse a `Set-Cookie` line as if it were received from `url`, then
    /// apply it through the same acceptance rules as [`CookieStore::set`].
    pub fn parse_and_save(&self, url: &Url, cookie_line: &str) -> Result<CookieRecord, SyncError> {
        use cookie::Cookie;

        let parsed = Cookie::parse(cookie_line)
            .map_err(|e| SyncError::cookie_rejected("", e.to_string()))?;

        let same_site = match parsed.same_site() {
            Some(cookie::SameSite::Lax) => SameSite::Lax,
            Some(cookie::SameSite::Strict) => SameSite::Strict,
            Some(cookie::SameSite::None) => SameSite::NoRestriction,
            None => SameSite::Unspecified,
        };

        let write = CookieWrite {
            url: url.clone(),
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain: parsed.domain().map(|d| d.to_string()),
            path: parsed.path().unwrap_or("/").to_string(),
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            same_site,
            expiration_date: parsed.expires().and_then(|e| e.datetime()),
        };

        self.accept(&write)
    }

    /// Snapshot of cookies matching `domain` (domain itself and its subdomains),
    /// in write order.
    pub fn cookies_for_domain(&self, domain: &str) -> Vec<CookieRecord> {
        let query = domain.trim_start_matches('.').to_lowercase();
        let now = OffsetDateTime::now_utc();

        let mut matched: Vec<StoredCookie> = self
            .store
            .iter()
            .filter(|entry| Self::domain_matches(entry.key(), &query))
            .flat_map(|entry| entry.value().clone())
            .filter(|c| !c.record.is_expired(now))
            .collect();

        matched.sort_by_key(|c| c.seq);
        matched.into_iter().map(|c| c.record).collect()
    }

    /// True if `cookie_domain` equals `query` or is one of its subdomains.
    fn domain_matches(cookie_domain: &str, query: &str) -> bool {
        if query.is_empty() {
            return false;
        }
        cookie_domain == query || cookie_domain.ends_with(&format!(".{}", query))
    }

    fn remove_named(&self, url: &Url, name: &str) -> bool {
        let host = url.host_str().unwrap_or("").to_lowercase();
        let mut removed = false;

        for mut entry in self.store.iter_mut() {
            let before = entry.len();
            entry.retain(|c| {
                let bare = c.record.domain.trim_start_matches('.');
                let visible = if c.record.is_host_only() {
                    bare == host
                } else {
                    psl::is_valid_cookie_domain(bare, &host)
                };
                !(visible && c.record.name == name)
            });
            removed |= entry.len() != before;
        }

        removed
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    /// Clear all cookies.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// All cookies in write order.
    pub fn snapshot(&self) -> Vec<CookieRecord> {
        let mut all: Vec<StoredCookie> = self
            .store
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|c| c.seq);
        all.into_iter().map(|c| c.record).collect()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get_all<'a>(&'a self, domain: &'a str) -> CookieFuture<'a, Vec<CookieRecord>> {
        Box::pin(async move { Ok(self.cookies_for_domain(domain)) })
    }

    fn set<'a>(&'a self, write: &'a CookieWrite) -> CookieFuture<'a, CookieRecord> {
        Box::pin(async move { self.accept(write) })
    }

    fn remove<'a>(&'a self, url: &'a Url, name: &'a str) -> CookieFuture<'a, bool> {
        Box::pin(async move { Ok(self.remove_named(url, name)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(url: &str, name: &str, domain: Option<&str>) -> CookieWrite {
        CookieWrite {
            url: Url::parse(url).unwrap(),
            name: name.to_string(),
            value: "v".to_string(),
            domain: domain.map(|d| d.to_string()),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            same_site: SameSite::Lax,
            expiration_date: None,
        }
    }

    #[test]
    fn test_accept_dot_domain_for_subdomain_target() {
        let store = MemoryCookieStore::new();
        let record = store
            .accept(&write("https://app.example.com/", "sid", Some(".app.example.com")))
            .unwrap();
        assert_eq!(record.domain, ".app.example.com");
        assert_eq!(store.total_cookie_count(), 1);
    }

    #[test]
    fn test_reject_cross_site_domain() {
        let store = MemoryCookieStore::new();
        let err = store
            .accept(&write("https://app.example.com/", "sid", Some(".other.com")))
            .unwrap_err();
        assert!(matches!(err, SyncError::CookieRejected { .. }));
    }

    #[test]
    fn test_reject_public_suffix() {
        let store = MemoryCookieStore::new();
        let err = store
            .accept(&write("https://example.com/", "sid", Some(".com")))
            .unwrap_err();
        assert_eq!(err, SyncError::CookiePublicSuffix);
    }

    #[test]
    fn test_reject_samesite_none_without_secure() {
        let store = MemoryCookieStore::new();
        let mut w = write("https://example.com/", "sid", None);
        w.same_site = SameSite::NoRestriction;
        assert!(store.accept(&w).is_err());

        w.secure = true;
        assert!(store.accept(&w).is_ok());
    }

    #[test]
    fn test_reject_secure_over_http() {
        let store = MemoryCookieStore::new();
        let mut w = write("http://example.com/", "sid", None);
        w.secure = true;
        assert!(store.accept(&w).is_err());
    }

    #[test]
    fn test_upsert_by_name_domain_path() {
        let store = MemoryCookieStore::new();
        let mut w = write("https://example.com/", "sid", None);
        store.accept(&w).unwrap();
        w.value = "second".to_string();
        store.accept(&w).unwrap();

        let all = store.snapshot();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "second");
    }

    #[test]
    fn test_get_all_includes_subdomains_and_ignores_leading_dot() {
        let store = MemoryCookieStore::new();
        store.set_record(CookieRecord::new("a", "1", "example.com"));
        store.set_record(CookieRecord::new("b", "2", ".accounts.example.com"));
        store.set_record(CookieRecord::new("c", "3", "other.com"));

        let names: Vec<_> = store
            .cookies_for_domain(".example.com")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_and_save() {
        let store = MemoryCookieStore::new();
        let url = Url::parse("https://a.example.com/foo").unwrap();
        let record = store
            .parse_and_save(&url, "sid=abc; Domain=example.com; Secure; SameSite=None")
            .unwrap();

        assert_eq!(record.domain, ".example.com");
        assert_eq!(record.same_site, SameSite::NoRestriction);
        assert!(record.secure);
    }

    #[test]
    fn test_parse_and_save_rejects_invalid_prefix() {
        let store = MemoryCookieStore::new();
        let url = Url::parse("https://example.com/").unwrap();
        let err = store
            .parse_and_save(&url, "__Host-id=1; Secure; Domain=example.com")
            .unwrap_err();
        assert_eq!(err, SyncError::CookieInvalidPrefix);
    }

    #[test]
    fn test_per_domain_limit_evicts_oldest() {
        let store = MemoryCookieStore::new();
        for i in 0..(MAX_COOKIES_PER_DOMAIN + 5) {
            store.set_record(CookieRecord::new(format!("c{}", i), "v", "example.com"));
        }
        let all = store.snapshot();
        assert_eq!(all.len(), MAX_COOKIES_PER_DOMAIN);
        assert_eq!(all[0].name, "c5");
    }

    #[tokio::test]
    async fn test_remove_visible_cookie() {
        let store = MemoryCookieStore::new();
        store.set_record(CookieRecord::new("sid", "1", ".example.com"));
        store.set_record(CookieRecord::new("sid", "2", "other.com"));

        let url = Url::parse("https://app.example.com/").unwrap();
        assert!(store.remove(&url, "sid").await.unwrap());
        assert_eq!(store.total_cookie_count(), 1);
        assert!(!store.remove(&url, "sid").await.unwrap());
    }
}
