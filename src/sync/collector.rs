//! Cookie collection across related domains.
//!
//! Every read goes to the host store: there is no cache, so a sync always
//! sees the session as it is now. A domain whose enumeration fails is
//! logged and skipped; collection never aborts.

use crate::base::context::StoreResultExt;
use crate::cookies::record::{CookieKey, CookieRecord};
use crate::cookies::store::CookieStore;
use crate::sync::domains::DomainSet;
use crate::sync::registry::ProviderRegistry;
use std::collections::HashSet;
use std::sync::Arc;

pub struct CookieCollector {
    store: Arc<dyn CookieStore>,
    registry: Arc<ProviderRegistry>,
    common_subdomains: Vec<String>,
}

impl CookieCollector {
    pub fn new(
        store: Arc<dyn CookieStore>,
        registry: Arc<ProviderRegistry>,
        common_subdomains: Vec<String>,
    ) -> Self {
        Self {
            store,
            registry,
            common_subdomains,
        }
    }

    /// Cookies for `domain`, its dot-subdomain wildcard, and the related
    /// domains of any matching provider.
    pub async fn collect_basic(&self, domain: &str) -> Vec<CookieRecord> {
        let bare = domain.trim_start_matches('.');
        let mut lookups = vec![bare.to_string(), format!(".{}", bare)];
        for related in self.registry.related_domains(bare) {
            lookups.push(format!(".{}", related.trim_start_matches('.')));
            lookups.push(related);
        }

        let cookies = self.fetch_each(lookups.iter().map(String::as_str)).await;
        tracing::debug!(domain = %bare, count = cookies.len(), "basic collection complete");
        cookies
    }

    /// The widened domain set used by the advanced strategy.
    pub fn domain_set(&self, seed: &str, page_host: &str) -> DomainSet {
        DomainSet::derive(seed, page_host, &self.common_subdomains)
    }

    /// Cookies for every member of the domain set, deduplicated by (name, domain).
    pub async fn collect_advanced(&self, seed: &str, page_host: &str) -> Vec<CookieRecord> {
        let set = self.domain_set(seed, page_host);
        let cookies = self.fetch_each(set.iter()).await;
        tracing::debug!(
            seed = %seed,
            domains = set.len(),
            count = cookies.len(),
            "advanced collection complete"
        );
        cookies
    }

    async fn fetch_each<'a>(&self, domains: impl Iterator<Item = &'a str>) -> Vec<CookieRecord> {
        let mut out = Vec::new();

        for domain in domains {
            match self.store.get_all(domain).await.fetch_context(domain) {
                Ok(cookies) => out.extend(cookies),
                Err(e) => {
                    tracing::debug!(domain = %domain, error = %e, "skipping domain");
                }
            }
        }

        dedupe(out)
    }
}

/// Keep the first occurrence of each (name, domain).
pub fn dedupe(cookies: Vec<CookieRecord>) -> Vec<CookieRecord> {
    let mut seen: HashSet<CookieKey> = HashSet::new();
    cookies
        .into_iter()
        .filter(|c| seen.insert(c.key()))
        .collect()
}
