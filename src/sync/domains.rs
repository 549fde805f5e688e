//! Domain set derivation.
//!
//! A [`DomainSet`] widens cookie collection from one seed domain to every
//! variant under which the session's cookies may have been stored.

use crate::cookies::psl;

/// Insertion-ordered, deduplicated collection of domain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSet {
    domains: Vec<String>,
}

impl DomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the set for `seed` (the destination domain) and `page_host`
    /// (the primary pane's own host).
    ///
    /// Members: bare, dotted and www-stripped variants of both inputs; the
    /// seed's registrable root and, under it, each of `common_subdomains`.
    pub fn derive(seed: &str, page_host: &str, common_subdomains: &[String]) -> Self {
        let mut set = Self::new();
        set.insert_variants(seed);
        set.insert_variants(page_host);

        if let Some(root) = psl::root_domain(&strip_www(seed.trim_start_matches('.'))) {
            set.insert_dotted(&root);
            for sub in common_subdomains {
                set.insert_dotted(&format!("{}.{}", sub, root));
            }
        }

        set
    }

    /// Insert `domain`; returns false if it was already present or empty.
    pub fn insert(&mut self, domain: impl Into<String>) -> bool {
        let domain = domain.into().to_lowercase();
        if domain.is_empty() || domain == "." || self.domains.contains(&domain) {
            return false;
        }
        self.domains.push(domain);
        true
    }

    fn insert_dotted(&mut self, bare: &str) {
        self.insert(bare);
        self.insert(format!(".{}", bare));
    }

    fn insert_variants(&mut self, host: &str) {
        let bare = host.trim_start_matches('.');
        if bare.is_empty() {
            return;
        }
        self.insert(host);
        self.insert_dotted(bare);
        self.insert_dotted(&strip_www(bare));
    }

    pub fn contains(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.domains.iter().any(|d| *d == domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl<'a> IntoIterator for &'a DomainSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.domains.iter()
    }
}

/// Drop a leading `www.` label.
pub fn strip_www(host: &str) -> String {
    host.strip_prefix("www.").unwrap_or(host).to_string()
}
