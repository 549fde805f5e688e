//! Public Suffix List (PSL) helpers for cookie domains.
//!
//! Used in two places: the memory store rejects cookies set on public
//! suffixes (`.com`, `.co.uk`, ...), and the collector derives the
//! registrable root of a seed domain when widening the domain set.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.trim_start_matches('.').to_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// Get the registrable domain (eTLD+1) for a domain.
/// For "sub.example.com", returns "example.com".
/// For "com" (public suffix), returns None.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let domain_lower = domain.trim_start_matches('.').to_lowercase();
    psl::domain(domain_lower.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(|s| s.to_string())
}

/// The root a collector widens to: the registrable domain when the PSL
/// knows one, otherwise the last two labels. Single-label hosts have no root.
pub fn root_domain(host: &str) -> Option<String> {
    if let Some(root) = registrable_domain(host) {
        return Some(root);
    }

    let host = host.trim_start_matches('.');
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    Some(labels[labels.len() - 2..].join(".").to_lowercase())
}

/// Check if a cookie domain is valid for a given URL host.
/// The host must equal the cookie domain or be one of its subdomains,
/// and the cookie domain must not be a public suffix.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);
    let cookie_domain_lower = cookie_domain.to_lowercase();
    let url_host_lower = url_host.to_lowercase();

    if is_public_suffix(&cookie_domain_lower) {
        return false;
    }

    url_host_lower == cookie_domain_lower
        || url_host_lower.ends_with(&format!(".{}", cookie_domain_lower))
}
