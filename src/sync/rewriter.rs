//! Attribute rewriting for cross-context delivery.
//!
//! A source cookie was issued for the primary pane's context; the rewrite
//! retargets it at the secondary pane's URL. Each policy fixes SameSite
//! and Secure; if the host store rejects the primary write, one maximally
//! permissive [`RewritePolicy::Fallback`] write is attempted before the
//! cookie is abandoned.

use crate::base::syncerror::SyncError;
use crate::cookies::record::{CookieRecord, CookieWrite, SameSite};
use crate::cookies::store::CookieStore;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewritePolicy {
    /// SameSite=lax, Secure as issued.
    Ordinary,
    /// SameSite=none, Secure forced on.
    SessionPriority,
    /// Secure off, SameSite=lax, bare target host as domain.
    Fallback,
}

/// How a single cookie ended up in the destination store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Primary,
    Fallback,
    Abandoned,
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, ApplyOutcome::Abandoned)
    }
}

/// Produce the applyable record for `source` delivered to `target`.
///
/// Deterministic: no clock reads, so identical inputs give identical writes.
pub fn rewrite(source: &CookieRecord, target: &Url, policy: RewritePolicy) -> Result<CookieWrite, SyncError> {
    let host = target.host_str().ok_or(SyncError::InvalidTargetUrl)?;

    let path = if source.path.is_empty() {
        "/".to_string()
    } else {
        source.path.clone()
    };

    let (domain, secure, same_site) = match policy {
        RewritePolicy::Ordinary => (primary_domain(source, host), source.secure, SameSite::Lax),
        RewritePolicy::SessionPriority => {
            (primary_domain(source, host), true, SameSite::NoRestriction)
        }
        RewritePolicy::Fallback => (host.to_string(), false, SameSite::Lax),
    };

    Ok(CookieWrite {
        url: target.clone(),
        name: source.name.clone(),
        value: source.value.clone(),
        domain: Some(domain),
        path,
        secure,
        http_only: source.http_only,
        same_site,
        expiration_date: source.expiration_date,
    })
}

/// Dot-prefixed source domains are kept; anything else widens to the target host.
fn primary_domain(source: &CookieRecord, target_host: &str) -> String {
    if source.domain.starts_with('.') {
        source.domain.clone()
    } else {
        format!(".{}", target_host)
    }
}

/// Write `source` with `policy`, falling back once on rejection.
///
/// Never fails the batch: a rejected fallback yields [`ApplyOutcome::Abandoned`].
/// Only an unusable target URL is an error.
pub async fn apply_with_fallback(
    store: &dyn CookieStore,
    source: &CookieRecord,
    target: &Url,
    policy: RewritePolicy,
) -> Result<ApplyOutcome, SyncError> {
    let primary = rewrite(source, target, policy)?;

    let primary_err = match store.set(&primary).await {
        Ok(_) => return Ok(ApplyOutcome::Primary),
        Err(e) => e,
    };

    if policy == RewritePolicy::Fallback {
        tracing::warn!(name = %source.name, error = %primary_err, "cookie abandoned");
        return Ok(ApplyOutcome::Abandoned);
    }

    tracing::debug!(
        name = %source.name,
        error = %primary_err,
        "primary write rejected, trying fallback"
    );

    let fallback = rewrite(source, target, RewritePolicy::Fallback)?;
    match store.set(&fallback).await {
        Ok(_) => Ok(ApplyOutcome::Fallback),
        Err(e) => {
            tracing::warn!(name = %source.name, error = %e, "cookie abandoned after fallback");
            Ok(ApplyOutcome::Abandoned)
        }
    }
}
