//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types coming
//! back from the host cookie store.

use crate::base::syncerror::SyncError;

/// Extension trait for adding context to cookie store Results.
pub trait StoreResultExt<T> {
    /// Attribute a failed read to the domain being enumerated.
    ///
    /// # Example
    /// ```ignore
    /// use splitsync::base::context::StoreResultExt;
    ///
    /// let cookies = store.get_all("example.com").await
    ///     .fetch_context("example.com")?;
    /// // Error: "Cookie store unavailable for example.com: ..."
    /// ```
    fn fetch_context(self, domain: &str) -> Result<T, SyncError>;
}

impl<T> StoreResultExt<T> for Result<T, SyncError> {
    fn fetch_context(self, domain: &str) -> Result<T, SyncError> {
        self.map_err(|e| match e {
            SyncError::CookieStoreUnavailable { .. } => e,
            other => SyncError::store_unavailable(domain, other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_context() {
        let result: Result<(), SyncError> = Err(SyncError::Unknown(-1));
        let err = result.fetch_context("example.com").unwrap_err();

        match err {
            SyncError::CookieStoreUnavailable { domain, .. } => {
                assert_eq!(domain, "example.com");
            }
            _ => panic!("Expected CookieStoreUnavailable"),
        }
    }

    #[test]
    fn test_fetch_context_keeps_existing_domain() {
        let result: Result<(), SyncError> = Err(SyncError::store_unavailable("a.com", "down"));
        let err = result.fetch_context("b.com").unwrap_err();
        assert_eq!(err, SyncError::store_unavailable("a.com", "down"));
    }
}
