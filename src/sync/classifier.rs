//! Important-cookie classification.
//!
//! High recall: any single rule marks a cookie important.

use crate::cookies::record::CookieRecord;
use crate::sync::patterns::PatternTable;
use time::{Duration, OffsetDateTime};

/// Why a cookie was classified as important. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportanceReason {
    /// Name or value contains the pattern.
    Pattern(String),
    /// Marked httpOnly or secure by the host.
    Flagged,
    /// No expiration, or expiring inside the window.
    ShortLived,
}

/// Result of partitioning a cookie list. Input order is preserved within each half.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub important: Vec<CookieRecord>,
    pub ordinary: Vec<CookieRecord>,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.important.len() + self.ordinary.len()
    }
}

#[derive(Debug, Clone)]
pub struct CookieClassifier {
    patterns: PatternTable,
    expiry_window: Duration,
}

impl CookieClassifier {
    pub fn new(patterns: PatternTable, expiry_window: Duration) -> Self {
        Self {
            patterns,
            expiry_window,
        }
    }

    pub fn importance_at(&self, cookie: &CookieRecord, now: OffsetDateTime) -> Option<ImportanceReason> {
        if let Some(pattern) = self
            .patterns
            .first_match(&cookie.name)
            .or_else(|| self.patterns.first_match(&cookie.value))
        {
            return Some(ImportanceReason::Pattern(pattern.to_string()));
        }

        if cookie.http_only || cookie.secure {
            return Some(ImportanceReason::Flagged);
        }

        if cookie.expires_within(now, self.expiry_window) {
            return Some(ImportanceReason::ShortLived);
        }

        None
    }

    pub fn is_important_at(&self, cookie: &CookieRecord, now: OffsetDateTime) -> bool {
        self.importance_at(cookie, now).is_some()
    }

    /// Partition `cookies` relative to `now`.
    pub fn classify_at(&self, cookies: &[CookieRecord], now: OffsetDateTime) -> Classification {
        let (important, ordinary): (Vec<_>, Vec<_>) = cookies
            .iter()
            .cloned()
            .partition(|c| self.is_important_at(c, now));

        Classification { important, ordinary }
    }

    pub fn classify(&self, cookies: &[CookieRecord]) -> Classification {
        self.classify_at(cookies, OffsetDateTime::now_utc())
    }
}
