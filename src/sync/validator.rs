//! Post-load session validation.
//!
//! A destination that bounced to a login page did not receive a usable
//! session. The validator detects that from the frame's address; the pane
//! spends at most one [`RetryBudget`] unit per navigation on a forced sync
//! and a cache-busted reload.

use crate::render::frame::EmbeddingFrame;
use crate::sync::patterns::PatternTable;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    /// The frame landed on a login or identity-provider page.
    Unverified,
}

#[derive(Debug, Clone)]
pub struct SessionValidator {
    login_indicators: PatternTable,
    settle: Duration,
}

impl SessionValidator {
    pub fn new(login_indicators: PatternTable, settle: Duration) -> Self {
        Self {
            login_indicators,
            settle,
        }
    }

    /// Verdict for an address read from the frame.
    pub fn judge(&self, address: &str) -> Verdict {
        match self.login_indicators.first_match(address) {
            Some(indicator) => {
                tracing::warn!(indicator, "destination landed on a login page");
                Verdict::Unverified
            }
            None => Verdict::Verified,
        }
    }

    /// Wait the settle time, then judge the frame's current address.
    ///
    /// An unreadable address passes: only a visible login redirect fails.
    pub async fn validate(&self, frame: &dyn EmbeddingFrame) -> Verdict {
        tokio::time::sleep(self.settle).await;

        match frame.current_address() {
            Ok(address) => self.judge(&address),
            Err(e) => {
                tracing::debug!(error = %e, "frame address unreadable, assuming verified");
                Verdict::Verified
            }
        }
    }
}

/// Automatic retries left for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u8,
}

impl RetryBudget {
    pub const PER_NAVIGATION: u8 = 1;

    pub fn new() -> Self {
        Self {
            remaining: Self::PER_NAVIGATION,
        }
    }

    /// Spend one retry; false once the budget is gone.
    pub fn take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new()
    }
}

/// `url` with a `t=<millis>` query parameter, replacing any earlier one.
pub fn cache_bust(url: &Url, millis: u128) -> Url {
    let mut busted = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "t")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = busted.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        pairs.append_pair("t", &millis.to_string());
    }
    busted
}
