//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! yields a working configuration.

use crate::base::syncerror::SyncError;
use crate::render::fallback::AttemptPolicy;
use crate::sync::domains::strip_www;
use crate::sync::patterns::{default_important_patterns, default_login_indicators, PatternTable};
use crate::sync::registry::{default_profiles, ProviderProfile, ProviderRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the sync engine and the split pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Name/value fragments marking a cookie important.
    pub important_patterns: PatternTable,

    /// Address fragments marking a login redirect.
    pub login_indicators: PatternTable,

    /// Subdomains probed under the registrable root (default: www, api,
    /// auth, login, accounts, sso, id).
    pub common_subdomains: Vec<String>,

    /// Hosts (and their subdomains) that never need a session sync.
    /// Hosts matching a provider profile always sync.
    pub static_sites: Vec<String>,

    /// Cookies expiring within this window are important (default: 86400).
    pub expiry_window_secs: u64,

    /// Wait before reading the frame address after a load (default: 1000).
    pub settle_delay_ms: u64,

    /// Wait between a pre-sync and the first load (default: 800).
    pub propagation_delay_ms: u64,

    /// Wait before the validation retry (default: 1000).
    pub retry_delay_ms: u64,

    /// Load timeout for the destination (default: 12000).
    pub load_timeout_ms: u64,

    /// Load timeout for one alternative route (default: 5000).
    pub alternative_timeout_ms: u64,

    /// Settle time before judging an alternative route (default: 1000).
    pub alternative_settle_ms: u64,

    /// Rendered bytes an alternative must exceed to count (default: 100).
    pub min_alternative_content: usize,

    /// Navigation history entries kept (default: 20).
    pub history_capacity: usize,

    /// Search URL prefix for input that is not an address.
    pub search_url: String,

    /// Multi-host provider profiles.
    pub providers: Vec<ProviderProfile>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            important_patterns: default_important_patterns(),
            login_indicators: default_login_indicators(),
            common_subdomains: ["www", "api", "auth", "login", "accounts", "sso", "id"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            static_sites: [
                "google.com",
                "bing.com",
                "duckduckgo.com",
                "wikipedia.org",
                "github.io",
                "blogspot.com",
                "wordpress.com",
                "medium.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            expiry_window_secs: 24 * 60 * 60,
            settle_delay_ms: 1000,
            propagation_delay_ms: 800,
            retry_delay_ms: 1000,
            load_timeout_ms: 12_000,
            alternative_timeout_ms: 5000,
            alternative_settle_ms: 1000,
            min_alternative_content: 100,
            history_capacity: 20,
            search_url: "https://www.google.com/search?q=".to_string(),
            providers: default_profiles(),
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SyncError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SyncError::config_invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SyncError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SyncError::config_invalid(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.history_capacity == 0 {
            return Err(SyncError::config_invalid("history_capacity must be positive"));
        }
        if self.load_timeout_ms == 0 || self.alternative_timeout_ms == 0 {
            return Err(SyncError::config_invalid("timeouts must be positive"));
        }
        if url::Url::parse(&self.search_url).is_err() {
            return Err(SyncError::config_invalid(format!(
                "search_url is not a URL: {}",
                self.search_url
            )));
        }
        if let Some(p) = self.providers.iter().find(|p| p.match_pattern.is_empty()) {
            return Err(SyncError::config_invalid(format!(
                "provider with related domains {:?} has no match pattern",
                p.related_domains
            )));
        }
        Ok(())
    }

    pub fn expiry_window(&self) -> time::Duration {
        time::Duration::seconds(self.expiry_window_secs.min(i64::MAX as u64) as i64)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn propagation_delay(&self) -> Duration {
        Duration::from_millis(self.propagation_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn attempt_policy(&self) -> AttemptPolicy {
        AttemptPolicy {
            timeout: Duration::from_millis(self.alternative_timeout_ms),
            settle: Duration::from_millis(self.alternative_settle_ms),
            min_content: self.min_alternative_content,
        }
    }

    pub fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::new(self.providers.clone())
    }

    /// False for static sites (search engines, wikis, blog hosts).
    pub fn needs_session_sync(&self, host: &str) -> bool {
        let host = strip_www(&host.trim_start_matches('.').to_lowercase());
        if self.providers.iter().any(|p| p.matches(&host)) {
            return true;
        }
        !self.static_sites.iter().any(|site| {
            let site = site.trim_start_matches('.').to_lowercase();
            host == site || host.ends_with(&format!(".{}", site))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.load_timeout(), Duration::from_secs(12));
        assert_eq!(config.expiry_window(), time::Duration::hours(24));
        assert_eq!(config.common_subdomains.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SyncConfig::from_json_str(r#"{"settle_delay_ms": 250}"#).unwrap();
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.providers.len(), default_profiles().len());
    }

    #[test]
    fn test_invalid_json() {
        let err = SyncConfig::from_json_str(r#"{"history_capacity": "many"}"#).unwrap_err();
        assert!(matches!(err, SyncError::ConfigInvalid { .. }));

        let err = SyncConfig::from_json_str(r#"{"history_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, SyncError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("splitsync.json");
        std::fs::write(&path, r#"{"static_sites": ["example.org"]}"#).unwrap();

        let config = SyncConfig::from_json_file(&path).unwrap();
        assert!(!config.needs_session_sync("example.org"));
        assert!(config.needs_session_sync("google.com"));

        assert!(SyncConfig::from_json_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_static_sites() {
        let config = SyncConfig::default();
        assert!(!config.needs_session_sync("www.google.com"));
        assert!(!config.needs_session_sync("en.wikipedia.org"));
        assert!(!config.needs_session_sync("someone.github.io"));
        // Provider profiles win over the static list.
        assert!(config.needs_session_sync("mail.google.com"));
        assert!(config.needs_session_sync("drive.google.com"));
        assert!(config.needs_session_sync("app.example.com"));
    }
}
