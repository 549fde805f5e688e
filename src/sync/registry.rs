//! Data-driven registry of multi-host providers.
//!
//! Some services keep their auth cookies under a different apex than the
//! content they serve (mail on one host, identity on another), and some
//! refuse to render inside a frame at all. Each is described by one
//! [`ProviderProfile`]; adding a provider is adding data.

use crate::sync::patterns::PatternTable;
use serde::{Deserialize, Serialize};

/// An alternative delivery URL offered when a provider blocks framing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeRoute {
    pub label: String,
    /// Absolute URL, or `None` to retry the original destination.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl AlternativeRoute {
    pub fn new(label: &str, url: Option<&str>, description: &str) -> Self {
        Self {
            label: label.to_string(),
            url: url.map(str::to_string),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Host (or parent domain) the profile applies to.
    pub match_pattern: String,
    /// Domains whose cookies also gate this provider's session.
    #[serde(default)]
    pub related_domains: Vec<String>,
    /// Cookie name fragments worth re-applying in the special-domain pass.
    #[serde(default)]
    pub interesting_name_patterns: PatternTable,
    /// The provider refuses to render inside an embedding frame.
    #[serde(default)]
    pub blocks_framing: bool,
    #[serde(default)]
    pub alternatives: Vec<AlternativeRoute>,
}

impl ProviderProfile {
    pub fn new(match_pattern: &str, related_domains: &[&str], names: &[&str]) -> Self {
        Self {
            match_pattern: match_pattern.to_lowercase(),
            related_domains: related_domains.iter().map(|d| d.to_string()).collect(),
            interesting_name_patterns: PatternTable::new(names),
            blocks_framing: false,
            alternatives: Vec::new(),
        }
    }

    pub fn blocking_framing(mut self, alternatives: Vec<AlternativeRoute>) -> Self {
        self.blocks_framing = true;
        self.alternatives = alternatives;
        self
    }

    /// True if `host` is the pattern itself or one of its subdomains.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_start_matches('.').to_lowercase();
        let pattern = self.match_pattern.trim_start_matches('.');
        host == pattern || host.ends_with(&format!(".{}", pattern))
    }

    pub fn is_interesting(&self, cookie_name: &str) -> bool {
        self.interesting_name_patterns.matches(cookie_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRegistry {
    profiles: Vec<ProviderProfile>,
}

impl ProviderRegistry {
    pub fn new(profiles: Vec<ProviderProfile>) -> Self {
        Self { profiles }
    }

    /// Profiles matching any of `hosts`, each at most once, in registry order.
    pub fn matching<'a>(&'a self, hosts: &'a [&'a str]) -> impl Iterator<Item = &'a ProviderProfile> + 'a {
        self.profiles
            .iter()
            .filter(move |p| hosts.iter().any(|h| p.matches(h)))
    }

    /// Related domains of every profile matching `host`.
    pub fn related_domains(&self, host: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for profile in self.profiles.iter().filter(|p| p.matches(host)) {
            for domain in &profile.related_domains {
                if !out.contains(domain) {
                    out.push(domain.clone());
                }
            }
        }
        out
    }

    /// The first framing-blocking profile that matches `host`.
    pub fn framing_blocker(&self, host: &str) -> Option<&ProviderProfile> {
        self.profiles
            .iter()
            .find(|p| p.blocks_framing && p.matches(host))
    }

    pub fn profiles(&self) -> &[ProviderProfile] {
        &self.profiles
    }
}

const GOOGLE_AUTH_NAMES: &[&str] = &["sid", "token", "session", "auth", "login"];

fn mail_alternatives() -> Vec<AlternativeRoute> {
    vec![
        AlternativeRoute::new("Standard", None, "The regular web interface"),
        AlternativeRoute::new(
            "Basic HTML",
            Some("https://mail.google.com/mail/u/0/h/"),
            "Lightweight HTML version",
        ),
        AlternativeRoute::new(
            "Mobile",
            Some("https://mail.google.com/mail/mu/"),
            "Mobile-optimized version",
        ),
        AlternativeRoute::new(
            "Account chooser",
            Some("https://accounts.google.com/AccountChooser?continue=https://mail.google.com/mail/"),
            "Pick an account, then continue to mail",
        ),
    ]
}

/// Built-in provider profiles.
pub fn default_profiles() -> Vec<ProviderProfile> {
    vec![
        ProviderProfile::new("gmail.com", &["accounts.google.com", "google.com"], GOOGLE_AUTH_NAMES)
            .blocking_framing(mail_alternatives()),
        ProviderProfile::new(
            "mail.google.com",
            &["accounts.google.com", "google.com"],
            GOOGLE_AUTH_NAMES,
        )
        .blocking_framing(mail_alternatives()),
        ProviderProfile::new(
            "calendar.google.com",
            &["accounts.google.com", "google.com"],
            GOOGLE_AUTH_NAMES,
        ),
        ProviderProfile::new(
            "drive.google.com",
            &["accounts.google.com", "google.com"],
            GOOGLE_AUTH_NAMES,
        ),
        ProviderProfile::new("claude.ai", &["anthropic.com"], &["session", "token", "auth"]),
        ProviderProfile::new("notion.so", &["notion.com"], &["token", "session", "auth"]),
    ]
}
