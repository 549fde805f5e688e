//! Ordered substring tables used by the classifier, validator and
//! provider registry.

use serde::{Deserialize, Serialize};

/// An ordered list of lowercase substrings matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PatternTable {
    patterns: Vec<String>,
}

impl PatternTable {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for pattern in patterns {
            table.push(pattern);
        }
        table
    }

    /// Append a pattern; empty and duplicate patterns are ignored.
    pub fn push(&mut self, pattern: impl AsRef<str>) {
        let pattern = pattern.as_ref().trim().to_lowercase();
        if !pattern.is_empty() && !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// First pattern (in table order) contained in `haystack`.
    pub fn first_match(&self, haystack: &str) -> Option<&str> {
        let haystack = haystack.to_lowercase();
        self.patterns
            .iter()
            .find(|p| haystack.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, haystack: &str) -> bool {
        self.first_match(haystack).is_some()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl From<Vec<String>> for PatternTable {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl From<PatternTable> for Vec<String> {
    fn from(table: PatternTable) -> Self {
        table.patterns
    }
}

/// Session/auth vocabulary for the important-cookie filter.
pub fn default_important_patterns() -> PatternTable {
    PatternTable::new([
        "session", "auth", "token", "login", "user", "sid", "sso", "csrf", "xsrf", "jwt",
        "bearer", "oauth", "identity", "remember", "persistent", "connect", "secure", "refresh",
        // analytics and tracking
        "_ga", "_gid", "_gat", "_fbp", "_fbc",
        // framework session cookies
        "phpsessid", "jsessionid", "asp.net_sessionid",
        // CDN and load balancer cookies
        "__cf_bm", "__cflb", "awsalb", "awsalbcors",
    ])
}

/// Address fragments that indicate a login or authentication redirect.
pub fn default_login_indicators() -> PatternTable {
    PatternTable::new([
        "/login",
        "/signin",
        "/authenticate",
        "login.",
        "auth.",
        "accounts.",
        "/oauth/authorize",
        "/sso/",
    ])
}
