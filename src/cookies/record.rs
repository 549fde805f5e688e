use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use url::Url;

/// A cookie as enumerated from the host cookie store.
///
/// Records are read-only snapshots: rewriting always produces a new
/// [`CookieWrite`] and the store hands back a fresh record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: SameSite,
    #[serde(
        default,
        with = "expiration_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_date: Option<OffsetDateTime>,
}

/// Identity of a cookie across collection passes: `(name, domain)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    #[default]
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

impl CookieRecord {
    /// A transient (no expiration) cookie with path `/` and no flags.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            same_site: SameSite::Unspecified,
            expiration_date: None,
        }
    }

    pub fn with_expiration(mut self, expiration: OffsetDateTime) -> Self {
        self.expiration_date = Some(expiration);
        self
    }

    pub fn with_flags(mut self, secure: bool, http_only: bool) -> Self {
        self.secure = secure;
        self.http_only = http_only;
        self
    }

    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
        }
    }

    /// Host-only cookies carry no leading dot.
    pub fn is_host_only(&self) -> bool {
        !self.domain.starts_with('.')
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiration_date.is_some_and(|expiry| expiry < now)
    }

    /// True for transient cookies and for cookies expiring before `now + window`.
    pub fn expires_within(&self, now: OffsetDateTime, window: Duration) -> bool {
        match self.expiration_date {
            None => true,
            Some(expiry) => expiry - now < window,
        }
    }

    /// Validate __Secure- and __Host- cookie prefixes per RFC 6265bis.
    /// - __Secure- cookies MUST have the Secure attribute
    /// - __Host- cookies MUST have Secure, Path="/", and no Domain attribute
    pub fn validate_prefix(&self, secure_origin: bool) -> Result<(), crate::base::syncerror::SyncError> {
        use crate::base::syncerror::SyncError;

        if self.name.starts_with("__Secure-") && (!self.secure || !secure_origin) {
            return Err(SyncError::CookieInvalidPrefix);
        }

        if self.name.starts_with("__Host-")
            && (!self.secure || self.path != "/" || !self.is_host_only() || !secure_origin)
        {
            return Err(SyncError::CookieInvalidPrefix);
        }

        Ok(())
    }
}

/// An applyable cookie: the attribute set handed to [`CookieStore::set`].
///
/// `domain == None` asks for a host-only cookie on `url`'s host.
///
/// [`CookieStore::set`]: crate::cookies::store::CookieStore::set
#[derive(Debug, Clone, PartialEq)]
pub struct CookieWrite {
    pub url: Url,
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub expiration_date: Option<OffsetDateTime>,
}

/// Host stores report expiration as fractional Unix seconds.
///
/// Values outside the representable range clamp to the nearest bound.
mod expiration_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{OffsetDateTime, PrimitiveDateTime};

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.serialize_some(&(t.unix_timestamp_nanos() as f64 / 1e9)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let secs: Option<f64> = Option::deserialize(deserializer)?;
        Ok(secs.map(from_seconds))
    }

    pub(super) fn from_seconds(secs: f64) -> OffsetDateTime {
        // Float to int casts saturate.
        let nanos = (secs * 1e9) as i128;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or_else(|_| {
            if nanos > 0 {
                PrimitiveDateTime::MAX.assume_utc()
            } else {
                PrimitiveDateTime::MIN.assume_utc()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::PrimitiveDateTime;

    #[test]
    fn test_transient_expires_within_any_window() {
        let cookie = CookieRecord::new("sid", "x", "example.com");
        assert!(cookie.expiration_date.is_none());
        assert!(cookie.expires_within(OffsetDateTime::now_utc(), Duration::ZERO));
    }

    #[test]
    fn test_expires_within_window() {
        let now = OffsetDateTime::now_utc();
        let soon = CookieRecord::new("a", "1", "example.com").with_expiration(now + Duration::hours(2));
        let later = CookieRecord::new("b", "1", "example.com").with_expiration(now + Duration::days(30));
        let past = CookieRecord::new("c", "1", "example.com").with_expiration(now - Duration::hours(1));

        assert!(soon.expires_within(now, Duration::hours(24)));
        assert!(!later.expires_within(now, Duration::hours(24)));
        assert!(past.expires_within(now, Duration::hours(24)));
        assert!(past.is_expired(now));
    }

    #[test]
    fn test_host_prefix_requires_host_only() {
        let mut cookie = CookieRecord::new("__Host-id", "x", ".example.com").with_flags(true, false);
        assert_eq!(cookie.validate_prefix(true), Err(crate::base::syncerror::SyncError::CookieInvalidPrefix));

        cookie.domain = "example.com".to_string();
        assert!(cookie.validate_prefix(true).is_ok());
        assert!(cookie.validate_prefix(false).is_err());
    }

    #[test]
    fn test_deserialize_host_shape() {
        let json = r#"{
            "name": "sessionid",
            "value": "abc",
            "domain": ".example.com",
            "path": "/",
            "secure": true,
            "httpOnly": true,
            "sameSite": "no_restriction",
            "expirationDate": 1735689600.5
        }"#;

        let cookie: CookieRecord = serde_json::from_str(json).unwrap();
        assert!(cookie.http_only);
        assert_eq!(cookie.same_site, SameSite::NoRestriction);
        assert_eq!(cookie.expiration_date.unwrap().unix_timestamp(), 1735689600);
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let json = r#"{"name": "a", "value": "b", "domain": "example.com", "expirationDate": null}"#;
        let cookie: CookieRecord = serde_json::from_str(json).unwrap();
        assert!(cookie.expiration_date.is_none());
        assert_eq!(cookie.same_site, SameSite::Unspecified);
        assert_eq!(cookie.path, "");
    }

    #[test]
    fn test_out_of_range_expiration_clamps() {
        let json = r#"{"name": "a", "value": "b", "domain": "example.com", "expirationDate": 253402300800.0}"#;
        let cookie: CookieRecord = serde_json::from_str(json).unwrap();
        assert_eq!(cookie.expiration_date, Some(PrimitiveDateTime::MAX.assume_utc()));
        assert!(!cookie.is_expired(OffsetDateTime::now_utc()));

        let ancient = expiration_seconds::from_seconds(-1e300);
        assert_eq!(ancient, PrimitiveDateTime::MIN.assume_utc());
    }

    #[test]
    fn test_serialize_uses_host_field_names() {
        let cookie = CookieRecord::new("a", "b", "example.com").with_flags(false, true);
        let json = serde_json::to_string(&cookie).unwrap();
        assert!(json.contains("\"httpOnly\":true"));
        assert!(json.contains("\"sameSite\":\"unspecified\""));
        assert!(!json.contains("expirationDate"));
    }
}
