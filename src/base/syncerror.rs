use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SyncError {
    // Input Errors
    #[error("Invalid target URL")]
    InvalidTargetUrl,
    #[error("Invalid domain")]
    InvalidDomain,

    // Cookie Store Errors
    #[error("Cookie store unavailable for {domain}: {reason}")]
    CookieStoreUnavailable { domain: String, reason: String },
    #[error("Cookie {name} rejected: {reason}")]
    CookieRejected { name: String, reason: String },
    #[error("Cookie prefix validation failed")]
    CookieInvalidPrefix,
    #[error("Cookie domain is a public suffix")]
    CookiePublicSuffix,

    // Orchestration Errors
    #[error("A session sync is already in flight for this pane")]
    SyncInFlight,
    #[error("Embedding frame unavailable")]
    FrameUnavailable,

    // Host Errors
    #[error("Storage failed: {reason}")]
    StorageFailed { reason: String },
    #[error("Invalid configuration: {reason}")]
    ConfigInvalid { reason: String },
    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl SyncError {
    /// Create a store-unavailable error for one domain.
    pub fn store_unavailable(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::CookieStoreUnavailable {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a rejected-write error. Never include the cookie value.
    pub fn cookie_rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::CookieRejected {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn storage_failed(reason: impl Into<String>) -> Self {
        SyncError::StorageFailed {
            reason: reason.into(),
        }
    }

    pub fn config_invalid(reason: impl Into<String>) -> Self {
        SyncError::ConfigInvalid {
            reason: reason.into(),
        }
    }

    pub fn malformed_message(reason: impl Into<String>) -> Self {
        SyncError::MalformedMessage {
            reason: reason.into(),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            SyncError::InvalidTargetUrl => -300,
            SyncError::InvalidDomain => -301,

            SyncError::CookieStoreUnavailable { .. } => -400,
            SyncError::CookieRejected { .. } => -401,
            SyncError::CookieInvalidPrefix => -402,
            SyncError::CookiePublicSuffix => -403,

            SyncError::SyncInFlight => -500,
            SyncError::FrameUnavailable => -501,

            SyncError::StorageFailed { .. } => -600,
            SyncError::ConfigInvalid { .. } => -601,
            SyncError::MalformedMessage { .. } => -602,

            SyncError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for SyncError {
    fn from(code: i32) -> Self {
        match code {
            -300 => SyncError::InvalidTargetUrl,
            -301 => SyncError::InvalidDomain,
            -400 => SyncError::store_unavailable("", ""),
            -401 => SyncError::cookie_rejected("", ""),
            -402 => SyncError::CookieInvalidPrefix,
            -403 => SyncError::CookiePublicSuffix,
            -500 => SyncError::SyncInFlight,
            -501 => SyncError::FrameUnavailable,
            -600 => SyncError::storage_failed(""),
            -601 => SyncError::config_invalid(""),
            -602 => SyncError::malformed_message(""),
            _ => SyncError::Unknown(code),
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(_: url::ParseError) -> Self {
        SyncError::InvalidTargetUrl
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::malformed_message(err.to_string())
    }
}
