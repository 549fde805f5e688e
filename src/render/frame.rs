//! The page-embedding seam.
//!
//! The host owns the actual embedded view; the pane drives it through
//! [`EmbeddingFrame`] and learns about load results from [`FrameEvent`]s the
//! host pushes back.

use crate::base::syncerror::SyncError;
use std::sync::Mutex;
use url::Url;

/// Trait for the host's embedded page.
///
/// # Design Notes
///
/// - Calls are synchronous: they only touch host view state, never the network.
/// - `current_address` may be unreadable (a cross-origin frame); callers
///   treat [`SyncError::FrameUnavailable`] as "unknown", not as failure.
pub trait EmbeddingFrame: Send + Sync {
    /// Point the frame at `url`; the load result arrives as a [`FrameEvent`].
    fn set_address(&self, url: &Url) -> Result<(), SyncError>;

    /// The address the frame currently shows, after any redirects.
    fn current_address(&self) -> Result<String, SyncError>;

    /// Size of the rendered document, used to detect blank renders.
    fn content_length(&self) -> Result<usize, SyncError>;
}

/// Load signals pushed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Loaded,
    Error(String),
}

#[derive(Debug, Default)]
struct FrameState {
    address: Option<String>,
    content_length: usize,
    history: Vec<String>,
}

/// A frame that only records what it was told.
///
/// Headless hosts use it to drive a pane without a view; it also serves as
/// the frame in tests, where the test plays the host by pushing events.
#[derive(Debug, Default)]
pub struct MemoryFrame {
    state: Mutex<FrameState>,
}

impl MemoryFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a redirect: the frame now shows `address`.
    pub fn redirect(&self, address: &str) {
        self.with_state(|s| s.address = Some(address.to_string()));
    }

    pub fn set_content_length(&self, len: usize) {
        self.with_state(|s| s.content_length = len);
    }

    /// Every address passed to `set_address`, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.with_state(|s| s.history.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FrameState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }
}

impl EmbeddingFrame for MemoryFrame {
    fn set_address(&self, url: &Url) -> Result<(), SyncError> {
        self.with_state(|s| {
            s.address = Some(url.to_string());
            s.history.push(url.to_string());
        });
        Ok(())
    }

    fn current_address(&self) -> Result<String, SyncError> {
        self.with_state(|s| s.address.clone())
            .ok_or(SyncError::FrameUnavailable)
    }

    fn content_length(&self) -> Result<usize, SyncError> {
        Ok(self.with_state(|s| s.content_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_frame_tracks_address() {
        let frame = MemoryFrame::new();
        assert_eq!(frame.current_address(), Err(SyncError::FrameUnavailable));

        frame
            .set_address(&Url::parse("https://example.com/").unwrap())
            .unwrap();
        frame.redirect("https://accounts.example.com/login");

        assert_eq!(frame.current_address().unwrap(), "https://accounts.example.com/login");
        assert_eq!(frame.history(), vec!["https://example.com/".to_string()]);
    }
}
