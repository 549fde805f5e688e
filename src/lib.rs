//! # splitsync
//!
//! Cross-origin session replication for split-view browsing.
//!
//! `splitsync` makes an already-authenticated site load correctly in a
//! second, embedded pane by replicating the browser's cookies into that
//! pane's delivery context: deciding which cookies matter, rewriting their
//! attributes so the host store accepts them, retrying degraded loads once,
//! and falling back to a manual escape when a site refuses to be framed.
//!
//! ## Features
//!
//! - **Collection**: domain-set widening with PSL-aware registrable roots
//! - **Classification**: configurable pattern tables for session cookies
//! - **Rewriting**: ordinary and session-priority policies with one fallback write
//! - **Orchestration**: basic, advanced and forced strategies behind a phase guard
//! - **Validation**: login-redirect detection with a single bounded retry
//! - **Fallback**: alternative routes for providers that block framing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use splitsync::config::SyncConfig;
//! use splitsync::cookies::memory::MemoryCookieStore;
//! use splitsync::sync::SyncOrchestrator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryCookieStore::new());
//!     let orchestrator = SyncOrchestrator::new(store, &SyncConfig::default());
//!
//!     let result = orchestrator
//!         .advanced_sync("example.com", "https://app.example.com/", "example.com")
//!         .await;
//!     println!("synced {}/{}", result.synced_count, result.total_count);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes, error context and the sync phase machine
//! - [`cookies`] - Cookie records, the host store seam and an in-memory store
//! - [`sync`] - Collector, classifier, rewriter, orchestrator and validator
//! - [`render`] - The embedding frame seam and fallback views
//! - [`pane`] - The split pane's navigation flow and timers
//! - [`history`] - Persisted navigation history
//! - [`messaging`] - The action-tagged request/response contract
//! - [`config`] - Engine configuration

pub mod base;
pub mod config;
pub mod cookies;
pub mod history;
pub mod messaging;
pub mod pane;
pub mod render;
pub mod sync;
