//! The session replication engine.
//!
//! Data flows leaves-first:
//!
//! - **Domains/registry**: [`DomainSet`](domains::DomainSet) widening and the
//!   data-driven [`ProviderRegistry`](registry::ProviderRegistry)
//! - **Collector**: enumerate cookies across domains, skipping failures
//! - **Classifier**: partition into important and ordinary
//! - **Rewriter**: retarget attributes, with one fallback write per cookie
//! - **Orchestrator**: basic, advanced and forced strategies behind a phase guard
//! - **Validator**: login-redirect detection and the one-retry budget

pub mod classifier;
pub mod collector;
pub mod domains;
pub mod orchestrator;
pub mod patterns;
pub mod registry;
pub mod rewriter;
pub mod validator;

pub use orchestrator::{SyncOrchestrator, SyncRequest, SyncResult, SyncStrategy};
