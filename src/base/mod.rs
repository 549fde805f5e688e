//! Base types and error handling.
//!
//! Provides foundational types shared by every sync component:
//! - [`SyncError`](syncerror::SyncError): error codes for collection, rewriting and application
//! - [`SyncPhase`](syncphase::SyncPhase): the orchestrator's state machine

pub mod context;
pub mod syncerror;
pub mod syncphase;
