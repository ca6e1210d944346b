//! Port contracts for the workflow engine.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow services.

pub mod store;

pub use store::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult};
