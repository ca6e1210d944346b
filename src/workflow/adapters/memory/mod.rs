//! In-memory adapter for the workflow store port.

mod store;

pub use store::InMemoryWorkflowStore;
