//! `PostgreSQL` adapter for workflow persistence.

mod conversions;
mod models;
mod repository;
mod schema;

pub use repository::{PostgresWorkflowStore, WorkflowPgPool};
