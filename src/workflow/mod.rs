//! Workflow consistency engine for the task approval pipeline.
//!
//! A task moves through a fixed chain of parties: an assignee responds, a
//! reviewer approves or rejects the response, and a final approver closes
//! the task or bounces it back to review. The module follows hexagonal
//! architecture:
//!
//! - Domain types and the pure state machine in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
