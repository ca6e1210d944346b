//! Signoff: workflow consistency engine for task approval pipelines.
//!
//! This crate owns the status of a task and of its dependent response,
//! review and final-approval records. It decides which transitions are
//! legal and commits each accepted transition atomically. Retried requests
//! are made idempotent and concurrent requests for the same task are
//! serialised.
//!
//! # Architecture
//!
//! Signoff follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//! - **Services**: Orchestration of reads, decisions and commits
//!
//! # Modules
//!
//! - [`config`]: Layered runtime configuration
//! - [`workflow`]: Approval pipeline state machine, store and services

pub mod config;
pub mod workflow;
