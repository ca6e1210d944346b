//! Adapter implementations for the workflow store port.

pub mod memory;
pub mod postgres;
