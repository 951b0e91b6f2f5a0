//! Observability module for the poll service.
//!
//! Provides metrics definitions and instrumentation helpers.

pub mod metrics;
