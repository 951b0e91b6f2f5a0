//! Middleware for the poll service.
//!
//! # Components
//!
//! - `participant` - Participant identity extraction
//! - `http_metrics` - HTTP request metrics for all responses

pub mod http_metrics;
pub mod participant;

pub use http_metrics::http_metrics_middleware;
pub use participant::{optional_participant, require_participant, Participant};
