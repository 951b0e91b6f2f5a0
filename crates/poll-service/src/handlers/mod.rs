//! HTTP request handlers for the poll service.

pub mod health;
pub mod metrics;
pub mod polls;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use polls::{cast_vote, close_poll, create_poll, list_polls};
