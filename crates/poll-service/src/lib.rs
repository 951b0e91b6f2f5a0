//! Live Polls service library.
//!
//! Lets participants of a meeting create polls, cast one vote per poll and
//! close polls. Rooms are addressed by name; the service maps names to
//! durable meeting records, creating workspace-channel meetings on first use.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Participant identity and HTTP metrics layers
//! - `models` - Rows, domain types and payloads
//! - `observability` - Prometheus metrics
//! - `repositories` - PostgreSQL access
//! - `routes` - Axum router setup
//! - `services` - Identity resolution, voting and poll lifecycle

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
