//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types. `SecretString` implements `Debug` with
//! redaction, so any struct deriving `Debug` that holds one is safe to log.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct DatabaseSettings {
//!     url: SecretString,
//!     max_connections: u32,
//! }
//!
//! let settings = DatabaseSettings {
//!     url: SecretString::from("postgresql://polls:hunter2@db/polls"),
//!     max_connections: 20,
//! };
//!
//! // The password never reaches the log line
//! println!("{:?}", settings);
//!
//! // Callers must opt in to reading the value
//! let url: &str = settings.url.expose_secret();
//! assert!(url.starts_with("postgresql://"));
//! ```
//!
//! Use `SecretString` for database URLs, passwords and API keys.

pub use secrecy::{ExposeSecret, SecretString};
