//! Poll service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! held as a `SecretString` and redacted in Debug output.

use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default maximum number of pooled database connections.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;

/// Default per-statement timeout applied to every database connection.
pub const DEFAULT_DB_STATEMENT_TIMEOUT_SECONDS: u32 = 5;

/// Default request timeout for the HTTP layer.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Default graceful shutdown drain period.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// Default instance ID prefix.
pub const DEFAULT_INSTANCE_ID_PREFIX: &str = "poll";

/// Poll service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: SecretString,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum pooled database connections.
    pub db_max_connections: u32,

    /// Statement timeout in seconds, appended to the connection options.
    pub db_statement_timeout_seconds: u32,

    /// HTTP request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Seconds to keep draining connections after a shutdown signal.
    pub drain_seconds: u64,

    /// Unique identifier for this service instance, reported by `/health`.
    pub instance_id: String,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("db_max_connections", &self.db_max_connections)
            .field(
                "db_statement_timeout_seconds",
                &self.db_statement_timeout_seconds,
            )
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("drain_seconds", &self.drain_seconds)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let db_max_connections =
            parse_positive(vars, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;

        let db_statement_timeout_seconds = parse_positive(
            vars,
            "DB_STATEMENT_TIMEOUT_SECONDS",
            DEFAULT_DB_STATEMENT_TIMEOUT_SECONDS,
        )?;

        let request_timeout_seconds = parse_positive(
            vars,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?;

        // Zero is allowed here: it skips the drain period entirely
        let drain_seconds = match vars.get("POLL_DRAIN_SECONDS") {
            Some(value_str) => value_str.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                name: "POLL_DRAIN_SECONDS".to_string(),
                reason: format!("must be a non-negative integer, got '{}': {}", value_str, e),
            })?,
            None => DEFAULT_DRAIN_SECONDS,
        };

        let instance_id = vars.get("POLL_INSTANCE_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{}-{}-{}", DEFAULT_INSTANCE_ID_PREFIX, hostname, short_suffix)
        });

        Ok(Config {
            database_url: SecretString::from(database_url.as_str()),
            bind_address,
            db_max_connections,
            db_statement_timeout_seconds,
            request_timeout_seconds,
            drain_seconds,
            instance_id,
        })
    }

    /// Database URL with the statement timeout appended as a connection
    /// option, so no query can hang indefinitely.
    pub fn database_url_with_timeout(&self) -> String {
        let url = self.database_url.expose_secret();
        let separator = if url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}options=-c%20statement_timeout%3D{}s",
            url, separator, self.db_statement_timeout_seconds
        )
    }
}

/// Parse a strictly positive integer variable, falling back to `default`
/// when it is unset.
fn parse_positive<T>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: fmt::Display,
{
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: T = value_str.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("must be a valid positive integer, got '{}': {}", value_str, e),
    })?;

    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "DATABASE_URL".to_string(),
            "postgresql://localhost/polls_test".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(
            config.database_url.expose_secret(),
            "postgresql://localhost/polls_test"
        );
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
        assert_eq!(
            config.db_statement_timeout_seconds,
            DEFAULT_DB_STATEMENT_TIMEOUT_SECONDS
        );
        assert_eq!(config.request_timeout_seconds, DEFAULT_REQUEST_TIMEOUT_SECONDS);
        assert_eq!(config.drain_seconds, DEFAULT_DRAIN_SECONDS);
        assert!(config.instance_id.starts_with("poll-"));
    }

    #[test]
    fn test_from_vars_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("DB_MAX_CONNECTIONS".to_string(), "7".to_string());
        vars.insert("DB_STATEMENT_TIMEOUT_SECONDS".to_string(), "2".to_string());
        vars.insert("REQUEST_TIMEOUT_SECONDS".to_string(), "10".to_string());
        vars.insert("POLL_DRAIN_SECONDS".to_string(), "0".to_string());
        vars.insert("POLL_INSTANCE_ID".to_string(), "poll-test-1".to_string());

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.db_max_connections, 7);
        assert_eq!(config.db_statement_timeout_seconds, 2);
        assert_eq!(config.request_timeout_seconds, 10);
        assert_eq!(config.drain_seconds, 0);
        assert_eq!(config.instance_id, "poll-test-1");
    }

    #[test]
    fn test_missing_database_url() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn test_empty_database_url_is_missing() {
        let vars = HashMap::from([("DATABASE_URL".to_string(), String::new())]);
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_zero_max_connections_rejected() {
        let mut vars = base_vars();
        vars.insert("DB_MAX_CONNECTIONS".to_string(), "0".to_string());

        let err = Config::from_vars(&vars).unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
        assert!(err.to_string().contains("greater than 0"));
    }

    #[test]
    fn test_non_numeric_timeout_rejected() {
        let mut vars = base_vars();
        vars.insert("REQUEST_TIMEOUT_SECONDS".to_string(), "soon".to_string());

        let err = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "REQUEST_TIMEOUT_SECONDS"));
    }

    #[test]
    fn test_negative_drain_rejected() {
        let mut vars = base_vars();
        vars.insert("POLL_DRAIN_SECONDS".to_string(), "-1".to_string());

        assert!(Config::from_vars(&vars).is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut vars = base_vars();
        vars.insert(
            "DATABASE_URL".to_string(),
            "postgresql://polls:hunter2@db/polls".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_database_url_with_timeout() {
        let config = Config::from_vars(&base_vars()).unwrap();
        assert_eq!(
            config.database_url_with_timeout(),
            "postgresql://localhost/polls_test?options=-c%20statement_timeout%3D5s"
        );

        let mut vars = base_vars();
        vars.insert(
            "DATABASE_URL".to_string(),
            "postgresql://localhost/polls?sslmode=disable".to_string(),
        );
        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(
            config.database_url_with_timeout(),
            "postgresql://localhost/polls?sslmode=disable&options=-c%20statement_timeout%3D5s"
        );
    }
}
