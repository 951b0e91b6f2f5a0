//! Test server harness for E2E testing
//!
//! Provides `TestPollServer` for spawning real poll service instances in
//! tests.

use metrics_exporter_prometheus::PrometheusBuilder;
use poll_service::config::Config;
use poll_service::middleware::participant::PARTICIPANT_HEADER;
use poll_service::routes::{self, AppState};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the poll service in E2E tests.
///
/// The metrics handle comes from a recorder that is built but not
/// installed globally, so any number of servers can run in one process.
pub struct TestPollServer {
    addr: SocketAddr,
    pool: PgPool,
    config: Config,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestPollServer {
    /// Spawn a server on a random local port backed by `pool`.
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("POLL_INSTANCE_ID".to_string(), "poll-test".to_string()),
            ("POLL_DRAIN_SECONDS".to_string(), "0".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState {
            pool: pool.clone(),
            config: config.clone(),
        });

        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get reference to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET `path` without a participant identity.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.url(), path))
    }

    /// GET `path` as `participant_id`.
    pub fn get_as(&self, participant_id: i64, path: &str) -> reqwest::RequestBuilder {
        self.get(path)
            .header(PARTICIPANT_HEADER, participant_id.to_string())
    }

    /// POST `path` without a participant identity.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.url(), path))
    }

    /// POST `path` as `participant_id`.
    pub fn post_as(&self, participant_id: i64, path: &str) -> reqwest::RequestBuilder {
        self.post(path)
            .header(PARTICIPANT_HEADER, participant_id.to_string())
    }
}

impl Drop for TestPollServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_server_spawns_successfully(pool: PgPool) -> Result<(), anyhow::Error> {
        let server = TestPollServer::spawn(pool).await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));

        let response = server.get("/health").send().await?;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["instance_id"], "poll-test");
        assert_eq!(body["database"], "healthy");

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_server_provides_addr(pool: PgPool) -> Result<(), anyhow::Error> {
        let server = TestPollServer::spawn(pool).await?;

        let addr = server.addr();
        assert!(addr.ip().is_loopback());
        assert!(addr.port() > 0);
        assert_eq!(server.url(), format!("http://{}", addr));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_multiple_servers_can_run(pool: PgPool) -> Result<(), anyhow::Error> {
        let first = TestPollServer::spawn(pool.clone()).await?;
        let second = TestPollServer::spawn(pool).await?;

        assert_ne!(first.addr(), second.addr());
        assert_eq!(second.get("/health").send().await?.status(), 200);

        Ok(())
    }
}
