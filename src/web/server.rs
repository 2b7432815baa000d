//! Web server for depot.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{ServerConfig, StorageConfig};
use crate::{DepotError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router, create_swagger_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server, preparing the upload directory.
    pub fn new(server: &ServerConfig, storage: &StorageConfig) -> Result<Self> {
        let app_state = AppState::from_config(storage)?;
        tracing::info!(
            upload_dir = %app_state.storage.base_path().display(),
            index = %app_state.index.path().display(),
            "File storage initialized"
        );

        Self::from_state(server, app_state)
    }

    /// Create a web server around an existing state.
    pub fn from_state(server: &ServerConfig, app_state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", server.host, server.port)
            .parse()
            .map_err(|e| {
                DepotError::Config(format!(
                    "invalid listen address {}:{}: {e}",
                    server.host, server.port
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins: server.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Full application router: API, health check and Swagger UI.
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.app_state), &self.cors_origins)
            .merge(create_health_router())
            .merge(create_swagger_router())
    }

    /// Make sure the index exists and report index/storage disagreements.
    ///
    /// Nothing is repaired; orphans are only logged.
    pub async fn prepare(&self) -> Result<()> {
        if self.app_state.index.init().await? {
            tracing::info!(
                path = %self.app_state.index.path().display(),
                "Created empty file index"
            );
        }

        let report = self.app_state.file_service().find_orphans().await?;
        if report.is_clean() {
            tracing::debug!("Index and storage directory agree");
        } else {
            for name in &report.untracked_files {
                tracing::warn!(file = %name, "Stored file has no index record");
            }
            for id in &report.missing_objects {
                tracing::warn!(id = %id, "Indexed object has no stored file");
            }
        }

        Ok(())
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        self.prepare().await?;

        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        self.prepare().await?;

        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, closing server"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_configs(temp_dir: &TempDir) -> (ServerConfig, StorageConfig) {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        };
        let storage = StorageConfig {
            upload_dir: temp_dir.path().join("uploads").to_string_lossy().into_owned(),
            index_path: temp_dir
                .path()
                .join("data")
                .join("files.json")
                .to_string_lossy()
                .into_owned(),
            max_upload_size_mb: 1,
        };
        (server, storage)
    }

    #[test]
    fn test_web_server_new() {
        let temp_dir = TempDir::new().unwrap();
        let (server, storage) = create_test_configs(&temp_dir);

        let web = WebServer::new(&server, &storage).unwrap();

        assert_eq!(web.addr().ip().to_string(), "127.0.0.1");
        assert!(temp_dir.path().join("uploads").exists());
    }

    #[test]
    fn test_web_server_invalid_host() {
        let temp_dir = TempDir::new().unwrap();
        let (mut server, storage) = create_test_configs(&temp_dir);
        server.host = "not a host".to_string();

        let result = WebServer::new(&server, &storage);

        assert!(matches!(result, Err(DepotError::Config(_))));
    }

    #[tokio::test]
    async fn test_prepare_creates_index() {
        let temp_dir = TempDir::new().unwrap();
        let (server, storage) = create_test_configs(&temp_dir);
        let web = WebServer::new(&server, &storage).unwrap();

        web.prepare().await.unwrap();

        assert!(temp_dir.path().join("data").join("files.json").exists());
    }

    #[tokio::test]
    async fn test_prepare_fails_on_corrupt_index() {
        let temp_dir = TempDir::new().unwrap();
        let (server, storage) = create_test_configs(&temp_dir);
        std::fs::create_dir_all(temp_dir.path().join("data")).unwrap();
        std::fs::write(temp_dir.path().join("data").join("files.json"), b"nope").unwrap();
        let web = WebServer::new(&server, &storage).unwrap();

        assert!(matches!(web.prepare().await, Err(DepotError::Storage(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp_dir = TempDir::new().unwrap();
        let (server, storage) = create_test_configs(&temp_dir);

        let web = WebServer::new(&server, &storage).unwrap();
        let addr = web.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");

        let resp = client
            .get(format!("http://{}/api/files", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }
}
