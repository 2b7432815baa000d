//! Configuration module for depot.

use serde::Deserialize;
use std::path::Path;

use crate::{DepotError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one physical file per stored object.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Path to the JSON index document.
    #[serde(default = "default_index_path")]
    pub index_path: String,
    /// Maximum upload request size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_index_path() -> String {
    "data/files.json".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl StorageConfig {
    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            index_path: default_index_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Blank logs to the console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/depot.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DepotError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DepotError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DEPOT_HOST`: bind address
    /// - `DEPOT_PORT`: listen port (ignored if not a valid port number)
    /// - `DEPOT_UPLOAD_DIR`: storage directory
    /// - `DEPOT_INDEX_PATH`: index document path
    pub fn apply_env_overrides(&mut self) {
        if let Some(host) = non_empty_env("DEPOT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty_env("DEPOT_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = non_empty_env("DEPOT_UPLOAD_DIR") {
            self.storage.upload_dir = dir;
        }
        if let Some(path) = non_empty_env("DEPOT_INDEX_PATH") {
            self.storage.index_path = path;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.upload_dir.trim().is_empty() {
            return Err(DepotError::Config("storage.upload_dir must not be empty".to_string()));
        }
        if self.storage.index_path.trim().is_empty() {
            return Err(DepotError::Config("storage.index_path must not be empty".to_string()));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(DepotError::Config(
                "storage.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.storage.upload_dir, "uploads");
        assert_eq!(config.storage.index_path, "data/files.json");
        assert_eq!(config.storage.max_upload_size_mb, 100);
        assert_eq!(config.storage.max_upload_bytes(), 100 * 1024 * 1024);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/depot.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
cors_origins = ["http://localhost:5173"]

[storage]
upload_dir = "/srv/depot/objects"
index_path = "/srv/depot/index.json"
max_upload_size_mb = 5

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);

        assert_eq!(config.storage.upload_dir, "/srv/depot/objects");
        assert_eq!(config.storage.index_path, "/srv/depot/index.json");
        assert_eq!(config.storage.max_upload_size_mb, 5);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[storage]
upload_dir = "blobs"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.storage.upload_dir, "blobs");
        assert_eq!(config.storage.index_path, "data/files.json");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("this is not valid toml [[[");
        assert!(matches!(result, Err(DepotError::Config(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent_config_file.toml");
        assert!(matches!(result, Err(DepotError::Io(_))));
    }

    #[test]
    fn test_validate_default_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_upload_limit() {
        let mut config = Config::default();
        config.storage.max_upload_size_mb = 0;
        assert!(matches!(config.validate(), Err(DepotError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let mut config = Config::default();
        config.storage.upload_dir = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.index_path = String::new();
        assert!(config.validate().is_err());
    }
}
