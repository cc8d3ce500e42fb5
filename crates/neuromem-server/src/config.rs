//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Result, ServerError};
use neuromem::MemoryConfig;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable Prometheus metrics
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds to wait for queued stores on shutdown
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// Cache, queue and codec settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metrics_enabled: default_metrics_enabled(),
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            drain_timeout_secs: default_drain_timeout_secs(),
            memory: MemoryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        config.memory.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Address to bind, as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12000
}

fn default_metrics_enabled() -> bool {
    false
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_drain_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 12000);
        assert_eq!(config.bind_addr(), "0.0.0.0:12000");
        assert!(!config.metrics_enabled);
        assert_eq!(config.memory.cache.capacity, 12_000);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, 12000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.memory.codec.input_size, 1024);
    }

    #[test]
    fn test_nested_memory_section() {
        let config = ServerConfig::from_toml_str(
            r#"
            port = 8080
            metrics_enabled = true

            [memory]
            codec_kind = "passthrough"

            [memory.cache]
            capacity = 100
            train_steps = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.metrics_enabled);
        assert_eq!(config.memory.cache.capacity, 100);
        assert_eq!(config.memory.cache.train_steps, 10);
        assert_eq!(config.memory.queue.capacity, 12_000);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ServerConfig::from_toml_str("port = \"high\""),
            Err(ServerError::Config(_))
        ));
        assert!(ServerConfig::from_toml_str("[memory.cache]\ncapacity = 0").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"127.0.0.1\"\nport = 3000").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");

        assert!(ServerConfig::from_file("/nonexistent/server.toml").is_err());
    }
}
