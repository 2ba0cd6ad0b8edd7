//! RPC server configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use tracing::{info, warn};

/// Main RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Blocking workers running the synchronous core
    pub worker_threads: usize,
    /// Request validation limits
    pub limits: LimitsConfig,
    /// Blocks a node may lag behind before rejecting transactions
    pub max_sync_lag: u64,
    /// Leaf sets kept by the proof service
    pub proof_cache_size: usize,
    /// Log output
    pub logging: LoggingConfig,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            worker_threads: 8,
            limits: LimitsConfig::default(),
            max_sync_lag: 5,
            proof_cache_size: 256,
            logging: LoggingConfig::default(),
        }
    }
}

impl RpcConfig {
    /// Load from a TOML file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `QC_RPC_HOST`, `QC_RPC_PORT` and `QC_RPC_WORKERS`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("QC_RPC_HOST") {
            match raw.parse::<IpAddr>() {
                Ok(host) => {
                    info!("[qc-19] http.host overridden from environment: {}", host);
                    self.http.host = host;
                }
                Err(_) => warn!("[qc-19] ignoring invalid QC_RPC_HOST={}", raw),
            }
        }
        if let Ok(raw) = std::env::var("QC_RPC_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => {
                    info!("[qc-19] http.port overridden from environment: {}", port);
                    self.http.port = port;
                }
                Err(_) => warn!("[qc-19] ignoring invalid QC_RPC_PORT={}", raw),
            }
        }
        if let Ok(raw) = std::env::var("QC_RPC_WORKERS") {
            match raw.parse::<usize>() {
                Ok(workers) => self.worker_threads = workers,
                Err(_) => warn!("[qc-19] ignoring invalid QC_RPC_WORKERS={}", raw),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::InvalidLimit(
                "worker_threads cannot be 0".into(),
            ));
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }

        if self.limits.max_batch_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_batch_size cannot be 0".into(),
            ));
        }

        if self.proof_cache_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "proof_cache_size cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8545)
    pub port: u16,
    /// Enable HTTP server
    pub enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8545,
            enabled: true,
        }
    }
}

/// Request validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 1MB)
    pub max_request_size: usize,
    /// Max batch size (number of requests in batch)
    pub max_batch_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 1024 * 1024, // 1MB
            max_batch_size: 100,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config: {0}")]
    Io(String),
    /// Config file is not valid TOML for this schema
    #[error("cannot parse config: {0}")]
    Parse(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}
