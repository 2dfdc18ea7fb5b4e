//! Client configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via HOSTLINK_CONFIG)
//! 3. Environment variables

use hostlink_codepage::DEFAULT_CCSID;
use hostlink_protocol::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host name or address.
    pub host: String,
    /// Database service port.
    pub port: u16,
    /// Preferred CCSID offered during the attribute exchange.
    pub ccsid: u32,
    /// Name reported to the host.
    pub client_name: String,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds; 0 waits forever.
    pub read_timeout_ms: u64,
    /// Session cap applied when reading result values; 0 is unbounded.
    pub max_field_size: usize,
    /// Records per directory listing batch.
    pub directory_batch_size: u16,
    /// TLS configuration.
    pub tls: TlsClientConfig,
    /// Pool configuration.
    pub pool: PoolConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            ccsid: DEFAULT_CCSID,
            client_name: "hostlink".to_string(),
            connect_timeout_ms: 10_000,
            read_timeout_ms: 30_000,
            max_field_size: 0,
            directory_batch_size: 128,
            tls: TlsClientConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("HOSTLINK_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML file; missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: ClientConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Defaults plus `HOSTLINK_*` overrides, no file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Writes the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOSTLINK_HOST") {
            self.host = host;
        }
        if let Some(port) = env_parse("HOSTLINK_PORT") {
            self.port = port;
        }
        if let Some(ccsid) = env_parse("HOSTLINK_CCSID") {
            self.ccsid = ccsid;
        }
        if let Some(size) = env_parse("HOSTLINK_MAX_FIELD_SIZE") {
            self.max_field_size = size;
        }
        if let Some(ms) = env_parse("HOSTLINK_READ_TIMEOUT_MS") {
            self.read_timeout_ms = ms;
        }
        self.tls.apply_env_overrides();
        self.pool.apply_env_overrides();
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Validation("host must not be empty".to_string()));
        }
        if self.directory_batch_size == 0 {
            return Err(ConfigError::Validation(
                "directory_batch_size must be at least 1".to_string(),
            ));
        }
        self.pool.validate()?;
        self.tls.validate()
    }

    /// Returns `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout, `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    pub fn with_ccsid(mut self, ccsid: u32) -> Self {
        self.ccsid = ccsid;
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    pub fn with_directory_batch_size(mut self, size: u16) -> Self {
        self.directory_batch_size = size.max(1);
        self
    }

    pub fn with_tls(mut self, tls: TlsClientConfig) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

/// What `acquire` does when every connection is busy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedPolicy {
    /// Wait up to the acquire timeout for a release.
    #[default]
    Block,
    /// Fail immediately.
    Fail,
}

/// Pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Upper bound on physical connections.
    pub max_connections: usize,
    /// Idle connections kept by `prune_idle` and opened by `warm_up`.
    pub min_idle: usize,
    /// Behavior when the pool is exhausted.
    pub exhausted: ExhaustedPolicy,
    /// How long a blocking acquire waits, in milliseconds.
    pub acquire_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            min_idle: 0,
            exhausted: ExhaustedPolicy::Block,
            acquire_timeout_ms: 30_000,
        }
    }
}

impl PoolConfig {
    pub fn new(max_connections: usize) -> Self {
        Self {
            max_connections,
            ..Self::default()
        }
    }

    pub fn with_min_idle(mut self, min_idle: usize) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn with_exhausted(mut self, policy: ExhaustedPolicy) -> Self {
        self.exhausted = policy;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(max) = env_parse("HOSTLINK_POOL_MAX") {
            self.max_connections = max;
        }
        if let Some(min) = env_parse("HOSTLINK_POOL_MIN_IDLE") {
            self.min_idle = min;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "pool.max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_idle > self.max_connections {
            return Err(ConfigError::Validation(format!(
                "pool.min_idle ({}) exceeds pool.max_connections ({})",
                self.min_idle, self.max_connections
            )));
        }
        Ok(())
    }
}

/// TLS settings for host sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsClientConfig {
    /// Wrap the session in TLS.
    pub enabled: bool,
    /// PEM file of CA certificates trusted for the host; webpki roots when unset.
    pub ca_cert_path: Option<PathBuf>,
    /// PEM client certificate chain presented to the host.
    pub client_cert_path: Option<PathBuf>,
    /// PEM private key matching `client_cert_path`.
    pub client_key_path: Option<PathBuf>,
    /// Accept any host certificate. Test hosts only.
    pub insecure: bool,
    /// Server name for SNI (defaults to the configured host).
    pub server_name: Option<String>,
}

impl TlsClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_path = Some(path.into());
        self.enabled = true;
        self
    }

    pub fn with_client_cert(
        mut self,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        self.client_cert_path = Some(cert_path.into());
        self.client_key_path = Some(key_path.into());
        self.enabled = true;
        self
    }

    pub fn with_insecure(mut self) -> Self {
        self.insecure = true;
        self.enabled = true;
        self
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("HOSTLINK_TLS") {
            self.enabled = enabled == "1" || enabled.to_lowercase() == "true";
        }
        if let Ok(path) = std::env::var("HOSTLINK_TLS_CA") {
            self.ca_cert_path = Some(PathBuf::from(path));
        }
        if let Ok(insecure) = std::env::var("HOSTLINK_TLS_INSECURE") {
            self.insecure = insecure == "1" || insecure.to_lowercase() == "true";
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.client_cert_path.is_some() != self.client_key_path.is_some() {
            return Err(ConfigError::Validation(
                "tls.client_cert_path and tls.client_key_path must be set together".to_string(),
            ));
        }
        if let Some(ref path) = self.ca_cert_path {
            if !path.exists() {
                return Err(ConfigError::Validation(format!(
                    "CA certificate file not found: {:?}",
                    path
                )));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("failed to parse config file '{}': {1}", .0.display())]
    Parse(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
