use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub monitor: MonitorConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub subscriptions: SubscriptionConfig,
    pub notifications: NotificationConfig,
}

/// RPC client configuration.
///
/// The tuning values are optional: when absent they come from the network profile
/// selected by the endpoint host (see [`RpcConfig::network_settings`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Node JSON-RPC endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// Total attempts per call, first one included
    pub retry_attempts: Option<u32>,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: Option<u64>,
    /// Pause between consecutive calls of one poll tick, in milliseconds
    pub rate_limit_delay_ms: Option<u64>,
    /// Add +/-10% jitter to the retry delay
    pub retry_jitter: bool,
}

/// Block monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite file path; in-memory database when absent
    pub path: Option<String>,
}

/// HTTP query API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Addresses subscribed at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub addresses: Vec<String>,
}

/// Notification sinks enabled at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub console: bool,
    /// POST every event to this URL when set
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Local,
    Public,
}

/// Resolved node client tuning
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub kind: NetworkKind,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub rate_limit_delay: Duration,
    pub retry_jitter: bool,
}

impl NetworkSettings {
    pub fn for_kind(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::Local => Self {
                kind,
                request_timeout: Duration::from_secs(5),
                retry_attempts: 1,
                retry_delay: Duration::from_secs(1),
                rate_limit_delay: Duration::from_millis(100),
                retry_jitter: false,
            },
            NetworkKind::Public => Self {
                kind,
                request_timeout: Duration::from_secs(10),
                retry_attempts: 3,
                retry_delay: Duration::from_secs(2),
                rate_limit_delay: Duration::from_secs(1),
                retry_jitter: false,
            },
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7545".to_string(),
            timeout_seconds: None,
            retry_attempts: None,
            retry_delay_ms: None,
            rate_limit_delay_ms: None,
            retry_jitter: false,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 1000 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            console: true,
            webhook_url: None,
        }
    }
}

impl RpcConfig {
    /// Loopback hosts get the local profile, everything else the public one
    pub fn network_kind(&self) -> NetworkKind {
        if is_local_endpoint(&self.endpoint) {
            NetworkKind::Local
        } else {
            NetworkKind::Public
        }
    }

    /// Profile defaults with any explicit overrides applied
    pub fn network_settings(&self) -> NetworkSettings {
        let mut settings = NetworkSettings::for_kind(self.network_kind());

        if let Some(seconds) = self.timeout_seconds {
            settings.request_timeout = Duration::from_secs(seconds);
        }
        if let Some(attempts) = self.retry_attempts {
            settings.retry_attempts = attempts;
        }
        if let Some(ms) = self.retry_delay_ms {
            settings.retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.rate_limit_delay_ms {
            settings.rate_limit_delay = Duration::from_millis(ms);
        }
        settings.retry_jitter = self.retry_jitter;

        settings
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ApiConfig {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Whether the endpoint points at a loopback host
pub fn is_local_endpoint(endpoint: &str) -> bool {
    let url = match reqwest::Url::parse(endpoint) {
        Ok(url) => url,
        Err(_) => return false,
    };

    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_with_path(&config_path)
    }

    /// Same as [`AppConfig::load`] with an explicit file path
    pub fn load_with_path(path: &str) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file; a missing file yields the defaults
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // RPC configuration
        if let Ok(endpoint) = env::var("RPC_ENDPOINT") {
            self.rpc.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.rpc.timeout_seconds = Some(parse_env("RPC_TIMEOUT_SECONDS", timeout)?);
        }
        if let Ok(attempts) = env::var("RPC_RETRY_ATTEMPTS") {
            self.rpc.retry_attempts = Some(parse_env("RPC_RETRY_ATTEMPTS", attempts)?);
        }

        // Monitor configuration
        if let Ok(interval) = env::var("MONITOR_POLL_INTERVAL_MS") {
            self.monitor.poll_interval_ms = parse_env("MONITOR_POLL_INTERVAL_MS", interval)?;
        }

        // Storage configuration
        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            self.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "sqlite" => StorageBackend::Sqlite,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "STORAGE_BACKEND".to_string(),
                        value: backend,
                    })
                }
            };
        }
        if let Ok(path) = env::var("DATABASE_PATH") {
            self.storage.path = Some(path);
        }

        // API configuration
        if let Ok(host) = env::var("SERVER_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = env::var("SERVER_PORT") {
            self.api.port = parse_env("SERVER_PORT", port)?;
        }
        if let Ok(enabled) = env::var("API_ENABLED") {
            self.api.enabled = parse_env("API_ENABLED", enabled)?;
        }

        // Logging configuration
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(addresses) = env::var("SUBSCRIBE_ADDRESSES") {
            self.subscriptions.addresses = addresses
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(url) = env::var("WEBHOOK_URL") {
            self.notifications.webhook_url = Some(url);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.rpc.endpoint.clone()));
        }

        if let Some(timeout) = self.rpc.timeout_seconds {
            if timeout == 0 || timeout > 300 {
                return Err(ConfigError::InvalidValue {
                    key: "rpc.timeout_seconds".to_string(),
                    value: timeout.to_string(),
                });
            }
        }

        if let Some(attempts) = self.rpc.retry_attempts {
            if attempts == 0 || attempts > 20 {
                return Err(ConfigError::InvalidValue {
                    key: "rpc.retry_attempts".to_string(),
                    value: attempts.to_string(),
                });
            }
        }

        if self.monitor.poll_interval_ms == 0 || self.monitor.poll_interval_ms > 300_000 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.poll_interval_ms".to_string(),
                value: self.monitor.poll_interval_ms.to_string(),
            });
        }

        if self.api.enabled && self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                value: self.api.port.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        if let Some(url) = &self.notifications.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }

        if let Some(path) = &self.storage.path {
            if path.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "storage.path".to_string(),
                    value: path.clone(),
                });
            }
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}
