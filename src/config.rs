use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::Deserialize;

use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub monitor: MonitorConfig,
    pub notification: NotificationConfig,
    pub logging: LoggingConfig,
}

/// Chain endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// WebSocket endpoint base, the provider token is appended as a path segment
    pub ws_endpoint: String,
    /// HTTP JSON-RPC endpoint base
    pub http_endpoint: String,
    /// Provider API token
    pub api_token: String,
    /// Request timeout in seconds for block fetches
    pub request_timeout_seconds: u64,
}

/// Watch target configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Address whose outgoing transactions are reported
    pub address: String,
}

/// Pushover delivery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Pushover application token
    pub api_token: String,
    /// Pushover user key
    pub user_key: String,
    /// Pushover message endpoint
    pub endpoint: String,
    /// Request timeout in seconds for notification dispatch
    pub request_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            ws_endpoint: "wss://mainnet.infura.io/ws/v3".to_string(),
            http_endpoint: "https://mainnet.infura.io/v3".to_string(),
            api_token: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            user_key: String::new(),
            endpoint: "https://api.pushover.net/1/messages.json".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ChainConfig {
    pub fn ws_url(&self) -> String {
        format!("{}/{}", self.ws_endpoint.trim_end_matches('/'), self.api_token)
    }

    pub fn http_url(&self) -> String {
        format!(
            "{}/{}",
            self.http_endpoint.trim_end_matches('/'),
            self.api_token
        )
    }
}

impl MonitorConfig {
    /// The watched address in binary form. Callers run after `validate`, so
    /// failures here only occur when validation was skipped.
    pub fn watched_address(&self) -> Result<Address, ConfigError> {
        Address::from_str(&self.address).map_err(|_| ConfigError::InvalidValue {
            key: "monitor.address".to_string(),
            value: self.address.clone(),
        })
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values; CLI flags are
    /// applied on top by the caller before `validate`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(token) = env::var("INFURA_API_TOKEN") {
            self.chain.api_token = token;
        }
        if let Ok(endpoint) = env::var("INFURA_WS_URL") {
            self.chain.ws_endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("INFURA_HTTP_URL") {
            self.chain.http_endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.chain.request_timeout_seconds =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "RPC_TIMEOUT_SECONDS".to_string(),
                    value: timeout,
                })?;
        }
        if let Ok(address) = env::var("MONITOR_ADDRESS") {
            self.monitor.address = address;
        }
        if let Ok(token) = env::var("PUSHOVER_API_TOKEN") {
            self.notification.api_token = token;
        }
        if let Ok(key) = env::var("PUSHOVER_USER_KEY") {
            self.notification.user_key = key;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Apply command line overrides, the highest-precedence layer
    pub fn apply_cli_overrides(
        &mut self,
        infura_token: Option<String>,
        address: Option<String>,
        api_key: Option<String>,
        user_key: Option<String>,
    ) {
        if let Some(token) = infura_token {
            self.chain.api_token = token;
        }
        if let Some(address) = address {
            self.monitor.address = address;
        }
        if let Some(key) = api_key {
            self.notification.api_token = key;
        }
        if let Some(key) = user_key {
            self.notification.user_key = key;
        }
    }

    /// Validate configuration values before any connection is attempted
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.chain.ws_endpoint.starts_with("ws://")
            && !self.chain.ws_endpoint.starts_with("wss://")
        {
            return Err(ConfigError::InvalidUrl(self.chain.ws_endpoint.clone()));
        }

        if !self.chain.http_endpoint.starts_with("http://")
            && !self.chain.http_endpoint.starts_with("https://")
        {
            return Err(ConfigError::InvalidUrl(self.chain.http_endpoint.clone()));
        }

        if self.chain.api_token.trim().is_empty() {
            return Err(ConfigError::MissingValue("chain.api_token".to_string()));
        }

        if self.chain.request_timeout_seconds == 0 || self.chain.request_timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "chain.request_timeout_seconds".to_string(),
                value: self.chain.request_timeout_seconds.to_string(),
            });
        }

        if self.monitor.address.trim().is_empty() {
            return Err(ConfigError::MissingValue("monitor.address".to_string()));
        }
        self.monitor.watched_address()?;

        if self.notification.api_token.trim().is_empty() {
            return Err(ConfigError::MissingValue(
                "notification.api_token".to_string(),
            ));
        }

        if self.notification.user_key.trim().is_empty() {
            return Err(ConfigError::MissingValue(
                "notification.user_key".to_string(),
            ));
        }

        if !self.notification.endpoint.starts_with("http://")
            && !self.notification.endpoint.starts_with("https://")
        {
            return Err(ConfigError::InvalidUrl(self.notification.endpoint.clone()));
        }

        if self.notification.request_timeout_seconds == 0
            || self.notification.request_timeout_seconds > 300
        {
            return Err(ConfigError::InvalidValue {
                key: "notification.request_timeout_seconds".to_string(),
                value: self.notification.request_timeout_seconds.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        Ok(())
    }
}
