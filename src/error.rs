use thiserror::Error;

use crate::blockchain::block_monitor::MonitorError;
use crate::blockchain::rpc_client::RpcError;
use crate::blockchain::subscription::SubscriptionError;
use crate::notification::NotificationError;

/// Top-level error type; anything reaching main through this enum ends the
/// process. Recoverable conditions are handled inside the monitoring loop
/// and never surface here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Subscription(#[from] SubscriptionError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Missing required configuration value: {0}")]
    MissingValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "chain.request_timeout_seconds".to_string(),
            value: "0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for chain.request_timeout_seconds: 0"
        );
        assert_eq!(
            ConfigError::MissingValue("monitor.address".to_string()).to_string(),
            "Missing required configuration value: monitor.address"
        );
    }

    #[test]
    fn test_app_error_wraps_module_errors() {
        let err: AppError = ConfigError::InvalidUrl("ftp://nope".to_string()).into();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: Invalid URL: ftp://nope");
    }
}
