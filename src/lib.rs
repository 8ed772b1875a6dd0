pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod notification;

pub use blockchain::{BlockMonitor, ChainSource, NodeClient, SenderResolver, TransactionFilter};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use notification::{Notifier, PushoverNotifier};
