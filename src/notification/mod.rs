pub mod pushover;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::MatchEvent;

pub use pushover::PushoverNotifier;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read response body")]
    ResponseRead,
    #[error("failed to send push notification : {body}")]
    Delivery { status: u16, body: String },
}

/// Delivery seam for matched transactions. The loop only knows this trait;
/// tests substitute recording fakes for the live Pushover service.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &MatchEvent) -> Result<(), NotificationError>;
}
