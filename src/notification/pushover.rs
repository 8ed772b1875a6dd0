use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::NotificationConfig;
use crate::models::MatchEvent;
use crate::notification::{NotificationError, Notifier};

#[derive(Debug, Serialize)]
struct PushoverRequest {
    token: String,
    user: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    title: String,
}

/// Pushover message dispatcher. One POST per event, no retries; a failed
/// delivery is reported to the caller, which treats it as fatal.
pub struct PushoverNotifier {
    client: Client,
    endpoint: String,
    api_token: String,
    user_key: String,
}

impl PushoverNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            user_key: config.user_key.clone(),
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, event: &MatchEvent) -> Result<(), NotificationError> {
        let request = PushoverRequest {
            token: self.api_token.clone(),
            user: self.user_key.clone(),
            message: event.message(),
            url: Some(event.explorer_url()),
            title: event.title(),
        };

        debug!("dispatching notification for tx {}", event.tx_hash);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .map_err(|_| NotificationError::ResponseRead)?;
            return Err(NotificationError::Delivery {
                status: status.as_u16(),
                body,
            });
        }

        info!("notification delivered for tx {}", event.tx_hash);
        Ok(())
    }
}
