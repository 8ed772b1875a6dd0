use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::models::BlockHeader;

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("WebSocket transport failed: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("subscription rejected: {0}")]
    Rejected(String),
    #[error("connection closed during subscription handshake")]
    ClosedDuringHandshake,
}

#[derive(Debug, Deserialize)]
struct SubscribeReply {
    result: Option<String>,
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionNotification {
    params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    subscription: String,
    result: BlockHeader,
}

/// Push feed of new block headers over a WebSocket eth_subscribe session.
/// Connecting performs the newHeads handshake; afterwards headers are read
/// one at a time with `next_header`.
pub struct HeaderSubscription {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    subscription_id: String,
}

impl HeaderSubscription {
    pub async fn connect(endpoint: &str) -> Result<Self, SubscriptionError> {
        let (mut stream, _) = connect_async(endpoint).await?;

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["newHeads"]
        });
        stream.send(Message::Text(request.to_string())).await?;

        let subscription_id = loop {
            let message = stream
                .next()
                .await
                .ok_or(SubscriptionError::ClosedDuringHandshake)??;
            match message {
                Message::Text(text) => {
                    let reply: SubscribeReply = serde_json::from_str(&text)?;
                    if let Some(error) = reply.error {
                        return Err(SubscriptionError::Rejected(format!(
                            "Code: {}, Message: {}",
                            error.code, error.message
                        )));
                    }
                    break reply.result.ok_or_else(|| {
                        SubscriptionError::Rejected("no subscription id in reply".to_string())
                    })?;
                }
                Message::Ping(payload) => stream.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Err(SubscriptionError::ClosedDuringHandshake),
                _ => continue,
            }
        };

        info!("subscribed to new block headers (id {})", subscription_id);
        Ok(Self {
            stream,
            subscription_id,
        })
    }

    /// Next header from the feed. Returns None once the server closes the
    /// stream. Frames that are not header notifications for this
    /// subscription are answered (pings) or skipped.
    pub async fn next_header(&mut self) -> Result<Option<BlockHeader>, SubscriptionError> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Ok(None);
            };
            match message? {
                Message::Text(text) => {
                    let notification: SubscriptionNotification = serde_json::from_str(&text)?;
                    match notification.params {
                        Some(params) if params.subscription == self.subscription_id => {
                            debug!("header notification at height {}", params.result.height());
                            return Ok(Some(params.result));
                        }
                        _ => continue,
                    }
                }
                Message::Ping(payload) => self.stream.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
    }
}
