use std::time::Duration;

use async_trait::async_trait;
use log::info;

use crate::blockchain::rpc_client::{RpcClient, RpcError};
use crate::blockchain::subscription::{HeaderSubscription, SubscriptionError};
use crate::config::ChainConfig;
use crate::models::{Block, BlockHeader};

/// What the monitoring loop needs from a chain: a stream of new headers and
/// the ability to fetch the block behind one. Implemented by the live node
/// client and by scripted sources in tests.
#[async_trait]
pub trait ChainSource: Send {
    /// Next header from the feed, None once the feed is closed.
    async fn next_header(&mut self) -> Result<Option<BlockHeader>, SubscriptionError>;

    /// Full block with transaction bodies at the given height.
    async fn block_by_number(&self, height: u64) -> Result<Block, RpcError>;
}

/// Live chain access through a node provider: WebSocket feed for headers,
/// HTTP JSON-RPC for block bodies.
pub struct NodeClient {
    subscription: HeaderSubscription,
    rpc: RpcClient,
}

impl NodeClient {
    pub async fn connect(config: &ChainConfig) -> crate::error::Result<Self> {
        let subscription = HeaderSubscription::connect(&config.ws_url()).await?;
        let rpc = RpcClient::new(
            config.http_url(),
            Duration::from_secs(config.request_timeout_seconds),
        )?;
        info!("connected to chain endpoints");
        Ok(Self { subscription, rpc })
    }
}

#[async_trait]
impl ChainSource for NodeClient {
    async fn next_header(&mut self) -> Result<Option<BlockHeader>, SubscriptionError> {
        self.subscription.next_header().await
    }

    async fn block_by_number(&self, height: u64) -> Result<Block, RpcError> {
        self.rpc.get_block_by_number(height).await
    }
}
