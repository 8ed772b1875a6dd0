use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::Block;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("block {0} not found")]
    BlockNotFound(u64),
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<Value>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// JSON-RPC 2.0 client for the node's HTTP endpoint. Block bodies are
/// fetched here; header notifications arrive over the WebSocket feed.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
}

impl RpcClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let rpc_response: JsonRpcResponse = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Rpc(format!(
                "Code: {}, Message: {}",
                error.code, error.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::Rpc("No result in response".to_string()))
    }

    /// Fetch a block with full transaction objects. A null result means the
    /// node has not seen the block despite having announced its header.
    pub async fn get_block_by_number(&self, height: u64) -> Result<Block, RpcError> {
        let params = vec![
            Value::String(format!("0x{height:x}")),
            Value::Bool(true),
        ];

        let result = self.make_request("eth_getBlockByNumber", params).await?;

        if result.is_null() {
            return Err(RpcError::BlockNotFound(height));
        }

        let block: Block = serde_json::from_value(result)?;
        debug!(
            "fetched block {} with {} transactions",
            block.height(),
            block.transactions.len()
        );
        Ok(block)
    }
}
