use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{JsonRpcRequest, JsonRpcResponse};
use super::{NodeRpc, TransportError};
use crate::models::{HealthFields, NodeConfig, SyncFields};

pub const DEFAULT_SYNC_METHOD: &str = "system_syncState";
pub const DEFAULT_HEALTH_METHOD: &str = "system_health";

/// JSON-RPC over HTTP POST with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    client: Client,
    sync_method: String,
    health_method: String,
}

impl HttpRpcClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            sync_method: DEFAULT_SYNC_METHOD.to_string(),
            health_method: DEFAULT_HEALTH_METHOD.to_string(),
        })
    }

    /// Override the RPC method names used for the two queries
    pub fn with_methods(mut self, sync_method: impl Into<String>, health_method: impl Into<String>) -> Self {
        self.sync_method = sync_method.into();
        self.health_method = health_method.into();
        self
    }

    async fn call<T: DeserializeOwned>(&self, endpoint: &str, method: &str) -> Result<T, TransportError> {
        debug!("Calling {} on {}", method, endpoint);

        let response = self
            .client
            .post(endpoint)
            .json(&JsonRpcRequest::new(method))
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        JsonRpcResponse::<T>::from_slice(&body)?.into_result()
    }
}

#[async_trait]
impl NodeRpc for HttpRpcClient {
    async fn fetch_sync(&self, node: &NodeConfig) -> Result<SyncFields, TransportError> {
        self.call(&node.endpoint, &self.sync_method).await
    }

    async fn fetch_health(&self, node: &NodeConfig) -> Result<HealthFields, TransportError> {
        self.call(&node.endpoint, &self.health_method).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{never_respond, respond_once};
    use std::time::Instant;

    fn node(endpoint: String) -> NodeConfig {
        NodeConfig::new("alice", endpoint)
    }

    #[tokio::test]
    async fn test_fetch_sync_parses_result() {
        let endpoint = respond_once(
            "200 OK",
            r#"{"jsonrpc":"2.0","id":1,"result":{"startingBlock":0,"currentBlock":90,"highestBlock":100}}"#,
        )
        .await;
        let client = HttpRpcClient::new(Duration::from_secs(2)).unwrap();

        let sync = client.fetch_sync(&node(endpoint)).await.unwrap();

        assert_eq!(sync.current_block, Some(90));
        assert_eq!(sync.highest_block, Some(100));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let endpoint = respond_once("500 Internal Server Error", "").await;
        let client = HttpRpcClient::new(Duration::from_secs(2)).unwrap();

        let err = client.fetch_sync(&node(endpoint)).await.unwrap_err();

        assert!(matches!(err, TransportError::Status(500)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unresponsive_node_times_out() {
        let endpoint = never_respond().await;
        let client = HttpRpcClient::new(Duration::from_millis(300)).unwrap();

        let started = Instant::now();
        let err = client.fetch_health(&node(endpoint)).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let endpoint = respond_once("200 OK", "not json!").await;
        let client = HttpRpcClient::new(Duration::from_secs(2)).unwrap();

        let err = client.fetch_sync(&node(endpoint)).await.unwrap_err();

        assert!(matches!(err, TransportError::Malformed(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let endpoint = respond_once(
            "200 OK",
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .await;
        let client = HttpRpcClient::new(Duration::from_secs(2)).unwrap();

        let err = client.fetch_sync(&node(endpoint)).await.unwrap_err();

        assert!(matches!(err, TransportError::Rpc { code: -32601, .. }), "got {:?}", err);
    }
}
