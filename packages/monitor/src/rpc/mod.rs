mod client;
mod error;
mod types;

pub use client::{HttpRpcClient, DEFAULT_HEALTH_METHOD, DEFAULT_SYNC_METHOD};
pub use error::TransportError;

use async_trait::async_trait;

use crate::models::{HealthFields, NodeConfig, SyncFields};

/// Queries a node for its sync progress and health
#[async_trait]
pub trait NodeRpc: Send + Sync {
    async fn fetch_sync(&self, node: &NodeConfig) -> Result<SyncFields, TransportError>;

    async fn fetch_health(&self, node: &NodeConfig) -> Result<HealthFields, TransportError>;
}
