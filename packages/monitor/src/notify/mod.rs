mod ntfy;

pub use ntfy::{NtfyNotifier, DEFAULT_NTFY_URL};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification endpoint returned status {0}")]
    Status(u16),
}

/// Best-effort alert delivery. Implementations must not retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, node: &str) -> Result<(), DeliveryError>;
}

/// Message sent when a node first reaches the synced state
pub fn synced_message(node: &str) -> String {
    format!("{} is now fully synced", node)
}

/// Used when no notification channel is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, node: &str) -> Result<(), DeliveryError> {
        info!("📢 [{}] {}", node, synced_message(node));
        Ok(())
    }
}
