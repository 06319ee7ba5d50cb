use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::{synced_message, DeliveryError, Notifier};

pub const DEFAULT_NTFY_URL: &str = "https://ntfy.sh";

/// Publishes a plain-text message to an ntfy topic
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    client: Client,
    topic_url: String,
}

impl NtfyNotifier {
    pub fn new(server_url: &str, topic: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            topic_url: topic_url(server_url, topic),
        })
    }
}

fn topic_url(server_url: &str, topic: &str) -> String {
    format!("{}/{}", server_url.trim_end_matches('/'), topic.trim_start_matches('/'))
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, node: &str) -> Result<(), DeliveryError> {
        let message = synced_message(node);

        let response = self
            .client
            .post(&self.topic_url)
            .body(message.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        info!("📢 [{}] Sent notification: {}", node, message);
        Ok(())
    }
}
