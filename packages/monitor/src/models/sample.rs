use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Block heights reported by the sync-state query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFields {
    #[serde(default)]
    pub current_block: Option<u64>,
    #[serde(default)]
    pub highest_block: Option<u64>,
}

/// Fields reported by the health query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFields {
    #[serde(default)]
    pub is_syncing: Option<bool>,
    #[serde(default)]
    pub peers: Option<u32>,
}

/// One poll result for one node. Any field may be missing when the
/// transport call partially failed.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    pub current_block: Option<u64>,
    pub highest_block: Option<u64>,
    pub is_syncing: Option<bool>,
    pub peer_count: Option<u32>,
    pub sampled_at: DateTime<Utc>,
}

impl RawSample {
    pub fn new(sync: SyncFields, health: Option<HealthFields>, sampled_at: DateTime<Utc>) -> Self {
        let health = health.unwrap_or_default();
        Self {
            current_block: sync.current_block,
            highest_block: sync.highest_block,
            is_syncing: health.is_syncing,
            peer_count: health.peers,
            sampled_at,
        }
    }

    /// Sample with only block heights set
    pub fn blocks(current_block: u64, highest_block: u64, sampled_at: DateTime<Utc>) -> Self {
        Self {
            current_block: Some(current_block),
            highest_block: Some(highest_block),
            is_syncing: None,
            peer_count: None,
            sampled_at,
        }
    }

    pub fn with_health(mut self, is_syncing: bool, peer_count: u32) -> Self {
        self.is_syncing = Some(is_syncing);
        self.peer_count = Some(peer_count);
        self
    }
}
