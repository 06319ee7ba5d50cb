use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::utils::time::{format_duration, format_eta, format_rate};

/// Shown wherever the rate or ETA cannot be derived yet
pub const INDETERMINATE: &str = "Calculating...";

/// Derived per-node metrics for one poll cycle
#[derive(Clone, Debug, PartialEq)]
pub struct SyncReport {
    pub node: String,
    pub current_block: u64,
    pub highest_block: u64,
    pub blocks_remaining: u64,
    pub progress_percent: f64,
    /// Blocks per second since the previous sample; `None` until two samples exist
    pub sync_rate: Option<f64>,
    /// Only set when the rate is known and positive
    pub eta: Option<Duration>,
    pub block_age: Duration,
    pub is_synced: bool,
    pub is_syncing: Option<bool>,
    pub peer_count: Option<u32>,
    pub sampled_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn rate_display(&self) -> String {
        self.sync_rate
            .map(format_rate)
            .unwrap_or_else(|| INDETERMINATE.to_string())
    }

    pub fn eta_display(&self) -> String {
        self.eta
            .map(format_eta)
            .unwrap_or_else(|| INDETERMINATE.to_string())
    }

    pub fn progress_display(&self) -> String {
        format!("{:.2}%", self.progress_percent)
    }

    pub fn block_age_display(&self) -> String {
        format_duration(self.block_age)
    }

    pub fn peers_display(&self) -> String {
        self.peer_count
            .map(|peers| peers.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Tracker output for one node and one cycle
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub report: SyncReport,
    /// Set only in the cycle the node is first classified synced
    pub just_synced: bool,
}
