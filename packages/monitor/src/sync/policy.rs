use std::fmt;

use clap::ValueEnum;

/// How a node is judged synced from one sample
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SyncPolicy {
    /// Synced when the current block is within the lag tolerance of the highest block
    #[default]
    BlockLag,
    /// Block-lag check plus the health query reporting the node is not syncing
    HealthAware,
}

impl SyncPolicy {
    /// True if this policy cannot decide without the health query
    pub fn needs_health(&self) -> bool {
        matches!(self, SyncPolicy::HealthAware)
    }

    pub fn classify(
        &self,
        current_block: u64,
        highest_block: u64,
        is_syncing: Option<bool>,
        lag_tolerance: u64,
    ) -> bool {
        let within_lag = current_block >= highest_block.saturating_sub(lag_tolerance);

        match self {
            SyncPolicy::BlockLag => within_lag,
            // Unknown health never counts as "not syncing"
            SyncPolicy::HealthAware => within_lag && is_syncing == Some(false),
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPolicy::BlockLag => write!(f, "block-lag"),
            SyncPolicy::HealthAware => write!(f, "health-aware"),
        }
    }
}
