use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Last accepted sample for a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub last_block: u64,
    pub last_sampled_at: DateTime<Utc>,
}

/// Everything remembered about one node between cycles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeState {
    history: HistoryEntry,
    /// Latches to true the first time the node is classified synced
    synced: bool,
}

/// Per-node sample history and synced flags.
///
/// Owned by the scheduler and lent to the tracker by `&mut`, so every
/// read-modify-write for a node happens under a single borrow.
#[derive(Debug, Default)]
pub struct HistoryStore {
    nodes: HashMap<String, NodeState>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, node: &str) -> Option<HistoryEntry> {
        self.nodes.get(node).map(|state| state.history)
    }

    pub fn is_synced(&self, node: &str) -> bool {
        self.nodes.get(node).map(|state| state.synced).unwrap_or(false)
    }

    /// Record a processed sample and fold `is_synced` into the node's flag.
    /// Returns true only when the flag flips from false to true.
    pub fn record(&mut self, node: &str, entry: HistoryEntry, is_synced: bool) -> bool {
        match self.nodes.get_mut(node) {
            Some(state) => {
                let just_synced = is_synced && !state.synced;
                state.history = entry;
                state.synced |= is_synced;
                just_synced
            }
            None => {
                self.nodes.insert(
                    node.to_string(),
                    NodeState {
                        history: entry,
                        synced: is_synced,
                    },
                );
                is_synced
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
