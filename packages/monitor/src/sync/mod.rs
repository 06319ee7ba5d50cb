mod error;
mod history;
mod policy;
mod scheduler;
mod tracker;

pub use error::SyncError;
pub use history::{HistoryEntry, HistoryStore};
pub use policy::SyncPolicy;
pub use scheduler::{Scheduler, DEFAULT_POLL_INTERVAL};
pub use tracker::{SyncTracker, DEFAULT_LAG_TOLERANCE, DEFAULT_SECONDS_PER_BLOCK};
