use thiserror::Error;

/// Reasons a raw sample is discarded before it reaches the history store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Sample is missing the current block")]
    MissingCurrentBlock,

    #[error("Sample is missing the highest block")]
    MissingHighestBlock,

    #[error("Highest block is zero")]
    ZeroHighestBlock,
}
