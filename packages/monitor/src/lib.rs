//! Polls Substrate-style nodes for sync progress, derives rate, ETA and
//! block age per node, and notifies once when each node becomes synced.

pub mod config;
pub mod display;
pub mod models;
pub mod notify;
pub mod rpc;
pub mod sync;
pub mod utils;

#[cfg(test)]
mod test_utils;
