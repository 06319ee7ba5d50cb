mod log;
mod table;

pub use log::LogSink;
pub use table::{SharedSnapshot, Snapshot, TableSink, TableView};

use async_trait::async_trait;
use clap::ValueEnum;

use crate::models::SyncReport;

/// Where per-cycle reports are shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DisplayMode {
    /// One log line per node per cycle
    #[default]
    Log,
    /// Live terminal table
    Table,
}

/// Consumes the reports produced by one poll cycle
#[async_trait]
pub trait PresentationSink: Send + Sync {
    async fn render(&mut self, reports: &[SyncReport]);
}
