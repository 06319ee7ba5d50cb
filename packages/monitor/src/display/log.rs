use async_trait::async_trait;
use tracing::info;

use super::PresentationSink;
use crate::models::SyncReport;

/// Emits one human-readable log line per node per cycle
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

/// Render the fields of a report as a single line
pub fn format_line(report: &SyncReport) -> String {
    format!(
        "Current: {} | Target: {} | Synced: {} | ETA: {} | Progress: {} | Blocks Left: {} | Latest Synced Block Age: {} | Sync Rate: {} | Peers: {}",
        report.current_block,
        report.highest_block,
        report.is_synced,
        report.eta_display(),
        report.progress_display(),
        report.blocks_remaining,
        report.block_age_display(),
        report.rate_display(),
        report.peers_display(),
    )
}

#[async_trait]
impl PresentationSink for LogSink {
    async fn render(&mut self, reports: &[SyncReport]) {
        for report in reports {
            info!("🔄 [{}] {}", report.node, format_line(report));
        }
    }
}
