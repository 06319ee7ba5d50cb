use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::display::PresentationSink;
use crate::models::{NodeConfig, RawSample, SyncReport};
use crate::notify::Notifier;
use crate::rpc::NodeRpc;
use crate::sync::{HistoryStore, SyncTracker};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Polls every configured node on a fixed interval and routes the results
pub struct Scheduler {
    nodes: Vec<NodeConfig>,
    rpc: Arc<dyn NodeRpc>,
    notifier: Arc<dyn Notifier>,
    sink: Box<dyn PresentationSink>,
    tracker: SyncTracker,
    history: HistoryStore,
    poll_interval: Duration,
    fetch_health: bool,
    notifications: TaskTracker,
}

impl Scheduler {
    pub fn new(
        nodes: Vec<NodeConfig>,
        rpc: Arc<dyn NodeRpc>,
        notifier: Arc<dyn Notifier>,
        sink: Box<dyn PresentationSink>,
        tracker: SyncTracker,
    ) -> Self {
        let fetch_health = tracker.policy().needs_health();
        Self {
            nodes,
            rpc,
            notifier,
            sink,
            tracker,
            history: HistoryStore::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_health,
            notifications: TaskTracker::new(),
        }
    }

    /// Configure the delay between the end of one cycle and the start of the next
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Also query node health when the policy does not require it
    pub fn with_health(mut self, fetch_health: bool) -> Self {
        self.fetch_health |= fetch_health;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Poll until `shutdown` is cancelled.
    ///
    /// Cancellation is only observed between cycles, so a cycle in flight
    /// always finishes; pending notifications are awaited before returning.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("🚀 Starting sync monitor for {} nodes", self.nodes.len());

        loop {
            self.poll_cycle().await;

            debug!("⏳ Sleeping for {} seconds...", self.poll_interval.as_secs());
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!("Shutdown requested, waiting for pending notifications");
        self.flush_notifications().await;
        info!("Sync monitor stopped");
    }

    /// Run one cycle over every node and return the reports that were produced
    pub async fn poll_cycle(&mut self) -> Vec<SyncReport> {
        let samples = join_all(self.nodes.iter().map(|node| self.fetch_sample(node))).await;

        let mut reports = Vec::with_capacity(self.nodes.len());
        for (node, sample) in self.nodes.iter().zip(samples) {
            let Some(sample) = sample else {
                continue;
            };

            let observation = match self.tracker.observe(&mut self.history, &node.name, &sample) {
                Ok(observation) => observation,
                Err(e) => {
                    warn!("[{}] Skipping sample: {}", node.name, e);
                    continue;
                }
            };

            if let Some(rate) = observation.report.sync_rate.filter(|rate| *rate < 0.0) {
                warn!(
                    "[{}] Block height went backwards ({:.2} blocks/sec), possible reorg or restart",
                    node.name, rate
                );
            }

            if observation.just_synced {
                info!("✅ [{}] Node is now synced", node.name);
                self.spawn_notification(&node.name);
            }

            reports.push(observation.report);
        }

        self.sink.render(&reports).await;
        reports
    }

    /// Wait for every notification spawned so far
    pub async fn flush_notifications(&self) {
        self.notifications.close();
        self.notifications.wait().await;
        self.notifications.reopen();
    }

    fn spawn_notification(&self, node: &str) {
        let notifier = Arc::clone(&self.notifier);
        let node = node.to_string();

        self.notifications.spawn(async move {
            if let Err(e) = notifier.notify(&node).await {
                error!("⚠️ [{}] Failed to send notification: {}", node, e);
            }
        });
    }

    /// Fetch one raw sample; `None` if the sync query failed
    async fn fetch_sample(&self, node: &NodeConfig) -> Option<RawSample> {
        let sync = match self.rpc.fetch_sync(node).await {
            Ok(sync) => sync,
            Err(e) => {
                error!("🚨 [{}] Failed to fetch sync status: {}", node.name, e);
                return None;
            }
        };
        // Timestamp the heights, not the health reply
        let sampled_at = Utc::now();

        let health = if self.fetch_health {
            match self.rpc.fetch_health(node).await {
                Ok(health) => Some(health),
                Err(e) => {
                    warn!("[{}] Failed to fetch health: {}", node.name, e);
                    None
                }
            }
        } else {
            None
        };

        Some(RawSample::new(sync, health, sampled_at))
    }
}
