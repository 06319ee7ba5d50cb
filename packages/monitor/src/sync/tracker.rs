use std::time::Duration;

use tracing::debug;

use crate::models::{Observation, RawSample, SyncReport};
use crate::sync::{HistoryEntry, HistoryStore, SyncError, SyncPolicy};

/// Default number of blocks a node may trail its highest block and still count as synced
pub const DEFAULT_LAG_TOLERANCE: u64 = 1;

/// Default block time used to express the remaining gap as wall-clock age
pub const DEFAULT_SECONDS_PER_BLOCK: f64 = 6.0;

/// Turns raw samples into sync reports and detects the synced transition.
///
/// The tracker itself is stateless; all per-node state lives in the
/// [`HistoryStore`] passed to [`SyncTracker::observe`].
#[derive(Clone, Debug)]
pub struct SyncTracker {
    policy: SyncPolicy,
    lag_tolerance: u64,
    seconds_per_block: f64,
}

impl Default for SyncTracker {
    fn default() -> Self {
        Self::new(SyncPolicy::default())
    }
}

impl SyncTracker {
    pub fn new(policy: SyncPolicy) -> Self {
        Self {
            policy,
            lag_tolerance: DEFAULT_LAG_TOLERANCE,
            seconds_per_block: DEFAULT_SECONDS_PER_BLOCK,
        }
    }

    /// Configure the synced lag tolerance in blocks
    pub fn with_lag_tolerance(mut self, lag_tolerance: u64) -> Self {
        self.lag_tolerance = lag_tolerance;
        self
    }

    /// Configure the chain's block time
    pub fn with_seconds_per_block(mut self, seconds_per_block: f64) -> Self {
        self.seconds_per_block = seconds_per_block;
        self
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// Process one sample for `node`.
    ///
    /// Invalid samples return an error and leave the store untouched. Valid
    /// samples always overwrite the node's history entry, exactly once.
    pub fn observe(
        &self,
        store: &mut HistoryStore,
        node: &str,
        sample: &RawSample,
    ) -> Result<Observation, SyncError> {
        let current_block = sample.current_block.ok_or(SyncError::MissingCurrentBlock)?;
        let highest_block = sample.highest_block.ok_or(SyncError::MissingHighestBlock)?;
        if highest_block == 0 {
            return Err(SyncError::ZeroHighestBlock);
        }

        let sync_rate = store
            .entry(node)
            .and_then(|previous| rate_since(&previous, current_block, sample));

        let blocks_remaining = highest_block.saturating_sub(current_block);
        let eta = match sync_rate {
            Some(rate) if rate > 0.0 => Some(secs_to_duration(blocks_remaining as f64 / rate)),
            _ => None,
        };
        let block_age = secs_to_duration(blocks_remaining as f64 * self.seconds_per_block);

        let is_synced = self.policy.classify(
            current_block,
            highest_block,
            sample.is_syncing,
            self.lag_tolerance,
        );

        let just_synced = store.record(
            node,
            HistoryEntry {
                last_block: current_block,
                last_sampled_at: sample.sampled_at,
            },
            is_synced,
        );

        debug!(
            "[{}] observed block {}/{} rate={:?} synced={} just_synced={}",
            node, current_block, highest_block, sync_rate, is_synced, just_synced
        );

        Ok(Observation {
            report: SyncReport {
                node: node.to_string(),
                current_block,
                highest_block,
                blocks_remaining,
                progress_percent: (current_block as f64 / highest_block as f64) * 100.0,
                sync_rate,
                eta,
                block_age,
                is_synced,
                is_syncing: sample.is_syncing,
                peer_count: sample.peer_count,
                sampled_at: sample.sampled_at,
            },
            just_synced,
        })
    }
}

/// Signed blocks per second since `previous`, or `None` when no time has passed
fn rate_since(previous: &HistoryEntry, current_block: u64, sample: &RawSample) -> Option<f64> {
    let elapsed_us = (sample.sampled_at - previous.last_sampled_at).num_microseconds()?;
    if elapsed_us <= 0 {
        return None;
    }

    let elapsed = elapsed_us as f64 / 1_000_000.0;
    Some((current_block as f64 - previous.last_block as f64) / elapsed)
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::format_eta;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + ChronoDuration::seconds(secs)
    }

    fn tracker() -> SyncTracker {
        SyncTracker::new(SyncPolicy::BlockLag)
    }

    #[test]
    fn test_first_sample_has_unknown_rate() {
        let mut store = HistoryStore::new();
        let obs = tracker()
            .observe(&mut store, "alice", &RawSample::blocks(100, 1000, t(0)))
            .unwrap();

        assert_eq!(obs.report.sync_rate, None);
        assert_eq!(obs.report.eta, None);
        assert_eq!(obs.report.eta_display(), "Calculating...");
        assert_eq!(obs.report.blocks_remaining, 900);
        assert!(!obs.report.is_synced);
        assert!(!obs.just_synced);
        assert_eq!(store.entry("alice").map(|e| e.last_block), Some(100));
    }

    #[test]
    fn test_rate_and_eta_between_two_samples() {
        let mut store = HistoryStore::new();
        let tracker = tracker();

        tracker
            .observe(&mut store, "alice", &RawSample::blocks(100, 1000, t(0)))
            .unwrap();
        let obs = tracker
            .observe(&mut store, "alice", &RawSample::blocks(190, 1000, t(30)))
            .unwrap();

        let rate = obs.report.sync_rate.unwrap();
        assert!((rate - 3.0).abs() < 1e-9);
        assert_eq!(obs.report.blocks_remaining, 810);
        let eta = obs.report.eta.unwrap();
        assert!((eta.as_secs_f64() - 270.0).abs() < 1e-6);
        assert_eq!(format_eta(eta), "4m");
    }

    #[test]
    fn test_rate_uses_fractional_elapsed_time() {
        let mut store = HistoryStore::new();
        let tracker = tracker();
        let start = t(0);

        tracker
            .observe(&mut store, "alice", &RawSample::blocks(10, 1000, start))
            .unwrap();
        let later = start + ChronoDuration::milliseconds(2_500);
        let obs = tracker
            .observe(&mut store, "alice", &RawSample::blocks(20, 1000, later))
            .unwrap();

        assert!((obs.report.sync_rate.unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_elapsed_time_gives_unknown_rate() {
        let mut store = HistoryStore::new();
        let tracker = tracker();

        tracker
            .observe(&mut store, "alice", &RawSample::blocks(10, 1000, t(5)))
            .unwrap();
        let obs = tracker
            .observe(&mut store, "alice", &RawSample::blocks(20, 1000, t(5)))
            .unwrap();

        assert_eq!(obs.report.sync_rate, None);
        assert_eq!(obs.report.eta, None);
        assert_eq!(store.entry("alice").map(|e| e.last_block), Some(20));
    }

    #[test]
    fn test_stalled_node_has_zero_rate_and_no_eta() {
        let mut store = HistoryStore::new();
        let tracker = tracker();

        tracker
            .observe(&mut store, "alice", &RawSample::blocks(500, 1000, t(0)))
            .unwrap();
        let obs = tracker
            .observe(&mut store, "alice", &RawSample::blocks(500, 1000, t(30)))
            .unwrap();

        assert_eq!(obs.report.sync_rate, Some(0.0));
        assert_eq!(obs.report.eta, None);
    }

    #[test]
    fn test_reorg_gives_negative_rate() {
        let mut store = HistoryStore::new();
        let tracker = tracker();

        tracker
            .observe(&mut store, "alice", &RawSample::blocks(500, 1000, t(0)))
            .unwrap();
        let obs = tracker
            .observe(&mut store, "alice", &RawSample::blocks(480, 1000, t(10)))
            .unwrap();

        assert!((obs.report.sync_rate.unwrap() + 2.0).abs() < 1e-9);
        assert_eq!(obs.report.eta, None);
        assert_eq!(
            store.entry("alice"),
            Some(HistoryEntry {
                last_block: 480,
                last_sampled_at: t(10)
            })
        );
    }

    #[test]
    fn test_invalid_samples_leave_store_untouched() {
        let mut store = HistoryStore::new();
        let tracker = tracker();

        tracker
            .observe(&mut store, "alice", &RawSample::blocks(100, 1000, t(0)))
            .unwrap();

        let zero_highest = RawSample::blocks(100, 0, t(10));
        assert_eq!(
            tracker.observe(&mut store, "alice", &zero_highest),
            Err(SyncError::ZeroHighestBlock)
        );

        let mut missing_current = RawSample::blocks(0, 1000, t(20));
        missing_current.current_block = None;
        assert_eq!(
            tracker.observe(&mut store, "alice", &missing_current),
            Err(SyncError::MissingCurrentBlock)
        );

        let mut missing_highest = RawSample::blocks(150, 0, t(30));
        missing_highest.highest_block = None;
        assert_eq!(
            tracker.observe(&mut store, "alice", &missing_highest),
            Err(SyncError::MissingHighestBlock)
        );

        assert_eq!(
            store.entry("alice"),
            Some(HistoryEntry {
                last_block: 100,
                last_sampled_at: t(0)
            })
        );
        assert!(tracker
            .observe(&mut store, "bob", &RawSample::blocks(1, 0, t(0)))
            .is_err());
        assert!(store.entry("bob").is_none());
    }

    #[test]
    fn test_caught_up_on_first_sample() {
        let mut store = HistoryStore::new();
        let obs = tracker()
            .observe(&mut store, "alice", &RawSample::blocks(1000, 1000, t(0)))
            .unwrap();

        assert_eq!(obs.report.sync_rate, None);
        assert!(obs.report.is_synced);
        assert!(obs.just_synced);
        assert_eq!(obs.report.blocks_remaining, 0);
        assert!((obs.report.progress_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_just_synced_fires_once() {
        let mut store = HistoryStore::new();
        let tracker = tracker();
        let heights = [(990, 1000), (999, 1000), (1005, 1005), (900, 2000), (2000, 2000)];

        let fired: Vec<bool> = heights
            .iter()
            .enumerate()
            .map(|(i, (current, highest))| {
                tracker
                    .observe(
                        &mut store,
                        "alice",
                        &RawSample::blocks(*current, *highest, t(i as i64 * 30)),
                    )
                    .unwrap()
                    .just_synced
            })
            .collect();

        assert_eq!(fired, vec![false, true, false, false, false]);
        assert!(store.is_synced("alice"));
    }

    #[test]
    fn test_synced_flag_survives_desync() {
        let mut store = HistoryStore::new();
        let tracker = tracker();

        tracker
            .observe(&mut store, "alice", &RawSample::blocks(1000, 1000, t(0)))
            .unwrap();
        let obs = tracker
            .observe(&mut store, "alice", &RawSample::blocks(1000, 1500, t(30)))
            .unwrap();

        assert!(!obs.report.is_synced);
        assert!(!obs.just_synced);
        assert!(store.is_synced("alice"));
    }

    #[test]
    fn test_health_aware_far_behind_is_not_synced() {
        let mut store = HistoryStore::new();
        let tracker = SyncTracker::new(SyncPolicy::HealthAware).with_lag_tolerance(10);
        let sample = RawSample::blocks(900, 1000, t(0)).with_health(false, 12);

        let obs = tracker.observe(&mut store, "alice", &sample).unwrap();
        assert!(!obs.report.is_synced);
        assert!(!obs.just_synced);
        assert_eq!(obs.report.peer_count, Some(12));
    }

    #[test]
    fn test_health_aware_transition() {
        let mut store = HistoryStore::new();
        let tracker = SyncTracker::new(SyncPolicy::HealthAware).with_lag_tolerance(10);

        let syncing = RawSample::blocks(995, 1000, t(0)).with_health(true, 3);
        assert!(!tracker.observe(&mut store, "alice", &syncing).unwrap().just_synced);

        let done = RawSample::blocks(1000, 1000, t(30)).with_health(false, 3);
        assert!(tracker.observe(&mut store, "alice", &done).unwrap().just_synced);
    }

    #[test]
    fn test_block_age_uses_seconds_per_block() {
        let mut store = HistoryStore::new();
        let tracker = tracker().with_seconds_per_block(12.0);

        let obs = tracker
            .observe(&mut store, "alice", &RawSample::blocks(700, 1000, t(0)))
            .unwrap();
        assert_eq!(obs.report.block_age, Duration::from_secs(3_600));
        assert_eq!(obs.report.block_age_display(), "1h");
    }

    #[test]
    fn test_eta_decreases_at_constant_rate() {
        let mut store = HistoryStore::new();
        let tracker = tracker();

        let etas: Vec<Duration> = (0..5)
            .map(|i| {
                tracker
                    .observe(&mut store, "alice", &RawSample::blocks(100 + i * 60, 10_000, t(i as i64 * 30)))
                    .unwrap()
                    .report
                    .eta
            })
            .skip(1)
            .map(|eta| eta.unwrap())
            .collect();

        assert!(etas.windows(2).all(|pair| pair[1] < pair[0]));
    }
}
