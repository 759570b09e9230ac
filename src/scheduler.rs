//! Refresh scheduler
//!
//! Runs the feed tick (fetch, decode, reconcile, aggregate, join) at startup
//! and then on a fixed period, publishing each result as a new snapshot.
//!
//! Runs never overlap: a tick that arrives while one is still fetching is
//! skipped. Each run also carries a sequence number and is only published if
//! it is newer than the snapshot currently visible.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::feed::{fetch_rows, ColumnSchema, FeedSource};
use crate::geometry::GeometryDataset;
use crate::snapshot::{self, DashboardSnapshot, SnapshotReader};
use crate::stats::TOTAL_REGIONS;

/// Refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between feed ticks
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Expected number of upazilas, the progress denominator
    #[serde(default = "default_total_regions")]
    pub total_regions: u32,
}

fn default_interval() -> u64 { 180 } // 3 minutes
fn default_total_regions() -> u32 { TOTAL_REGIONS }

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            total_regions: default_total_regions(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Fetching,
}

/// Result of one requested tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// A snapshot was published; `ok` is false when the feed failed
    Published { seq: u64, ok: bool },
    /// Another tick was already fetching
    Skipped,
    /// A newer snapshot was already visible, result discarded
    Stale { seq: u64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub interval_secs: u64,
    pub last_seq: u64,
    pub ticks_run: u64,
    pub ticks_skipped: u64,
    pub last_error: Option<String>,
}

pub struct RefreshScheduler {
    config: RefreshConfig,
    source: Arc<dyn FeedSource>,
    schema: ColumnSchema,
    geometry: Arc<GeometryDataset>,
    fetching: AtomicBool,
    next_seq: AtomicU64,
    ticks_run: AtomicU64,
    ticks_skipped: AtomicU64,
    publisher: watch::Sender<Arc<DashboardSnapshot>>,
}

/// Clears the fetching flag when a run ends, however it ends.
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl RefreshScheduler {
    pub fn new(
        config: RefreshConfig,
        source: Arc<dyn FeedSource>,
        schema: ColumnSchema,
        geometry: Arc<GeometryDataset>,
    ) -> Self {
        let (publisher, _) = snapshot::channel(&geometry, config.total_regions);
        Self {
            config,
            source,
            schema,
            geometry,
            fetching: AtomicBool::new(false),
            next_seq: AtomicU64::new(0),
            ticks_run: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            publisher,
        }
    }

    /// Subscribe to published snapshots.
    pub fn subscribe(&self) -> SnapshotReader {
        self.publisher.subscribe()
    }

    /// The snapshot currently visible to readers
    pub fn current(&self) -> Arc<DashboardSnapshot> {
        self.publisher.borrow().clone()
    }

    pub fn state(&self) -> SchedulerState {
        if self.fetching.load(Ordering::SeqCst) {
            SchedulerState::Fetching
        } else {
            SchedulerState::Idle
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        let current = self.current();
        SchedulerStatus {
            state: self.state(),
            interval_secs: self.config.interval_secs,
            last_seq: current.seq,
            ticks_run: self.ticks_run.load(Ordering::SeqCst),
            ticks_skipped: self.ticks_skipped.load(Ordering::SeqCst),
            last_error: current.last_error.clone(),
        }
    }

    /// Run one feed tick unless another is already in flight.
    pub async fn refresh(&self) -> TickOutcome {
        if self
            .fetching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.ticks_skipped.fetch_add(1, Ordering::SeqCst);
            debug!("Feed tick skipped, previous tick still fetching");
            return TickOutcome::Skipped;
        }
        let _guard = FetchGuard(&self.fetching);

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.ticks_run.fetch_add(1, Ordering::SeqCst);
        debug!(seq, "Feed tick starting");

        let universe = self.config.total_regions;
        let snapshot = match fetch_rows(self.source.as_ref(), &self.schema).await {
            Ok(rows) => DashboardSnapshot::from_rows(seq, &rows, &self.geometry, universe),
            Err(e) => {
                error!(seq, error = %e, "Feed tick failed, publishing empty snapshot");
                DashboardSnapshot::failed(seq, e.to_string(), &self.geometry, universe)
            }
        };

        let ok = snapshot.last_error.is_none();
        let stats = snapshot.stats;

        if self.publish(snapshot) {
            if ok {
                info!(
                    seq,
                    total = stats.total,
                    done = stats.done,
                    ongoing = stats.ongoing,
                    todo = stats.todo,
                    no_data = stats.no_data,
                    progress_pct = stats.progress_pct,
                    "Published snapshot"
                );
            }
            TickOutcome::Published { seq, ok }
        } else {
            debug!(seq, "Discarding stale feed tick");
            TickOutcome::Stale { seq }
        }
    }

    /// Replace the visible snapshot if `snapshot` is newer.
    fn publish(&self, snapshot: DashboardSnapshot) -> bool {
        self.publisher.send_if_modified(|current| {
            if snapshot.seq > current.seq {
                *current = Arc::new(snapshot);
                true
            } else {
                false
            }
        })
    }

    /// Tick immediately, then every `interval_secs`, until `shutdown` flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval_secs,
            source = %self.source.describe(),
            "Refresh scheduler started"
        );

        let mut tick = interval(Duration::from_secs(self.config.interval_secs.max(1)));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            // An in-flight fetch is abandoned on shutdown; the guard clears the flag
            tokio::select! {
                _ = self.refresh() => {}
                _ = shutdown_requested(&mut shutdown) => {
                    debug!("Abandoning in-flight feed tick");
                    break;
                }
            }
        }

        info!("Refresh scheduler shutting down");
    }
}

/// Resolves once shutdown is signalled or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
