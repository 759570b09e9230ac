//! Dashboard snapshots
//!
//! Everything a feed tick produces is bundled into one immutable snapshot:
//! the reconciliation index, its aggregate stats, and the joined status of
//! every geometry feature. Snapshots are published whole through a watch
//! channel, so a reader can never see stats from one tick next to map
//! colors from another.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use crate::feed::FeedRow;
use crate::geometry::{join_all, FeatureStatus, GeometryDataset};
use crate::reconcile::ReconciliationIndex;
use crate::stats::AggregateStats;

/// Receiving side of the snapshot channel
pub type SnapshotReader = watch::Receiver<Arc<DashboardSnapshot>>;

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    /// Sequence number of the tick that produced this snapshot. 0 before the
    /// first tick completes.
    pub seq: u64,
    /// Unix seconds when the tick finished
    pub fetched_at: u64,
    pub index: ReconciliationIndex,
    pub stats: AggregateStats,
    /// Joined status per geometry feature, in dataset order
    pub features: Vec<FeatureStatus>,
    feature_positions: HashMap<String, usize>,
    /// Set when the tick failed; the snapshot is then empty
    pub last_error: Option<String>,
}

/// Stats header served alongside every snapshot view
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub seq: u64,
    pub fetched_at: u64,
    pub stats: AggregateStats,
    pub last_error: Option<String>,
}

impl DashboardSnapshot {
    /// Placeholder published before the first tick lands.
    pub fn initial(geometry: &GeometryDataset, universe: u32) -> Self {
        Self::assemble(0, ReconciliationIndex::default(), geometry, universe, None)
    }

    /// Snapshot of a successful tick.
    pub fn from_rows(seq: u64, rows: &[FeedRow], geometry: &GeometryDataset, universe: u32) -> Self {
        let index = ReconciliationIndex::build(rows);
        Self::assemble(seq, index, geometry, universe, None)
    }

    /// Snapshot of a failed tick: empty index and all-zero stats.
    pub fn failed(seq: u64, error: String, geometry: &GeometryDataset, universe: u32) -> Self {
        Self::assemble(seq, ReconciliationIndex::default(), geometry, universe, Some(error))
    }

    fn assemble(
        seq: u64,
        index: ReconciliationIndex,
        geometry: &GeometryDataset,
        universe: u32,
        last_error: Option<String>,
    ) -> Self {
        let stats = if last_error.is_some() {
            AggregateStats::empty(universe)
        } else {
            AggregateStats::from_index(&index, universe)
        };
        let features = join_all(geometry, &index);
        let feature_positions = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.code.clone(), i))
            .collect();

        Self {
            seq,
            fetched_at: unix_now(),
            index,
            stats,
            features,
            feature_positions,
            last_error,
        }
    }

    /// Joined status of one geometry feature.
    pub fn feature_status(&self, code: &str) -> Option<&FeatureStatus> {
        self.feature_positions.get(code).map(|&i| &self.features[i])
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            seq: self.seq,
            fetched_at: self.fetched_at,
            stats: self.stats,
            last_error: self.last_error.clone(),
        }
    }
}

/// Create the snapshot channel seeded with the placeholder snapshot.
pub fn channel(
    geometry: &GeometryDataset,
    universe: u32,
) -> (watch::Sender<Arc<DashboardSnapshot>>, SnapshotReader) {
    watch::channel(Arc::new(DashboardSnapshot::initial(geometry, universe)))
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryFeature, JoinState};
    use crate::stats::TOTAL_REGIONS;
    use crate::status::StatusClass;
    use geo::MultiPolygon;

    fn geometry() -> GeometryDataset {
        GeometryDataset::new(
            ["A", "B"]
                .iter()
                .map(|code| GeometryFeature {
                    code: code.to_string(),
                    name: code.to_string(),
                    district: String::new(),
                    division: String::new(),
                    area_sq_km: None,
                    boundary: MultiPolygon::new(Vec::new()),
                    bounds: None,
                })
                .collect(),
        )
    }

    fn row(code: &str, status: &str) -> FeedRow {
        FeedRow {
            index: 0,
            code: code.to_string(),
            name: Some(code.to_string()),
            district: None,
            division: None,
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn test_initial_snapshot_is_empty() {
        let snapshot = DashboardSnapshot::initial(&geometry(), TOTAL_REGIONS);
        assert_eq!(snapshot.seq, 0);
        assert_eq!(snapshot.stats, AggregateStats::empty(TOTAL_REGIONS));
        assert!(snapshot
            .features
            .iter()
            .all(|f| f.state == JoinState::Unmatched));
    }

    #[test]
    fn test_snapshot_joins_every_feature() {
        let snapshot = DashboardSnapshot::from_rows(1, &[row("A", "done")], &geometry(), TOTAL_REGIONS);
        assert_eq!(snapshot.stats.done, 1);
        assert_eq!(snapshot.features.len(), 2);
        assert_eq!(snapshot.feature_status("A").unwrap().status, StatusClass::Done);
        assert_eq!(snapshot.feature_status("B").unwrap().state, JoinState::Unmatched);
        assert!(snapshot.feature_status("C").is_none());
    }

    #[test]
    fn test_failed_snapshot() {
        let snapshot = DashboardSnapshot::failed(3, "Feed malformed".to_string(), &geometry(), TOTAL_REGIONS);
        assert_eq!(snapshot.seq, 3);
        assert!(snapshot.index.is_empty());
        assert_eq!(snapshot.stats.total, 0);
        assert_eq!(snapshot.summary().last_error.as_deref(), Some("Feed malformed"));
    }
}
