//! Aggregate statistics
//!
//! Progress is measured against the fixed number of upazilas in the country,
//! not against the number of rows the sheet happens to return.

use serde::{Deserialize, Serialize};

use crate::reconcile::ReconciliationIndex;
use crate::status::StatusClass;

/// Number of upazilas in Bangladesh
pub const TOTAL_REGIONS: u32 = 495;

/// Counts and progress for one feed tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub done: u32,
    pub ongoing: u32,
    pub todo: u32,
    pub no_data: u32,
    /// Records accepted from the feed
    pub total: u32,
    /// Expected universe used as the progress denominator
    pub universe: u32,
    /// `(done + ongoing) / universe * 100`, one decimal
    pub progress_pct: f64,
}

impl AggregateStats {
    /// Derive stats from a freshly built index.
    pub fn from_index(index: &ReconciliationIndex, universe: u32) -> Self {
        let done = index.list_len(StatusClass::Done) as u32;
        let ongoing = index.list_len(StatusClass::Ongoing) as u32;
        let todo = index.list_len(StatusClass::Todo) as u32;
        let total = index.len() as u32;

        Self {
            done,
            ongoing,
            todo,
            no_data: total - done - ongoing - todo,
            total,
            universe,
            progress_pct: progress_pct(done + ongoing, universe),
        }
    }

    /// All-zero stats, published when a feed tick fails.
    pub fn empty(universe: u32) -> Self {
        Self {
            universe,
            ..Self::default()
        }
    }
}

fn progress_pct(started: u32, universe: u32) -> f64 {
    if universe == 0 {
        return 0.0;
    }
    let pct = f64::from(started) / f64::from(universe) * 100.0;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedRow;

    fn rows(statuses: &[Option<&str>]) -> Vec<FeedRow> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| FeedRow {
                index: i,
                code: format!("BD{:04}", i),
                name: Some(format!("Upazila {}", i)),
                district: None,
                division: None,
                status: status.map(String::from),
            })
            .collect()
    }

    #[test]
    fn test_counts_partition_total() {
        let index = ReconciliationIndex::build(&rows(&[
            Some("done"),
            Some("ongoing"),
            Some("todo"),
            Some("???"),
            None,
            Some("Complete"),
        ]));
        let stats = AggregateStats::from_index(&index, TOTAL_REGIONS);

        assert_eq!(stats.done, 2);
        assert_eq!(stats.ongoing, 1);
        assert_eq!(stats.todo, 1);
        assert_eq!(stats.no_data, 2);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.done + stats.ongoing + stats.todo + stats.no_data, stats.total);
        assert_eq!(stats.total as usize, index.len());
    }

    #[test]
    fn test_progress_uses_universe() {
        let statuses = vec![Some("Done"); 100];
        let index = ReconciliationIndex::build(&rows(&statuses));
        let stats = AggregateStats::from_index(&index, TOTAL_REGIONS);

        // 100 / 495 * 100 = 20.20..
        assert_eq!(stats.total, 100);
        assert_eq!(stats.progress_pct, 20.2);
        assert_ne!(stats.progress_pct, 100.0);
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(progress_pct(1, 3), 33.3);
        assert_eq!(progress_pct(2, 3), 66.7);
        assert_eq!(progress_pct(495, 495), 100.0);
        assert_eq!(progress_pct(0, 495), 0.0);
        assert_eq!(progress_pct(5, 0), 0.0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = AggregateStats::empty(TOTAL_REGIONS);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.done + stats.ongoing + stats.todo + stats.no_data, 0);
        assert_eq!(stats.progress_pct, 0.0);
        assert_eq!(stats.universe, TOTAL_REGIONS);
    }

    #[test]
    fn test_idempotent_for_unchanged_rows() {
        let input = rows(&[Some("done"), Some("ongoing"), None]);
        let a = AggregateStats::from_index(&ReconciliationIndex::build(&input), TOTAL_REGIONS);
        let b = AggregateStats::from_index(&ReconciliationIndex::build(&input), TOTAL_REGIONS);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
