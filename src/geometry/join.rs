//! Geometry join
//!
//! Resolves each upazila polygon to a display status by looking its code up
//! in the current reconciliation index. Nothing is cached per feature; the
//! join is recomputed against whichever index is current.

use serde::Serialize;

use super::{GeometryDataset, GeometryFeature};
use crate::reconcile::ReconciliationIndex;
use crate::status::StatusClass;

pub const DONE_COLOR: &str = "#2ecc71";
pub const ONGOING_COLOR: &str = "#f1c40f";
pub const TODO_COLOR: &str = "#bdc3c7";
/// Code is in the sheet but its status text is not recognized
pub const UNRECOGNIZED_COLOR: &str = "#d6dde2";
/// Code is not in the sheet at all
pub const NO_DATA_COLOR: &str = "#e8ecef";

/// Whether a feature's code was found in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinState {
    Matched,
    Unmatched,
}

/// Display status of one geometry feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    pub code: String,
    pub status: StatusClass,
    pub state: JoinState,
    pub color: &'static str,
}

/// Color for a joined status.
pub fn color_for(status: StatusClass, state: JoinState) -> &'static str {
    match (state, status) {
        (JoinState::Unmatched, _) => NO_DATA_COLOR,
        (JoinState::Matched, StatusClass::Done) => DONE_COLOR,
        (JoinState::Matched, StatusClass::Ongoing) => ONGOING_COLOR,
        (JoinState::Matched, StatusClass::Todo) => TODO_COLOR,
        (JoinState::Matched, StatusClass::Unclassified) => UNRECOGNIZED_COLOR,
    }
}

/// Join one feature against the index.
pub fn join_feature(feature: &GeometryFeature, index: &ReconciliationIndex) -> FeatureStatus {
    let (status, state) = match index.get(&feature.code) {
        Some(record) => (record.status_class(), JoinState::Matched),
        None => (StatusClass::Unclassified, JoinState::Unmatched),
    };

    FeatureStatus {
        code: feature.code.clone(),
        status,
        state,
        color: color_for(status, state),
    }
}

/// Join every feature of the dataset, in dataset order.
pub fn join_all(dataset: &GeometryDataset, index: &ReconciliationIndex) -> Vec<FeatureStatus> {
    dataset
        .features()
        .iter()
        .map(|feature| join_feature(feature, index))
        .collect()
}

/// One row of the map legend
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

/// Legend rows, in display order.
pub fn legend() -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = StatusClass::LISTED
        .iter()
        .map(|class| LegendEntry {
            key: class.as_str(),
            label: class.title(),
            color: color_for(*class, JoinState::Matched),
        })
        .collect();

    entries.push(LegendEntry {
        key: "unrecognized",
        label: "Unrecognized status",
        color: UNRECOGNIZED_COLOR,
    });
    entries.push(LegendEntry {
        key: "no_data",
        label: "No data",
        color: NO_DATA_COLOR,
    });
    entries
}
