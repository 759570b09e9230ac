//! Dashboard HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::SharedState;
use crate::geometry::{
    coordinates, legend, Bounds, FeatureStatus, JoinState, LegendEntry, OverlayFeature,
};
use crate::reconcile::StatusRecord;
use crate::scheduler::{SchedulerStatus, TickOutcome};
use crate::search::SearchEntry;
use crate::snapshot::SnapshotSummary;
use crate::status::StatusClass;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

/// GET /api/stats
pub async fn api_stats(State(state): State<SharedState>) -> Json<SnapshotSummary> {
    let snapshot = state.snapshots.borrow().clone();
    Json(snapshot.summary())
}

/// GET /api/legend
pub async fn api_legend() -> Json<Vec<LegendEntry>> {
    Json(legend())
}

// === Table modal ===

/// A sheet record as shown in the table
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub code: String,
    pub name: String,
    pub district: String,
    pub division: String,
    pub status: String,
    pub status_class: StatusClass,
}

impl From<&StatusRecord> for RecordView {
    fn from(record: &StatusRecord) -> Self {
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            district: record.district.clone(),
            division: record.division.clone(),
            status: record.raw_status.clone().unwrap_or_default(),
            status_class: record.status_class(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub division: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub seq: u64,
    pub status: StatusClass,
    pub title: String,
    /// Size of the whole list
    pub total: usize,
    /// Records left after the division filter
    pub shown: usize,
    pub records: Vec<RecordView>,
}

fn parse_list_class(name: &str) -> Result<StatusClass, (StatusCode, String)> {
    StatusClass::from_list_name(name).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Unknown list '{}', expected done, ongoing or todo", name),
        )
    })
}

/// GET /api/lists/:class?division=
pub async fn api_list(
    State(state): State<SharedState>,
    Path(class): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, (StatusCode, String)> {
    let class = parse_list_class(&class)?;
    let snapshot = state.snapshots.borrow().clone();
    let list = snapshot.index.list(class);

    let filter = query
        .division
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty());

    let records: Vec<RecordView> = list
        .iter()
        .filter(|record| match &filter {
            Some(f) => record.division.to_lowercase().contains(f.as_str()),
            None => true,
        })
        .map(|record| RecordView::from(*record))
        .collect();

    Ok(Json(ListResponse {
        seq: snapshot.seq,
        status: class,
        title: format!("{} Upazilas", class.title()),
        total: list.len(),
        shown: records.len(),
        records,
    }))
}

/// GET /api/lists/:class/divisions - sorted distinct divisions for the filter
pub async fn api_list_divisions(
    State(state): State<SharedState>,
    Path(class): Path<String>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let class = parse_list_class(&class)?;
    let snapshot = state.snapshots.borrow().clone();

    let divisions: BTreeSet<String> = snapshot
        .index
        .list(class)
        .iter()
        .filter(|record| !record.division.is_empty())
        .map(|record| record.division.clone())
        .collect();

    Ok(Json(divisions.into_iter().collect()))
}

// === Map ===

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub seq: u64,
    /// Box covering every upazila
    pub bounds: Option<Bounds>,
    pub features: Vec<FeatureStatus>,
}

/// GET /api/features - map color per upazila
pub async fn api_features(State(state): State<SharedState>) -> Json<FeaturesResponse> {
    let snapshot = state.snapshots.borrow().clone();
    Json(FeaturesResponse {
        seq: snapshot.seq,
        bounds: state.geometry.bounds(),
        features: snapshot.features.clone(),
    })
}

/// Popup content for one upazila
#[derive(Debug, Serialize)]
pub struct FeatureDetail {
    pub code: String,
    pub name: String,
    pub district: String,
    pub division: String,
    /// Sheet status text, or "No data" when the code is not in the sheet
    pub status: String,
    pub status_class: StatusClass,
    pub state: JoinState,
    pub color: String,
    pub area_sq_km: Option<f64>,
    pub bounds: Option<Bounds>,
    /// Outline for highlighting, as GeoJSON `MultiPolygon` coordinates
    pub coordinates: Vec<Vec<Vec<[f64; 2]>>>,
}

/// GET /api/features/:code
pub async fn api_feature_detail(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<FeatureDetail>, (StatusCode, String)> {
    let feature = state
        .geometry
        .find(&code)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No upazila with code {}", code)))?;

    let snapshot = state.snapshots.borrow().clone();
    let joined = snapshot
        .feature_status(&code)
        .cloned()
        .unwrap_or_else(|| crate::geometry::join_feature(feature, &snapshot.index));

    let status = snapshot
        .index
        .get(&code)
        .and_then(|record| record.raw_status.clone())
        .unwrap_or_else(|| "No data".to_string());

    Ok(Json(FeatureDetail {
        code: feature.code.clone(),
        name: feature.name.clone(),
        district: feature.district.clone(),
        division: feature.division.clone(),
        status,
        status_class: joined.status,
        state: joined.state,
        color: joined.color.to_string(),
        area_sq_km: feature.area_sq_km.map(|a| (a * 10.0).round() / 10.0),
        bounds: feature.bounds,
        coordinates: coordinates(&feature.boundary),
    }))
}

/// GET /api/overlay - district outlines with their names and bounds, 404 when
/// the overlay was not loaded
pub async fn api_overlay(
    State(state): State<SharedState>,
) -> Result<Json<Vec<OverlayFeature>>, (StatusCode, String)> {
    match &state.overlay {
        Some(overlay) => Ok(Json(overlay.clone())),
        None => Err((StatusCode::NOT_FOUND, "District overlay not available".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/search?q=
pub async fn api_search(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<SearchEntry>> {
    Json(state.search.query(&query.q).into_iter().cloned().collect())
}

// === Refresh ===

/// GET /api/scheduler
pub async fn api_scheduler(State(state): State<SharedState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

/// POST /api/refresh - run a feed tick now
pub async fn api_refresh(State(state): State<SharedState>) -> Json<TickOutcome> {
    Json(state.scheduler.refresh().await)
}
