//! Dashboard - JSON API consumed by the map, legend, search box and table
//!
//! Provides:
//! - Aggregate progress stats and legend colors
//! - Done / ongoing / todo lists with a division filter
//! - Per-upazila map colors and popup details
//! - Name search with framing bounds
//! - District overlay outlines
//! - Refresh scheduler status and manual refresh

pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;

use crate::geometry::{GeometryDataset, OverlayFeature};
use crate::scheduler::RefreshScheduler;
use crate::search::SearchIndex;
use crate::snapshot::SnapshotReader;

/// Dashboard state shared across handlers
pub struct DashboardState {
    pub scheduler: Arc<RefreshScheduler>,
    pub snapshots: SnapshotReader,
    pub geometry: Arc<GeometryDataset>,
    pub search: SearchIndex,
    pub overlay: Option<Vec<OverlayFeature>>,
}

pub type SharedState = Arc<DashboardState>;

impl DashboardState {
    pub fn new(
        scheduler: Arc<RefreshScheduler>,
        geometry: Arc<GeometryDataset>,
        overlay: Option<Vec<OverlayFeature>>,
    ) -> Self {
        Self {
            snapshots: scheduler.subscribe(),
            search: SearchIndex::build(&geometry),
            scheduler,
            geometry,
            overlay,
        }
    }
}

/// Create the dashboard router
pub fn create_router(state: SharedState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        // Progress
        .route("/api/stats", get(routes::api_stats))
        .route("/api/legend", get(routes::api_legend))
        // Table modal
        .route("/api/lists/:class", get(routes::api_list))
        .route("/api/lists/:class/divisions", get(routes::api_list_divisions))
        // Map
        .route("/api/features", get(routes::api_features))
        .route("/api/features/:code", get(routes::api_feature_detail))
        .route("/api/overlay", get(routes::api_overlay))
        .route("/api/search", get(routes::api_search))
        // Refresh
        .route("/api/scheduler", get(routes::api_scheduler))
        .route("/api/refresh", post(routes::api_refresh))
        // Health check
        .route("/health", get(routes::health));

    let router = match static_dir {
        Some(dir) => router.nest_service("/static", tower_http::services::ServeDir::new(dir)),
        None => router,
    };

    router.with_state(state)
}
