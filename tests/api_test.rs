//! Dashboard API tests
//!
//! Serves the real router on an ephemeral port, backed by a scripted feed.

mod common;

use std::sync::Arc;

use serde_json::Value;
use tokio::net::TcpListener;

use zoning_dashboard::config::Config;
use zoning_dashboard::dashboard::{create_router, DashboardState};
use zoning_dashboard::feed::StaticFeed;
use zoning_dashboard::geometry::{self, join::UNRECOGNIZED_COLOR};
use zoning_dashboard::scheduler::{RefreshConfig, RefreshScheduler};

struct TestServer {
    base: String,
    feed: Arc<StaticFeed>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(with_overlay: bool) -> Self {
        let feed = Arc::new(StaticFeed::new(common::sheet_body(&common::mixed_rows())));
        let geometry = common::geometry();
        let scheduler = Arc::new(RefreshScheduler::new(
            RefreshConfig::default(),
            feed.clone(),
            Config::default().feed.columns,
            geometry.clone(),
        ));
        scheduler.refresh().await;

        let overlay = if with_overlay {
            geometry::load_overlay_optional(
                Some(common::fixture("bd-districts.json").as_path()),
                "adm2_name",
            )
        } else {
            None
        };

        let state = Arc::new(DashboardState::new(scheduler, geometry, overlay));
        let app = create_router(state, None);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            feed,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert!(response.status().is_success(), "GET {} failed", path);
        response.json().await.unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start(false).await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_stats_and_legend() {
    let server = TestServer::start(false).await;

    let summary = server.get_json("/api/stats").await;
    assert_eq!(summary["seq"], 1);
    assert!(summary["last_error"].is_null());
    let stats = &summary["stats"];
    assert_eq!(stats["done"], 2);
    assert_eq!(stats["ongoing"], 1);
    assert_eq!(stats["todo"], 1);
    assert_eq!(stats["no_data"], 1);
    assert_eq!(stats["total"], 5);
    assert_eq!(stats["universe"], 495);
    assert_eq!(stats["progress_pct"], 0.6);

    let legend = server.get_json("/api/legend").await;
    let colors: Vec<&str> = legend
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["color"].as_str().unwrap())
        .collect();
    assert_eq!(colors[0], "#2ecc71");
    assert_eq!(colors[1], "#f1c40f");
    assert_eq!(colors[2], "#bdc3c7");
}

#[tokio::test]
async fn test_lists_with_division_filter() {
    let server = TestServer::start(false).await;

    let done = server.get_json("/api/lists/done").await;
    assert_eq!(done["title"], "Done Upazilas");
    assert_eq!(done["total"], 2);
    assert_eq!(done["shown"], 2);
    // Sheet order
    assert_eq!(done["records"][0]["name"], "Dhamrai");
    assert_eq!(done["records"][1]["name"], "Jhikargachha");
    assert_eq!(done["records"][1]["status"], "Complete");

    let filtered = server.get_json("/api/lists/done?division=khul").await;
    assert_eq!(filtered["total"], 2);
    assert_eq!(filtered["shown"], 1);
    assert_eq!(filtered["records"][0]["division"], "Khulna");

    let todo = server.get_json("/api/lists/todo").await;
    assert_eq!(todo["title"], "ToDo Upazilas");
    assert_eq!(todo["records"][0]["code"], "BD304133");

    let divisions = server.get_json("/api/lists/done/divisions").await;
    assert_eq!(divisions, serde_json::json!(["Dhaka", "Khulna"]));

    assert_eq!(server.get("/api/lists/unknown").await.status(), 404);
}

#[tokio::test]
async fn test_features_and_detail() {
    let server = TestServer::start(false).await;

    let features = server.get_json("/api/features").await;
    assert_eq!(features["features"].as_array().unwrap().len(), 5);
    assert!(features["bounds"]["min_lon"].is_number());

    let unrecognized = server.get_json("/api/features/BD404104").await;
    assert_eq!(unrecognized["status"], "survey booked");
    assert_eq!(unrecognized["state"], "matched");
    assert_eq!(unrecognized["color"], UNRECOGNIZED_COLOR);

    let detail = server.get_json("/api/features/BD302614").await;
    assert_eq!(detail["name"], "Dhamrai");
    assert_eq!(detail["status_class"], "done");
    assert_eq!(detail["color"], "#2ecc71");
    assert_eq!(detail["area_sq_km"], 307.4);
    let ring = detail["coordinates"][0][0].as_array().unwrap();
    assert_eq!(ring.len(), 5);
    assert_eq!(ring[0], serde_json::json!([90.05, 23.85]));

    assert_eq!(server.get("/api/features/BD999999").await.status(), 404);
}

#[tokio::test]
async fn test_feature_missing_from_sheet_reads_no_data() {
    let server = TestServer::start(false).await;

    let rows: Vec<_> = common::mixed_rows()
        .into_iter()
        .filter(|row| row.4 != Some("BD404147"))
        .collect();
    server.feed.set_body(common::sheet_body(&rows));

    let outcome: Value = server
        .client
        .post(format!("{}/api/refresh", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["outcome"], "published");
    assert_eq!(outcome["seq"], 2);
    assert_eq!(outcome["ok"], true);

    let detail = server.get_json("/api/features/BD404147").await;
    assert_eq!(detail["status"], "No data");
    assert_eq!(detail["state"], "unmatched");
    assert_eq!(detail["color"], "#e8ecef");

    let scheduler = server.get_json("/api/scheduler").await;
    assert_eq!(scheduler["state"], "idle");
    assert_eq!(scheduler["last_seq"], 2);
    assert_eq!(scheduler["ticks_run"], 2);
}

#[tokio::test]
async fn test_search_needs_two_characters() {
    let server = TestServer::start(false).await;

    let short = server.get_json("/api/search?q=a").await;
    assert!(short.as_array().unwrap().is_empty());

    let hits = server.get_json("/api/search?q=AR").await;
    let names: Vec<&str> = hits
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Savar", "Abhaynagar", "Jhikargachha"]);
    assert!(hits[0]["bounds"]["max_lat"].is_number());

    let none = server.get_json("/api/search").await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_overlay_presence() {
    let without = TestServer::start(false).await;
    assert_eq!(without.get("/api/overlay").await.status(), 404);

    let with = TestServer::start(true).await;
    let overlay = with.get_json("/api/overlay").await;
    let names: Vec<&str> = overlay
        .as_array()
        .unwrap()
        .iter()
        .map(|district| district["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Dhaka", "Jessore"]);

    // Outlines are drawable, not just framing boxes
    let dhaka = &overlay[0];
    assert_eq!(dhaka["bounds"]["max_lat"], 24.1);
    let rings = dhaka["coordinates"].as_array().unwrap();
    assert_eq!(rings.len(), 1);
    let exterior = rings[0][0].as_array().unwrap();
    assert_eq!(exterior.len(), 5);
    assert_eq!(exterior[1], serde_json::json!([90.4, 23.7]));
    assert_eq!(overlay[1]["coordinates"][0][0][2], serde_json::json!([89.6, 23.3]));
}
