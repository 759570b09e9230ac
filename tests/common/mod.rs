//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use zoning_dashboard::geometry::{FeatureKeys, GeometryDataset};

/// A sheet row: (division, district, name, status, code)
pub type SheetRow<'a> = (&'a str, &'a str, &'a str, Option<&'a str>, Option<&'a str>);

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn geometry() -> Arc<GeometryDataset> {
    Arc::new(
        GeometryDataset::load(&fixture("bdupazila.json"), &FeatureKeys::default())
            .expect("fixture geometry loads"),
    )
}

/// Render rows the way the spreadsheet gviz endpoint does, wrapper included.
pub fn sheet_body(rows: &[SheetRow]) -> String {
    let cell = |value: Option<&str>| match value {
        Some(v) => serde_json::json!({ "v": v }),
        None => serde_json::Value::Null,
    };

    let rows: Vec<serde_json::Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (division, district, name, status, code))| {
            serde_json::json!({
                "c": [
                    { "v": i as f64 + 1.0, "f": (i + 1).to_string() },
                    null,
                    cell(Some(*division)),
                    cell(Some(*district)),
                    cell(Some(*name)),
                    cell(*status),
                    cell(*code),
                ]
            })
        })
        .collect();

    let payload = serde_json::json!({
        "version": "0.6",
        "reqId": "0",
        "status": "ok",
        "table": {
            "cols": [],
            "rows": rows,
            "parsedNumHeaders": 1
        }
    });

    format!(
        "/*O_o*/\ngoogle.visualization.Query.setResponse({});",
        payload
    )
}

/// All five fixture upazilas with a mix of statuses
pub fn mixed_rows() -> Vec<SheetRow<'static>> {
    vec![
        ("Dhaka", "Dhaka", "Dhamrai", Some("Done"), Some("BD302614")),
        ("Dhaka", "Dhaka", "Savar", Some("In Progress"), Some("BD302672")),
        ("Dhaka", "Gazipur", "Kaliakair", Some("pending"), Some("BD304133")),
        ("Khulna", "Jessore", "Abhaynagar", Some("survey booked"), Some("BD404104")),
        ("Khulna", "Jessore", "Jhikargachha", Some("Complete"), Some("BD404147")),
    ]
}
