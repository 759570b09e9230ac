//! Status feed
//!
//! The status sheet is read through the spreadsheet "gviz" export, which
//! wraps its JSON payload in a JavaScript callback:
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"table":{"rows":[{"c":[...]}]}});
//! ```
//!
//! Decoding keeps only the text between the first `{` and the last `}` and
//! reads each row's cells by the offsets in [`ColumnSchema`].

pub mod mock;
pub mod schema;

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use mock::StaticFeed;
pub use schema::{ColumnRole, ColumnSchema};

/// Feed errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("Feed malformed: {0}")]
    Malformed(String),
}

/// One sheet row with the cells the dashboard cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    /// Zero-based position in the sheet, for diagnostics
    pub index: usize,
    /// Administrative code, never empty
    pub code: String,
    pub name: Option<String>,
    pub district: Option<String>,
    pub division: Option<String>,
    pub status: Option<String>,
}

/// Source of raw feed bodies
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Where the feed comes from, for logs.
    fn describe(&self) -> String;

    /// Fetch the raw, still wrapped, response body.
    async fn fetch_body(&self) -> Result<String, FeedError>;
}

/// Fetch and decode in one step.
pub async fn fetch_rows(
    source: &dyn FeedSource,
    schema: &ColumnSchema,
) -> Result<Vec<FeedRow>, FeedError> {
    let body = source.fetch_body().await.map_err(|e| {
        warn!(stage = "fetch", source = %source.describe(), error = %e, "Feed fetch failed");
        e
    })?;

    parse_body(&body, schema).map_err(|e| {
        warn!(stage = "decode", source = %source.describe(), error = %e, "Feed decode failed");
        e
    })
}

/// HTTP source reading the spreadsheet export endpoint
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    fn describe(&self) -> String {
        self.url().to_string()
    }

    async fn fetch_body(&self) -> Result<String, FeedError> {
        debug!(url = %self.url, "Fetching status feed");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Unavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))
    }
}

/// Build the gviz export URL for a sheet.
pub fn sheet_url(base_url: &str, sheet_id: &str, sheet_name: &str) -> String {
    format!(
        "{}/{}/gviz/tq?tqx=out:json&sheet={}",
        base_url.trim_end_matches('/'),
        sheet_id,
        sheet_name
    )
}

// Wire shape of the gviz payload. Only the parts that are read.

#[derive(Deserialize)]
struct GvizResponse {
    table: GvizTable,
}

#[derive(Deserialize)]
struct GvizTable {
    #[serde(default)]
    rows: Option<Vec<GvizRow>>,
}

#[derive(Deserialize)]
struct GvizRow {
    #[serde(default)]
    c: Vec<Option<GvizCell>>,
}

#[derive(Deserialize)]
struct GvizCell {
    #[serde(default)]
    v: serde_json::Value,
}

/// Locate the JSON object embedded in the wrapped response.
pub fn extract_embedded_json(body: &str) -> Result<&str, FeedError> {
    let start = body
        .find('{')
        .ok_or_else(|| FeedError::Malformed("no opening brace in response".to_string()))?;
    let end = body
        .rfind('}')
        .ok_or_else(|| FeedError::Malformed("no closing brace in response".to_string()))?;

    if end < start {
        return Err(FeedError::Malformed(
            "closing brace precedes opening brace".to_string(),
        ));
    }

    Ok(&body[start..=end])
}

/// Decode a raw response body into rows.
///
/// Rows without a code are dropped here. A non-empty feed in which no row is
/// wide enough for the schema is rejected as a whole rather than misread.
pub fn parse_body(body: &str, schema: &ColumnSchema) -> Result<Vec<FeedRow>, FeedError> {
    let json = extract_embedded_json(body)?;
    let response: GvizResponse =
        serde_json::from_str(json).map_err(|e| FeedError::Malformed(e.to_string()))?;

    let rows = response.table.rows.unwrap_or_default();
    let min_width = schema.min_width();

    if !rows.is_empty() && rows.iter().all(|row| row.c.len() < min_width) {
        return Err(FeedError::Malformed(format!(
            "row shape does not match column schema: expected at least {} cells, widest row has {}",
            min_width,
            rows.iter().map(|row| row.c.len()).max().unwrap_or(0)
        )));
    }

    let mut parsed = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        if row.c.len() < min_width {
            debug!(row = index, cells = row.c.len(), min_width, "Short row, missing cells read as empty");
        }

        let cell = |role: ColumnRole| -> Option<String> {
            row.c
                .get(schema.offset(role))
                .and_then(|cell| cell.as_ref())
                .and_then(|cell| cell_text(&cell.v))
        };

        let Some(code) = cell(ColumnRole::Code) else {
            debug!(row = index, "Dropping row without code");
            dropped += 1;
            continue;
        };

        parsed.push(FeedRow {
            index,
            code,
            name: cell(ColumnRole::Name),
            district: cell(ColumnRole::District),
            division: cell(ColumnRole::Division),
            status: cell(ColumnRole::Status),
        });
    }

    info!(rows = rows.len(), parsed = parsed.len(), dropped, "Decoded status feed");
    Ok(parsed)
}

/// Render a cell value as trimmed text. Empty cells yield `None`.
fn cell_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
