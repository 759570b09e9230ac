//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::feed::{sheet_url, ColumnSchema};
use crate::geometry::FeatureKeys;
use crate::scheduler::RefreshConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Status sheet location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Spreadsheet export base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Spreadsheet identifier
    #[serde(default = "default_sheet_id")]
    pub sheet_id: String,

    /// Worksheet (tab) name
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Column offsets within each row
    #[serde(default)]
    pub columns: ColumnSchema,
}

impl FeedConfig {
    pub fn url(&self) -> String {
        sheet_url(&self.base_url, &self.sheet_id, &self.sheet_name)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sheet_id: default_sheet_id(),
            sheet_name: default_sheet_name(),
            timeout_secs: default_timeout(),
            columns: ColumnSchema::default(),
        }
    }
}

/// Static geometry files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Upazila boundaries (required)
    #[serde(default = "default_regions_path")]
    pub regions_path: PathBuf,

    /// District boundaries drawn as an overlay (optional)
    #[serde(default = "default_overlay_path")]
    pub overlay_path: Option<PathBuf>,

    /// Property names in the upazila file
    #[serde(default)]
    pub keys: FeatureKeys,

    /// Name property in the overlay file
    #[serde(default = "default_overlay_name_key")]
    pub overlay_name_key: String,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            regions_path: default_regions_path(),
            overlay_path: default_overlay_path(),
            keys: FeatureKeys::default(),
            overlay_name_key: default_overlay_name_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Directory served under /static
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            static_dir: None,
        }
    }
}

// Defaults
fn default_base_url() -> String { "https://docs.google.com/spreadsheets/d".to_string() }
fn default_sheet_id() -> String { "1xRA1Padw-hKv-ZprqqWH6KCtCE-PvtJtZeWfwfeihYw".to_string() }
fn default_sheet_name() -> String { "upazilas".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_regions_path() -> PathBuf { PathBuf::from("public/bdupazila.json") }
fn default_overlay_path() -> Option<PathBuf> { Some(PathBuf::from("public/bd-districts.json")) }
fn default_overlay_name_key() -> String { "adm2_name".to_string() }
fn default_http_port() -> u16 { 8080 }

impl Config {
    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.feed.sheet_id.trim().is_empty() {
            return Err("feed.sheet_id must not be empty".to_string());
        }
        if self.feed.timeout_secs == 0 {
            return Err("feed.timeout_secs must be greater than 0".to_string());
        }
        if self.refresh.interval_secs == 0 {
            return Err("refresh.interval_secs must be greater than 0".to_string());
        }
        if self.refresh.total_regions == 0 {
            return Err("refresh.total_regions must be greater than 0".to_string());
        }
        self.feed
            .columns
            .validate()
            .map_err(|e| format!("feed.columns: {}", e))
    }
}
