//! Geometry datasets
//!
//! Upazila boundaries come from a static GeoJSON `FeatureCollection`. The
//! dataset is loaded once at startup and never changes afterwards. A second,
//! optional file carries district boundaries drawn as an overlay.

pub mod join;

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use join::{join_all, join_feature, legend, FeatureStatus, JoinState, LegendEntry};

/// Geometry loading errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeometryError {
    #[error("Geometry dataset unavailable at {}: {reason}", path.display())]
    Unavailable { path: PathBuf, reason: String },

    #[error("Overlay dataset unavailable at {}: {reason}", path.display())]
    OverlayUnavailable { path: PathBuf, reason: String },

    #[error("Invalid geometry dataset: {0}")]
    Invalid(String),
}

/// GeoJSON property names for the upazila dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureKeys {
    #[serde(default = "default_code_key")]
    pub code: String,
    #[serde(default = "default_name_key")]
    pub name: String,
    #[serde(default = "default_district_key")]
    pub district: String,
    #[serde(default = "default_division_key")]
    pub division: String,
    #[serde(default = "default_area_key")]
    pub area: String,
}

fn default_code_key() -> String { "adm3_pcode".to_string() }
fn default_name_key() -> String { "adm3_name".to_string() }
fn default_district_key() -> String { "adm2_name".to_string() }
fn default_division_key() -> String { "adm1_name".to_string() }
fn default_area_key() -> String { "area_sqkm".to_string() }

impl Default for FeatureKeys {
    fn default() -> Self {
        Self {
            code: default_code_key(),
            name: default_name_key(),
            district: default_district_key(),
            division: default_division_key(),
            area: default_area_key(),
        }
    }
}

/// Bounding box in lon/lat, used by the map to frame a feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    fn of(boundary: &MultiPolygon<f64>) -> Option<Self> {
        boundary.bounding_rect().map(|rect| Bounds {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        })
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}

/// One upazila polygon with its identifying properties
#[derive(Debug, Clone)]
pub struct GeometryFeature {
    pub code: String,
    pub name: String,
    pub district: String,
    pub division: String,
    pub area_sq_km: Option<f64>,
    pub boundary: MultiPolygon<f64>,
    pub bounds: Option<Bounds>,
}

/// The upazila layer
#[derive(Debug, Clone, Default)]
pub struct GeometryDataset {
    features: Vec<GeometryFeature>,
}

impl GeometryDataset {
    pub fn new(features: Vec<GeometryFeature>) -> Self {
        Self { features }
    }

    /// Load the required upazila dataset. Failure is fatal to startup.
    pub fn load(path: &Path, keys: &FeatureKeys) -> Result<Self, GeometryError> {
        let content = std::fs::read_to_string(path).map_err(|e| GeometryError::Unavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let features = feature_array(&content).map_err(|e| GeometryError::Unavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let dataset = Self::from_features(&features, keys)?;

        info!(
            path = %path.display(),
            features = dataset.len(),
            "Loaded upazila geometry"
        );
        Ok(dataset)
    }

    /// Parse a GeoJSON `FeatureCollection`.
    pub fn from_geojson(content: &str, keys: &FeatureKeys) -> Result<Self, GeometryError> {
        Self::from_features(&feature_array(content)?, keys)
    }

    /// Build the layer from raw features. A layer with no features, or none
    /// carrying a code under `keys.code`, would render as a blank map and is
    /// rejected.
    fn from_features(raw: &[Value], keys: &FeatureKeys) -> Result<Self, GeometryError> {
        if raw.is_empty() {
            return Err(GeometryError::Invalid("feature collection is empty".to_string()));
        }

        let features: Vec<GeometryFeature> = raw
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                let props = feature.get("properties").unwrap_or(&Value::Null);
                let boundary = parse_boundary(feature.get("geometry"));
                if boundary.0.is_empty() {
                    debug!(feature = i, "Feature has no polygon geometry");
                }
                GeometryFeature {
                    code: property_text(props, &keys.code),
                    name: property_text(props, &keys.name),
                    district: property_text(props, &keys.district),
                    division: property_text(props, &keys.division),
                    area_sq_km: props.get(&keys.area).and_then(Value::as_f64),
                    bounds: Bounds::of(&boundary),
                    boundary,
                }
            })
            .collect();

        if features.iter().all(|f| f.code.is_empty()) {
            return Err(GeometryError::Invalid(format!(
                "no feature has a '{}' property",
                keys.code
            )));
        }

        Ok(Self { features })
    }

    pub fn features(&self) -> &[GeometryFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Find a feature by administrative code.
    pub fn find(&self, code: &str) -> Option<&GeometryFeature> {
        self.features.iter().find(|f| f.code == code)
    }

    /// Box covering the whole layer, for the initial map view
    pub fn bounds(&self) -> Option<Bounds> {
        self.features
            .iter()
            .filter_map(|f| f.bounds)
            .reduce(|acc, b| acc.union(&b))
    }
}

/// One district outline from the overlay file
#[derive(Debug, Clone, Serialize)]
pub struct OverlayFeature {
    pub name: String,
    pub bounds: Option<Bounds>,
    /// GeoJSON `MultiPolygon` coordinates
    #[serde(rename = "coordinates", serialize_with = "serialize_coordinates")]
    pub boundary: MultiPolygon<f64>,
}

/// Rings of a boundary as GeoJSON `MultiPolygon` coordinates: polygons of
/// rings of `[lon, lat]` positions, exterior ring first.
pub fn coordinates(boundary: &MultiPolygon<f64>) -> Vec<Vec<Vec<[f64; 2]>>> {
    boundary
        .0
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
                .collect()
        })
        .collect()
}

pub fn serialize_coordinates<S: Serializer>(
    boundary: &MultiPolygon<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    coordinates(boundary).serialize(serializer)
}

/// Load the optional district overlay.
pub fn load_overlay(path: &Path, name_key: &str) -> Result<Vec<OverlayFeature>, GeometryError> {
    let unavailable = |reason: String| GeometryError::OverlayUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
    let features = feature_array(&content).map_err(|e| unavailable(e.to_string()))?;

    let overlay: Vec<OverlayFeature> = features
        .iter()
        .map(|feature| {
            let props = feature.get("properties").unwrap_or(&Value::Null);
            let boundary = parse_boundary(feature.get("geometry"));
            OverlayFeature {
                name: property_text(props, name_key),
                bounds: Bounds::of(&boundary),
                boundary,
            }
        })
        .collect();

    info!(path = %path.display(), features = overlay.len(), "Loaded district overlay");
    Ok(overlay)
}

/// Load the overlay if configured, logging and skipping it on failure.
pub fn load_overlay_optional(path: Option<&Path>, name_key: &str) -> Option<Vec<OverlayFeature>> {
    let path = path?;
    match load_overlay(path, name_key) {
        Ok(overlay) => Some(overlay),
        Err(e) => {
            warn!(error = %e, "Skipping district overlay");
            None
        }
    }
}

fn feature_array(content: &str) -> Result<Vec<Value>, GeometryError> {
    let mut root: Value =
        serde_json::from_str(content).map_err(|e| GeometryError::Invalid(e.to_string()))?;

    match root.get_mut("features").map(Value::take) {
        Some(Value::Array(features)) => Ok(features),
        _ => Err(GeometryError::Invalid(
            "expected a FeatureCollection with a features array".to_string(),
        )),
    }
}

/// Read a property as text. Numeric codes are rendered without a fraction.
fn property_text(props: &Value, key: &str) -> String {
    match props.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        _ => String::new(),
    }
}

fn parse_boundary(geometry: Option<&Value>) -> MultiPolygon<f64> {
    let Some(geometry) = geometry else {
        return MultiPolygon::new(Vec::new());
    };
    let coordinates = geometry.get("coordinates");

    let polygons: Vec<Polygon<f64>> = match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => coordinates.and_then(parse_polygon).into_iter().collect(),
        Some("MultiPolygon") => coordinates
            .and_then(Value::as_array)
            .map(|polys| polys.iter().filter_map(parse_polygon).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    MultiPolygon::new(polygons)
}

fn parse_polygon(rings: &Value) -> Option<Polygon<f64>> {
    let mut rings = rings.as_array()?.iter().filter_map(parse_ring);
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(ring: &Value) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = ring
        .as_array()?
        .iter()
        .filter_map(|point| {
            let point = point.as_array()?;
            Some(Coord {
                x: point.first()?.as_f64()?,
                y: point.get(1)?.as_f64()?,
            })
        })
        .collect();

    if coords.is_empty() {
        None
    } else {
        Some(LineString::new(coords))
    }
}
