//! Upazila name search
//!
//! Built once from the geometry dataset. Queries are case-insensitive
//! substring matches returned in dataset order, without ranking.

use serde::Serialize;

use crate::geometry::{Bounds, GeometryDataset};

/// Shortest term that produces results
pub const MIN_QUERY_LEN: usize = 2;
/// Most results returned per query
pub const MAX_RESULTS: usize = 10;

/// A searchable upazila
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub name: String,
    pub district: String,
    pub division: String,
    /// Box the map frames when this entry is selected
    pub bounds: Option<Bounds>,
    #[serde(skip)]
    name_lower: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn build(dataset: &GeometryDataset) -> Self {
        let entries = dataset
            .features()
            .iter()
            .filter(|f| !f.name.is_empty())
            .map(|f| SearchEntry {
                name: f.name.clone(),
                district: f.district.clone(),
                division: f.division.clone(),
                bounds: f.bounds,
                name_lower: f.name.to_lowercase(),
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match `term` against entry names.
    ///
    /// Terms shorter than [`MIN_QUERY_LEN`] characters after trimming yield
    /// nothing.
    pub fn query(&self, term: &str) -> Vec<&SearchEntry> {
        let term = term.trim().to_lowercase();
        if term.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| entry.name_lower.contains(&term))
            .take(MAX_RESULTS)
            .collect()
    }
}
