//! Column schema for the status sheet
//!
//! The sheet export carries no usable header names, so every value is read
//! from a fixed column offset. The schema makes that contract explicit and
//! is checked once at startup.

use serde::{Deserialize, Serialize};

/// Role of a sheet column consumed by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Division,
    District,
    Name,
    Status,
    Code,
}

/// Zero-based column offsets for each role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    #[serde(default = "default_division")]
    pub division: usize,
    #[serde(default = "default_district")]
    pub district: usize,
    #[serde(default = "default_name")]
    pub name: usize,
    #[serde(default = "default_status")]
    pub status: usize,
    #[serde(default = "default_code")]
    pub code: usize,
}

fn default_division() -> usize { 2 }
fn default_district() -> usize { 3 }
fn default_name() -> usize { 4 }
fn default_status() -> usize { 5 }
fn default_code() -> usize { 6 }

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            division: default_division(),
            district: default_district(),
            name: default_name(),
            status: default_status(),
            code: default_code(),
        }
    }
}

impl ColumnSchema {
    /// Roles in column order
    pub fn columns(&self) -> Vec<(ColumnRole, usize)> {
        let mut columns = vec![
            (ColumnRole::Division, self.division),
            (ColumnRole::District, self.district),
            (ColumnRole::Name, self.name),
            (ColumnRole::Status, self.status),
            (ColumnRole::Code, self.code),
        ];
        columns.sort_by_key(|(_, offset)| *offset);
        columns
    }

    pub fn offset(&self, role: ColumnRole) -> usize {
        match role {
            ColumnRole::Division => self.division,
            ColumnRole::District => self.district,
            ColumnRole::Name => self.name,
            ColumnRole::Status => self.status,
            ColumnRole::Code => self.code,
        }
    }

    /// Number of cells a row needs to carry every role
    pub fn min_width(&self) -> usize {
        self.columns()
            .last()
            .map(|(_, offset)| offset + 1)
            .unwrap_or(0)
    }

    /// Reject schemas where two roles share a column.
    pub fn validate(&self) -> Result<(), String> {
        let columns = self.columns();
        for pair in columns.windows(2) {
            if pair[0].1 == pair[1].1 {
                return Err(format!(
                    "Columns {:?} and {:?} both map to offset {}",
                    pair[0].0, pair[1].0, pair[0].1
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offsets() {
        let schema = ColumnSchema::default();
        assert_eq!(schema.offset(ColumnRole::Division), 2);
        assert_eq!(schema.offset(ColumnRole::Code), 6);
        assert_eq!(schema.min_width(), 7);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_duplicate_offset_rejected() {
        let schema = ColumnSchema {
            status: 4,
            ..ColumnSchema::default()
        };
        let err = schema.validate().unwrap_err();
        assert!(err.contains("offset 4"));
    }

    #[test]
    fn test_columns_sorted_by_offset() {
        let schema = ColumnSchema {
            division: 9,
            ..ColumnSchema::default()
        };
        let roles: Vec<ColumnRole> = schema.columns().into_iter().map(|(r, _)| r).collect();
        assert_eq!(roles.last(), Some(&ColumnRole::Division));
        assert_eq!(schema.min_width(), 10);
    }
}
