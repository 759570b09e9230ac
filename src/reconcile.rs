//! Reconciliation index
//!
//! Built in one pass from the decoded feed rows. An index is never patched:
//! every feed tick builds a fresh one, so the code map and the three
//! categorized lists always describe the same fetch.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::feed::FeedRow;
use crate::status::StatusClass;

/// Current status of one upazila as reported by the sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub code: String,
    pub name: String,
    pub district: String,
    pub division: String,
    /// Status text exactly as entered in the sheet
    pub raw_status: Option<String>,
}

impl StatusRecord {
    /// Derived from `raw_status` on every call.
    pub fn status_class(&self) -> StatusClass {
        StatusClass::classify(self.raw_status.as_deref())
    }
}

/// Code map plus the done / ongoing / todo lists of one feed tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationIndex {
    /// Accepted records in sheet order
    records: Vec<StatusRecord>,
    by_code: HashMap<String, usize>,
    done: Vec<usize>,
    ongoing: Vec<usize>,
    todo: Vec<usize>,
}

impl ReconciliationIndex {
    /// Build the index from decoded rows.
    ///
    /// Rows need both a code and a name. When two rows share a code the later
    /// row replaces the earlier one; list membership is derived afterwards
    /// from the surviving records only.
    pub fn build(rows: &[FeedRow]) -> Self {
        let mut latest: HashMap<&str, &FeedRow> = HashMap::with_capacity(rows.len());
        let mut skipped = 0usize;

        for row in rows {
            if row.code.trim().is_empty() {
                debug!(row = row.index, "Skipping row with empty code");
                skipped += 1;
                continue;
            }
            if row.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                debug!(row = row.index, code = %row.code, "Skipping row without name");
                skipped += 1;
                continue;
            }
            if let Some(previous) = latest.insert(row.code.as_str(), row) {
                debug!(
                    code = %row.code,
                    replaced_row = previous.index,
                    row = row.index,
                    "Duplicate code, later row wins"
                );
            }
        }

        let mut survivors: Vec<&FeedRow> = latest.into_values().collect();
        survivors.sort_by_key(|row| row.index);

        let mut index = ReconciliationIndex::default();
        for row in survivors {
            let record = StatusRecord {
                code: row.code.clone(),
                name: row.name.clone().unwrap_or_default(),
                district: row.district.clone().unwrap_or_default(),
                division: row.division.clone().unwrap_or_default(),
                raw_status: row.status.clone(),
            };

            let position = index.records.len();
            match record.status_class() {
                StatusClass::Done => index.done.push(position),
                StatusClass::Ongoing => index.ongoing.push(position),
                StatusClass::Todo => index.todo.push(position),
                StatusClass::Unclassified => {
                    debug!(
                        code = %record.code,
                        status = ?record.raw_status,
                        "Status not recognized"
                    );
                }
            }
            index.by_code.insert(record.code.clone(), position);
            index.records.push(record);
        }

        debug!(
            accepted = index.records.len(),
            skipped,
            "Built reconciliation index"
        );
        index
    }

    /// Look up a record by administrative code.
    pub fn get(&self, code: &str) -> Option<&StatusRecord> {
        self.by_code.get(code).map(|&i| &self.records[i])
    }

    /// All accepted records in sheet order
    pub fn records(&self) -> &[StatusRecord] {
        &self.records
    }

    /// Number of accepted records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one categorized list, in sheet order.
    ///
    /// `Unclassified` has no list and always yields nothing.
    pub fn list(&self, class: StatusClass) -> Vec<&StatusRecord> {
        let positions: &[usize] = match class {
            StatusClass::Done => &self.done,
            StatusClass::Ongoing => &self.ongoing,
            StatusClass::Todo => &self.todo,
            StatusClass::Unclassified => &[],
        };
        positions.iter().map(|&i| &self.records[i]).collect()
    }

    /// Size of one categorized list
    pub fn list_len(&self, class: StatusClass) -> usize {
        match class {
            StatusClass::Done => self.done.len(),
            StatusClass::Ongoing => self.ongoing.len(),
            StatusClass::Todo => self.todo.len(),
            StatusClass::Unclassified => 0,
        }
    }
}
