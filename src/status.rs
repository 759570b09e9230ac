//! Status classification
//!
//! Maps the free-text status typed into the sheet by field editors onto a
//! fixed set of classes. Matching is a substring test over the trimmed,
//! lowercased value, checked in a fixed precedence order.

use serde::{Deserialize, Serialize};

/// Keywords per class, in precedence order. First match wins.
const DONE_KEYWORDS: &[&str] = &["done", "complete"];
const ONGOING_KEYWORDS: &[&str] = &["ongoing", "progress"];
const TODO_KEYWORDS: &[&str] = &["todo", "pending", "to do"];

/// Normalized status of one upazila
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Done,
    Ongoing,
    Todo,
    /// Empty, absent, or unrecognized status text
    Unclassified,
}

impl StatusClass {
    /// The three classes that own a categorized list
    pub const LISTED: [StatusClass; 3] = [StatusClass::Done, StatusClass::Ongoing, StatusClass::Todo];

    /// Classify a raw status value.
    pub fn classify(raw: Option<&str>) -> Self {
        let normalized = raw.unwrap_or_default().trim().to_lowercase();
        if normalized.is_empty() {
            return StatusClass::Unclassified;
        }

        let contains_any = |keywords: &[&str]| keywords.iter().any(|k| normalized.contains(k));

        if contains_any(DONE_KEYWORDS) {
            StatusClass::Done
        } else if contains_any(ONGOING_KEYWORDS) {
            StatusClass::Ongoing
        } else if contains_any(TODO_KEYWORDS) {
            StatusClass::Todo
        } else {
            StatusClass::Unclassified
        }
    }

    /// Parse a list name as used in API paths (`done`, `ongoing`, `todo`).
    pub fn from_list_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "done" => Some(StatusClass::Done),
            "ongoing" => Some(StatusClass::Ongoing),
            "todo" => Some(StatusClass::Todo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Done => "done",
            StatusClass::Ongoing => "ongoing",
            StatusClass::Todo => "todo",
            StatusClass::Unclassified => "unclassified",
        }
    }

    /// Human-readable title for legend and table headers
    pub fn title(&self) -> &'static str {
        match self {
            StatusClass::Done => "Done",
            StatusClass::Ongoing => "Ongoing",
            StatusClass::Todo => "ToDo",
            StatusClass::Unclassified => "No data",
        }
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
