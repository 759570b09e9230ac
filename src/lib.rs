//! zoning-dashboard: live land-zoning progress for Bangladesh upazilas
//!
//! Joins an externally edited status sheet against static upazila
//! boundaries and keeps the dashboard's view of it current:
//! - Status feed decoding and free-text status classification
//! - Reconciliation of sheet rows by administrative code
//! - Aggregate progress stats
//! - Map color join and name search over the geometry
//! - Periodic refresh with whole-snapshot publication
//! - JSON API for the map, legend, search and table surfaces

pub mod config;
pub mod dashboard;
pub mod feed;
pub mod geometry;
pub mod reconcile;
pub mod scheduler;
pub mod search;
pub mod snapshot;
pub mod stats;
pub mod status;
