//! Runtime layer for the API analytics dashboard.
//!
//! Keeps the period report fresh by rebuilding it on an interval in a
//! background task.

pub mod orchestrator;

pub use dashboard_core as core;
pub use dashboard_data as data;
