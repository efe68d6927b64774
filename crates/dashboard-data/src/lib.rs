//! Data layer for the API analytics dashboard.
//!
//! Loads request events exported as JSONL, splits them into the current and
//! previous reporting windows, computes trend deltas and chart buckets, and
//! assembles the per-period report.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use dashboard_core as core;
