//! Period resolution and window classification for the API analytics
//! dashboard.
//!
//! Maps reporting-period labels to day counts, chart-resolution labels to
//! marker counts, and classifies event timestamps into the current or the
//! previous comparison window relative to an explicit reference time.

pub mod error;
pub mod markers;
pub mod models;
pub mod period;
pub mod settings;
pub mod time_utils;
pub mod window;

pub use error::{DashboardError, Result};
pub use markers::{period_to_markers, MarkerPeriod};
pub use models::{EventField, RequestEvent};
pub use period::{period_to_days, Period};
pub use window::{date_in_period, date_in_prev_period, WindowClassifier, WindowMembership};
