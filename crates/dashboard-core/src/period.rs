//! Reporting periods selectable on the dashboard and their day counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A user-selected reporting window.
///
/// Labels outside the known set collapse into [`Period::AllTime`], which
/// applies no filtering. Parsing therefore never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Period {
    /// `"24 hours"`
    Day,
    /// `"Week"`
    #[default]
    Week,
    /// `"Month"`
    Month,
    /// `"3 months"`
    ThreeMonths,
    /// `"6 months"`
    SixMonths,
    /// `"Year"`
    Year,
    /// No bound: every event is in the window.
    AllTime,
}

impl Period {
    /// Every bounded period, shortest first.
    pub const BOUNDED: [Period; 6] = [
        Period::Day,
        Period::Week,
        Period::Month,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::Year,
    ];

    /// Resolve a dashboard label. Matching is exact, as the labels come
    /// straight from the UI selector.
    pub fn from_label(label: &str) -> Self {
        match label {
            "24 hours" => Period::Day,
            "Week" => Period::Week,
            "Month" => Period::Month,
            "3 months" => Period::ThreeMonths,
            "6 months" => Period::SixMonths,
            "Year" => Period::Year,
            other => {
                debug!("unrecognised period label \"{}\", treating as all time", other);
                Period::AllTime
            }
        }
    }

    /// The dashboard label for this period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "24 hours",
            Period::Week => "Week",
            Period::Month => "Month",
            Period::ThreeMonths => "3 months",
            Period::SixMonths => "6 months",
            Period::Year => "Year",
            Period::AllTime => "All time",
        }
    }

    /// Number of days the window spans, or `None` when unbounded.
    ///
    /// Months are a flat 30 days and a year is 365; existing dashboards
    /// depend on these exact values. "6 months" is 210 days.
    pub fn days(&self) -> Option<u32> {
        match self {
            Period::Day => Some(1),
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::ThreeMonths => Some(90),
            Period::SixMonths => Some(30 * 7),
            Period::Year => Some(365),
            Period::AllTime => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.days().is_some()
    }
}

impl From<&str> for Period {
    fn from(label: &str) -> Self {
        Period::from_label(label)
    }
}

impl From<String> for Period {
    fn from(label: String) -> Self {
        Period::from_label(&label)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.as_str().to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day count for a raw period label, `None` meaning no filtering.
pub fn period_to_days(label: &str) -> Option<u32> {
    Period::from_label(label).days()
}
