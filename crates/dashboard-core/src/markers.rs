//! Chart resolutions ("markers") keyed by their own short labels.
//!
//! These labels (`24h`, `7d`, …) are not the same key space as
//! [`Period`](crate::period::Period); there is no conversion between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Label selecting how many histogram buckets a chart is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MarkerPeriod {
    /// `"24h"`
    Hours24,
    /// `"7d"`
    Days7,
    /// `"30d"`
    Days30,
    /// `"60d"`
    Days60,
    /// Any other label; the caller picks its own resolution.
    Unrecognized,
}

impl MarkerPeriod {
    pub const KNOWN: [MarkerPeriod; 4] = [
        MarkerPeriod::Hours24,
        MarkerPeriod::Days7,
        MarkerPeriod::Days30,
        MarkerPeriod::Days60,
    ];

    pub fn from_label(label: &str) -> Self {
        match label {
            "24h" => MarkerPeriod::Hours24,
            "7d" => MarkerPeriod::Days7,
            "30d" => MarkerPeriod::Days30,
            "60d" => MarkerPeriod::Days60,
            other => {
                debug!("unrecognised marker period \"{}\"", other);
                MarkerPeriod::Unrecognized
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerPeriod::Hours24 => "24h",
            MarkerPeriod::Days7 => "7d",
            MarkerPeriod::Days30 => "30d",
            MarkerPeriod::Days60 => "60d",
            MarkerPeriod::Unrecognized => "unrecognized",
        }
    }

    /// Number of chart buckets, or `None` for no fixed resolution.
    pub fn markers(&self) -> Option<u32> {
        match self {
            MarkerPeriod::Hours24 => Some(38),
            MarkerPeriod::Days7 => Some(84),
            MarkerPeriod::Days30 | MarkerPeriod::Days60 => Some(120),
            MarkerPeriod::Unrecognized => None,
        }
    }

    /// Number of days of history the markers are spread across.
    pub fn span_days(&self) -> Option<u32> {
        match self {
            MarkerPeriod::Hours24 => Some(1),
            MarkerPeriod::Days7 => Some(7),
            MarkerPeriod::Days30 => Some(30),
            MarkerPeriod::Days60 => Some(60),
            MarkerPeriod::Unrecognized => None,
        }
    }
}

impl From<&str> for MarkerPeriod {
    fn from(label: &str) -> Self {
        MarkerPeriod::from_label(label)
    }
}

impl From<String> for MarkerPeriod {
    fn from(label: String) -> Self {
        MarkerPeriod::from_label(&label)
    }
}

impl From<MarkerPeriod> for String {
    fn from(period: MarkerPeriod) -> Self {
        period.as_str().to_string()
    }
}

impl fmt::Display for MarkerPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker count for a raw label, `None` meaning no fixed resolution.
pub fn period_to_markers(label: &str) -> Option<u32> {
    MarkerPeriod::from_label(label).markers()
}
