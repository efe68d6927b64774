//! Current / previous window classification for event timestamps.
//!
//! For a period of `d` days and a reference instant `T`:
//!
//! * current window:  `(T - d, +inf)`
//! * previous window: `(T - 2d, T - d]`
//!
//! The cutoff instant `T - d` itself belongs to the previous window, never to
//! the current one. An unbounded period places every timestamp in both.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::period::Period;

/// Which window a timestamp falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMembership {
    Current,
    Previous,
    Outside,
}

/// Classifies timestamps against one period and one fixed reference instant.
///
/// Build one per batch so every event in the batch is judged against the
/// same "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowClassifier {
    period: Period,
    reference: DateTime<Utc>,
}

impl WindowClassifier {
    pub fn new(period: Period, reference: DateTime<Utc>) -> Self {
        Self { period, reference }
    }

    /// Classifier anchored at the current system time.
    pub fn at_now(period: Period) -> Self {
        Self::new(period, Utc::now())
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }

    /// Start of the current window (exclusive), or `None` when unbounded.
    pub fn current_cutoff(&self) -> Option<DateTime<Utc>> {
        self.period
            .days()
            .map(|d| self.reference - Duration::days(i64::from(d)))
    }

    /// Start of the previous window (exclusive), or `None` when unbounded.
    pub fn previous_cutoff(&self) -> Option<DateTime<Utc>> {
        self.period
            .days()
            .map(|d| self.reference - Duration::days(2 * i64::from(d)))
    }

    pub fn in_current(&self, timestamp: DateTime<Utc>) -> bool {
        match self.current_cutoff() {
            Some(cutoff) => timestamp > cutoff,
            None => true,
        }
    }

    pub fn in_previous(&self, timestamp: DateTime<Utc>) -> bool {
        match (self.previous_cutoff(), self.current_cutoff()) {
            (Some(prev), Some(cur)) => prev < timestamp && timestamp <= cur,
            _ => true,
        }
    }

    /// Current takes precedence, so an unbounded period always yields
    /// [`WindowMembership::Current`].
    pub fn classify(&self, timestamp: DateTime<Utc>) -> WindowMembership {
        if self.in_current(timestamp) {
            WindowMembership::Current
        } else if self.in_previous(timestamp) {
            WindowMembership::Previous
        } else {
            WindowMembership::Outside
        }
    }
}

/// `true` when `timestamp` lies in the current window of `period` as seen
/// from `reference`. Unbounded periods include everything.
pub fn date_in_period(timestamp: DateTime<Utc>, period: Period, reference: DateTime<Utc>) -> bool {
    WindowClassifier::new(period, reference).in_current(timestamp)
}

/// `true` when `timestamp` lies in the window immediately before the current
/// one, i.e. between `2 * days` and `days` before `reference`.
pub fn date_in_prev_period(
    timestamp: DateTime<Utc>,
    period: Period,
    reference: DateTime<Utc>,
) -> bool {
    WindowClassifier::new(period, reference).in_previous(timestamp)
}

/// [`date_in_period`] against the current system time.
pub fn date_in_period_now(timestamp: DateTime<Utc>, period: Period) -> bool {
    date_in_period(timestamp, period, Utc::now())
}

/// [`date_in_prev_period`] against the current system time.
pub fn date_in_prev_period_now(timestamp: DateTime<Utc>, period: Period) -> bool {
    date_in_prev_period(timestamp, period, Utc::now())
}
