//! Window statistics, period-over-period deltas and chart bucketing.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use dashboard_core::markers::MarkerPeriod;
use dashboard_core::models::{EventField, RequestEvent};
use dashboard_core::window::{WindowClassifier, WindowMembership};
use serde::{Deserialize, Serialize};

// ── WindowStats ───────────────────────────────────────────────────────────────

/// Request totals accumulated over one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub requests: u64,
    /// Requests with a 2xx/3xx status.
    pub successful: u64,
    /// Requests that reported a status at all.
    pub with_status: u64,
    pub total_response_time: u64,
    /// Requests that reported a response time.
    pub timed: u64,
    pub unique_clients: usize,
}

impl WindowStats {
    /// Accumulate stats over `events`.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a RequestEvent>) -> Self {
        let mut stats = Self::default();
        let mut clients: HashSet<&str> = HashSet::new();

        for event in events {
            stats.requests += 1;
            if let Some(ok) = event.is_success() {
                stats.with_status += 1;
                if ok {
                    stats.successful += 1;
                }
            }
            if let Some(ms) = event.response_time {
                stats.total_response_time += u64::from(ms);
                stats.timed += 1;
            }
            if let Some(ip) = EventField::IpAddress.get(event) {
                clients.insert(ip);
            }
        }

        stats.unique_clients = clients.len();
        stats
    }

    /// Percentage of status-bearing requests that succeeded.
    pub fn success_rate(&self) -> Option<f64> {
        if self.with_status == 0 {
            return None;
        }
        Some(self.successful as f64 / self.with_status as f64 * 100.0)
    }

    /// Mean response time in milliseconds.
    pub fn avg_response_time(&self) -> Option<f64> {
        if self.timed == 0 {
            return None;
        }
        Some(self.total_response_time as f64 / self.timed as f64)
    }
}

// ── Partitioning ──────────────────────────────────────────────────────────────

/// Events split by window membership.
#[derive(Debug, Default)]
pub struct PartitionedEvents<'a> {
    pub current: Vec<&'a RequestEvent>,
    pub previous: Vec<&'a RequestEvent>,
    pub outside: Vec<&'a RequestEvent>,
}

/// Split `events` using a single classifier, so the whole batch shares one
/// reference instant.
pub fn partition_events<'a>(
    events: &'a [RequestEvent],
    classifier: &WindowClassifier,
) -> PartitionedEvents<'a> {
    let mut parts = PartitionedEvents::default();
    for event in events {
        match classifier.classify(event.created_at) {
            WindowMembership::Current => parts.current.push(event),
            WindowMembership::Previous => parts.previous.push(event),
            WindowMembership::Outside => parts.outside.push(event),
        }
    }
    parts
}

// ── PeriodComparison ──────────────────────────────────────────────────────────

/// Current-window stats next to the previous window's, with trend deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current: WindowStats,
    pub previous: WindowStats,
    /// Percentage change in request volume.
    pub requests_change: Option<f64>,
    /// Percentage-point change in success rate.
    pub success_rate_change: Option<f64>,
    /// Percentage change in mean response time.
    pub response_time_change: Option<f64>,
    /// Percentage change in distinct clients.
    pub clients_change: Option<f64>,
}

impl PeriodComparison {
    /// Compare the two windows. With an unbounded period there is no previous
    /// window to compare against, so the previous stats stay empty and every
    /// delta is `None`.
    pub fn compare(parts: &PartitionedEvents<'_>, classifier: &WindowClassifier) -> Self {
        let current = WindowStats::from_events(parts.current.iter().copied());
        if !classifier.period().is_bounded() {
            return Self {
                current,
                previous: WindowStats::default(),
                requests_change: None,
                success_rate_change: None,
                response_time_change: None,
                clients_change: None,
            };
        }

        let previous = WindowStats::from_events(parts.previous.iter().copied());
        let requests_change = percentage_change(current.requests as f64, previous.requests as f64);
        let success_rate_change = match (current.success_rate(), previous.success_rate()) {
            (Some(c), Some(p)) => Some(c - p),
            _ => None,
        };
        let response_time_change = match (current.avg_response_time(), previous.avg_response_time())
        {
            (Some(c), Some(p)) => percentage_change(c, p),
            _ => None,
        };
        let clients_change = percentage_change(
            current.unique_clients as f64,
            previous.unique_clients as f64,
        );

        Self {
            current,
            previous,
            requests_change,
            success_rate_change,
            response_time_change,
            clients_change,
        }
    }
}

/// `(current - previous) / previous * 100`, or `None` when `previous` is 0.
pub fn percentage_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

// ── Top values ────────────────────────────────────────────────────────────────

/// A field value and how many events carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// The `limit` most frequent values of `field`, most frequent first; ties
/// are broken alphabetically.
pub fn top_values<'a>(
    events: impl IntoIterator<Item = &'a RequestEvent>,
    field: EventField,
    limit: usize,
) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for event in events {
        if let Some(v) = field.get(event) {
            *counts.entry(v).or_default() += 1;
        }
    }

    let mut ranked: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    ranked.truncate(limit);
    ranked
}

// ── Chart bucketing ───────────────────────────────────────────────────────────

/// One histogram bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBucket {
    /// Exclusive lower edge of the bucket.
    pub start: DateTime<Utc>,
    pub count: u64,
}

/// Time range and bucket count a chart is drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub markers: u32,
}

impl ChartRange {
    /// Pick the chart range for a selection.
    ///
    /// A recognised marker period spans its own number of days back from the
    /// reference time. Otherwise the chart covers the current period window
    /// with `default_markers` buckets; for an unbounded period that window
    /// starts at the oldest event. Returns `None` when there is nothing to
    /// draw over.
    pub fn resolve(
        marker_period: MarkerPeriod,
        classifier: &WindowClassifier,
        events: &[RequestEvent],
        default_markers: u32,
    ) -> Option<Self> {
        let end = classifier.reference();
        if let (Some(markers), Some(days)) = (marker_period.markers(), marker_period.span_days()) {
            return Some(Self {
                start: end - Duration::days(i64::from(days)),
                end,
                markers,
            });
        }

        let start = match classifier.current_cutoff() {
            Some(cutoff) => cutoff,
            None => {
                let oldest = events.iter().map(|e| e.created_at).min()?;
                // Shift back one nanosecond so the oldest event is inside the
                // exclusive lower edge.
                oldest - Duration::nanoseconds(1)
            }
        };
        if start >= end || default_markers == 0 {
            return None;
        }
        Some(Self {
            start,
            end,
            markers: default_markers,
        })
    }
}

/// Count events into `range.markers` equal-width buckets over
/// `(range.start, range.end]`. Events outside the range are ignored.
pub fn bucket_events<'a>(
    events: impl IntoIterator<Item = &'a RequestEvent>,
    range: &ChartRange,
) -> Vec<ChartBucket> {
    let markers = range.markers as usize;
    if markers == 0 || range.end <= range.start {
        return Vec::new();
    }

    let span_ns = total_nanos(range.end - range.start);
    let mut counts = vec![0u64; markers];

    for event in events {
        let ts = event.created_at;
        if ts <= range.start || ts > range.end {
            continue;
        }
        let offset_ns = total_nanos(ts - range.start);
        // (start, end] maps onto indices 0..markers; the end instant falls in
        // the last bucket.
        let idx = ((offset_ns - 1) * markers as i128 / span_ns) as usize;
        counts[idx.min(markers - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let offset = span_ns * i as i128 / markers as i128;
            ChartBucket {
                start: range.start + from_nanos(offset),
                count,
            }
        })
        .collect()
}

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Full-precision nanoseconds; `Duration::num_nanoseconds` overflows past
/// roughly 292 years.
fn total_nanos(d: Duration) -> i128 {
    i128::from(d.num_seconds()) * NANOS_PER_SEC + i128::from(d.subsec_nanos())
}

fn from_nanos(nanos: i128) -> Duration {
    Duration::seconds((nanos / NANOS_PER_SEC) as i64)
        + Duration::nanoseconds((nanos % NANOS_PER_SEC) as i64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
