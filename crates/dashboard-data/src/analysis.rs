//! Report pipeline for the dashboard.
//!
//! Takes a period selection and a batch of request events, classifies the
//! whole batch against one reference instant and returns a
//! [`PeriodReport`] ready for rendering.

use std::path::Path;

use chrono::{DateTime, Utc};
use dashboard_core::error::Result;
use dashboard_core::markers::MarkerPeriod;
use dashboard_core::models::{EventField, RequestEvent};
use dashboard_core::period::Period;
use dashboard_core::time_utils::TimezoneHandler;
use dashboard_core::window::WindowClassifier;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{
    bucket_events, partition_events, top_values, ChartBucket, ChartRange, PeriodComparison,
    ValueCount,
};
use crate::reader::load_request_events;

/// How many entries the "top" lists keep.
pub const TOP_VALUES_LIMIT: usize = 10;

// ── Public types ──────────────────────────────────────────────────────────────

/// What the caller asked to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub period: Period,
    pub marker_period: MarkerPeriod,
    /// Instant the windows are measured back from.
    pub reference: DateTime<Utc>,
    /// Chart bucket count used when `marker_period` has no fixed resolution.
    pub default_markers: u32,
}

impl ReportRequest {
    pub fn new(period: Period, marker_period: MarkerPeriod, reference: DateTime<Utc>) -> Self {
        Self {
            period,
            marker_period,
            reference,
            default_markers: 100,
        }
    }

    pub fn with_default_markers(mut self, default_markers: u32) -> Self {
        self.default_markers = default_markers;
        self
    }

    /// Same selection, re-anchored at another reference instant.
    pub fn at(mut self, reference: DateTime<Utc>) -> Self {
        self.reference = reference;
        self
    }
}

/// Metadata produced alongside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub events_processed: usize,
    pub events_outside: usize,
    pub load_time_seconds: f64,
    pub analysis_time_seconds: f64,
}

/// Everything the dashboard draws for one period selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub period: Period,
    /// `None` for an unbounded period.
    pub days: Option<u32>,
    pub marker_period: MarkerPeriod,
    /// Resolution the chart was drawn with; `None` when no chart was drawn.
    pub markers: Option<u32>,
    pub reference: DateTime<Utc>,
    pub current_cutoff: Option<DateTime<Utc>>,
    pub previous_cutoff: Option<DateTime<Utc>>,
    pub comparison: PeriodComparison,
    pub chart: Vec<ChartBucket>,
    pub top_paths: Vec<ValueCount>,
    pub top_locations: Vec<ValueCount>,
    pub top_user_agents: Vec<ValueCount>,
    pub top_frameworks: Vec<ValueCount>,
    pub top_ip_addresses: Vec<ValueCount>,
    pub top_hostnames: Vec<ValueCount>,
    pub metadata: ReportMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Build a report over `events`.
pub fn analyze_events(events: &[RequestEvent], request: &ReportRequest) -> PeriodReport {
    let started = std::time::Instant::now();
    let classifier = WindowClassifier::new(request.period, request.reference);

    let parts = partition_events(events, &classifier);
    let comparison = PeriodComparison::compare(&parts, &classifier);

    let range = ChartRange::resolve(
        request.marker_period,
        &classifier,
        events,
        request.default_markers,
    );
    let chart = range
        .as_ref()
        .map(|r| bucket_events(events, r))
        .unwrap_or_default();

    // Top lists only look at the current window.
    let top = |field| top_values(parts.current.iter().copied(), field, TOP_VALUES_LIMIT);

    debug!(
        period = %request.period,
        current = parts.current.len(),
        previous = parts.previous.len(),
        outside = parts.outside.len(),
        "classified events"
    );

    PeriodReport {
        period: request.period,
        days: request.period.days(),
        marker_period: request.marker_period,
        markers: range.map(|r| r.markers),
        reference: request.reference,
        current_cutoff: classifier.current_cutoff(),
        previous_cutoff: classifier.previous_cutoff(),
        comparison,
        chart,
        top_paths: top(EventField::Path),
        top_locations: top(EventField::Location),
        top_user_agents: top(EventField::UserAgent),
        top_frameworks: top(EventField::Framework),
        top_ip_addresses: top(EventField::IpAddress),
        top_hostnames: top(EventField::Hostname),
        metadata: ReportMetadata {
            generated_at: Utc::now().to_rfc3339(),
            events_processed: events.len(),
            events_outside: parts.outside.len(),
            load_time_seconds: 0.0,
            analysis_time_seconds: started.elapsed().as_secs_f64(),
        },
    }
}

/// Load events from `path` and build a report over them.
pub fn analyze_path(
    path: &Path,
    tz: &TimezoneHandler,
    request: &ReportRequest,
) -> Result<PeriodReport> {
    let load_start = std::time::Instant::now();
    let events = load_request_events(path, tz)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut report = analyze_events(&events, request);
    report.metadata.load_time_seconds = load_time;
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone as _};
    use std::io::Write;
    use tempfile::TempDir;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn event(days_ago: i64, path: &str) -> RequestEvent {
        let mut e = RequestEvent::at(reference() - Duration::days(days_ago));
        e.path = Some(path.to_string());
        e.status = Some(200);
        e
    }

    fn events() -> Vec<RequestEvent> {
        vec![
            event(1, "/a"),
            event(2, "/a"),
            event(3, "/b"),
            event(10, "/a"),
            event(20, "/c"),
        ]
    }

    #[test]
    fn test_report_week() {
        let request = ReportRequest::new(Period::Week, MarkerPeriod::Days7, reference());
        let report = analyze_events(&events(), &request);

        assert_eq!(report.days, Some(7));
        assert_eq!(report.markers, Some(84));
        assert_eq!(report.chart.len(), 84);
        assert_eq!(report.comparison.current.requests, 3);
        assert_eq!(report.comparison.previous.requests, 1);
        assert_eq!(report.comparison.requests_change, Some(200.0));
        assert_eq!(report.metadata.events_processed, 5);
        assert_eq!(report.metadata.events_outside, 1);
        assert_eq!(report.current_cutoff, Some(reference() - Duration::days(7)));
        assert_eq!(report.previous_cutoff, Some(reference() - Duration::days(14)));

        // Top paths only look at the current window.
        assert_eq!(report.top_paths[0].value, "/a");
        assert_eq!(report.top_paths[0].count, 2);
        assert!(report.top_paths.iter().all(|v| v.value != "/c"));
    }

    #[test]
    fn test_report_top_lists_per_field() {
        let tagged = |days_ago, agent: &str, framework: &str, ip: &str, host: &str| {
            let mut e = event(days_ago, "/a");
            e.user_agent = Some(agent.to_string());
            e.framework = Some(framework.to_string());
            e.ip_address = Some(ip.to_string());
            e.hostname = Some(host.to_string());
            e.location = Some("GB".to_string());
            e
        };
        let events = vec![
            tagged(1, "curl/8", "Axum", "10.0.0.1", "api.example.com"),
            tagged(2, "curl/8", "Axum", "10.0.0.2", "api.example.com"),
            tagged(3, "Mozilla/5.0", "Express", "10.0.0.1", "eu.example.com"),
            // Previous window; must not leak into the lists.
            tagged(10, "python-requests", "Flask", "10.0.0.9", "old.example.com"),
        ];

        let request = ReportRequest::new(Period::Week, MarkerPeriod::Days7, reference());
        let report = analyze_events(&events, &request);

        let values = |list: &[ValueCount]| {
            list.iter()
                .map(|v| (v.value.clone(), v.count))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            values(&report.top_user_agents),
            vec![("curl/8".to_string(), 2), ("Mozilla/5.0".to_string(), 1)]
        );
        assert_eq!(
            values(&report.top_frameworks),
            vec![("Axum".to_string(), 2), ("Express".to_string(), 1)]
        );
        assert_eq!(
            values(&report.top_ip_addresses),
            vec![("10.0.0.1".to_string(), 2), ("10.0.0.2".to_string(), 1)]
        );
        assert_eq!(
            values(&report.top_hostnames),
            vec![
                ("api.example.com".to_string(), 2),
                ("eu.example.com".to_string(), 1)
            ]
        );
        assert_eq!(values(&report.top_locations), vec![("GB".to_string(), 3)]);
    }

    #[test]
    fn test_report_top_lists_empty_without_field_values() {
        let request = ReportRequest::new(Period::Week, MarkerPeriod::Days7, reference());
        let report = analyze_events(&events(), &request);
        assert!(report.top_user_agents.is_empty());
        assert!(report.top_frameworks.is_empty());
        assert!(report.top_ip_addresses.is_empty());
        assert!(report.top_hostnames.is_empty());
    }

    #[test]
    fn test_report_unrecognised_period_includes_everything() {
        let request = ReportRequest::new(
            Period::from_label("Lifetime"),
            MarkerPeriod::from_label("whatever"),
            reference(),
        )
        .with_default_markers(5);
        let report = analyze_events(&events(), &request);

        assert_eq!(report.days, None);
        assert_eq!(report.current_cutoff, None);
        assert_eq!(report.comparison.current.requests, 5);
        assert!(report.comparison.requests_change.is_none());
        assert_eq!(report.markers, Some(5));
        assert_eq!(report.chart.iter().map(|b| b.count).sum::<u64>(), 5);
    }

    #[test]
    fn test_report_without_events() {
        let request = ReportRequest::new(Period::AllTime, MarkerPeriod::Unrecognized, reference());
        let report = analyze_events(&[], &request);
        assert_eq!(report.markers, None);
        assert!(report.chart.is_empty());
        assert_eq!(report.comparison.current.requests, 0);
    }

    #[test]
    fn test_report_is_deterministic_for_fixed_reference() {
        let request = ReportRequest::new(Period::Month, MarkerPeriod::Days30, reference());
        let a = analyze_events(&events(), &request);
        let b = analyze_events(&events(), &request);
        assert_eq!(a.comparison, b.comparison);
        assert_eq!(a.chart, b.chart);
        assert_eq!(a.top_paths, b.top_paths);
    }

    #[test]
    fn test_report_serializes_labels() {
        let request = ReportRequest::new(Period::ThreeMonths, MarkerPeriod::Days60, reference());
        let report = analyze_events(&events(), &request);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["period"], "3 months");
        assert_eq!(value["marker_period"], "60d");
        assert_eq!(value["days"], 90);
    }

    #[test]
    fn test_request_builders() {
        let later = reference() + Duration::hours(1);
        let request = ReportRequest::new(Period::Year, MarkerPeriod::Hours24, reference())
            .with_default_markers(7)
            .at(later);
        assert_eq!(request.reference, later);
        assert_eq!(request.default_markers, 7);
        assert_eq!(request.period, Period::Year);
    }

    #[test]
    fn test_analyze_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        for e in events() {
            writeln!(file, "{}", serde_json::to_string(&e).unwrap()).unwrap();
        }

        let request = ReportRequest::new(Period::Week, MarkerPeriod::Days7, reference());
        let report = analyze_path(dir.path(), &TimezoneHandler::default(), &request).unwrap();
        assert_eq!(report.metadata.events_processed, 5);
        assert_eq!(report.comparison.current.requests, 3);
    }

    #[test]
    fn test_analyze_missing_path_errors() {
        let request = ReportRequest::new(Period::Week, MarkerPeriod::Days7, reference());
        let result = analyze_path(
            Path::new("/no/such/dir"),
            &TimezoneHandler::default(),
            &request,
        );
        assert!(result.is_err());
    }
}
