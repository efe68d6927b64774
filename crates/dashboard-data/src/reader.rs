//! JSONL discovery and loading of exported request events.
//!
//! Each line of a `.jsonl` file is one JSON object written by the analytics
//! middleware. Lines that are not JSON, or that carry no usable timestamp,
//! are skipped.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::RequestEvent;
use dashboard_core::time_utils::TimezoneHandler;
use serde_json::Value;
use tracing::{debug, warn};

const TIMESTAMP_KEYS: &[&str] = &["created_at", "createdAt", "timestamp"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.jsonl` files recursively under `data_path`, sorted by path.
pub fn find_jsonl_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load request events from a single JSONL file or a directory of them.
///
/// Events are returned sorted by `created_at`. Events sharing a
/// `request_id` are loaded once. A missing path is an error; an empty
/// directory yields no events.
pub fn load_request_events(path: &Path, tz: &TimezoneHandler) -> Result<Vec<RequestEvent>> {
    if !path.exists() {
        return Err(DashboardError::DataPathNotFound(path.to_path_buf()));
    }

    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        find_jsonl_files(path)
    };
    if files.is_empty() {
        warn!("No JSONL files found in {}", path.display());
        return Ok(Vec::new());
    }

    let mut events = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    for file in &files {
        events.extend(read_file(file, tz, &mut seen_ids)?);
    }
    events.sort_by_key(|e| e.created_at);

    debug!("Loaded {} events from {} files", events.len(), files.len());
    Ok(events)
}

/// Parse JSONL text already in memory.
pub fn parse_events(content: &str, tz: &TimezoneHandler) -> Vec<RequestEvent> {
    let mut seen_ids = HashSet::new();
    let mut events: Vec<RequestEvent> = content
        .lines()
        .filter_map(|line| parse_line(line, tz, &mut seen_ids))
        .collect();
    events.sort_by_key(|e| e.created_at);
    events
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_file(
    file_path: &Path,
    tz: &TimezoneHandler,
    seen_ids: &mut HashSet<String>,
) -> Result<Vec<RequestEvent>> {
    let file = std::fs::File::open(file_path).map_err(|source| DashboardError::FileRead {
        path: file_path.to_path_buf(),
        source,
    })?;

    let reader = std::io::BufReader::new(file);
    let mut events = Vec::new();
    let mut lines_read = 0u64;
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                debug!("Unreadable line in {}: {}", file_path.display(), e);
                continue;
            }
        };
        lines_read += 1;
        if let Some(event) = parse_line(&line, tz, seen_ids) {
            events.push(event);
        }
    }

    debug!(
        "File {}: {} lines read, {} events mapped",
        file_path.display(),
        lines_read,
        events.len()
    );
    Ok(events)
}

fn parse_line(
    line: &str,
    tz: &TimezoneHandler,
    seen_ids: &mut HashSet<String>,
) -> Option<RequestEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let data: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            debug!("Failed to parse JSON line: {}", e);
            return None;
        }
    };

    let event = map_to_request_event(&data, tz)?;
    // Only a line that produced an event claims its request id.
    if let Some(id) = str_field(&data, &["request_id", "requestId"]) {
        if !seen_ids.insert(id) {
            return None;
        }
    }
    Some(event)
}

/// Map a raw JSON object to a [`RequestEvent`], returning `None` when no
/// timestamp can be found.
fn map_to_request_event(data: &Value, tz: &TimezoneHandler) -> Option<RequestEvent> {
    let created_at = TIMESTAMP_KEYS
        .iter()
        .filter_map(|k| data.get(*k))
        .find_map(|v| tz.parse_value(v))?;

    Some(RequestEvent {
        created_at,
        path: str_field(data, &["path"]),
        method: str_field(data, &["method"]),
        status: u64_field(data, &["status", "status_code"]).and_then(|s| u16::try_from(s).ok()),
        response_time: u64_field(data, &["response_time", "responseTime"])
            .and_then(|t| u32::try_from(t).ok()),
        hostname: str_field(data, &["hostname"]),
        ip_address: str_field(data, &["ip_address", "ipAddress"]),
        location: str_field(data, &["location"]),
        user_agent: str_field(data, &["user_agent", "userAgent"]),
        framework: str_field(data, &["framework"]),
    })
}

fn str_field(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .find_map(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Accepts JSON numbers and numeric strings. Negative or non-finite values
/// count as missing.
fn u64_field(data: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().filter_map(|k| data.get(*k)).find_map(|v| match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
