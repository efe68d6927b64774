use dashboard_core::time_utils::TimezoneHandler;
use dashboard_data::aggregator::{ChartBucket, ValueCount, WindowStats};
use dashboard_data::analysis::PeriodReport;

/// Width of the sparkline drawn under the summary.
const SPARK_WIDTH: usize = 60;
const SPARK_LEVELS: &[char] = &[' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the report as pretty JSON.
pub fn render_json(report: &PeriodReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the report as a plain-text summary.
pub fn render_text(report: &PeriodReport, tz: &TimezoneHandler) -> String {
    let mut out = String::new();
    let cmp = &report.comparison;

    let window = match report.current_cutoff {
        Some(cutoff) => format!(
            "{} → {}",
            tz.format_local(cutoff),
            tz.format_local(report.reference)
        ),
        None => format!("all time → {}", tz.format_local(report.reference)),
    };
    out.push_str(&format!("Period: {} ({})\n", report.period, window));
    out.push('\n');

    out.push_str(&format!(
        "  Requests        {:>10}  {}\n",
        cmp.current.requests,
        delta(cmp.requests_change, "%")
    ));
    out.push_str(&format!(
        "  Success rate    {:>10}  {}\n",
        optional(cmp.current.success_rate(), "%"),
        delta(cmp.success_rate_change, " pts")
    ));
    out.push_str(&format!(
        "  Response time   {:>10}  {}\n",
        optional(cmp.current.avg_response_time(), " ms"),
        delta(cmp.response_time_change, "%")
    ));
    out.push_str(&format!(
        "  Clients         {:>10}  {}\n",
        cmp.current.unique_clients,
        delta(cmp.clients_change, "%")
    ));

    if report.previous_cutoff.is_some() {
        out.push_str(&format!(
            "  Previous period {:>10}\n",
            previous_summary(&cmp.previous)
        ));
    }

    if !report.chart.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "  Activity ({} markers, {})\n",
            report.chart.len(),
            report.marker_period
        ));
        out.push_str(&format!("  {}\n", sparkline(&report.chart, SPARK_WIDTH)));
    }

    push_top(&mut out, "Top endpoints", &report.top_paths);
    push_top(&mut out, "Top locations", &report.top_locations);
    push_top(&mut out, "Top user agents", &report.top_user_agents);
    push_top(&mut out, "Top frameworks", &report.top_frameworks);
    push_top(&mut out, "Top IP addresses", &report.top_ip_addresses);
    push_top(&mut out, "Top hostnames", &report.top_hostnames);

    out
}

/// Append a titled ranking; empty rankings are skipped.
fn push_top(out: &mut String, title: &str, entries: &[ValueCount]) {
    if entries.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(&format!("  {}\n", title));
    for entry in entries {
        out.push_str(&format!("  {:>8}  {}\n", entry.count, entry.value));
    }
}

fn optional(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => "-".to_string(),
    }
}

fn delta(change: Option<f64>, unit: &str) -> String {
    match change {
        Some(c) if c > 0.0 => format!("▲ {:.1}{}", c, unit),
        Some(c) if c < 0.0 => format!("▼ {:.1}{}", c.abs(), unit),
        Some(_) => format!("= 0.0{}", unit),
        None => String::new(),
    }
}

fn previous_summary(stats: &WindowStats) -> String {
    format!("{} req", stats.requests)
}

/// Downsample bucket counts to at most `width` columns of block characters.
fn sparkline(buckets: &[ChartBucket], width: usize) -> String {
    if buckets.is_empty() || width == 0 {
        return String::new();
    }

    let per_column = buckets.len().div_ceil(width);
    let columns: Vec<u64> = buckets
        .chunks(per_column)
        .map(|chunk| chunk.iter().map(|b| b.count).sum())
        .collect();

    let max = columns.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return SPARK_LEVELS[1].to_string().repeat(columns.len());
    }

    let top = (SPARK_LEVELS.len() - 1) as u64;
    columns
        .iter()
        .map(|&c| {
            let level = if c == 0 { 0 } else { (c * top).div_ceil(max) };
            SPARK_LEVELS[level as usize]
        })
        .collect()
}
