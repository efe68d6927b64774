mod bootstrap;
mod render;

use anyhow::{Context, Result};
use chrono::Utc;
use dashboard_core::settings::Settings;
use dashboard_core::time_utils::TimezoneHandler;
use dashboard_data::analysis::{analyze_path, PeriodReport, ReportRequest};
use dashboard_runtime::orchestrator::ReportOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("API dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Period: {}, Markers: {}, Timezone: {}",
        settings.period(),
        settings.marker_period(),
        settings.timezone
    );

    let data_path = settings
        .data_path
        .clone()
        .or_else(bootstrap::discover_data_path)
        .context("no event data found; pass --data-path")?;
    let tz = settings.timezone_handler();
    let explicit_reference = settings.reference_time()?;

    let request = ReportRequest::new(
        settings.period(),
        settings.marker_period(),
        explicit_reference.unwrap_or_else(Utc::now),
    )
    .with_default_markers(settings.default_markers);

    if !settings.watch {
        let report = analyze_path(&data_path, &tz, &request)?;
        print_report(&report, &settings.format, &tz)?;
        return Ok(());
    }

    if explicit_reference.is_some() {
        tracing::warn!("--reference-time is ignored in watch mode; each refresh uses the current time");
    }

    tracing::info!("Watching {} every {}s", data_path.display(), settings.refresh_rate);
    let orchestrator =
        ReportOrchestrator::new(u64::from(settings.refresh_rate), data_path, tz, request);
    let (mut rx, handle) = orchestrator.start();

    loop {
        tokio::select! {
            report = rx.recv() => match report {
                Some(report) => print_report(&report, &settings.format, &tz)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping refresh loop");
                break;
            }
        }
    }
    handle.abort();

    Ok(())
}

fn print_report(report: &PeriodReport, format: &str, tz: &TimezoneHandler) -> Result<()> {
    match format {
        "json" => println!("{}", render::render_json(report)?),
        _ => println!("{}", render::render_text(report, tz)),
    }
    Ok(())
}
