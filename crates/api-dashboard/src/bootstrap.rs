use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.api-dashboard/` and `~/.api-dashboard/logs/` exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

fn ensure_directories_in(home: &Path) -> anyhow::Result<()> {
    let dashboard_dir = home.join(".api-dashboard");
    std::fs::create_dir_all(dashboard_dir.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `DEBUG`/`INFO`/`WARNING`/`ERROR`/`CRITICAL` level name to a tracing
/// filter directive.
fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to `log_file` when given, otherwise to stderr so they never mix
/// with the report on stdout.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Locate exported request events when `--data-path` is not given.
///
/// Checks, in order:
/// 1. `./analytics/`
/// 2. `~/.api-dashboard/events/`
pub fn discover_data_path() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok();
    let home = dirs::home_dir();
    discover_in(cwd.as_deref(), home.as_deref())
}

fn discover_in(cwd: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    let candidates = [
        cwd.map(|d| d.join("analytics")),
        home.map(|h| h.join(".api-dashboard").join("events")),
    ];
    candidates.into_iter().flatten().find(|p| p.exists())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
