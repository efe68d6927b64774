use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::markers::MarkerPeriod;
use crate::period::Period;
use crate::time_utils::TimezoneHandler;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Period-over-period request analytics for exported API events
#[derive(Parser, Debug, Clone)]
#[command(
    name = "api-dashboard",
    about = "Period-over-period request analytics for exported API events",
    version
)]
pub struct Settings {
    /// Reporting period ("24 hours", "Week", "Month", "3 months", "6 months", "Year")
    #[arg(long, default_value = "Week")]
    pub period: String,

    /// Chart resolution ("24h", "7d", "30d", "60d")
    #[arg(long, default_value = "7d")]
    pub markers: String,

    /// Bucket count used when the chart resolution is not recognised
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..=10_000))]
    pub default_markers: u32,

    /// JSONL event file or directory (auto-discovered if not specified)
    #[arg(long, env = "API_DASHBOARD_DATA")]
    pub data_path: Option<PathBuf>,

    /// Reference time for window cutoffs (RFC 3339; defaults to now)
    #[arg(long)]
    pub reference_time: Option<String>,

    /// Timezone for naive timestamps and text output (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Keep running and re-print the report on every refresh
    #[arg(long)]
    pub watch: bool,

    /// Refresh rate in seconds for --watch (1-3600)
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=3600))]
    pub refresh_rate: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.api-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl LastUsedParams {
    /// Uses `~/.api-dashboard/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".api-dashboard").join("last_used.json")
    }

    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear {}: {}", config_path.display(), e);
            }
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "period") {
            if let Some(v) = last.period {
                settings.period = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "markers") {
            if let Some(v) = last.markers {
                settings.markers = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        // NOTE: clap stores the arg id using the field name (underscores).
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!("could not persist settings to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if !TimezoneHandler::validate_timezone(&settings.timezone) {
            tracing::warn!("unknown timezone \"{}\", using UTC", settings.timezone);
            settings.timezone = "UTC".to_string();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn period(&self) -> Period {
        Period::from_label(&self.period)
    }

    pub fn marker_period(&self) -> MarkerPeriod {
        MarkerPeriod::from_label(&self.markers)
    }

    pub fn timezone_handler(&self) -> TimezoneHandler {
        TimezoneHandler::new(&self.timezone)
    }

    /// The explicit `--reference-time`, if one was given.
    ///
    /// Naive values are read in the configured timezone. An unparsable value
    /// is an error rather than a silent fallback to now.
    pub fn reference_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.reference_time
            .as_deref()
            .map(|raw| self.timezone_handler().parse_required(raw))
            .transpose()
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            period: Some(s.period.clone()),
            markers: Some(s.markers.clone()),
            timezone: Some(s.timezone.clone()),
            format: Some(s.format.clone()),
            refresh_rate: Some(s.refresh_rate),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn load(tmp: &TempDir, args: &[&str]) -> Settings {
        let mut full: Vec<std::ffi::OsString> = vec!["api-dashboard".into()];
        full.extend(args.iter().map(|a| (*a).into()));
        Settings::load_with_last_used_impl(full, &tmp_config_path(tmp))
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            period: Some("Month".to_string()),
            markers: Some("30d".to_string()),
            timezone: Some("Europe/Berlin".to_string()),
            format: Some("json".to_string()),
            refresh_rate: Some(15),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.period.as_deref(), Some("Month"));
        assert_eq!(loaded.markers.as_deref(), Some("30d"));
        assert_eq!(loaded.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(loaded.format.as_deref(), Some("json"));
        assert_eq!(loaded.refresh_rate, Some(15));
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).period.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).period.is_none());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
        // Clearing a missing file is fine.
        LastUsedParams::clear_at(&path).expect("clear again");
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["api-dashboard"]);
        assert_eq!(settings.period, "Week");
        assert_eq!(settings.markers, "7d");
        assert_eq!(settings.default_markers, 100);
        assert!(settings.reference_time.is_none());
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.format, "text");
        assert!(!settings.watch);
        assert_eq!(settings.refresh_rate, 60);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_accepts_unknown_period_label() {
        let settings = Settings::parse_from(["api-dashboard", "--period", "Decade"]);
        assert_eq!(settings.period(), Period::AllTime);
    }

    #[test]
    fn test_settings_typed_accessors() {
        let settings = Settings::parse_from([
            "api-dashboard",
            "--period",
            "3 months",
            "--markers",
            "60d",
        ]);
        assert_eq!(settings.period(), Period::ThreeMonths);
        assert_eq!(settings.marker_period(), MarkerPeriod::Days60);
    }

    #[test]
    fn test_reference_time_parsing() {
        let mut settings = Settings::parse_from([
            "api-dashboard",
            "--reference-time",
            "2024-06-15T12:00:00Z",
        ]);
        settings.timezone = "UTC".to_string();
        assert_eq!(
            settings.reference_time().unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
        );

        settings.reference_time = Some("whenever".to_string());
        let err = settings.reference_time().unwrap_err();
        assert_eq!(err.to_string(), "Invalid timestamp format: whenever");

        settings.reference_time = None;
        assert_eq!(settings.reference_time().unwrap(), None);
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_period() {
        let tmp = TempDir::new().expect("tempdir");
        LastUsedParams {
            period: Some("Year".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        }
        .save_to(&tmp_config_path(&tmp))
        .expect("save");

        let settings = load(&tmp, &[]);
        assert_eq!(settings.period, "Year");
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        LastUsedParams {
            period: Some("Year".to_string()),
            markers: Some("60d".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        }
        .save_to(&tmp_config_path(&tmp))
        .expect("save");

        let settings = load(&tmp, &["--period", "Month"]);
        assert_eq!(settings.period, "Month");
        assert_eq!(settings.markers, "60d");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");

        load(&tmp, &["--clear", "--timezone", "UTC"]);
        assert!(!path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = load(&tmp, &["--debug", "--timezone", "UTC"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_invalid_timezone_falls_back() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = load(&tmp, &["--timezone", "Mars/Olympus"]);
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        load(&tmp, &["--period", "24 hours", "--timezone", "UTC"]);

        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert_eq!(loaded.period.as_deref(), Some("24 hours"));
        assert_eq!(loaded.timezone.as_deref(), Some("UTC"));
    }
}
