//! Periodic report refresh.
//!
//! Runs the report pipeline in a tokio task on a fixed interval and forwards
//! each [`PeriodReport`] through an `mpsc` channel. Every pass samples the
//! clock once and classifies the whole batch against that instant.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use dashboard_core::time_utils::TimezoneHandler;
use dashboard_data::analysis::{analyze_path, PeriodReport, ReportRequest};
use tokio::sync::mpsc;
use tokio::time;

// ── ReportOrchestrator ────────────────────────────────────────────────────────

/// Background refresh coordinator.
///
/// Call [`ReportOrchestrator::start`] to spin up the loop in a dedicated
/// tokio task and receive a channel endpoint for [`PeriodReport`] updates.
pub struct ReportOrchestrator {
    /// How often to rebuild the report.
    update_interval: Duration,
    /// JSONL event file or directory.
    data_path: PathBuf,
    /// Used to read naive event timestamps.
    timezone: TimezoneHandler,
    /// Selection to report on; its reference time is replaced on every pass.
    request: ReportRequest,
}

impl ReportOrchestrator {
    pub fn new(
        update_interval_secs: u64,
        data_path: PathBuf,
        timezone: TimezoneHandler,
        request: ReportRequest,
    ) -> Self {
        Self {
            update_interval: Duration::from_secs(update_interval_secs),
            data_path,
            timezone,
            request,
        }
    }

    /// Spawn the refresh loop. Returns the receiving end of the report
    /// channel and a handle that aborts the loop.
    pub fn start(self) -> (mpsc::Receiver<PeriodReport>, ReportHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx).await;
        });

        (rx, ReportHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Builds a report immediately, then once per `update_interval` until the
    /// receiver is dropped.
    async fn refresh_loop(self, tx: mpsc::Sender<PeriodReport>) {
        let mut interval = time::interval(self.update_interval);

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("report channel closed; exiting loop");
                break;
            }

            let Some(report) = self.build_report().await else {
                continue;
            };

            if let Err(e) = tx.send(report).await {
                tracing::debug!(error = %e, "report receiver dropped");
                break;
            }
        }
    }

    /// Run the pipeline on a blocking thread; file reads are synchronous.
    async fn build_report(&self) -> Option<PeriodReport> {
        let request = self.request.at(Utc::now());
        let path = self.data_path.clone();
        let tz = self.timezone;

        let result =
            tokio::task::spawn_blocking(move || analyze_path(&path, &tz, &request)).await;

        match result {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to build report; skipping refresh");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "report task panicked; skipping refresh");
                None
            }
        }
    }
}

// ── ReportHandle ──────────────────────────────────────────────────────────────

/// Handle to the background refresh task.
pub struct ReportHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl ReportHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
