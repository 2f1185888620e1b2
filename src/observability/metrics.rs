//! Prometheus metrics for run outcomes and log following.
//!
//! All recording functions are no-ops until [`init_metrics`] installs a
//! recorder, so the parser can call them unconditionally.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ServerError;
use crate::parser::AbortReason;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns [`ServerError::Metrics`] if the recorder or HTTP listener cannot
/// be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), ServerError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| ServerError::Metrics(e.to_string()))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "pt_analyzer_runs_total",
        "Attempts read from the log, by outcome"
    );
    describe_histogram!(
        "pt_analyzer_run_duration_seconds",
        "Length of completed runs in seconds"
    );
    describe_gauge!(
        "pt_analyzer_session_best_seconds",
        "Fastest run of the current session in seconds"
    );
    describe_counter!(
        "pt_analyzer_log_restarts_total",
        "Times the followed log was truncated by a game restart"
    );
    describe_counter!(
        "pt_analyzer_records_written_total",
        "Run records persisted to the storage directory"
    );
}

/// Records a completed run and its length.
pub fn record_run_completed(length_secs: f64) {
    counter!("pt_analyzer_runs_total", "outcome" => "completed").increment(1);
    histogram!("pt_analyzer_run_duration_seconds").record(length_secs);
}

/// Records an interrupted run.
pub fn record_run_aborted(reason: AbortReason) {
    let reason = match reason {
        AbortReason::NewEncounter => "new_encounter",
        AbortReason::ReturnedToTown => "returned_to_town",
        AbortReason::MissionEnded => "mission_ended",
        AbortReason::HostMigration => "host_migration",
    };
    counter!("pt_analyzer_runs_total", "outcome" => "aborted", "reason" => reason).increment(1);
}

pub fn record_run_bugged() {
    counter!("pt_analyzer_runs_total", "outcome" => "bugged").increment(1);
}

pub fn set_session_best(length_secs: f64) {
    gauge!("pt_analyzer_session_best_seconds").set(length_secs);
}

pub fn record_log_restart() {
    counter!("pt_analyzer_log_restarts_total").increment(1);
}

pub fn record_record_written() {
    counter!("pt_analyzer_records_written_total").increment(1);
}
