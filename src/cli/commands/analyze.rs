//! One-shot analysis of a finished log.

use std::io::Write;

use chrono::Utc;
use tracing::info;

use crate::cli::args::OutputFormat;
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::observability::{Event, EventEmitter, SessionMode};
use crate::report;
use crate::session::{RunOutcome, Session, SessionTally};
use crate::source::ReaderSource;

/// Reads every attempt in the configured log and prints the report to
/// stdout.
///
/// # Errors
///
/// Returns an error if the log cannot be read or the report cannot be
/// written.
pub fn run(config: &AnalyzerConfig, events: &EventEmitter) -> Result<(), AnalyzerError> {
    info!(path = %config.log_file.display(), "analyzing log");
    let mut source = ReaderSource::open(&config.log_file)?;
    events.emit(Event::SessionStarted {
        timestamp: Utc::now(),
        log_file: config.log_file.clone(),
        mode: SessionMode::Analyze,
    });

    let outcomes = Session::new().read_all(&mut source)?;
    for outcome in &outcomes {
        events.emit(Event::from_outcome(outcome));
    }
    events.emit(Event::session_ended(SessionTally::of(&outcomes)));

    let mut stdout = std::io::stdout().lock();
    write_report(&outcomes, config.format, &mut stdout)
}

/// Writes `outcomes` to `out` as the human report or a JSON array.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_report<W: Write>(
    outcomes: &[RunOutcome],
    format: OutputFormat,
    out: &mut W,
) -> Result<(), AnalyzerError> {
    match format {
        OutputFormat::Human => write!(out, "{}", report::render_all(outcomes))?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, outcomes)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_in_both_formats() {
        let mut human = Vec::new();
        write_report(&[], OutputFormat::Human, &mut human).unwrap();
        assert!(String::from_utf8(human).unwrap().contains("No Profit-Taker runs"));

        let mut json = Vec::new();
        write_report(&[], OutputFormat::Json, &mut json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn bugged_outcome_serializes_with_tag() {
        let outcomes = [RunOutcome::Bugged {
            run_number: 1,
            reasons: vec!["No shields were recorded in phase 4.".into()],
        }];
        let mut json = Vec::new();
        write_report(&outcomes, OutputFormat::Json, &mut json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value[0]["outcome"], "bugged");
        assert_eq!(value[0]["run_number"], 1);
    }
}
