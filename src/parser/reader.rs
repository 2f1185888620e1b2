//! Assembles one attempt from a line source.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::line;
use super::machine::{AbortReason, PhaseMachine, Step};
use super::markers::ENCOUNTER_START;
use super::run::{AbsoluteRun, Phase};
use super::validate;
use crate::error::SourceError;
use crate::source::LineSource;

/// Log-wide facts picked up while reading runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogClock {
    /// Wall-clock time the game started writing the log.
    pub session_start: Option<NaiveDateTime>,
    /// Heist start (log seconds) of the most recent attempt that had one.
    pub last_heist_start: Option<f64>,
}

impl LogClock {
    fn observe(&mut self, text: &str) {
        if let Some(start) = line::session_start(text) {
            if self.session_start != Some(start) {
                info!(%start, "log session start");
            }
            self.session_start = Some(start);
        }
    }

    fn note_run(&mut self, run: &AbsoluteRun) {
        if run.heist_start.is_some() {
            self.last_heist_start = run.heist_start;
        }
    }
}

/// How a single [`read_run`] call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The fight finished and the run passed validation.
    Completed(AbsoluteRun),
    /// The attempt was interrupted by a game-state transition.
    Aborted {
        partial: AbsoluteRun,
        reason: AbortReason,
        /// Whether the next read must search for an encounter start.
        require_start: bool,
    },
    /// The fight finished but the run is structurally incomplete.
    Bugged {
        partial: AbsoluteRun,
        reasons: Vec<String>,
    },
    /// The source ran dry before the attempt finished.
    EndOfStream,
}

/// Reads lines until one attempt terminates.
///
/// With `require_start` set, lines are discarded until an encounter-start
/// marker appears. The run then goes through phases 1 to 4, the phase-3
/// pylon shields are moved to phase 4, and the result is validated.
///
/// # Errors
///
/// Only source I/O errors are returned; every parse-level failure is a
/// [`ReadOutcome`] variant.
pub fn read_run<S: LineSource + ?Sized>(
    source: &mut S,
    clock: &mut LogClock,
    run_number: u32,
    require_start: bool,
) -> Result<ReadOutcome, SourceError> {
    if require_start && !skip_to_encounter(source, clock)? {
        return Ok(ReadOutcome::EndOfStream);
    }
    debug!(run = run_number, "reading run");

    let mut run = AbsoluteRun::new(run_number);
    for phase in Phase::ALL {
        let mut machine = PhaseMachine::new(&mut run, phase);
        let step = loop {
            let Some(text) = source.next_line()? else {
                break None;
            };
            clock.observe(&text);
            match machine.feed(&text) {
                Step::Continue => {}
                step => break Some(step),
            }
        };
        match step {
            None => {
                clock.note_run(&run);
                debug!(run = run_number, %phase, "log ended mid-run");
                return Ok(ReadOutcome::EndOfStream);
            }
            Some(Step::Aborted(reason)) => {
                clock.note_run(&run);
                return Ok(ReadOutcome::Aborted {
                    partial: run,
                    reason,
                    require_start: reason.requires_start(),
                });
            }
            Some(_) => debug!(run = run_number, %phase, "phase finished"),
        }
    }
    clock.note_run(&run);

    if !run.reassign_pylon_shields() {
        return Ok(ReadOutcome::Bugged {
            partial: run,
            reasons: vec!["No shields were recorded in phase 4.".to_string()],
        });
    }

    let reasons = validate::failure_reasons(&run);
    if reasons.is_empty() {
        Ok(ReadOutcome::Completed(run))
    } else {
        Ok(ReadOutcome::Bugged {
            partial: run,
            reasons,
        })
    }
}

/// Discards lines up to and including the next encounter start.
///
/// Returns `false` when the source ended first.
fn skip_to_encounter<S: LineSource + ?Sized>(
    source: &mut S,
    clock: &mut LogClock,
) -> Result<bool, SourceError> {
    while let Some(text) = source.next_line()? {
        clock.observe(&text);
        if text.contains(ENCOUNTER_START) {
            return Ok(true);
        }
    }
    Ok(false)
}
