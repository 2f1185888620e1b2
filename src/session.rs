//! Session-scoped driver turning read outcomes into reportable results.

use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::observability::metrics;
use crate::parser::{AbortReason, LogClock, ReadOutcome, read_run};
use crate::source::LineSource;
use crate::timing::{BrokenRunSummary, RelativeRun, to_relative};

/// Result of one attempt, as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RelativeRun),
    Aborted {
        run_number: u32,
        reason: AbortReason,
        require_start: bool,
        broken: Option<BrokenRunSummary>,
    },
    Bugged {
        run_number: u32,
        reasons: Vec<String>,
    },
}

impl RunOutcome {
    #[must_use]
    pub fn run_number(&self) -> u32 {
        match self {
            Self::Completed(run) => run.run_number,
            Self::Aborted { run_number, .. } | Self::Bugged { run_number, .. } => *run_number,
        }
    }
}

/// Running minimum of run lengths.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestRunTracker {
    best: Option<f64>,
}

impl BestRunTracker {
    /// Marks `run` as best so far when it beats every earlier run.
    pub fn observe(&mut self, run: &mut RelativeRun) -> bool {
        let length = run.length();
        if self.best.is_some_and(|best| length >= best) {
            return false;
        }
        self.best = Some(length);
        run.best_run_yet = true;
        metrics::set_session_best(length);
        true
    }

    #[must_use]
    pub const fn best(&self) -> Option<f64> {
        self.best
    }

    /// Marks the single fastest completed run in `outcomes`.
    ///
    /// Ties go to the earliest run.
    pub fn mark_best(outcomes: &mut [RunOutcome]) {
        let fastest = outcomes
            .iter_mut()
            .filter_map(|outcome| match outcome {
                RunOutcome::Completed(run) => Some(run),
                _ => None,
            })
            .reduce(|best, run| if run.length() < best.length() { run } else { best });
        if let Some(run) = fastest {
            run.best_run = true;
        }
    }
}

/// Outcome counts of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    /// Every attempt, whatever its outcome.
    pub runs: usize,
    pub completed: usize,
}

impl SessionTally {
    fn count(&mut self, outcome: &RunOutcome) {
        self.runs += 1;
        if matches!(outcome, RunOutcome::Completed(_)) {
            self.completed += 1;
        }
    }

    #[must_use]
    pub fn of(outcomes: &[RunOutcome]) -> Self {
        let mut tally = Self::default();
        for outcome in outcomes {
            tally.count(outcome);
        }
        tally
    }
}

/// State shared by every attempt read from one log.
///
/// A streaming session only holds the latest outcome, so following a log
/// for hours does not accumulate history.
#[derive(Debug)]
pub struct Session {
    clock: LogClock,
    tracker: BestRunTracker,
    tally: SessionTally,
    history: Option<Vec<RunOutcome>>,
    latest: Option<RunOutcome>,
    require_start: bool,
    created_at: NaiveDateTime,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session keeping every outcome, for one-shot analysis.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: Some(Vec::new()),
            ..Self::streaming()
        }
    }

    /// Session keeping only the latest outcome.
    #[must_use]
    pub fn streaming() -> Self {
        Self {
            clock: LogClock::default(),
            tracker: BestRunTracker::default(),
            tally: SessionTally::default(),
            history: None,
            latest: None,
            require_start: true,
            created_at: Local::now().naive_local(),
        }
    }

    /// Reads the next attempt from `source`.
    ///
    /// Returns `Ok(None)` once the source is exhausted; an attempt cut off
    /// by the end of the source is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the source fails.
    pub fn next_outcome<S: LineSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<&RunOutcome>, SourceError> {
        let run_number = u32::try_from(self.tally.runs + 1).unwrap_or(u32::MAX);
        let outcome = match read_run(source, &mut self.clock, run_number, self.require_start)? {
            ReadOutcome::EndOfStream => return Ok(None),
            ReadOutcome::Completed(run) => {
                self.require_start = true;
                let mut rel = to_relative(&run);
                let best = self.tracker.observe(&mut rel);
                info!(
                    run = run_number,
                    length = rel.length(),
                    best_so_far = best,
                    bugged = rel.bugged,
                    "run completed"
                );
                metrics::record_run_completed(rel.length());
                RunOutcome::Completed(rel)
            }
            ReadOutcome::Aborted {
                partial,
                reason,
                require_start,
            } => {
                self.require_start = require_start;
                let broken = reason.keeps_partial().then(|| BrokenRunSummary::from(&partial));
                info!(run = run_number, %reason, "run aborted");
                metrics::record_run_aborted(reason);
                RunOutcome::Aborted {
                    run_number,
                    reason,
                    require_start,
                    broken,
                }
            }
            ReadOutcome::Bugged { partial, reasons } => {
                self.require_start = true;
                warn!(run = partial.run_number, reasons = ?reasons, "run is bugged");
                metrics::record_run_bugged();
                RunOutcome::Bugged {
                    run_number: partial.run_number,
                    reasons,
                }
            }
        };
        self.tally.count(&outcome);
        match &mut self.history {
            Some(history) => {
                history.push(outcome);
                Ok(history.last())
            }
            None => Ok(Some(&*self.latest.insert(outcome))),
        }
    }

    /// Reads every remaining attempt and marks the best run.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the source fails.
    pub fn read_all<S: LineSource + ?Sized>(
        mut self,
        source: &mut S,
    ) -> Result<Vec<RunOutcome>, SourceError> {
        while self.next_outcome(source)?.is_some() {}
        let mut outcomes = self.history.unwrap_or_default();
        BestRunTracker::mark_best(&mut outcomes);
        Ok(outcomes)
    }

    #[must_use]
    pub const fn tally(&self) -> SessionTally {
        self.tally
    }

    #[must_use]
    pub const fn clock(&self) -> &LogClock {
        &self.clock
    }

    /// Wall-clock time of the latest heist start, used to name records.
    ///
    /// Falls back to the session creation time when the log did not say
    /// when it was started.
    #[must_use]
    pub fn run_timestamp(&self) -> NaiveDateTime {
        let base = self.clock.session_start.unwrap_or(self.created_at);
        let offset = self
            .clock
            .last_heist_start
            .and_then(|secs| std::time::Duration::try_from_secs_f64(secs.max(0.0)).ok())
            .and_then(|d| TimeDelta::from_std(d).ok())
            .unwrap_or_default();
        base.checked_add_signed(offset).unwrap_or(base)
    }
}
