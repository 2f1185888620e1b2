//! Structured event stream for `pt-analyzer`.
//!
//! Discrete, typed events emitted while analyzing a log. Events are
//! serialized as newline-delimited JSON (JSONL) and include a monotonically
//! increasing sequence number for ordering guarantees.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::parser::AbortReason;
use crate::session::{RunOutcome, SessionTally};

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// How the analyzer consumes the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// One pass over a finished file.
    Analyze,
    /// Live tailing of the game's log.
    Follow,
}

/// A discrete event emitted during analysis.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Analysis of a log file has begun.
    SessionStarted {
        timestamp: DateTime<Utc>,
        log_file: PathBuf,
        mode: SessionMode,
    },

    /// A run finished and was converted to relative timings.
    RunCompleted {
        timestamp: DateTime<Utc>,
        run_number: u32,
        /// Ranking length in seconds.
        length: f64,
        best_so_far: bool,
        bugged: bool,
    },

    /// A run was interrupted by a game-state transition.
    RunAborted {
        timestamp: DateTime<Utc>,
        run_number: u32,
        reason: AbortReason,
        /// Estimated length of the abandoned attempt, when known.
        estimated_length: Option<f64>,
    },

    /// A run finished but could not be converted.
    RunBugged {
        timestamp: DateTime<Utc>,
        run_number: u32,
        reasons: Vec<String>,
    },

    /// The followed log was truncated by a game restart.
    LogRestarted {
        timestamp: DateTime<Utc>,
        /// Restarts seen so far in this session.
        restarts: u64,
    },

    /// Analysis stopped.
    SessionEnded {
        timestamp: DateTime<Utc>,
        runs: usize,
        completed: usize,
    },
}

impl Event {
    /// Builds the event describing `outcome`.
    #[must_use]
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let timestamp = Utc::now();
        match outcome {
            RunOutcome::Completed(run) => Self::RunCompleted {
                timestamp,
                run_number: run.run_number,
                length: run.length(),
                best_so_far: run.best_run_yet,
                bugged: run.bugged,
            },
            RunOutcome::Aborted {
                run_number,
                reason,
                broken,
                ..
            } => Self::RunAborted {
                timestamp,
                run_number: *run_number,
                reason: *reason,
                estimated_length: broken.as_ref().map(|b| b.total_time),
            },
            RunOutcome::Bugged {
                run_number,
                reasons,
            } => Self::RunBugged {
                timestamp,
                run_number: *run_number,
                reasons: reasons.clone(),
            },
        }
    }

    /// Builds the end-of-session summary for `outcomes`.
    #[must_use]
    pub fn session_ended(tally: SessionTally) -> Self {
        Self::SessionEnded {
            timestamp: Utc::now(),
            runs: tally.runs,
            completed: tally.completed,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are silently dropped so the event stream
/// can never interrupt parsing.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that appends to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
