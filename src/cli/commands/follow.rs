//! Live following of the game's log.
//!
//! The query server runs on the async runtime while the log is parsed on a
//! blocking worker. The worker is the only writer of the published run.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::signal::shutdown_signal;
use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, SourceError};
use crate::observability::{Event, EventEmitter, SessionMode};
use crate::publish::{ParserStatus, Publisher, RunRecord, RunStore};
use crate::report;
use crate::server::{QueryServer, write_port_file};
use crate::session::{RunOutcome, Session};
use crate::source::{FollowCursor, FollowSource};

/// Delay between checks for a log file that does not exist yet.
pub const MISSING_LOG_RETRY: Duration = Duration::from_secs(1);

/// Follows the configured log until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the query server cannot start or the log cannot be
/// read, and [`AnalyzerError::Interrupted`] once a signal stopped following.
pub async fn run(config: AnalyzerConfig, events: Arc<EventEmitter>) -> Result<(), AnalyzerError> {
    run_with_shutdown(config, events, shutdown_signal()).await
}

/// Follows the configured log until `shutdown` resolves to an exit code.
///
/// # Errors
///
/// Same as [`run`]; the interruption carries the code `shutdown` produced.
pub async fn run_with_shutdown(
    config: AnalyzerConfig,
    events: Arc<EventEmitter>,
    shutdown: impl Future<Output = i32> + Send + 'static,
) -> Result<(), AnalyzerError> {
    let cancel = CancellationToken::new();
    let (code_tx, mut code_rx) = oneshot::channel();
    let signal_cancel = cancel.clone();
    let watcher = tokio::spawn(async move {
        let code = shutdown.await;
        let _ = code_tx.send(code);
        signal_cancel.cancel();
    });

    let result = run_until(config, events, cancel).await;
    watcher.abort();
    result?;
    code_rx
        .try_recv()
        .map_or(Ok(()), |code| Err(AnalyzerError::Interrupted { code }))
}

/// Follows the configured log until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the query server cannot start or the log cannot be
/// read.
pub async fn run_until(
    config: AnalyzerConfig,
    events: Arc<EventEmitter>,
    cancel: CancellationToken,
) -> Result<(), AnalyzerError> {
    let publisher = Arc::new(Publisher::new(config.template.clone()));
    let server = QueryServer::start(Arc::clone(&publisher), 0, cancel.clone()).await?;
    write_port_file(&config.port_file, server.addr.port())?;
    info!(
        port = server.addr.port(),
        port_file = %config.port_file.display(),
        "query server port advertised"
    );

    let result = match wait_for_log(&config.log_file, &publisher, &cancel).await {
        Ok(Some(cursor)) => {
            events.emit(Event::SessionStarted {
                timestamp: Utc::now(),
                log_file: config.log_file.clone(),
                mode: SessionMode::Follow,
            });
            let empty = !std::fs::metadata(cursor.path()).is_ok_and(|m| m.len() > 0);
            publisher.set_status(if empty {
                ParserStatus::LogFileEmpty
            } else {
                ParserStatus::Listening
            });

            let worker = Worker {
                publisher: Arc::clone(&publisher),
                events,
                store: RunStore::new(&config.storage_dir),
            };
            let interval = config.poll_interval;
            let token = cancel.clone();
            tokio::task::spawn_blocking(move || worker.follow(cursor, interval, token))
                .await
                .unwrap_or_else(|e| Err(AnalyzerError::Io(std::io::Error::other(e))))
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e.into()),
    };

    cancel.cancel();
    server.join().await;
    info!("stopped following the log");
    result
}

/// Waits for the game to create its log.
///
/// Returns `None` if cancelled first.
async fn wait_for_log(
    path: &Path,
    publisher: &Publisher,
    cancel: &CancellationToken,
) -> Result<Option<FollowCursor>, SourceError> {
    let mut announced = false;
    loop {
        match FollowCursor::open(path) {
            Ok(cursor) => return Ok(Some(cursor)),
            Err(SourceError::Open { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                if !announced {
                    warn!(path = %path.display(), "log file not found, waiting for the game to create it");
                    announced = true;
                }
                publisher.set_status(ParserStatus::LogFileMissing);
            }
            Err(e) => return Err(e),
        }
        tokio::select! {
            () = cancel.cancelled() => return Ok(None),
            () = tokio::time::sleep(MISSING_LOG_RETRY) => {}
        }
    }
}

struct Worker {
    publisher: Arc<Publisher>,
    events: Arc<EventEmitter>,
    store: RunStore,
}

impl Worker {
    fn follow(
        mut self,
        cursor: FollowCursor,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Result<(), AnalyzerError> {
        info!(path = %cursor.path().display(), "following log");
        let hook_events = Arc::clone(&self.events);
        let mut source = FollowSource::new(cursor, interval, cancel).on_restart(move |restarts| {
            hook_events.emit(Event::LogRestarted {
                timestamp: Utc::now(),
                restarts,
            });
        });

        let mut session = Session::streaming();
        loop {
            let Some(outcome) = session.next_outcome(&mut source)?.cloned() else {
                break;
            };
            self.handle(&outcome, session.run_timestamp())?;
        }
        self.events.emit(Event::session_ended(session.tally()));
        Ok(())
    }

    /// Prints, records and publishes one outcome.
    fn handle(&mut self, outcome: &RunOutcome, started_at: NaiveDateTime) -> Result<(), AnalyzerError> {
        {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}", report::render_outcome(outcome))?;
            out.flush()?;
        }
        self.events.emit(Event::from_outcome(outcome));

        let record = match outcome {
            RunOutcome::Completed(run) => RunRecord::completed(run, started_at),
            RunOutcome::Aborted {
                broken: Some(broken),
                ..
            } => RunRecord::broken(broken, started_at),
            RunOutcome::Aborted { .. } | RunOutcome::Bugged { .. } => return Ok(()),
        };
        let mut value = record.render(self.publisher.template())?;
        if let Err(e) = self.store.save(&mut value) {
            error!(error = %e, dir = %self.store.dir().display(), "failed to store run record");
        }
        self.publisher.publish(value);
        Ok(())
    }
}
