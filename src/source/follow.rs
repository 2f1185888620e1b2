//! Live tailing of a growing log file.
//!
//! The game appends to `EE.log` while it runs and truncates it when it is
//! restarted. [`FollowCursor`] is a non-blocking cursor over the file that
//! detects the truncation by comparing the file size against the size seen
//! at the previous poll. A log deleted and recreated under the same name is
//! caught by its file identity instead, since the new file may already be
//! larger than the old one. [`FollowSource`] drives the cursor as a blocking
//! [`LineSource`] by sleeping between polls.

use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{LineSource, decode_line};
use crate::error::SourceError;
use crate::observability::metrics;

/// Default delay between two polls of the followed file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a single non-blocking poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// A complete line (terminator stripped).
    Line(String),
    /// No complete line is available yet.
    WouldBlock,
}

/// Identity of the file a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileId {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    created: Option<std::time::SystemTime>,
}

impl FileId {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    #[cfg(not(unix))]
    fn of(meta: &Metadata) -> Self {
        Self {
            created: meta.created().ok(),
        }
    }
}

/// Non-blocking cursor over a file that is being appended to.
///
/// Incomplete trailing lines are buffered until their newline arrives and
/// are never yielded partially.
#[derive(Debug)]
pub struct FollowCursor {
    path: PathBuf,
    reader: BufReader<File>,
    /// File size observed at the previous poll.
    known_size: u64,
    file_id: FileId,
    /// Bytes of a line whose terminator has not been written yet.
    pending: Vec<u8>,
    restarts: u64,
}

impl FollowCursor {
    /// Opens `path` and positions the cursor at the start of the file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Open`] if the file cannot be opened or stat'ed.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let (reader, meta) = open_at_start(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            known_size: meta.len(),
            file_id: FileId::of(&meta),
            pending: Vec::new(),
            restarts: 0,
        })
    }

    /// Returns the next complete line, or [`Poll::WouldBlock`] when the
    /// reader has caught up with the writer.
    ///
    /// When the file shrank since the previous poll, or the path now names a
    /// different file, the producer is assumed to have restarted: the file is
    /// reopened and read from offset zero.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if reading or reopening the file fails.
    pub fn poll_line(&mut self) -> Result<Poll, SourceError> {
        loop {
            let n = self
                .reader
                .read_until(b'\n', &mut self.pending)
                .map_err(|source| SourceError::Read {
                    path: self.path.clone(),
                    source,
                })?;

            if n > 0 {
                if self.pending.ends_with(b"\n") {
                    let line = decode_line(&self.pending);
                    self.pending.clear();
                    return Ok(Poll::Line(line));
                }
                // Partial line: the writer has not flushed the rest yet.
                continue;
            }

            let Some(meta) = self.current_metadata()? else {
                return Ok(Poll::WouldBlock);
            };
            let size = meta.len();
            if size < self.known_size || FileId::of(&meta) != self.file_id {
                self.restart(size)?;
                continue;
            }
            self.known_size = size;
            return Ok(Poll::WouldBlock);
        }
    }

    /// Number of producer restarts detected so far.
    #[must_use]
    pub const fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Path of the followed file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current_metadata(&self) -> Result<Option<Metadata>, SourceError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta)),
            // The game deletes and recreates the log on some restarts.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SourceError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn restart(&mut self, new_size: u64) -> Result<(), SourceError> {
        info!(
            path = %self.path.display(),
            previous_size = self.known_size,
            new_size,
            "log restart detected, reading from the beginning"
        );
        let (reader, meta) = open_at_start(&self.path)?;
        self.reader = reader;
        self.known_size = new_size;
        self.file_id = FileId::of(&meta);
        self.pending.clear();
        self.restarts += 1;
        metrics::record_log_restart();
        Ok(())
    }
}

fn open_at_start(path: &Path) -> Result<(BufReader<File>, Metadata), SourceError> {
    let open_err = |source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_err)?;
    let meta = file.metadata().map_err(open_err)?;
    Ok((BufReader::new(file), meta))
}

/// Called with the running restart count after each detected restart.
pub type RestartHook = Box<dyn FnMut(u64) + Send>;

/// Blocking [`LineSource`] over a [`FollowCursor`].
///
/// Sleeps `interval` whenever the cursor would block. End-of-stream is only
/// reported after `cancel` fires.
pub struct FollowSource {
    cursor: FollowCursor,
    interval: Duration,
    cancel: CancellationToken,
    seen_restarts: u64,
    on_restart: Option<RestartHook>,
}

impl std::fmt::Debug for FollowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowSource")
            .field("cursor", &self.cursor)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl FollowSource {
    #[must_use]
    pub fn new(cursor: FollowCursor, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            seen_restarts: cursor.restarts(),
            cursor,
            interval,
            cancel,
            on_restart: None,
        }
    }

    /// Registers a callback for producer restarts.
    #[must_use]
    pub fn on_restart(mut self, hook: impl FnMut(u64) + Send + 'static) -> Self {
        self.on_restart = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub const fn cursor(&self) -> &FollowCursor {
        &self.cursor
    }
}

impl LineSource for FollowSource {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            if self.cancel.is_cancelled() {
                debug!(path = %self.cursor.path().display(), "follow cancelled");
                return Ok(None);
            }
            let poll = self.cursor.poll_line()?;
            if self.cursor.restarts() != self.seen_restarts {
                self.seen_restarts = self.cursor.restarts();
                if let Some(hook) = self.on_restart.as_mut() {
                    hook(self.seen_restarts);
                }
            }
            match poll {
                Poll::Line(line) => return Ok(Some(line)),
                Poll::WouldBlock => std::thread::sleep(self.interval),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    #[test]
    fn reads_existing_lines_then_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "1.0 first\n2.0 second\n").unwrap();

        let mut cursor = FollowCursor::open(&path).unwrap();
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("1.0 first".into()));
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("2.0 second".into()));
        assert_eq!(cursor.poll_line().unwrap(), Poll::WouldBlock);
    }

    #[test]
    fn partial_line_is_held_back_until_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "1.0 first\n2.0 sec").unwrap();

        let mut cursor = FollowCursor::open(&path).unwrap();
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("1.0 first".into()));
        assert_eq!(cursor.poll_line().unwrap(), Poll::WouldBlock);

        append(&path, "ond\n");
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("2.0 second".into()));
    }

    #[test]
    fn appended_lines_are_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "").unwrap();

        let mut cursor = FollowCursor::open(&path).unwrap();
        assert_eq!(cursor.poll_line().unwrap(), Poll::WouldBlock);
        append(&path, "3.0 later\n");
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("3.0 later".into()));
        assert_eq!(cursor.restarts(), 0);
    }

    #[test]
    fn truncation_restarts_from_offset_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "1.0 old session line\n2.0 another old line\n").unwrap();

        let mut cursor = FollowCursor::open(&path).unwrap();
        while cursor.poll_line().unwrap() != Poll::WouldBlock {}

        std::fs::write(&path, "0.5 new\n").unwrap();
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("0.5 new".into()));
        assert_eq!(cursor.restarts(), 1);
        assert_eq!(cursor.poll_line().unwrap(), Poll::WouldBlock);
    }

    // Creation times can be tunnelled on Windows; inodes cannot.
    #[cfg(unix)]
    #[test]
    fn recreated_larger_file_restarts_from_offset_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "1.0 old\n").unwrap();

        let mut cursor = FollowCursor::open(&path).unwrap();
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("1.0 old".into()));
        assert_eq!(cursor.poll_line().unwrap(), Poll::WouldBlock);

        std::fs::remove_file(&path).unwrap();
        std::fs::write(&path, "0.5 a new session that outgrows the old log\n0.7 more\n").unwrap();
        assert_eq!(
            cursor.poll_line().unwrap(),
            Poll::Line("0.5 a new session that outgrows the old log".into())
        );
        assert_eq!(cursor.restarts(), 1);
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("0.7 more".into()));
        assert_eq!(cursor.poll_line().unwrap(), Poll::WouldBlock);
        assert_eq!(cursor.restarts(), 1);
    }

    #[test]
    fn missing_file_mid_stream_would_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "1.0 line\n").unwrap();

        let mut cursor = FollowCursor::open(&path).unwrap();
        assert_eq!(cursor.poll_line().unwrap(), Poll::Line("1.0 line".into()));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cursor.poll_line().unwrap(), Poll::WouldBlock);
    }

    #[test]
    fn cancelled_source_reports_end_of_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut source = FollowSource::new(
            FollowCursor::open(&path).unwrap(),
            Duration::from_millis(1),
            cancel,
        );
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn follow_source_waits_for_new_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "").unwrap();

        let writer_path = path.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            append(&writer_path, "9.0 eventually\n");
        });

        let mut source = FollowSource::new(
            FollowCursor::open(&path).unwrap(),
            Duration::from_millis(5),
            CancellationToken::new(),
        );
        assert_eq!(source.next_line().unwrap().as_deref(), Some("9.0 eventually"));
        writer.join().unwrap();
    }

    #[test]
    fn restart_hook_sees_truncation() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU64, Ordering};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "1.0 a fairly long first session line\n").unwrap();

        let seen = Arc::new(AtomicU64::new(0));
        let hook_seen = Arc::clone(&seen);
        let mut source = FollowSource::new(
            FollowCursor::open(&path).unwrap(),
            Duration::from_millis(1),
            CancellationToken::new(),
        )
        .on_restart(move |n| hook_seen.store(n, Ordering::SeqCst));

        assert!(source.next_line().unwrap().is_some());
        std::fs::write(&path, "2.0 short\n").unwrap();
        assert_eq!(source.next_line().unwrap().as_deref(), Some("2.0 short"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
