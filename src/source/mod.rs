//! Line sources for `EE.log` analysis.
//!
//! A [`LineSource`] yields complete lines in file order. Two flavours exist:
//!
//! - [`ReaderSource`] replays a static file (or any `BufRead`) and reports
//!   end-of-stream once exhausted.
//! - [`FollowSource`] tails a growing file, survives the game truncating and
//!   rewriting it, and only reports end-of-stream when cancelled.
//!
//! Lines are decoded lossily and handed over with the line terminator
//! stripped; embedded control characters pass through untouched.

pub mod follow;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error::SourceError;

pub use follow::{FollowCursor, FollowSource, Poll};

/// Pull-based producer of log lines.
pub trait LineSource {
    /// Returns the next complete line, or `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the underlying file cannot be read.
    fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

/// Finite source over any buffered reader.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    path: PathBuf,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wraps `reader`; `path` is only used in error messages.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            buf: Vec::new(),
        }
    }
}

impl ReaderSource<std::io::BufReader<std::fs::File>> {
    /// Opens a log file for one-shot replay.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Open`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(std::io::BufReader::new(file), path))
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| SourceError::Read {
                path: self.path.clone(),
                source,
            })?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(decode_line(&self.buf)))
    }
}

/// Lossily decodes a raw line and strips its terminator.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if raw[..end].ends_with(b"\n") {
        end -= 1;
    }
    if raw[..end].ends_with(b"\r") {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn yields_lines_then_end_of_stream() {
        let mut source = ReaderSource::new(Cursor::new("1.0 a\n2.0 b\r\n3.0 c"), "mem");
        assert_eq!(source.next_line().unwrap().as_deref(), Some("1.0 a"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("2.0 b"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("3.0 c"));
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn control_characters_pass_through() {
        let mut source = ReaderSource::new(Cursor::new("1.0 na\u{e000}me\x07\n"), "mem");
        assert_eq!(
            source.next_line().unwrap().as_deref(),
            Some("1.0 na\u{e000}me\x07")
        );
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let bytes: &[u8] = b"1.0 bad \xff byte\n";
        let mut source = ReaderSource::new(Cursor::new(bytes), "mem");
        let line = source.next_line().unwrap().unwrap();
        assert!(line.starts_with("1.0 bad "));
        assert!(line.ends_with(" byte"));
    }

    #[test]
    fn open_missing_file_fails() {
        let err = ReaderSource::open(Path::new("/nonexistent/pt-analyzer/EE.log")).unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
