//! One-file-per-run persistence.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::observability::metrics;

/// Writes run records into a storage directory.
///
/// Records are named by their `file_name` field. The run counter behind
/// `pretty_name` starts at the number of records already present plus one
/// and steps back whenever a record is skipped because its file exists.
#[derive(Debug)]
pub struct RunStore {
    dir: PathBuf,
    counter: Option<u32>,
}

impl RunStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: None,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current value of the run counter, if seeded.
    #[must_use]
    pub const fn counter(&self) -> Option<u32> {
        self.counter
    }

    /// Numbers `record` and writes it to `<file_name>.json`.
    ///
    /// Returns the written path, or `None` when a record with the same name
    /// already exists (the counter is rolled back in that case).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the directory or file cannot be written.
    pub fn save(&mut self, record: &mut Value) -> Result<Option<PathBuf>, StoreError> {
        self.ensure_dir()?;
        let number = self.next_number()?;
        if let Some(map) = record.as_object_mut() {
            map.insert("pretty_name".to_owned(), Value::from(format!("Run #{number}")));
        }

        let stem = record
            .get("file_name")
            .and_then(Value::as_str)
            .unwrap_or("run")
            .to_owned();
        let path = self.dir.join(format!("{stem}.json"));
        if path.exists() {
            debug!(path = %path.display(), "record already stored, skipping");
            self.counter = Some(number.saturating_sub(1));
            return Ok(None);
        }

        let body = serde_json::to_vec_pretty(record)?;
        std::fs::write(&path, body).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), run = number, "run record stored");
        metrics::record_record_written();
        Ok(Some(path))
    }

    fn next_number(&mut self) -> Result<u32, StoreError> {
        let next = match self.counter {
            Some(n) => n + 1,
            None => self.count_records()? + 1,
        };
        self.counter = Some(next);
        Ok(next)
    }

    fn count_records(&self) -> Result<u32, StoreError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| self.dir_error(source))?;
        let mut count = 0u32;
        for entry in entries {
            let entry = entry.map_err(|source| self.dir_error(source))?;
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| self.dir_error(source))
    }

    fn dir_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Directory {
            path: self.dir.clone(),
            source,
        }
    }
}
