//! Runtime configuration
//!
//! Resolves the analyzer settings from parsed CLI arguments (which already
//! carry their `PT_ANALYZER_*` environment overrides) and the process
//! environment, and loads the optional run template.

pub mod loader;

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::cli::args::{AnalyzeArgs, OutputFormat};
use crate::error::ConfigError;
use crate::observability::SessionMode;

pub use loader::{LOG_FILE_ENV, default_log_path, load_template, resolve_log_path};

/// Fully resolved analyzer settings.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Log being read.
    pub log_file: PathBuf,
    /// One-shot analysis when a path was given, follow mode otherwise.
    pub mode: SessionMode,
    pub format: OutputFormat,
    pub storage_dir: PathBuf,
    /// Object every run record is merged onto.
    pub template: Value,
    pub port_file: PathBuf,
    pub poll_interval: Duration,
    pub events_file: Option<PathBuf>,
    pub metrics_port: Option<u16>,
}

impl AnalyzerConfig {
    /// Resolves settings from `args` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if no log path can be determined, the
    /// template is unusable, or the poll interval is zero.
    pub fn from_args(args: &AnalyzeArgs) -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let mode = if args.path.is_some() {
            SessionMode::Analyze
        } else {
            SessionMode::Follow
        };
        if args.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "poll-interval".to_owned(),
                value: "0s".to_owned(),
                expected: "a positive duration".to_owned(),
            });
        }

        Ok(Self {
            log_file: resolve_log_path(args.path.as_deref(), &lookup)?,
            mode,
            format: args.format,
            storage_dir: args.storage_dir.clone(),
            template: load_template(args.template.as_deref())?,
            port_file: args
                .port_file
                .clone()
                .unwrap_or_else(crate::server::default_port_file),
            poll_interval: args.poll_interval,
            events_file: args.events_file.clone(),
            metrics_port: args.metrics_port,
        })
    }
}
