//! Error types for `pt-analyzer`
//!
//! Run-level failures (aborted or bugged attempts) are *not* errors: they are
//! ordinary outcomes of the run reader (see [`crate::parser::ReadOutcome`]).
//! The types here cover everything that stops the analyzer itself.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `pt-analyzer` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (bad template, unresolvable log path)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Line source error (log vanished, read failure mid-stream)
    pub const SOURCE_ERROR: i32 = 4;

    /// Run storage error
    pub const STORE_ERROR: i32 = 5;

    /// Query server error (bind failure, port file)
    pub const SERVER_ERROR: i32 = 6;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `pt-analyzer` operations.
///
/// This enum aggregates all domain-specific errors and provides
/// a unified interface for error handling and exit code mapping.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Configuration resolution error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Line source error
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Run storage error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Query server error
    #[error(transparent)]
    Server(#[from] ServerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stopped by SIGINT or SIGTERM
    #[error("interrupted by signal")]
    Interrupted {
        /// Exit code matching the signal
        code: i32,
    },
}

impl AnalyzerError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) => ExitCode::CONFIG_ERROR,
            Self::Source(_) => ExitCode::SOURCE_ERROR,
            Self::Store(_) => ExitCode::STORE_ERROR,
            Self::Server(_) => ExitCode::SERVER_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Interrupted { code } => *code,
        }
    }

    /// Whether the failure is not explained by the user's setup and should
    /// be reported together with the raw log.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Source(SourceError::Read { .. }) | Self::Json(_))
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration resolution errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No log path was given and the default location cannot be derived
    #[error(
        "cannot locate EE.log: {reason} (pass a path or set PT_ANALYZER_LOG_FILE)"
    )]
    LogPathUnavailable {
        /// Why the default location could not be used
        reason: String,
    },

    /// The display-format template could not be parsed
    #[error("invalid run template {path}: {message}")]
    InvalidTemplate {
        /// Path to the template file
        path: PathBuf,
        /// Parser or shape error
        message: String,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Line Source Errors
// ============================================================================

/// Errors raised while producing lines from a log file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading the underlying file failed
    #[error("failed to read {path}: {source}")]
    Read {
        /// Log file being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The log file could not be opened
    #[error("failed to open {path}: {source}")]
    Open {
        /// Log file being opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Storage Errors
// ============================================================================

/// Errors raised while persisting run records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage directory could not be created or listed
    #[error("storage directory {path} unavailable: {source}")]
    Directory {
        /// Storage directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A record could not be written
    #[error("failed to write run record {path}: {source}")]
    Write {
        /// Target record file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized
    #[error("failed to serialize run record: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// Query Server Errors
// ============================================================================

/// Errors raised by the status/query endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The TCP listener could not bind
    #[error("bind failed: {0}")]
    Bind(std::io::Error),

    /// The port file could not be written
    #[error("failed to write port file {path}: {source}")]
    PortFile {
        /// Port file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The metrics exporter could not be installed
    #[error("metrics exporter failed: {0}")]
    Metrics(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `pt-analyzer` operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::SOURCE_ERROR, 4);
        assert_eq!(ExitCode::STORE_ERROR, 5);
        assert_eq!(ExitCode::SERVER_ERROR, 6);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: AnalyzerError = ConfigError::LogPathUnavailable {
            reason: "LOCALAPPDATA not set".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
        assert!(err.to_string().contains("PT_ANALYZER_LOG_FILE"));
    }

    #[test]
    fn test_source_error_exit_code() {
        let err: AnalyzerError = SourceError::Open {
            path: PathBuf::from("EE.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::SOURCE_ERROR);
        assert!(err.to_string().contains("EE.log"));
        assert!(!err.is_unexpected());
    }

    #[test]
    fn test_store_error_exit_code() {
        let err: AnalyzerError = StoreError::Directory {
            path: PathBuf::from("/storage"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::STORE_ERROR);
    }

    #[test]
    fn test_server_error_exit_code() {
        let err: AnalyzerError = ServerError::Metrics("port in use".to_string()).into();
        assert_eq!(err.exit_code(), ExitCode::SERVER_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: AnalyzerError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_interrupted_exit_code() {
        let err = AnalyzerError::Interrupted {
            code: ExitCode::TERMINATED,
        };
        assert_eq!(err.exit_code(), ExitCode::TERMINATED);
        assert!(!err.is_unexpected());
    }

    #[test]
    fn test_invalid_template_display() {
        let err = ConfigError::InvalidTemplate {
            path: PathBuf::from("run_format.json"),
            message: "expected a JSON object".to_string(),
        };
        assert!(err.to_string().contains("run_format.json"));
        assert!(err.to_string().contains("expected a JSON object"));
    }
}
