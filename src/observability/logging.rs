//! Logging initialization.
//!
//! Logs always go to stderr so stdout stays reserved for run reports.
//! `PT_ANALYZER_LOG_LEVEL` overrides the verbosity flags.
//!
//! Verbosity only raises this crate's levels; dependencies (axum, hyper,
//! the metrics exporter) stay at `warn`. The parser traces every log line,
//! so it lags one level behind at the top end: `-vvv` shows parser debug
//! output and `-vvvv` the per-line trace.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_LEVEL_ENV: &str = "PT_ANALYZER_LOG_LEVEL";

const CRATE_TARGET: &str = "pt_analyzer";
const PARSER_TARGET: &str = "pt_analyzer::parser";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Maps a verbosity level to a tracing directive string.
///
/// - 0 → `"warn"`
/// - 1 → `"info"`
/// - 2 → `"debug"`
/// - 3+ → `"trace"` (saturates)
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives for a verbosity level.
#[must_use]
pub fn filter_directives(verbosity: u8) -> String {
    let parser_verbosity = if verbosity >= 3 { verbosity - 1 } else { verbosity };
    format!(
        "warn,{CRATE_TARGET}={},{PARSER_TARGET}={}",
        verbosity_to_directive(verbosity),
        verbosity_to_directive(parser_verbosity)
    )
}

/// Whether ANSI colors should be used on stderr.
#[must_use]
pub fn use_ansi(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Initializes the global tracing subscriber.
///
/// Uses `try_init()` so calling this more than once (e.g. in tests) is safe.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)));

    let show_target = verbosity >= 2;

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi(color))
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
