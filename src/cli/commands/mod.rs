//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod analyze;
pub mod completions;
pub mod follow;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use crate::cli::args::{Cli, Commands};
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::observability::{EventEmitter, SessionMode, init_metrics};

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), AnalyzerError> {
    match cli.command {
        Some(Commands::Completions(args)) => {
            completions::run(&args);
            Ok(())
        }
        Some(Commands::Version(args)) => {
            version::run(&args);
            Ok(())
        }
        None => {
            let config = AnalyzerConfig::from_args(&cli.analyze)?;
            if config.metrics_port.is_some() {
                init_metrics(config.metrics_port)?;
            }
            let events = open_events(config.events_file.as_deref())?;
            match config.mode {
                SessionMode::Analyze => analyze::run(&config, &events),
                SessionMode::Follow => follow::run(config, Arc::new(events)).await,
            }
        }
    }
}

fn open_events(path: Option<&Path>) -> Result<EventEmitter, AnalyzerError> {
    match path {
        Some(path) => Ok(EventEmitter::from_file(path)?),
        None => Ok(EventEmitter::noop()),
    }
}
