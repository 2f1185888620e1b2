//! `pt-analyzer` - Profit-Taker run analyzer for Warframe `EE.log` files

use clap::Parser;

use pt_analyzer::cli::args::Cli;
use pt_analyzer::cli::commands;
use pt_analyzer::cli::signal::shutdown_signal;
use pt_analyzer::error::{AnalyzerError, ExitCode};
use pt_analyzer::observability::{LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(LogFormat::Human, cli.verbose, cli.color);
    }

    // Spawn signal handler for graceful shutdown
    tokio::spawn(async {
        shutdown_signal().await;
        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        std::process::exit(shutdown_signal().await);
    });

    let result = commands::dispatch(cli).await;

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(AnalyzerError::Interrupted { code }) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_unexpected() {
                eprintln!(
                    "This looks like a bug in pt-analyzer. Please report it and attach your EE.log."
                );
            }
            std::process::exit(e.exit_code());
        }
    }
}
