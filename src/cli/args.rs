//! CLI argument definitions
//!
//! All Clap derive structs for `pt-analyzer` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Profit-Taker run analyzer for Warframe `EE.log` files.
///
/// With a PATH the log is analyzed once and a report is printed. Without
/// one the game's live log is followed until interrupted.
#[derive(Parser, Debug)]
#[command(name = "pt-analyzer", author, version, about)]
#[command(propagate_version = true, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Analysis options.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,

    /// Increase verbosity (-v info, -vv debug, -vvv trace, -vvvv per-line parser trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "PT_ANALYZER_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Analysis
// ============================================================================

/// Arguments for analyzing or following a log.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Log file to analyze once. Follows the game's log when omitted.
    pub path: Option<PathBuf>,

    /// Report format for one-shot analysis.
    #[arg(short, long, default_value = "human", env = "PT_ANALYZER_FORMAT")]
    pub format: OutputFormat,

    /// Directory receiving one JSON record per run (follow mode).
    #[arg(long, default_value = "./storage", env = "PT_ANALYZER_STORAGE_DIR")]
    pub storage_dir: PathBuf,

    /// JSON object the run records are merged onto.
    #[arg(long, env = "PT_ANALYZER_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Where to advertise the query server port (default: beside the executable).
    #[arg(long, env = "PT_ANALYZER_PORT_FILE")]
    pub port_file: Option<PathBuf>,

    /// Delay between polls of the followed log (e.g. `100ms`, `1s`).
    #[arg(
        long,
        default_value = "100ms",
        value_parser = humantime::parse_duration,
        env = "PT_ANALYZER_POLL_INTERVAL"
    )]
    pub poll_interval: Duration,

    /// Append structured JSONL events to this file.
    #[arg(long, env = "PT_ANALYZER_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Expose Prometheus metrics on this port.
    #[arg(long, env = "PT_ANALYZER_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_selects_one_shot_analysis() {
        let cli = Cli::try_parse_from(["pt-analyzer", "EE.log"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.analyze.path, Some(PathBuf::from("EE.log")));
        assert_eq!(cli.analyze.format, OutputFormat::Human);
    }

    #[test]
    fn test_no_arguments_means_follow() {
        let cli = Cli::try_parse_from(["pt-analyzer"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.analyze.path.is_none());
        assert_eq!(cli.analyze.poll_interval, Duration::from_millis(100));
        assert_eq!(cli.analyze.storage_dir, PathBuf::from("./storage"));
    }

    #[test]
    fn test_poll_interval_uses_humantime() {
        let cli = Cli::try_parse_from(["pt-analyzer", "--poll-interval", "2s"]).unwrap();
        assert_eq!(cli.analyze.poll_interval, Duration::from_secs(2));

        let bad = Cli::try_parse_from(["pt-analyzer", "--poll-interval", "soon"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_json_format() {
        let cli = Cli::try_parse_from(["pt-analyzer", "--format", "json", "EE.log"]).unwrap();
        assert_eq!(cli.analyze.format, OutputFormat::Json);
    }

    #[test]
    fn test_help_output() {
        let result = Cli::try_parse_from(["pt-analyzer", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let result = Cli::try_parse_from(["pt-analyzer", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_version_subcommand() {
        let cli = Cli::try_parse_from(["pt-analyzer", "version", "--format", "json"]).unwrap();
        match cli.command {
            Some(Commands::Version(args)) => assert_eq!(args.format, OutputFormat::Json),
            other => panic!("expected version subcommand, got {other:?}"),
        }
    }

    #[test]
    fn test_color_choices_parse() {
        for variant in ["auto", "always", "never"] {
            let cli = Cli::try_parse_from(["pt-analyzer", "--color", variant, "EE.log"]);
            assert!(cli.is_ok(), "Failed to parse color={variant}");
        }
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["pt-analyzer", "-vvv", "EE.log"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_completions_shells_parse() {
        for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
            let cli = Cli::try_parse_from(["pt-analyzer", "completions", shell]);
            assert!(cli.is_ok(), "Failed to parse shell={shell}");
        }
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
