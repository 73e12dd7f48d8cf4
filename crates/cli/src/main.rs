//! agentkit CLI: the main entry point.
//!
//! Commands:
//! - `config show`        Print the merged effective configuration
//! - `config validate`    Load, validate, and summarize the configuration
//! - `config root`        Show where configuration is looked up
//! - `history check`      Build and list the history processor pipeline
//! - `history apply`      Run a JSON history through the pipeline

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{OutputFormat, SourceArgs};

#[derive(Parser)]
#[command(
    name = "agentkit",
    about = "agentkit: layered agent configuration and history processing",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory relative config paths resolve against
    /// (default: $AGENTKIT_CONFIG_ROOT, then ~/.agentkit)
    #[arg(long, global = true, value_name = "DIR")]
    config_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Work with the history processor pipeline
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the merged effective configuration
    Show {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,

        /// Print the typed configuration (defaults filled in) instead of the raw tree
        #[arg(long)]
        typed: bool,
    },

    /// Load and validate the configuration
    Validate {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Show the config root, config directory, and default source
    Root,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Build the configured pipeline and list its stages
    Check {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Apply the configured pipeline to a JSON history
    Apply {
        #[command(flatten)]
        sources: SourceArgs,

        /// JSON file with an array of history entries
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = cli.config_root;
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show {
                sources,
                format,
                typed,
            } => commands::config_cmd::show(&sources, root, format, typed)?,
            ConfigAction::Validate { sources } => commands::config_cmd::validate(&sources, root)?,
            ConfigAction::Root => commands::config_cmd::root(root)?,
        },
        Commands::History { action } => match action {
            HistoryAction::Check { sources } => commands::history::check(&sources, root)?,
            HistoryAction::Apply {
                sources,
                input,
                output,
            } => commands::history::apply(&sources, root, &input, output.as_deref())?,
        },
    }

    Ok(())
}
