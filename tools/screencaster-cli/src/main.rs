//! Screencaster CLI: supervise screen captures across every monitor.
//!
//! Usage:
//!   screencaster record [ROOT]   Record every monitor until Ctrl+C
//!   screencaster regions         Show the monitor regions that would be recorded
//!   screencaster check           Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use screencaster_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "screencaster",
    about = "Reliable multi-monitor screencasts for seminars and conferences",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/screencaster/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record every connected monitor until interrupted
    Record {
        /// Recording root directory
        root: Option<PathBuf>,

        /// Seconds between supervision ticks
        #[arg(long)]
        tick_secs: Option<u64>,

        /// X display to capture (defaults to $DISPLAY)
        #[arg(long)]
        display: Option<String>,

        /// Directory for the rolling status log
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Stop captures for monitors that disappear
        #[arg(long)]
        prune_vanished: bool,

        /// Interrupt capture processes left over from a previous run
        #[arg(long)]
        reap_stale: bool,
    },

    /// Show the monitor regions that would be recorded
    Regions,

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    screencaster_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Record {
            root,
            tick_secs,
            display,
            log_dir,
            prune_vanished,
            reap_stale,
        } => {
            commands::record::run(
                config,
                commands::record::RecordOptions {
                    root,
                    tick_secs,
                    display,
                    log_dir,
                    prune_vanished,
                    reap_stale,
                },
            )
            .await
        }
        Commands::Regions => commands::regions::run(&config),
        Commands::Check => commands::check::run(&config),
    }
}
