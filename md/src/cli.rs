//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MatchDaemon - background match scheduler
#[derive(Parser)]
#[command(
    name = "md",
    about = "Background scheduler and worker pool for simulated esports matches",
    version,
    after_help = "Logs are written to: ~/.local/share/matchdaemon/logs/matchdaemon.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start the daemon in the background
    Start {
        /// Don't fork to background (run in foreground)
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the running daemon
    Stop,

    /// Show daemon status
    Status,

    /// Internal: Run as daemon process (used by `start`)
    #[command(hide = true)]
    RunDaemon,
}
