//! MatchDaemon - background match scheduler
//!
//! CLI entry point for starting, stopping and inspecting the daemon.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, warn};

use matchdaemon::cli::{Cli, Command};
use matchdaemon::config::Config;
use matchdaemon::daemon::DaemonManager;
use matchdaemon::lifecycle::Lifecycle;
use matchdaemon::service::HttpMatchService;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matchdaemon")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("matchdaemon.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        base_url = %config.service.base_url,
        max_workers = config.pool.max_workers,
        "MatchDaemon loaded config"
    );

    match cli.command {
        Some(Command::Start { foreground: true }) | Some(Command::RunDaemon) => run_daemon(&config).await,
        Some(Command::Start { foreground: false }) => cmd_start(),
        Some(Command::Stop) => cmd_stop(),
        Some(Command::Status) | None => cmd_status(),
    }
}

/// Fork the daemon into the background
fn cmd_start() -> Result<()> {
    let manager = DaemonManager::new();
    let pid = manager.start()?;
    println!("Daemon started with PID {}", pid);
    Ok(())
}

/// Stop the background daemon
fn cmd_stop() -> Result<()> {
    let manager = DaemonManager::new();
    manager.stop()?;
    println!("Daemon stopped");
    Ok(())
}

/// Print daemon process status
fn cmd_status() -> Result<()> {
    let manager = DaemonManager::new();
    let status = manager.status();

    if let Some(pid) = status.pid {
        println!("Daemon running with PID {}", pid);
    } else {
        println!("Daemon is not running");
    }
    println!("PID file: {}", status.pid_file.display());
    Ok(())
}

/// Run the scheduling subsystem in this process until a shutdown signal
async fn run_daemon(config: &Config) -> Result<()> {
    let manager = DaemonManager::new();
    manager.register_self()?;

    let service = Arc::new(HttpMatchService::from_config(&config.service).map_err(|e| eyre::eyre!("{e}"))?);
    let lifecycle = Lifecycle::new(config, service);

    lifecycle.start().await?;
    info!("MatchDaemon running, waiting for shutdown signal");

    wait_for_shutdown_signal().await;

    // Cleanup always runs before exit; close failures are logged, not fatal
    lifecycle.shutdown().await;
    info!("MatchDaemon exited");
    Ok(())
}

/// Wait for ctrl-c or SIGTERM
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Could not install SIGTERM handler, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received ctrl-c"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received ctrl-c");
    }
}
