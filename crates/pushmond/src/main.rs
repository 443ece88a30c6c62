//! pushmon — outbound push monitor daemon.
//!
//! Periodically pushes to each configured heartbeat URL, optionally gated
//! by a local precondition command, with a bounded number of attempts per
//! cycle.
//!
//! # Usage
//!
//! ```text
//! pushmon [--config /etc/pushmon/config.toml]          # run the monitor
//! pushmon [--config /etc/pushmon/config.toml] reload   # SIGHUP the running monitor
//! ```
//!
//! SIGINT/SIGTERM drain every running check and exit; SIGHUP re-reads the
//! config and replaces the running checks without restarting the process.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pushmon_check::Supervisor;
use pushmon_core::Config;
use tracing::{debug, error, info, warn};

mod logging;
mod pidfile;
mod signals;

use logging::Logging;
use signals::{SignalEvent, Signals};

#[derive(Parser)]
#[command(name = "pushmon", about = "Push monitor daemon", version)]
struct Cli {
    /// Config file. Defaults to the first of /etc/pushmon/config.toml
    /// and config/config.toml that exists.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the monitor in the foreground (default).
    Run,
    /// Ask the running monitor to reload its configuration.
    Reload,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = match Logging::init() {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(cli.config.as_deref(), &logging).await,
        Command::Reload => trigger_reload(cli.config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "pushmon exiting");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    info!("loading configuration");
    let config = Config::discover(path).context("failed to load configuration")?;
    info!(checks = config.checks.len(), "configuration loaded");
    Ok(config)
}

fn trigger_reload(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let pid = pidfile::send_reload(&config.pid_file).context("failed to reload configuration")?;
    info!(pid, "reload signal sent");
    Ok(())
}

async fn run(path: Option<&Path>, logging: &Logging) -> anyhow::Result<()> {
    let config = load_config(path)?;
    info!("starting push monitor");

    // SIGHUP must be handled before the PID file is visible.
    let mut signals = Signals::install().context("failed to install signal handlers")?;
    debug!("signal handlers configured");

    let pid_file = config.pid_file.clone();
    debug!(path = %pid_file.display(), "writing PID file");
    pidfile::write(&pid_file)?;

    let result = serve(path, logging, &config, &mut signals).await;
    if let Err(e) = pidfile::remove(&pid_file) {
        let message = format!("{e:#}");
        warn!(error = %message, "could not remove PID file");
    }
    result
}

/// Everything that runs while the PID file exists.
async fn serve(
    path: Option<&Path>,
    logging: &Logging,
    config: &Config,
    signals: &mut Signals,
) -> anyhow::Result<()> {
    logging.apply(&config.logging)?;

    let mut supervisor = Supervisor::start(config)?;
    info!(checks = ?supervisor.active_checks(), "all push checks started");

    loop {
        match signals.recv().await {
            SignalEvent::Reload => {
                info!("received reload signal, reloading configuration");
                let next = load_config(path).context("failed to reload configuration")?;
                logging.apply(&next.logging)?;
                supervisor.reload(&next).await?;
                if next.pid_file != config.pid_file {
                    warn!(
                        current = %config.pid_file.display(),
                        configured = %next.pid_file.display(),
                        "pid_file changed; the new path takes effect on restart"
                    );
                }
            }
            SignalEvent::Shutdown => {
                info!("received shutdown signal, initiating graceful shutdown");
                supervisor.shutdown().await;
                info!("all checks stopped, shutting down");
                return Ok(());
            }
        }
    }
}
