//! `hatlink` daemon.
//!
//! Parses flags, installs logging, starts the bridge and blocks until a stop
//! signal arrives. SIGINT and SIGTERM stop the bridge, and so do SIGHUP and
//! SIGUSR1, which service managers use for stop and reload requests.

mod args;

use anyhow::Context;
use clap::Parser;
use hatlink_bridge::{Supervisor, SystemRestart};
use hatlink_hardware::AnyBoard;
use hatlink_hardware::mock::MockBoard;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, hostname};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    let config = args.to_config(&hostname())?;
    info!(version = hatlink_core::VERSION, simulate = args.simulate, "Starting hatlink");

    let supervisor = if args.simulate {
        let (board, _handle) = MockBoard::new();
        Supervisor::start(config, AnyBoard::Mock(board), SystemRestart::dry_run()).await
    } else {
        let restart = SystemRestart::new(config.restart_command.clone(), config.restart_timeout);
        Supervisor::start(config, AnyBoard::absent(), restart).await
    }
    .context("failed to start bridge")?;

    watch_signals(supervisor.shutdown_token())?;
    supervisor.wait_for_stop().await;

    let report = supervisor.shutdown().await;
    if !report.is_clean() {
        warn!(tasks = ?report.tasks, "Some tasks had to be aborted");
    }
    Ok(())
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Cancel `token` on the first stop signal.
fn watch_signals(token: CancellationToken) -> anyhow::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut user1 = signal(SignalKind::user_defined1())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = hangup.recv() => "SIGHUP",
            _ = user1.recv() => "SIGUSR1",
            _ = token.cancelled() => return,
        };
        info!(signal = name, "Stop requested");
        token.cancel();
    });
    Ok(())
}
