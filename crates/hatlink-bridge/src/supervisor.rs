//! Bridge lifecycle.
//!
//! The [`Supervisor`] owns every long-lived piece of the bridge and the
//! single cancellation token they observe.
//!
//! ```text
//!                       ┌──────────────┐
//!            ┌─────────►│ AnalogPoller │──┐
//!            │          └──────────────┘  │
//! Supervisor ┼─────────►┌──────────────┐  ├──► Publisher ──► FailoverSender
//!  (token)   │          │ InputMonitor │──┘        │
//!            │          └──────────────┘           └──► status lights
//!            │          ┌──────────────┐
//!            └─────────►│   listener   │──► CommandDispatcher ──► board
//!                       └──────────────┘
//! ```
//!
//! # Shutdown
//!
//! [`Supervisor::shutdown`] cancels the token, then waits for all three
//! tasks against one shared deadline. A task still running at the deadline
//! is aborted. The listener socket closes when its task ends, and the power
//! light is switched off last. Shutdown runs once; later and concurrent
//! calls get the first call's report.
//!
//! The stop sequence runs on its own task. A caller that gives up waiting
//! (its `shutdown()` future dropped by a timeout) does not interrupt it;
//! the next call picks up the same sequence and its report.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hatlink_core::BridgeConfig;
use hatlink_hardware::{AnyBoard, IoBackend};
use hatlink_network::{FailoverSender, ListenerError, OscListener, SenderConfig, SenderStats};
use hatlink_protocol::AddressBook;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::analog::AnalogPoller;
use crate::dispatcher::{CommandDispatcher, Restarter};
use crate::inputs::InputMonitor;
use crate::publisher::Publisher;

/// Errors that prevent the bridge from starting
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The configuration was rejected
    #[error("Invalid configuration: {0}")]
    Config(#[from] hatlink_core::Error),

    /// The command socket could not be bound
    #[error("Cannot start command listener: {0}")]
    Listener(#[from] ListenerError),
}

/// How a supervised task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTermination {
    /// Returned on its own after cancellation.
    Completed,
    /// Still running at the deadline and aborted.
    Aborted,
    /// Panicked.
    Panicked,
}

/// What shutdown observed for each task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub tasks: Vec<(&'static str, TaskTermination)>,
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// Whether every task stopped by itself.
    pub fn is_clean(&self) -> bool {
        self.tasks
            .iter()
            .all(|(_, termination)| *termination == TaskTermination::Completed)
    }
}

#[derive(Debug)]
enum Lifecycle {
    Running(Vec<(&'static str, JoinHandle<()>)>),
    Stopping(JoinHandle<ShutdownReport>),
    Stopped(ShutdownReport),
}

/// Running bridge.
///
/// # Example
///
/// ```no_run
/// use hatlink_bridge::{Supervisor, SystemRestart};
/// use hatlink_core::BridgeConfig;
/// use hatlink_hardware::AnyBoard;
///
/// # async fn example() -> Result<(), hatlink_bridge::SupervisorError> {
/// let config = BridgeConfig::default();
/// let restart = SystemRestart::new(config.restart_command.clone(), config.restart_timeout);
/// let supervisor = Supervisor::start(config, AnyBoard::absent(), restart).await?;
///
/// // Elsewhere: supervisor.shutdown_token().cancel();
/// supervisor.wait_for_stop().await;
/// let report = supervisor.shutdown().await;
/// assert!(report.is_clean());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Supervisor {
    token: CancellationToken,
    publisher: Arc<Publisher>,
    local_addr: SocketAddr,
    shutdown_timeout: Duration,
    lifecycle: Mutex<Lifecycle>,
}

impl Supervisor {
    /// Validate the configuration, open sockets and spawn all tasks.
    ///
    /// # Errors
    /// Fails on invalid configuration or if the command socket cannot be
    /// bound. Unreachable telemetry destinations are not an error.
    pub async fn start<R: Restarter>(
        config: BridgeConfig,
        board: AnyBoard,
        restarter: R,
    ) -> Result<Self, SupervisorError> {
        config.validate()?;

        let board = Arc::new(board);
        let info = board.info();
        if info.present {
            info!(board = %info.name, "I/O board present");
        } else {
            warn!("No I/O board detected, running without hardware");
        }

        let listener = OscListener::bind(config.listen_addr()).await?;
        let sender = FailoverSender::connect(&SenderConfig::from(&config)).await?;
        let publisher = Arc::new(Publisher::new(sender, Arc::clone(&board)));
        let addresses = Arc::new(AddressBook::new(&config.host_id));

        publisher.show_startup().await;

        let analog = AnalogPoller::new(
            Arc::clone(&board),
            Arc::clone(&publisher),
            Arc::clone(&addresses),
            config.analog_policy,
            config.poll_interval,
        );
        let inputs = InputMonitor::new(
            Arc::clone(&board),
            Arc::clone(&publisher),
            addresses,
            config.heartbeat_interval,
            config.poll_interval,
        );
        let dispatcher = CommandDispatcher::new(board, restarter);

        let token = CancellationToken::new();
        let local_addr = listener.local_addr();
        let tasks = vec![
            ("analog", tokio::spawn(analog.run(token.child_token()))),
            ("inputs", tokio::spawn(inputs.run(token.child_token()))),
            (
                "listener",
                tokio::spawn(listen(listener, dispatcher, token.child_token())),
            ),
        ];

        info!(
            host = %config.host_id,
            listen = %local_addr,
            primary = %config.primary(),
            backup = %config.backup(),
            "Bridge started"
        );

        Ok(Self {
            token,
            publisher,
            local_addr,
            shutdown_timeout: config.shutdown_timeout,
            lifecycle: Mutex::new(Lifecycle::Running(tasks)),
        })
    }

    /// Token whose cancellation requests shutdown.
    ///
    /// Signal handlers cancel a clone of this; [`Self::wait_for_stop`] then
    /// returns and the owner calls [`Self::shutdown`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait until a stop has been requested.
    pub async fn wait_for_stop(&self) {
        self.token.cancelled().await;
    }

    /// Address the command listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> SenderStats {
        self.publisher.stats()
    }

    /// Stop every task and release resources. Idempotent.
    pub async fn shutdown(&self) -> ShutdownReport {
        let mut lifecycle = self.lifecycle.lock().await;
        loop {
            match &mut *lifecycle {
                Lifecycle::Running(tasks) => {
                    info!("Shutting down");
                    self.token.cancel();
                    let stop = stop_tasks(
                        std::mem::take(tasks),
                        Arc::clone(&self.publisher),
                        self.shutdown_timeout,
                    );
                    *lifecycle = Lifecycle::Stopping(tokio::spawn(stop));
                }
                Lifecycle::Stopping(stop) => {
                    let report = stop.await.unwrap_or_else(|e| {
                        error!(error = %e, "Shutdown sequence failed");
                        ShutdownReport {
                            tasks: Vec::new(),
                            elapsed: Duration::ZERO,
                        }
                    });
                    *lifecycle = Lifecycle::Stopped(report.clone());
                    return report;
                }
                Lifecycle::Stopped(report) => {
                    debug!("Shutdown already complete");
                    return report.clone();
                }
            }
        }
    }
}

/// Wait for each task against one deadline, abort the stragglers, then
/// switch the power light off.
async fn stop_tasks(
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    publisher: Arc<Publisher>,
    timeout: Duration,
) -> ShutdownReport {
    let started = Instant::now();
    let deadline = started + timeout;

    let mut report = ShutdownReport {
        tasks: Vec::with_capacity(tasks.len()),
        elapsed: Duration::ZERO,
    };
    for (name, mut handle) in tasks {
        let termination = match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(result) => classify_task_result(result),
            Err(_) => {
                warn!(task = name, "Task did not stop in time, aborting");
                handle.abort();
                TaskTermination::Aborted
            }
        };
        if termination == TaskTermination::Panicked {
            error!(task = name, "Task panicked");
        }
        report.tasks.push((name, termination));
    }

    publisher.show_shutdown().await;
    report.elapsed = started.elapsed();
    info!(elapsed = ?report.elapsed, clean = report.is_clean(), "Shutdown complete");
    report
}

/// Classify the termination status of a task.
fn classify_task_result(result: Result<(), JoinError>) -> TaskTermination {
    match result {
        Ok(()) => TaskTermination::Completed,
        Err(e) if e.is_cancelled() => TaskTermination::Aborted,
        Err(_) => TaskTermination::Panicked,
    }
}

/// Receive and dispatch commands until cancelled.
///
/// Messages are dispatched one at a time, in arrival order, so two
/// commands for the same actuator never race.
async fn listen<R: Restarter>(
    mut listener: OscListener,
    dispatcher: CommandDispatcher<R>,
    token: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            received = listener.recv() => received,
        };

        match received {
            Ok((packet, peer)) => {
                for message in packet.into_messages() {
                    debug!(peer = %peer, message = %message, "Dispatching");
                    dispatcher.dispatch(&message).await;
                }
            }
            Err(e) if e.is_recoverable() => warn!(error = %e, "Dropping inbound datagram"),
            Err(e) => {
                error!(error = %e, "Command listener failed");
                break;
            }
        }
    }
    info!(address = %listener.local_addr(), "Command listener closed");
}
