//! Inbound command dispatch.
//!
//! Messages are validated into an [`ActuatorCommand`] at the boundary (see
//! `hatlink_protocol::command`), then routed by capability:
//!
//! | Address        | Effect                                           |
//! |----------------|--------------------------------------------------|
//! | `/relay/{i}`   | relay `i` on for non-zero, off for zero          |
//! | `/output/{i}`  | digital output `i` on for non-zero, off for zero |
//! | `/led/{i}`     | light 0=power, 1=comms, 2=warn                   |
//! | `/restart/{i}` | host restart, only for `/restart/0 1`            |
//!
//! Every inbound message lights comms fully before it is parsed, matching
//! the board's "command seen" signal. Nothing here can fail the listener:
//! each outcome is logged and returned as a [`DispatchOutcome`].
//!
//! # Restart Gating
//!
//! Restart is the only irreversible action. The payload must be exactly one
//! integer on the wire, the index must be 0 and the value must be exactly 1.
//! It is also refused while no board is present, so a bridge that lost its
//! hardware never reboots the host. Everything else is a logged no-op.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hatlink_core::constants::DEFAULT_RESTART_TIMEOUT_MS;
use hatlink_core::{ActuatorKind, Light};
use hatlink_hardware::{Actuator, AnyBoard, IoBackend};
use hatlink_protocol::{ActuatorCommand, OscMessage, Route};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a restart did not happen
#[derive(Debug, Error)]
pub enum RestartError {
    /// No command configured
    #[error("Restart command is empty")]
    EmptyCommand,

    /// The command could not be started
    #[error("Cannot start restart command: {0}")]
    Spawn(#[from] std::io::Error),

    /// The command ran but reported failure
    #[error("Restart command exited with {status}")]
    Failed { status: String },

    /// The command did not finish in time
    #[error("Restart command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// The privileged host restart action.
///
/// The returned future must be `Send` so dispatch can run on a spawned task.
pub trait Restarter: Send + Sync + 'static {
    fn restart(&self) -> impl Future<Output = Result<(), RestartError>> + Send;
}

/// Restart by running a command line (by default `sudo reboot`).
///
/// # Example
///
/// ```
/// use hatlink_bridge::SystemRestart;
/// use std::time::Duration;
///
/// let restart = SystemRestart::new(vec!["sudo".into(), "reboot".into()], Duration::from_secs(10));
/// assert_eq!(restart.command(), ["sudo", "reboot"]);
///
/// let simulated = SystemRestart::dry_run();
/// assert!(simulated.is_dry_run());
/// ```
#[derive(Debug, Clone)]
pub struct SystemRestart {
    command: Vec<String>,
    timeout: Duration,
    dry_run: bool,
}

impl SystemRestart {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self {
            command,
            timeout,
            dry_run: false,
        }
    }

    /// A restarter that only logs. Used when running without hardware.
    pub fn dry_run() -> Self {
        Self {
            command: Vec::new(),
            timeout: Duration::from_millis(DEFAULT_RESTART_TIMEOUT_MS),
            dry_run: true,
        }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl Restarter for SystemRestart {
    async fn restart(&self) -> Result<(), RestartError> {
        if self.dry_run {
            warn!("Restart requested, skipped in dry-run mode");
            return Ok(());
        }

        let (program, args) = self
            .command
            .split_first()
            .ok_or(RestartError::EmptyCommand)?;
        info!(command = ?self.command, "Restarting host");

        let mut command = tokio::process::Command::new(program);
        command.args(args).kill_on_drop(true);

        let status = tokio::time::timeout(self.timeout, command.status())
            .await
            .map_err(|_| RestartError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        if !status.success() {
            return Err(RestartError::Failed {
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Result of dispatching one inbound message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The actuator was written.
    Applied { route: Route, value: i64 },
    /// The restart action ran and reported success.
    Restarted,
    /// A valid command that deliberately does nothing.
    Ignored { route: Route, value: i64 },
    /// The message did not validate; nothing was done.
    Rejected(hatlink_core::Error),
    /// A valid command whose side effect failed.
    Failed { route: Route, reason: String },
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. } | Self::Restarted)
    }
}

/// Routes inbound messages to board writes and the restart action.
#[derive(Debug)]
pub struct CommandDispatcher<R> {
    board: Arc<AnyBoard>,
    restarter: R,
}

impl<R: Restarter> CommandDispatcher<R> {
    pub fn new(board: Arc<AnyBoard>, restarter: R) -> Self {
        Self { board, restarter }
    }

    /// Validate and apply one message.
    pub async fn dispatch(&self, message: &OscMessage) -> DispatchOutcome {
        self.pulse_comms().await;

        let command = match ActuatorCommand::from_message(message) {
            Ok(command) => command,
            Err(e) => {
                warn!(message = %message, error = %e, "Dropping inbound message");
                return DispatchOutcome::Rejected(e);
            }
        };
        info!(route = %command.route, value = command.value, "Inbound command");

        let ActuatorCommand { route, value } = command;
        let level = if command.is_on() { 1.0 } else { 0.0 };
        let actuator = match route.kind {
            ActuatorKind::Relay => Actuator::Relay(route.index),
            ActuatorKind::Output => Actuator::Output(route.index),
            ActuatorKind::Led => match Light::from_index(route.index) {
                Some(light) => Actuator::Light(light),
                None => return DispatchOutcome::Ignored { route, value },
            },
            ActuatorKind::Restart => return self.restart(route, value).await,
        };

        match self.board.write(actuator, level).await {
            Ok(()) => DispatchOutcome::Applied { route, value },
            Err(e) => {
                warn!(route = %route, error = %e, "Actuator write failed");
                DispatchOutcome::Failed {
                    route,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn restart(&self, route: Route, value: i64) -> DispatchOutcome {
        if route.index != 0 || value != 1 {
            info!(route = %route, value, "Restart not requested, ignoring");
            return DispatchOutcome::Ignored { route, value };
        }
        if !self.board.is_present() {
            warn!(route = %route, "Restart requested without a board, ignoring");
            return DispatchOutcome::Ignored { route, value };
        }

        match self.restarter.restart().await {
            Ok(()) => DispatchOutcome::Restarted,
            Err(e) => {
                error!(error = %e, "Restart failed");
                DispatchOutcome::Failed {
                    route,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn pulse_comms(&self) {
        if let Err(e) = self.board.write(Actuator::Light(Light::Comms), 1.0).await {
            debug!(error = %e, "Comms light write failed");
        }
    }

    pub fn restarter(&self) -> &R {
        &self.restarter
    }
}
