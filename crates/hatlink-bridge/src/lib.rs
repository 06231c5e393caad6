//! Bridge runtime: polling, heartbeat, command dispatch and lifecycle.
//!
//! This crate wires the board ([`hatlink_hardware`]), the transport
//! ([`hatlink_network`]) and the OSC model ([`hatlink_protocol`]) into the
//! running bridge.
//!
//! # Data Flow
//!
//! ```text
//! board ──► AnalogPoller ──┐
//!                          ├──► Publisher ──► FailoverSender ──► primary / backup
//! board ──► InputMonitor ──┘
//!             └─ heartbeat
//!
//! controller ──► OscListener ──► CommandDispatcher ──► board
//!                                        └──────────► Restarter
//! ```
//!
//! # Ownership
//!
//! Each polling task owns its [`ChannelState`]; the input monitor also owns
//! the [`HeartbeatDeadline`]. Nothing else reads or writes them, so neither
//! needs a lock. The board and publisher are shared behind `Arc`s.
//!
//! # Failure Policy
//!
//! Nothing that happens inside a cycle stops a task. Read failures leave
//! the channel unchanged, failed sends light the warning LED, malformed
//! commands are dropped. Only the supervisor's cancellation token ends the
//! tasks.

pub mod analog;
pub mod cycle;
pub mod dispatcher;
pub mod heartbeat;
pub mod inputs;
pub mod publisher;
pub mod state;
pub mod supervisor;

pub use analog::AnalogPoller;
pub use cycle::CycleReport;
pub use dispatcher::{CommandDispatcher, DispatchOutcome, RestartError, Restarter, SystemRestart};
pub use heartbeat::HeartbeatDeadline;
pub use inputs::InputMonitor;
pub use publisher::{Publisher, SignalLevel};
pub use state::{ChannelState, Reading};
pub use supervisor::{ShutdownReport, Supervisor, SupervisorError, TaskTermination};
