//! UDP transport for the hatlink I/O bridge.
//!
//! - [`FailoverSender`]: outbound telemetry to a primary destination with a
//!   single fallback to a backup destination.
//! - [`OscListener`]: inbound command socket yielding decoded OSC packets.
//!
//! Both sides speak OSC through
//! [`OscCodec`](hatlink_protocol::OscCodec). Datagrams are fire-and-forget:
//! there is no acknowledgement and no retransmission beyond the one
//! primary-to-backup fallback.

pub mod listener;
pub mod sender;

pub use listener::{ListenerError, OscListener};
pub use sender::{Delivery, FailoverSender, SendError, SenderConfig, SenderStats};
