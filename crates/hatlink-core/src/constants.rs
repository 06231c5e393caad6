//! Core constants for the hatlink I/O bridge.
//!
//! This module collects board geometry, OSC address fragments and the default
//! values for every configuration knob. Binaries and tests pull defaults from
//! here so that a single value governs both.
//!
//! # Board Geometry
//!
//! The bridge targets an Automation HAT style board:
//!
//! | Line group      | Count | Outbound address  | Inbound address   |
//! |-----------------|-------|-------------------|-------------------|
//! | Digital inputs  | 3     | `/{host}/DI{n}`   | -                 |
//! | Analog inputs   | 3     | `/{host}/A{n}`    | -                 |
//! | Relays          | 3     | -                 | `/relay/{i}`      |
//! | Digital outputs | 3     | -                 | `/output/{i}`     |
//! | Indicator LEDs  | 3     | -                 | `/led/{i}`        |
//!
//! Outbound channel numbers `n` are 1-based, inbound indices `i` are 0-based.
//!
//! # Usage
//!
//! ```
//! use hatlink_core::constants::*;
//!
//! assert_eq!(DIGITAL_INPUT_COUNT, 3);
//! assert_eq!(DEFAULT_LISTEN_PORT, 7000);
//!
//! use std::time::Duration;
//! let interval = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
//! assert!(interval < Duration::from_secs(DEFAULT_HEARTBEAT_SECS));
//! ```

// ============================================================================
// Board Geometry
// ============================================================================

/// Number of digital input lines sampled by the input monitor.
pub const DIGITAL_INPUT_COUNT: usize = 3;

/// Number of analog channels sampled by the analog poller.
pub const ANALOG_INPUT_COUNT: usize = 3;

/// Number of addressable indices per inbound capability (relay, led, output, restart).
pub const ACTUATOR_INDEX_COUNT: usize = 3;

// ============================================================================
// OSC Address Fragments
// ============================================================================

/// Prefix for analog channel addresses (`/{host}/A1`).
pub const ANALOG_PREFIX: &str = "A";

/// Prefix for digital input addresses (`/{host}/DI1`).
pub const DIGITAL_PREFIX: &str = "DI";

/// Leaf segment of the heartbeat address (`/{host}/heartbeat`).
pub const HEARTBEAT_SEGMENT: &str = "heartbeat";

/// Characters OSC reserves for address patterns; never valid in a host identifier.
pub const OSC_RESERVED_CHARS: &[char] = &[' ', '#', '*', ',', '/', '?', '[', ']', '{', '}'];

// ============================================================================
// Network Defaults
// ============================================================================

/// Default address the command listener binds to.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";

/// Default port the command listener binds to.
pub const DEFAULT_LISTEN_PORT: u16 = 7000;

/// Default primary telemetry destination.
pub const DEFAULT_PRIMARY_HOST: &str = "10.0.0.123";

/// Default backup telemetry destination.
pub const DEFAULT_BACKUP_HOST: &str = "172.22.22.108";

/// Default destination port shared by primary and backup.
pub const DEFAULT_DESTINATION_PORT: u16 = 8000;

/// Default per-destination send timeout in milliseconds.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Timing Defaults
// ============================================================================

/// Default heartbeat interval in seconds.
pub const DEFAULT_HEARTBEAT_SECS: u64 = 15;

/// Default pause between polling cycles in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default bound on how long shutdown waits for each task.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2000;

/// Default bound on how long the restart command may run.
pub const DEFAULT_RESTART_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Privileged Actions
// ============================================================================

/// Default command line executed for `/restart/0 1`.
pub const DEFAULT_RESTART_COMMAND: &[&str] = &["sudo", "reboot"];

// ============================================================================
// Indicator Levels
// ============================================================================

/// Comms brightness while a send is in progress.
pub const COMMS_LEVEL_SENDING: f32 = 0.1;

/// Comms brightness after a successful analog or heartbeat send.
pub const COMMS_LEVEL_SENT: f32 = 0.3;

/// Comms brightness after a successful digital input send.
pub const COMMS_LEVEL_SENT_DIGITAL: f32 = 0.5;
