//! Outbound telemetry addresses.
//!
//! Every outbound message is addressed under the host identifier:
//!
//! | Source            | Address              | Payload              |
//! |-------------------|----------------------|----------------------|
//! | Analog channel n  | `/{host}/A{n}`       | float reading        |
//! | Digital input n   | `/{host}/DI{n}`      | integer level        |
//! | Heartbeat         | `/{host}/heartbeat`  | `[1]`                |
//!
//! Channel numbers on the wire are 1-based; channel indices in code are
//! 0-based. [`AddressBook`] formats every address once at startup so the
//! polling loops never allocate address strings.

use hatlink_core::HostId;
use hatlink_core::constants::{
    ANALOG_INPUT_COUNT, ANALOG_PREFIX, DIGITAL_INPUT_COUNT, DIGITAL_PREFIX, HEARTBEAT_SEGMENT,
};

use crate::{OscArg, OscMessage};

/// Address for analog channel `index` (0-based).
pub fn analog_address(host: &HostId, index: usize) -> String {
    format!("/{host}/{ANALOG_PREFIX}{}", index + 1)
}

/// Address for digital input `index` (0-based).
pub fn digital_address(host: &HostId, index: usize) -> String {
    format!("/{host}/{DIGITAL_PREFIX}{}", index + 1)
}

/// Heartbeat address for `host`.
pub fn heartbeat_address(host: &HostId) -> String {
    format!("/{host}/{HEARTBEAT_SEGMENT}")
}

/// Pre-formatted outbound addresses for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBook {
    analog: Vec<String>,
    digital: Vec<String>,
    heartbeat: String,
}

impl AddressBook {
    pub fn new(host: &HostId) -> Self {
        Self {
            analog: (0..ANALOG_INPUT_COUNT)
                .map(|i| analog_address(host, i))
                .collect(),
            digital: (0..DIGITAL_INPUT_COUNT)
                .map(|i| digital_address(host, i))
                .collect(),
            heartbeat: heartbeat_address(host),
        }
    }

    /// Message reporting a new analog reading, or `None` for an unknown channel.
    pub fn analog_message(&self, index: usize, value: f32) -> Option<OscMessage> {
        self.analog
            .get(index)
            .map(|address| OscMessage::with_arg(address.clone(), OscArg::Float(value)))
    }

    /// Message reporting a new digital level, or `None` for an unknown line.
    pub fn digital_message(&self, index: usize, value: u8) -> Option<OscMessage> {
        self.digital
            .get(index)
            .map(|address| OscMessage::with_arg(address.clone(), OscArg::Int(i32::from(value))))
    }

    /// The liveness message: a single truthy integer.
    pub fn heartbeat_message(&self) -> OscMessage {
        OscMessage::with_arg(self.heartbeat.clone(), OscArg::Int(1))
    }
}
