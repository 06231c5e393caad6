use crate::{
    Result,
    constants::{ACTUATOR_INDEX_COUNT, OSC_RESERVED_CHARS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host identifier used as the first segment of every outbound address.
///
/// Must be non-empty and free of OSC reserved characters so that
/// `/{host}/A1` stays a plain, literal address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostId(pub(crate) String);

impl HostId {
    /// Create a new host identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidHostId` if the identifier is empty or contains
    /// whitespace or OSC reserved characters.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidHostId("host identifier is empty".to_string()));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || OSC_RESERVED_CHARS.contains(c))
        {
            return Err(Error::InvalidHostId(format!(
                "'{id}' contains reserved character '{bad}'"
            )));
        }
        Ok(HostId(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HostId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HostId::new(s)
    }
}

impl TryFrom<String> for HostId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        HostId::new(&value)
    }
}

impl From<HostId> for String {
    fn from(value: HostId) -> Self {
        value.0
    }
}

/// Capability named by an inbound command address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    /// `/relay/{i}` - relay outputs.
    Relay,
    /// `/led/{i}` - the three fixed indicator lights.
    Led,
    /// `/output/{i}` - generic digital outputs.
    Output,
    /// `/restart/{i}` - host restart (only `/restart/0 1` acts).
    Restart,
}

impl ActuatorKind {
    /// All inbound capabilities, in registration order.
    pub const ALL: [ActuatorKind; 4] = [
        ActuatorKind::Relay,
        ActuatorKind::Led,
        ActuatorKind::Output,
        ActuatorKind::Restart,
    ];

    /// Address segment naming this capability.
    #[must_use]
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::Led => "led",
            Self::Output => "output",
            Self::Restart => "restart",
        }
    }

    /// Number of valid indices for this capability.
    #[must_use]
    pub fn index_limit(&self) -> usize {
        ACTUATOR_INDEX_COUNT
    }

    /// Look up a capability by its address segment.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.segment() == segment)
    }
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// The three fixed indicator lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Light {
    Power,
    Comms,
    Warn,
}

impl Light {
    /// Map an inbound `/led/{i}` index to a light (0=power, 1=comms, 2=warn).
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Power),
            1 => Some(Self::Comms),
            2 => Some(Self::Warn),
            _ => None,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Power => 0,
            Self::Comms => 1,
            Self::Warn => 2,
        }
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Power => write!(f, "power"),
            Self::Comms => write!(f, "comms"),
            Self::Warn => write!(f, "warn"),
        }
    }
}

/// How an analog reading is judged to have changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "threshold")]
pub enum ChangePolicy {
    /// Any difference triggers a send.
    #[default]
    Exact,
    /// Only differences strictly greater than the threshold trigger a send.
    DeadBand(f32),
}

impl ChangePolicy {
    /// Build a policy from a configured dead-band; zero means exact comparison.
    #[must_use]
    pub fn from_deadband(threshold: f32) -> Self {
        if threshold > 0.0 {
            Self::DeadBand(threshold)
        } else {
            Self::Exact
        }
    }

    /// Whether `current` counts as a change from `previous`.
    #[must_use]
    pub fn is_change(&self, previous: f32, current: f32) -> bool {
        match self {
            Self::Exact => previous != current,
            Self::DeadBand(threshold) => (current - previous).abs() > *threshold,
        }
    }
}

/// A configured telemetry destination: host name or address plus port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
