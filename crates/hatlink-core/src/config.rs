//! Bridge configuration.
//!
//! [`BridgeConfig`] is the single configuration value handed to the
//! supervisor. It is built by the binary from command line flags and
//! environment variables, but it is also `serde` friendly so embedding
//! applications can load it from a file of their choice.
//!
//! # Example
//!
//! ```
//! use hatlink_core::{BridgeConfig, HostId};
//! use std::time::Duration;
//!
//! let config = BridgeConfig {
//!     host_id: HostId::new("hat-01").unwrap(),
//!     heartbeat_interval: Duration::from_secs(2),
//!     ..BridgeConfig::default()
//! };
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.primary().to_string(), "10.0.0.123:8000");
//! ```

use crate::constants::*;
use crate::{ChangePolicy, Destination, Error, HostId, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Complete runtime configuration for one bridge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address the command listener binds to.
    pub listen_address: IpAddr,

    /// Port the command listener binds to.
    pub listen_port: u16,

    /// Primary telemetry host (name or address).
    pub primary_host: String,

    /// Backup telemetry host, tried when the primary fails.
    pub backup_host: String,

    /// Port shared by both telemetry destinations.
    pub destination_port: u16,

    /// Identifier used as the first segment of outbound addresses.
    pub host_id: HostId,

    /// Heartbeat is emitted after this long without digital input activity.
    #[serde(with = "duration_secs")]
    pub heartbeat_interval: Duration,

    /// Pause between polling cycles.
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,

    /// How analog readings are compared.
    pub analog_policy: ChangePolicy,

    /// Upper bound on a single destination send.
    #[serde(with = "duration_secs")]
    pub send_timeout: Duration,

    /// Upper bound on waiting for each task during shutdown.
    #[serde(with = "duration_secs")]
    pub shutdown_timeout: Duration,

    /// Command line run for `/restart/0 1`.
    pub restart_command: Vec<String>,

    /// Upper bound on the restart command.
    #[serde(with = "duration_secs")]
    pub restart_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: DEFAULT_LISTEN_PORT,
            primary_host: DEFAULT_PRIMARY_HOST.to_string(),
            backup_host: DEFAULT_BACKUP_HOST.to_string(),
            destination_port: DEFAULT_DESTINATION_PORT,
            host_id: HostId("localhost".to_string()),
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            analog_policy: ChangePolicy::Exact,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            shutdown_timeout: Duration::from_millis(DEFAULT_SHUTDOWN_TIMEOUT_MS),
            restart_command: DEFAULT_RESTART_COMMAND
                .iter()
                .map(|part| (*part).to_string())
                .collect(),
            restart_timeout: Duration::from_millis(DEFAULT_RESTART_TIMEOUT_MS),
        }
    }
}

impl BridgeConfig {
    /// Socket address for the command listener.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.listen_port)
    }

    pub fn primary(&self) -> Destination {
        Destination::new(self.primary_host.clone(), self.destination_port)
    }

    pub fn backup(&self) -> Destination {
        Destination::new(self.backup_host.clone(), self.destination_port)
    }

    /// Check the configuration for values the bridge cannot run with.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if self.primary_host.trim().is_empty() {
            return Err(Error::Config("primary host is empty".to_string()));
        }
        if self.backup_host.trim().is_empty() {
            return Err(Error::Config("backup host is empty".to_string()));
        }
        if self.destination_port == 0 {
            return Err(Error::Config("destination port must be non-zero".to_string()));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(Error::Config("heartbeat interval must be non-zero".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".to_string()));
        }
        if self.send_timeout.is_zero() {
            return Err(Error::Config("send timeout must be non-zero".to_string()));
        }
        if let ChangePolicy::DeadBand(threshold) = self.analog_policy
            && !(threshold.is_finite() && threshold >= 0.0)
        {
            return Err(Error::Config(format!(
                "analog dead-band must be a finite, non-negative number, got {threshold}"
            )));
        }
        if self.restart_command.is_empty() || self.restart_command[0].trim().is_empty() {
            return Err(Error::Config("restart command is empty".to_string()));
        }
        Ok(())
    }
}

/// Durations are written as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
