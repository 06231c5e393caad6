//! Command line and environment configuration.
//!
//! Every flag has a `HATLINK_*` environment fallback so the daemon can be
//! configured from a service unit without a wrapper script.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use hatlink_core::constants::{
    DEFAULT_BACKUP_HOST, DEFAULT_DESTINATION_PORT, DEFAULT_LISTEN_ADDRESS, DEFAULT_LISTEN_PORT,
    DEFAULT_PRIMARY_HOST,
};
use hatlink_core::{BridgeConfig, ChangePolicy, HostId};

/// Bridge Automation HAT inputs and outputs to OSC over UDP
#[derive(Parser, Debug)]
#[command(name = "hatlink", author, version, about, long_about = None)]
pub struct Args {
    /// Address the command listener binds to
    #[arg(long, env = "HATLINK_LISTEN_ADDRESS", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: IpAddr,

    /// Port the command listener binds to
    #[arg(long, env = "HATLINK_LISTEN_PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,

    /// Preferred telemetry receiver
    #[arg(long, env = "HATLINK_PRIMARY", default_value = DEFAULT_PRIMARY_HOST)]
    pub primary: String,

    /// Telemetry receiver used when the primary fails
    #[arg(long, env = "HATLINK_BACKUP", default_value = DEFAULT_BACKUP_HOST)]
    pub backup: String,

    /// UDP port on both receivers
    #[arg(long, env = "HATLINK_DESTINATION_PORT", default_value_t = DEFAULT_DESTINATION_PORT)]
    pub destination_port: u16,

    /// First segment of every outbound address (defaults to the hostname)
    #[arg(long, env = "HATLINK_HOST_ID")]
    pub host_id: Option<String>,

    /// Seconds without digital activity before a heartbeat is sent
    #[arg(long, env = "HATLINK_HEARTBEAT", default_value = "15", value_parser = parse_secs)]
    pub heartbeat: Duration,

    /// Seconds between polling cycles
    #[arg(long, env = "HATLINK_POLL_INTERVAL", default_value = "0.1", value_parser = parse_secs)]
    pub poll_interval: Duration,

    /// Minimum analog move that counts as a change (0 = any move)
    #[arg(long, env = "HATLINK_ANALOG_DEADBAND", default_value_t = 0.0)]
    pub analog_deadband: f32,

    /// Seconds allowed per destination for one send
    #[arg(long, env = "HATLINK_SEND_TIMEOUT", default_value = "0.5", value_parser = parse_secs)]
    pub send_timeout: Duration,

    /// Seconds allowed for tasks to stop before they are aborted
    #[arg(long, env = "HATLINK_SHUTDOWN_TIMEOUT", default_value = "2", value_parser = parse_secs)]
    pub shutdown_timeout: Duration,

    /// Command run on `/restart/0 1`, split on whitespace
    #[arg(long, env = "HATLINK_RESTART_COMMAND", default_value = "sudo reboot")]
    pub restart_command: String,

    /// Seconds the restart command may run
    #[arg(long, env = "HATLINK_RESTART_TIMEOUT", default_value = "10", value_parser = parse_secs)]
    pub restart_timeout: Duration,

    /// Run against an in-memory board and only log restart requests
    #[arg(long, env = "HATLINK_SIMULATE")]
    pub simulate: bool,

    /// Log filter, e.g. `debug` or `hatlink_bridge=trace` (overrides RUST_LOG)
    #[arg(long, env = "HATLINK_LOG")]
    pub log_level: Option<String>,
}

impl Args {
    /// Build and validate the bridge configuration.
    ///
    /// `hostname` is used when no host identifier was given.
    pub fn to_config(&self, hostname: &str) -> anyhow::Result<BridgeConfig> {
        let host_id = self.host_id.as_deref().unwrap_or(hostname);
        let host_id =
            HostId::new(host_id).with_context(|| format!("invalid host identifier '{host_id}'"))?;

        anyhow::ensure!(
            self.analog_deadband.is_finite() && self.analog_deadband >= 0.0,
            "analog dead-band must be a non-negative number, got {}",
            self.analog_deadband
        );

        let config = BridgeConfig {
            listen_address: self.listen_address,
            listen_port: self.listen_port,
            primary_host: self.primary.clone(),
            backup_host: self.backup.clone(),
            destination_port: self.destination_port,
            host_id,
            heartbeat_interval: self.heartbeat,
            poll_interval: self.poll_interval,
            analog_policy: ChangePolicy::from_deadband(self.analog_deadband),
            send_timeout: self.send_timeout,
            shutdown_timeout: self.shutdown_timeout,
            restart_command: self
                .restart_command
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            restart_timeout: self.restart_timeout,
        };
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Parse fractional seconds, e.g. `0.25`.
fn parse_secs(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("'{value}': {e}"))
}

/// Machine hostname: `HOSTNAME`, then the kernel's, then `localhost`.
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
