//! Digital input monitoring and heartbeat.
//!
//! Each cycle samples every digital input, publishes `/{host}/DI{n}` for
//! each edge and pushes the heartbeat deadline out. After the inputs, if the
//! deadline has passed without activity, `/{host}/heartbeat 1` is published
//! and the deadline re-armed.
//!
//! [`InputMonitor::poll_cycle`] takes the cycle time as an argument so the
//! heartbeat logic can be stepped deterministically.

use std::sync::Arc;
use std::time::Duration;

use hatlink_core::ChangePolicy;
use hatlink_core::constants::DIGITAL_INPUT_COUNT;
use hatlink_hardware::{AnyBoard, IoBackend};
use hatlink_protocol::AddressBook;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cycle::{CycleReport, wait_next_cycle};
use crate::heartbeat::HeartbeatDeadline;
use crate::publisher::{Publisher, SignalLevel};
use crate::state::ChannelState;

/// Background task publishing digital edges and heartbeats.
#[derive(Debug)]
pub struct InputMonitor {
    board: Arc<AnyBoard>,
    publisher: Arc<Publisher>,
    addresses: Arc<AddressBook>,
    state: ChannelState<u8>,
    heartbeat: HeartbeatDeadline,
    interval: Duration,
}

impl InputMonitor {
    pub fn new(
        board: Arc<AnyBoard>,
        publisher: Arc<Publisher>,
        addresses: Arc<AddressBook>,
        heartbeat_interval: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            board,
            publisher,
            addresses,
            state: ChannelState::new(DIGITAL_INPUT_COUNT),
            heartbeat: HeartbeatDeadline::new(heartbeat_interval, Instant::now()),
            interval: poll_interval,
        }
    }

    /// Re-arm the heartbeat one full interval after `now`.
    pub fn reset_heartbeat(&mut self, now: Instant) {
        self.heartbeat.reset(now);
    }

    /// Sample every input once at time `now`.
    pub async fn poll_cycle(&mut self, now: Instant) -> CycleReport {
        let mut report = CycleReport::default();

        for line in 0..DIGITAL_INPUT_COUNT {
            let value = match self.board.read_digital(line).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(line, error = %e, "Digital read failed");
                    report.read_errors += 1;
                    continue;
                }
            };

            if self.state.observe(line, value, ChangePolicy::Exact).is_none() {
                continue;
            }
            debug!(line, value, "Digital input changed");
            report.changes += 1;
            self.heartbeat.reset(now);

            if let Some(message) = self.addresses.digital_message(line, value)
                && self.publisher.publish(message, SignalLevel::Digital).await
            {
                report.delivered += 1;
            }
        }

        if self.heartbeat.fire(now) {
            report.heartbeat = true;
            let message = self.addresses.heartbeat_message();
            if self.publisher.publish(message, SignalLevel::Heartbeat).await {
                report.delivered += 1;
            }
        }

        report
    }

    /// Poll until `token` is cancelled.
    pub async fn run(mut self, token: CancellationToken) {
        info!(
            interval = ?self.interval,
            heartbeat = ?self.heartbeat.interval(),
            "Input monitor started"
        );
        self.reset_heartbeat(Instant::now());

        while !token.is_cancelled() {
            let report = self.poll_cycle(Instant::now()).await;
            if report.changes > 0 || report.read_errors > 0 {
                debug!(?report, "Input cycle");
            }
            if !wait_next_cycle(&token, self.interval).await {
                break;
            }
        }
        info!("Input monitor stopped");
    }

    pub fn state(&self) -> &ChannelState<u8> {
        &self.state
    }

    pub fn heartbeat(&self) -> &HeartbeatDeadline {
        &self.heartbeat
    }
}
