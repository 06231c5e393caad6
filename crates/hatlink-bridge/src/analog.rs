//! Analog change detection.
//!
//! Every cycle samples each analog channel, compares it with the last
//! reported value under the configured [`ChangePolicy`], and publishes
//! `/{host}/A{n}` for each change. A channel that fails to read, including
//! one the board reports as NaN or infinite, keeps its last value and is
//! retried on the next cycle.

use std::sync::Arc;
use std::time::Duration;

use hatlink_core::ChangePolicy;
use hatlink_core::constants::ANALOG_INPUT_COUNT;
use hatlink_hardware::{AnyBoard, IoBackend};
use hatlink_protocol::AddressBook;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::cycle::{CycleReport, wait_next_cycle};
use crate::publisher::{Publisher, SignalLevel};
use crate::state::ChannelState;

/// Background task publishing analog changes.
#[derive(Debug)]
pub struct AnalogPoller {
    board: Arc<AnyBoard>,
    publisher: Arc<Publisher>,
    addresses: Arc<AddressBook>,
    state: ChannelState<f32>,
    policy: ChangePolicy,
    interval: Duration,
}

impl AnalogPoller {
    pub fn new(
        board: Arc<AnyBoard>,
        publisher: Arc<Publisher>,
        addresses: Arc<AddressBook>,
        policy: ChangePolicy,
        interval: Duration,
    ) -> Self {
        Self {
            board,
            publisher,
            addresses,
            state: ChannelState::new(ANALOG_INPUT_COUNT),
            policy,
            interval,
        }
    }

    /// Sample every channel once and publish the changes.
    pub async fn poll_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        for channel in 0..ANALOG_INPUT_COUNT {
            let value = match self.board.read_analog(channel).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(channel, error = %e, "Analog read failed");
                    report.read_errors += 1;
                    continue;
                }
            };

            let Some(previous) = self.state.observe(channel, value, self.policy) else {
                continue;
            };
            trace!(channel, previous, value, "Analog change");
            report.changes += 1;

            if let Some(message) = self.addresses.analog_message(channel, value)
                && self.publisher.publish(message, SignalLevel::Analog).await
            {
                report.delivered += 1;
            }
        }

        report
    }

    /// Poll until `token` is cancelled.
    pub async fn run(mut self, token: CancellationToken) {
        info!(interval = ?self.interval, policy = ?self.policy, "Analog poller started");
        while !token.is_cancelled() {
            let report = self.poll_cycle().await;
            if report != CycleReport::default() {
                debug!(?report, "Analog cycle");
            }
            if !wait_next_cycle(&token, self.interval).await {
                break;
            }
        }
        info!("Analog poller stopped");
    }

    pub fn state(&self) -> &ChannelState<f32> {
        &self.state
    }
}
