//! Telemetry publishing with indicator feedback.
//!
//! [`Publisher`] pairs the [`FailoverSender`] with the board's status
//! lights so that every outbound message is visible on the HAT:
//!
//! | Moment              | comms                      | warn |
//! |---------------------|----------------------------|------|
//! | before the send     | 0.1                        | -    |
//! | delivered           | 0.3 (analog, heartbeat), 0.5 (digital) | off |
//! | not delivered       | off                        | on   |
//!
//! Light writes are best-effort: a failing light never affects delivery
//! and never reaches the caller.

use std::sync::Arc;

use hatlink_core::Light;
use hatlink_core::constants::{COMMS_LEVEL_SENDING, COMMS_LEVEL_SENT, COMMS_LEVEL_SENT_DIGITAL};
use hatlink_hardware::{Actuator, AnyBoard, IoBackend};
use hatlink_network::{FailoverSender, SenderStats};
use hatlink_protocol::OscMessage;
use tracing::{debug, info};

/// Which kind of telemetry is being published; selects the comms level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalLevel {
    Analog,
    Digital,
    Heartbeat,
}

impl SignalLevel {
    /// Comms brightness after a successful send.
    pub fn delivered_level(self) -> f32 {
        match self {
            Self::Digital => COMMS_LEVEL_SENT_DIGITAL,
            Self::Analog | Self::Heartbeat => COMMS_LEVEL_SENT,
        }
    }
}

/// Sender plus status lights.
#[derive(Debug)]
pub struct Publisher {
    sender: FailoverSender,
    board: Arc<AnyBoard>,
}

impl Publisher {
    pub fn new(sender: FailoverSender, board: Arc<AnyBoard>) -> Self {
        Self { sender, board }
    }

    /// Deliver one message and reflect the outcome on the lights.
    ///
    /// Returns whether any destination accepted the message.
    pub async fn publish(&self, message: OscMessage, level: SignalLevel) -> bool {
        self.indicate(Light::Comms, COMMS_LEVEL_SENDING).await;

        let delivered = self.sender.deliver(&message).await.is_delivered();
        if delivered {
            info!(message = %message, "Published");
            self.indicate(Light::Comms, level.delivered_level()).await;
            self.indicate(Light::Warn, 0.0).await;
        } else {
            self.indicate(Light::Comms, 0.0).await;
            self.indicate(Light::Warn, 1.0).await;
        }
        delivered
    }

    /// Lights shown once the bridge is up: power on, comms and warn off.
    pub async fn show_startup(&self) {
        self.indicate(Light::Power, 1.0).await;
        self.indicate(Light::Comms, 0.0).await;
        self.indicate(Light::Warn, 0.0).await;
    }

    /// Power light off as the bridge stops.
    pub async fn show_shutdown(&self) {
        self.indicate(Light::Power, 0.0).await;
    }

    /// Best-effort light write.
    pub async fn indicate(&self, light: Light, level: f32) {
        if let Err(e) = self.board.write(Actuator::Light(light), level).await {
            debug!(light = %light, level, error = %e, "Indicator write failed");
        }
    }

    pub fn stats(&self) -> SenderStats {
        self.sender.stats()
    }

    pub fn board(&self) -> &Arc<AnyBoard> {
        &self.board
    }
}
