//! Outbound telemetry with primary/backup failover.
//!
//! # Architecture
//!
//! ```text
//! AnalogPoller ──┐
//!                ├─> FailoverSender ──(UDP)──> primary   (tried first)
//! InputMonitor ──┘         │
//!                          └────────(UDP)──> backup    (tried once on failure)
//! ```
//!
//! Each destination gets one connected UDP socket, opened at startup and
//! reused for every message. A destination that cannot be resolved at
//! startup is retried on the next send rather than failing the bridge, so a
//! host that boots before its network is up still recovers.
//!
//! # Delivery Semantics
//!
//! [`FailoverSender::deliver`] never returns an error and never panics. It
//! reports what happened as a [`Delivery`]:
//!
//! - [`Delivery::Primary`]: the primary accepted the datagram.
//! - [`Delivery::Backup`]: the primary failed, the backup accepted it.
//! - [`Delivery::Failed`]: both failed; both reasons are kept.
//!
//! "Accepted" means the local stack took the datagram. UDP offers nothing
//! stronger, but a connected socket does surface ICMP port-unreachable from
//! an earlier datagram as `ECONNREFUSED`, which triggers failover.
//!
//! # Timeout Handling
//!
//! Resolution and every send are bounded by [`SenderConfig::timeout`], so a
//! single `deliver` call waits at most twice the timeout per destination.

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use hatlink_core::constants::{
    DEFAULT_BACKUP_HOST, DEFAULT_DESTINATION_PORT, DEFAULT_PRIMARY_HOST, DEFAULT_SEND_TIMEOUT_MS,
};
use hatlink_core::{BridgeConfig, Destination};
use hatlink_protocol::{OscCodec, OscMessage};
use serde::Serialize;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::OnceCell;
use tokio_util::codec::Encoder;
use tracing::{debug, info, trace, warn};

/// Configuration for the failover sender
///
/// # Example
///
/// ```
/// use hatlink_core::Destination;
/// use hatlink_network::SenderConfig;
/// use std::time::Duration;
///
/// let config = SenderConfig {
///     primary: Destination::new("10.0.0.123", 8000),
///     backup: Destination::new("172.22.22.108", 8000),
///     timeout: Duration::from_millis(500),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    /// Destination tried first for every message
    pub primary: Destination,

    /// Destination tried once when the primary fails
    pub backup: Destination,

    /// Bound on resolving and on each send
    pub timeout: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            primary: Destination::new(DEFAULT_PRIMARY_HOST, DEFAULT_DESTINATION_PORT),
            backup: Destination::new(DEFAULT_BACKUP_HOST, DEFAULT_DESTINATION_PORT),
            timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        }
    }
}

impl From<&BridgeConfig> for SenderConfig {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            primary: config.primary(),
            backup: config.backup(),
            timeout: config.send_timeout,
        }
    }
}

/// Why a single destination did not take a datagram
#[derive(Debug, Error)]
pub enum SendError {
    /// Name lookup failed or returned nothing
    #[error("Cannot resolve {destination}: {reason}")]
    Unresolved { destination: String, reason: String },

    /// Resolution or send did not finish in time
    #[error("Send to {destination} timed out after {timeout_ms}ms")]
    Timeout { destination: String, timeout_ms: u64 },

    /// Socket level failure (unreachable, refused, no route)
    #[error("Send to {destination} failed: {source}")]
    Io {
        destination: String,
        #[source]
        source: io::Error,
    },
}

impl SendError {
    fn unresolved(destination: &Destination, reason: impl Into<String>) -> Self {
        Self::Unresolved {
            destination: destination.to_string(),
            reason: reason.into(),
        }
    }

    fn timeout(destination: &Destination, timeout: Duration) -> Self {
        Self::Timeout {
            destination: destination.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    fn io(destination: &Destination, source: io::Error) -> Self {
        Self::Io {
            destination: destination.to_string(),
            source,
        }
    }
}

/// Outcome of one [`FailoverSender::deliver`] call.
#[derive(Debug)]
pub enum Delivery {
    /// Sent to the primary destination.
    Primary,
    /// Primary failed, sent to the backup.
    Backup { primary: SendError },
    /// Neither destination took the datagram.
    Failed {
        primary: SendError,
        backup: SendError,
    },
    /// The message could not be encoded; nothing was sent.
    Unencodable(hatlink_core::Error),
}

impl Delivery {
    /// Whether any destination accepted the message.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Primary | Self::Backup { .. })
    }
}

/// Delivery counters since startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SenderStats {
    pub primary: u64,
    pub backup: u64,
    pub failed: u64,
    pub last_success: Option<DateTime<Utc>>,
}

impl SenderStats {
    fn record(&mut self, delivery: &Delivery) {
        match delivery {
            Delivery::Primary => self.primary += 1,
            Delivery::Backup { .. } => self.backup += 1,
            Delivery::Failed { .. } | Delivery::Unencodable(_) => self.failed += 1,
        }
        if delivery.is_delivered() {
            self.last_success = Some(Utc::now());
        }
    }
}

/// One destination and its lazily opened socket.
#[derive(Debug)]
struct Link {
    destination: Destination,
    socket: OnceCell<UdpSocket>,
}

impl Link {
    fn new(destination: Destination) -> Self {
        Self {
            destination,
            socket: OnceCell::new(),
        }
    }

    async fn socket(&self, timeout: Duration) -> Result<&UdpSocket, SendError> {
        self.socket
            .get_or_try_init(|| async {
                match tokio::time::timeout(timeout, open(&self.destination)).await {
                    Ok(result) => result,
                    Err(_) => Err(SendError::timeout(&self.destination, timeout)),
                }
            })
            .await
    }

    async fn send(&self, datagram: &[u8], timeout: Duration) -> Result<(), SendError> {
        let socket = self.socket(timeout).await?;
        match tokio::time::timeout(timeout, socket.send(datagram)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(SendError::io(&self.destination, e)),
            Err(_) => Err(SendError::timeout(&self.destination, timeout)),
        }
    }
}

/// Resolve a destination and connect a fresh UDP socket to it.
async fn open(destination: &Destination) -> Result<UdpSocket, SendError> {
    let addr = tokio::net::lookup_host((destination.host.as_str(), destination.port))
        .await
        .map_err(|e| SendError::unresolved(destination, e.to_string()))?
        .next()
        .ok_or_else(|| SendError::unresolved(destination, "no addresses"))?;

    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local)
        .await
        .map_err(|e| SendError::io(destination, e))?;
    socket
        .connect(addr)
        .await
        .map_err(|e| SendError::io(destination, e))?;

    debug!(destination = %destination, resolved = %addr, "Destination socket ready");
    Ok(socket)
}

/// Sends telemetry to a primary destination, falling back to a backup.
///
/// `deliver` takes `&self`, so one sender is shared (behind an `Arc`) by
/// every polling task.
///
/// # Example
///
/// ```no_run
/// use hatlink_network::{FailoverSender, SenderConfig};
/// use hatlink_protocol::OscMessage;
///
/// # async fn example() -> hatlink_core::Result<()> {
/// let sender = FailoverSender::connect(&SenderConfig::default()).await?;
/// let delivery = sender.deliver(&OscMessage::with_arg("/hat-01/heartbeat", 1)).await;
/// if !delivery.is_delivered() {
///     eprintln!("telemetry lost: {delivery:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FailoverSender {
    primary: Link,
    backup: Link,
    timeout: Duration,
    stats: Mutex<SenderStats>,
}

impl FailoverSender {
    /// Open sockets for both destinations.
    ///
    /// Unresolvable destinations are logged and retried on first use; they
    /// do not fail construction.
    ///
    /// # Errors
    /// Returns `Error::Config` when the timeout is zero.
    pub async fn connect(config: &SenderConfig) -> hatlink_core::Result<Self> {
        if config.timeout.is_zero() {
            return Err(hatlink_core::Error::Config(
                "send timeout must be non-zero".to_string(),
            ));
        }

        let sender = Self {
            primary: Link::new(config.primary.clone()),
            backup: Link::new(config.backup.clone()),
            timeout: config.timeout,
            stats: Mutex::new(SenderStats::default()),
        };

        for (role, link) in [("primary", &sender.primary), ("backup", &sender.backup)] {
            match link.socket(sender.timeout).await {
                Ok(_) => info!(role, destination = %link.destination, "Telemetry destination ready"),
                Err(e) => warn!(
                    role,
                    destination = %link.destination,
                    error = %e,
                    "Telemetry destination unavailable, will retry on send"
                ),
            }
        }

        Ok(sender)
    }

    /// Send one message, primary first, backup once on failure.
    pub async fn deliver(&self, message: &OscMessage) -> Delivery {
        let mut datagram = BytesMut::new();
        if let Err(e) = Encoder::<OscMessage>::encode(&mut OscCodec::new(), message.clone(), &mut datagram) {
            warn!(address = %message.address, error = %e, "Cannot encode outbound message");
            return self.finish(Delivery::Unencodable(e));
        }

        let delivery = match self.primary.send(&datagram, self.timeout).await {
            Ok(()) => {
                trace!(address = %message.address, destination = %self.primary.destination, "Sent");
                Delivery::Primary
            }
            Err(primary) => {
                warn!(error = %primary, "Primary send failed, trying backup");
                match self.backup.send(&datagram, self.timeout).await {
                    Ok(()) => {
                        debug!(
                            address = %message.address,
                            destination = %self.backup.destination,
                            "Sent via backup"
                        );
                        Delivery::Backup { primary }
                    }
                    Err(backup) => {
                        warn!(
                            address = %message.address,
                            error = %backup,
                            "Backup send failed, message dropped"
                        );
                        Delivery::Failed { primary, backup }
                    }
                }
            }
        };

        self.finish(delivery)
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> SenderStats {
        self.lock_stats().clone()
    }

    pub fn primary(&self) -> &Destination {
        &self.primary.destination
    }

    pub fn backup(&self) -> &Destination {
        &self.backup.destination
    }

    fn finish(&self, delivery: Delivery) -> Delivery {
        self.lock_stats().record(&delivery);
        delivery
    }

    fn lock_stats(&self) -> MutexGuard<'_, SenderStats> {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
