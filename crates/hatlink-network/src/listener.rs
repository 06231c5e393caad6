//! Inbound command socket.
//!
//! [`OscListener`] binds one UDP socket and yields decoded packets through
//! [`UdpFramed`]. A malformed datagram surfaces as
//! [`ListenerError::Malformed`] for that datagram only; the next `recv`
//! carries on with the following datagram.
//!
//! ```text
//! controller ──(UDP)──> OscListener ──> OscPacket ──> CommandDispatcher
//! ```

use futures::StreamExt;
use hatlink_protocol::{OscCodec, OscPacket};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio_util::udp::UdpFramed;
use tracing::{info, trace};

/// Errors that can occur while receiving commands
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The datagram was not a valid OSC packet
    #[error("Malformed datagram: {0}")]
    Malformed(hatlink_core::Error),

    /// Socket level failure
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The underlying stream ended
    #[error("Listener closed")]
    Closed,
}

impl ListenerError {
    /// Whether the listener can keep receiving after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl From<hatlink_core::Error> for ListenerError {
    fn from(error: hatlink_core::Error) -> Self {
        match error {
            hatlink_core::Error::Io(e) => Self::Io(e),
            other => Self::Malformed(other),
        }
    }
}

/// UDP listener yielding decoded OSC packets.
///
/// Dropping the listener closes its socket.
///
/// # Example
///
/// ```no_run
/// use hatlink_network::OscListener;
///
/// # async fn example() -> Result<(), hatlink_network::ListenerError> {
/// let mut listener = OscListener::bind("0.0.0.0:7000".parse().unwrap()).await?;
/// loop {
///     let (packet, peer) = listener.recv().await?;
///     for message in packet.into_messages() {
///         println!("{peer}: {message}");
///     }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct OscListener {
    framed: UdpFramed<OscCodec>,
    local_addr: SocketAddr,
}

impl OscListener {
    /// Bind the command socket.
    ///
    /// # Errors
    /// Returns `ListenerError::Io` if the address is unavailable.
    pub async fn bind(addr: SocketAddr) -> Result<Self, ListenerError> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        info!(address = %local_addr, "Listening for OSC commands");

        Ok(Self {
            framed: UdpFramed::new(socket, OscCodec::new()),
            local_addr,
        })
    }

    /// Address the socket is actually bound to (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive the next packet and its sender.
    ///
    /// Cancel safe: dropping the future before it completes loses no
    /// datagram that was not already being decoded.
    ///
    /// # Errors
    /// `Malformed` and `Io` are per-datagram and recoverable; `Closed` is not.
    pub async fn recv(&mut self) -> Result<(OscPacket, SocketAddr), ListenerError> {
        match self.framed.next().await {
            Some(Ok((packet, peer))) => {
                trace!(peer = %peer, "Received packet");
                Ok((packet, peer))
            }
            Some(Err(e)) => Err(e.into()),
            None => Err(ListenerError::Closed),
        }
    }
}
