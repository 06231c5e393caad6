//! Tokio codec for OSC over UDP.
//!
//! This module provides a Tokio-compatible codec that plugs the OSC wire
//! format into `tokio_util::udp::UdpFramed`, so the command listener reads
//! decoded [`OscPacket`]s straight off the socket and the sender encodes
//! messages into a reusable buffer.
//!
//! # Architecture
//!
//! ```text
//! UDP datagram -> Decoder -> OscPacket (message or bundle)
//! OscMessage   -> Encoder -> UDP datagram
//! ```
//!
//! Unlike a stream codec, every call to [`Decoder::decode`] sees exactly one
//! datagram. The codec therefore consumes the whole buffer on every call,
//! including failed ones, so a malformed datagram can never wedge the stream.
//!
//! # Usage with UdpFramed
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use hatlink_protocol::OscCodec;
//! use tokio::net::UdpSocket;
//! use tokio_util::udp::UdpFramed;
//!
//! # async fn example() -> hatlink_core::Result<()> {
//! let socket = UdpSocket::bind("0.0.0.0:7000").await?;
//! let mut framed = UdpFramed::new(socket, OscCodec::new());
//!
//! while let Some(result) = framed.next().await {
//!     match result {
//!         Ok((packet, peer)) => println!("{peer}: {packet:?}"),
//!         Err(e) => eprintln!("dropped datagram: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # DoS Protection
//!
//! Datagrams larger than the configured maximum (default 64 KB) are
//! rejected before parsing, and bundle nesting is bounded.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::wire::{decode_packet, encode_message, encode_packet};
use crate::{OscMessage, OscPacket};
use hatlink_core::{Error, Result};

/// Default maximum packet size in bytes (64 KB).
const DEFAULT_MAX_PACKET_SIZE: usize = 64 * 1024;

/// Tokio codec for OSC packets.
#[derive(Debug, Clone)]
pub struct OscCodec {
    /// Packets larger than this are rejected in both directions.
    max_packet_size: usize,
}

impl OscCodec {
    /// Create a new codec with the default maximum packet size.
    ///
    /// # Example
    ///
    /// ```
    /// use hatlink_protocol::OscCodec;
    ///
    /// let codec = OscCodec::new();
    /// assert_eq!(codec.max_packet_size(), 64 * 1024);
    /// ```
    pub fn new() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }

    /// Create a new codec with a custom maximum packet size.
    pub fn with_max_packet_size(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    /// Get the current maximum packet size.
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_packet_size {
            return Err(Error::PacketTooLarge {
                size,
                max_size: self.max_packet_size,
            });
        }
        Ok(())
    }
}

impl Default for OscCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for OscCodec {
    type Item = OscPacket;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        // Take the whole datagram up front so errors leave an empty buffer.
        let datagram = src.split();
        self.check_size(datagram.len())?;
        decode_packet(&datagram).map(Some)
    }
}

impl Encoder<OscMessage> for OscCodec {
    type Error = Error;

    fn encode(&mut self, item: OscMessage, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        encode_message(&item, dst)?;
        if let Err(e) = self.check_size(dst.len() - start) {
            dst.truncate(start);
            return Err(e);
        }
        Ok(())
    }
}

impl Encoder<OscPacket> for OscCodec {
    type Error = Error;

    fn encode(&mut self, item: OscPacket, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        encode_packet(&item, dst)?;
        if let Err(e) = self.check_size(dst.len() - start) {
            dst.truncate(start);
            return Err(e);
        }
        Ok(())
    }
}
