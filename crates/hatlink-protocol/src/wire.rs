//! OSC 1.0 binary encoding.
//!
//! Every OSC element is aligned to 4 bytes. Strings are null-terminated and
//! padded with further nulls; blobs carry a big-endian length prefix and are
//! padded the same way. Numbers are big-endian.
//!
//! ```text
//! message := address-string type-tag-string argument*
//! bundle  := "#bundle\0" timetag:u64 (size:i32 packet)*
//! ```
//!
//! The decoder is strict about alignment and lengths and never panics on
//! malformed input; every failure maps to a [`hatlink_core::Error`].

use bytes::{BufMut, BytesMut};
use hatlink_core::{Error, Result};

use crate::{OscArg, OscBundle, OscMessage, OscPacket};

/// Marker that opens every bundle, terminator included.
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// Nested bundles deeper than this are rejected.
pub const MAX_BUNDLE_DEPTH: usize = 8;

/// Round `len` up to the next multiple of four.
#[inline]
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Bytes needed to encode a string including its terminator and padding.
#[inline]
fn osc_string_len(s: &str) -> usize {
    padded_len(s.len() + 1)
}

fn put_osc_string(dst: &mut BytesMut, s: &str) {
    dst.put_slice(s.as_bytes());
    let pad = osc_string_len(s) - s.len();
    dst.put_bytes(0, pad);
}

fn put_blob(dst: &mut BytesMut, blob: &[u8]) -> Result<()> {
    let len = i32::try_from(blob.len())
        .map_err(|_| Error::InvalidPacket(format!("blob of {} bytes is too long", blob.len())))?;
    dst.put_i32(len);
    dst.put_slice(blob);
    dst.put_bytes(0, padded_len(blob.len()) - blob.len());
    Ok(())
}

/// Encoded size of a message, without writing it.
pub fn message_len(msg: &OscMessage) -> usize {
    let args: usize = msg
        .args
        .iter()
        .map(|arg| match arg {
            OscArg::Int(_) | OscArg::Float(_) => 4,
            OscArg::Long(_) | OscArg::Double(_) => 8,
            OscArg::Str(s) => osc_string_len(s),
            OscArg::Blob(b) => 4 + padded_len(b.len()),
            OscArg::True | OscArg::False | OscArg::Nil => 0,
        })
        .sum();
    osc_string_len(&msg.address) + padded_len(msg.args.len() + 2) + args
}

/// Append the wire form of `msg` to `dst`.
///
/// # Errors
/// Returns `Error::InvalidAddress` if the address does not start with `/`
/// or contains a null byte.
pub fn encode_message(msg: &OscMessage, dst: &mut BytesMut) -> Result<()> {
    if !msg.address.starts_with('/') || msg.address.contains('\0') {
        return Err(Error::InvalidAddress(msg.address.clone()));
    }

    dst.reserve(message_len(msg));
    put_osc_string(dst, &msg.address);
    put_osc_string(dst, &msg.type_tags());

    for arg in &msg.args {
        match arg {
            OscArg::Int(v) => dst.put_i32(*v),
            OscArg::Float(v) => dst.put_f32(*v),
            OscArg::Long(v) => dst.put_i64(*v),
            OscArg::Double(v) => dst.put_f64(*v),
            OscArg::Str(s) => {
                if s.contains('\0') {
                    return Err(Error::InvalidPacket(
                        "string argument contains a null byte".to_string(),
                    ));
                }
                put_osc_string(dst, s);
            }
            OscArg::Blob(b) => put_blob(dst, b)?,
            OscArg::True | OscArg::False | OscArg::Nil => {}
        }
    }
    Ok(())
}

/// Append the wire form of `packet` to `dst`.
pub fn encode_packet(packet: &OscPacket, dst: &mut BytesMut) -> Result<()> {
    match packet {
        OscPacket::Message(msg) => encode_message(msg, dst),
        OscPacket::Bundle(bundle) => {
            dst.put_slice(BUNDLE_TAG);
            dst.put_u64(bundle.timetag);
            for element in &bundle.content {
                let mut inner = BytesMut::new();
                encode_packet(element, &mut inner)?;
                let len = i32::try_from(inner.len()).map_err(|_| {
                    Error::InvalidPacket("bundle element is too long".to_string())
                })?;
                dst.put_i32(len);
                dst.put_slice(&inner);
            }
            Ok(())
        }
    }
}

/// Decode one datagram into a packet.
///
/// # Errors
/// Returns an error for empty, misaligned or truncated input, unknown type
/// tags, invalid UTF-8 strings and bundles nested deeper than
/// [`MAX_BUNDLE_DEPTH`].
pub fn decode_packet(data: &[u8]) -> Result<OscPacket> {
    decode_at_depth(data, 0)
}

fn decode_at_depth(data: &[u8], depth: usize) -> Result<OscPacket> {
    if data.is_empty() {
        return Err(Error::InvalidPacket("empty packet".to_string()));
    }
    if data.len() % 4 != 0 {
        return Err(Error::InvalidPacket(format!(
            "packet length {} is not a multiple of 4",
            data.len()
        )));
    }

    if data.starts_with(BUNDLE_TAG) {
        if depth >= MAX_BUNDLE_DEPTH {
            return Err(Error::InvalidPacket(format!(
                "bundles nested deeper than {MAX_BUNDLE_DEPTH}"
            )));
        }
        decode_bundle(data, depth).map(OscPacket::Bundle)
    } else if data[0] == b'/' {
        decode_message(data).map(OscPacket::Message)
    } else {
        Err(Error::InvalidPacket(
            "packet is neither a message nor a bundle".to_string(),
        ))
    }
}

fn decode_bundle(data: &[u8], depth: usize) -> Result<OscBundle> {
    let mut reader = Reader::new(data);
    reader.take(BUNDLE_TAG.len())?;
    let timetag = reader.u64()?;

    let mut content = Vec::new();
    while !reader.is_empty() {
        let size = reader.i32()?;
        let size = usize::try_from(size)
            .map_err(|_| Error::InvalidPacket(format!("negative bundle element size {size}")))?;
        let element = reader.take(size)?;
        content.push(decode_at_depth(element, depth + 1)?);
    }

    Ok(OscBundle { timetag, content })
}

fn decode_message(data: &[u8]) -> Result<OscMessage> {
    let mut reader = Reader::new(data);
    let address = reader.osc_string()?;

    // Type tags are optional in very old senders; treat absence as no arguments.
    if reader.is_empty() {
        return Ok(OscMessage::new(address, Vec::new()));
    }

    let tags = reader.osc_string()?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(Error::InvalidPacket(format!(
            "type tag string '{tags}' does not start with ','"
        )));
    };

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscArg::Int(reader.i32()?),
            'f' => OscArg::Float(f32::from_bits(reader.u32()?)),
            'h' => OscArg::Long(reader.u64()? as i64),
            'd' => OscArg::Double(f64::from_bits(reader.u64()?)),
            's' => OscArg::Str(reader.osc_string()?),
            'b' => OscArg::Blob(reader.blob()?),
            'T' => OscArg::True,
            'F' => OscArg::False,
            'N' => OscArg::Nil,
            other => return Err(Error::UnsupportedTypeTag(other)),
        };
        args.push(arg);
    }

    if !reader.is_empty() {
        return Err(Error::InvalidPacket(format!(
            "{} trailing bytes after arguments",
            reader.remaining()
        )));
    }

    Ok(OscMessage::new(address, args))
}

/// Cursor over a datagram with bounds-checked, alignment-aware reads.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedPacket {
                offset: self.offset,
                needed: len,
            });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn i32(&mut self) -> Result<i32> {
        self.u32().map(|v| v as i32)
    }

    fn u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    fn osc_string(&mut self) -> Result<String> {
        let rest = &self.data[self.offset..];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(Error::TruncatedPacket {
                offset: self.offset,
                needed: rest.len() + 1,
            });
        };
        let start = self.offset;
        let bytes = self.take(padded_len(nul + 1))?;
        if bytes[nul..].iter().any(|&b| b != 0) {
            return Err(Error::InvalidPacket(format!(
                "non-zero padding after string at offset {start}"
            )));
        }
        std::str::from_utf8(&bytes[..nul])
            .map(str::to_string)
            .map_err(|_| Error::InvalidPacket(format!("invalid UTF-8 string at offset {start}")))
    }

    fn blob(&mut self) -> Result<Vec<u8>> {
        let len = self.i32()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::InvalidPacket(format!("negative blob length {len}")))?;
        let bytes = self.take(padded_len(len))?;
        Ok(bytes[..len].to_vec())
    }
}
