//! OSC packet model.
//!
//! An OSC packet is either a single [`OscMessage`] (an address plus typed
//! arguments) or an [`OscBundle`] holding further packets. The bridge never
//! schedules bundles by time tag; [`OscPacket::into_messages`] flattens a
//! bundle into its messages in wire order.

use std::fmt;

/// A single typed OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    /// `i` - 32-bit big-endian integer.
    Int(i32),
    /// `f` - 32-bit big-endian IEEE float.
    Float(f32),
    /// `s` - null-terminated, 4-byte padded string.
    Str(String),
    /// `b` - length-prefixed, 4-byte padded byte blob.
    Blob(Vec<u8>),
    /// `h` - 64-bit big-endian integer.
    Long(i64),
    /// `d` - 64-bit big-endian IEEE float.
    Double(f64),
    /// `T` - true, no payload bytes.
    True,
    /// `F` - false, no payload bytes.
    False,
    /// `N` - nil, no payload bytes.
    Nil,
}

impl OscArg {
    /// Type tag character for this argument.
    pub fn type_tag(&self) -> char {
        match self {
            Self::Int(_) => 'i',
            Self::Float(_) => 'f',
            Self::Str(_) => 's',
            Self::Blob(_) => 'b',
            Self::Long(_) => 'h',
            Self::Double(_) => 'd',
            Self::True => 'T',
            Self::False => 'F',
            Self::Nil => 'N',
        }
    }

    /// Interpret the argument as an integer the way a forgiving controller
    /// expects: floats truncate toward zero, strings are parsed, booleans map
    /// to 1/0. Nil, blobs and non-finite floats have no integer value.
    pub fn as_int_lenient(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Self::Double(v) if v.is_finite() => Some(v.trunc() as i64),
            Self::Str(s) => s.trim().parse().ok(),
            Self::True => Some(1),
            Self::False => Some(0),
            _ => None,
        }
    }

    /// Integer value only when the argument is an integer on the wire.
    pub fn as_int_exact(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Nil => write!(f, "nil"),
        }
    }
}

impl From<i32> for OscArg {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for OscArg {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OscArg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// An OSC message: address plus arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Message carrying exactly one argument.
    pub fn with_arg(address: impl Into<String>, arg: impl Into<OscArg>) -> Self {
        Self::new(address, vec![arg.into()])
    }

    /// Type tag string as it appears on the wire, leading comma included.
    pub fn type_tags(&self) -> String {
        std::iter::once(',')
            .chain(self.args.iter().map(OscArg::type_tag))
            .collect()
    }
}

impl fmt::Display for OscMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// An OSC bundle. The time tag is carried but not acted on.
#[derive(Debug, Clone, PartialEq)]
pub struct OscBundle {
    pub timetag: u64,
    pub content: Vec<OscPacket>,
}

/// Anything that can travel in one datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle(OscBundle),
}

impl OscPacket {
    /// Flatten the packet into its messages, depth-first in wire order.
    pub fn into_messages(self) -> Vec<OscMessage> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(self, out: &mut Vec<OscMessage>) {
        match self {
            Self::Message(msg) => out.push(msg),
            Self::Bundle(bundle) => {
                for packet in bundle.content {
                    packet.collect_into(out);
                }
            }
        }
    }
}

impl From<OscMessage> for OscPacket {
    fn from(value: OscMessage) -> Self {
        Self::Message(value)
    }
}
