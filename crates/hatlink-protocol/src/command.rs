//! Inbound command parsing.
//!
//! Inbound messages address an actuator as `/{kind}/{index}` with a single
//! integer argument, e.g. `/relay/1 1`. The set of valid routes is closed:
//! four capability kinds ([`ActuatorKind`]) times three indices. Anything
//! outside that set is rejected here, at the boundary, so handlers only ever
//! see a validated [`ActuatorCommand`].
//!
//! # Address Rules
//!
//! - The address is split on `/` and empty segments are dropped, so
//!   `//relay//1` is the same as `/relay/1`.
//! - Exactly two segments remain: the kind, then the index. Anything
//!   longer (`/hat-01/relay/1`) or shorter is rejected as an invalid
//!   address, so only the twelve canonical routes ever reach a handler.
//!
//! # Payload Rules
//!
//! Relay, LED and output commands take their value from the first argument
//! and accept anything with an obvious integer reading (`1`, `1.0`, `"1"`,
//! `T`). Restart commands are strict: exactly one argument, and it must be
//! an integer on the wire.
//!
//! ```
//! use hatlink_protocol::{ActuatorCommand, OscArg, OscMessage};
//! use hatlink_core::ActuatorKind;
//!
//! let msg = OscMessage::with_arg("/relay/1", 1);
//! let cmd = ActuatorCommand::from_message(&msg).unwrap();
//! assert_eq!(cmd.route.kind, ActuatorKind::Relay);
//! assert_eq!(cmd.route.index, 1);
//! assert!(cmd.is_on());
//!
//! let sloppy = OscMessage::with_arg("/restart/0", OscArg::Float(1.0));
//! assert!(ActuatorCommand::from_message(&sloppy).is_err());
//! ```

use hatlink_core::{ActuatorKind, Error, Result};
use std::fmt;

use crate::OscMessage;

/// A validated `(kind, index)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub kind: ActuatorKind,
    pub index: usize,
}

impl Route {
    /// Create a route, checking the index against the capability's range.
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfRange` when `index` is not valid for `kind`.
    pub fn new(kind: ActuatorKind, index: usize) -> Result<Self> {
        let limit = kind.index_limit();
        if index >= limit {
            return Err(Error::IndexOutOfRange {
                kind: kind.to_string(),
                index,
                limit,
            });
        }
        Ok(Self { kind, index })
    }

    /// Parse an inbound address into a route.
    ///
    /// # Errors
    /// - `Error::InvalidAddress` unless exactly two segments remain
    /// - `Error::UnknownRoute` when the kind segment is not a capability
    /// - `Error::InvalidIndex` when the index segment is not a number
    /// - `Error::IndexOutOfRange` when the index is outside the capability
    pub fn parse(address: &str) -> Result<Self> {
        let segments: Vec<&str> = address.split('/').filter(|s| !s.is_empty()).collect();
        let [kind, index] = segments.as_slice() else {
            return Err(Error::InvalidAddress(address.to_string()));
        };

        let kind =
            ActuatorKind::from_segment(kind).ok_or_else(|| Error::UnknownRoute(address.to_string()))?;
        let index: usize = index
            .parse()
            .map_err(|_| Error::InvalidIndex((*index).to_string()))?;

        Self::new(kind, index)
    }

    /// Every valid route, in registration order.
    pub fn all() -> impl Iterator<Item = Route> {
        ActuatorKind::ALL.into_iter().flat_map(|kind| {
            (0..kind.index_limit()).map(move |index| Route { kind, index })
        })
    }

    /// Canonical address for this route.
    pub fn address(&self) -> String {
        format!("/{}/{}", self.kind, self.index)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.kind, self.index)
    }
}

/// A parsed inbound command: which actuator, and the requested value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub route: Route,
    pub value: i64,
}

impl ActuatorCommand {
    /// Parse and validate an inbound message.
    ///
    /// # Errors
    /// Returns the route errors of [`Route::parse`], or
    /// `Error::InvalidPayload` when the arguments do not carry a usable value.
    pub fn from_message(msg: &OscMessage) -> Result<Self> {
        let route = Route::parse(&msg.address)?;

        let value = match route.kind {
            ActuatorKind::Restart => match msg.args.as_slice() {
                [arg] => arg.as_int_exact().ok_or_else(|| {
                    Error::InvalidPayload(format!(
                        "{route} requires an integer argument, got '{}'",
                        arg.type_tag()
                    ))
                })?,
                args => {
                    return Err(Error::InvalidPayload(format!(
                        "{route} requires exactly one argument, got {}",
                        args.len()
                    )));
                }
            },
            _ => {
                let first = msg.args.first().ok_or_else(|| {
                    Error::InvalidPayload(format!("{route} requires an argument"))
                })?;
                first.as_int_lenient().ok_or_else(|| {
                    Error::InvalidPayload(format!("{route} cannot use argument {first}"))
                })?
            }
        };

        Ok(Self { route, value })
    }

    /// Whether the requested state is "on" (any non-zero value).
    pub fn is_on(&self) -> bool {
        self.value != 0
    }
}
