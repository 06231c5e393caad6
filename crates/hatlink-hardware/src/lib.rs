//! Board abstraction for the hatlink I/O bridge.
//!
//! This crate defines the [`IoBackend`] trait the bridge uses to sample
//! inputs and drive actuators, plus the backends it ships with:
//!
//! - [`MockBoard`](mock::MockBoard): in-memory lines with a control handle,
//!   used by tests and by `hatlink --simulate`.
//! - [`AbsentBoard`](absent::AbsentBoard): reads zero, ignores writes. Used
//!   when no hardware answers, so every handler keeps working dry.
//! - [`AnyBoard`](devices::AnyBoard): enum dispatch over the above.
//!
//! # Line Model
//!
//! ```text
//! digital inputs  0..3  read_digital -> 0 | 1
//! analog inputs   0..3  read_analog  -> volts
//! relays          0..3  write(Relay(i),  level > 0 = on)
//! outputs         0..3  write(Output(i), level > 0 = on)
//! lights   power/comms/warn  write(Light(l), brightness)
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`]. The bridge never lets one escape a polling cycle.

pub mod absent;
pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use devices::AnyBoard;
pub use error::{HardwareError, Result};
pub use traits::IoBackend;
pub use types::{Actuator, BoardInfo};
