pub mod address;
pub mod codec;
pub mod command;
pub mod message;
pub mod wire;

pub use address::{AddressBook, analog_address, digital_address, heartbeat_address};
pub use codec::OscCodec;
pub use command::{ActuatorCommand, Route};
pub use message::{OscArg, OscBundle, OscMessage, OscPacket};
pub use wire::{decode_packet, encode_message, encode_packet};
