use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Truncated packet: needed {needed} bytes at offset {offset}")]
    TruncatedPacket { offset: usize, needed: usize },

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Unsupported type tag: '{0}'")]
    UnsupportedTypeTag(char),

    #[error("Packet too large: {size} bytes (max {max_size})")]
    PacketTooLarge { size: usize, max_size: usize },

    // Addressing errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Index {index} out of range for {kind} (0..{limit})")]
    IndexOutOfRange {
        kind: String,
        index: usize,
        limit: usize,
    },

    #[error("Invalid index '{0}'")]
    InvalidIndex(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid host identifier: {0}")]
    InvalidHostId(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
