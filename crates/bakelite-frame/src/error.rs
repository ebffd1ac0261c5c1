/// Malformed byte-stuffed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A block length byte of zero appeared inside frame content.
    #[error("unexpected null byte at offset {offset}")]
    UnexpectedNull { offset: usize },

    /// A block claims more bytes than remain in the input.
    #[error("block length exceeds available data (block {block_len}, available {available})")]
    BlockOverrun { block_len: usize, available: usize },
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Attempted to frame an empty payload.
    #[error("cannot encode an empty frame")]
    EmptyPayload,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The stuffed frame content is malformed.
    #[error("frame decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The CRC trailer is missing or does not match the payload.
    #[error("CRC check failed")]
    CrcCheckFailure,

    /// An incoming frame grew past the configured maximum and was dropped.
    #[error("incoming frame exceeds {max} encoded bytes, discarded")]
    FrameTooLong { max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
