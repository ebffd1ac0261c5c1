/// Errors that can occur while sending or receiving messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The name has a message ID but no struct descriptor.
    #[error("{0} is not a message struct")]
    NotAMessage(String),

    /// The name is not in the message table.
    #[error("no message ID for {0}")]
    NoMessageId(String),

    /// A received frame carried an ID absent from the message table.
    #[error("unknown message ID {0}")]
    UnknownMessageId(u8),

    /// A received frame had no message ID byte.
    #[error("received an empty frame")]
    EmptyFrame,

    /// A typed receive found a different message.
    #[error("expected message {expected}, received {found}")]
    UnexpectedMessage {
        expected: &'static str,
        found: String,
    },

    /// Framing or checksum error.
    #[error("frame error: {0}")]
    Frame(#[from] bakelite_frame::FrameError),

    /// Pack/unpack error.
    #[error("serialization error: {0}")]
    Serialization(#[from] bakelite_codec::SerializationError),

    /// Endpoint read/write error.
    #[error("transport error: {0}")]
    Transport(#[from] bakelite_transport::TransportError),

    /// Descriptor error while building a protocol.
    #[error("schema error: {0}")]
    Schema(#[from] bakelite_schema::SchemaError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
