/// Errors raised while loading or validating descriptors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The descriptor file could not be loaded.
    #[error("failed to load descriptor: {0}")]
    LoadFailed(String),

    /// The descriptor is not valid JSON or does not match the expected shape.
    #[error("descriptor is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Message ID 0 is reserved.
    #[error("message {name} uses reserved ID 0")]
    ReservedMessageId { name: String },

    /// Two messages share an ID.
    #[error("message ID {id} assigned to both {first} and {second}")]
    DuplicateMessageId {
        id: u8,
        first: String,
        second: String,
    },

    /// A message appears twice in the message table.
    #[error("message {0} has more than one ID")]
    DuplicateMessageName(String),

    /// A message ID does not fit in one byte.
    #[error("message {name} has ID {number}, outside 1..=255")]
    MessageIdOutOfRange { name: String, number: i64 },

    /// A message-table entry names no declared struct.
    #[error("message {0} is not a declared struct")]
    UnknownStruct(String),

    /// A field refers to a type that is neither primitive nor declared.
    #[error("{owner}.{field} refers to unknown type {name}")]
    UnresolvedType {
        owner: String,
        field: String,
        name: String,
    },

    /// An enum's underlying type is not an integer.
    #[error("enum {name} has non-integer underlying type {ty}")]
    InvalidEnumType { name: String, ty: String },

    /// A protocol option has an unsupported value.
    #[error("invalid protocol option {name}: {message}")]
    InvalidOption { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
