/// Errors raised while packing or unpacking values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    /// Input ended before the value was complete.
    #[error("input truncated: needed {needed} more bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// A decoded string was not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// A type name is neither primitive nor registered.
    #[error("{0} is not a primitive type, struct, or enum")]
    UnknownType(String),

    /// A struct was required but the name is registered as an enum.
    #[error("{0} is not a struct")]
    NotAStruct(String),

    /// The value's shape does not match the declared type.
    #[error("expected {expected}, got {found}")]
    KindMismatch {
        expected: String,
        found: &'static str,
    },

    /// An integer does not fit the declared width.
    #[error("{value} out of range for {ty}")]
    IntegerOutOfRange { ty: &'static str, value: String },

    /// Bytes value longer than allowed.
    #[error("bytes value is {len} long, but must be no longer than {max}")]
    BytesTooLong { len: usize, max: usize },

    /// String value longer than allowed.
    #[error("string is {len} bytes, but must be no longer than {max}")]
    StringTooLong { len: usize, max: usize },

    /// A string contains NUL before its end.
    #[error("string contains an embedded NUL at byte {0}")]
    EmbeddedNul(usize),

    /// A fixed-size array had the wrong number of elements.
    #[error("expected {expected} elements in array, got {found}")]
    ArrayLengthMismatch { expected: usize, found: usize },

    /// A variable-length array exceeded its one-byte count.
    #[error("array has {len} elements, but must have no more than {max}")]
    ArrayTooLong { len: usize, max: usize },

    /// An array's element type occupies no bytes on the wire.
    #[error("array field {0} has elements that occupy no bytes")]
    ZeroWidthElement(String),

    /// A struct value lacks a declared member.
    #[error("missing field {0}")]
    MissingField(String),

    /// Struct nesting exceeded the depth limit.
    #[error("nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },

    /// JSON input could not be mapped onto the declared type.
    #[error("invalid JSON for {ty}: {message}")]
    InvalidJson { ty: String, message: String },
}

pub type Result<T> = std::result::Result<T, SerializationError>;
