//! Schema-driven codec.
//!
//! Values are described by a [`TypeRef`](bakelite_schema::TypeRef) and
//! packed into a compact little-endian layout: fixed-width integers and
//! floats, one-byte length prefixes for variable-length data, NUL-terminated
//! strings, and struct members in declaration order.
//!
//! Typed messages implement [`Message`] and convert to and from the dynamic
//! [`Value`] model; the codec itself only ever sees `Value`s.

pub mod codec;
pub mod error;
pub mod json;
pub mod message;
pub mod value;

pub use codec::{pack, pack_struct, unpack, unpack_struct, MAX_NESTING_DEPTH};
pub use error::{Result, SerializationError};
pub use message::{pack_message, unpack_message, Message, MessageSet};
pub use value::{FromValue, IntoValue, Record, Value};
