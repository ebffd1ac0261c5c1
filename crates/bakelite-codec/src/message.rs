use bytes::{Buf, BufMut};

use bakelite_schema::Registry;

use crate::codec::{pack_struct, unpack_struct};
use crate::error::{Result, SerializationError};
use crate::value::Value;

/// A typed message bound to a struct descriptor by name.
///
/// Implementations are normally produced by a code generator; the codec
/// resolves `NAME` in a [`Registry`] to find the wire layout.
pub trait Message: Sized {
    /// Struct name as declared in the schema.
    const NAME: &'static str;

    /// Convert to a [`Value::Struct`].
    fn to_value(&self) -> Value;

    /// Rebuild from a [`Value::Struct`].
    fn from_value(value: Value) -> Result<Self>;
}

/// A closed set of messages, usually an enum with one variant per message.
pub trait MessageSet: Sized {
    /// Convert a decoded struct value named `name` into a set member.
    fn from_incoming(name: &str, value: Value) -> Result<Self>;
}

/// Pack a typed message body (no message ID) into `out`.
pub fn pack_message<M: Message, B: BufMut>(
    message: &M,
    registry: &Registry,
    out: &mut B,
) -> Result<()> {
    let desc = registry
        .get_struct(M::NAME)
        .ok_or_else(|| missing_struct(registry, M::NAME))?;
    pack_struct(&message.to_value(), desc, registry, out)
}

/// Unpack a typed message body (no message ID) from `buf`.
pub fn unpack_message<M: Message, B: Buf>(buf: &mut B, registry: &Registry) -> Result<M> {
    let desc = registry
        .get_struct(M::NAME)
        .ok_or_else(|| missing_struct(registry, M::NAME))?;
    <M as Message>::from_value(unpack_struct(buf, desc, registry)?)
}

pub(crate) fn missing_struct(registry: &Registry, name: &str) -> SerializationError {
    if registry.is_enum(name) {
        SerializationError::NotAStruct(name.to_string())
    } else {
        SerializationError::UnknownType(name.to_string())
    }
}
