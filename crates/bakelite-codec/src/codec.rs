use std::borrow::Cow;
use std::collections::HashMap;

use bytes::{Buf, BufMut};

use bakelite_schema::{
    ArrayLen, FieldDescriptor, Registry, StructDescriptor, TypeEntry, TypeRef, Width,
    MAX_VARIABLE_LEN,
};

use crate::error::{Result, SerializationError};
use crate::value::{Record, Value};

/// Deepest struct/enum nesting the codec will follow.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Pack `value` as type `ty`, appending to `out`.
pub fn pack<B: BufMut>(value: &Value, ty: &TypeRef, registry: &Registry, out: &mut B) -> Result<()> {
    pack_type(value, ty, registry, out, 0)
}

/// Unpack one value of type `ty` from `buf`.
pub fn unpack<B: Buf>(buf: &mut B, ty: &TypeRef, registry: &Registry) -> Result<Value> {
    unpack_type(buf, ty, registry, 0)
}

/// Pack a [`Value::Struct`] member by member in declaration order.
///
/// Fields present in the record but not declared are ignored.
pub fn pack_struct<B: BufMut>(
    value: &Value,
    desc: &StructDescriptor,
    registry: &Registry,
    out: &mut B,
) -> Result<()> {
    tracing::trace!(name = %desc.name, "packing struct");
    pack_struct_at(value, desc, registry, out, 0)
}

/// Unpack a struct member by member in declaration order.
pub fn unpack_struct<B: Buf>(
    buf: &mut B,
    desc: &StructDescriptor,
    registry: &Registry,
) -> Result<Value> {
    tracing::trace!(name = %desc.name, remaining = buf.remaining(), "unpacking struct");
    unpack_struct_at(buf, desc, registry, 0)
}

fn check_depth(depth: usize) -> Result<()> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(SerializationError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}

fn pack_struct_at<B: BufMut>(
    value: &Value,
    desc: &StructDescriptor,
    registry: &Registry,
    out: &mut B,
    depth: usize,
) -> Result<()> {
    check_depth(depth)?;
    let record = value
        .as_record()
        .ok_or_else(|| SerializationError::KindMismatch {
            expected: format!("struct {}", desc.name),
            found: value.kind(),
        })?;

    for field in &desc.members {
        let member = record
            .get(&field.name)
            .ok_or_else(|| SerializationError::MissingField(format!("{}.{}", desc.name, field.name)))?;
        pack_field(member, field, registry, out, depth)?;
    }
    Ok(())
}

fn pack_field<B: BufMut>(
    value: &Value,
    field: &FieldDescriptor,
    registry: &Registry,
    out: &mut B,
    depth: usize,
) -> Result<()> {
    let Some(shape) = field.array_len() else {
        return pack_type(value, &field.ty, registry, out, depth);
    };

    let items = array_items(value)?;
    if !items.is_empty() {
        reject_zero_width(field, registry)?;
    }
    match shape {
        ArrayLen::Fixed(n) => {
            if items.len() != n {
                return Err(SerializationError::ArrayLengthMismatch {
                    expected: n,
                    found: items.len(),
                });
            }
        }
        ArrayLen::Variable => {
            let len = u8::try_from(items.len()).map_err(|_| SerializationError::ArrayTooLong {
                len: items.len(),
                max: MAX_VARIABLE_LEN,
            })?;
            out.put_u8(len);
        }
    }
    for item in items.iter() {
        pack_type(item, &field.ty, registry, out, depth)?;
    }
    Ok(())
}

// Elements that read no input would let a descriptor's arraySize alone
// drive the element count.
fn reject_zero_width(field: &FieldDescriptor, registry: &Registry) -> Result<()> {
    if is_zero_width(&field.ty, registry, &mut HashMap::new()) {
        return Err(SerializationError::ZeroWidthElement(field.name.clone()));
    }
    Ok(())
}

// Names under evaluation count as sized, so recursive descriptors terminate.
fn is_zero_width<'a>(ty: &'a TypeRef, registry: &'a Registry, seen: &mut HashMap<&'a str, bool>) -> bool {
    match ty {
        TypeRef::Bytes(Width::Fixed(n)) | TypeRef::String(Width::Fixed(n)) => *n == 0,
        TypeRef::Named(name) => {
            if let Some(&known) = seen.get(name.as_str()) {
                return known;
            }
            seen.insert(name, false);
            let zero = match registry.get(name) {
                Some(TypeEntry::Enum(desc)) => is_zero_width(&desc.ty, registry, seen),
                Some(TypeEntry::Struct(desc)) => desc.members.iter().all(|field| match field.array_len() {
                    None => is_zero_width(&field.ty, registry, seen),
                    Some(ArrayLen::Fixed(n)) => n == 0 || is_zero_width(&field.ty, registry, seen),
                    Some(ArrayLen::Variable) => false,
                }),
                None => false,
            };
            seen.insert(name, zero);
            zero
        }
        _ => false,
    }
}

fn array_items(value: &Value) -> Result<Cow<'_, [Value]>> {
    match value {
        Value::Array(items) => Ok(Cow::Borrowed(items)),
        Value::Bytes(bytes) => Ok(Cow::Owned(
            bytes.iter().map(|b| Value::UInt(u64::from(*b))).collect(),
        )),
        other => Err(SerializationError::KindMismatch {
            expected: "array".to_string(),
            found: other.kind(),
        }),
    }
}

fn pack_type<B: BufMut>(
    value: &Value,
    ty: &TypeRef,
    registry: &Registry,
    out: &mut B,
    depth: usize,
) -> Result<()> {
    match ty {
        TypeRef::Bool => {
            let b = value.as_bool().ok_or_else(|| mismatch(ty, value))?;
            out.put_u8(u8::from(b));
        }
        TypeRef::Int8
        | TypeRef::Int16
        | TypeRef::Int32
        | TypeRef::Int64
        | TypeRef::UInt8
        | TypeRef::UInt16
        | TypeRef::UInt32
        | TypeRef::UInt64 => {
            let n = value.as_integer().ok_or_else(|| mismatch(ty, value))?;
            put_integer(n, ty, out)?;
        }
        TypeRef::Float32 => {
            let f = value.as_f64().ok_or_else(|| mismatch(ty, value))?;
            out.put_f32_le(f as f32);
        }
        TypeRef::Float64 => {
            let f = value.as_f64().ok_or_else(|| mismatch(ty, value))?;
            out.put_f64_le(f);
        }
        TypeRef::Bytes(width) => {
            let data = bytes_of(value, ty)?;
            match width {
                Width::Fixed(n) => {
                    if data.len() > *n {
                        return Err(SerializationError::BytesTooLong {
                            len: data.len(),
                            max: *n,
                        });
                    }
                    out.put_slice(&data);
                    out.put_bytes(0, n - data.len());
                }
                Width::Variable => {
                    let len = u8::try_from(data.len()).map_err(|_| {
                        SerializationError::BytesTooLong {
                            len: data.len(),
                            max: MAX_VARIABLE_LEN,
                        }
                    })?;
                    out.put_u8(len);
                    out.put_slice(&data);
                }
            }
        }
        TypeRef::String(width) => {
            let s = value.as_str().ok_or_else(|| mismatch(ty, value))?;
            let content = string_content(s)?;
            match width {
                Width::Fixed(n) => {
                    let max = n.saturating_sub(1);
                    if content.len() > max {
                        return Err(SerializationError::StringTooLong {
                            len: content.len(),
                            max,
                        });
                    }
                    out.put_slice(content);
                    out.put_bytes(0, n - content.len());
                }
                Width::Variable => {
                    if content.len() > MAX_VARIABLE_LEN {
                        return Err(SerializationError::StringTooLong {
                            len: content.len(),
                            max: MAX_VARIABLE_LEN,
                        });
                    }
                    out.put_slice(content);
                    out.put_u8(0);
                }
            }
        }
        TypeRef::Named(name) => match registry.get(name) {
            Some(TypeEntry::Enum(desc)) => {
                check_depth(depth)?;
                pack_type(value, &desc.ty, registry, out, depth + 1)?;
            }
            Some(TypeEntry::Struct(desc)) => {
                pack_struct_at(value, desc, registry, out, depth + 1)?;
            }
            None => return Err(SerializationError::UnknownType(name.clone())),
        },
    }
    Ok(())
}

fn put_integer<B: BufMut>(n: i128, ty: &TypeRef, out: &mut B) -> Result<()> {
    let range = |name: &'static str| SerializationError::IntegerOutOfRange {
        ty: name,
        value: n.to_string(),
    };
    match ty {
        TypeRef::Int8 => out.put_i8(i8::try_from(n).map_err(|_| range("int8"))?),
        TypeRef::Int16 => out.put_i16_le(i16::try_from(n).map_err(|_| range("int16"))?),
        TypeRef::Int32 => out.put_i32_le(i32::try_from(n).map_err(|_| range("int32"))?),
        TypeRef::Int64 => out.put_i64_le(i64::try_from(n).map_err(|_| range("int64"))?),
        TypeRef::UInt8 => out.put_u8(u8::try_from(n).map_err(|_| range("uint8"))?),
        TypeRef::UInt16 => out.put_u16_le(u16::try_from(n).map_err(|_| range("uint16"))?),
        TypeRef::UInt32 => out.put_u32_le(u32::try_from(n).map_err(|_| range("uint32"))?),
        TypeRef::UInt64 => out.put_u64_le(u64::try_from(n).map_err(|_| range("uint64"))?),
        other => return Err(SerializationError::UnknownType(other.to_string())),
    }
    Ok(())
}

fn bytes_of<'a>(value: &'a Value, ty: &TypeRef) -> Result<Cow<'a, [u8]>> {
    match value {
        Value::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let n = item.as_integer().ok_or_else(|| mismatch(ty, item))?;
                u8::try_from(n).map_err(|_| SerializationError::IntegerOutOfRange {
                    ty: "uint8",
                    value: n.to_string(),
                })
            })
            .collect::<Result<Vec<u8>>>()
            .map(Cow::Owned),
        other => Err(mismatch(ty, other)),
    }
}

// A single trailing NUL is tolerated and dropped; any earlier NUL is not.
fn string_content(s: &str) -> Result<&[u8]> {
    let bytes = s.as_bytes();
    let content = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    if let Some(pos) = content.iter().position(|b| *b == 0) {
        return Err(SerializationError::EmbeddedNul(pos));
    }
    Ok(content)
}

fn mismatch(ty: &TypeRef, value: &Value) -> SerializationError {
    SerializationError::KindMismatch {
        expected: ty.to_string(),
        found: value.kind(),
    }
}

fn unpack_struct_at<B: Buf>(
    buf: &mut B,
    desc: &StructDescriptor,
    registry: &Registry,
    depth: usize,
) -> Result<Value> {
    check_depth(depth)?;
    let mut record = Record::with_capacity(desc.members.len());
    for field in &desc.members {
        let value = unpack_field(buf, field, registry, depth)?;
        record.push(field.name.clone(), value);
    }
    Ok(Value::Struct(record))
}

fn unpack_field<B: Buf>(
    buf: &mut B,
    field: &FieldDescriptor,
    registry: &Registry,
    depth: usize,
) -> Result<Value> {
    let count = match field.array_len() {
        None => return unpack_type(buf, &field.ty, registry, depth),
        Some(ArrayLen::Fixed(n)) => n,
        Some(ArrayLen::Variable) => {
            ensure(buf, 1)?;
            usize::from(buf.get_u8())
        }
    };

    if count > 0 {
        reject_zero_width(field, registry)?;
    }
    let mut items = Vec::with_capacity(count.min(MAX_VARIABLE_LEN));
    for _ in 0..count {
        items.push(unpack_type(buf, &field.ty, registry, depth)?);
    }
    Ok(Value::Array(items))
}

fn unpack_type<B: Buf>(buf: &mut B, ty: &TypeRef, registry: &Registry, depth: usize) -> Result<Value> {
    let value = match ty {
        TypeRef::Bool => {
            ensure(buf, 1)?;
            Value::Bool(buf.get_u8() != 0)
        }
        TypeRef::Int8 => {
            ensure(buf, 1)?;
            Value::Int(i64::from(buf.get_i8()))
        }
        TypeRef::Int16 => {
            ensure(buf, 2)?;
            Value::Int(i64::from(buf.get_i16_le()))
        }
        TypeRef::Int32 => {
            ensure(buf, 4)?;
            Value::Int(i64::from(buf.get_i32_le()))
        }
        TypeRef::Int64 => {
            ensure(buf, 8)?;
            Value::Int(buf.get_i64_le())
        }
        TypeRef::UInt8 => {
            ensure(buf, 1)?;
            Value::UInt(u64::from(buf.get_u8()))
        }
        TypeRef::UInt16 => {
            ensure(buf, 2)?;
            Value::UInt(u64::from(buf.get_u16_le()))
        }
        TypeRef::UInt32 => {
            ensure(buf, 4)?;
            Value::UInt(u64::from(buf.get_u32_le()))
        }
        TypeRef::UInt64 => {
            ensure(buf, 8)?;
            Value::UInt(buf.get_u64_le())
        }
        TypeRef::Float32 => {
            ensure(buf, 4)?;
            Value::Float(f64::from(buf.get_f32_le()))
        }
        TypeRef::Float64 => {
            ensure(buf, 8)?;
            Value::Float(buf.get_f64_le())
        }
        TypeRef::Bytes(Width::Fixed(n)) => Value::Bytes(take_bytes(buf, *n)?),
        TypeRef::Bytes(Width::Variable) => {
            ensure(buf, 1)?;
            let len = usize::from(buf.get_u8());
            Value::Bytes(take_bytes(buf, len)?)
        }
        TypeRef::String(Width::Fixed(n)) => {
            let mut raw = take_bytes(buf, *n)?;
            if let Some(end) = raw.iter().position(|b| *b == 0) {
                raw.truncate(end);
            }
            Value::String(utf8(raw)?)
        }
        TypeRef::String(Width::Variable) => {
            let mut raw = Vec::new();
            while buf.has_remaining() {
                let b = buf.get_u8();
                if b == 0 {
                    break;
                }
                raw.push(b);
            }
            Value::String(utf8(raw)?)
        }
        TypeRef::Named(name) => match registry.get(name) {
            Some(TypeEntry::Enum(desc)) => {
                check_depth(depth)?;
                unpack_type(buf, &desc.ty, registry, depth + 1)?
            }
            Some(TypeEntry::Struct(desc)) => unpack_struct_at(buf, desc, registry, depth + 1)?,
            None => return Err(SerializationError::UnknownType(name.clone())),
        },
    };
    Ok(value)
}

fn ensure<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(SerializationError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

fn take_bytes<B: Buf>(buf: &mut B, len: usize) -> Result<Vec<u8>> {
    ensure(buf, len)?;
    let mut out = vec![0; len];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

fn utf8(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|_| SerializationError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use bakelite_schema::{EnumDescriptor, SchemaDescriptor};

    use super::*;
    use crate::value::IntoValue;

    fn packed(value: impl IntoValue, ty: TypeRef) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        pack(&value.into_value(), &ty, &Registry::new(), &mut out)?;
        Ok(out)
    }

    fn unpacked(data: &[u8], ty: TypeRef) -> Result<Value> {
        let mut buf = data;
        unpack(&mut buf, &ty, &Registry::new())
    }

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(packed(0x1234u16, TypeRef::UInt16).unwrap(), vec![0x34, 0x12]);
        assert_eq!(packed(-2i32, TypeRef::Int32).unwrap(), vec![0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(
            packed(1u64, TypeRef::UInt64).unwrap(),
            vec![1, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(unpacked(&[0xfe, 0xff], TypeRef::Int16).unwrap(), Value::Int(-2));
        assert_eq!(unpacked(&[0xff], TypeRef::UInt8).unwrap(), Value::UInt(255));
    }

    #[test]
    fn integers_are_range_checked() {
        assert!(matches!(
            packed(256u16, TypeRef::UInt8),
            Err(SerializationError::IntegerOutOfRange { ty: "uint8", .. })
        ));
        assert!(matches!(
            packed(-1i8, TypeRef::UInt32),
            Err(SerializationError::IntegerOutOfRange { ty: "uint32", .. })
        ));
        assert!(matches!(
            packed(128u8, TypeRef::Int8),
            Err(SerializationError::IntegerOutOfRange { ty: "int8", .. })
        ));
        assert_eq!(packed(-128i64, TypeRef::Int8).unwrap(), vec![0x80]);
    }

    #[test]
    fn bool_unpacks_any_nonzero_as_true() {
        assert_eq!(packed(true, TypeRef::Bool).unwrap(), vec![1]);
        assert_eq!(unpacked(&[7], TypeRef::Bool).unwrap(), Value::Bool(true));
        assert_eq!(unpacked(&[0], TypeRef::Bool).unwrap(), Value::Bool(false));
    }

    #[test]
    fn floats_are_ieee_little_endian() {
        assert_eq!(packed(1.0f32, TypeRef::Float32).unwrap(), vec![0, 0, 0x80, 0x3f]);
        assert_eq!(
            unpacked(&1.5f64.to_le_bytes(), TypeRef::Float64).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn fixed_bytes_are_padded() {
        let ty = TypeRef::Bytes(Width::Fixed(4));
        assert_eq!(packed(Value::Bytes(vec![1, 2]), ty.clone()).unwrap(), vec![1, 2, 0, 0]);
        assert_eq!(
            packed(Value::Bytes(vec![1; 5]), ty.clone()),
            Err(SerializationError::BytesTooLong { len: 5, max: 4 })
        );
        assert_eq!(
            unpacked(&[1, 2, 0, 0], ty).unwrap(),
            Value::Bytes(vec![1, 2, 0, 0])
        );
    }

    #[test]
    fn variable_bytes_boundary() {
        let ty = TypeRef::Bytes(Width::Variable);
        let data = packed(Value::Bytes(vec![0xaa; 255]), ty.clone()).unwrap();
        assert_eq!(data.len(), 256);
        assert_eq!(data[0], 255);
        assert_eq!(unpacked(&data, ty.clone()).unwrap(), Value::Bytes(vec![0xaa; 255]));

        assert_eq!(
            packed(Value::Bytes(vec![0; 256]), ty.clone()),
            Err(SerializationError::BytesTooLong { len: 256, max: 255 })
        );
        assert_eq!(packed(vec![1u8, 2, 3], ty).unwrap(), vec![3, 1, 2, 3]);
    }

    #[test]
    fn variable_strings_boundary() {
        let ty = TypeRef::String(Width::Variable);
        let longest = "a".repeat(255);
        let data = packed(longest.as_str(), ty.clone()).unwrap();
        assert_eq!(data.len(), 256);
        assert_eq!(data[255], 0);
        assert_eq!(unpacked(&data, ty.clone()).unwrap(), Value::String(longest));

        assert_eq!(
            packed("a".repeat(256), ty),
            Err(SerializationError::StringTooLong { len: 256, max: 255 })
        );
    }

    #[test]
    fn fixed_strings() {
        let ty = TypeRef::String(Width::Fixed(6));
        assert_eq!(packed("hello", ty.clone()).unwrap(), b"hello\0".to_vec());
        assert_eq!(packed("hi", ty.clone()).unwrap(), b"hi\0\0\0\0".to_vec());
        assert_eq!(
            packed("hello!", ty.clone()),
            Err(SerializationError::StringTooLong { len: 6, max: 5 })
        );
        assert_eq!(
            unpacked(b"hi\0xx\0", ty).unwrap(),
            Value::String("hi".to_string())
        );
    }

    #[test]
    fn variable_strings() {
        let ty = TypeRef::String(Width::Variable);
        assert_eq!(packed("abc", ty.clone()).unwrap(), b"abc\0".to_vec());
        assert_eq!(packed("abc\0", ty.clone()).unwrap(), b"abc\0".to_vec());
        assert_eq!(
            packed("a\0bc", ty.clone()),
            Err(SerializationError::EmbeddedNul(1))
        );

        let mut buf: &[u8] = b"abc\0rest";
        let value = unpack(&mut buf, &ty, &Registry::new()).unwrap();
        assert_eq!(value, Value::String("abc".to_string()));
        assert_eq!(buf, b"rest");

        // Missing terminator reads to end of input.
        assert_eq!(unpacked(b"tail", ty).unwrap(), Value::String("tail".to_string()));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_eq!(
            unpacked(&[0xff, 0xfe, 0], TypeRef::String(Width::Variable)),
            Err(SerializationError::InvalidUtf8)
        );
    }

    #[test]
    fn truncated_input() {
        assert_eq!(
            unpacked(&[1, 2], TypeRef::UInt32),
            Err(SerializationError::Truncated {
                needed: 4,
                available: 2
            })
        );
        assert!(matches!(
            unpacked(&[3, 1], TypeRef::Bytes(Width::Variable)),
            Err(SerializationError::Truncated { needed: 3, available: 1 })
        ));
    }

    #[test]
    fn kind_mismatch() {
        assert!(matches!(
            packed("text", TypeRef::UInt8),
            Err(SerializationError::KindMismatch { found: "string", .. })
        ));
    }

    #[test]
    fn unknown_named_type() {
        assert_eq!(
            packed(1u8, TypeRef::named("Ghost")),
            Err(SerializationError::UnknownType("Ghost".to_string()))
        );
        assert_eq!(
            unpacked(&[1], TypeRef::named("Ghost")),
            Err(SerializationError::UnknownType("Ghost".to_string()))
        );
    }

    #[test]
    fn enums_use_underlying_integer() {
        let mut registry = Registry::new();
        registry.register_enum(EnumDescriptor::new("Level", TypeRef::Int16));

        let mut out = Vec::new();
        pack(&Value::Int(-3), &TypeRef::named("Level"), &registry, &mut out).unwrap();
        assert_eq!(out, vec![0xfd, 0xff]);

        let mut buf = &out[..];
        let value = unpack(&mut buf, &TypeRef::named("Level"), &registry).unwrap();
        assert_eq!(value, Value::Int(-3));
    }

    const SCHEMA: &str = r#"{
        "enums": [{"name": "Direction", "type": {"name": "uint8"},
                   "values": [{"name": "Up", "value": 0}, {"name": "Down", "value": 1}]}],
        "structs": [
            {"name": "Point", "members": [
                {"name": "x", "type": {"name": "int16"}},
                {"name": "y", "type": {"name": "int16"}}
            ]},
            {"name": "Path", "members": [
                {"name": "dir", "type": {"name": "Direction"}},
                {"name": "label", "type": {"name": "string", "size": 8}},
                {"name": "origin", "type": {"name": "Point"}},
                {"name": "corners", "type": {"name": "Point"}, "arraySize": 2},
                {"name": "steps", "type": {"name": "uint8"}, "arraySize": 0},
                {"name": "note", "type": {"name": "string"}}
            ]}
        ]
    }"#;

    fn path_registry() -> Registry {
        Registry::from_schema(&SchemaDescriptor::from_json(SCHEMA).unwrap()).unwrap()
    }

    fn point(x: i16, y: i16) -> Record {
        Record::new().with("x", x).with("y", y)
    }

    #[test]
    fn struct_round_trip() {
        let registry = path_registry();
        let desc = registry.get_struct("Path").unwrap();
        let value = Record::new()
            .with("dir", 1u8)
            .with("label", "north")
            .with("origin", point(-1, 2))
            .with("corners", vec![point(0, 0), point(10, -10)])
            .with("steps", vec![3u8, 4, 5])
            .with("note", "ok")
            .into_value();

        let mut out = Vec::new();
        pack_struct(&value, desc, &registry, &mut out).unwrap();

        let expected: Vec<u8> = [
            &[1u8][..],
            b"north\0\0\0",
            &[0xff, 0xff, 2, 0],
            &[0, 0, 0, 0, 10, 0, 0xf6, 0xff],
            &[3, 3, 4, 5],
            b"ok\0",
        ]
        .concat();
        assert_eq!(out, expected);

        let mut buf = &out[..];
        let decoded = unpack_struct(&mut buf, desc, &registry).unwrap();
        assert!(buf.is_empty());
        // Enums and unsigned fields come back as unsigned, signed as signed.
        let expected_value = Record::new()
            .with("dir", 1u8)
            .with("label", "north")
            .with("origin", point(-1, 2))
            .with("corners", vec![point(0, 0), point(10, -10)])
            .with("steps", vec![3u8, 4, 5])
            .with("note", "ok")
            .into_value();
        assert_eq!(decoded, expected_value);
    }

    #[test]
    fn fixed_array_count_must_match() {
        let registry = path_registry();
        let desc = registry.get_struct("Path").unwrap();
        let value = Record::new()
            .with("dir", 0u8)
            .with("label", "")
            .with("origin", point(0, 0))
            .with("corners", vec![point(0, 0)])
            .with("steps", Vec::<u8>::new())
            .with("note", "")
            .into_value();

        let err = pack_struct(&value, desc, &registry, &mut Vec::new()).unwrap_err();
        assert_eq!(
            err,
            SerializationError::ArrayLengthMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn variable_array_boundary() {
        let desc = StructDescriptor::new(
            "Samples",
            vec![FieldDescriptor::new("v", TypeRef::UInt8).array(ArrayLen::Variable)],
        );
        let registry = Registry::new();

        let full = Record::new().with("v", vec![7u8; 255]).into_value();
        let mut out = Vec::new();
        pack_struct(&full, &desc, &registry, &mut out).unwrap();
        assert_eq!(out.len(), 256);
        let mut buf = &out[..];
        assert_eq!(unpack_struct(&mut buf, &desc, &registry).unwrap(), full);

        let over = Record::new().with("v", vec![7u8; 256]).into_value();
        assert_eq!(
            pack_struct(&over, &desc, &registry, &mut Vec::new()),
            Err(SerializationError::ArrayTooLong { len: 256, max: 255 })
        );
    }

    #[test]
    fn zero_width_array_elements_are_rejected() {
        let mut registry = Registry::new();
        registry.register_struct(StructDescriptor::new("Empty", vec![]));
        let desc = StructDescriptor::new(
            "Wide",
            vec![FieldDescriptor::new("items", TypeRef::named("Empty"))
                .array(ArrayLen::Fixed(1 << 40))],
        );

        let mut buf: &[u8] = &[];
        assert_eq!(
            unpack_struct(&mut buf, &desc, &registry),
            Err(SerializationError::ZeroWidthElement("items".to_string()))
        );

        let counted = StructDescriptor::new(
            "Counted",
            vec![FieldDescriptor::new("items", TypeRef::named("Empty")).array(ArrayLen::Variable)],
        );
        let mut buf: &[u8] = &[255];
        assert_eq!(
            unpack_struct(&mut buf, &counted, &registry),
            Err(SerializationError::ZeroWidthElement("items".to_string()))
        );

        let value = Record::new()
            .with("items", vec![Value::Struct(Record::new())])
            .into_value();
        assert_eq!(
            pack_struct(&value, &counted, &registry, &mut Vec::new()),
            Err(SerializationError::ZeroWidthElement("items".to_string()))
        );

        // An empty count never touches the element type.
        let mut buf: &[u8] = &[0];
        assert_eq!(
            unpack_struct(&mut buf, &counted, &registry).unwrap(),
            Record::new().with("items", Vec::<Value>::new()).into_value()
        );
    }

    #[test]
    fn missing_field_is_reported() {
        let registry = path_registry();
        let desc = registry.get_struct("Point").unwrap();
        let value = Record::new().with("x", 1i16).into_value();
        assert_eq!(
            pack_struct(&value, desc, &registry, &mut Vec::new()),
            Err(SerializationError::MissingField("Point.y".to_string()))
        );
    }

    #[test]
    fn self_referential_struct_hits_depth_limit() {
        let mut registry = Registry::new();
        registry.register_struct(StructDescriptor::new(
            "Loop",
            vec![FieldDescriptor::new("next", TypeRef::named("Loop"))],
        ));
        let desc = registry.get_struct("Loop").unwrap().clone();

        let mut buf: &[u8] = &[];
        assert_eq!(
            unpack_struct(&mut buf, &desc, &registry),
            Err(SerializationError::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            })
        );
    }
}
