//! Mapping between codec values and JSON.
//!
//! Bytes are rendered as lowercase hex strings. Going from JSON to a value
//! needs the declared type, so enum fields may be given either as their
//! integer or as a declared symbol name.

use serde_json::{Map, Number, Value as Json};

use bakelite_schema::{Registry, StructDescriptor, TypeEntry, TypeRef};

use crate::codec::MAX_NESTING_DEPTH;
use crate::error::{Result, SerializationError};
use crate::value::{Record, Value};

/// Render a value as JSON. Non-finite floats become `null`.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::Number(Number::from(*n)),
        Value::UInt(n) => Json::Number(Number::from(*n)),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Bytes(bytes) => Json::String(hex::encode(bytes)),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Struct(record) => {
            let mut map = Map::new();
            for (name, field) in record.iter() {
                map.insert(name.to_string(), to_json(field));
            }
            Json::Object(map)
        }
    }
}

/// Build a struct value from a JSON object.
pub fn struct_from_json(json: &Json, desc: &StructDescriptor, registry: &Registry) -> Result<Value> {
    struct_at(json, desc, registry, 0)
}

/// Build a value of type `ty` from JSON.
pub fn from_json(json: &Json, ty: &TypeRef, registry: &Registry) -> Result<Value> {
    type_at(json, ty, registry, 0)
}

fn invalid(ty: impl ToString, message: impl Into<String>) -> SerializationError {
    SerializationError::InvalidJson {
        ty: ty.to_string(),
        message: message.into(),
    }
}

fn struct_at(json: &Json, desc: &StructDescriptor, registry: &Registry, depth: usize) -> Result<Value> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(SerializationError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }
    let object = json
        .as_object()
        .ok_or_else(|| invalid(&desc.name, format!("expected an object, got {json}")))?;

    let mut record = Record::with_capacity(desc.members.len());
    for field in &desc.members {
        let member = object
            .get(&field.name)
            .ok_or_else(|| SerializationError::MissingField(format!("{}.{}", desc.name, field.name)))?;
        let value = if field.array_len().is_some() {
            let items = member
                .as_array()
                .ok_or_else(|| invalid(&field.ty, format!("{} must be an array", field.name)))?;
            Value::Array(
                items
                    .iter()
                    .map(|item| type_at(item, &field.ty, registry, depth))
                    .collect::<Result<_>>()?,
            )
        } else {
            type_at(member, &field.ty, registry, depth)?
        };
        record.push(field.name.clone(), value);
    }
    Ok(Value::Struct(record))
}

fn type_at(json: &Json, ty: &TypeRef, registry: &Registry, depth: usize) -> Result<Value> {
    match ty {
        TypeRef::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| invalid(ty, format!("expected true or false, got {json}"))),
        TypeRef::Int8
        | TypeRef::Int16
        | TypeRef::Int32
        | TypeRef::Int64
        | TypeRef::UInt8
        | TypeRef::UInt16
        | TypeRef::UInt32
        | TypeRef::UInt64 => integer(json, ty),
        TypeRef::Float32 | TypeRef::Float64 => json
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| invalid(ty, format!("expected a number, got {json}"))),
        TypeRef::Bytes(_) => match json {
            Json::String(s) => hex::decode(s)
                .map(Value::Bytes)
                .map_err(|err| invalid(ty, format!("bad hex: {err}"))),
            Json::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| invalid(ty, format!("{item} is not a byte")))
                })
                .collect::<Result<Vec<u8>>>()
                .map(Value::Bytes),
            other => Err(invalid(ty, format!("expected hex string, got {other}"))),
        },
        TypeRef::String(_) => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| invalid(ty, format!("expected a string, got {json}"))),
        TypeRef::Named(name) => match registry.get(name) {
            Some(TypeEntry::Enum(desc)) => match json {
                Json::String(symbol) => desc
                    .values
                    .iter()
                    .find(|v| v.name == *symbol)
                    .map(|v| Value::Int(v.value))
                    .ok_or_else(|| invalid(name, format!("unknown symbol {symbol:?}"))),
                other => integer(other, &desc.ty),
            },
            Some(TypeEntry::Struct(desc)) => struct_at(json, desc, registry, depth + 1),
            None => Err(SerializationError::UnknownType(name.clone())),
        },
    }
}

fn integer(json: &Json, ty: &TypeRef) -> Result<Value> {
    if let Some(n) = json.as_u64() {
        Ok(Value::UInt(n))
    } else if let Some(n) = json.as_i64() {
        Ok(Value::Int(n))
    } else {
        Err(invalid(ty, format!("expected an integer, got {json}")))
    }
}

#[cfg(test)]
mod tests {
    use bakelite_schema::SchemaDescriptor;
    use serde_json::json;

    use super::*;
    use crate::codec::{pack_struct, unpack_struct};

    const SCHEMA: &str = r#"{
        "enums": [{"name": "Mode", "type": {"name": "uint8"},
                   "values": [{"name": "Idle", "value": 0}, {"name": "Run", "value": 3}]}],
        "structs": [{"name": "Status", "members": [
            {"name": "mode", "type": {"name": "Mode"}},
            {"name": "temp", "type": {"name": "float32"}},
            {"name": "offset", "type": {"name": "int8"}},
            {"name": "serial", "type": {"name": "bytes", "size": 2}},
            {"name": "readings", "type": {"name": "uint16"}, "arraySize": 0}
        ]}]
    }"#;

    #[test]
    fn json_round_trip_through_wire() {
        let registry = Registry::from_schema(&SchemaDescriptor::from_json(SCHEMA).unwrap()).unwrap();
        let desc = registry.get_struct("Status").unwrap();

        let input = json!({
            "mode": "Run",
            "temp": 21.5,
            "offset": -4,
            "serial": "beef",
            "readings": [1, 500]
        });
        let value = struct_from_json(&input, desc, &registry).unwrap();

        let mut out = Vec::new();
        pack_struct(&value, desc, &registry, &mut out).unwrap();
        assert_eq!(out[0], 3);

        let mut buf = &out[..];
        let decoded = unpack_struct(&mut buf, desc, &registry).unwrap();
        assert_eq!(
            to_json(&decoded),
            json!({
                "mode": 3,
                "temp": 21.5,
                "offset": -4,
                "serial": "beef",
                "readings": [1, 500]
            })
        );
    }

    #[test]
    fn rejects_unknown_enum_symbol() {
        let registry = Registry::from_schema(&SchemaDescriptor::from_json(SCHEMA).unwrap()).unwrap();
        let err = from_json(&json!("Fly"), &TypeRef::named("Mode"), &registry).unwrap_err();
        assert!(matches!(err, SerializationError::InvalidJson { .. }));
    }

    #[test]
    fn missing_member() {
        let registry = Registry::from_schema(&SchemaDescriptor::from_json(SCHEMA).unwrap()).unwrap();
        let desc = registry.get_struct("Status").unwrap();
        let err = struct_from_json(&json!({"mode": 0}), desc, &registry).unwrap_err();
        assert_eq!(err, SerializationError::MissingField("Status.temp".to_string()));
    }

    #[test]
    fn non_finite_float_renders_null() {
        assert_eq!(to_json(&Value::Float(f64::NAN)), Json::Null);
    }
}
