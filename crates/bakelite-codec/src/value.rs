use bytes::Bytes;

use crate::error::{Result, SerializationError};
use crate::message::Message;

/// Dynamically typed value handled by the codec.
///
/// Enums travel as their underlying integer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    Struct(Record),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer as `i128`, wide enough for every signed and unsigned width.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Int(n) => Some(i128::from(*n)),
            Value::UInt(n) => Some(i128::from(*n)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            Value::UInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Struct(record) => Some(record),
            _ => None,
        }
    }

    fn mismatch(&self, expected: &str) -> SerializationError {
        SerializationError::KindMismatch {
            expected: expected.to_string(),
            found: self.kind(),
        }
    }
}

/// Struct value: named fields in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Builder form of [`Record::push`].
    pub fn with(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.push(name, value);
        self
    }

    /// Set a field, replacing an existing one of the same name in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl IntoValue) {
        let name = name.into();
        let value = value.into_value();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove a field and convert it.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T> {
        let index = self
            .fields
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| SerializationError::MissingField(name.to_string()))?;
        let (_, value) = self.fields.remove(index);
        T::from_value(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Struct(record)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.push(name, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Conversion into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl IntoValue for Record {
    fn into_value(self) -> Value {
        Value::Struct(self)
    }
}

impl FromValue for Record {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Struct(record) => Ok(record),
            other => Err(other.mismatch("struct")),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| value.mismatch("bool"))
    }
}

macro_rules! integer_value {
    ($variant:ident, $wide:ty; $($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(<$wide>::from(self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    let n = value
                        .as_integer()
                        .ok_or_else(|| value.mismatch(stringify!($ty)))?;
                    <$ty>::try_from(n).map_err(|_| SerializationError::IntegerOutOfRange {
                        ty: stringify!($ty),
                        value: n.to_string(),
                    })
                }
            }
        )*
    };
}

integer_value!(Int, i64; i8, i16, i32, i64);
integer_value!(UInt, u64; u8, u16, u32, u64);

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| value.mismatch("f32"))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| value.mismatch("f64"))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }
}

impl IntoValue for Bytes {
    fn into_value(self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(Bytes::from(b)),
            Value::Array(items) => items
                .into_iter()
                .map(u8::from_value)
                .collect::<Result<Vec<u8>>>()
                .map(Bytes::from),
            other => Err(other.mismatch("bytes")),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            // Byte strings are also accepted as arrays of small integers.
            Value::Bytes(bytes) => bytes
                .into_iter()
                .map(|b| T::from_value(Value::UInt(u64::from(b))))
                .collect(),
            other => Err(other.mismatch("array")),
        }
    }
}

impl<T: IntoValue, const N: usize> IntoValue for [T; N] {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: Value) -> Result<Self> {
        let items: Vec<T> = Vec::from_value(value)?;
        let found = items.len();
        items
            .try_into()
            .map_err(|_| SerializationError::ArrayLengthMismatch { expected: N, found })
    }
}

impl<M: Message> IntoValue for M {
    fn into_value(self) -> Value {
        self.to_value()
    }
}

impl<M: Message> FromValue for M {
    fn from_value(value: Value) -> Result<Self> {
        <M as Message>::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builder_and_take() {
        let mut record = Record::new()
            .with("code", 111u8)
            .with("name", "probe")
            .with("samples", vec![1i16, -2, 3]);

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("code"), Some(&Value::UInt(111)));

        let samples: [i16; 3] = record.take("samples").unwrap();
        assert_eq!(samples, [1, -2, 3]);
        let name: String = record.take("name").unwrap();
        assert_eq!(name, "probe");
        assert_eq!(record.len(), 1);

        assert_eq!(
            record.take::<u8>("missing"),
            Err(SerializationError::MissingField("missing".to_string()))
        );
    }

    #[test]
    fn push_replaces_in_place() {
        let mut record = Record::new().with("a", 1u8).with("b", 2u8);
        record.push("a", 9u8);
        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::UInt(9)));
    }

    #[test]
    fn integer_conversion_checks_range() {
        assert_eq!(u8::from_value(Value::Int(200)), Ok(200));
        assert!(matches!(
            u8::from_value(Value::UInt(256)),
            Err(SerializationError::IntegerOutOfRange { ty: "u8", .. })
        ));
        assert!(matches!(
            u32::from_value(Value::Int(-1)),
            Err(SerializationError::IntegerOutOfRange { .. })
        ));
        assert_eq!(i64::from_value(Value::UInt(5)), Ok(5));
        assert!(matches!(
            i8::from_value(Value::String("x".into())),
            Err(SerializationError::KindMismatch { found: "string", .. })
        ));
    }

    #[test]
    fn fixed_array_length_is_checked() {
        let err = <[u8; 4]>::from_value(vec![1u8, 2].into_value()).unwrap_err();
        assert_eq!(
            err,
            SerializationError::ArrayLengthMismatch {
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn bytes_and_byte_arrays_interconvert() {
        let as_vec: Vec<u8> = Vec::from_value(Value::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(as_vec, vec![1, 2, 3]);

        let as_bytes = Bytes::from_value(vec![4u8, 5].into_value()).unwrap();
        assert_eq!(&as_bytes[..], &[4, 5]);

        assert_eq!(
            vec![4u8, 5].into_value(),
            Value::Array(vec![Value::UInt(4), Value::UInt(5)])
        );
        assert_eq!(Bytes::from_static(&[4, 5]).into_value(), Value::Bytes(vec![4, 5]));
    }

    #[test]
    fn floats_accept_integers() {
        assert_eq!(f64::from_value(Value::Int(-3)), Ok(-3.0));
        assert_eq!(f32::from_value(Value::Float(1.5)), Ok(1.5));
    }
}
