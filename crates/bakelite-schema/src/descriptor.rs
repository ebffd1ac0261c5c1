use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Largest variable-length payload (array elements, bytes, string bytes)
/// expressible with the one-byte length prefix.
pub const MAX_VARIABLE_LEN: usize = u8::MAX as usize;

/// Maximum size of a descriptor file accepted by [`SchemaDescriptor::from_file`].
pub const MAX_DESCRIPTOR_FILE_SIZE: usize = 1024 * 1024;

/// Size of a `bytes` or `string` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// Exactly N bytes on the wire.
    Fixed(usize),
    /// Length-prefixed (bytes) or NUL-terminated (string).
    Variable,
}

/// Type of a field or of an enum's underlying integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTypeRef", into = "RawTypeRef")]
pub enum TypeRef {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bytes(Width),
    String(Width),
    /// A struct or enum declared in the same schema.
    Named(String),
}

impl TypeRef {
    /// Reference a declared struct or enum by name.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// True for the signed and unsigned integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeRef::Int8
                | TypeRef::Int16
                | TypeRef::Int32
                | TypeRef::Int64
                | TypeRef::UInt8
                | TypeRef::UInt16
                | TypeRef::UInt32
                | TypeRef::UInt64
        )
    }

    /// True for everything except [`TypeRef::Named`].
    pub fn is_primitive(&self) -> bool {
        !matches!(self, TypeRef::Named(_))
    }

    /// Schema spelling of the type name (without size).
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Bool => "bool",
            TypeRef::Int8 => "int8",
            TypeRef::Int16 => "int16",
            TypeRef::Int32 => "int32",
            TypeRef::Int64 => "int64",
            TypeRef::UInt8 => "uint8",
            TypeRef::UInt16 => "uint16",
            TypeRef::UInt32 => "uint32",
            TypeRef::UInt64 => "uint64",
            TypeRef::Float32 => "float32",
            TypeRef::Float64 => "float64",
            TypeRef::Bytes(_) => "bytes",
            TypeRef::String(_) => "string",
            TypeRef::Named(name) => name,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Bytes(Width::Fixed(n)) | TypeRef::String(Width::Fixed(n)) => {
                write!(f, "{}[{n}]", self.name())
            }
            TypeRef::Bytes(Width::Variable) | TypeRef::String(Width::Variable) => {
                write!(f, "{}[]", self.name())
            }
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawTypeRef {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

impl From<RawTypeRef> for TypeRef {
    fn from(raw: RawTypeRef) -> Self {
        let width = match raw.size {
            None | Some(0) => Width::Variable,
            Some(n) => Width::Fixed(n as usize),
        };
        match raw.name.as_str() {
            "bool" => TypeRef::Bool,
            "int8" => TypeRef::Int8,
            "int16" => TypeRef::Int16,
            "int32" => TypeRef::Int32,
            "int64" => TypeRef::Int64,
            "uint8" => TypeRef::UInt8,
            "uint16" => TypeRef::UInt16,
            "uint32" => TypeRef::UInt32,
            "uint64" => TypeRef::UInt64,
            "float32" => TypeRef::Float32,
            "float64" => TypeRef::Float64,
            "bytes" => TypeRef::Bytes(width),
            "string" => TypeRef::String(width),
            _ => TypeRef::Named(raw.name),
        }
    }
}

impl From<TypeRef> for RawTypeRef {
    fn from(ty: TypeRef) -> Self {
        let size = match &ty {
            TypeRef::Bytes(Width::Fixed(n)) | TypeRef::String(Width::Fixed(n)) => Some(*n as u64),
            TypeRef::Bytes(Width::Variable) | TypeRef::String(Width::Variable) => Some(0),
            _ => None,
        };
        RawTypeRef {
            name: ty.name().to_string(),
            size,
        }
    }
}

/// Array shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayLen {
    /// Exactly N elements, no prefix.
    Fixed(usize),
    /// One-byte element count, at most [`MAX_VARIABLE_LEN`] elements.
    Variable,
}

/// One member of a struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Absent: scalar. `0`: variable-length array. `N`: fixed array.
    #[serde(rename = "arraySize", default)]
    pub array_size: Option<usize>,
}

impl FieldDescriptor {
    /// A scalar field.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            array_size: None,
        }
    }

    /// Turn the field into an array.
    pub fn array(mut self, len: ArrayLen) -> Self {
        self.array_size = Some(match len {
            ArrayLen::Fixed(n) => n,
            ArrayLen::Variable => 0,
        });
        self
    }

    /// Array shape, `None` for scalars.
    pub fn array_len(&self) -> Option<ArrayLen> {
        match self.array_size {
            None => None,
            Some(0) => Some(ArrayLen::Variable),
            Some(n) => Some(ArrayLen::Fixed(n)),
        }
    }
}

/// A struct: ordered members, declaration order is wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDescriptor {
    pub name: String,
    #[serde(default)]
    pub members: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(name: impl Into<String>, members: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Look up a member by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.members.iter().find(|f| f.name == name)
    }
}

/// One enumerator. Only used for diagnostics; the wire carries the integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

/// An enum and its underlying integer type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            values: Vec::new(),
        }
    }

    /// Symbol for an underlying value, if declared.
    pub fn symbol_of(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.name.as_str())
    }
}

/// `name = value` protocol option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolOption {
    pub name: String,
    pub value: serde_json::Value,
}

/// Message-table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId {
    pub name: String,
    pub number: i64,
}

/// The `protocol` block: options and message IDs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDescriptor {
    #[serde(default)]
    pub options: Vec<ProtocolOption>,
    #[serde(default)]
    pub message_ids: Vec<MessageId>,
}

impl ProtocolDescriptor {
    /// Look up an option by name (case-insensitive).
    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| &o.value)
    }
}

/// Complete output of the schema compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
    #[serde(default)]
    pub structs: Vec<StructDescriptor>,
    #[serde(default)]
    pub protocol: ProtocolDescriptor,
}

impl SchemaDescriptor {
    /// Parse and validate a descriptor document.
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: SchemaDescriptor = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Load, parse and validate a descriptor file.
    ///
    /// Symlinks and files over [`MAX_DESCRIPTOR_FILE_SIZE`] are refused.
    pub fn from_file(path: &Path) -> Result<Self> {
        let metadata = std::fs::symlink_metadata(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        if metadata.file_type().is_symlink() {
            return Err(SchemaError::LoadFailed(format!(
                "refusing to load descriptor symlink: {}",
                path.display()
            )));
        }
        if !metadata.is_file() {
            return Err(SchemaError::LoadFailed(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > MAX_DESCRIPTOR_FILE_SIZE as u64 {
            return Err(SchemaError::LoadFailed(format!(
                "descriptor file too large ({} bytes): {}",
                metadata.len(),
                path.display()
            )));
        }

        let file = std::fs::File::open(path).map_err(|err| {
            SchemaError::LoadFailed(format!("failed opening {}: {err}", path.display()))
        })?;
        let read_limit = (MAX_DESCRIPTOR_FILE_SIZE as u64).saturating_add(1);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > MAX_DESCRIPTOR_FILE_SIZE {
            return Err(SchemaError::LoadFailed(format!(
                "descriptor file too large while reading: {}",
                path.display()
            )));
        }

        let descriptor = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            structs = descriptor.structs.len(),
            enums = descriptor.enums.len(),
            messages = descriptor.protocol.message_ids.len(),
            "loaded descriptor"
        );
        Ok(descriptor)
    }

    /// Look up a struct by name.
    pub fn struct_named(&self, name: &str) -> Option<&StructDescriptor> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Look up an enum by name.
    pub fn enum_named(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitive_type_refs() {
        let ty: TypeRef = serde_json::from_str(r#"{"name": "uint16", "size": null}"#).unwrap();
        assert_eq!(ty, TypeRef::UInt16);

        let ty: TypeRef = serde_json::from_str(r#"{"name": "bytes", "size": 4}"#).unwrap();
        assert_eq!(ty, TypeRef::Bytes(Width::Fixed(4)));

        let ty: TypeRef = serde_json::from_str(r#"{"name": "string", "size": 0}"#).unwrap();
        assert_eq!(ty, TypeRef::String(Width::Variable));

        let ty: TypeRef = serde_json::from_str(r#"{"name": "string"}"#).unwrap();
        assert_eq!(ty, TypeRef::String(Width::Variable));
    }

    #[test]
    fn unknown_names_are_references() {
        let ty: TypeRef = serde_json::from_str(r#"{"name": "Direction"}"#).unwrap();
        assert_eq!(ty, TypeRef::named("Direction"));
        assert!(!ty.is_primitive());
    }

    #[test]
    fn type_ref_serializes_back() {
        let json = serde_json::to_value(TypeRef::String(Width::Fixed(16))).unwrap();
        assert_eq!(json, serde_json::json!({"name": "string", "size": 16}));
    }

    #[test]
    fn type_ref_display() {
        assert_eq!(TypeRef::Bytes(Width::Fixed(4)).to_string(), "bytes[4]");
        assert_eq!(TypeRef::String(Width::Variable).to_string(), "string[]");
        assert_eq!(TypeRef::Int32.to_string(), "int32");
        assert_eq!(TypeRef::named("Ack").to_string(), "Ack");
    }

    #[test]
    fn field_array_shapes() {
        let json = r#"[
            {"name": "a", "type": {"name": "uint8"}},
            {"name": "b", "type": {"name": "uint8"}, "arraySize": 0},
            {"name": "c", "type": {"name": "uint8"}, "arraySize": 3}
        ]"#;
        let fields: Vec<FieldDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(fields[0].array_len(), None);
        assert_eq!(fields[1].array_len(), Some(ArrayLen::Variable));
        assert_eq!(fields[2].array_len(), Some(ArrayLen::Fixed(3)));
        assert_eq!(
            FieldDescriptor::new("c", TypeRef::UInt8).array(ArrayLen::Fixed(3)),
            fields[2]
        );
    }

    #[test]
    fn ignores_compiler_metadata() {
        let json = r#"{
            "name": "Ack",
            "comment": "acknowledge",
            "annotations": [],
            "members": [
                {"name": "code", "type": {"name": "uint8", "size": null},
                 "value": null, "comment": null, "annotations": [], "arraySize": null}
            ]
        }"#;
        let desc: StructDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.members.len(), 1);
        assert_eq!(desc.field("code").unwrap().ty, TypeRef::UInt8);
    }

    #[test]
    fn enum_symbols() {
        let json = r#"{"name": "Direction", "type": {"name": "uint8"},
                       "values": [{"name": "Up", "value": 0}, {"name": "Left", "value": 2}]}"#;
        let desc: EnumDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.symbol_of(2), Some("Left"));
        assert_eq!(desc.symbol_of(9), None);
    }

    #[test]
    fn from_file_rejects_missing_file() {
        let err = SchemaDescriptor::from_file(Path::new("/nonexistent/proto.json")).unwrap_err();
        assert!(matches!(err, SchemaError::LoadFailed(_)));
    }

    #[test]
    fn from_file_loads_descriptor() {
        let dir = std::env::temp_dir().join(format!("bakelite-schema-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("proto.json");
        std::fs::write(
            &path,
            r#"{"structs": [{"name": "Ack", "members": [{"name": "code", "type": {"name": "uint8"}}]}],
                "protocol": {"message_ids": [{"name": "Ack", "number": 2}]}}"#,
        )
        .unwrap();

        let desc = SchemaDescriptor::from_file(&path).unwrap();
        assert!(desc.struct_named("Ack").is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn from_file_refuses_symlink() {
        let dir = std::env::temp_dir().join(format!("bakelite-schema-link-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("real.json");
        let link = dir.join("link.json");
        std::fs::write(&target, "{}").unwrap();
        let _ = std::fs::remove_file(&link);
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = SchemaDescriptor::from_file(&link).unwrap_err();
        assert!(matches!(err, SchemaError::LoadFailed(msg) if msg.contains("symlink")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
