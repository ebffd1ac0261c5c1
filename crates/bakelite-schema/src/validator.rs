use std::collections::HashSet;

use crate::config::ProtocolOptions;
use crate::descriptor::{SchemaDescriptor, TypeRef};
use crate::error::{Result, SchemaError};
use crate::table::MessageTable;

impl SchemaDescriptor {
    /// Check internal consistency: message IDs, type references, enum
    /// underlying types and option values.
    pub fn validate(&self) -> Result<()> {
        let structs: HashSet<&str> = self.structs.iter().map(|s| s.name.as_str()).collect();
        let declared: HashSet<&str> = structs
            .iter()
            .copied()
            .chain(self.enums.iter().map(|e| e.name.as_str()))
            .collect();

        for desc in &self.enums {
            if !desc.ty.is_integer() {
                return Err(SchemaError::InvalidEnumType {
                    name: desc.name.clone(),
                    ty: desc.ty.to_string(),
                });
            }
        }

        for desc in &self.structs {
            for field in &desc.members {
                if let TypeRef::Named(name) = &field.ty {
                    if !declared.contains(name.as_str()) {
                        return Err(SchemaError::UnresolvedType {
                            owner: desc.name.clone(),
                            field: field.name.clone(),
                            name: name.clone(),
                        });
                    }
                }
            }
        }

        let table = MessageTable::from_ids(&self.protocol.message_ids)?;
        if let Some((_, name)) = table.iter().find(|(_, name)| !structs.contains(name)) {
            return Err(SchemaError::UnknownStruct(name.to_string()));
        }

        ProtocolOptions::from_descriptor(&self.protocol)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "enums": [{"name": "Direction", "type": {"name": "uint8"},
                   "values": [{"name": "Up", "value": 0}]}],
        "structs": [
            {"name": "Ack", "members": [{"name": "code", "type": {"name": "uint8"}}]},
            {"name": "Move", "members": [
                {"name": "dir", "type": {"name": "Direction"}},
                {"name": "ack", "type": {"name": "Ack"}, "arraySize": 0}
            ]}
        ],
        "protocol": {
            "options": [{"name": "crc", "value": "CRC8"}],
            "message_ids": [{"name": "Ack", "number": 2}, {"name": "Move", "number": 3}]
        }
    }"#;

    #[test]
    fn accepts_valid_descriptor() {
        let desc = SchemaDescriptor::from_json(VALID).unwrap();
        assert_eq!(desc.structs.len(), 2);
        let table = MessageTable::from_descriptor(&desc).unwrap();
        assert_eq!(table.id_of("Move"), Some(3));
    }

    #[test]
    fn empty_document_is_valid() {
        let desc = SchemaDescriptor::from_json("{}").unwrap();
        assert!(desc.structs.is_empty());
    }

    #[test]
    fn rejects_unresolved_reference() {
        let json = r#"{"structs": [{"name": "A", "members": [
            {"name": "b", "type": {"name": "Missing"}}]}]}"#;
        let err = SchemaDescriptor::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedType { ref name, .. } if name == "Missing"));
    }

    #[test]
    fn rejects_message_that_is_not_a_struct() {
        let json = r#"{
            "enums": [{"name": "Direction", "type": {"name": "uint8"}}],
            "protocol": {"message_ids": [{"name": "Direction", "number": 1}]}
        }"#;
        let err = SchemaDescriptor::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownStruct(name) if name == "Direction"));
    }

    #[test]
    fn rejects_non_integer_enum() {
        let json = r#"{"enums": [{"name": "E", "type": {"name": "float32"}}]}"#;
        let err = SchemaDescriptor::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidEnumType { ref ty, .. } if ty == "float32"));
    }

    #[test]
    fn rejects_reserved_id() {
        let json = r#"{
            "structs": [{"name": "Ack", "members": []}],
            "protocol": {"message_ids": [{"name": "Ack", "number": 0}]}
        }"#;
        let err = SchemaDescriptor::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::ReservedMessageId { .. }));
    }

    #[test]
    fn rejects_bad_option() {
        let json = r#"{"protocol": {"options": [{"name": "crc", "value": "crc12"}]}}"#;
        let err = SchemaDescriptor::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOption { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SchemaDescriptor::from_json("{\"structs\": 5}").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidJson(_)));
    }
}
