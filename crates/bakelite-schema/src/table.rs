use std::collections::{BTreeMap, HashMap};

use crate::descriptor::{MessageId, SchemaDescriptor};
use crate::error::{Result, SchemaError};

/// Bijection between message names and their one-byte wire IDs.
///
/// ID 0 is reserved and never present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTable {
    by_id: BTreeMap<u8, String>,
    by_name: HashMap<String, u8>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from a descriptor, validating it first.
    pub fn from_descriptor(descriptor: &SchemaDescriptor) -> Result<Self> {
        descriptor.validate()?;
        Self::from_ids(&descriptor.protocol.message_ids)
    }

    /// Build the table from raw entries. Struct existence is not checked.
    pub fn from_ids(ids: &[MessageId]) -> Result<Self> {
        let mut table = Self::new();
        for entry in ids {
            let id = u8::try_from(entry.number).map_err(|_| SchemaError::MessageIdOutOfRange {
                name: entry.name.clone(),
                number: entry.number,
            })?;
            table.insert(&entry.name, id)?;
        }
        Ok(table)
    }

    /// Add one mapping.
    pub fn insert(&mut self, name: &str, id: u8) -> Result<()> {
        if id == 0 {
            return Err(SchemaError::ReservedMessageId {
                name: name.to_string(),
            });
        }
        if let Some(first) = self.by_id.get(&id) {
            return Err(SchemaError::DuplicateMessageId {
                id,
                first: first.clone(),
                second: name.to_string(),
            });
        }
        if self.by_name.contains_key(name) {
            return Err(SchemaError::DuplicateMessageName(name.to_string()));
        }
        self.by_id.insert(id, name.to_string());
        self.by_name.insert(name.to_string(), id);
        Ok(())
    }

    pub fn id_of(&self, name: &str) -> Option<u8> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: u8) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Entries in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.by_id.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
