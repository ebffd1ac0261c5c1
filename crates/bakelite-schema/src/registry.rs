use std::collections::HashMap;

use crate::descriptor::{EnumDescriptor, SchemaDescriptor, StructDescriptor};
use crate::error::Result;

/// A registered type, tagged with its kind at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeEntry {
    Enum(EnumDescriptor),
    Struct(StructDescriptor),
}

impl TypeEntry {
    pub fn name(&self) -> &str {
        match self {
            TypeEntry::Enum(desc) => &desc.name,
            TypeEntry::Struct(desc) => &desc.name,
        }
    }
}

/// Name-keyed registry of struct and enum descriptors.
///
/// Built once at startup, then shared read-only (typically behind an
/// `Arc`). Registering a name twice replaces the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: HashMap<String, TypeEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a descriptor and register all of its structs and enums.
    pub fn from_schema(schema: &SchemaDescriptor) -> Result<Self> {
        schema.validate()?;
        let mut registry = Self::new();
        for desc in &schema.enums {
            registry.register_enum(desc.clone());
        }
        for desc in &schema.structs {
            registry.register_struct(desc.clone());
        }
        Ok(registry)
    }

    pub fn register_struct(&mut self, desc: StructDescriptor) {
        self.insert(TypeEntry::Struct(desc));
    }

    pub fn register_enum(&mut self, desc: EnumDescriptor) {
        self.insert(TypeEntry::Enum(desc));
    }

    fn insert(&mut self, entry: TypeEntry) {
        let name = entry.name().to_string();
        if let Some(previous) = self.types.insert(name.clone(), entry) {
            tracing::debug!(
                name = %name,
                previous_kind = kind_name(&previous),
                "type rebound in registry"
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructDescriptor> {
        match self.types.get(name) {
            Some(TypeEntry::Struct(desc)) => Some(desc),
            _ => None,
        }
    }

    pub fn get_enum(&self, name: &str) -> Option<&EnumDescriptor> {
        match self.types.get(name) {
            Some(TypeEntry::Enum(desc)) => Some(desc),
            _ => None,
        }
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.get_enum(name).is_some()
    }

    pub fn is_struct(&self, name: &str) -> bool {
        self.get_struct(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn kind_name(entry: &TypeEntry) -> &'static str {
    match entry {
        TypeEntry::Enum(_) => "enum",
        TypeEntry::Struct(_) => "struct",
    }
}
