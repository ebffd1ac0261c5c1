//! Type descriptors and the type registry.
//!
//! A bakelite schema is compiled elsewhere; this crate consumes its output:
//! struct and enum descriptors, the message-ID table and protocol options,
//! usually delivered as a JSON document. Everything here is built once at
//! startup and read-only afterwards.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod table;
pub mod validator;

pub use config::{Framing, ProtocolOptions};
pub use descriptor::{
    ArrayLen, EnumDescriptor, EnumValue, FieldDescriptor, MessageId, ProtocolDescriptor,
    ProtocolOption, SchemaDescriptor, StructDescriptor, TypeRef, Width, MAX_DESCRIPTOR_FILE_SIZE,
    MAX_VARIABLE_LEN,
};
pub use error::{Result, SchemaError};
pub use registry::{Registry, TypeEntry};
pub use table::MessageTable;
