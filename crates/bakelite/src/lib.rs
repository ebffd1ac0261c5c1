//! Runtime for bakelite binary protocols.
//!
//! A schema compiler (not part of this crate) describes structs, enums and a
//! message-ID table. This crate packs messages into a compact binary layout,
//! frames them with COBS byte stuffing and an optional CRC trailer, and
//! dispatches received frames back to typed messages. It is meant for
//! byte-oriented links such as serial ports and sockets to small devices.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte endpoints (streams, callbacks, in-memory pairs)
//! - [`frame`]: COBS stuffing, CRC trailers and the stream framer
//! - [`schema`]: type descriptors, message table and registry
//! - [`codec`]: value model and schema-driven pack/unpack
//! - [`protocol`]: typed send and poll over an endpoint
//!
//! ```
//! use bakelite::codec::{Record, Value};
//! use bakelite::protocol::Protocol;
//! use bakelite::schema::SchemaDescriptor;
//! use bakelite::transport::MemoryEndpoint;
//!
//! let schema = SchemaDescriptor::from_json(r#"{
//!     "structs": [{"name": "Ack", "members": [{"name": "code", "type": {"name": "uint8"}}]}],
//!     "protocol": {"options": [{"name": "crc", "value": "CRC8"}],
//!                  "message_ids": [{"name": "Ack", "number": 2}]}
//! }"#)?;
//! let mut proto = Protocol::from_schema(MemoryEndpoint::loopback(), &schema)?;
//!
//! let ack: Value = Record::new().with("code", 111u8).into();
//! proto.send_value("Ack", &ack)?;
//! let incoming = proto.poll()?.expect("frame is buffered");
//! assert_eq!(incoming.name, "Ack");
//! assert_eq!(incoming.value, ack);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use bakelite_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use bakelite_frame::*;
}

/// Re-export schema types.
pub mod schema {
    pub use bakelite_schema::*;
}

/// Re-export codec types.
pub mod codec {
    pub use bakelite_codec::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use bakelite_protocol::*;
}

pub use bakelite_codec::{Message, MessageSet, Record, Value};
pub use bakelite_protocol::{Incoming, Protocol, ProtocolError};
