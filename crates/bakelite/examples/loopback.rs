//! Two in-memory peers exchanging typed messages.
//!
//! Run with `cargo run -p bakelite --example loopback`.

use std::sync::Arc;

use bakelite::codec::{FromValue, SerializationError};
use bakelite::schema::{Registry, SchemaDescriptor};
use bakelite::transport::MemoryEndpoint;
use bakelite::{Message, MessageSet, Protocol, Record, Value};

const DESCRIPTOR: &str = r#"{
    "enums": [{"name": "Direction", "type": {"name": "uint8"},
               "values": [{"name": "Up", "value": 0}, {"name": "Down", "value": 1}]}],
    "structs": [
        {"name": "Move", "members": [
            {"name": "direction", "type": {"name": "Direction"}},
            {"name": "steps", "type": {"name": "uint16"}}
        ]},
        {"name": "Ack", "members": [{"name": "code", "type": {"name": "uint8"}}]}
    ],
    "protocol": {
        "options": [{"name": "crc", "value": "CRC16"}],
        "message_ids": [{"name": "Move", "number": 1}, {"name": "Ack", "number": 2}]
    }
}"#;

#[derive(Debug)]
struct Move {
    direction: u8,
    steps: u16,
}

impl Message for Move {
    const NAME: &'static str = "Move";

    fn to_value(&self) -> Value {
        Record::new()
            .with("direction", self.direction)
            .with("steps", self.steps)
            .into()
    }

    fn from_value(value: Value) -> Result<Self, SerializationError> {
        let mut record = Record::from_value(value)?;
        Ok(Move {
            direction: record.take("direction")?,
            steps: record.take("steps")?,
        })
    }
}

#[derive(Debug)]
struct Ack {
    code: u8,
}

impl Message for Ack {
    const NAME: &'static str = "Ack";

    fn to_value(&self) -> Value {
        Record::new().with("code", self.code).into()
    }

    fn from_value(value: Value) -> Result<Self, SerializationError> {
        let mut record = Record::from_value(value)?;
        Ok(Ack {
            code: record.take("code")?,
        })
    }
}

#[derive(Debug)]
enum Inbound {
    Move(Move),
    Ack(Ack),
}

impl MessageSet for Inbound {
    fn from_incoming(name: &str, value: Value) -> Result<Self, SerializationError> {
        match name {
            Move::NAME => Ok(Inbound::Move(<Move as Message>::from_value(value)?)),
            Ack::NAME => Ok(Inbound::Ack(<Ack as Message>::from_value(value)?)),
            other => Err(SerializationError::UnknownType(other.to_string())),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaDescriptor::from_json(DESCRIPTOR)?;
    let registry = Arc::new(Registry::from_schema(&schema)?);
    let (left, right) = MemoryEndpoint::pair();

    let mut controller = Protocol::new(left, Arc::clone(&registry), &schema.protocol)?;
    let mut device = Protocol::new(right, registry, &schema.protocol)?;

    controller.send(&Move {
        direction: 1,
        steps: 300,
    })?;

    while let Some(message) = device.poll_as::<Inbound>()? {
        println!("device received {message:?}");
        if let Inbound::Move(_) = message {
            device.send(&Ack { code: 0 })?;
        }
    }

    if let Some(Inbound::Ack(ack)) = controller.poll_as::<Inbound>()? {
        println!("controller received ack code {}", ack.code);
    }
    Ok(())
}
