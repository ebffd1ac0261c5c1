use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use bakelite_codec::{pack_struct, unpack_struct, Message, MessageSet, Value};
use bakelite_frame::Framer;
use bakelite_schema::{
    MessageTable, ProtocolDescriptor, ProtocolOptions, Registry, SchemaDescriptor,
};
use bakelite_transport::Endpoint;

use crate::error::{ProtocolError, Result};

/// A decoded message that has not yet been converted to a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    /// Wire ID.
    pub id: u8,
    /// Struct name the ID maps to.
    pub name: String,
    /// Unpacked struct.
    pub value: Value,
}

impl Incoming {
    /// Convert into `M`, failing if this is a different message.
    pub fn into_message<M: Message>(self) -> Result<M> {
        if self.name != M::NAME {
            return Err(ProtocolError::UnexpectedMessage {
                expected: M::NAME,
                found: self.name,
            });
        }
        Ok(<M as Message>::from_value(self.value)?)
    }

    /// Convert into a member of a message set.
    pub fn into_set<S: MessageSet>(self) -> Result<S> {
        Ok(S::from_incoming(&self.name, self.value)?)
    }
}

/// Message dispatcher bound to one endpoint.
///
/// Single owner; every call runs to completion on the caller's thread. The
/// only place that can block is [`Endpoint::read`].
pub struct Protocol<E> {
    endpoint: E,
    registry: Arc<Registry>,
    table: MessageTable,
    framer: Framer,
}

impl<E: Endpoint> Protocol<E> {
    /// Build from a shared registry and the descriptor's `protocol` block.
    ///
    /// The message table and framer settings come from the descriptor.
    pub fn new(endpoint: E, registry: Arc<Registry>, protocol: &ProtocolDescriptor) -> Result<Self> {
        let table = MessageTable::from_ids(&protocol.message_ids)?;
        let options = ProtocolOptions::from_descriptor(protocol)?;
        tracing::debug!(
            messages = table.len(),
            crc = %options.crc,
            framing = %options.framing,
            max_length = ?options.max_length,
            "protocol configured"
        );
        Ok(Self::with_parts(
            endpoint,
            registry,
            table,
            Framer::with_config(options.frame_config()),
        ))
    }

    /// Build from explicit parts.
    pub fn with_parts(
        endpoint: E,
        registry: Arc<Registry>,
        table: MessageTable,
        framer: Framer,
    ) -> Self {
        Self {
            endpoint,
            registry,
            table,
            framer,
        }
    }

    /// Build everything, registry included, from a full descriptor.
    pub fn from_schema(endpoint: E, schema: &SchemaDescriptor) -> Result<Self> {
        let registry = Arc::new(Registry::from_schema(schema)?);
        Self::new(endpoint, registry, &schema.protocol)
    }

    /// Send a typed message.
    pub fn send<M: Message>(&mut self, message: &M) -> Result<()> {
        self.send_value(M::NAME, &message.to_value())
    }

    /// Send a struct value under a message name.
    pub fn send_value(&mut self, name: &str, value: &Value) -> Result<()> {
        let frame = self.encode_value(name, value)?;
        self.endpoint.write(&frame)?;
        tracing::trace!(name, frame_len = frame.len(), "sent message");
        Ok(())
    }

    /// Produce the complete wire frame for a message without sending it.
    pub fn encode_value(&self, name: &str, value: &Value) -> Result<Bytes> {
        let id = self
            .table
            .id_of(name)
            .ok_or_else(|| ProtocolError::NoMessageId(name.to_string()))?;
        let desc = self
            .registry
            .get_struct(name)
            .ok_or_else(|| ProtocolError::NotAMessage(name.to_string()))?;

        let mut payload = BytesMut::with_capacity(64);
        payload.put_u8(id);
        pack_struct(value, desc, &self.registry, &mut payload)?;
        Ok(self.framer.encode_frame(&payload)?)
    }

    /// Read what the endpoint has and return at most one message.
    ///
    /// `Ok(None)` means no complete message is buffered yet; a valid frame
    /// with an empty payload is skipped the same way. After an error
    /// the offending frame is gone and the next call proceeds normally.
    pub fn poll(&mut self) -> Result<Option<Incoming>> {
        let data = self.endpoint.read()?;
        if !data.is_empty() {
            self.framer.append_buffer(&data);
        }

        let Some(frame) = self.framer.decode_frame()? else {
            return Ok(None);
        };
        if frame.is_empty() {
            tracing::debug!("skipping frame with empty payload");
            return Ok(None);
        }
        self.decode_payload(&frame).map(Some)
    }

    /// Like [`poll`](Protocol::poll), converting into a message set.
    pub fn poll_as<S: MessageSet>(&mut self) -> Result<Option<S>> {
        match self.poll()? {
            Some(incoming) => incoming.into_set().map(Some),
            None => Ok(None),
        }
    }

    /// Interpret an already unframed payload: ID byte then packed struct.
    pub fn decode_payload(&self, payload: &[u8]) -> Result<Incoming> {
        let (&id, mut body) = payload.split_first().ok_or(ProtocolError::EmptyFrame)?;
        let Some(name) = self.table.name_of(id) else {
            tracing::warn!(id, "dropping frame with unknown message ID");
            return Err(ProtocolError::UnknownMessageId(id));
        };
        let desc = self
            .registry
            .get_struct(name)
            .ok_or_else(|| ProtocolError::NotAMessage(name.to_string()))?;

        let value = unpack_struct(&mut body, desc, &self.registry)?;
        if !body.is_empty() {
            tracing::debug!(name, trailing = body.len(), "ignoring trailing payload bytes");
        }
        Ok(Incoming {
            id,
            name: name.to_string(),
            value,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn message_table(&self) -> &MessageTable {
        &self.table
    }

    pub fn framer_mut(&mut self) -> &mut Framer {
        &mut self.framer
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    /// Give back the endpoint. Buffered partial frames are dropped.
    pub fn into_inner(self) -> E {
        self.endpoint
    }
}

impl<E> std::fmt::Debug for Protocol<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protocol")
            .field("messages", &self.table.len())
            .field("framer", &self.framer)
            .finish_non_exhaustive()
    }
}
