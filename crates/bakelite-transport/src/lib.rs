//! Byte-oriented endpoint abstraction.
//!
//! The protocol layer never owns a serial port or socket directly. It talks to
//! an [`Endpoint`], which hands over whatever bytes are currently available and
//! accepts complete frames for writing:
//! - [`StreamEndpoint`] wraps any duplex `Read + Write` stream
//! - [`FnEndpoint`] wraps a pair of read/write closures
//! - [`MemoryEndpoint`] connects two peers (or one peer to itself) in memory
//!
//! This is the lowest layer of bakelite. Blocking and timeout behavior belong
//! to the wrapped transport, not to this crate.

pub mod endpoint;
pub mod error;
pub mod memory;

pub use endpoint::{Endpoint, FnEndpoint, StreamEndpoint, READ_CHUNK_SIZE};
pub use error::{Result, TransportError};
pub use memory::MemoryEndpoint;
