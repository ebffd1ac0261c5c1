//! Send and receive typed messages over an endpoint.
//!
//! This is the "just works" layer. A [`Protocol`] owns an endpoint, a
//! framer and the message table, and turns typed messages into framed bytes
//! and back:
//!
//! ```text
//! send:  Message -> [id | packed struct] -> checksum -> stuffing -> endpoint
//! poll:  endpoint -> framer -> [id | packed struct] -> Incoming
//! ```

pub mod error;
pub mod protocol;

pub use error::{ProtocolError, Result};
pub use protocol::{Incoming, Protocol};
