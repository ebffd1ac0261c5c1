//! Zero-delimited framing with CRC integrity for byte-oriented links.
//!
//! Every frame on the wire looks like:
//! - A `0x00` delimiter
//! - The payload plus an optional little-endian CRC trailer, byte-stuffed so
//!   that it contains no `0x00`
//! - A closing `0x00` delimiter
//!
//! The [`Framer`] turns an arbitrary, possibly corrupted byte stream back into
//! payloads, one frame per call, and never gets stuck on a bad frame.

pub mod cobs;
pub mod crc;
pub mod error;
pub mod framer;
pub mod reader;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod writer;

pub use crc::{append_crc, check_crc, CrcSize};
pub use error::{DecodeError, FrameError, Result};
pub use framer::{FrameConfig, Framer, DELIMITER};
pub use reader::FrameReader;
#[cfg(feature = "async")]
pub use tokio_codec::BakeliteCodec;
pub use writer::FrameWriter;
