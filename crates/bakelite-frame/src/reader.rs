use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::error::{FrameError, Result};
use crate::framer::{FrameConfig, Framer};

const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete frame payloads from any `Read` stream (blocking).
///
/// Handles partial reads internally: callers always get whole, verified
/// payloads. A corrupt frame is reported as an error and the next call
/// continues with the following frame.
pub struct FrameReader<T> {
    inner: T,
    framer: Framer,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            framer: Framer::with_config(config),
        }
    }

    /// Read the next complete frame payload.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = self.framer.decode_frame()? {
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.framer.append_buffer(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Drop buffered input, e.g. after the link was re-opened.
    pub fn resync(&mut self) {
        self.framer.clear_buffer();
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        self.framer.config()
    }
}
