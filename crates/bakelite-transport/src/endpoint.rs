use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, TransportError};

/// Maximum number of bytes a [`StreamEndpoint`] reads per call.
pub const READ_CHUNK_SIZE: usize = 4 * 1024;

/// A byte-oriented link to exactly one peer.
///
/// `read` returns whatever is currently available and may return an empty
/// buffer when nothing arrived (for example when a serial port read timed out).
/// `write` must either write all of `data` or fail.
pub trait Endpoint {
    /// Read the bytes currently available from the peer.
    fn read(&mut self) -> Result<Bytes>;

    /// Write a complete buffer to the peer.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

impl<E: Endpoint + ?Sized> Endpoint for &mut E {
    fn read(&mut self) -> Result<Bytes> {
        (**self).read()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}

impl<E: Endpoint + ?Sized> Endpoint for Box<E> {
    fn read(&mut self) -> Result<Bytes> {
        (**self).read()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}

/// Endpoint over any duplex `Read + Write` stream (serial port, socket, pipe).
///
/// A read that times out or would block yields an empty buffer, so callers can
/// keep polling. End-of-file is reported as [`TransportError::Closed`].
pub struct StreamEndpoint<T> {
    inner: T,
    chunk: Box<[u8]>,
}

impl<T: Read + Write> StreamEndpoint<T> {
    /// Wrap a duplex stream.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
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

    /// Consume the endpoint and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> Endpoint for StreamEndpoint<T> {
    fn read(&mut self) -> Result<Bytes> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(0) => {
                    tracing::debug!("stream endpoint reached end of input");
                    return Err(TransportError::Closed);
                }
                Ok(n) => return Ok(Bytes::copy_from_slice(&self.chunk[..n])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(Bytes::new())
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut backoff = Backoff::new();
        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => {
                    return Err(TransportError::WriteZero {
                        remaining: data.len() - offset,
                    })
                }
                Ok(n) => {
                    offset += n;
                    backoff.reset();
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => backoff.wait(),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        backoff.reset();
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => backoff.wait(),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

/// Sleep schedule for writes a non-blocking stream refused with `WouldBlock`.
#[derive(Debug)]
struct Backoff {
    delay: Duration,
}

impl Backoff {
    const INITIAL: Duration = Duration::from_micros(50);
    const MAX: Duration = Duration::from_millis(10);

    fn new() -> Self {
        Self {
            delay: Self::INITIAL,
        }
    }

    /// The delay to sleep now; doubles the next one up to [`Backoff::MAX`].
    fn step(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = (delay * 2).min(Self::MAX);
        delay
    }

    fn wait(&mut self) {
        let delay = self.step();
        tracing::trace!(?delay, "stream not writable, backing off");
        std::thread::sleep(delay);
    }

    fn reset(&mut self) {
        self.delay = Self::INITIAL;
    }
}

impl<T> std::fmt::Debug for StreamEndpoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEndpoint")
            .field("chunk_size", &self.chunk.len())
            .finish_non_exhaustive()
    }
}

/// Endpoint built from a read closure and a write closure.
///
/// Useful when the link is driven by a foreign API (a HAL, a test harness)
/// that does not implement `Read`/`Write`.
pub struct FnEndpoint<R, W> {
    read: R,
    write: W,
}

impl<R, W> FnEndpoint<R, W>
where
    R: FnMut() -> std::io::Result<Vec<u8>>,
    W: FnMut(&[u8]) -> std::io::Result<()>,
{
    /// Create an endpoint from read and write callbacks.
    pub fn new(read: R, write: W) -> Self {
        Self { read, write }
    }
}

impl<R, W> Endpoint for FnEndpoint<R, W>
where
    R: FnMut() -> std::io::Result<Vec<u8>>,
    W: FnMut(&[u8]) -> std::io::Result<()>,
{
    fn read(&mut self) -> Result<Bytes> {
        (self.read)().map(Bytes::from).map_err(TransportError::Io)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (self.write)(data).map_err(TransportError::Io)
    }
}
