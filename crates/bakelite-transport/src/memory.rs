use std::sync::{Arc, Mutex, MutexGuard};

use bytes::{Bytes, BytesMut};

use crate::endpoint::Endpoint;
use crate::error::Result;

type Pipe = Arc<Mutex<BytesMut>>;

/// In-memory endpoint.
///
/// [`MemoryEndpoint::pair`] returns two cross-connected endpoints: whatever one
/// side writes, the other side reads. [`MemoryEndpoint::loopback`] returns a
/// single endpoint that reads back its own writes. Clones share the same
/// buffers, so a clone can be used to observe or inject raw wire bytes.
#[derive(Clone, Default)]
pub struct MemoryEndpoint {
    rx: Pipe,
    tx: Pipe,
}

impl MemoryEndpoint {
    /// Two endpoints connected to each other.
    pub fn pair() -> (Self, Self) {
        let a_to_b: Pipe = Arc::default();
        let b_to_a: Pipe = Arc::default();
        (
            Self {
                rx: Arc::clone(&b_to_a),
                tx: Arc::clone(&a_to_b),
            },
            Self {
                rx: a_to_b,
                tx: b_to_a,
            },
        )
    }

    /// One endpoint whose reads return its own writes.
    pub fn loopback() -> Self {
        let pipe: Pipe = Arc::default();
        Self {
            rx: Arc::clone(&pipe),
            tx: pipe,
        }
    }

    /// Queue raw bytes as if the peer had sent them.
    pub fn inject(&self, data: &[u8]) {
        lock(&self.rx).extend_from_slice(data);
    }

    /// Take every byte written so far that the peer has not read yet.
    pub fn take_written(&self) -> Bytes {
        lock(&self.tx).split().freeze()
    }

    /// Number of bytes waiting to be read on this side.
    pub fn pending(&self) -> usize {
        lock(&self.rx).len()
    }
}

impl Endpoint for MemoryEndpoint {
    fn read(&mut self) -> Result<Bytes> {
        Ok(lock(&self.rx).split().freeze())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        lock(&self.tx).extend_from_slice(data);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEndpoint")
            .field("pending", &self.pending())
            .finish()
    }
}

// A panic while holding the lock cannot leave a BytesMut half-updated, so a
// poisoned pipe is still usable.
fn lock(pipe: &Pipe) -> MutexGuard<'_, BytesMut> {
    pipe.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
