use bytes::{Buf, Bytes, BytesMut};

use crate::cobs;
use crate::crc::{append_crc, check_crc, CrcSize};
use crate::error::{FrameError, Result};

/// Frame boundary byte.
pub const DELIMITER: u8 = 0x00;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Configuration for the framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Checksum appended to every frame. Default: CRC-8.
    pub crc: CrcSize,
    /// Maximum payload size in bytes (before checksum and stuffing).
    /// Default: unlimited.
    pub max_payload_size: Option<usize>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            crc: CrcSize::Crc8,
            max_payload_size: None,
        }
    }
}

impl FrameConfig {
    /// Default configuration with a specific checksum.
    pub fn with_crc(crc: CrcSize) -> Self {
        Self {
            crc,
            ..Self::default()
        }
    }

    /// Largest stuffed frame body (delimiters excluded) accepted on input.
    pub fn max_encoded_len(&self) -> Option<usize> {
        self.max_payload_size
            .map(|max| cobs::max_encoded_len(max + self.crc.len()))
    }
}

/// Stateful frame encoder/decoder.
///
/// Raw bytes are queued with [`append_buffer`](Framer::append_buffer) and
/// frames are pulled out one at a time with
/// [`decode_frame`](Framer::decode_frame). A frame that fails to unstuff or
/// fails its CRC is reported once and then forgotten; the following call
/// starts from a clean slate.
#[derive(Debug)]
pub struct Framer {
    config: FrameConfig,
    /// Raw bytes not yet examined.
    buffer: BytesMut,
    /// Stuffed bytes of the frame currently being received.
    frame: BytesMut,
    /// Dropping the tail of an over-length frame until the next delimiter.
    discarding: bool,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// Create a framer with CRC-8 and no length limit.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a framer with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            frame: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            discarding: false,
        }
    }

    /// Current framer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Encode a payload into a complete wire frame, delimiters included.
    ///
    /// Wire format:
    /// ```text
    /// ┌──────┬────────────────────────────────────┬──────┐
    /// │ 0x00 │ stuffed(payload ‖ CRC little-end.) │ 0x00 │
    /// └──────┴────────────────────────────────────┴──────┘
    /// ```
    pub fn encode_frame(&self, payload: &[u8]) -> Result<Bytes> {
        if payload.is_empty() {
            return Err(FrameError::EmptyPayload);
        }
        if let Some(max) = self.config.max_payload_size {
            if payload.len() > max {
                return Err(FrameError::PayloadTooLarge {
                    size: payload.len(),
                    max,
                });
            }
        }

        let body = append_crc(payload, self.config.crc);
        let mut out = BytesMut::with_capacity(cobs::max_encoded_len(body.len()) + 2);
        out.extend_from_slice(&[DELIMITER]);
        cobs::encode_into(&body, &mut out);
        out.extend_from_slice(&[DELIMITER]);

        tracing::trace!(
            payload_len = payload.len(),
            wire_len = out.len(),
            crc = %self.config.crc,
            "encoded frame"
        );
        Ok(out.freeze())
    }

    /// Queue raw bytes received from the link.
    pub fn append_buffer(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Extract at most one frame from the queued bytes.
    ///
    /// Returns `Ok(None)` once the queued bytes are exhausted without
    /// completing a frame; a partial frame is kept for the next call.
    pub fn decode_frame(&mut self) -> Result<Option<Bytes>> {
        while !self.buffer.is_empty() {
            let Some(pos) = self.buffer.iter().position(|&b| b == DELIMITER) else {
                let rest = self.buffer.split();
                if !self.discarding {
                    self.frame.extend_from_slice(&rest);
                    self.enforce_limit()?;
                }
                return Ok(None);
            };

            let chunk = self.buffer.split_to(pos);
            self.buffer.advance(1);

            if self.discarding {
                self.discarding = false;
                continue;
            }

            self.frame.extend_from_slice(&chunk);
            if self.frame.is_empty() {
                tracing::trace!("skipping empty frame between delimiters");
                continue;
            }

            // Detach the in-progress frame before touching its contents, so
            // it is gone on every exit path below.
            let raw = self.frame.split();
            if let Some(max) = self.config.max_encoded_len() {
                if raw.len() > max {
                    tracing::warn!(len = raw.len(), max, "dropping over-length frame");
                    return Err(FrameError::FrameTooLong { max });
                }
            }
            return self.decode_raw(&raw).map(Some);
        }

        Ok(None)
    }

    /// Discard all buffered input and any partially received frame.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.frame.clear();
        self.discarding = false;
    }

    /// Bytes held by the framer (unexamined plus in-progress frame).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.frame.len()
    }

    fn enforce_limit(&mut self) -> Result<()> {
        let Some(max) = self.config.max_encoded_len() else {
            return Ok(());
        };
        if self.frame.len() > max {
            tracing::warn!(
                len = self.frame.len(),
                max,
                "frame exceeds maximum length, discarding until next delimiter"
            );
            self.frame.clear();
            self.discarding = true;
            return Err(FrameError::FrameTooLong { max });
        }
        Ok(())
    }

    fn decode_raw(&self, raw: &[u8]) -> Result<Bytes> {
        let decoded = cobs::decode(raw).inspect_err(|err| {
            tracing::warn!(error = %err, len = raw.len(), "dropping malformed frame");
        })?;

        let payload = check_crc(&decoded, self.config.crc).inspect_err(|_| {
            tracing::warn!(crc = %self.config.crc, len = decoded.len(), "dropping frame with bad CRC");
        })?;

        tracing::trace!(payload_len = payload.len(), "decoded frame");
        Ok(Bytes::copy_from_slice(payload))
    }
}
