//! `tokio_util::codec` adapter for async transports.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;
use crate::framer::{FrameConfig, Framer};

/// Frame codec for `FramedRead` / `FramedWrite`.
///
/// Decoding yields verified payloads; a corrupt frame surfaces as an error
/// item and decoding resumes with the next frame.
#[derive(Debug, Default)]
pub struct BakeliteCodec {
    framer: Framer,
}

impl BakeliteCodec {
    /// Codec with default configuration (CRC-8).
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            framer: Framer::with_config(config),
        }
    }
}

impl Decoder for BakeliteCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            let incoming = src.split();
            self.framer.append_buffer(&incoming);
        }
        self.framer.decode_frame()
    }
}

impl Encoder<&[u8]> for BakeliteCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame = self.framer.encode_frame(item)?;
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

impl Encoder<Bytes> for BakeliteCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&[u8]>::encode(self, item.as_ref(), dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::crc::CrcSize;

    #[test]
    fn decoder_yields_one_frame_per_call() {
        let mut codec = BakeliteCodec::new();
        let mut src = BytesMut::from(&b"\x00\x06hello\x07world\x93\x00\x00\x03ab"[..]);

        let first = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(first.as_ref(), b"hello\x00world");
        assert!(src.is_empty());
        assert!(codec.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn encoder_matches_framer() {
        let mut codec = BakeliteCodec::with_config(FrameConfig::with_crc(CrcSize::None));
        let mut dst = BytesMut::new();
        codec.encode(&b"hello\x00world"[..], &mut dst).unwrap();
        assert_eq!(dst.as_ref(), b"\x00\x06hello\x06world\x00");
    }

    #[tokio::test]
    async fn framed_write_then_read() {
        let mut sink = FramedWrite::new(Vec::new(), BakeliteCodec::new());
        sink.send(Bytes::from_static(b"one")).await.unwrap();
        sink.send(Bytes::from_static(b"two\x00")).await.unwrap();
        let wire = sink.into_inner();

        let mut stream = FramedRead::new(wire.as_slice(), BakeliteCodec::new());
        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"one");
        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"two\x00");
        assert!(stream.next().await.is_none());
    }
}
