//! Consistent-overhead byte stuffing.
//!
//! Removes every `0x00` from a payload so that `0x00` can delimit frames.
//! Each zero-free run is emitted as `run_length + 1` followed by the run.
//! Runs are capped at [`MAX_RUN`] bytes; a maximal block (code `0xFF`) carries
//! no implicit zero.

use bytes::{BufMut, BytesMut};

use crate::error::DecodeError;

/// Longest zero-free run carried by one block.
pub const MAX_RUN: usize = 254;

/// Block code of a maximal block (no reconstructed zero follows it).
const MAX_CODE: u8 = 0xFF;

/// Upper bound on the stuffed size of an `len`-byte payload.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / MAX_RUN + 1
}

/// Stuff `data` into a new buffer.
///
/// Empty input encodes to empty output.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut dst = BytesMut::new();
    encode_into(data, &mut dst);
    dst.to_vec()
}

/// Stuff `data`, appending the result to `dst`.
pub fn encode_into(data: &[u8], dst: &mut BytesMut) {
    if data.is_empty() {
        return;
    }

    dst.reserve(max_encoded_len(data.len()));

    // Index of the code byte of the block being filled; patched when the
    // block is flushed.
    let mut code_index = dst.len();
    dst.put_u8(0);
    let mut run = 0usize;
    let mut full_block = false;

    for &byte in data {
        full_block = false;
        if byte == 0 {
            dst[code_index] = (run + 1) as u8;
            code_index = dst.len();
            dst.put_u8(0);
            run = 0;
            continue;
        }

        dst.put_u8(byte);
        run += 1;
        if run == MAX_RUN {
            dst[code_index] = MAX_CODE;
            code_index = dst.len();
            dst.put_u8(0);
            run = 0;
            full_block = true;
        }
    }

    if full_block {
        // The last block was exactly full: no trailing empty block.
        dst.truncate(code_index);
    } else {
        dst[code_index] = (run + 1) as u8;
    }
}

/// Reverse [`encode`].
///
/// Every non-maximal block is followed by a reconstructed zero; the zero
/// after the final block stands for the frame boundary and is dropped.
/// Empty input decodes to empty output.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(data.len());
    let mut rest = data;
    let mut offset = 0usize;
    let mut trailing_zero = false;

    while let Some((&code, tail)) = rest.split_first() {
        if code == 0 {
            return Err(DecodeError::UnexpectedNull { offset });
        }

        let block_len = code as usize;
        if block_len > rest.len() {
            return Err(DecodeError::BlockOverrun {
                block_len,
                available: rest.len(),
            });
        }

        out.extend_from_slice(&tail[..block_len - 1]);
        trailing_zero = code != MAX_CODE;
        if trailing_zero {
            out.push(0);
        }

        rest = &rest[block_len..];
        offset += block_len;
    }

    if trailing_zero {
        out.pop();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_zero_length() {
        assert_eq!(encode(b""), b"");
    }

    #[test]
    fn encode_one_byte() {
        assert_eq!(encode(b"f"), b"\x02f");
    }

    #[test]
    fn encode_small_string() {
        assert_eq!(encode(b"hello"), b"\x06hello");
    }

    #[test]
    fn encode_null_byte() {
        assert_eq!(encode(b"hello\x00world"), b"\x06hello\x06world");
    }

    #[test]
    fn encode_null_terminated() {
        assert_eq!(encode(b"hello\x00world\x00"), b"\x06hello\x06world\x01");
    }

    #[test]
    fn encode_consecutive_zeros() {
        assert_eq!(encode(b"\x00\x00"), b"\x01\x01\x01");
    }

    #[test]
    fn encode_254_bytes_has_no_trailing_block() {
        let input = vec![b'A'; 254];
        let mut expected = vec![0xFF];
        expected.extend_from_slice(&input);
        assert_eq!(encode(&input), expected);
    }

    #[test]
    fn encode_500_bytes_spans_blocks() {
        let input = vec![b'A'; 500];
        let mut expected = vec![0xFF];
        expected.extend_from_slice(&input[..254]);
        expected.push(0xF7);
        expected.extend_from_slice(&input[254..]);
        assert_eq!(encode(&input), expected);
    }

    #[test]
    fn encode_full_block_followed_by_zero() {
        let mut input = vec![b'A'; 254];
        input.push(0);
        let encoded = encode(&input);
        assert_eq!(&encoded[255..], b"\x01\x01");
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn encode_into_appends() {
        let mut dst = BytesMut::from(&b"\x00"[..]);
        encode_into(b"ab", &mut dst);
        assert_eq!(dst.as_ref(), b"\x00\x03ab");
    }

    #[test]
    fn decode_zero_length() {
        assert_eq!(decode(b"").unwrap(), b"");
    }

    #[test]
    fn decode_one_byte() {
        assert_eq!(decode(b"\x02f").unwrap(), b"f");
    }

    #[test]
    fn decode_null_byte() {
        assert_eq!(decode(b"\x06hello\x06world").unwrap(), b"hello\x00world");
    }

    #[test]
    fn decode_null_terminated() {
        assert_eq!(
            decode(b"\x06hello\x06world\x01").unwrap(),
            b"hello\x00world\x00"
        );
    }

    #[test]
    fn decode_single_empty_block() {
        assert_eq!(decode(b"\x01").unwrap(), b"");
    }

    #[test]
    fn decode_254_bytes() {
        let input = vec![b'A'; 254];
        let mut wire = vec![0xFF];
        wire.extend_from_slice(&input);
        assert_eq!(decode(&wire).unwrap(), input);
    }

    #[test]
    fn decode_unexpected_null() {
        let err = decode(b"\x06hello\x00\x06world\x01").unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedNull { offset: 6 });
    }

    #[test]
    fn decode_block_too_long() {
        let err = decode(b"\xffhello\x06world").unwrap_err();
        assert!(matches!(err, DecodeError::BlockOverrun { block_len: 255, .. }));
    }

    #[test]
    fn decode_block_too_short() {
        assert!(decode(b"\x03hello\x06world").is_err());
    }

    #[test]
    fn encode_decode() {
        assert_eq!(decode(&encode(b"Hello\x00world!")).unwrap(), b"Hello\x00world!");
    }

    #[test]
    fn encoded_output_never_contains_delimiter() {
        let input: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        let encoded = encode(&input);
        assert!(!encoded.contains(&0));
        assert!(encoded.len() <= max_encoded_len(input.len()));
    }
}
