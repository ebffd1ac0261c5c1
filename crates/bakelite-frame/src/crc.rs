//! Checksum trailer: append and verify.

use std::fmt;
use std::str::FromStr;

use crc::{Crc, CRC_16_ARC, CRC_8_SMBUS};

use crate::error::{FrameError, Result};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Checksum width appended to every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CrcSize {
    /// No checksum.
    None,
    /// CRC-8 (poly 0x07), 1 byte.
    #[default]
    Crc8,
    /// CRC-16/ARC (reflected poly 0x8005), 2 bytes.
    Crc16,
    /// CRC-32 (IEEE 802.3), 4 bytes.
    Crc32,
}

impl CrcSize {
    /// Trailer width in bytes.
    pub const fn len(self) -> usize {
        match self {
            CrcSize::None => 0,
            CrcSize::Crc8 => 1,
            CrcSize::Crc16 => 2,
            CrcSize::Crc32 => 4,
        }
    }

    /// True for [`CrcSize::None`].
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Checksum of `data`, widened to `u32`.
    pub fn checksum(self, data: &[u8]) -> u32 {
        match self {
            CrcSize::None => 0,
            CrcSize::Crc8 => u32::from(CRC8.checksum(data)),
            CrcSize::Crc16 => u32::from(CRC16.checksum(data)),
            CrcSize::Crc32 => crc32fast::hash(data),
        }
    }

    /// Option spelling used in protocol descriptors.
    pub const fn as_str(self) -> &'static str {
        match self {
            CrcSize::None => "none",
            CrcSize::Crc8 => "crc8",
            CrcSize::Crc16 => "crc16",
            CrcSize::Crc32 => "crc32",
        }
    }
}

impl fmt::Display for CrcSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized checksum name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown CRC type {0:?} (expected none, crc8, crc16 or crc32)")]
pub struct UnknownCrc(pub String);

impl FromStr for CrcSize {
    type Err = UnknownCrc;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(CrcSize::None),
            "crc8" => Ok(CrcSize::Crc8),
            "crc16" => Ok(CrcSize::Crc16),
            "crc32" => Ok(CrcSize::Crc32),
            _ => Err(UnknownCrc(s.to_string())),
        }
    }
}

/// Return `data` followed by its little-endian checksum.
pub fn append_crc(data: &[u8], crc: CrcSize) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + crc.len());
    out.extend_from_slice(data);
    let value = crc.checksum(data).to_le_bytes();
    out.extend_from_slice(&value[..crc.len()]);
    out
}

/// Verify and strip the checksum trailer.
///
/// With [`CrcSize::None`] the input is returned unchanged.
pub fn check_crc(data: &[u8], crc: CrcSize) -> Result<&[u8]> {
    if crc.is_empty() {
        return Ok(data);
    }
    if data.is_empty() || data.len() < crc.len() {
        return Err(FrameError::CrcCheckFailure);
    }

    let (payload, trailer) = data.split_at(data.len() - crc.len());
    let mut expected = [0u8; 4];
    expected[..trailer.len()].copy_from_slice(trailer);

    if crc.checksum(payload) != u32::from_le_bytes(expected) {
        return Err(FrameError::CrcCheckFailure);
    }
    Ok(payload)
}
