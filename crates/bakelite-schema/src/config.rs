use std::fmt;
use std::str::FromStr;

use bakelite_frame::{CrcSize, FrameConfig};
use serde_json::Value;

use crate::descriptor::ProtocolDescriptor;
use crate::error::{Result, SchemaError};

/// Frame delimiting scheme. Only one is defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Framing {
    #[default]
    Cobs,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Cobs => f.write_str("cobs"),
        }
    }
}

impl FromStr for Framing {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("cobs") {
            Ok(Framing::Cobs)
        } else {
            Err(SchemaError::InvalidOption {
                name: "framing".to_string(),
                message: format!("unsupported framing {s:?}"),
            })
        }
    }
}

/// Options parsed from a descriptor's `protocol.options` list.
///
/// Absent options fall back to: no checksum, COBS framing, no length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolOptions {
    pub crc: CrcSize,
    pub framing: Framing,
    /// Largest frame payload (message ID byte included).
    pub max_length: Option<usize>,
}

impl Default for ProtocolOptions {
    fn default() -> Self {
        Self {
            crc: CrcSize::None,
            framing: Framing::Cobs,
            max_length: None,
        }
    }
}

impl ProtocolOptions {
    /// Parse the recognised options. Unrecognised option names are ignored.
    pub fn from_descriptor(protocol: &ProtocolDescriptor) -> Result<Self> {
        let mut options = Self::default();

        if let Some(value) = protocol.option("crc") {
            let text = option_str("crc", value)?;
            options.crc = text.parse().map_err(|err| SchemaError::InvalidOption {
                name: "crc".to_string(),
                message: format!("{err}"),
            })?;
        }
        if let Some(value) = protocol.option("framing") {
            options.framing = option_str("framing", value)?.parse()?;
        }
        if let Some(value) = protocol.option("maxLength") {
            options.max_length = Some(option_len("maxLength", value)?);
        }

        Ok(options)
    }

    /// Framer configuration matching these options.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            crc: self.crc,
            max_payload_size: self.max_length,
        }
    }
}

// The option `value` is often serialized as a string even for numbers.
fn option_str<'a>(name: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| SchemaError::InvalidOption {
        name: name.to_string(),
        message: format!("expected a string, got {value}"),
    })
}

fn option_len(name: &str, value: &Value) -> Result<usize> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n > 0 => usize::try_from(n).map_err(|_| SchemaError::InvalidOption {
            name: name.to_string(),
            message: format!("{n} does not fit in memory"),
        }),
        _ => Err(SchemaError::InvalidOption {
            name: name.to_string(),
            message: format!("expected a positive integer, got {value}"),
        }),
    }
}
