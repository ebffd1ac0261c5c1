use bakelite_frame::{FrameConfig, FrameError, FrameReader};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliResult, DATA_INVALID, SUCCESS};
use crate::input::open_source;
use crate::output::{print_payload, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let source = open_source(args.file.as_deref(), args.hex)?;
    let mut reader = FrameReader::with_config(
        source,
        FrameConfig {
            crc: args.crc,
            max_payload_size: args.max_payload,
        },
    );

    let mut decoded = 0usize;
    let mut rejected = 0usize;
    loop {
        match reader.read_frame() {
            Ok(payload) => {
                print_payload(decoded, &payload, format);
                decoded += 1;
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err @ FrameError::Io(_)) => return Err(frame_error("read failed", err)),
            Err(err) => {
                tracing::warn!(error = %err, "dropping frame");
                rejected += 1;
            }
        }
    }

    tracing::debug!(decoded, rejected, "decode finished");
    Ok(if rejected > 0 { DATA_INVALID } else { SUCCESS })
}
