use std::fs;

use bakelite_frame::{FrameConfig, Framer};

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::input::parse_hex;
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let framer = Framer::with_config(FrameConfig {
        crc: args.crc,
        max_payload_size: args.max_payload,
    });
    let frame = framer
        .encode_frame(&payload)
        .map_err(|err| frame_error("encode failed", err))?;

    print_encoded(None, payload.len(), args.crc, &frame, format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
