use bakelite_protocol::Protocol;
use bakelite_schema::SchemaDescriptor;
use bakelite_transport::MemoryEndpoint;

use crate::cmd::UnpackArgs;
use crate::exit::{protocol_error, schema_error, CliResult, DATA_INVALID, SUCCESS};
use crate::input::read_source;
use crate::output::{print_message, OutputFormat};

pub fn run(args: UnpackArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = SchemaDescriptor::from_file(&args.descriptor)
        .map_err(|err| schema_error("invalid descriptor", err))?;
    let endpoint = MemoryEndpoint::loopback();
    let mut proto = Protocol::from_schema(endpoint.clone(), &schema)
        .map_err(|err| protocol_error("invalid descriptor", err))?;

    endpoint.inject(&read_source(args.file.as_deref(), args.hex)?);

    let mut decoded = 0usize;
    let mut rejected = 0usize;
    loop {
        let before = proto.framer_mut().buffered_len();
        match proto.poll() {
            Ok(Some(incoming)) => {
                print_message(decoded, &incoming, format);
                decoded += 1;
            }
            Ok(None) => {
                // Skipped empty frames consume input; a stalled buffer means no more frames.
                let left = proto.framer_mut().buffered_len();
                if left == 0 || left == before {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "dropping frame");
                rejected += 1;
            }
        }
    }

    tracing::debug!(decoded, rejected, "unpack finished");
    Ok(if rejected > 0 { DATA_INVALID } else { SUCCESS })
}
