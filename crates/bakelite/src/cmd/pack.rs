use bakelite_codec::json::struct_from_json;
use bakelite_codec::pack_struct;
use bakelite_protocol::Protocol;
use bakelite_schema::{ProtocolOptions, SchemaDescriptor};
use bakelite_transport::MemoryEndpoint;

use crate::cmd::PackArgs;
use crate::exit::{
    protocol_error, schema_error, serialization_error, CliError, CliResult, SUCCESS, USAGE,
};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: PackArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = SchemaDescriptor::from_file(&args.descriptor)
        .map_err(|err| schema_error("invalid descriptor", err))?;
    let options = ProtocolOptions::from_descriptor(&schema.protocol)
        .map_err(|err| schema_error("invalid descriptor", err))?;
    let proto = Protocol::from_schema(MemoryEndpoint::loopback(), &schema)
        .map_err(|err| protocol_error("invalid descriptor", err))?;

    let json: serde_json::Value = serde_json::from_str(&args.json)
        .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
    let desc = proto.registry().get_struct(&args.message).ok_or_else(|| {
        CliError::new(USAGE, format!("{} is not a struct in the descriptor", args.message))
    })?;
    let value = struct_from_json(&json, desc, proto.registry())
        .map_err(|err| serialization_error("invalid message", err))?;

    let mut body = Vec::new();
    pack_struct(&value, desc, proto.registry(), &mut body)
        .map_err(|err| serialization_error("pack failed", err))?;
    let frame = proto
        .encode_value(&args.message, &value)
        .map_err(|err| protocol_error("pack failed", err))?;

    print_encoded(Some(&args.message), body.len() + 1, options.crc, &frame, format);
    Ok(SUCCESS)
}
