use clap::{Args, Subcommand};
use std::path::PathBuf;

use bakelite_frame::CrcSize;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod inspect;
pub mod pack;
pub mod unpack;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Frame a raw payload.
    Encode(EncodeArgs),
    /// Unframe a byte stream and print each payload.
    Decode(DecodeArgs),
    /// Validate a descriptor and print its message table.
    Inspect(InspectArgs),
    /// Decode a framed stream into messages using a descriptor.
    Unpack(UnpackArgs),
    /// Build the frame for one message from JSON.
    Pack(PackArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Unpack(args) => unpack::run(args, format),
        Command::Pack(args) => pack::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Checksum appended to the payload (none, crc8, crc16, crc32).
    #[arg(long, default_value = "crc8")]
    pub crc: CrcSize,
    /// Reject payloads larger than this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
    /// Payload as a UTF-8 string.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Payload as hex.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read the payload from a file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Checksum expected on every frame (none, crc8, crc16, crc32).
    #[arg(long, default_value = "crc8")]
    pub crc: CrcSize,
    /// Drop frames whose payload would exceed this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
    /// Read framed bytes from a file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Input is hex text rather than raw bytes.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Descriptor JSON produced by the schema compiler.
    pub descriptor: PathBuf,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Descriptor JSON produced by the schema compiler.
    pub descriptor: PathBuf,
    /// Read framed bytes from a file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Input is hex text rather than raw bytes.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Descriptor JSON produced by the schema compiler.
    pub descriptor: PathBuf,
    /// Message (struct) name.
    pub message: String,
    /// Message fields as a JSON object.
    #[arg(long)]
    pub json: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
