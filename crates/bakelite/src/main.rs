mod cmd;
mod exit;
mod input;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "bakelite", version, about = "bakelite protocol diagnostics")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "BAKELITE_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from(["bakelite", "encode", "--crc", "crc16", "--data", "hello"])
            .expect("encode args should parse");
        assert!(matches!(cli.command, Command::Encode(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from(["bakelite", "encode", "--hex", "00ff", "--data", "hello"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_pack_subcommand() {
        let cli = Cli::try_parse_from([
            "bakelite",
            "--format",
            "raw",
            "pack",
            "proto.json",
            "Ack",
            "--json",
            "{\"code\":1}",
        ])
        .expect("pack args should parse");
        assert!(matches!(cli.command, Command::Pack(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Raw)));
    }

    #[test]
    fn rejects_unknown_crc() {
        let err = Cli::try_parse_from(["bakelite", "decode", "--crc", "crc64"])
            .expect_err("unknown crc should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
