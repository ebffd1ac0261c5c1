use std::io::{IsTerminal, Write};

use bakelite_codec::json::to_json;
use bakelite_frame::CrcSize;
use bakelite_protocol::Incoming;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    crc: &'a str,
    payload_size: usize,
    frame_size: usize,
    frame: String,
}

/// Print a freshly encoded frame. `message` is set when it came from `pack`.
pub fn print_encoded(
    message: Option<&str>,
    payload_size: usize,
    crc: CrcSize,
    frame: &[u8],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                message,
                crc: crc.as_str(),
                payload_size,
                frame_size: frame.len(),
                frame: hex::encode(frame),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["MESSAGE", "CRC", "PAYLOAD", "FRAME", "BYTES"]);
            table.add_row(vec![
                message.unwrap_or("-").to_string(),
                crc.to_string(),
                payload_size.to_string(),
                frame.len().to_string(),
                spaced_hex(frame),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", spaced_hex(frame)),
        OutputFormat::Raw => print_raw(frame),
    }
}

#[derive(Serialize)]
struct PayloadOutput {
    index: usize,
    size: usize,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// Print one decoded frame payload.
pub fn print_payload(index: usize, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput {
                index,
                size: payload.len(),
                payload: hex::encode(payload),
                text: text_preview(payload),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "SIZE", "PAYLOAD"]);
            table.add_row(vec![
                index.to_string(),
                payload.len().to_string(),
                spaced_hex(payload),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{index} size={} payload={}",
                payload.len(),
                text_preview(payload).unwrap_or_else(|| spaced_hex(payload))
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    index: usize,
    id: u8,
    name: &'a str,
    value: serde_json::Value,
}

/// Print one dispatched message.
pub fn print_message(index: usize, incoming: &Incoming, format: OutputFormat) {
    let value = to_json(&incoming.value);
    match format {
        OutputFormat::Json => {
            print_json(&MessageOutput {
                index,
                id: incoming.id,
                name: &incoming.name,
                value,
            });
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "ID", "MESSAGE", "VALUE"]);
            table.add_row(vec![
                index.to_string(),
                incoming.id.to_string(),
                incoming.name.clone(),
                value.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let body = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            println!("#{index} {} (id {}):\n{body}", incoming.name, incoming.id);
        }
        OutputFormat::Raw => println!("{value}"),
    }
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn spaced_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_preview(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?;
    if text.chars().all(|c| !c.is_control() || c == '\n' || c == '\t') {
        Some(text.to_string())
    } else {
        None
    }
}
