use bakelite_schema::{MessageTable, ProtocolOptions, SchemaDescriptor};
use serde::Serialize;

use crate::cmd::InspectArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct MessageRow<'a> {
    id: u8,
    name: &'a str,
    fields: usize,
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    descriptor: String,
    crc: &'a str,
    framing: String,
    max_length: Option<usize>,
    structs: usize,
    enums: usize,
    messages: Vec<MessageRow<'a>>,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = SchemaDescriptor::from_file(&args.descriptor)
        .map_err(|err| schema_error("invalid descriptor", err))?;
    let options = ProtocolOptions::from_descriptor(&schema.protocol)
        .map_err(|err| schema_error("invalid descriptor", err))?;
    let table = MessageTable::from_descriptor(&schema)
        .map_err(|err| schema_error("invalid descriptor", err))?;

    let messages: Vec<MessageRow<'_>> = table
        .iter()
        .map(|(id, name)| MessageRow {
            id,
            name,
            fields: schema.struct_named(name).map_or(0, |s| s.members.len()),
        })
        .collect();

    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            print_json(&InspectOutput {
                descriptor: args.descriptor.display().to_string(),
                crc: options.crc.as_str(),
                framing: options.framing.to_string(),
                max_length: options.max_length,
                structs: schema.structs.len(),
                enums: schema.enums.len(),
                messages,
            });
        }
        OutputFormat::Table => {
            println!(
                "crc={} framing={} max_length={}",
                options.crc,
                options.framing,
                max_length_label(options.max_length)
            );
            let mut out = new_table(vec!["ID", "MESSAGE", "FIELDS"]);
            for row in &messages {
                out.add_row(vec![
                    row.id.to_string(),
                    row.name.to_string(),
                    row.fields.to_string(),
                ]);
            }
            println!("{out}");
        }
        OutputFormat::Pretty => {
            println!("descriptor: {}", args.descriptor.display());
            println!("crc: {}", options.crc);
            println!("framing: {}", options.framing);
            println!("max_length: {}", max_length_label(options.max_length));
            println!("structs: {}", schema.structs.len());
            println!("enums: {}", schema.enums.len());
            for row in &messages {
                println!("  {:>3}  {} ({} fields)", row.id, row.name, row.fields);
            }
        }
    }

    Ok(SUCCESS)
}

fn max_length_label(max: Option<usize>) -> String {
    max.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
}
