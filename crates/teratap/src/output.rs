use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use teratap_decode::{DecodedMessage, Record};
use teratap_frame::Direction;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    /// Pretty for humans at a terminal, JSON lines for pipes.
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    direction: &'a str,
    name: &'a str,
    opcode: String,
    payload_size: usize,
    fields: &'a Record,
    timestamp: String,
}

pub fn print_message(message: &DecodedMessage, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                direction: direction_label(message.direction),
                name: &message.name,
                opcode: format!("{:#06x}", message.opcode),
                payload_size: message.raw.len(),
                fields: &message.fields,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DIR", "NAME", "OPCODE", "SIZE", "FIELDS"])
                .add_row(vec![
                    direction_label(message.direction).to_string(),
                    message.name.clone(),
                    format!("{:#06x}", message.opcode),
                    message.raw.len().to_string(),
                    fields_json(&message.fields),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}: {} [{:#06x}] {}",
                direction_label(message.direction),
                message.name,
                message.opcode,
                fields_json(&message.fields)
            );
        }
        OutputFormat::Raw => {
            println!("{}", hex_string(message.raw.as_ref()));
        }
    }
}

pub fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::ClientServer => "C->S",
        Direction::ServerClient => "S->C",
    }
}

pub fn hex_string(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn fields_json(fields: &Record) -> String {
    serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
