use std::path::PathBuf;

use clap::{Args, Subcommand};

use teratap_schema::ProtocolData;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod run;
pub mod schema;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tap the relay and print decoded messages.
    Run(RunArgs),
    /// Inspect a protocol bundle: revisions, opcodes, field layouts.
    Schema(SchemaArgs),
    /// Decode one hex-encoded frame offline.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Schema(args) => schema::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Protocol bundle with opcode maps and message definitions.
    #[arg(long, value_name = "FILE", default_value = "data.json")]
    pub data: PathBuf,
    /// Protocol revision to resolve opcodes with.
    #[arg(long, value_name = "REV")]
    pub revision: Option<String>,
    /// Relay host.
    #[arg(long, default_value = teratap_client::DEFAULT_RELAY_HOST)]
    pub host: String,
    /// Relay port.
    #[arg(long, default_value_t = teratap_client::DEFAULT_RELAY_PORT)]
    pub port: u16,
    /// Print only these message names (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub messages: Option<Vec<String>>,
    /// Drop these message names before decoding (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub blacklist: Vec<String>,
    /// Exit after printing N messages.
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,
    /// Exit when the first session ends instead of reconnecting.
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Protocol bundle with opcode maps and message definitions.
    #[arg(long, value_name = "FILE", default_value = "data.json")]
    pub data: PathBuf,
    /// Revision whose opcode table to show.
    #[arg(long, value_name = "REV")]
    pub revision: Option<String>,
    /// Show the compiled field layout of one message.
    #[arg(long, value_name = "NAME")]
    pub message: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Protocol bundle with opcode maps and message definitions.
    #[arg(long, value_name = "FILE", default_value = "data.json")]
    pub data: PathBuf,
    /// Protocol revision to resolve opcodes with.
    #[arg(long, value_name = "REV")]
    pub revision: Option<String>,
    /// Hex-encoded frame bytes, transport header included.
    #[arg(value_name = "HEX")]
    pub frame: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Pick the revision to work with: an explicit request wins, otherwise a
/// bundle with exactly one revision needs no flag.
pub fn resolve_revision(data: &ProtocolData, requested: Option<&str>) -> CliResult<String> {
    if let Some(revision) = requested {
        return Ok(revision.to_string());
    }
    let revisions = data.revisions();
    match revisions.as_slice() {
        [only] => Ok((*only).to_string()),
        [] => Err(CliError::new(USAGE, "protocol bundle has no opcode maps")),
        many => Err(CliError::new(
            USAGE,
            format!("--revision required, bundle has: {}", many.join(", ")),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn bundle(revisions: &[&str]) -> ProtocolData {
        let maps = revisions
            .iter()
            .map(|rev| (rev.to_string(), HashMap::new()))
            .collect();
        ProtocolData {
            maps,
            protocol: HashMap::new(),
        }
    }

    #[test]
    fn explicit_revision_wins() {
        let data = bundle(&["286406", "299999"]);
        let revision = resolve_revision(&data, Some("299999")).unwrap();
        assert_eq!(revision, "299999");
    }

    #[test]
    fn sole_revision_needs_no_flag() {
        let data = bundle(&["286406"]);
        let revision = resolve_revision(&data, None).unwrap();
        assert_eq!(revision, "286406");
    }

    #[test]
    fn ambiguous_bundle_requires_the_flag() {
        let data = bundle(&["286406", "299999"]);
        let err = resolve_revision(&data, None).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("286406"));
    }

    #[test]
    fn empty_bundle_is_a_usage_error() {
        let data = bundle(&[]);
        let err = resolve_revision(&data, None).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
