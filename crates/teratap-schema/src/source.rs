use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use serde::Deserialize;
use tracing::warn;

use crate::compile::SchemaCatalog;
use crate::error::{Result, SchemaError};
use crate::opcode::OpcodeTable;

/// On-disk protocol bundle: per-revision opcode maps plus base64 def texts.
///
/// ```json
/// {
///   "maps": { "286406": { "S_CHAT": 16170, ... } },
///   "protocol": { "S_CHAT.2.def": "<base64>", ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolData {
    /// Opcode maps keyed by protocol revision.
    pub maps: HashMap<String, HashMap<String, u16>>,
    /// Base64-encoded message layouts keyed by versioned def name.
    pub protocol: HashMap<String, String>,
}

impl ProtocolData {
    /// Load and parse a protocol data file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        let data = serde_json::from_str(&text)?;
        Ok(data)
    }

    /// Known protocol revisions, sorted.
    pub fn revisions(&self) -> Vec<&str> {
        let mut revisions: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        revisions.sort_unstable();
        revisions
    }

    /// Build the opcode table for one revision.
    pub fn opcode_table(&self, revision: &str) -> Result<OpcodeTable> {
        let map = self
            .maps
            .get(revision)
            .ok_or_else(|| SchemaError::UnknownRevision(revision.to_string()))?;
        Ok(OpcodeTable::from_names(
            revision,
            map.iter().map(|(name, opcode)| (name.clone(), *opcode)),
        ))
    }

    /// Decode the base64 def texts. Entries that do not decode are dropped
    /// with a warning; one bad def must not take the whole bundle down.
    pub fn decoded_defs(&self) -> Vec<(String, String)> {
        let mut defs = Vec::with_capacity(self.protocol.len());
        for (key, encoded) in &self.protocol {
            match base64::engine::general_purpose::STANDARD.decode(encoded.trim()) {
                Ok(bytes) => {
                    defs.push((key.clone(), String::from_utf8_lossy(&bytes).into_owned()));
                }
                Err(err) => {
                    warn!(key = %key, %err, "skipping def entry that is not valid base64");
                }
            }
        }
        defs
    }

    /// Compile every decodable def into a schema catalog.
    pub fn catalog(&self) -> SchemaCatalog {
        SchemaCatalog::compile(self.decoded_defs())
    }
}
