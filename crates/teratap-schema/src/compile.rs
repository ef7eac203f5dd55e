use std::collections::HashMap;

use tracing::debug;

use crate::def::{FieldDef, MessageSchema, TypeTag};

/// Compiled message schemas, keyed by message name.
///
/// Compilation is always best-effort: malformed lines are dropped, unknown
/// type tags are kept verbatim, and nothing here ever returns an error. A
/// def text only a field of which is usable still yields a usable schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: HashMap<String, MessageSchema>,
}

impl SchemaCatalog {
    /// Compile a set of versioned def texts into a catalog.
    ///
    /// Def keys carry an optional version suffix (`S_CHAT.2.def`); when a
    /// message appears under several versions only the highest one is kept.
    /// Keys are visited in sorted order so ties resolve the same way on
    /// every run.
    pub fn compile<I>(defs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries: Vec<(String, String)> = defs.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut latest: HashMap<String, (u32, String)> = HashMap::new();
        for (key, text) in entries {
            let (base, version) = split_versioned_key(&key);
            match latest.get(base) {
                Some((have, _)) if *have > version => {}
                _ => {
                    latest.insert(base.to_string(), (version, text));
                }
            }
        }

        let mut schemas = HashMap::new();
        for (name, (version, text)) in latest {
            let schema = parse_def_text(&text);
            debug!(
                message = %name,
                version,
                fields = schema.fields.len(),
                "compiled schema"
            );
            schemas.insert(name, schema);
        }

        Self { schemas }
    }

    /// Look up the schema for a message name.
    pub fn get(&self, name: &str) -> Option<&MessageSchema> {
        self.schemas.get(name)
    }

    /// Whether a schema exists for a message name.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Message names with a compiled schema, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of compiled schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Split `NAME.<version>.def` into its base name and version.
///
/// Keys without that suffix shape are version 0 under their full name,
/// `.def` included.
fn split_versioned_key(key: &str) -> (&str, u32) {
    if let Some(stem) = key.strip_suffix(".def") {
        if let Some((base, digits)) = stem.rsplit_once('.') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(version) = digits.parse::<u32>() {
                    return (base, version);
                }
            }
        }
    }
    (key, 0)
}

/// Parse one def text into an ordered field layout.
///
/// Grammar, line by line:
/// - `#`-prefixed lines and blank lines are dropped
/// - `<type> <name>` declares a scalar field
/// - `array <name>` declares an array; the `- <type> <name>` lines that
///   follow it describe one element
/// - `offset <name>` declares the forward pointer for a later `<name>` field,
///   stored as `offset_<name>`
/// - anything with fewer than two tokens, or a bare `-` type, is skipped
///
/// Arrays get a synthetic `<name>_ref` field spliced in directly before
/// them: the wire carries the array's link header at that position even
/// though def texts never spell it out.
fn parse_def_text(text: &str) -> MessageSchema {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.is_empty() && !line.trim_start().starts_with('#'))
        .map(str::trim)
        .collect();

    let mut fields = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            i += 1;
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            i += 1;
            continue;
        }

        let tag = parts[0];
        let name = parts[1];

        if tag == "-" {
            // Element line outside any array; nothing to attach it to.
            i += 1;
            continue;
        }

        if tag == "array" {
            let mut elements = Vec::new();
            i += 1;
            while i < lines.len() && lines[i].starts_with('-') {
                let sub: Vec<&str> = lines[i].split_whitespace().collect();
                if sub.len() >= 3 {
                    elements.push(FieldDef::scalar(sub[2], TypeTag::parse(sub[1])));
                }
                i += 1;
            }
            fields.push(FieldDef::scalar(format!("{name}_ref"), TypeTag::Ref));
            fields.push(FieldDef {
                name: name.to_string(),
                tag: TypeTag::Array,
                elements,
            });
            continue;
        }

        if tag == "offset" {
            fields.push(FieldDef::scalar(
                format!("offset_{name}"),
                TypeTag::OffsetRef,
            ));
        } else {
            fields.push(FieldDef::scalar(name, TypeTag::parse(tag)));
        }
        i += 1;
    }

    MessageSchema { fields }
}
