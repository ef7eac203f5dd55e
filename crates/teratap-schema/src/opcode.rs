use std::collections::HashMap;

/// Bidirectional opcode ↔ message-name mapping for one protocol revision.
///
/// Opcodes are reassigned on every game patch, so a table is only meaningful
/// together with the revision it was built for.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    revision: String,
    by_id: HashMap<u16, String>,
    by_name: HashMap<String, u16>,
}

impl OpcodeTable {
    /// Build a table from `(name, opcode)` pairs.
    ///
    /// Input order does not matter. If two names claim the same opcode, the
    /// name that sorts first wins the id lookup.
    pub fn from_names<I>(revision: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = (String, u16)>,
    {
        let mut pairs: Vec<(String, u16)> = names.into_iter().collect();
        pairs.sort_unstable();

        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (name, opcode) in pairs {
            by_id.entry(opcode).or_insert_with(|| name.clone());
            by_name.insert(name, opcode);
        }
        Self {
            revision: revision.into(),
            by_id,
            by_name,
        }
    }

    /// The protocol revision this table belongs to.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Message name for an opcode, if the revision maps it.
    pub fn name_of(&self, opcode: u16) -> Option<&str> {
        self.by_id.get(&opcode).map(String::as_str)
    }

    /// Opcode for a message name, if the revision maps it.
    pub fn id_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Mapped message names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of mapped opcodes.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OpcodeTable {
        OpcodeTable::from_names(
            "286406",
            [
                ("S_CHAT".to_string(), 0x3F2A),
                ("C_PLAYER_LOCATION".to_string(), 0x1101),
                ("S_SPAWN_NPC".to_string(), 0x2202),
            ],
        )
    }

    #[test]
    fn lookups_both_directions() {
        let table = sample();

        assert_eq!(table.name_of(0x3F2A), Some("S_CHAT"));
        assert_eq!(table.id_of("S_CHAT"), Some(0x3F2A));
        assert_eq!(table.name_of(0x9999), None);
        assert_eq!(table.id_of("S_UNKNOWN"), None);
    }

    #[test]
    fn duplicate_ids_keep_the_first_sorted_name() {
        let table = OpcodeTable::from_names(
            "286406",
            [
                ("S_ZULU".to_string(), 0x0100),
                ("S_ALPHA".to_string(), 0x0100),
            ],
        );

        assert_eq!(table.name_of(0x0100), Some("S_ALPHA"));
        assert_eq!(table.id_of("S_ZULU"), Some(0x0100));
        assert_eq!(table.id_of("S_ALPHA"), Some(0x0100));
    }

    #[test]
    fn revision_and_names() {
        let table = sample();

        assert_eq!(table.revision(), "286406");
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert_eq!(
            table.names(),
            ["C_PLAYER_LOCATION", "S_CHAT", "S_SPAWN_NPC"]
        );
    }
}
