use serde::Serialize;

/// Bit-packed 32-bit skill identifier.
///
/// From the low bit up: 26 id bits, 4 kind bits, the NPC flag, and one
/// reserved bit. NPC skills of kind 1 subdivide the id bits into a 16-bit
/// skill id and a 10-bit hunting-zone id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillId32 {
    pub id: u32,
    pub hunting_zone: u16,
    pub kind: u8,
    pub is_npc: bool,
    pub reserved: bool,
}

impl SkillId32 {
    /// Unpack a raw little-endian skill id word.
    pub fn from_wire(value: u32) -> Self {
        let kind = ((value >> 26) & 0xF) as u8;
        let is_npc = value & 0x4000_0000 != 0;
        let has_hunting_zone = is_npc && kind == 1;
        let (id, hunting_zone) = if has_hunting_zone {
            (value & 0xFFFF, ((value >> 16) & 0x3FF) as u16)
        } else {
            (value & 0x03FF_FFFF, 0)
        };
        Self {
            id,
            hunting_zone,
            kind,
            is_npc,
            reserved: value >> 31 != 0,
        }
    }

    /// Whether the id bits carry a separate hunting-zone component.
    pub fn has_hunting_zone(&self) -> bool {
        self.is_npc && self.kind == 1
    }
}
