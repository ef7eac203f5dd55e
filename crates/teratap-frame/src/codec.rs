use std::fmt;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Bytes occupied by the leading transport length field.
pub const LENGTH_FIELD_SIZE: usize = 2;

/// Transport length (2) + direction (1) + inner length (2) + opcode (2).
pub const HEADER_SIZE: usize = 7;

/// Smallest transport length that can carry a direction byte and an inner header.
pub const MIN_TOTAL_LEN: usize = 5;

/// Smallest inner length: the inner length field itself plus the opcode.
pub const MIN_INNER_LEN: usize = 4;

/// Which side of the game connection sent a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client → server.
    ClientServer,
    /// Server → client.
    ServerClient,
}

impl Direction {
    /// Map the wire tag to a direction.
    ///
    /// The relay writes `1` for client→server and `2` for server→client;
    /// any other value is treated as server→client.
    pub fn from_wire(tag: u8) -> Self {
        if tag == 1 {
            Self::ClientServer
        } else {
            Self::ServerClient
        }
    }

    /// Single-letter label used in logs and dumps.
    pub fn label(self) -> &'static str {
        match self {
            Self::ClientServer => "C",
            Self::ServerClient => "S",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single de-framed message off the relay stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Which side of the game connection sent this message.
    pub direction: Direction,
    /// Revision-specific message identifier.
    pub opcode: u16,
    /// The message body, laid out per the message's schema.
    pub payload: Bytes,
}

impl Frame {
    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Split one frame off the front of a buffer.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────┬────────────┬───────────┬─────────────────────┐
/// │ TotalLen   │ Direction │ InnerLen   │ Opcode    │ Payload             │
/// │ (2B LE)    │ (1B)      │ (2B LE)    │ (2B LE)   │ (InnerLen − 4 B)    │
/// └────────────┴───────────┴────────────┴───────────┴─────────────────────┘
/// ```
///
/// `TotalLen` counts everything after itself; `InnerLen` counts itself, the
/// opcode and the payload, so a well-formed frame has `TotalLen == InnerLen + 1`.
///
/// Returns `Ok(None)` while the advertised span is not fully buffered — no
/// verdict is passed on a frame until all of it has arrived. On corrupt length
/// fields the offending bytes are consumed and an error describes what was
/// skipped, so the caller can keep pulling frames from the same buffer.
pub fn take_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < LENGTH_FIELD_SIZE {
        return Ok(None); // Need more data
    }

    let total_len = u16::from_le_bytes([src[0], src[1]]) as usize;

    if src.len() < LENGTH_FIELD_SIZE + total_len {
        return Ok(None); // Need more data
    }

    if total_len < MIN_TOTAL_LEN {
        // Too short to carry a header. Drop the length field and let the
        // next call pick up from whatever follows.
        src.advance(LENGTH_FIELD_SIZE);
        return Err(FrameError::BadTransportLength {
            total_len: total_len as u16,
        });
    }

    let direction = Direction::from_wire(src[2]);
    let inner_len = u16::from_le_bytes([src[3], src[4]]) as usize;
    let opcode = u16::from_le_bytes([src[5], src[6]]);

    if inner_len < MIN_INNER_LEN || inner_len + 1 != total_len {
        // The two length fields disagree; nothing inside the advertised
        // span can be trusted, so drop all of it.
        src.advance(LENGTH_FIELD_SIZE + total_len);
        return Err(FrameError::LengthMismatch {
            total_len: total_len as u16,
            inner_len: inner_len as u16,
        });
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(inner_len - MIN_INNER_LEN).freeze();

    Ok(Some(Frame {
        direction,
        opcode,
        payload,
    }))
}
