//! Schema-driven decoding of game message payloads.
//!
//! Messages are flat scalar runs with two indirections layered on top:
//! scattered arrays chained through per-element link headers, and string
//! fields whose bytes live wherever a pointer field said they would.
//! The decoder walks a payload against its compiled schema and produces
//! ordered name/value records.
//!
//! Decoding is deliberately infallible. Defs are community-maintained and
//! drift out of sync with the live protocol, so a mismatch is an expected
//! condition: the walk keeps whatever it could decode and reports the rest
//! through tracing.

pub mod message;
pub mod primitives;
pub mod skill;
pub mod value;

pub use message::{
    decode_message, DecodeConfig, DecodedMessage, DecodedPayload, DEFAULT_MAX_ARRAY_LEN,
};
pub use primitives::{decode_value, MAX_BLOB_LEN};
pub use skill::SkillId32;
pub use value::{Record, Value};
