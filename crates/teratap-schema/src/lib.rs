//! Message schemas and opcode tables for the teratap decoder.
//!
//! The game ships its wire layouts as versioned `.def` texts bundled in a
//! JSON protocol file together with per-revision opcode maps. This crate
//! loads that bundle, picks the highest version of each def, and compiles
//! the line-oriented def grammar into ordered field layouts the decoder
//! can walk.
//!
//! Compilation never fails: defs are community-maintained and partially
//! wrong ones are still worth decoding with.

pub mod compile;
pub mod def;
pub mod error;
pub mod opcode;
pub mod source;

pub use compile::SchemaCatalog;
pub use def::{FieldDef, MessageSchema, TypeTag};
pub use error::{Result, SchemaError};
pub use opcode::OpcodeTable;
pub use source::ProtocolData;
