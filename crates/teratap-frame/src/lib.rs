//! Frame splitting for the game's length-prefixed wire protocol.
//!
//! Every message on the relay stream is framed with:
//! - A 2-byte little-endian transport length covering everything after itself
//! - A 1-byte direction tag (1 = client→server, otherwise server→client)
//! - A 2-byte little-endian inner length covering itself, the opcode and the body
//! - A 2-byte little-endian opcode
//!
//! There is no magic number to resynchronize on, so corrupt length fields are
//! handled by dropping the suspect span and trying again at the next byte.
//! Callers of [`FrameReader`] only ever see whole, well-formed frames.

pub mod codec;
pub mod error;
pub mod reader;

pub use codec::{
    take_frame, Direction, Frame, HEADER_SIZE, LENGTH_FIELD_SIZE, MIN_INNER_LEN, MIN_TOTAL_LEN,
};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, ReaderConfig, StreamStats, DEFAULT_MAX_BUFFER};
