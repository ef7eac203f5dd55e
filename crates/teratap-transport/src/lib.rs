//! Byte-stream transport for the teratap pipeline.
//!
//! The tap is a pure client: it connects to a local relay socket that
//! mirrors client↔server traffic and only ever reads. This crate provides
//! the one primitive everything else builds on — an ordered byte stream in,
//! plus the ability to force-close it from another thread.

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::RelayStream;
