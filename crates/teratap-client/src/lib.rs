//! Reconnecting tap client over the relay stream.
//!
//! [`TapClient`] owns the whole receive path: it connects to the relay,
//! splits the stream into frames, resolves opcodes against a revision's
//! table, decodes messages that have definitions and hands them to
//! subscribers. Sessions that die are retried after a pause until the
//! [`CancelToken`] fires; cancellation force-closes the socket so a
//! blocked read does not delay shutdown.

pub mod cancel;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod stats;

pub use cancel::CancelToken;
pub use client::{
    ClientConfig, TapClient, DEFAULT_RECONNECT_DELAY, DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT,
};
pub use dispatch::{Dispatcher, Handler};
pub use error::{ClientError, Result};
pub use stats::{StatsSnapshot, TapStats};
