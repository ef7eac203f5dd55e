//! Passive tap and schema-driven decoder for the TERA relay stream.
//!
//! teratap connects to the relay socket a proxy exposes, splits the byte
//! stream into direction-tagged frames, and decodes message payloads
//! against the community-maintained definition bundle for one protocol
//! revision.
//!
//! # Crate structure
//!
//! - [`transport`] — TCP connection to the relay
//! - [`frame`] — Length-prefixed frame splitting with resynchronization
//! - [`schema`] — Protocol bundle loading and def compilation
//! - [`decode`] — Schema-driven payload decoding
//! - [`client`] — Reconnecting tap client with subscriptions

/// Re-export transport types.
pub mod transport {
    pub use teratap_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use teratap_frame::*;
}

/// Re-export schema types.
pub mod schema {
    pub use teratap_schema::*;
}

/// Re-export decoder types.
pub mod decode {
    pub use teratap_decode::*;
}

/// Re-export client types.
pub mod client {
    pub use teratap_client::*;
}
