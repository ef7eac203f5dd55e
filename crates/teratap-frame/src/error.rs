/// Errors that can occur while splitting the relay stream into frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The transport length cannot hold a direction byte and an inner header.
    #[error("transport length {total_len} too short for a frame header")]
    BadTransportLength { total_len: u16 },

    /// The transport and inner length fields disagree.
    #[error("frame length fields disagree (transport {total_len}, inner {inner_len})")]
    LengthMismatch { total_len: u16, inner_len: u16 },

    /// An I/O error occurred while reading the stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The relay closed the connection.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
