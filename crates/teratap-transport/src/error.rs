/// Errors that can occur on the relay transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the relay address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The relay address did not resolve to any socket address.
    #[error("address resolved to nothing: {0}")]
    NoAddress(String),

    /// An I/O error occurred on the connected stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
