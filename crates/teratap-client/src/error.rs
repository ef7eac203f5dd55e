use teratap_frame::FrameError;
use teratap_transport::TransportError;

/// Errors that end a single tap session.
///
/// The reconnect loop in `TapClient::run` swallows these and retries after a
/// pause; they only escape through `TapClient::run_once`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The relay could not be reached.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The stream failed mid-session.
    #[error("stream: {0}")]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
