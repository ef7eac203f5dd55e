/// Errors that can occur while loading protocol data.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The protocol data file could not be read.
    #[error("failed to load protocol data: {0}")]
    LoadFailed(String),

    /// The protocol data file is not valid JSON.
    #[error("protocol data is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No opcode map exists for the requested protocol revision.
    #[error("no opcode map for revision {0}")]
    UnknownRevision(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
