use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: String, expected: String },

    #[error("Unknown save slot: {0}")]
    UnknownSlot(String),

    #[error("Save slot index is corrupted: {0}")]
    CorruptedIndex(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl SaveError {
    /// Whether the session can carry on with the initial state.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SaveError::VersionMismatch { .. } => true,
            SaveError::UnknownSlot(_) => true,
            SaveError::CorruptedIndex(_) => true,
            SaveError::Json(_) => true,
            SaveError::InvalidKey(_) => true,
            SaveError::Io(_) => false,
            SaveError::Timestamp(_) => false,
        }
    }
}
