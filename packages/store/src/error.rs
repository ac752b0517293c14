use thiserror::Error;

/// Errors surfaced by a [`crate::Database`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The client cannot reach the database (offline, connection dropped).
    #[error("database is unavailable: client is offline")]
    Unavailable,
    /// Security rules reject the read or write.
    #[error("permission denied at {0}")]
    PermissionDenied(String),
    /// The path is empty where a key is required, or contains a forbidden character.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
    /// The value stored at `path` does not have the expected shape.
    #[error("malformed data at {path}: {reason}")]
    Malformed { path: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
