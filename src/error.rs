//! Error types shared by the content store, query layer and media store

use thiserror::Error;

/// Errors surfaced by the core stores
///
/// Every operation either fully succeeds or fails with one of these and
/// leaves no partial state behind.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    #[error("Unsupported snapshot version {found} in {path} (expected {expected})")]
    SnapshotVersion {
        path: String,
        found: u32,
        expected: u32,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Whether this error was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::Authorization(_)
                | Self::SizeLimitExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
