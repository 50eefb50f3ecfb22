//! Error types raised by the file-backed storage implementation.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias returning [`FileDaoError`] failures.
pub type FileResult<T> = Result<T, FileDaoError>;

/// Failures that can occur while reading or writing game documents on disk.
#[derive(Debug, Error)]
pub enum FileDaoError {
    /// A data directory could not be created.
    #[error("failed to create data directory `{}`", .path.display())]
    CreateDir {
        /// Path involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// A document or directory could not be read.
    #[error("failed to read `{}`", .path.display())]
    Read {
        /// Path involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// A document could not be written or moved into place.
    #[error("failed to write `{}`", .path.display())]
    Write {
        /// Path involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// A document could not be removed.
    #[error("failed to remove `{}`", .path.display())]
    Remove {
        /// Path involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// A game could not be encoded.
    #[error("failed to encode game `{id}`")]
    Encode {
        /// Game id.
        id: uuid::Uuid,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored document is not a valid game.
    #[error("failed to decode `{path}`")]
    Decode {
        /// Path involved.
        path: String,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}
