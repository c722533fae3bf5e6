//! Error types for the studio core
//!
//! Only lookup, I/O and configuration failures are errors here. Failures of
//! user code inside the preview sandbox are values (see
//! [`crate::preview::PreviewResult`]) and never travel through this type.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::FileId;

/// Result type alias using the studio error
pub type Result<T> = std::result::Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    /// A file id that was never issued in this session (caller bug)
    #[error("source file {id} not found")]
    NotFound { id: FileId },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl StudioError {
    pub fn not_found(id: FileId) -> Self {
        StudioError::NotFound { id }
    }

    /// True for lookup failures
    pub fn is_not_found(&self) -> bool {
        matches!(self, StudioError::NotFound { .. })
    }
}
