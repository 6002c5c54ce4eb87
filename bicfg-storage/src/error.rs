//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from exporting or importing a configuration.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export corrupted: {0}")]
    Corruption(String),

    #[error("core error: {0}")]
    Core(#[from] bicfg_core::CoreError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
