//! Error types for classplit runs.
//!
//! Only conditions that abort a whole run live here. A class whose boundary
//! cannot be found is not an error: see [`crate::locate::LocateError`].

use std::path::PathBuf;

/// Fatal errors: the run stops and the source file is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Anchor line containing '{marker}' not found")]
    AnchorNotFound { marker: String },
}

impl SplitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SplitError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
