//! Session-level failures that callers are expected to handle.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The cache directory is missing, unreadable, or was never resolved.
    /// Every decode entry point raises this; an *empty but existing*
    /// directory is not an error (it decodes to empty collections).
    #[error("cache database not found at {path}")]
    DatabaseNotFound { path: PathBuf },
}
