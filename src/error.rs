//! Error handling module for pwqctl
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the crate should use these types for consistency.
//!
//! Two failure classes exist on purpose. Everything else that can go wrong is
//! deliberately not an error: a failed backup copy degrades to a warning on
//! the outcome, and unparseable lines in the target file are carried through
//! verbatim instead of aborting the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pwqctl
#[derive(Error, Debug)]
pub enum PwqError {
    /// Validation errors (unknown parameter names, uncoercible values,
    /// contradictory requests). Raised before the target file is touched.
    #[error("validation error: {0}")]
    Validation(String),

    /// IO errors (reading, backing up, or replacing the target file),
    /// tagged with the path that failed
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for pwqctl operations
pub type Result<T> = std::result::Result<T, PwqError>;

// Convenient error constructors
impl PwqError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an IO error tagged with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Category label used by the module protocol's failure document
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Io { .. } => "io",
        }
    }
}
