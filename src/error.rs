//! Error types for Stratus

use std::io;
use thiserror::Error;

/// Result type alias for Stratus operations
pub type Result<T> = std::result::Result<T, StratusError>;

/// Main error type for Stratus
///
/// Completion emission has a single failure class: an unrecoverable write
/// error on the output stream. It is never retried; `main` reports it and
/// the process exits non-zero.
#[derive(Error, Debug)]
pub enum StratusError {
    /// I/O errors (failed writes to standard output)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
