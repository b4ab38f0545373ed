//! Error types shared across Tessera crates.

use thiserror::Error;

use crate::version::SchemaVersion;

/// Top-level error type for loading engine data files.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A data file could not be parsed
    #[error("Failed to parse {file}: {message}")]
    Parse {
        /// File that failed to parse
        file: String,
        /// Parser message
        message: String,
    },

    /// Data file version mismatch
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build understands
        expected: SchemaVersion,
        /// Version found in the file
        actual: SchemaVersion,
    },
}

/// Result type alias for Tessera operations.
pub type TesseraResult<T> = Result<T, TesseraError>;
