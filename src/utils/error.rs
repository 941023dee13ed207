//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while importing a trace.
///
/// Every variant aborts the whole import: the importer never returns a
/// partial profile group.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid trace format: {0}")]
    Format(String),

    #[error("unsupported trace format: {0}")]
    UnsupportedFormat(String),

    #[error("no openable events for pid {pid}, tid {tid}")]
    EmptyProfile { pid: i64, tid: i64 },

    #[error("unbalanced call stack: {0}")]
    UnbalancedStack(String),

    #[error("importer invariant violated: {0}")]
    Internal(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
