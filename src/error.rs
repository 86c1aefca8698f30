//! Error types for EmberKV
//!
//! Provides a unified error type for the server and client plumbing.
//! Command-level failures (bad arity, unknown verb) are not errors here:
//! they become `-ERR` replies, see [`crate::protocol::CommandError`].

use thiserror::Error;

/// Result type alias using EmberError
pub type Result<T> = std::result::Result<T, EmberError>;

/// Unified error type for EmberKV operations
#[derive(Debug, Error)]
pub enum EmberError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EmberError {
    /// True when the underlying cause is an I/O `UnexpectedEof`
    pub fn is_eof(&self) -> bool {
        matches!(self, EmberError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
