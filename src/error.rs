//! Error types for bucketkv
//!
//! `KvError` is the only error type callers of the store see. Backend
//! failures are translated into it at the store boundary.

use thiserror::Error;

use crate::backend::BackendError;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for bucketkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Construction Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Point Operation Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {key}")]
    NotFound { key: String },

    #[error("Read error: {0}")]
    Read(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Delete error for key {key}: {message}")]
    Delete { key: String, message: String },

    // -------------------------------------------------------------------------
    // Enumeration Errors
    // -------------------------------------------------------------------------
    /// Listing failed, possibly after some pages were already consumed.
    /// `partial` holds the keys collected before the failure (scans only).
    #[error("List error: {message} ({} keys collected)", .partial.len())]
    List { message: String, partial: Vec<String> },
}

impl KvError {
    /// Keys collected by a scan before it failed
    pub fn partial_keys(&self) -> &[String] {
        match self {
            KvError::List { partial, .. } => partial,
            _ => &[],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound { .. })
    }

    pub(crate) fn list(err: BackendError, partial: Vec<String>) -> Self {
        KvError::List {
            message: err.to_string(),
            partial,
        }
    }
}
