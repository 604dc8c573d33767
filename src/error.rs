//! Error types for kvport
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KvportError
pub type Result<T> = std::result::Result<T, KvportError>;

/// Unified error type for kvport operations
#[derive(Debug, Error)]
pub enum KvportError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Client Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote store answered with an error status
    #[error("Store error: {0}")]
    Store(String),

    #[error("Status query against {endpoint} failed: {reason}")]
    StatusQuery { endpoint: String, reason: String },

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("Snapshot not found: {}", path.display())]
    SnapshotNotFound { path: PathBuf },

    #[error("Malformed snapshot {}: {reason}", path.display())]
    MalformedSnapshot { path: PathBuf, reason: String },

    // -------------------------------------------------------------------------
    // Transfer Errors
    // -------------------------------------------------------------------------
    #[error("Range read under prefix {prefix:?} failed: {reason}")]
    RangeRead { prefix: String, reason: String },

    #[error("Write of key {key:?} failed after {written} successful writes: {reason}")]
    Write {
        key: String,
        written: usize,
        reason: String,
    },

    #[error("Operation cancelled after {written} records")]
    Cancelled { written: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for KvportError {
    fn from(e: bincode::Error) -> Self {
        KvportError::Serialization(e.to_string())
    }
}
