//! Error types for Quill core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; consumers (the CLI layer)
//! map these to user-friendly messages and decide whether to abort.

use thiserror::Error;

/// Result type alias for Quill operations.
pub type Result<T> = std::result::Result<T, QuillError>;

/// Core error type for Quill operations.
#[derive(Debug, Error)]
pub enum QuillError {
    /// I/O error (filesystem create/read/write failure)
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Corrupt encoded value (base64, key length, text encoding)
    #[error("Decode error: {0}")]
    Decode(String),

    /// Key backup files are absent
    #[error("Key backup not found")]
    KeyNotFound,

    /// Journal not found by name
    #[error("Journal not found: {0}")]
    JournalNotFound(String),

    /// Entry not found by ID
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Journal name collision
    #[error("Journal already exists: {0}")]
    DuplicateJournal(String),

    /// Ciphertext integrity check failed (wrong key or tampered data)
    #[error("Ciphertext failed authentication")]
    Authentication,

    /// Ciphertext blob is shorter than the nonce prefix
    #[error("Ciphertext too short: {len} bytes")]
    CiphertextTooShort { len: usize },

    /// Secure random source unavailable
    #[error("Randomness error: {0}")]
    Randomness(String),

    /// Encryption-layer failure outside the taxonomy above
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Store consistency violation (ID collision, broken reference)
    #[error("Consistency error: {0}")]
    Consistency(String),
}
