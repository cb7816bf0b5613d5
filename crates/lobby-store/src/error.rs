//! Error types for the document store.
//!
//! All errors are propagated via [`StoreError`] which wraps the underlying
//! [`fred`] and [`serde_json`] errors with context about which key failed.

/// Errors that can occur in the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key was not found.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend rejected the operation.
    #[error("Backend error on {key}: {message}")]
    Backend {
        /// Key being written or read.
        key: String,
        /// Description of the failure.
        message: String,
    },
}
