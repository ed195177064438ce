//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the document metadata service, providing
//! the domain error taxonomy and conversion utilities for all components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from storage, queries, identity, and the API
//! - **Output**: Structured error types the boundary maps to response classes
//! - **Error Categories**: Domain, Validation, Storage, Identity, Configuration
//!
//! ## Key Features
//! - Domain outcomes (`AlreadyExists`, `NotFound`) as explicit variants,
//!   never panics or sentinel values
//! - Automatic conversion from storage and serialization errors
//! - Recoverability and category helpers for logging and retry decisions

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Error taxonomy for the document metadata service
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A create request collided with an existing (name, user) pair
    #[error("Document with name '{name}' already exists for user {user_id}")]
    AlreadyExists { name: String, user_id: u64 },

    /// A get/delete referenced no live record
    #[error("Document not found with id: {id}")]
    NotFound { id: u64 },

    /// A required field was missing or malformed at the boundary
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// The underlying database is unavailable or misbehaving
    #[error("Storage error: {reason}")]
    StorageFailure { reason: String },

    /// Record encoding/decoding failed
    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    /// A bearer token could not be parsed or verified. Never surfaced to
    /// callers; the identity resolver downgrades it to "no identity".
    #[error("Token rejected: {reason}")]
    TokenParseFailure { reason: String },

    /// Configuration errors (startup only)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DocumentError {
    /// Check if the error is transient and safe for the caller to retry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DocumentError::StorageFailure { .. })
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            DocumentError::AlreadyExists { .. } | DocumentError::NotFound { .. } => "domain",
            DocumentError::ValidationFailed { .. } => "validation",
            DocumentError::StorageFailure { .. } | DocumentError::SerializationFailed { .. } => {
                "storage"
            }
            DocumentError::TokenParseFailure { .. } => "identity",
            DocumentError::Config { .. } => "configuration",
            DocumentError::Internal { .. } => "generic",
        }
    }
}

// Conversion from common error types
impl From<sled::Error> for DocumentError {
    fn from(err: sled::Error) -> Self {
        DocumentError::StorageFailure {
            reason: err.to_string(),
        }
    }
}

impl From<bincode::Error> for DocumentError {
    fn from(err: bincode::Error) -> Self {
        DocumentError::SerializationFailed {
            message: format!("Binary serialization error: {}", err),
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::SerializationFailed {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self {
        DocumentError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

/// Helper for field validation failures at the boundary
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $reason:expr) => {
        $crate::errors::DocumentError::ValidationFailed {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}
