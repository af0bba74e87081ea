//! Error types for CatalogSync
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are grouped by how the sync driver treats them:
//!
//! ### Record validation (skip the record, keep going)
//! - `MissingRequiredField` - ISBN or title absent or blank
//! - `Validation` - any other malformed field (e.g. an empty reference name)
//!
//! ### Storage (mark the record failed, keep going)
//! - `SqlxError` (via `#[from]`) - driver errors, constraint violations, lost connections
//! - `DatabaseError` - storage problems detected by our own code
//!
//! ### Input files (mark the file failed, keep going)
//! - `SerdeJsonError` (via `#[from]`) - unparsable JSON document
//! - `FileIoError` - unreadable file
//! - `InvalidInput` - valid JSON that is neither a record nor an array of records
//!
//! ### Fatal (abort before any record is processed)
//! - `DatabaseUnavailable` - the database could not be opened
//! - `MigrationFailed` - the schema could not be applied
//! - `InvalidPath` - the input directory does not exist
//! - `ConfigurationError` - the configuration file is invalid
//!
//! A duplicate ISBN is not an error at all; the importer reports it as
//! `InsertOutcome::Skipped`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our SyncError type
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for CatalogSync
#[derive(Error, Debug)]
pub enum SyncError {
    // ===== Record Validation Errors =====

    /// Required field is missing or blank
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// A record field is present but unusable
    #[error("Invalid {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    // ===== Database Errors =====

    /// Generic database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Database could not be opened or connected to
    #[error("Database unavailable at {path}: {message}")]
    DatabaseUnavailable {
        path: String,
        message: String,
    },

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    // ===== File Errors =====

    /// Generic file I/O error with context
    #[error("File I/O error: {0}")]
    FileIoError(String),

    /// Invalid or missing input path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // ===== Configuration Errors =====

    /// Configuration file is invalid or incomplete
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ===== General Errors =====

    /// Input document has an unusable shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ===== External Library Errors =====

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// Coarse classification used in the sync summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed or incomplete record
    Validation,
    /// Database write or connectivity failure
    Storage,
    /// Input file could not be read or parsed
    Parse,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::Validation => "validation",
            FailureKind::Storage => "storage",
            FailureKind::Parse => "parse",
        };
        f.write_str(label)
    }
}

// Helper methods for creating common errors
impl SyncError {
    /// Create a Validation error for a named field
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        SyncError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a MissingRequiredField error
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        SyncError::MissingRequiredField(field.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        SyncError::InvalidInput(message.into())
    }

    /// Is this a malformed-record error?
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            SyncError::MissingRequiredField(_) | SyncError::Validation { .. }
        )
    }

    /// Is this a database error?
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            SyncError::SqlxError(_)
                | SyncError::DatabaseError(_)
                | SyncError::DatabaseUnavailable { .. }
                | SyncError::MigrationFailed(_)
        )
    }

    /// Should this error stop the whole run?
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::DatabaseUnavailable { .. }
                | SyncError::MigrationFailed(_)
                | SyncError::InvalidPath(_)
                | SyncError::ConfigurationError(_)
        )
    }

    /// Classify for the sync summary
    pub fn kind(&self) -> FailureKind {
        if self.is_validation_error() {
            FailureKind::Validation
        } else if matches!(
            self,
            SyncError::SerdeJsonError(_) | SyncError::FileIoError(_) | SyncError::InvalidInput(_)
        ) {
            FailureKind::Parse
        } else {
            FailureKind::Storage
        }
    }

    /// Get a message suitable for the end-of-run report
    pub fn user_message(&self) -> String {
        match self {
            SyncError::MissingRequiredField(field) => {
                format!("Record skipped: '{}' is missing or empty.", field)
            }
            SyncError::DatabaseUnavailable { path, .. } => {
                format!(
                    "Could not open the database at {}. Check the path and permissions.",
                    path
                )
            }
            SyncError::SerdeJsonError(e) => {
                format!("File is not a valid book record document: {}", e)
            }
            SyncError::SqlxError(sqlx::Error::Database(db_err)) => {
                format!("Database rejected the write: {}", db_err.message())
            }
            _ => self.to_string(),
        }
    }
}
