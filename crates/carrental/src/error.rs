//! Error types for carrental.
//!
//! Every operation reports failures through the single [`Error`] enum. Errors
//! are local to the operation that raised them: nothing is retried and no
//! compensating action is taken.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for carrental operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// The database could not be opened or reached.
    #[error("storage unavailable at {path}: {source}")]
    StorageUnavailable {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Domain Errors ===
    /// A value that must be unique is already taken.
    #[error("{field} '{value}' is already registered")]
    UniqueConstraintViolation {
        /// The constrained field.
        field: &'static str,
        /// The conflicting value.
        value: String,
    },

    /// A record refers to another record that does not exist.
    #[error("referenced {entity} {id} does not exist")]
    ReferentialIntegrity {
        /// The kind of record being referenced.
        entity: &'static str,
        /// The missing identifier.
        id: i64,
    },

    /// The requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },

    /// The rental has already been closed.
    #[error("rental {rental_id} is already closed")]
    AlreadyClosed {
        /// The rental identifier.
        rental_id: i64,
    },

    /// An input value was rejected.
    #[error("invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for carrental operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for the given field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a referential integrity error.
    #[must_use]
    pub fn missing_reference(entity: &'static str, id: i64) -> Self {
        Self::ReferentialIntegrity { entity, id }
    }

    /// Check if this error means the record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a uniqueness conflict.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolation { .. })
    }

    /// Check if this error is a dangling reference.
    #[must_use]
    pub fn is_referential_integrity(&self) -> bool {
        matches!(self, Self::ReferentialIntegrity { .. })
    }

    /// Check if this error is a rejected input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error means the rental was already closed.
    #[must_use]
    pub fn is_already_closed(&self) -> bool {
        matches!(self, Self::AlreadyClosed { .. })
    }

    /// Check if this error means storage could not be reached.
    #[must_use]
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}
