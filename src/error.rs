//! Error taxonomy for the task store and its collaborators.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    CategoryNotFound,

    // Conflict errors
    AlreadyExists,

    // Internal errors
    ConnectionFailed,
    DatabaseError,
    IoError,
    SerializationError,
    InternalError,
}

/// A rejected field value, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the persistence, validation, and export layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The database file could not be opened. Fatal at startup.
    #[error("database connection failed for {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement or transaction failed; the transaction was rolled back.
    #[error("failed to {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The stored schema cannot be read by this build.
    #[error("incompatible database schema: {0}")]
    Schema(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} '{key}' already exists")]
    AlreadyExists { entity: &'static str, key: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn storage(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Error::Storage { operation, source }
    }

    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }

    pub fn task_not_found(id: i64) -> Self {
        Error::NotFound {
            entity: "task",
            key: id.to_string(),
        }
    }

    pub fn category_not_found(name: &str) -> Self {
        Error::NotFound {
            entity: "category",
            key: name.to_string(),
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation(ValidationError::new(field, message))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Open { .. } => ErrorCode::ConnectionFailed,
            Error::Storage { .. } | Error::Schema(_) => ErrorCode::DatabaseError,
            Error::NotFound { entity: "category", .. } => ErrorCode::CategoryNotFound,
            Error::NotFound { .. } => ErrorCode::TaskNotFound,
            Error::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Error::Validation(_) => ErrorCode::InvalidFieldValue,
            Error::Io { .. } => ErrorCode::IoError,
            Error::Json(_) | Error::Csv(_) => ErrorCode::SerializationError,
        }
    }

    /// Attribute a storage failure to the named operation.
    pub fn in_operation(self, operation: &'static str) -> Self {
        match self {
            Error::Storage { source, .. } => Error::Storage { operation, source },
            other => other,
        }
    }

    /// Field name for validation failures, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::Validation(v) => Some(v.field),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(source: rusqlite::Error) -> Self {
        Error::Storage {
            operation: "execute statement",
            source,
        }
    }
}

/// Serializable error body for JSON output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            field: err.field(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
