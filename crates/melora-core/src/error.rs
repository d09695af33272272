//! Error types module
//!
//! The `AppError` enum is the error surface the HTTP layer maps to status
//! codes. Lower layers keep their own error types (`StorageError`,
//! `ExtractError`) and convert into `AppError` at the seam.

use crate::catalog::CatalogError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Target storage location or record absent (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The uploaded container could not be parsed at all (400).
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// Malformed or out-of-bounds Range header (416, empty body).
    #[error("Range not satisfiable: {0}")]
    RangeNotSatisfiable(String),

    /// Backend unreachable or a read/write failed (500).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Concurrent identity creation race; retried once before surfacing (409).
    #[error("Transient conflict: {0}")]
    TransientConflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status code equivalent for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::UnsupportedFormat(_) => 400,
            AppError::InvalidInput(_) => 400,
            AppError::RangeNotSatisfiable(_) => 416,
            AppError::TransientConflict(_) => 409,
            AppError::Storage(_) => 500,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for response bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::RangeNotSatisfiable(_) => "RANGE_NOT_SATISFIABLE",
            AppError::TransientConflict(_) => "TRANSIENT_CONFLICT",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Conflict(msg) => AppError::TransientConflict(msg),
            CatalogError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}
