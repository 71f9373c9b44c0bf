//! # AppError
//!
//! Centralized error handling for the participation archive.
//! Malformed request parameters are deliberately absent here: they fall back
//! to defaults and never surface as errors.

use thiserror::Error;

/// The primary error type for all pa-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// The corpus file or table does not exist. Listings degrade to empty
    /// results, single-record lookups to not-found.
    #[error("corpus source absent: {0}")]
    SourceAbsent(String),

    /// The corpus loaded but the requested record is not in it.
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Authentication is required and no valid session was presented.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other I/O or parsing failure.
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::NotFound(kind.into(), id.into())
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        AppError::Internal(message.to_string())
    }

    /// True for the expected, recoverable conditions.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::SourceAbsent(_) | AppError::NotFound(..))
    }
}

/// A specialized Result type for archive logic.
pub type Result<T> = std::result::Result<T, AppError>;
