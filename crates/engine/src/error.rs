//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when a referenced entity is absent or not owned by
//!   the caller.
//! - [`TypeMismatch`] thrown when a category kind and a transaction kind
//!   disagree.
//! - [`InvalidAmount`] thrown when an amount is non-positive or malformed.
//! - [`InvalidInput`] thrown when a non-monetary input is malformed, such
//!   as an empty required name or an unknown kind literal.
//! - [`DuplicateName`] thrown when a category name collides within its
//!   owner+kind scope.
//! - [`ReferentialConflict`] thrown when a delete is blocked by existing
//!   references.
//! - [`Database`] wraps any storage-layer failure; it is never leaked as a
//!   panic to the caller.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`TypeMismatch`]: EngineError::TypeMismatch
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`DuplicateName`]: EngineError::DuplicateName
//!  [`ReferentialConflict`]: EngineError::ReferentialConflict
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Broad classification of an [`EngineError`], for callers that map failures
/// to a transport-level status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Validation,
    Conflict,
    Storage,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" already present!")]
    DuplicateName(String),
    #[error("Referential conflict: {0}")]
    ReferentialConflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Maps the error to its caller-facing category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::TypeMismatch(_) | Self::InvalidAmount(_) | Self::InvalidInput(_) => {
                ErrorCategory::Validation
            }
            Self::DuplicateName(_) | Self::ReferentialConflict(_) => ErrorCategory::Conflict,
            Self::Database(_) => ErrorCategory::Storage,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::TypeMismatch(a), Self::TypeMismatch(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::DuplicateName(a), Self::DuplicateName(b)) => a == b,
            (Self::ReferentialConflict(a), Self::ReferentialConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
