//! Operation-level error taxonomy shared by the query and write services.

use crate::model::user::{UserId, UserValidationError};
use crate::repo::user_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, UserServiceError>;

/// Failure returned to the caller of a user operation.
///
/// `Internal` never exposes the store error in its message; the cause stays
/// reachable through `source()` for logging.
#[derive(Debug)]
pub enum UserServiceError {
    /// A field constraint was violated.
    Validation(UserValidationError),
    /// Another record already holds the email.
    Conflict,
    /// The id is not a syntactically valid store identifier.
    InvalidId(String),
    /// The id is well formed but no record matches.
    NotFound(UserId),
    /// The store failed or returned unexpected data.
    Internal(RepoError),
}

impl UserServiceError {
    /// Stable machine-readable code used in logs and caller envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Conflict => "conflict",
            Self::InvalidId(_) => "invalid_id",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_fault",
        }
    }
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict => write!(f, "email already exists"),
            Self::InvalidId(_) => write!(f, "invalid user id"),
            Self::NotFound(_) => write!(f, "user not found"),
            Self::Internal(_) => write!(f, "internal store error"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::DuplicateEmail => Self::Conflict,
            other => Self::Internal(other),
        }
    }
}
