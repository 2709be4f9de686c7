//! Directory service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Directory service error variants.
#[derive(Debug, Error)]
pub enum DirectoryServiceError {
    /// No entry exists for the identity.
    #[error("identity not found in directory")]
    NotFound,

    /// The email or username is already registered, possibly under another
    /// tenant. Identities are globally unique across all tenants.
    #[error("email or username is already registered")]
    Conflict,

    /// The referenced company does not exist.
    #[error("referenced company not found")]
    InvalidReference,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for DirectoryServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Conflict,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            _ => Self::Sql(error),
        }
    }
}
