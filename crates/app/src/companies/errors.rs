//! Companies service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Companies service error variants.
#[derive(Debug, Error)]
pub enum CompaniesServiceError {
    /// Company was not found.
    #[error("company not found")]
    NotFound,

    /// A unique field (slug, schema name) is already taken.
    #[error("company with this slug or schema already exists")]
    Conflict,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CompaniesServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Conflict,
            _ => Self::Sql(error),
        }
    }
}
