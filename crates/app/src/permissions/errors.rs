//! Permissions service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Permissions service error variants.
#[derive(Debug, Error)]
pub enum PermissionsServiceError {
    /// Permission was not found in the tenant.
    #[error("permission not found")]
    NotFound,

    /// Duplicate code within the tenant.
    #[error("permission code already exists")]
    Conflict,

    /// Deletion blocked: at least one role still references the permission.
    /// Remove it from every role first.
    #[error("permission is still referenced by one or more roles")]
    Referenced,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PermissionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        // Queries against a dropped tenant schema read as NotFound.
        if crate::database::is_schema_absent(&error) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Conflict,
            Some(ErrorKind::ForeignKeyViolation) => Self::Referenced,
            _ => Self::Sql(error),
        }
    }
}
