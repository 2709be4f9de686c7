//! Users service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Users service error variants.
#[derive(Debug, Error)]
pub enum UsersServiceError {
    /// User was not found in the tenant.
    #[error("user not found")]
    NotFound,

    /// The assigned role does not exist in the tenant.
    #[error("role not found in this company")]
    RoleNotFound,

    /// Email or username already registered, in this tenant or any other.
    #[error("email or username is already registered")]
    Conflict,

    /// A stored credential could not be processed (malformed hash).
    #[error("credential processing error")]
    Credential(#[source] crate::users::credentials::CredentialError),

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for UsersServiceError {
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
            Some(ErrorKind::ForeignKeyViolation) => Self::RoleNotFound,
            _ => Self::Sql(error),
        }
    }
}

impl From<crate::users::credentials::CredentialError> for UsersServiceError {
    fn from(error: crate::users::credentials::CredentialError) -> Self {
        Self::Credential(error)
    }
}
