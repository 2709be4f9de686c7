//! Roles service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Roles service error variants.
#[derive(Debug, Error)]
pub enum RolesServiceError {
    /// Role was not found in the tenant.
    #[error("role not found")]
    NotFound,

    /// A referenced permission id does not exist in the tenant. Ids from
    /// other tenants are indistinguishable from nonexistent ids.
    #[error("permission not found in this company")]
    PermissionNotFound,

    /// Duplicate role name within the tenant.
    #[error("role name already exists")]
    Conflict,

    /// Attempted rename or delete of a system role.
    #[error("system roles cannot be renamed or deleted")]
    Forbidden,

    /// Deletion blocked: users still hold this role. Reassign them first so
    /// no user is left without a resolvable role.
    #[error("role is still assigned to one or more users")]
    InUse,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for RolesServiceError {
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
            Some(ErrorKind::ForeignKeyViolation) => Self::PermissionNotFound,
            _ => Self::Sql(error),
        }
    }
}
