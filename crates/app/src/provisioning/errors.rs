//! Provisioning service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::database::SchemaNameError;

/// Provisioning service error variants.
#[derive(Debug, Error)]
pub enum ProvisioningServiceError {
    /// Company was not found.
    #[error("company not found")]
    NotFound,

    /// The slug, schema name, or admin identity is already taken.
    #[error("company slug, schema, or admin identity already exists")]
    Conflict,

    /// Destructive operation attempted without the confirmation flag.
    #[error("schema drop requires explicit confirmation")]
    PreconditionFailed,

    /// Directory entries still point at the schema. Purge them first
    /// (`DirectoryService::purge_company_entries`), then retry the drop.
    #[error("directory entries still reference this schema")]
    DirectoryNotEmpty,

    /// A provision or drop for the same company is already running.
    #[error("another provisioning operation for this company is in flight")]
    InFlight,

    /// The slug does not reduce to a usable schema identifier.
    #[error("cannot derive a valid schema name")]
    InvalidSchemaName(#[from] SchemaNameError),

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ProvisioningServiceError {
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
