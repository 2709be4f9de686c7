//! Authorization guard errors.

use sqlx::Error;
use thiserror::Error;

/// Authorization guard error variants.
#[derive(Debug, Error)]
pub enum AuthzServiceError {
    /// The principal's role does not grant the required permission.
    #[error("permission denied")]
    Forbidden,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AuthzServiceError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}
