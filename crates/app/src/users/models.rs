//! User Models

use jiff::Timestamp;

use crate::{companies::models::CompanyUuid, roles::models::RoleUuid, uuids::TypedUuid};

pub type UserUuid = TypedUuid<User>;

/// A tenant-schema user. The identity (email/username) is mirrored in the
/// shared directory; the `role` label mirrors the owning role's name.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserUuid,

    /// Unique within the tenant and across the whole directory.
    pub email: String,

    /// Unique within the tenant and across the whole directory.
    pub username: String,

    /// Opaque PHC-format password hash. Plaintext never persists.
    pub hashed_password: String,

    /// The user's role within this tenant.
    pub role_id: RoleUuid,

    /// Denormalized role name, kept in step with the role row.
    pub role: String,

    pub is_active: bool,

    /// Current refresh token, if one has been issued.
    pub refresh_token: Option<String>,

    pub last_login: Option<Timestamp>,

    /// Owning company.
    pub company_id: CompanyUuid,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating a tenant user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Already-hashed password (see [`crate::users::credentials`]).
    pub password_hash: String,
    pub role_id: RoleUuid,
}

/// Partial identity update; `None` fields are left untouched. Changes
/// propagate to the shared directory in the same transaction.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
}
