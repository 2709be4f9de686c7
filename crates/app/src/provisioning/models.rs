//! Provisioning Models

use crate::{companies::models::Company, users::models::User};

/// The initial administrative identity for a new tenant.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: String,
    pub username: String,
    /// Already-hashed password (see [`crate::users::credentials`]).
    pub password_hash: String,
}

/// Everything created by a successful provision.
#[derive(Debug, Clone)]
pub struct ProvisionedCompany {
    /// The shared-scope company record, schema name established.
    pub company: Company,

    /// The admin user created inside the tenant schema, holding ADMIN.
    pub admin_user: User,

    /// How many catalog permissions were seeded.
    pub seeded_permissions: u64,
}
