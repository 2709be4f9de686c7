//! Role Models

use jiff::Timestamp;

use crate::{
    permissions::models::{Permission, PermissionUuid},
    uuids::TypedUuid,
};

pub type RoleUuid = TypedUuid<Role>;

/// Name of the built-in administrator role. Holds every permission
/// implicitly; the authorization guard short-circuits on it.
pub const ADMIN_ROLE_NAME: &str = "ADMIN";

/// Name of the built-in default staff role. Starts with no permissions.
pub const STAFF_ROLE_NAME: &str = "STAFF";

/// A named aggregate of permissions inside one tenant schema.
#[derive(Debug, Clone)]
pub struct Role {
    pub id: RoleUuid,

    /// Unique within the tenant.
    pub name: String,

    pub description: Option<String>,

    /// True for the built-in ADMIN/STAFF roles, which cannot be deleted or
    /// renamed.
    pub is_system_role: bool,

    /// The role's granted permissions.
    pub permissions: Vec<Permission>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating a custom role.
#[derive(Debug, Clone, Default)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    /// Initial grants; every id must exist in the tenant.
    pub permission_ids: Vec<PermissionUuid>,
}

/// Partial role update; `None` fields are left untouched, so `description`
/// cannot be cleared back to NULL here.
#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    /// New name. Forbidden for system roles.
    pub name: Option<String>,
    pub description: Option<String>,
}
