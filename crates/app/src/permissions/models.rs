//! Permission Models

use jiff::Timestamp;

use crate::uuids::TypedUuid;

pub type PermissionUuid = TypedUuid<Permission>;

/// A grantable capability inside one tenant schema.
#[derive(Debug, Clone)]
pub struct Permission {
    pub id: PermissionUuid,

    /// Stable code, unique within the tenant. Never reused with different
    /// semantics for the lifetime of the tenant.
    pub code: String,

    /// Human-readable name.
    pub name: String,

    /// Grouping tag (e.g. `users`, `roles`).
    pub module: String,

    pub description: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating a custom permission.
#[derive(Debug, Clone)]
pub struct NewPermission {
    pub code: String,
    pub name: String,
    pub module: String,
    pub description: Option<String>,
}

/// Partial permission update; `None` fields are left untouched, so nullable
/// fields such as `description` cannot be cleared back to NULL here.
#[derive(Debug, Clone, Default)]
pub struct PermissionUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub module: Option<String>,
    pub description: Option<String>,
}
