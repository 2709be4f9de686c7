//! Built-in permission catalog.
//!
//! Every tenant is seeded with this fixed set at provisioning time, and
//! [`crate::permissions::PermissionsService::initialize`] can re-seed it
//! idempotently (for example after the catalog gains new codes).

/// One seedable permission definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogPermission {
    /// Stable code checked by the authorization guard.
    pub code: &'static str,

    /// Human-readable name.
    pub name: &'static str,

    /// Module the permission belongs to.
    pub module: &'static str,

    /// What the permission grants.
    pub description: &'static str,
}

/// The standard module/permission catalog.
pub const BUILT_IN_PERMISSIONS: &[CatalogPermission] = &[
    CatalogPermission {
        code: "users_create",
        name: "Users Create",
        module: "users",
        description: "Allows creating new users in the company",
    },
    CatalogPermission {
        code: "users_read",
        name: "Users Read",
        module: "users",
        description: "Allows viewing user information",
    },
    CatalogPermission {
        code: "users_update",
        name: "Users Update",
        module: "users",
        description: "Allows updating user information",
    },
    CatalogPermission {
        code: "users_delete",
        name: "Users Delete",
        module: "users",
        description: "Allows deactivating and deleting users",
    },
    CatalogPermission {
        code: "roles_create",
        name: "Roles Create",
        module: "roles",
        description: "Allows creating new roles in the company",
    },
    CatalogPermission {
        code: "roles_read",
        name: "Roles Read",
        module: "roles",
        description: "Allows viewing role information",
    },
    CatalogPermission {
        code: "roles_update",
        name: "Roles Update",
        module: "roles",
        description: "Allows updating role information",
    },
    CatalogPermission {
        code: "roles_delete",
        name: "Roles Delete",
        module: "roles",
        description: "Allows deleting roles from the company",
    },
    CatalogPermission {
        code: "roles_manage_permissions",
        name: "Roles Manage Permissions",
        module: "roles",
        description: "Allows granting and revoking role permissions",
    },
    CatalogPermission {
        code: "permissions_create",
        name: "Permissions Create",
        module: "permissions",
        description: "Allows creating new permissions in the company",
    },
    CatalogPermission {
        code: "permissions_read",
        name: "Permissions Read",
        module: "permissions",
        description: "Allows viewing permission information",
    },
    CatalogPermission {
        code: "permissions_update",
        name: "Permissions Update",
        module: "permissions",
        description: "Allows updating permission information",
    },
    CatalogPermission {
        code: "permissions_delete",
        name: "Permissions Delete",
        module: "permissions",
        description: "Allows deleting permissions from the company",
    },
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::BUILT_IN_PERMISSIONS;

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<_> = BUILT_IN_PERMISSIONS.iter().map(|p| p.code).collect();

        assert_eq!(codes.len(), BUILT_IN_PERMISSIONS.len());
    }

    #[test]
    fn codes_follow_module_prefix() {
        for permission in BUILT_IN_PERMISSIONS {
            assert!(
                permission.code.starts_with(permission.module),
                "{} should be prefixed with {}",
                permission.code,
                permission.module
            );
        }
    }
}
