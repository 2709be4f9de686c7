//! Roles service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    database::{Db, TenantContext},
    permissions::models::PermissionUuid,
    roles::{
        errors::RolesServiceError,
        models::{NewRole, Role, RoleUpdate, RoleUuid},
        repository::PgRolesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgRolesService {
    db: Db,
    repository: PgRolesRepository,
}

impl PgRolesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgRolesRepository::new(),
        }
    }

    /// Fail with [`RolesServiceError::PermissionNotFound`] unless every id
    /// exists in the bound tenant schema. Ids belonging to another tenant
    /// are simply absent here, which is exactly the rejection we want.
    async fn ensure_permissions_exist(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        permission_ids: &[PermissionUuid],
    ) -> Result<(), RolesServiceError> {
        if permission_ids.is_empty() {
            return Ok(());
        }

        let mut unique = permission_ids.to_vec();
        unique.sort_unstable_by_key(|id| id.into_uuid());
        unique.dedup();

        let existing = self
            .repository
            .count_existing_permissions(tx, &unique)
            .await?;

        if existing != i64::try_from(unique.len()).unwrap_or(i64::MAX) {
            return Err(RolesServiceError::PermissionNotFound);
        }

        Ok(())
    }

    async fn attach_permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: &mut Role,
    ) -> Result<(), RolesServiceError> {
        role.permissions = self.repository.list_role_permissions(tx, role.id).await?;

        Ok(())
    }
}

#[async_trait]
impl RolesService for PgRolesService {
    async fn create_role(
        &self,
        tenant: &TenantContext,
        role: NewRole,
    ) -> Result<Role, RolesServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        self.ensure_permissions_exist(&mut tx, &role.permission_ids)
            .await?;

        // Duplicate names surface as Conflict via the unique constraint.
        let mut created = self.repository.create_role(&mut tx, &role, false).await?;

        if !role.permission_ids.is_empty() {
            self.repository
                .add_role_permissions(&mut tx, created.id, &role.permission_ids)
                .await?;
        }

        self.attach_permissions(&mut tx, &mut created).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_role(
        &self,
        tenant: &TenantContext,
        id: RoleUuid,
    ) -> Result<Role, RolesServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let mut role = self.repository.get_role(&mut tx, id).await?;

        self.attach_permissions(&mut tx, &mut role).await?;

        tx.commit().await?;

        Ok(role)
    }

    async fn get_role_by_name(
        &self,
        tenant: &TenantContext,
        name: &str,
    ) -> Result<Role, RolesServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let mut role = self.repository.get_role_by_name(&mut tx, name).await?;

        self.attach_permissions(&mut tx, &mut role).await?;

        tx.commit().await?;

        Ok(role)
    }

    async fn list_roles(&self, tenant: &TenantContext) -> Result<Vec<Role>, RolesServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let mut roles = self.repository.list_roles(&mut tx).await?;

        for role in &mut roles {
            self.attach_permissions(&mut tx, role).await?;
        }

        tx.commit().await?;

        Ok(roles)
    }

    async fn update_role(
        &self,
        tenant: &TenantContext,
        id: RoleUuid,
        update: RoleUpdate,
    ) -> Result<Role, RolesServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let current = self.repository.get_role(&mut tx, id).await?;

        // System roles keep their names; description edits are fine.
        if current.is_system_role && update.name.is_some() {
            return Err(RolesServiceError::Forbidden);
        }

        let renamed = update
            .name
            .as_deref()
            .is_some_and(|name| name != current.name);

        let mut updated = self.repository.update_role(&mut tx, id, &update).await?;

        if renamed {
            // The denormalized user.role label tracks the role name; refresh
            // it in the same transaction so no reader sees the two disagree.
            self.repository
                .update_user_role_labels(&mut tx, id, &updated.name)
                .await?;
        }

        self.attach_permissions(&mut tx, &mut updated).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn set_permissions(
        &self,
        tenant: &TenantContext,
        id: RoleUuid,
        add_ids: &[PermissionUuid],
        remove_ids: &[PermissionUuid],
    ) -> Result<Role, RolesServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let mut role = self.repository.get_role(&mut tx, id).await?;

        self.ensure_permissions_exist(&mut tx, add_ids).await?;

        // Both sides of the diff apply in this one transaction: a concurrent
        // reader sees either none of it or all of it.
        if !add_ids.is_empty() {
            self.repository
                .add_role_permissions(&mut tx, id, add_ids)
                .await?;
        }

        if !remove_ids.is_empty() {
            self.repository
                .remove_role_permissions(&mut tx, id, remove_ids)
                .await?;
        }

        self.attach_permissions(&mut tx, &mut role).await?;

        tx.commit().await?;

        Ok(role)
    }

    async fn delete_role(
        &self,
        tenant: &TenantContext,
        id: RoleUuid,
    ) -> Result<(), RolesServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let role = self.repository.get_role(&mut tx, id).await?;

        if role.is_system_role {
            return Err(RolesServiceError::Forbidden);
        }

        // A user must never be left holding a role that no longer resolves.
        let holders = self.repository.count_users_with_role(&mut tx, id).await?;

        if holders > 0 {
            return Err(RolesServiceError::InUse);
        }

        // Join rows cascade at the storage layer.
        self.repository.delete_role(&mut tx, id).await?;

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Per-tenant role operations.
pub trait RolesService: Send + Sync {
    /// Create a custom role with optional initial grants. Conflict on a
    /// duplicate name; [`RolesServiceError::PermissionNotFound`] when any
    /// initial permission id is absent from the tenant.
    async fn create_role(
        &self,
        tenant: &TenantContext,
        role: NewRole,
    ) -> Result<Role, RolesServiceError>;

    /// Fetch a role with its permission set.
    async fn get_role(&self, tenant: &TenantContext, id: RoleUuid)
    -> Result<Role, RolesServiceError>;

    /// Fetch a role by its tenant-unique name.
    async fn get_role_by_name(
        &self,
        tenant: &TenantContext,
        name: &str,
    ) -> Result<Role, RolesServiceError>;

    /// List all roles with their permission sets.
    async fn list_roles(&self, tenant: &TenantContext) -> Result<Vec<Role>, RolesServiceError>;

    /// Apply a partial update. Renaming a system role is Forbidden; renames
    /// of custom roles refresh the denormalized `user.role` labels in the
    /// same transaction.
    async fn update_role(
        &self,
        tenant: &TenantContext,
        id: RoleUuid,
        update: RoleUpdate,
    ) -> Result<Role, RolesServiceError>;

    /// Apply an atomic grant/revoke diff. Already-granted adds and absent
    /// removes are no-ops; the whole diff commits or none of it does.
    async fn set_permissions(
        &self,
        tenant: &TenantContext,
        id: RoleUuid,
        add_ids: &[PermissionUuid],
        remove_ids: &[PermissionUuid],
    ) -> Result<Role, RolesServiceError>;

    /// Delete a custom role. Forbidden for system roles;
    /// [`RolesServiceError::InUse`] while any user still holds it.
    async fn delete_role(&self, tenant: &TenantContext, id: RoleUuid)
    -> Result<(), RolesServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        permissions::{PermissionsService, catalog::BUILT_IN_PERMISSIONS},
        roles::models::{ADMIN_ROLE_NAME, STAFF_ROLE_NAME},
        test::TestContext,
        users::{
            UsersService,
            credentials,
            models::NewUser,
        },
    };

    use super::*;

    #[tokio::test]
    async fn provisioning_seeds_admin_and_staff_system_roles() -> TestResult {
        let ctx = TestContext::new().await;

        let admin = ctx
            .roles
            .get_role_by_name(&ctx.tenant, ADMIN_ROLE_NAME)
            .await?;
        let staff = ctx
            .roles
            .get_role_by_name(&ctx.tenant, STAFF_ROLE_NAME)
            .await?;

        assert!(admin.is_system_role);
        assert!(staff.is_system_role);
        assert_eq!(admin.permissions.len(), BUILT_IN_PERMISSIONS.len());
        assert!(staff.permissions.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn create_role_with_initial_permissions() -> TestResult {
        let ctx = TestContext::new().await;

        let users_create = ctx
            .permissions
            .get_permission_by_code(&ctx.tenant, "users_create")
            .await?;

        let editor = ctx
            .roles
            .create_role(
                &ctx.tenant,
                NewRole {
                    name: "Editor".to_string(),
                    description: Some("Can manage users".to_string()),
                    permission_ids: vec![users_create.id],
                },
            )
            .await?;

        assert!(!editor.is_system_role);
        assert_eq!(editor.permissions.len(), 1);
        assert_eq!(editor.permissions[0].code, "users_create");

        Ok(())
    }

    #[tokio::test]
    async fn create_role_with_unknown_permission_fails() {
        let ctx = TestContext::new().await;

        let result = ctx
            .roles
            .create_role(
                &ctx.tenant,
                NewRole {
                    name: "Broken".to_string(),
                    description: None,
                    permission_ids: vec![PermissionUuid::generate()],
                },
            )
            .await;

        assert!(
            matches!(result, Err(RolesServiceError::PermissionNotFound)),
            "expected PermissionNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn foreign_tenant_permission_id_reads_as_missing() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.provision_company("Globex").await;
        let other_tenant = ctx.tenant_for(&other.company);

        let foreign = ctx
            .permissions
            .get_permission_by_code(&other_tenant, "users_create")
            .await?;

        let result = ctx
            .roles
            .create_role(
                &ctx.tenant,
                NewRole {
                    name: "Smuggler".to_string(),
                    description: None,
                    permission_ids: vec![foreign.id],
                },
            )
            .await;

        assert!(
            matches!(result, Err(RolesServiceError::PermissionNotFound)),
            "expected PermissionNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_role_name_is_conflict() -> TestResult {
        let ctx = TestContext::new().await;

        let role = NewRole {
            name: "Editor".to_string(),
            description: None,
            permission_ids: Vec::new(),
        };

        ctx.roles.create_role(&ctx.tenant, role.clone()).await?;

        let result = ctx.roles.create_role(&ctx.tenant, role).await;

        assert!(
            matches!(result, Err(RolesServiceError::Conflict)),
            "expected Conflict, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn renaming_a_system_role_is_forbidden() -> TestResult {
        let ctx = TestContext::new().await;

        let admin = ctx
            .roles
            .get_role_by_name(&ctx.tenant, ADMIN_ROLE_NAME)
            .await?;

        let result = ctx
            .roles
            .update_role(
                &ctx.tenant,
                admin.id,
                RoleUpdate {
                    name: Some("Overlord".to_string()),
                    ..RoleUpdate::default()
                },
            )
            .await;

        assert!(
            matches!(result, Err(RolesServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        // Description edits on system roles stay allowed.
        let updated = ctx
            .roles
            .update_role(
                &ctx.tenant,
                admin.id,
                RoleUpdate {
                    description: Some("Tenant administrators".to_string()),
                    ..RoleUpdate::default()
                },
            )
            .await?;

        assert_eq!(updated.name, ADMIN_ROLE_NAME);
        assert_eq!(updated.description.as_deref(), Some("Tenant administrators"));

        Ok(())
    }

    #[tokio::test]
    async fn renaming_a_role_refreshes_user_labels() -> TestResult {
        let ctx = TestContext::new().await;

        let editor = ctx
            .roles
            .create_role(
                &ctx.tenant,
                NewRole {
                    name: "Editor".to_string(),
                    description: None,
                    permission_ids: Vec::new(),
                },
            )
            .await?;

        let user = ctx
            .users
            .create_user(
                &ctx.tenant,
                NewUser {
                    email: "editor@acme.test".to_string(),
                    username: "acme-editor".to_string(),
                    password_hash: credentials::hash_password("editor-pass")?,
                    role_id: editor.id,
                },
            )
            .await?;

        assert_eq!(user.role, "Editor");

        ctx.roles
            .update_role(
                &ctx.tenant,
                editor.id,
                RoleUpdate {
                    name: Some("Publisher".to_string()),
                    ..RoleUpdate::default()
                },
            )
            .await?;

        let reloaded = ctx.users.get_user(&ctx.tenant, user.id).await?;

        assert_eq!(reloaded.role, "Publisher");

        Ok(())
    }

    #[tokio::test]
    async fn set_permissions_applies_the_diff_atomically() -> TestResult {
        let ctx = TestContext::new().await;

        let users_create = ctx
            .permissions
            .get_permission_by_code(&ctx.tenant, "users_create")
            .await?;
        let users_delete = ctx
            .permissions
            .get_permission_by_code(&ctx.tenant, "users_delete")
            .await?;

        let staff = ctx
            .roles
            .get_role_by_name(&ctx.tenant, STAFF_ROLE_NAME)
            .await?;

        let granted = ctx
            .roles
            .set_permissions(&ctx.tenant, staff.id, &[users_create.id, users_delete.id], &[])
            .await?;

        assert_eq!(granted.permissions.len(), 2);

        // Re-granting is a no-op, revoking applies in the same call.
        let swapped = ctx
            .roles
            .set_permissions(&ctx.tenant, staff.id, &[users_create.id], &[users_delete.id])
            .await?;

        assert_eq!(swapped.permissions.len(), 1);
        assert_eq!(swapped.permissions[0].code, "users_create");

        Ok(())
    }

    #[tokio::test]
    async fn delete_role_held_by_a_user_is_blocked() -> TestResult {
        let ctx = TestContext::new().await;

        let editor = ctx
            .roles
            .create_role(
                &ctx.tenant,
                NewRole {
                    name: "Editor".to_string(),
                    description: None,
                    permission_ids: Vec::new(),
                },
            )
            .await?;

        let user = ctx
            .users
            .create_user(
                &ctx.tenant,
                NewUser {
                    email: "editor@acme.test".to_string(),
                    username: "acme-editor".to_string(),
                    password_hash: credentials::hash_password("editor-pass")?,
                    role_id: editor.id,
                },
            )
            .await?;

        let blocked = ctx.roles.delete_role(&ctx.tenant, editor.id).await;

        assert!(
            matches!(blocked, Err(RolesServiceError::InUse)),
            "expected InUse, got {blocked:?}"
        );

        let staff = ctx
            .roles
            .get_role_by_name(&ctx.tenant, STAFF_ROLE_NAME)
            .await?;

        ctx.users
            .change_user_role(&ctx.tenant, user.id, staff.id)
            .await?;

        ctx.roles.delete_role(&ctx.tenant, editor.id).await?;

        let result = ctx.roles.get_role(&ctx.tenant, editor.id).await;

        assert!(
            matches!(result, Err(RolesServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_system_role_is_forbidden() -> TestResult {
        let ctx = TestContext::new().await;

        let staff = ctx
            .roles
            .get_role_by_name(&ctx.tenant, STAFF_ROLE_NAME)
            .await?;

        let result = ctx.roles.delete_role(&ctx.tenant, staff.id).await;

        assert!(
            matches!(result, Err(RolesServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }
}
