//! Permissions service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::{Db, TenantContext},
    permissions::{
        catalog::BUILT_IN_PERMISSIONS,
        errors::PermissionsServiceError,
        models::{NewPermission, Permission, PermissionUpdate, PermissionUuid},
        repository::PgPermissionsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgPermissionsService {
    db: Db,
    repository: PgPermissionsRepository,
}

impl PgPermissionsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgPermissionsRepository::new(),
        }
    }
}

#[async_trait]
impl PermissionsService for PgPermissionsService {
    async fn initialize(&self, tenant: &TenantContext) -> Result<u64, PermissionsServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let mut seeded = 0;

        for definition in BUILT_IN_PERMISSIONS {
            if self.repository.seed_permission(&mut tx, definition).await? {
                seeded += 1;
            }
        }

        tx.commit().await?;

        if seeded > 0 {
            tracing::info!(schema = %tenant.schema(), seeded, "seeded catalog permissions");
        }

        Ok(seeded)
    }

    async fn list_permissions<'a>(
        &self,
        tenant: &TenantContext,
        module: Option<&'a str>,
    ) -> Result<Vec<Permission>, PermissionsServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let permissions = self.repository.list_permissions(&mut tx, module).await?;

        tx.commit().await?;

        Ok(permissions)
    }

    async fn get_permission(
        &self,
        tenant: &TenantContext,
        id: PermissionUuid,
    ) -> Result<Permission, PermissionsServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let permission = self.repository.get_permission(&mut tx, id).await?;

        tx.commit().await?;

        Ok(permission)
    }

    async fn get_permission_by_code(
        &self,
        tenant: &TenantContext,
        code: &str,
    ) -> Result<Permission, PermissionsServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let permission = self.repository.get_permission_by_code(&mut tx, code).await?;

        tx.commit().await?;

        Ok(permission)
    }

    async fn create_permission(
        &self,
        tenant: &TenantContext,
        permission: NewPermission,
    ) -> Result<Permission, PermissionsServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        // Uniqueness is enforced by the (code) constraint; a lost race
        // surfaces as Conflict through the error mapping.
        let created = self
            .repository
            .create_permission(&mut tx, &permission)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn update_permission(
        &self,
        tenant: &TenantContext,
        id: PermissionUuid,
        update: PermissionUpdate,
    ) -> Result<Permission, PermissionsServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let updated = self
            .repository
            .update_permission(&mut tx, id, &update)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_permission(
        &self,
        tenant: &TenantContext,
        id: PermissionUuid,
    ) -> Result<(), PermissionsServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        // Deleting a permission out from under roles must be an explicit
        // two-step operator action, so a referencing role blocks the delete
        // even though the storage layer could cascade. The count runs in the
        // same transaction as the delete, so a concurrent grant either lands
        // before the count (blocking the delete) or after the commit.
        let referencing_roles = self
            .repository
            .count_roles_with_permission(&mut tx, id)
            .await?;

        if referencing_roles > 0 {
            return Err(PermissionsServiceError::Referenced);
        }

        let rows_affected = self.repository.delete_permission(&mut tx, id).await?;

        if rows_affected == 0 {
            return Err(PermissionsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Per-tenant permission catalog operations.
pub trait PermissionsService: Send + Sync {
    /// Seed the built-in catalog into the tenant. Idempotent: re-running
    /// inserts nothing and does not error. Returns the number of
    /// permissions created by this run.
    async fn initialize(&self, tenant: &TenantContext) -> Result<u64, PermissionsServiceError>;

    /// List permissions ordered by module then name, optionally filtered to
    /// one module.
    async fn list_permissions<'a>(
        &self,
        tenant: &TenantContext,
        module: Option<&'a str>,
    ) -> Result<Vec<Permission>, PermissionsServiceError>;

    /// Fetch a permission by id.
    async fn get_permission(
        &self,
        tenant: &TenantContext,
        id: PermissionUuid,
    ) -> Result<Permission, PermissionsServiceError>;

    /// Fetch a permission by its tenant-unique code.
    async fn get_permission_by_code(
        &self,
        tenant: &TenantContext,
        code: &str,
    ) -> Result<Permission, PermissionsServiceError>;

    /// Create a custom permission; Conflict on duplicate code.
    async fn create_permission(
        &self,
        tenant: &TenantContext,
        permission: NewPermission,
    ) -> Result<Permission, PermissionsServiceError>;

    /// Apply a partial update; Conflict when a code change collides.
    async fn update_permission(
        &self,
        tenant: &TenantContext,
        id: PermissionUuid,
        update: PermissionUpdate,
    ) -> Result<Permission, PermissionsServiceError>;

    /// Delete a permission. Fails with
    /// [`PermissionsServiceError::Referenced`] while any role still holds
    /// it; the caller must revoke it from every role first.
    async fn delete_permission(
        &self,
        tenant: &TenantContext,
        id: PermissionUuid,
    ) -> Result<(), PermissionsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        roles::{RolesService, models::STAFF_ROLE_NAME},
        test::TestContext,
    };

    use super::*;

    fn custom_permission(code: &str) -> NewPermission {
        NewPermission {
            code: code.to_string(),
            name: format!("Custom {code}"),
            module: "custom".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn initialize_after_provisioning_seeds_nothing() -> TestResult {
        let ctx = TestContext::new().await;

        let seeded = ctx.permissions.initialize(&ctx.tenant).await?;
        assert_eq!(seeded, 0);

        let again = ctx.permissions.initialize(&ctx.tenant).await?;
        assert_eq!(again, 0);

        Ok(())
    }

    #[tokio::test]
    async fn list_permissions_contains_full_catalog() -> TestResult {
        let ctx = TestContext::new().await;

        let all = ctx.permissions.list_permissions(&ctx.tenant, None).await?;

        assert_eq!(all.len(), BUILT_IN_PERMISSIONS.len());

        let users_only = ctx
            .permissions
            .list_permissions(&ctx.tenant, Some("users"))
            .await?;

        assert!(!users_only.is_empty());
        assert!(users_only.iter().all(|p| p.module == "users"));

        Ok(())
    }

    #[tokio::test]
    async fn create_and_fetch_custom_permission() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx
            .permissions
            .create_permission(&ctx.tenant, custom_permission("custom_permission"))
            .await?;

        let fetched = ctx
            .permissions
            .get_permission_by_code(&ctx.tenant, "custom_permission")
            .await?;

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.module, "custom");

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_code_is_conflict() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.permissions
            .create_permission(&ctx.tenant, custom_permission("dupe"))
            .await?;

        let result = ctx
            .permissions
            .create_permission(&ctx.tenant, custom_permission("dupe"))
            .await;

        assert!(
            matches!(result, Err(PermissionsServiceError::Conflict)),
            "expected Conflict, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_code_collision_is_conflict() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.permissions
            .create_permission(&ctx.tenant, custom_permission("first"))
            .await?;

        let second = ctx
            .permissions
            .create_permission(&ctx.tenant, custom_permission("second"))
            .await?;

        let result = ctx
            .permissions
            .update_permission(
                &ctx.tenant,
                second.id,
                PermissionUpdate {
                    code: Some("first".to_string()),
                    ..PermissionUpdate::default()
                },
            )
            .await;

        assert!(
            matches!(result, Err(PermissionsServiceError::Conflict)),
            "expected Conflict, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_referenced_permission_is_blocked_until_revoked() -> TestResult {
        let ctx = TestContext::new().await;

        let permission = ctx
            .permissions
            .create_permission(&ctx.tenant, custom_permission("deletable"))
            .await?;

        let staff = ctx
            .roles
            .get_role_by_name(&ctx.tenant, STAFF_ROLE_NAME)
            .await?;

        ctx.roles
            .set_permissions(&ctx.tenant, staff.id, &[permission.id], &[])
            .await?;

        let blocked = ctx
            .permissions
            .delete_permission(&ctx.tenant, permission.id)
            .await;

        assert!(
            matches!(blocked, Err(PermissionsServiceError::Referenced)),
            "expected Referenced, got {blocked:?}"
        );

        ctx.roles
            .set_permissions(&ctx.tenant, staff.id, &[], &[permission.id])
            .await?;

        ctx.permissions
            .delete_permission(&ctx.tenant, permission.id)
            .await?;

        let result = ctx
            .permissions
            .get_permission(&ctx.tenant, permission.id)
            .await;

        assert!(
            matches!(result, Err(PermissionsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_unknown_permission_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .permissions
            .delete_permission(&ctx.tenant, PermissionUuid::generate())
            .await;

        assert!(
            matches!(result, Err(PermissionsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn catalogs_are_isolated_per_tenant() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.provision_company("Globex").await;
        let other_tenant = ctx.tenant_for(&other.company);

        ctx.permissions
            .create_permission(&ctx.tenant, custom_permission("only_here"))
            .await?;

        let result = ctx
            .permissions
            .get_permission_by_code(&other_tenant, "only_here")
            .await;

        assert!(
            matches!(result, Err(PermissionsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
