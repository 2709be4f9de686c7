//! Authorization guard.
//!
//! Read-only: the guard never mutates anything, so callers invoke it before
//! their own transaction and no partial application is possible.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    authz::errors::AuthzServiceError,
    database::{Db, TenantContext},
    roles::models::{ADMIN_ROLE_NAME, RoleUuid},
    users::models::UserUuid,
};

const GET_PRINCIPAL_ROLE_SQL: &str = include_str!("sql/get_principal_role.sql");
const ROLE_HAS_PERMISSION_SQL: &str = include_str!("sql/role_has_permission.sql");

/// A principal's resolved role, with the role row outer-joined so a dangling
/// reference is observable instead of a missing row.
#[derive(Debug, Clone)]
struct PrincipalRole {
    user_id: UserUuid,
    role_id: Option<RoleUuid>,
    role_name: Option<String>,
    is_system_role: bool,
}

impl<'r> FromRow<'r, PgRow> for PrincipalRole {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            user_id: UserUuid::from_uuid(row.try_get("user_id")?),
            role_id: row
                .try_get::<Option<Uuid>, _>("role_id")?
                .map(RoleUuid::from_uuid),
            role_name: row.try_get("role_name")?,
            is_system_role: row
                .try_get::<Option<bool>, _>("is_system_role")?
                .unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgAuthzService {
    db: Db,
}

impl PgAuthzService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthzService for PgAuthzService {
    async fn check(
        &self,
        tenant: &TenantContext,
        principal: UserUuid,
        required_code: &str,
    ) -> Result<bool, AuthzServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let Some(resolved) = query_as::<Postgres, PrincipalRole>(GET_PRINCIPAL_ROLE_SQL)
            .bind(principal.into_uuid())
            .fetch_optional(&mut *tx)
            .await?
        else {
            // The caller authenticated this principal, so an absent user row
            // means shared and tenant state disagree. Deny, don't crash.
            tracing::error!(
                %principal,
                schema = %tenant.schema(),
                "authenticated principal has no user row in tenant schema"
            );

            return Ok(false);
        };

        let Some(role_name) = resolved.role_name else {
            // Role-deletion preconditions should make this unreachable.
            tracing::error!(
                user = %resolved.user_id,
                role = ?resolved.role_id,
                schema = %tenant.schema(),
                "user references a role that no longer exists"
            );

            return Ok(false);
        };

        // ADMIN is the superset of all permissions, including codes created
        // after the tenant was provisioned; no join rows are consulted.
        if resolved.is_system_role && role_name == ADMIN_ROLE_NAME {
            return Ok(true);
        }

        // Outer join guarantees role_id is present when role_name is.
        let Some(role_id) = resolved.role_id else {
            return Ok(false);
        };

        let allowed = query_scalar::<Postgres, bool>(ROLE_HAS_PERMISSION_SQL)
            .bind(role_id.into_uuid())
            .bind(required_code)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(allowed)
    }

    async fn require(
        &self,
        tenant: &TenantContext,
        principal: UserUuid,
        required_code: &str,
    ) -> Result<(), AuthzServiceError> {
        if self.check(tenant, principal, required_code).await? {
            Ok(())
        } else {
            Err(AuthzServiceError::Forbidden)
        }
    }
}

#[automock]
#[async_trait]
/// Permission-check queries gating every protected operation.
pub trait AuthzService: Send + Sync {
    /// Does the principal's role grant `required_code`?
    ///
    /// ADMIN short-circuits to allow. A principal whose user row or role
    /// cannot be resolved is denied and the inconsistency is logged.
    async fn check(
        &self,
        tenant: &TenantContext,
        principal: UserUuid,
        required_code: &str,
    ) -> Result<bool, AuthzServiceError>;

    /// Like [`check`](AuthzService::check), but a denial is
    /// [`AuthzServiceError::Forbidden`], which is convenient before
    /// mutations.
    async fn require(
        &self,
        tenant: &TenantContext,
        principal: UserUuid,
        required_code: &str,
    ) -> Result<(), AuthzServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        permissions::{PermissionsService, models::NewPermission},
        roles::{RolesService, models::STAFF_ROLE_NAME},
        test::{TestContext, context::TEST_PASSWORD},
        users::{UsersService, credentials, models::NewUser},
    };

    use super::*;

    async fn staff_user(ctx: &TestContext) -> UserUuid {
        let staff = ctx
            .roles
            .get_role_by_name(&ctx.tenant, STAFF_ROLE_NAME)
            .await
            .expect("STAFF role should exist");

        ctx.users
            .create_user(
                &ctx.tenant,
                NewUser {
                    email: "worker@acme.test".to_string(),
                    username: "acme-worker".to_string(),
                    password_hash: credentials::hash_password(TEST_PASSWORD)
                        .expect("hashing should succeed"),
                    role_id: staff.id,
                },
            )
            .await
            .expect("user creation should succeed")
            .id
    }

    #[tokio::test]
    async fn admin_is_allowed_everything() -> TestResult {
        let ctx = TestContext::new().await;

        for code in ["users_create", "roles_delete", "permissions_update"] {
            assert!(
                ctx.authz.check(&ctx.tenant, ctx.admin.id, code).await?,
                "admin should hold {code}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn admin_is_allowed_codes_created_after_provisioning() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.permissions
            .create_permission(
                &ctx.tenant,
                NewPermission {
                    code: "reports_export".to_string(),
                    name: "Export reports".to_string(),
                    module: "reports".to_string(),
                    description: None,
                },
            )
            .await?;

        assert!(
            ctx.authz
                .check(&ctx.tenant, ctx.admin.id, "reports_export")
                .await?
        );

        Ok(())
    }

    #[tokio::test]
    async fn staff_is_denied_until_granted() -> TestResult {
        let ctx = TestContext::new().await;
        let principal = staff_user(&ctx).await;

        assert!(
            !ctx.authz
                .check(&ctx.tenant, principal, "users_create")
                .await?
        );

        let users_create = ctx
            .permissions
            .get_permission_by_code(&ctx.tenant, "users_create")
            .await?;
        let staff = ctx
            .roles
            .get_role_by_name(&ctx.tenant, STAFF_ROLE_NAME)
            .await?;

        ctx.roles
            .set_permissions(&ctx.tenant, staff.id, &[users_create.id], &[])
            .await?;

        assert!(
            ctx.authz
                .check(&ctx.tenant, principal, "users_create")
                .await?
        );

        // Other codes remain denied.
        assert!(
            !ctx.authz
                .check(&ctx.tenant, principal, "users_delete")
                .await?
        );

        Ok(())
    }

    #[tokio::test]
    async fn require_maps_denial_to_forbidden() -> TestResult {
        let ctx = TestContext::new().await;
        let principal = staff_user(&ctx).await;

        let result = ctx
            .authz
            .require(&ctx.tenant, principal, "users_create")
            .await;

        assert!(
            matches!(result, Err(AuthzServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        ctx.authz
            .require(&ctx.tenant, ctx.admin.id, "users_create")
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn unknown_principal_is_denied_not_an_error() -> TestResult {
        let ctx = TestContext::new().await;

        let allowed = ctx
            .authz
            .check(&ctx.tenant, UserUuid::generate(), "users_create")
            .await?;

        assert!(!allowed);

        Ok(())
    }

    #[tokio::test]
    async fn principal_from_another_tenant_is_denied() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.provision_company("Globex").await;
        let other_tenant = ctx.tenant_for(&other.company);

        // The Acme admin id does not resolve inside Globex's schema.
        let allowed = ctx
            .authz
            .check(&other_tenant, ctx.admin.id, "users_create")
            .await?;

        assert!(!allowed);

        Ok(())
    }
}
