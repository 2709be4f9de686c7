//! Roles Repository
//!
//! Statements run inside a schema-bound transaction; `role`,
//! `role_permissions`, and `"user"` resolve in the caller's tenant schema.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    permissions::models::{Permission, PermissionUuid},
    roles::models::{NewRole, Role, RoleUpdate, RoleUuid},
};

const CREATE_ROLE_SQL: &str = include_str!("sql/create_role.sql");
const GET_ROLE_SQL: &str = include_str!("sql/get_role.sql");
const GET_ROLE_BY_NAME_SQL: &str = include_str!("sql/get_role_by_name.sql");
const LIST_ROLES_SQL: &str = include_str!("sql/list_roles.sql");
const LIST_ROLE_PERMISSIONS_SQL: &str = include_str!("sql/list_role_permissions.sql");
const UPDATE_ROLE_SQL: &str = include_str!("sql/update_role.sql");
const ADD_ROLE_PERMISSIONS_SQL: &str = include_str!("sql/add_role_permissions.sql");
const REMOVE_ROLE_PERMISSIONS_SQL: &str = include_str!("sql/remove_role_permissions.sql");
const COUNT_EXISTING_PERMISSIONS_SQL: &str = include_str!("sql/count_existing_permissions.sql");
const COUNT_USERS_WITH_ROLE_SQL: &str = include_str!("sql/count_users_with_role.sql");
const DELETE_ROLE_SQL: &str = include_str!("sql/delete_role.sql");
const UPDATE_USER_ROLE_LABELS_SQL: &str = include_str!("sql/update_user_role_labels.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRolesRepository;

impl PgRolesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: &NewRole,
        is_system_role: bool,
    ) -> Result<Role, sqlx::Error> {
        query_as::<Postgres, Role>(CREATE_ROLE_SQL)
            .bind(RoleUuid::generate().into_uuid())
            .bind(&role.name)
            .bind(role.description.as_deref())
            .bind(is_system_role)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: RoleUuid,
    ) -> Result<Role, sqlx::Error> {
        query_as::<Postgres, Role>(GET_ROLE_SQL)
            .bind(id.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_role_by_name(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<Role, sqlx::Error> {
        query_as::<Postgres, Role>(GET_ROLE_BY_NAME_SQL)
            .bind(name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_roles(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Role>, sqlx::Error> {
        query_as::<Postgres, Role>(LIST_ROLES_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_role_permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: RoleUuid,
    ) -> Result<Vec<Permission>, sqlx::Error> {
        query_as::<Postgres, Permission>(LIST_ROLE_PERMISSIONS_SQL)
            .bind(role.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: RoleUuid,
        update: &RoleUpdate,
    ) -> Result<Role, sqlx::Error> {
        query_as::<Postgres, Role>(UPDATE_ROLE_SQL)
            .bind(id.into_uuid())
            .bind(update.name.as_deref())
            .bind(update.description.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    /// Grant permissions; already-granted ids are a no-op via
    /// `ON CONFLICT DO NOTHING`.
    pub(crate) async fn add_role_permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: RoleUuid,
        permission_ids: &[PermissionUuid],
    ) -> Result<u64, sqlx::Error> {
        let ids: Vec<Uuid> = permission_ids.iter().map(|id| id.into_uuid()).collect();

        let rows_affected = query(ADD_ROLE_PERMISSIONS_SQL)
            .bind(role.into_uuid())
            .bind(&ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Revoke permissions; ids not currently granted are a no-op.
    pub(crate) async fn remove_role_permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: RoleUuid,
        permission_ids: &[PermissionUuid],
    ) -> Result<u64, sqlx::Error> {
        let ids: Vec<Uuid> = permission_ids.iter().map(|id| id.into_uuid()).collect();

        let rows_affected = query(REMOVE_ROLE_PERMISSIONS_SQL)
            .bind(role.into_uuid())
            .bind(&ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// How many of the given ids exist in this tenant's permission table.
    pub(crate) async fn count_existing_permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        permission_ids: &[PermissionUuid],
    ) -> Result<i64, sqlx::Error> {
        let ids: Vec<Uuid> = permission_ids.iter().map(|id| id.into_uuid()).collect();

        query_scalar::<Postgres, i64>(COUNT_EXISTING_PERMISSIONS_SQL)
            .bind(&ids)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn count_users_with_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: RoleUuid,
    ) -> Result<i64, sqlx::Error> {
        query_scalar::<Postgres, i64>(COUNT_USERS_WITH_ROLE_SQL)
            .bind(role.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: RoleUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ROLE_SQL)
            .bind(id.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Keep the denormalized `user.role` label in step with a rename.
    pub(crate) async fn update_user_role_labels(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: RoleUuid,
        label: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_USER_ROLE_LABELS_SQL)
            .bind(role.into_uuid())
            .bind(label)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Role {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: RoleUuid::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            is_system_role: row.try_get("is_system_role")?,
            // Attached by the service from list_role_permissions.
            permissions: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
