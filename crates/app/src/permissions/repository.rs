//! Permissions Repository
//!
//! All statements run inside a schema-bound transaction, so the unqualified
//! `permission` table always resolves in the caller's tenant schema.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::permissions::{
    catalog::CatalogPermission,
    models::{NewPermission, Permission, PermissionUpdate, PermissionUuid},
};

const SEED_PERMISSION_SQL: &str = include_str!("sql/seed_permission.sql");
const CREATE_PERMISSION_SQL: &str = include_str!("sql/create_permission.sql");
const LIST_PERMISSIONS_SQL: &str = include_str!("sql/list_permissions.sql");
const GET_PERMISSION_SQL: &str = include_str!("sql/get_permission.sql");
const GET_PERMISSION_BY_CODE_SQL: &str = include_str!("sql/get_permission_by_code.sql");
const UPDATE_PERMISSION_SQL: &str = include_str!("sql/update_permission.sql");
const DELETE_PERMISSION_SQL: &str = include_str!("sql/delete_permission.sql");
const COUNT_ROLES_WITH_PERMISSION_SQL: &str = include_str!("sql/count_roles_with_permission.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPermissionsRepository;

impl PgPermissionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert one catalog entry, skipping silently when the code exists.
    /// Returns whether a row was inserted.
    pub(crate) async fn seed_permission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        definition: &CatalogPermission,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(SEED_PERMISSION_SQL)
            .bind(PermissionUuid::generate().into_uuid())
            .bind(definition.code)
            .bind(definition.name)
            .bind(definition.module)
            .bind(definition.description)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub(crate) async fn create_permission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        permission: &NewPermission,
    ) -> Result<Permission, sqlx::Error> {
        query_as::<Postgres, Permission>(CREATE_PERMISSION_SQL)
            .bind(PermissionUuid::generate().into_uuid())
            .bind(&permission.code)
            .bind(&permission.name)
            .bind(&permission.module)
            .bind(permission.description.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        module: Option<&str>,
    ) -> Result<Vec<Permission>, sqlx::Error> {
        query_as::<Postgres, Permission>(LIST_PERMISSIONS_SQL)
            .bind(module)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_permission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: PermissionUuid,
    ) -> Result<Permission, sqlx::Error> {
        query_as::<Postgres, Permission>(GET_PERMISSION_SQL)
            .bind(id.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_permission_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Permission, sqlx::Error> {
        query_as::<Postgres, Permission>(GET_PERMISSION_BY_CODE_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_permission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: PermissionUuid,
        update: &PermissionUpdate,
    ) -> Result<Permission, sqlx::Error> {
        query_as::<Postgres, Permission>(UPDATE_PERMISSION_SQL)
            .bind(id.into_uuid())
            .bind(update.code.as_deref())
            .bind(update.name.as_deref())
            .bind(update.module.as_deref())
            .bind(update.description.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_permission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: PermissionUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PERMISSION_SQL)
            .bind(id.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn count_roles_with_permission(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: PermissionUuid,
    ) -> Result<i64, sqlx::Error> {
        query_scalar::<Postgres, i64>(COUNT_ROLES_WITH_PERMISSION_SQL)
            .bind(id.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Permission {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: PermissionUuid::from_uuid(row.try_get("id")?),
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            module: row.try_get("module")?,
            description: row.try_get("description")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
