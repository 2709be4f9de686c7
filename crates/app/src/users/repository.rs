//! Users Repository
//!
//! Statements run inside a schema-bound transaction; the `"user"` table
//! resolves in the caller's tenant schema.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    companies::models::CompanyUuid,
    roles::models::RoleUuid,
    users::models::{User, UserUpdate, UserUuid},
};

const CREATE_USER_SQL: &str = include_str!("sql/create_user.sql");
const GET_USER_SQL: &str = include_str!("sql/get_user.sql");
const GET_USER_BY_IDENTITY_SQL: &str = include_str!("sql/get_user_by_identity.sql");
const LIST_USERS_SQL: &str = include_str!("sql/list_users.sql");
const UPDATE_USER_IDENTITY_SQL: &str = include_str!("sql/update_user_identity.sql");
const SET_USER_ACTIVE_SQL: &str = include_str!("sql/set_user_active.sql");
const CHANGE_USER_ROLE_SQL: &str = include_str!("sql/change_user_role.sql");
const SET_REFRESH_TOKEN_SQL: &str = include_str!("sql/set_refresh_token.sql");
const RECORD_LOGIN_SQL: &str = include_str!("sql/record_login.sql");

/// Row payload for inserting a tenant user.
pub(crate) struct UserInsert<'a> {
    pub id: UserUuid,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role_id: RoleUuid,
    pub role_label: &'a str,
    pub company_id: CompanyUuid,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &UserInsert<'_>,
    ) -> Result<User, sqlx::Error> {
        query_as::<Postgres, User>(CREATE_USER_SQL)
            .bind(user.id.into_uuid())
            .bind(user.email)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.role_id.into_uuid())
            .bind(user.role_label)
            .bind(user.company_id.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: UserUuid,
    ) -> Result<User, sqlx::Error> {
        query_as::<Postgres, User>(GET_USER_SQL)
            .bind(id.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_user_by_identity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        query_as::<Postgres, User>(GET_USER_BY_IDENTITY_SQL)
            .bind(identity)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_users(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<User>, sqlx::Error> {
        query_as::<Postgres, User>(LIST_USERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_user_identity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: UserUuid,
        update: &UserUpdate,
    ) -> Result<User, sqlx::Error> {
        query_as::<Postgres, User>(UPDATE_USER_IDENTITY_SQL)
            .bind(id.into_uuid())
            .bind(update.email.as_deref())
            .bind(update.username.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_user_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: UserUuid,
        is_active: bool,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_USER_ACTIVE_SQL)
            .bind(id.into_uuid())
            .bind(is_active)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn change_user_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: UserUuid,
        role_id: RoleUuid,
        role_label: &str,
    ) -> Result<User, sqlx::Error> {
        query_as::<Postgres, User>(CHANGE_USER_ROLE_SQL)
            .bind(id.into_uuid())
            .bind(role_id.into_uuid())
            .bind(role_label)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_refresh_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: UserUuid,
        token: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_REFRESH_TOKEN_SQL)
            .bind(id.into_uuid())
            .bind(token)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn record_login(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RECORD_LOGIN_SQL)
            .bind(id.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: UserUuid::from_uuid(row.try_get("id")?),
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            hashed_password: row.try_get("hashed_password")?,
            role_id: RoleUuid::from_uuid(row.try_get::<Uuid, _>("role_id")?),
            role: row.try_get("role")?,
            is_active: row.try_get("is_active")?,
            refresh_token: row.try_get("refresh_token")?,
            last_login: row
                .try_get::<Option<SqlxTimestamp>, _>("last_login")?
                .map(SqlxTimestamp::to_jiff),
            company_id: CompanyUuid::from_uuid(row.try_get("company_id")?),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
