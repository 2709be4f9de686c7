//! Directory Repository
//!
//! Stateless and transaction-scoped so the provisioning and user-management
//! paths can enlist directory writes in their own transactions.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    companies::{models::CompanyUuid, repository::try_get_schema_name},
    database::SchemaName,
    directory::models::{DirectoryEntry, DirectoryEntryUuid, NewDirectoryEntry},
};

const RESOLVE_IDENTITY_SQL: &str = include_str!("sql/resolve_identity.sql");
const REGISTER_ENTRY_SQL: &str = include_str!("sql/register_entry.sql");
const UPDATE_SCHEMA_BINDING_SQL: &str = include_str!("sql/update_schema_binding.sql");
const PURGE_COMPANY_ENTRIES_SQL: &str = include_str!("sql/purge_company_entries.sql");
const COUNT_ENTRIES_BY_SCHEMA_SQL: &str = include_str!("sql/count_entries_by_schema.sql");
const UPDATE_ENTRY_IDENTITY_SQL: &str = include_str!("sql/update_entry_identity.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDirectoryRepository;

impl PgDirectoryRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn resolve_identity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &str,
    ) -> Result<Option<DirectoryEntry>, sqlx::Error> {
        query_as::<Postgres, DirectoryEntry>(RESOLVE_IDENTITY_SQL)
            .bind(identity)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn register_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &NewDirectoryEntry,
    ) -> Result<DirectoryEntry, sqlx::Error> {
        query_as::<Postgres, DirectoryEntry>(REGISTER_ENTRY_SQL)
            .bind(entry.id.into_uuid())
            .bind(&entry.email)
            .bind(&entry.username)
            .bind(entry.company_id.into_uuid())
            .bind(entry.schema_name.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_schema_binding(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        schema: &SchemaName,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_SCHEMA_BINDING_SQL)
            .bind(company.into_uuid())
            .bind(schema.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn purge_company_entries(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(PURGE_COMPANY_ENTRIES_SQL)
            .bind(company.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn count_entries_by_schema(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        schema: &SchemaName,
    ) -> Result<i64, sqlx::Error> {
        query_scalar::<Postgres, i64>(COUNT_ENTRIES_BY_SCHEMA_SQL)
            .bind(schema.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    /// Re-point the entry currently registered under `current_email` at new
    /// identity fields. Used when a tenant user's email/username changes.
    pub(crate) async fn update_entry_identity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        current_email: &str,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_ENTRY_IDENTITY_SQL)
            .bind(current_email)
            .bind(email)
            .bind(username)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for DirectoryEntry {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: DirectoryEntryUuid::from_uuid(row.try_get("id")?),
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            company_id: CompanyUuid::from_uuid(row.try_get("company_id")?),
            schema_name: try_get_schema_name(row, "schema_name")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
