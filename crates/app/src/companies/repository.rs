//! Companies Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as};

use crate::{
    companies::models::{Company, CompanyUpdate, CompanyUuid},
    database::SchemaName,
};

const GET_COMPANY_SQL: &str = include_str!("sql/get_company.sql");
const GET_COMPANY_BY_SLUG_SQL: &str = include_str!("sql/get_company_by_slug.sql");
const GET_COMPANY_BY_SCHEMA_NAME_SQL: &str = include_str!("sql/get_company_by_schema_name.sql");
const LIST_ACTIVE_COMPANIES_SQL: &str = include_str!("sql/list_active_companies.sql");
const UPDATE_COMPANY_SQL: &str = include_str!("sql/update_company.sql");
const DEACTIVATE_COMPANY_SQL: &str = include_str!("sql/deactivate_company.sql");

/// PostgreSQL-backed companies repository.
#[derive(Debug, Clone)]
pub(crate) struct PgCompaniesRepository {
    pool: PgPool,
}

impl PgCompaniesRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn get_company(&self, id: CompanyUuid) -> Result<Company, sqlx::Error> {
        query_as::<Postgres, Company>(GET_COMPANY_SQL)
            .bind(id.into_uuid())
            .fetch_one(&self.pool)
            .await
    }

    pub(crate) async fn get_company_by_slug(&self, slug: &str) -> Result<Company, sqlx::Error> {
        query_as::<Postgres, Company>(GET_COMPANY_BY_SLUG_SQL)
            .bind(slug)
            .fetch_one(&self.pool)
            .await
    }

    pub(crate) async fn get_company_by_schema_name(
        &self,
        schema: &SchemaName,
    ) -> Result<Company, sqlx::Error> {
        query_as::<Postgres, Company>(GET_COMPANY_BY_SCHEMA_NAME_SQL)
            .bind(schema.as_str())
            .fetch_one(&self.pool)
            .await
    }

    pub(crate) async fn list_active_companies(&self) -> Result<Vec<Company>, sqlx::Error> {
        query_as::<Postgres, Company>(LIST_ACTIVE_COMPANIES_SQL)
            .fetch_all(&self.pool)
            .await
    }

    pub(crate) async fn update_company(
        &self,
        id: CompanyUuid,
        update: CompanyUpdate,
    ) -> Result<Company, sqlx::Error> {
        query_as::<Postgres, Company>(UPDATE_COMPANY_SQL)
            .bind(id.into_uuid())
            .bind(update.name)
            .bind(update.display_name)
            .bind(update.description)
            .bind(update.contact_name)
            .bind(update.email)
            .bind(update.phone)
            .bind(update.address)
            .fetch_one(&self.pool)
            .await
    }

    pub(crate) async fn deactivate_company(&self, id: CompanyUuid) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DEACTIVATE_COMPANY_SQL)
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Company {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: CompanyUuid::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            schema_name: try_get_schema_name(row, "schema_name")?,
            display_name: row.try_get("display_name")?,
            description: row.try_get("description")?,
            contact_name: row.try_get("contact_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

/// Decode a stored schema name back into the validated newtype. A stored
/// value that fails validation indicates corrupted shared-scope data.
pub(crate) fn try_get_schema_name(row: &PgRow, col: &str) -> Result<SchemaName, sqlx::Error> {
    let raw: String = row.try_get(col)?;

    SchemaName::new(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}
