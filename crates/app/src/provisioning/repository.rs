//! Provisioning Repository
//!
//! The DDL here is the one place the crate splices an identifier into SQL
//! text; [`SchemaName`]'s validation is what makes that safe.

use sqlx::{Executor, Postgres, Transaction, query, query_as, query_scalar};

use crate::{
    companies::models::{Company, CompanyUuid, NewCompany},
    database::SchemaName,
    roles::models::RoleUuid,
};

const INSERT_COMPANY_SQL: &str = include_str!("sql/insert_company.sql");
const GET_COMPANY_SQL: &str = include_str!("sql/get_company.sql");
const SCHEMA_EXISTS_SQL: &str = include_str!("sql/schema_exists.sql");
const COMPANY_IDENTIFIERS_TAKEN_SQL: &str = include_str!("sql/company_identifiers_taken.sql");
const CREATE_TENANT_TABLES_SQL: &str = include_str!("sql/create_tenant_tables.sql");
const GRANT_ALL_PERMISSIONS_SQL: &str = include_str!("sql/grant_all_permissions.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProvisioningRepository;

impl PgProvisioningRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_company(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: CompanyUuid,
        company: &NewCompany,
        slug: &str,
        schema: &SchemaName,
    ) -> Result<Company, sqlx::Error> {
        query_as::<Postgres, Company>(INSERT_COMPANY_SQL)
            .bind(id.into_uuid())
            .bind(&company.name)
            .bind(slug)
            .bind(schema.as_str())
            .bind(company.display_name.as_deref())
            .bind(company.description.as_deref())
            .bind(company.contact_name.as_deref())
            .bind(company.email.as_deref())
            .bind(company.phone.as_deref())
            .bind(company.address.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_company(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: CompanyUuid,
    ) -> Result<Company, sqlx::Error> {
        query_as::<Postgres, Company>(GET_COMPANY_SQL)
            .bind(id.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Whether a physical schema with this name already exists, regardless
    /// of whether any company row claims it.
    pub(crate) async fn schema_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        schema: &SchemaName,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(SCHEMA_EXISTS_SQL)
            .bind(schema.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn company_identifiers_taken(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        slug: &str,
        schema: &SchemaName,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(COMPANY_IDENTIFIERS_TAKEN_SQL)
            .bind(slug)
            .bind(schema.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_schema(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        schema: &SchemaName,
    ) -> Result<(), sqlx::Error> {
        query(&format!(r#"CREATE SCHEMA "{schema}""#))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Create the fixed tenant table set. Must run after the transaction's
    /// search path has been bound to the new schema.
    pub(crate) async fn create_tenant_tables(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<(), sqlx::Error> {
        // Calling through `Executor::execute` instead of `RawSql::execute`
        // sidesteps a rustc "implementation of `Executor` is not general
        // enough" false positive when this future is awaited inside an
        // `async_trait` method.
        (&mut **tx).execute(sqlx::raw_sql(CREATE_TENANT_TABLES_SQL)).await?;

        Ok(())
    }

    /// Grant every permission currently in the tenant catalog to a role.
    pub(crate) async fn grant_all_permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: RoleUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(GRANT_ALL_PERMISSIONS_SQL)
            .bind(role.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn drop_schema(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        schema: &SchemaName,
    ) -> Result<(), sqlx::Error> {
        query(&format!(r#"DROP SCHEMA IF EXISTS "{schema}" CASCADE"#))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
