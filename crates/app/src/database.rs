//! Database connection management and schema-scoped transactions.

use std::fmt::{Display, Formatter, Result as FmtResult};

use sqlx::{PgPool, Postgres, Transaction, query};
use thiserror::Error;

use crate::companies::models::CompanyUuid;

/// SQL used to bind the tenant schema for the current transaction.
///
/// `set_config(..., true)` makes the setting transaction-local, so the
/// binding disappears when the transaction commits or rolls back and can
/// never leak onto another request sharing the pool connection.
pub const SET_SEARCH_PATH_SQL: &str = "SELECT set_config('search_path', $1, true)";

const CREATE_SHARED_TABLES_SQL: &str = include_str!("sql/create_shared_tables.sql");

/// PostgreSQL identifier length limit.
const MAX_SCHEMA_NAME_LEN: usize = 63;

/// `3F000` invalid_schema_name, `42P01` undefined_table.
const SCHEMA_ABSENT_CODES: &[&str] = &["3F000", "42P01"];

/// Whether a storage error means the schema a query was bound to (or a table
/// inside it) no longer exists, as after a confirmed schema drop.
pub(crate) fn is_schema_absent(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| SCHEMA_ABSENT_CODES.contains(&code.as_ref()))
}

/// Names that must never be claimed by a tenant.
const RESERVED_SCHEMA_NAMES: &[&str] = &["public", "information_schema", "pg_catalog", "pg_toast"];

/// Why a candidate schema name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaNameError {
    #[error("schema name must be 1-{MAX_SCHEMA_NAME_LEN} characters long")]
    Length,

    #[error("schema name must start with a lowercase letter or underscore")]
    LeadingChar,

    #[error("schema name may only contain lowercase letters, digits, and underscores")]
    Charset,

    #[error("schema name is reserved")]
    Reserved,
}

/// A validated physical schema identifier.
///
/// This is the only type the crate ever splices into SQL text. Construction
/// rejects anything outside `[a-z_][a-z0-9_]*` (and the reserved PostgreSQL
/// namespaces), so interpolating a `SchemaName` into DDL is injection-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate and wrap a schema identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaNameError`] describing the first failed rule.
    pub fn new(name: impl Into<String>) -> Result<Self, SchemaNameError> {
        let name = name.into();

        if name.is_empty() || name.len() > MAX_SCHEMA_NAME_LEN {
            return Err(SchemaNameError::Length);
        }

        let mut chars = name.chars();

        // Checked against is_empty above.
        if let Some(first) = chars.next()
            && !(first.is_ascii_lowercase() || first == '_')
        {
            return Err(SchemaNameError::LeadingChar);
        }

        if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(SchemaNameError::Charset);
        }

        if RESERVED_SCHEMA_NAMES.contains(&name.as_str()) || name.starts_with("pg_") {
            return Err(SchemaNameError::Reserved);
        }

        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SchemaName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Request-local binding of one resolved tenant.
///
/// Produced by the directory resolver and carried explicitly through the
/// call chain of a single request; every tenant-scoped service method takes
/// one. There is deliberately no ambient/global current-tenant state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    company_id: CompanyUuid,
    schema: SchemaName,
}

impl TenantContext {
    #[must_use]
    pub fn new(company_id: CompanyUuid, schema: SchemaName) -> Self {
        Self { company_id, schema }
    }

    #[must_use]
    pub fn company_id(&self) -> CompanyUuid {
        self.company_id
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }
}

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a transaction with the default (shared-scope) search path.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction fails.
    pub async fn begin_transaction(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Begin a transaction whose unqualified table references resolve in the
    /// given tenant schema (falling back to `public` for shared tables).
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or binding the search
    /// path fails.
    pub async fn begin_schema_transaction(
        &self,
        schema: &SchemaName,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_SEARCH_PATH_SQL)
            .bind(format!("{schema}, public"))
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Create the shared-scope tables (`public.company`, `public.user_directory`)
/// when they are absent. Idempotent.
///
/// # Errors
///
/// Returns an error when the DDL fails.
pub async fn ensure_shared_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CREATE_SHARED_TABLES_SQL).execute(pool).await?;

    Ok(())
}
