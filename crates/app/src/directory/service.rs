//! Directory service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    companies::models::CompanyUuid,
    database::{Db, SchemaName, TenantContext},
    directory::{
        errors::DirectoryServiceError,
        models::{DirectoryEntry, NewDirectoryEntry},
        repository::PgDirectoryRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgDirectoryService {
    db: Db,
    repository: PgDirectoryRepository,
}

impl PgDirectoryService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgDirectoryRepository::new(),
        }
    }
}

#[async_trait]
impl DirectoryService for PgDirectoryService {
    async fn resolve(&self, identity: &str) -> Result<DirectoryEntry, DirectoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let entry = self
            .repository
            .resolve_identity(&mut tx, identity)
            .await?
            .ok_or(DirectoryServiceError::NotFound)?;

        tx.commit().await?;

        Ok(entry)
    }

    async fn resolve_tenant(&self, identity: &str) -> Result<TenantContext, DirectoryServiceError> {
        let entry = self.resolve(identity).await?;

        Ok(TenantContext::new(entry.company_id, entry.schema_name))
    }

    async fn register(
        &self,
        entry: NewDirectoryEntry,
    ) -> Result<DirectoryEntry, DirectoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        // No pre-check: the unique indexes on email/username are the
        // authority, so two concurrent registrations cannot both win.
        let registered = self.repository.register_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        Ok(registered)
    }

    async fn update_schema_binding(
        &self,
        company: CompanyUuid,
        schema: &SchemaName,
    ) -> Result<u64, DirectoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rebound = self
            .repository
            .update_schema_binding(&mut tx, company, schema)
            .await?;

        tx.commit().await?;

        Ok(rebound)
    }

    async fn purge_company_entries(
        &self,
        company: CompanyUuid,
    ) -> Result<u64, DirectoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let purged = self
            .repository
            .purge_company_entries(&mut tx, company)
            .await?;

        tx.commit().await?;

        Ok(purged)
    }
}

#[automock]
#[async_trait]
/// Global identity → tenant resolution and registration.
pub trait DirectoryService: Send + Sync {
    /// Look up the directory entry for an email or username.
    async fn resolve(&self, identity: &str) -> Result<DirectoryEntry, DirectoryServiceError>;

    /// Resolve an identity straight to a request-scoped [`TenantContext`].
    async fn resolve_tenant(&self, identity: &str) -> Result<TenantContext, DirectoryServiceError>;

    /// Register a new identity. Fails with
    /// [`DirectoryServiceError::Conflict`] when the email or username is
    /// taken anywhere in the system, regardless of tenant.
    async fn register(
        &self,
        entry: NewDirectoryEntry,
    ) -> Result<DirectoryEntry, DirectoryServiceError>;

    /// Re-point every entry of a company at the authoritative schema name.
    /// Invoked by the schema provisioner only; returns the number of
    /// entries rebound.
    async fn update_schema_binding(
        &self,
        company: CompanyUuid,
        schema: &SchemaName,
    ) -> Result<u64, DirectoryServiceError>;

    /// Remove every directory entry of a company. The required prerequisite
    /// for [`crate::provisioning::ProvisioningService::drop_schema`];
    /// returns the number of entries removed.
    async fn purge_company_entries(
        &self,
        company: CompanyUuid,
    ) -> Result<u64, DirectoryServiceError>;
}
