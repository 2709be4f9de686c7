//! Companies service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;

use crate::{
    companies::{
        errors::CompaniesServiceError,
        models::{Company, CompanyUpdate, CompanyUuid},
        repository::PgCompaniesRepository,
    },
    database::SchemaName,
};

#[derive(Debug, Clone)]
pub struct PgCompaniesService {
    repository: PgCompaniesRepository,
}

impl PgCompaniesService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgCompaniesRepository::new(pool),
        }
    }
}

#[async_trait]
impl CompaniesService for PgCompaniesService {
    async fn get_company(&self, id: CompanyUuid) -> Result<Company, CompaniesServiceError> {
        self.repository.get_company(id).await.map_err(Into::into)
    }

    async fn get_company_by_slug(&self, slug: &str) -> Result<Company, CompaniesServiceError> {
        self.repository
            .get_company_by_slug(slug)
            .await
            .map_err(Into::into)
    }

    async fn get_company_by_schema_name(
        &self,
        schema: &SchemaName,
    ) -> Result<Company, CompaniesServiceError> {
        self.repository
            .get_company_by_schema_name(schema)
            .await
            .map_err(Into::into)
    }

    async fn list_active_companies(&self) -> Result<Vec<Company>, CompaniesServiceError> {
        self.repository
            .list_active_companies()
            .await
            .map_err(Into::into)
    }

    async fn update_company(
        &self,
        id: CompanyUuid,
        update: CompanyUpdate,
    ) -> Result<Company, CompaniesServiceError> {
        self.repository
            .update_company(id, update)
            .await
            .map_err(Into::into)
    }

    async fn deactivate_company(&self, id: CompanyUuid) -> Result<(), CompaniesServiceError> {
        let rows_affected = self.repository.deactivate_company(id).await?;

        if rows_affected == 0 {
            return Err(CompaniesServiceError::NotFound);
        }

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Shared-scope company record operations.
///
/// Company creation is deliberately absent here: new companies only come
/// into existence through [`crate::provisioning::ProvisioningService`],
/// which creates the record and its schema atomically.
pub trait CompaniesService: Send + Sync {
    /// Fetch a company by id.
    async fn get_company(&self, id: CompanyUuid) -> Result<Company, CompaniesServiceError>;

    /// Fetch a company by its unique slug.
    async fn get_company_by_slug(&self, slug: &str) -> Result<Company, CompaniesServiceError>;

    /// Fetch the company owning a physical schema.
    async fn get_company_by_schema_name(
        &self,
        schema: &SchemaName,
    ) -> Result<Company, CompaniesServiceError>;

    /// List companies that have not been soft-deleted.
    async fn list_active_companies(&self) -> Result<Vec<Company>, CompaniesServiceError>;

    /// Apply a partial update. The schema name is never updatable.
    async fn update_company(
        &self,
        id: CompanyUuid,
        update: CompanyUpdate,
    ) -> Result<Company, CompaniesServiceError>;

    /// Soft-delete: mark the company inactive. The schema stays in place
    /// until an explicit [`crate::provisioning::ProvisioningService::drop_schema`].
    async fn deactivate_company(&self, id: CompanyUuid) -> Result<(), CompaniesServiceError>;
}
