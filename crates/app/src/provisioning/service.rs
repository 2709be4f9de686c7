//! Provisioning service.
//!
//! Provisioning runs as one transaction spanning the company insert, the
//! schema and table DDL, the catalog and role seeds, and the admin user and
//! directory registration. PostgreSQL DDL is transactional, so a failure on
//! any step rolls the whole thing back with no half-created schema and no
//! orphaned directory entry.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use sqlx::query;
use uuid::Uuid;

use crate::{
    companies::models::{CompanyUuid, NewCompany},
    database::{Db, SET_SEARCH_PATH_SQL},
    directory::{
        models::{DirectoryEntryUuid, NewDirectoryEntry},
        repository::PgDirectoryRepository,
    },
    permissions::{catalog::BUILT_IN_PERMISSIONS, repository::PgPermissionsRepository},
    provisioning::{
        errors::ProvisioningServiceError,
        models::{NewAdminUser, ProvisionedCompany},
        naming::{derive_schema_name, slugify},
        repository::PgProvisioningRepository,
    },
    roles::{
        models::{ADMIN_ROLE_NAME, NewRole, STAFF_ROLE_NAME},
        repository::PgRolesRepository,
    },
    users::{
        models::UserUuid,
        repository::{PgUsersRepository, UserInsert},
    },
};

/// Company ids with a provision or drop currently running in this process.
/// Guards the §provision/§drop mutual exclusion without holding a database
/// lock across the whole DDL.
#[derive(Debug, Clone, Default)]
struct InFlightCompanies(Arc<Mutex<FxHashSet<Uuid>>>);

impl InFlightCompanies {
    fn try_begin(&self, company: Uuid) -> Option<InFlightGuard> {
        let mut inner = self.0.lock().unwrap_or_else(PoisonError::into_inner);

        inner
            .insert(company)
            .then(|| InFlightGuard {
                companies: Arc::clone(&self.0),
                company,
            })
    }
}

/// Releases the in-flight slot on every exit path, including panics.
struct InFlightGuard {
    companies: Arc<Mutex<FxHashSet<Uuid>>>,
    company: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.companies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.company);
    }
}

#[derive(Debug, Clone)]
pub struct PgProvisioningService {
    db: Db,
    repository: PgProvisioningRepository,
    permissions: PgPermissionsRepository,
    roles: PgRolesRepository,
    users: PgUsersRepository,
    directory: PgDirectoryRepository,
    in_flight: InFlightCompanies,
}

impl PgProvisioningService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProvisioningRepository::new(),
            permissions: PgPermissionsRepository::new(),
            roles: PgRolesRepository::new(),
            users: PgUsersRepository::new(),
            directory: PgDirectoryRepository::new(),
            in_flight: InFlightCompanies::default(),
        }
    }
}

#[async_trait]
impl ProvisioningService for PgProvisioningService {
    async fn provision(
        &self,
        company: NewCompany,
        admin: NewAdminUser,
    ) -> Result<ProvisionedCompany, ProvisioningServiceError> {
        let slug = match &company.slug {
            Some(slug) => slugify(slug),
            None => slugify(&company.name),
        };

        let schema = derive_schema_name(&slug)?;
        let company_id = CompanyUuid::generate();

        let _guard = self
            .in_flight
            .try_begin(company_id.into_uuid())
            .ok_or(ProvisioningServiceError::InFlight)?;

        let mut tx = self.db.begin_transaction().await?;

        // Early, readable rejections; the unique constraints on slug and
        // schema_name remain the authority if a concurrent provision wins
        // the race after these checks.
        if self
            .repository
            .company_identifiers_taken(&mut tx, &slug, &schema)
            .await?
            || self.repository.schema_exists(&mut tx, &schema).await?
        {
            return Err(ProvisioningServiceError::Conflict);
        }

        let created = self
            .repository
            .insert_company(&mut tx, company_id, &company, &slug, &schema)
            .await?;

        self.repository.create_schema(&mut tx, &schema).await?;

        // From here on, unqualified tables resolve in the new schema.
        query(SET_SEARCH_PATH_SQL)
            .bind(format!("{schema}, public"))
            .execute(&mut *tx)
            .await?;

        self.repository.create_tenant_tables(&mut tx).await?;

        let mut seeded_permissions = 0;

        for definition in BUILT_IN_PERMISSIONS {
            if self.permissions.seed_permission(&mut tx, definition).await? {
                seeded_permissions += 1;
            }
        }

        let admin_role = self
            .roles
            .create_role(
                &mut tx,
                &NewRole {
                    name: ADMIN_ROLE_NAME.to_string(),
                    description: Some("Full access to every operation".to_string()),
                    permission_ids: Vec::new(),
                },
                true,
            )
            .await?;

        self.roles
            .create_role(
                &mut tx,
                &NewRole {
                    name: STAFF_ROLE_NAME.to_string(),
                    description: Some("Default role with no permissions".to_string()),
                    permission_ids: Vec::new(),
                },
                true,
            )
            .await?;

        self.repository
            .grant_all_permissions(&mut tx, admin_role.id)
            .await?;

        let admin_user = self
            .users
            .create_user(
                &mut tx,
                &UserInsert {
                    id: UserUuid::generate(),
                    email: &admin.email,
                    username: &admin.username,
                    password_hash: &admin.password_hash,
                    role_id: admin_role.id,
                    role_label: ADMIN_ROLE_NAME,
                    company_id,
                },
            )
            .await?;

        self.directory
            .register_entry(
                &mut tx,
                &NewDirectoryEntry {
                    id: DirectoryEntryUuid::generate(),
                    email: admin.email.clone(),
                    username: admin.username.clone(),
                    company_id,
                    schema_name: schema.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            company = %company_id,
            schema = %schema,
            seeded_permissions,
            "provisioned tenant"
        );

        Ok(ProvisionedCompany {
            company: created,
            admin_user,
            seeded_permissions,
        })
    }

    async fn drop_schema(
        &self,
        company_id: CompanyUuid,
        confirm: bool,
    ) -> Result<(), ProvisioningServiceError> {
        let _guard = self
            .in_flight
            .try_begin(company_id.into_uuid())
            .ok_or(ProvisioningServiceError::InFlight)?;

        if !confirm {
            return Err(ProvisioningServiceError::PreconditionFailed);
        }

        let mut tx = self.db.begin_transaction().await?;

        let company = self.repository.get_company(&mut tx, company_id).await?;

        // Cleanup ordering: purge the directory first, then drop. The drop
        // never deletes directory rows itself, since in degenerate data
        // states a schema may be referenced by more than one company.
        let remaining = self
            .directory
            .count_entries_by_schema(&mut tx, &company.schema_name)
            .await?;

        if remaining > 0 {
            return Err(ProvisioningServiceError::DirectoryNotEmpty);
        }

        self.repository
            .drop_schema(&mut tx, &company.schema_name)
            .await?;

        tx.commit().await?;

        tracing::warn!(
            company = %company_id,
            schema = %company.schema_name,
            "dropped tenant schema"
        );

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Tenant lifecycle: schema creation with its full seed, and guarded,
/// irreversible teardown.
pub trait ProvisioningService: Send + Sync {
    /// Create the company record, its physical schema and tables, the
    /// seeded catalog, the ADMIN/STAFF system roles, the admin user, and
    /// the admin's directory entry, all in a single transaction.
    async fn provision(
        &self,
        company: NewCompany,
        admin: NewAdminUser,
    ) -> Result<ProvisionedCompany, ProvisioningServiceError>;

    /// Irreversibly drop the tenant schema and everything in it.
    ///
    /// Requires `confirm == true`
    /// ([`ProvisioningServiceError::PreconditionFailed`] otherwise) and an
    /// already-purged directory
    /// ([`ProvisioningServiceError::DirectoryNotEmpty`] otherwise). The
    /// company row survives; soft-delete is a separate operation.
    async fn drop_schema(
        &self,
        company_id: CompanyUuid,
        confirm: bool,
    ) -> Result<(), ProvisioningServiceError>;
}
