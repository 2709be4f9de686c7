//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    authz::{AuthzService, PgAuthzService},
    companies::{CompaniesService, PgCompaniesService},
    database::{self, Db},
    directory::{DirectoryService, PgDirectoryService},
    permissions::{PermissionsService, PgPermissionsService},
    provisioning::{PgProvisioningService, ProvisioningService},
    roles::{PgRolesService, RolesService},
    users::{PgUsersService, UsersService},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub companies: Arc<dyn CompaniesService>,
    pub directory: Arc<dyn DirectoryService>,
    pub provisioning: Arc<dyn ProvisioningService>,
    pub permissions: Arc<dyn PermissionsService>,
    pub roles: Arc<dyn RolesService>,
    pub users: Arc<dyn UsersService>,
    pub authz: Arc<dyn AuthzService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// Connects and makes sure the shared-scope tables exist before any
    /// service is handed out.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::ensure_shared_tables(&pool)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool.clone());

        Ok(Self {
            companies: Arc::new(PgCompaniesService::new(pool)),
            directory: Arc::new(PgDirectoryService::new(db.clone())),
            provisioning: Arc::new(PgProvisioningService::new(db.clone())),
            permissions: Arc::new(PgPermissionsService::new(db.clone())),
            roles: Arc::new(PgRolesService::new(db.clone())),
            users: Arc::new(PgUsersService::new(db.clone())),
            authz: Arc::new(PgAuthzService::new(db)),
        })
    }
}
