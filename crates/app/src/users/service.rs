//! Users service.
//!
//! User creation and identity updates span two scopes in one transaction:
//! the tenant's `"user"` table and the shared `public.user_directory`. The
//! directory's unique indexes are the global gate on identities, so a lost
//! race anywhere surfaces as Conflict rather than partial state.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::{Db, TenantContext},
    directory::{
        models::{DirectoryEntryUuid, NewDirectoryEntry},
        repository::PgDirectoryRepository,
    },
    roles::{models::RoleUuid, repository::PgRolesRepository},
    users::{
        credentials,
        errors::UsersServiceError,
        models::{NewUser, User, UserUpdate, UserUuid},
        repository::{PgUsersRepository, UserInsert},
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
    roles: PgRolesRepository,
    directory: PgDirectoryRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
            roles: PgRolesRepository::new(),
            directory: PgDirectoryRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn create_user(
        &self,
        tenant: &TenantContext,
        user: NewUser,
    ) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let role = self
            .roles
            .get_role(&mut tx, user.role_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => UsersServiceError::RoleNotFound,
                other => other.into(),
            })?;

        // Directory first: its unique indexes decide globally whether the
        // identity is free, before any tenant row exists.
        self.directory
            .register_entry(
                &mut tx,
                &NewDirectoryEntry {
                    id: DirectoryEntryUuid::generate(),
                    email: user.email.clone(),
                    username: user.username.clone(),
                    company_id: tenant.company_id(),
                    schema_name: tenant.schema().clone(),
                },
            )
            .await?;

        let created = self
            .repository
            .create_user(
                &mut tx,
                &UserInsert {
                    id: UserUuid::generate(),
                    email: &user.email,
                    username: &user.username,
                    password_hash: &user.password_hash,
                    role_id: role.id,
                    role_label: &role.name,
                    company_id: tenant.company_id(),
                },
            )
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_user(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
    ) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let user = self.repository.get_user(&mut tx, id).await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn get_user_by_identity(
        &self,
        tenant: &TenantContext,
        identity: &str,
    ) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let user = self
            .repository
            .get_user_by_identity(&mut tx, identity)
            .await?
            .ok_or(UsersServiceError::NotFound)?;

        tx.commit().await?;

        Ok(user)
    }

    async fn list_users(&self, tenant: &TenantContext) -> Result<Vec<User>, UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let users = self.repository.list_users(&mut tx).await?;

        tx.commit().await?;

        Ok(users)
    }

    async fn update_user(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
        update: UserUpdate,
    ) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let current = self.repository.get_user(&mut tx, id).await?;

        let updated = self
            .repository
            .update_user_identity(&mut tx, id, &update)
            .await?;

        // Keep the shared directory in step with the tenant row.
        self.directory
            .update_entry_identity(
                &mut tx,
                &current.email,
                update.email.as_deref(),
                update.username.as_deref(),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn set_user_active(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
        is_active: bool,
    ) -> Result<(), UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let rows_affected = self.repository.set_user_active(&mut tx, id, is_active).await?;

        if rows_affected == 0 {
            return Err(UsersServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn change_user_role(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
        role_id: RoleUuid,
    ) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let role = self
            .roles
            .get_role(&mut tx, role_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => UsersServiceError::RoleNotFound,
                other => other.into(),
            })?;

        let updated = self
            .repository
            .change_user_role(&mut tx, id, role.id, &role.name)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn authenticate(
        &self,
        tenant: &TenantContext,
        identity: &str,
        password: &str,
    ) -> Result<Option<User>, UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let Some(user) = self
            .repository
            .get_user_by_identity(&mut tx, identity)
            .await?
        else {
            return Ok(None);
        };

        if !user.is_active {
            return Ok(None);
        }

        if !credentials::verify_password(password, &user.hashed_password)? {
            return Ok(None);
        }

        self.repository.record_login(&mut tx, user.id).await?;

        tx.commit().await?;

        Ok(Some(user))
    }

    async fn rotate_refresh_token(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
    ) -> Result<String, UsersServiceError> {
        let token = credentials::generate_refresh_token();

        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let rows_affected = self
            .repository
            .set_refresh_token(&mut tx, id, Some(&token))
            .await?;

        if rows_affected == 0 {
            return Err(UsersServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(token)
    }

    async fn clear_refresh_token(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
    ) -> Result<(), UsersServiceError> {
        let mut tx = self.db.begin_schema_transaction(tenant.schema()).await?;

        let rows_affected = self.repository.set_refresh_token(&mut tx, id, None).await?;

        if rows_affected == 0 {
            return Err(UsersServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Tenant user and credential-store operations.
pub trait UsersService: Send + Sync {
    /// Create a user, registering the identity in the shared directory and
    /// inserting the tenant row atomically. Conflict when the email or
    /// username is taken anywhere in the system.
    async fn create_user(
        &self,
        tenant: &TenantContext,
        user: NewUser,
    ) -> Result<User, UsersServiceError>;

    /// Fetch a user by id.
    async fn get_user(&self, tenant: &TenantContext, id: UserUuid)
    -> Result<User, UsersServiceError>;

    /// Fetch a user by email or username.
    async fn get_user_by_identity(
        &self,
        tenant: &TenantContext,
        identity: &str,
    ) -> Result<User, UsersServiceError>;

    /// List the tenant's users.
    async fn list_users(&self, tenant: &TenantContext) -> Result<Vec<User>, UsersServiceError>;

    /// Update a user's identity fields, propagating to the directory in the
    /// same transaction.
    async fn update_user(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
        update: UserUpdate,
    ) -> Result<User, UsersServiceError>;

    /// Activate or deactivate a user.
    async fn set_user_active(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
        is_active: bool,
    ) -> Result<(), UsersServiceError>;

    /// Reassign a user to another role, refreshing the denormalized label
    /// from the authoritative role row.
    async fn change_user_role(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
        role_id: RoleUuid,
    ) -> Result<User, UsersServiceError>;

    /// Verify a password. `Ok(None)` for unknown identity, inactive user,
    /// or wrong password; callers cannot distinguish which. Records the
    /// login timestamp on success.
    async fn authenticate(
        &self,
        tenant: &TenantContext,
        identity: &str,
        password: &str,
    ) -> Result<Option<User>, UsersServiceError>;

    /// Issue and persist a fresh refresh token, invalidating any previous
    /// one.
    async fn rotate_refresh_token(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
    ) -> Result<String, UsersServiceError>;

    /// Drop the stored refresh token (logout).
    async fn clear_refresh_token(
        &self,
        tenant: &TenantContext,
        id: UserUuid,
    ) -> Result<(), UsersServiceError>;
}
