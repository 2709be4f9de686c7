//! Directory Models

use jiff::Timestamp;

use crate::{companies::models::CompanyUuid, database::SchemaName, uuids::TypedUuid};

pub type DirectoryEntryUuid = TypedUuid<DirectoryEntry>;

/// One globally unique identity and the tenant that owns it.
///
/// `schema_name` mirrors the owning company's schema for lookup speed; the
/// provisioning and user-management paths keep the two consistent.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub id: DirectoryEntryUuid,

    /// Globally unique email.
    pub email: String,

    /// Globally unique username.
    pub username: String,

    /// Owning company.
    pub company_id: CompanyUuid,

    /// Schema holding the identity's tenant data.
    pub schema_name: SchemaName,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Registration payload for a new directory entry.
#[derive(Debug, Clone)]
pub struct NewDirectoryEntry {
    pub id: DirectoryEntryUuid,
    pub email: String,
    pub username: String,
    pub company_id: CompanyUuid,
    pub schema_name: SchemaName,
}
