//! Company Models

use jiff::Timestamp;

use crate::{database::SchemaName, uuids::TypedUuid};

pub type CompanyUuid = TypedUuid<Company>;

/// A tenant's shared-scope record. Lives in `public.company` and outlives
/// the tenant schema it points at.
#[derive(Debug, Clone)]
pub struct Company {
    /// Unique company identifier.
    pub id: CompanyUuid,

    /// Human-readable company name.
    pub name: String,

    /// Unique, human-chosen slug.
    pub slug: String,

    /// Physical schema holding the tenant's tables. Immutable once set.
    pub schema_name: SchemaName,

    /// Optional display name shown in UIs.
    pub display_name: Option<String>,

    /// Free-form description.
    pub description: Option<String>,

    /// Contact person.
    pub contact_name: Option<String>,

    /// Contact email.
    pub email: Option<String>,

    /// Contact phone number.
    pub phone: Option<String>,

    /// Postal address.
    pub address: Option<String>,

    /// False once the company has been soft-deleted.
    pub is_active: bool,

    /// Row creation timestamp.
    pub created_at: Timestamp,

    /// Last update timestamp.
    pub updated_at: Timestamp,
}

/// Payload for creating a company. The schema name is always derived by the
/// provisioner, never supplied by callers.
#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    /// Optional explicit slug; derived from the name when omitted.
    pub slug: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Partial update; `None` fields are left untouched, so nullable contact
/// fields cannot be cleared back to NULL here. The schema name is
/// deliberately not representable.
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
