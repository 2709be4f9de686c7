//! Deterministic slug and schema-name derivation.

use crate::database::{SchemaName, SchemaNameError};

/// Every tenant schema name starts with this, which also guarantees a legal
/// leading character regardless of the slug.
pub const SCHEMA_NAME_PREFIX: &str = "company_";

/// Reduce a human-chosen name to a URL-safe slug: lowercase alphanumeric
/// runs joined by single hyphens.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Derive the physical schema name for a slug: `company_<slug>` with the
/// slug folded into the schema identifier charset and the whole name
/// truncated to the PostgreSQL identifier limit.
///
/// Deterministic: the same slug always yields the same schema name.
///
/// # Errors
///
/// Returns an error when the slug contains nothing usable (for example, an
/// empty or all-punctuation slug).
pub fn derive_schema_name(slug: &str) -> Result<SchemaName, SchemaNameError> {
    let mut name = String::with_capacity(SCHEMA_NAME_PREFIX.len() + slug.len());
    name.push_str(SCHEMA_NAME_PREFIX);

    let mut pending_separator = false;

    for c in slug.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator {
                name.push('_');
            }
            pending_separator = false;
            name.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if name.len() == SCHEMA_NAME_PREFIX.len() {
        return Err(SchemaNameError::Length);
    }

    name.truncate(63);

    SchemaName::new(name)
}
