//! Per-tenant permission registry.

pub mod catalog;
pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::PermissionsServiceError;
pub use service::*;
