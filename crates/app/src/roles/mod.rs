//! Per-tenant role engine.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::RolesServiceError;
pub use service::*;
