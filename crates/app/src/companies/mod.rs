//! Shared-scope company records.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::CompaniesServiceError;
pub use service::*;
