//! Shared identity directory: the single source of truth for which tenant
//! schema owns a given email or username.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::DirectoryServiceError;
pub use service::*;
