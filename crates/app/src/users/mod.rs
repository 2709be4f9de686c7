//! Tenant users and the credential store.

pub mod credentials;
pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::UsersServiceError;
pub use service::*;
