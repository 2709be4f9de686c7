//! Tenant lifecycle: schema provisioning and teardown.

pub mod errors;
pub mod models;
pub mod naming;
pub(crate) mod repository;
pub mod service;

pub use errors::ProvisioningServiceError;
pub use service::*;
