//! Authorization guard.

pub mod errors;
pub mod service;

pub use errors::AuthzServiceError;
pub use service::*;
