//! Shared application domain and persistence modules.

pub mod authz;
pub mod companies;
pub mod context;
pub mod database;
pub mod directory;
pub mod permissions;
pub mod provisioning;
pub mod roles;
pub mod users;

#[cfg(test)]
mod test;

mod uuids;
