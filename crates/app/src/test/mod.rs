//! Shared test infrastructure.

pub(crate) mod db;

pub(crate) use context::TestContext;
