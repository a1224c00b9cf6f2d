//! strata-core - Core library for Strata
//!
//! This crate provides the shared vocabulary of the migration engine: schema
//! versions, namespace names, SQL quoting helpers, and the `strata.yml`
//! project configuration.

pub mod config;
pub mod error;
pub mod schema_name;
pub mod sql_utils;
pub mod version;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use schema_name::SchemaName;
pub use version::SchemaVersion;
