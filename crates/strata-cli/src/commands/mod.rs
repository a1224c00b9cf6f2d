//! CLI command implementations

pub(crate) mod common;
pub(crate) mod install;
pub(crate) mod show;
pub(crate) mod status;
pub(crate) mod upgrade;
