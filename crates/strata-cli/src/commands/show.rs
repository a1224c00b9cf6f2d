//! Commands printing values declared by the project

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Print the schema version this build declares
pub fn install_version(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    println!("{}", ctx.config.schema.version);
    Ok(())
}

/// Print the default schema name
pub fn default_schema(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    println!("{}", ctx.config.schema.name);
    Ok(())
}
