//! Install command implementation

use anyhow::{Context, Result};
use strata_db::DuckDbCsvSource;
use strata_migrate::{InstallOptions, Installer};

use crate::cli::{GlobalArgs, InstallArgs};
use crate::commands::common::{finish, ConsoleProgress};
use crate::context::RuntimeContext;

/// Execute the install command
pub async fn execute(args: &InstallArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let schema = ctx.schema(args.schema.as_deref())?;
    let version = ctx.config.schema.version;
    let plan = ctx.install_plan();
    let db = ctx.connect()?;
    let source = DuckDbCsvSource::new().context("Failed to open the CSV reader")?;

    if !args.json {
        let mode = if args.overwrite { " (overwrite)" } else { "" };
        println!("Installing schema {schema} at version {version}{mode}...\n");
    }

    let progress = ConsoleProgress::new(args.json);
    let options = InstallOptions {
        schema,
        version,
        overwrite: args.overwrite,
    };
    let result = Installer::new(&db, &plan, &source)
        .with_progress(&progress)
        .install(&options)
        .await;

    finish(result, args.json, None)
}
