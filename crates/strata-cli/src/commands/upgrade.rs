//! Upgrade command implementation

use anyhow::Result;
use strata_migrate::metadata::current_version;
use strata_migrate::{UpgradeOptions, Upgrader};

use crate::cli::{GlobalArgs, UpgradeArgs};
use crate::commands::common::{finish, ConsoleProgress, ExitCode, EXIT_PRECONDITION};
use crate::context::RuntimeContext;

/// Execute the upgrade command
pub async fn execute(args: &UpgradeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let schema = ctx.schema(args.schema.as_deref())?;

    if !args.yes {
        eprintln!(
            "Upgrading schema {schema} modifies the database in place. \
             Back it up, then re-run with --yes."
        );
        return Err(ExitCode(EXIT_PRECONDITION).into());
    }

    let target = ctx.config.schema.version;
    let catalog = ctx.catalog();
    let db = ctx.connect()?;
    let progress = ConsoleProgress::new(args.json);

    if !args.json {
        println!("Upgrading schema {schema} to version {target}...\n");
    }

    let options = UpgradeOptions { schema, target };
    let result = Upgrader::new(
        &db,
        &catalog,
        ctx.config.schema.name.clone(),
        ctx.config.install.lock_table.clone(),
    )
    .with_progress(&progress)
    .upgrade(&options)
    .await;

    // On failure, report the version the last committed step left behind
    let version = match &result {
        Ok(_) => None,
        Err(_) => current_version(&db, &options.schema).await.ok().flatten(),
    };
    finish(result, args.json, version)
}
