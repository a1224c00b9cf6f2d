//! Status command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use strata_core::version::display_version_key;
use strata_core::SchemaVersion;
use strata_migrate::lock::lock_holder;
use strata_migrate::metadata::current_version;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::context::RuntimeContext;

/// Everything `status` reports
#[derive(Debug, Serialize)]
struct StatusReport {
    schema: String,
    declared_version: SchemaVersion,
    /// `None` when offline or not installed
    installed_version: Option<SchemaVersion>,
    installed: Option<bool>,
    pending: Vec<String>,
    lock_holder: Option<String>,
    offline: bool,
    tool_version: &'static str,
    tool_version_key: String,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let schema = ctx.schema(args.schema.as_deref())?;
    let declared = ctx.config.schema.version;
    let catalog = ctx.catalog();

    let (installed_version, installed, holder) = if args.offline {
        (None, None, None)
    } else {
        let db = ctx.connect()?;
        let current = current_version(&db, &schema)
            .await
            .context("Failed to read the installed version")?;
        let holder = lock_holder(&db, &ctx.config.install.lock_table, schema.as_str())
            .await
            .context("Failed to read the schema lock")?;
        (current, Some(current.is_some()), holder)
    };

    // Offline, every file up to the declared version is listed. A schema that
    // is not installed needs an install, not upgrades.
    let pending = if installed != Some(false) && catalog.dir().exists() {
        catalog
            .list_migrations(installed_version)
            .context("Failed to list upgrade files")?
            .into_iter()
            .filter(|m| m.target_version <= declared)
            .map(|m| m.file_name())
            .collect()
    } else {
        Vec::new()
    };

    let tool_version = env!("CARGO_PKG_VERSION");
    let report = StatusReport {
        schema: schema.to_string(),
        declared_version: declared,
        installed_version,
        installed,
        pending,
        lock_holder: holder,
        offline: args.offline,
        tool_version,
        tool_version_key: display_version_key(tool_version),
    };

    match args.output {
        StatusOutput::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        StatusOutput::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &StatusReport) {
    println!("Schema:           {}", report.schema);
    println!("Declared version: {}", report.declared_version);
    match (report.installed, report.installed_version) {
        (None, _) => println!("Installed:        unknown (offline)"),
        (Some(false), _) => println!("Installed:        no"),
        (Some(true), Some(v)) if v == report.declared_version => {
            println!("Installed:        {v} (up to date)")
        }
        (Some(true), Some(v)) if v > report.declared_version => {
            println!("Installed:        {v} (newer than this build)")
        }
        (Some(true), v) => println!(
            "Installed:        {}",
            v.map(|v| v.to_string()).unwrap_or_default()
        ),
    }
    if let Some(holder) = &report.lock_holder {
        println!("Locked by:        {holder}");
    }

    if report.installed == Some(false) {
        println!("Pending upgrades: none (install first)");
    } else if report.pending.is_empty() {
        println!("Pending upgrades: none");
    } else {
        println!("Pending upgrades: {}", report.pending.len());
        for file in &report.pending {
            println!("  - {file}");
        }
    }
}
