//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use strata_core::{Config, SchemaName};
use strata_db::DuckDbBackend;
use strata_migrate::{InstallPlan, VersionCatalog};

use crate::cli::GlobalArgs;

/// Loaded project configuration plus the resolved target
pub(crate) struct RuntimeContext {
    /// The loaded configuration
    pub config: Config,

    /// Project root; relative paths in the config resolve against it
    pub root: PathBuf,

    /// Target from `--target` or `STRATA_TARGET`
    pub target: Option<String>,
}

impl RuntimeContext {
    /// Load the project configuration from global arguments
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);

        let config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&root).context("Failed to load project configuration")?
        };

        let target = Config::resolve_target(args.target.as_deref());
        if let Some(name) = &target {
            log::info!("Using target {name}");
        }

        Ok(Self {
            config,
            root,
            target,
        })
    }

    /// Schema to operate on: `--schema`, then the target's, then the config's
    pub fn schema(&self, schema_arg: Option<&str>) -> Result<SchemaName> {
        match schema_arg {
            Some(name) => SchemaName::parse(name).context("Invalid --schema"),
            None => Ok(self.config.get_schema(self.target.as_deref())?),
        }
    }

    /// Database path for the target, resolved against the project root
    pub fn database_path(&self) -> Result<String> {
        let db_config = self.config.get_database_config(self.target.as_deref())?;
        if db_config.path == ":memory:" || Path::new(&db_config.path).is_absolute() {
            return Ok(db_config.path);
        }
        Ok(self.root.join(&db_config.path).display().to_string())
    }

    /// Open the target database
    pub fn connect(&self) -> Result<DuckDbBackend> {
        let path = self.database_path()?;
        log::info!("Connecting to {path}");
        DuckDbBackend::new(&path).context("Failed to connect to database")
    }

    /// Catalog over the project's upgrade directory
    pub fn catalog(&self) -> VersionCatalog {
        VersionCatalog::new(self.config.upgrade_dir_absolute(&self.root))
    }

    /// Install layout resolved against the project root
    pub fn install_plan(&self) -> InstallPlan {
        InstallPlan::from_config(&self.config, &self.root)
    }
}
