//! Configuration types and parsing for strata.yml

use crate::error::{CoreError, CoreResult};
use crate::schema_name::SchemaName;
use crate::version::SchemaVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no `--target` flag is given.
pub const TARGET_ENV_VAR: &str = "STRATA_TARGET";

/// Main project configuration from strata.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Default namespace and the schema version this build declares
    pub schema: SchemaConfig,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Install layout: bootstrap scripts, teardown order, reference data
    #[serde(default)]
    pub install: InstallConfig,

    /// Named target configurations (e.g., dev, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Default namespace and declared version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Namespace name hardcoded in the install and upgrade scripts
    pub name: SchemaName,

    /// Schema version this build installs and upgrades to
    pub version: SchemaVersion,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Install layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallConfig {
    /// Directory holding `sql/` and reference data, relative to the project
    #[serde(default = "default_install_dir")]
    pub dir: String,

    /// Ordered bootstrap scripts, relative to `<dir>/sql`
    #[serde(default)]
    pub scripts: Vec<String>,

    /// Objects dropped on a destructive reinstall
    #[serde(default)]
    pub teardown: TeardownConfig,

    /// Lookup tables loaded after the structural scripts
    #[serde(default)]
    pub reference: Option<ReferenceConfig>,

    /// Table holding advisory lock rows
    #[serde(default = "default_lock_table")]
    pub lock_table: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            dir: default_install_dir(),
            scripts: Vec::new(),
            teardown: TeardownConfig::default(),
            reference: None,
            lock_table: default_lock_table(),
        }
    }
}

/// Teardown order for `install --overwrite`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeardownConfig {
    /// Dependent schema suffixes, dropped as `<schema>_<suffix>` in this order
    #[serde(default)]
    pub schemas: Vec<String>,

    /// Custom types dropped after every schema
    #[serde(default)]
    pub types: Vec<TypeConfig>,
}

/// A custom type dropped during teardown
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeConfig {
    /// Qualified type name, e.g. `public.c_insee`
    pub name: String,

    /// Kind of type object
    #[serde(default)]
    pub kind: TypeKind,
}

/// Kind of custom type object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// `CREATE TYPE`
    #[default]
    Type,
    /// `CREATE DOMAIN`
    Domain,
}

impl TypeKind {
    /// SQL keyword for the object kind
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Type => "TYPE",
            TypeKind::Domain => "DOMAIN",
        }
    }
}

/// Reference data location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Directory of CSV files, relative to the install dir
    pub dir: String,

    /// Lookup tables live in `<schema>_<schema_suffix>`
    pub schema_suffix: String,

    /// Target columns for the three CSV fields; the first is the conflict key
    #[serde(default = "default_reference_columns")]
    pub columns: Vec<String>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Schema name override
    #[serde(default)]
    pub schema: Option<SchemaName>,
}

fn default_db_path() -> String {
    "strata.duckdb".to_string()
}

fn default_install_dir() -> String {
    "install".to_string()
}

fn default_reference_columns() -> Vec<String> {
    vec![
        "code".to_string(),
        "label".to_string(),
        "description".to_string(),
    ]
}

fn default_lock_table() -> String {
    "strata_lock".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    ///
    /// Looks for strata.yml or strata.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("strata.yml");
        let yaml_path = dir.join("strata.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if let Some(idx) = self.install.scripts.iter().position(|s| s.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: format!("install.scripts[{idx}] is empty"),
            });
        }
        let suffix_ok = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if let Some(bad) = self.install.teardown.schemas.iter().find(|s| !suffix_ok(s)) {
            return Err(CoreError::ConfigInvalid {
                message: format!("install.teardown.schemas: invalid suffix '{bad}'"),
            });
        }
        if let Some(reference) = &self.install.reference {
            if !suffix_ok(&reference.schema_suffix) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "install.reference.schema_suffix: invalid suffix '{}'",
                        reference.schema_suffix
                    ),
                });
            }
            if reference.columns.len() != 3 || reference.columns.iter().any(|c| c.is_empty()) {
                return Err(CoreError::ConfigInvalid {
                    message: "install.reference.columns must name exactly 3 columns".to_string(),
                });
            }
        }
        if self.install.lock_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "install.lock_table must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Absolute install directory
    pub fn install_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.install.dir)
    }

    /// Absolute directory holding the bootstrap scripts
    pub fn sql_dir_absolute(&self, root: &Path) -> PathBuf {
        self.install_dir_absolute(root).join("sql")
    }

    /// Absolute directory holding `upgrade_to_<N>.sql` files
    pub fn upgrade_dir_absolute(&self, root: &Path) -> PathBuf {
        self.sql_dir_absolute(root).join("upgrade")
    }

    /// Absolute reference data directory, if reference data is configured
    pub fn reference_dir_absolute(&self, root: &Path) -> Option<PathBuf> {
        self.install
            .reference
            .as_ref()
            .map(|r| self.install_dir_absolute(root).join(&r.dir))
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config = self.get_target(name)?;
                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Get the namespace to operate on, optionally applying target overrides
    pub fn get_schema(&self, target: Option<&str>) -> CoreResult<SchemaName> {
        match target {
            Some(name) => Ok(self
                .get_target(name)?
                .schema
                .clone()
                .unwrap_or_else(|| self.schema.name.clone())),
            None => Ok(self.schema.name.clone()),
        }
    }

    fn get_target(&self, name: &str) -> CoreResult<&TargetConfig> {
        self.targets.get(name).ok_or_else(|| {
            let mut available: Vec<&str> = self.targets.keys().map(|k| k.as_str()).collect();
            available.sort_unstable();
            CoreError::ConfigInvalid {
                message: format!(
                    "Target '{}' not found. Available targets: {}",
                    name,
                    available.join(", ")
                ),
            }
        })
    }

    /// Resolve target from CLI flag or STRATA_TARGET environment variable
    ///
    /// Priority: CLI flag > STRATA_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
