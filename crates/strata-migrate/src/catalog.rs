//! Discovery and ordering of upgrade files.
//!
//! An upgrade directory holds files named `upgrade_to_<N>.sql`. Anything else
//! in the directory is ignored. The scan is cached until
//! [`VersionCatalog::invalidate`] is called; filtering by minimum version
//! happens on every call.

use crate::error::{MigrateError, MigrateResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use strata_core::SchemaVersion;

/// Filename prefix of an upgrade file.
pub const MIGRATION_PREFIX: &str = "upgrade_to_";

/// Extension of an upgrade file.
pub const MIGRATION_EXTENSION: &str = "sql";

/// One upgrade file and the version it brings the schema to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Version recorded once this file has been applied
    pub target_version: SchemaVersion,
    /// Location of the SQL content
    pub path: PathBuf,
}

impl MigrationFile {
    /// File name for messages and progress output
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Read the SQL content
    pub fn read_sql(&self) -> MigrateResult<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            MigrateError::Configuration(format!(
                "cannot read upgrade file {}: {e}",
                self.path.display()
            ))
        })
    }
}

/// Parse the target version out of an upgrade file name.
///
/// Returns `None` for names that do not follow `upgrade_to_<N>.sql` with
/// `N` a base-10 integer greater than zero.
pub fn parse_migration_name(file_name: &str) -> Option<SchemaVersion> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case(MIGRATION_EXTENSION) {
        return None;
    }
    let digits = stem.strip_prefix(MIGRATION_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().and_then(SchemaVersion::new)
}

/// Catalog of upgrade files in one directory.
#[derive(Debug)]
pub struct VersionCatalog {
    dir: PathBuf,
    cache: Mutex<Option<Arc<[MigrationFile]>>>,
}

impl VersionCatalog {
    /// Create a catalog over `dir`. Nothing is read until the first query.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(None),
        }
    }

    /// The scanned directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Upgrade files with `target_version > above`, strictly ascending.
    ///
    /// `None` lists every file.
    pub fn list_migrations(&self, above: Option<SchemaVersion>) -> MigrateResult<Vec<MigrationFile>> {
        let all = self.scanned()?;
        Ok(all
            .iter()
            .filter(|m| above.map_or(true, |min| m.target_version > min))
            .cloned()
            .collect())
    }

    /// The highest-versioned upgrade file, if any.
    pub fn latest_migration(&self) -> MigrateResult<Option<MigrationFile>> {
        Ok(self.scanned()?.last().cloned())
    }

    /// Drop the cached scan so the next query re-reads the directory.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }

    fn scanned(&self) -> MigrateResult<Arc<[MigrationFile]>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(files) = cache.as_ref() {
            return Ok(Arc::clone(files));
        }
        let files: Arc<[MigrationFile]> = self.scan()?.into();
        *cache = Some(Arc::clone(&files));
        Ok(files)
    }

    fn scan(&self) -> MigrateResult<Vec<MigrationFile>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            MigrateError::Configuration(format!(
                "cannot read upgrade directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut by_version: BTreeMap<SchemaVersion, PathBuf> = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                MigrateError::Configuration(format!(
                    "cannot read upgrade directory {}: {e}",
                    self.dir.display()
                ))
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(version) = parse_migration_name(name) else {
                if name.starts_with(MIGRATION_PREFIX) {
                    log::warn!("Ignoring malformed upgrade file name: {name}");
                }
                continue;
            };
            if let Some(existing) = by_version.get(&version) {
                return Err(MigrateError::Configuration(format!(
                    "duplicate upgrade target version {version}: {} and {}",
                    existing.display(),
                    path.display()
                )));
            }
            by_version.insert(version, path);
        }

        log::debug!(
            "Found {} upgrade files in {}",
            by_version.len(),
            self.dir.display()
        );
        Ok(by_version
            .into_iter()
            .map(|(target_version, path)| MigrationFile {
                target_version,
                path,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
