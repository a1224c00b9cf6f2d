//! Error types for the migration engine.

use strata_db::DbError;
use thiserror::Error;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Malformed or unreadable migration catalog, install layout or metadata record (S001).
    #[error("[S001] Configuration error: {0}")]
    Configuration(String),

    /// An operation's precondition is unmet; nothing was modified (S002).
    #[error("[S002] Precondition failed: {0}")]
    Precondition(String),

    /// The database connection failed (S003).
    #[error("[S003] Connection error: {0}")]
    Connection(#[source] DbError),

    /// A statement failed to execute (S004).
    #[error("[S004] Query error: {0}")]
    Query(#[source] DbError),

    /// A named install step failed (S005).
    #[error("[S005] Install step '{step}' failed: {source}")]
    Install {
        step: String,
        #[source]
        source: Box<MigrateError>,
    },

    /// A named upgrade file failed (S006).
    #[error("[S006] Upgrade file '{file}' failed: {source}")]
    Upgrade {
        file: String,
        #[source]
        source: Box<MigrateError>,
    },

    /// Another install or upgrade holds the schema lock (S007).
    #[error("[S007] Schema '{schema}' is locked by {holder}")]
    Locked { schema: String, holder: String },
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<DbError> for MigrateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(_) | DbError::MutexPoisoned(_) => MigrateError::Connection(err),
            other => MigrateError::Query(other),
        }
    }
}

impl MigrateError {
    /// Wrap an error as the failure of install step `step`.
    pub fn in_install_step(self, step: impl Into<String>) -> Self {
        MigrateError::Install {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// Wrap an error as the failure of upgrade file `file`.
    pub fn in_upgrade_file(self, file: impl Into<String>) -> Self {
        MigrateError::Upgrade {
            file: file.into(),
            source: Box::new(self),
        }
    }

    /// True for errors raised before any mutating statement ran.
    pub fn is_precondition(&self) -> bool {
        matches!(self, MigrateError::Precondition(_) | MigrateError::Locked { .. })
    }
}
