//! Error types for the migration runner and inspector.

use std::path::PathBuf;

use brine_schema::CompileError;

/// Errors that can occur while discovering, inspecting or running migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A migration file could not be read or parsed.
    #[error("Failed to scan migration file '{path}': {message}")]
    Discovery {
        /// File being scanned.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The inspector program failed to build or run.
    #[error("Schema inspector failed: {message}\n{output}")]
    Inspection {
        /// What failed.
        message: String,
        /// The child's stdout and stderr, verbatim.
        output: String,
    },

    /// The inspector printed something that is not a valid payload.
    #[error("Failed to decode inspector output: {0}")]
    Decode(#[source] serde_json::Error),

    /// An operation could not be compiled for the active driver.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A compiled statement failed.
    #[error("Failed to execute `{statement}`: {source}")]
    Execution {
        /// The statement that failed.
        statement: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The advisory lock could not be acquired or released.
    #[error("Migration lock error: {0}")]
    Lock(String),

    /// Reading or writing the `migrations` table failed.
    #[error("Bookkeeping error: {0}")]
    Bookkeeping(#[source] sqlx::Error),

    /// Connection, pool or transaction error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A specific migration failed.
    #[error("Migration '{id}' failed: {source}")]
    Migration {
        /// Registry id of the migration.
        id: String,
        /// Underlying error.
        #[source]
        source: Box<MigrateError>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrateError {
    /// Wraps `self` with the id of the migration that raised it.
    #[must_use]
    pub fn in_migration(self, id: &str) -> Self {
        Self::Migration {
            id: id.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
