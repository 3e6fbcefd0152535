//! Batch-based database migrations for brine.
//!
//! `brine-migrate` executes the migrations described with `brine-schema`:
//!
//! - **Runner** - applies pending migrations as numbered batches, rolls
//!   back the latest batch, rebuilds from scratch, and reports status
//! - **History** - the `migrations` bookkeeping table
//! - **Lock** - a database advisory lock serializing concurrent runners
//! - **Discovery** - finds migration types in a project's source files
//! - **Inspector** - builds and runs a throwaway program that replays every
//!   migration and reports the resulting schema
//!
//! # CLI Usage
//!
//! Application binaries expose the runner through [`cli::run`]:
//!
//! ```bash
//! # Apply pending migrations
//! DATABASE_URL=postgres://localhost/app ./migrate migrate
//!
//! # Roll back the last batch
//! ./migrate rollback
//!
//! # Show migration status
//! ./migrate status
//! ```
//!
//! The `brine` binary works on the project sources:
//!
//! ```bash
//! brine discover
//! brine inspect --pretty
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod history;
pub mod inspector;
pub mod lock;
pub mod runner;

/// Prelude for convenient imports.
pub mod prelude {
    pub use brine_schema::prelude::*;
    pub use brine_schema::SchemaSnapshot;

    pub use crate::config::{DEFAULT_LOCK_KEY, DatabaseConfig, InspectorConfig};
    pub use crate::discovery::DiscoveredMigration;
    pub use crate::error::{MigrateError, Result};
    pub use crate::inspector::Inspector;
    pub use crate::runner::{Direction, MigrationEntry, MigrationStatus, Runner};
}
