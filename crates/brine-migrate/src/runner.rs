//! Migration runner.
//!
//! The runner applies and reverts an ordered registry of migrations against
//! a live database. Every invocation acquires one pooled connection, takes
//! the advisory lock on it, and performs all of its work on that connection
//! before releasing the lock.
//!
//! # Example
//!
//! Migration files import from `brine_schema` only, so the inspector can
//! mount them too; the runner itself comes from `brine_migrate`.
//!
//! ```rust
//! use brine_migrate::prelude::{DatabaseConfig, MigrationEntry, Runner};
//! use brine_schema::prelude::*;
//!
//! #[derive(Default)]
//! struct CreateNotes(Migration);
//!
//! impl Migrate for CreateNotes {
//!     fn recorder(&mut self) -> &mut Migration {
//!         &mut self.0
//!     }
//!
//!     fn up(&mut self) {
//!         self.0.drop_table_if_exists("legacy_notes");
//!     }
//!
//!     fn down(&mut self) {}
//! }
//!
//! # tokio_test::block_on(async {
//! let config = DatabaseConfig::new("sqlite::memory:").max_connections(1);
//! let runner = Runner::connect(&config).await.unwrap();
//! let mut entries = vec![MigrationEntry::new("2026_01_01_create_notes", CreateNotes::default())];
//!
//! assert_eq!(runner.migrate(&mut entries).await.unwrap(), vec!["2026_01_01_create_notes"]);
//! assert!(runner.migrate(&mut entries).await.unwrap().is_empty());
//! runner.close().await;
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use brine_schema::{Driver, Migrate, SqlCompiler};
use serde::Serialize;
use sqlx::any::AnyPoolOptions;
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyConnection, AnyPool, Connection};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_LOCK_KEY, DatabaseConfig};
use crate::error::{MigrateError, Result};
use crate::history::MigrationHistory;
use crate::lock::AdvisoryLock;

/// A registered migration and its id.
///
/// The id is what the bookkeeping table records, so it must stay stable once
/// the migration has been applied anywhere.
pub struct MigrationEntry {
    /// Registry id, conventionally timestamp-prefixed.
    pub id: String,
    /// The migration itself.
    pub migration: Box<dyn Migrate>,
}

impl MigrationEntry {
    /// Creates an entry.
    pub fn new(id: impl Into<String>, migration: impl Migrate + 'static) -> Self {
        Self {
            id: id.into(),
            migration: Box::new(migration),
        }
    }
}

impl fmt::Debug for MigrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationEntry")
            .field("id", &self.id)
            .field("transactional", &self.migration.transactional())
            .finish_non_exhaustive()
    }
}

/// Which side of a migration to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `up`
    Up,
    /// `down`
    Down,
}

/// Applied state of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Registry id.
    pub id: String,
    /// Batch that applied it, if applied.
    pub batch: Option<i64>,
    /// Whether it is recorded as applied.
    pub applied: bool,
}

/// Applies and reverts migrations.
pub struct Runner {
    pool: AnyPool,
    driver: Driver,
    compiler: Box<dyn SqlCompiler>,
    history: MigrationHistory,
    lock: AdvisoryLock,
}

impl Runner {
    /// Connects using `config`.
    ///
    /// # Errors
    ///
    /// Fails if the driver cannot be determined or the pool cannot connect.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let driver = config.resolve_driver()?;
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        info!(driver = %driver, "Connected to database");
        Ok(Self::new(pool, driver).with_lock_key(config.lock_key))
    }

    /// Creates a runner over an existing pool.
    #[must_use]
    pub fn new(pool: AnyPool, driver: Driver) -> Self {
        Self::with_compiler(pool, driver, driver.compiler())
    }

    /// Creates a runner that compiles with `compiler` instead of the
    /// driver's default.
    ///
    /// Bookkeeping and locking still follow `driver`.
    #[must_use]
    pub fn with_compiler(pool: AnyPool, driver: Driver, compiler: Box<dyn SqlCompiler>) -> Self {
        Self {
            pool,
            driver,
            compiler,
            history: MigrationHistory::new(driver),
            lock: AdvisoryLock::new(driver, DEFAULT_LOCK_KEY),
        }
    }

    /// Sets the advisory lock key.
    #[must_use]
    pub fn with_lock_key(mut self, key: i64) -> Self {
        self.lock = AdvisoryLock::new(self.driver, key);
        self
    }

    /// Returns the active driver.
    #[must_use]
    pub const fn driver(&self) -> Driver {
        self.driver
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Closes the pool.
    pub async fn close(self) {
        self.pool.close().await;
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Applies every pending entry, in registry order, as one new batch.
    ///
    /// Returns the ids that were applied. A failure stops the run; entries
    /// applied before it stay applied.
    ///
    /// # Errors
    ///
    /// Returns the first lock, bookkeeping or migration error.
    pub async fn migrate(&self, entries: &mut [MigrationEntry]) -> Result<Vec<String>> {
        let mut conn = self.lock().await?;
        let result = self.migrate_locked(&mut conn, entries).await;
        self.unlock(conn, result).await
    }

    /// Reverts the most recent batch, in reverse registry order.
    ///
    /// Returns the ids that were rolled back.
    ///
    /// # Errors
    ///
    /// Returns the first lock, bookkeeping or migration error.
    pub async fn rollback(&self, entries: &mut [MigrationEntry]) -> Result<Vec<String>> {
        let mut conn = self.lock().await?;
        let result = self.rollback_locked(&mut conn, entries).await;
        self.unlock(conn, result).await
    }

    /// Tears everything down and re-applies the whole registry.
    ///
    /// Every entry's `down` runs in reverse order regardless of bookkeeping,
    /// with errors logged and ignored. The bookkeeping table is then dropped
    /// and [`migrate`](Self::migrate) runs under the same lock.
    ///
    /// # Errors
    ///
    /// Returns lock or bookkeeping errors, or the first error of the
    /// re-applying migrate.
    pub async fn fresh(&self, entries: &mut [MigrationEntry]) -> Result<Vec<String>> {
        let mut conn = self.lock().await?;
        let result = self.fresh_locked(&mut conn, entries).await;
        self.unlock(conn, result).await
    }

    /// Reports, for every entry, whether and in which batch it was applied.
    ///
    /// # Errors
    ///
    /// Returns connection or bookkeeping errors.
    pub async fn status(&self, entries: &[MigrationEntry]) -> Result<Vec<MigrationStatus>> {
        let mut conn = self.pool.acquire().await?;
        self.history.ensure_table(&mut conn).await?;
        let applied: HashMap<String, i64> = self
            .history
            .applied(&mut conn)
            .await?
            .into_iter()
            .map(|row| (row.migration, row.batch))
            .collect();

        Ok(entries
            .iter()
            .map(|entry| {
                let batch = applied.get(&entry.id).copied();
                MigrationStatus {
                    id: entry.id.clone(),
                    batch,
                    applied: batch.is_some(),
                }
            })
            .collect())
    }

    /// Returns the ids of entries not yet applied, in registry order.
    ///
    /// Unlike [`status`](Self::status) this never creates the bookkeeping
    /// table; without one, every entry is pending.
    ///
    /// # Errors
    ///
    /// Returns connection or bookkeeping errors.
    pub async fn pending(&self, entries: &[MigrationEntry]) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire().await?;
        let applied: HashSet<String> = if self.history.table_exists(&mut conn).await? {
            self.history
                .applied(&mut conn)
                .await?
                .into_iter()
                .map(|row| row.migration)
                .collect()
        } else {
            HashSet::new()
        };

        Ok(entries
            .iter()
            .filter(|entry| !applied.contains(&entry.id))
            .map(|entry| entry.id.clone())
            .collect())
    }

    /// Compiles one side of a migration without executing it.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Compile`] for operations the driver does not
    /// support.
    pub fn sql_for(&self, entry: &mut MigrationEntry, direction: Direction) -> Result<Vec<String>> {
        let operations = match direction {
            Direction::Up => entry.migration.record_up(),
            Direction::Down => entry.migration.record_down(),
        };
        Ok(self.compiler.compile_all(&operations)?)
    }

    // ========================================================================
    // Locked bodies
    // ========================================================================

    async fn lock(&self) -> Result<PoolConnection<Any>> {
        let mut conn = self.pool.acquire().await?;
        self.lock.acquire(&mut conn).await?;
        Ok(conn)
    }

    /// Releases the lock, then hands back `result`. A connection whose
    /// release failed is closed instead of returned to the pool.
    async fn unlock<T>(&self, mut conn: PoolConnection<Any>, result: Result<T>) -> Result<T> {
        if let Err(err) = self.lock.release(&mut conn).await {
            warn!(error = %err, "Failed to release migration lock, closing connection");
            conn.close_on_drop();
            return result.and(Err(err));
        }
        result
    }

    async fn migrate_locked(
        &self,
        conn: &mut AnyConnection,
        entries: &mut [MigrationEntry],
    ) -> Result<Vec<String>> {
        self.history.ensure_table(conn).await?;
        let applied: HashSet<String> = self
            .history
            .applied(conn)
            .await?
            .into_iter()
            .map(|row| row.migration)
            .collect();
        let batch = self.history.last_batch(conn).await? + 1;

        let mut migrated = Vec::new();
        for entry in entries.iter_mut() {
            if applied.contains(&entry.id) {
                continue;
            }
            info!(id = %entry.id, batch, "Migrating");
            self.apply(conn, entry, batch)
                .await
                .map_err(|e| e.in_migration(&entry.id))?;
            info!(id = %entry.id, "Migrated");
            migrated.push(entry.id.clone());
        }

        if migrated.is_empty() {
            info!("Nothing to migrate");
        }
        Ok(migrated)
    }

    async fn rollback_locked(
        &self,
        conn: &mut AnyConnection,
        entries: &mut [MigrationEntry],
    ) -> Result<Vec<String>> {
        self.history.ensure_table(conn).await?;
        let batch = self.history.last_batch(conn).await?;
        if batch == 0 {
            info!("Nothing to roll back");
            return Ok(Vec::new());
        }

        let in_batch: HashSet<String> = self
            .history
            .applied(conn)
            .await?
            .into_iter()
            .filter(|row| row.batch == batch)
            .map(|row| row.migration)
            .collect();

        let mut rolled_back = Vec::new();
        for entry in entries.iter_mut().rev() {
            if !in_batch.contains(&entry.id) {
                continue;
            }
            info!(id = %entry.id, batch, "Rolling back");
            self.revert(conn, entry)
                .await
                .map_err(|e| e.in_migration(&entry.id))?;
            info!(id = %entry.id, "Rolled back");
            rolled_back.push(entry.id.clone());
        }

        for id in &in_batch {
            if !rolled_back.contains(id) {
                warn!(id = %id, batch, "Recorded migration is not registered, leaving it in place");
            }
        }
        Ok(rolled_back)
    }

    async fn fresh_locked(
        &self,
        conn: &mut AnyConnection,
        entries: &mut [MigrationEntry],
    ) -> Result<Vec<String>> {
        for entry in entries.iter_mut().rev() {
            self.teardown(conn, entry).await;
        }
        self.history.drop_table(conn).await?;
        self.migrate_locked(conn, entries).await
    }

    // ========================================================================
    // Per-migration execution
    // ========================================================================

    async fn apply(&self, conn: &mut AnyConnection, entry: &mut MigrationEntry, batch: i64) -> Result<()> {
        let statements = self.compiler.compile_all(&entry.migration.record_up())?;
        if entry.migration.transactional() {
            let mut tx = conn.begin().await?;
            execute_all(&mut tx, &statements).await?;
            self.history.record(&mut tx, &entry.id, batch).await?;
            tx.commit().await?;
        } else {
            execute_all(conn, &statements).await?;
            self.history.record(conn, &entry.id, batch).await?;
        }
        Ok(())
    }

    async fn revert(&self, conn: &mut AnyConnection, entry: &mut MigrationEntry) -> Result<()> {
        let statements = self.compiler.compile_all(&entry.migration.record_down())?;
        if entry.migration.transactional() {
            let mut tx = conn.begin().await?;
            execute_all(&mut tx, &statements).await?;
            self.history.remove(&mut tx, &entry.id).await?;
            tx.commit().await?;
        } else {
            execute_all(conn, &statements).await?;
            self.history.remove(conn, &entry.id).await?;
        }
        Ok(())
    }

    /// Best-effort `down` used by fresh; nothing here can fail the command.
    async fn teardown(&self, conn: &mut AnyConnection, entry: &mut MigrationEntry) {
        let statements = match self.compiler.compile_all(&entry.migration.record_down()) {
            Ok(statements) => statements,
            Err(err) => {
                warn!(id = %entry.id, error = %err, "Skipping teardown");
                return;
            }
        };
        for statement in &statements {
            debug!(sql = %statement, "Executing teardown SQL");
            if let Err(err) = sqlx::raw_sql(statement).execute(&mut *conn).await {
                warn!(id = %entry.id, sql = %statement, error = %err, "Teardown statement failed");
            }
        }
    }
}

async fn execute_all(conn: &mut AnyConnection, statements: &[String]) -> Result<()> {
    for statement in statements {
        debug!(sql = %statement, "Executing SQL");
        sqlx::raw_sql(statement)
            .execute(&mut *conn)
            .await
            .map_err(|source| MigrateError::Execution {
                statement: statement.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Renders statuses as an aligned table.
#[must_use]
pub fn format_status(statuses: &[MigrationStatus]) -> String {
    let width = statuses
        .iter()
        .map(|s| s.id.len())
        .max()
        .unwrap_or(0)
        .max("Migration".len());

    let mut out = format!("{:<width$}  {:<5}  Status\n", "Migration", "Batch");
    out.push_str(&format!("{:-<1$}\n", "", width + 17));
    for status in statuses {
        let batch = status
            .batch
            .map_or_else(|| "-".to_string(), |b| b.to_string());
        let state = if status.applied { "Ran" } else { "Pending" };
        out.push_str(&format!("{:<width$}  {batch:<5}  {state}\n", status.id));
    }
    out
}

/// Prints [`format_status`] to stdout.
pub fn print_status(statuses: &[MigrationStatus]) {
    print!("{}", format_status(statuses));
}
