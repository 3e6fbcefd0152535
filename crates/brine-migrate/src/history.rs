//! Migration bookkeeping.
//!
//! Applied migrations are recorded in a `migrations` table, one row per
//! migration, tagged with the batch number of the `migrate` invocation that
//! applied it. Rollback works one batch at a time.

use brine_schema::Driver;
use sqlx::AnyConnection;

use crate::error::{MigrateError, Result};

/// Name of the bookkeeping table.
pub const MIGRATIONS_TABLE: &str = "migrations";

const CREATE_TABLE_POSTGRES: &str = r"
CREATE TABLE IF NOT EXISTS migrations (
    id SERIAL PRIMARY KEY,
    migration VARCHAR(255) NOT NULL,
    batch BIGINT NOT NULL
)
";

const CREATE_TABLE_MYSQL: &str = r"
CREATE TABLE IF NOT EXISTS migrations (
    id INT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
    migration VARCHAR(255) NOT NULL,
    batch BIGINT NOT NULL
)
";

const CREATE_TABLE_SQLITE: &str = r"
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    migration VARCHAR(255) NOT NULL,
    batch INTEGER NOT NULL
)
";

const TABLE_EXISTS_POSTGRES: &str = "SELECT COUNT(*) FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name = 'migrations'";

const TABLE_EXISTS_MYSQL: &str = "SELECT COUNT(*) FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_name = 'migrations'";

const TABLE_EXISTS_SQLITE: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'migrations'";

/// A row of the bookkeeping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    /// Registry id of the migration.
    pub migration: String,
    /// Batch that applied it.
    pub batch: i64,
}

/// Reads and writes the bookkeeping table for one driver.
#[derive(Debug, Clone, Copy)]
pub struct MigrationHistory {
    driver: Driver,
}

impl MigrationHistory {
    /// Creates a history manager for `driver`.
    #[must_use]
    pub const fn new(driver: Driver) -> Self {
        Self { driver }
    }

    /// Returns the `CREATE TABLE IF NOT EXISTS` statement for the driver.
    #[must_use]
    pub const fn create_table_sql(&self) -> &'static str {
        match self.driver {
            Driver::Postgres => CREATE_TABLE_POSTGRES,
            Driver::MySql => CREATE_TABLE_MYSQL,
            Driver::Sqlite => CREATE_TABLE_SQLITE,
        }
    }

    /// Returns the query counting bookkeeping tables visible to the
    /// connection.
    #[must_use]
    pub const fn table_exists_sql(&self) -> &'static str {
        match self.driver {
            Driver::Postgres => TABLE_EXISTS_POSTGRES,
            Driver::MySql => TABLE_EXISTS_MYSQL,
            Driver::Sqlite => TABLE_EXISTS_SQLITE,
        }
    }

    /// Returns the `n`th (1-based) bind placeholder.
    #[must_use]
    pub fn placeholder(&self, n: usize) -> String {
        match self.driver {
            Driver::Postgres => format!("${n}"),
            Driver::MySql | Driver::Sqlite => "?".to_string(),
        }
    }

    /// Ensures the bookkeeping table exists.
    pub async fn ensure_table(&self, conn: &mut AnyConnection) -> Result<()> {
        sqlx::query(self.create_table_sql())
            .execute(&mut *conn)
            .await
            .map_err(MigrateError::Bookkeeping)?;
        Ok(())
    }

    /// Returns whether the bookkeeping table exists, without creating it.
    pub async fn table_exists(&self, conn: &mut AnyConnection) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(self.table_exists_sql())
            .fetch_one(&mut *conn)
            .await
            .map_err(MigrateError::Bookkeeping)?;
        Ok(count > 0)
    }

    /// Returns every applied migration in application order.
    pub async fn applied(&self, conn: &mut AnyConnection) -> Result<Vec<AppliedMigration>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT migration, batch FROM migrations ORDER BY id")
                .fetch_all(&mut *conn)
                .await
                .map_err(MigrateError::Bookkeeping)?;

        Ok(rows
            .into_iter()
            .map(|(migration, batch)| AppliedMigration { migration, batch })
            .collect())
    }

    /// Returns the highest batch number, or 0 when nothing is applied.
    pub async fn last_batch(&self, conn: &mut AnyConnection) -> Result<i64> {
        let row: (Option<i64>,) = sqlx::query_as("SELECT MAX(batch) FROM migrations")
            .fetch_one(&mut *conn)
            .await
            .map_err(MigrateError::Bookkeeping)?;
        Ok(row.0.unwrap_or(0))
    }

    /// Records `id` as applied in `batch`.
    pub async fn record(&self, conn: &mut AnyConnection, id: &str, batch: i64) -> Result<()> {
        let sql = format!(
            "INSERT INTO migrations (migration, batch) VALUES ({}, {})",
            self.placeholder(1),
            self.placeholder(2)
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(batch)
            .execute(&mut *conn)
            .await
            .map_err(MigrateError::Bookkeeping)?;
        Ok(())
    }

    /// Deletes the row for `id`.
    pub async fn remove(&self, conn: &mut AnyConnection, id: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM migrations WHERE migration = {}",
            self.placeholder(1)
        );
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(MigrateError::Bookkeeping)?;
        Ok(())
    }

    /// Drops the bookkeeping table.
    pub async fn drop_table(&self, conn: &mut AnyConnection) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS migrations")
            .execute(&mut *conn)
            .await
            .map_err(MigrateError::Bookkeeping)?;
        Ok(())
    }
}
