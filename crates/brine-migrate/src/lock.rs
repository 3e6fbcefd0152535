//! Cross-process advisory locking.
//!
//! Postgres uses a session-level `pg_advisory_lock`, MySQL a named
//! `GET_LOCK`. Both are held by the connection that acquired them, so every
//! statement of a locked invocation must run on that same connection.
//! SQLite has no advisory locks; concurrent runners against one SQLite
//! database are not guarded.

use brine_schema::Driver;
use sqlx::AnyConnection;
use tracing::debug;

use crate::error::{MigrateError, Result};

/// An advisory lock identified by a numeric key.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryLock {
    driver: Driver,
    key: i64,
}

impl AdvisoryLock {
    /// Creates a lock description for `driver`.
    #[must_use]
    pub const fn new(driver: Driver, key: i64) -> Self {
        Self { driver, key }
    }

    /// Lock key.
    #[must_use]
    pub const fn key(&self) -> i64 {
        self.key
    }

    /// Name used for MySQL's string-keyed locks.
    #[must_use]
    pub fn mysql_name(&self) -> String {
        format!("brine_migrations_{}", self.key)
    }

    /// Blocks until the lock is held by `conn`.
    pub async fn acquire(&self, conn: &mut AnyConnection) -> Result<()> {
        match self.driver {
            Driver::Postgres => {
                // pg_advisory_lock returns void, which the Any driver cannot decode.
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM (SELECT pg_advisory_lock($1)) AS l",
                )
                .bind(self.key)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| MigrateError::Lock(format!("pg_advisory_lock failed: {e}")))?;
            }
            Driver::MySql => {
                let granted: Option<i64> =
                    sqlx::query_scalar("SELECT CAST(GET_LOCK(?, -1) AS SIGNED)")
                        .bind(self.mysql_name())
                        .fetch_one(&mut *conn)
                        .await
                        .map_err(|e| MigrateError::Lock(format!("GET_LOCK failed: {e}")))?;
                if granted != Some(1) {
                    return Err(MigrateError::Lock(format!(
                        "GET_LOCK('{}') was not granted",
                        self.mysql_name()
                    )));
                }
            }
            Driver::Sqlite => {
                debug!("SQLite has no advisory locks, running unguarded");
                return Ok(());
            }
        }
        debug!(key = self.key, "Acquired migration lock");
        Ok(())
    }

    /// Releases the lock held by `conn`.
    pub async fn release(&self, conn: &mut AnyConnection) -> Result<()> {
        let released = match self.driver {
            Driver::Postgres => sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
                .bind(self.key)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| MigrateError::Lock(format!("pg_advisory_unlock failed: {e}")))?,
            Driver::MySql => {
                let released: Option<i64> =
                    sqlx::query_scalar("SELECT CAST(RELEASE_LOCK(?) AS SIGNED)")
                        .bind(self.mysql_name())
                        .fetch_one(&mut *conn)
                        .await
                        .map_err(|e| MigrateError::Lock(format!("RELEASE_LOCK failed: {e}")))?;
                released == Some(1)
            }
            Driver::Sqlite => return Ok(()),
        };
        if !released {
            return Err(MigrateError::Lock(format!(
                "lock {} was not held by this session",
                self.key
            )));
        }
        debug!(key = self.key, "Released migration lock");
        Ok(())
    }
}
