//! Driver-specific SQL compilers.
//!
//! A compiler is a pure translator from an [`Operation`] to zero or more DDL
//! statements; it never executes anything. Coverage is deliberately
//! asymmetric: the Postgres compiler implements every operation, while the
//! MySQL and SQLite compilers only implement the operations that need no
//! type mapping. Everything else fails with
//! [`CompileError::Unsupported`] instead of emitting best-guess DDL, and
//! [`SqlCompiler::supports`] answers the same question up front.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;

pub use mysql::MySqlCompiler;
pub use postgres::{PostgresCompiler, quote_identifier, unquote_identifier};
pub use sqlite::SqliteCompiler;

use crate::column::Column;
use crate::error::CompileError;
use crate::operation::{Operation, OperationKind};
use crate::table::{Index, Table};
use crate::view::View;

/// Result of compiling one operation.
pub type CompileResult = Result<Vec<String>, CompileError>;

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// PostgreSQL.
    Postgres,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
}

impl Driver {
    /// Returns the canonical driver identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "pgsql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Infers the driver from a connection URL scheme.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':').map_or(url, |(scheme, _)| scheme);
        match scheme {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the SQL compiler for this driver.
    #[must_use]
    pub fn compiler(self) -> Box<dyn SqlCompiler> {
        match self {
            Self::Postgres => Box::new(PostgresCompiler::new()),
            Self::MySql => Box::new(MySqlCompiler::new()),
            Self::Sqlite => Box::new(SqliteCompiler::new()),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a driver identifier is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown database driver '{0}' (expected pgsql, mysql or sqlite)")]
pub struct UnknownDriver(pub String);

impl FromStr for Driver {
    type Err = UnknownDriver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(UnknownDriver(s.to_string())),
        }
    }
}

/// Translates operations into driver-specific DDL.
///
/// Every per-operation method defaults to an unsupported-operation error;
/// drivers override the ones they implement and report them from
/// [`supports`](Self::supports).
pub trait SqlCompiler: Send + Sync {
    /// Returns the driver this compiler targets.
    fn driver(&self) -> Driver;

    /// Returns whether `kind` compiles on this driver.
    fn supports(&self, kind: OperationKind) -> bool;

    /// Returns the unsupported-operation error for `operation`.
    fn unsupported(&self, operation: OperationKind) -> CompileError {
        CompileError::Unsupported {
            driver: self.driver(),
            operation,
        }
    }

    /// Generates CREATE TABLE.
    fn create_table(&self, _table: &Table) -> CompileResult {
        Err(self.unsupported(OperationKind::CreateTable))
    }

    /// Generates DROP TABLE IF EXISTS.
    fn drop_table_if_exists(&self, _name: &str) -> CompileResult {
        Err(self.unsupported(OperationKind::DropTableIfExists))
    }

    /// Generates ADD COLUMN for one column.
    fn add_column(&self, _table: &str, _column: &Column) -> CompileResult {
        Err(self.unsupported(OperationKind::AddColumn))
    }

    /// Generates DROP COLUMN.
    fn drop_column(&self, _table: &str, _column: &str) -> CompileResult {
        Err(self.unsupported(OperationKind::DropColumn))
    }

    /// Generates RENAME COLUMN.
    fn rename_column(&self, _table: &str, _from: &str, _to: &str) -> CompileResult {
        Err(self.unsupported(OperationKind::RenameColumn))
    }

    /// Generates CREATE [UNIQUE] INDEX.
    fn add_index(&self, index: &Index) -> CompileResult {
        Err(self.unsupported(if index.unique {
            OperationKind::AddUniqueIndex
        } else {
            OperationKind::AddIndex
        }))
    }

    /// Generates a table rename.
    fn rename_table(&self, _from: &str, _to: &str) -> CompileResult {
        Err(self.unsupported(OperationKind::RenameTable))
    }

    /// Generates CREATE VIEW.
    fn create_view(&self, _view: &View) -> CompileResult {
        Err(self.unsupported(OperationKind::CreateView))
    }

    /// Generates DROP VIEW IF EXISTS.
    fn drop_view(&self, _name: &str) -> CompileResult {
        Err(self.unsupported(OperationKind::DropView))
    }

    /// Compiles one operation.
    fn compile(&self, operation: &Operation) -> CompileResult {
        match operation {
            Operation::CreateTable(table) => self.create_table(table),
            Operation::DropTableIfExists { table } => self.drop_table_if_exists(table),
            Operation::RenameTable { from, to } => self.rename_table(from, to),
            Operation::AddColumn { table, definition } => {
                if !self.supports(OperationKind::AddColumn) {
                    return Err(self.unsupported(OperationKind::AddColumn));
                }
                let mut statements = Vec::new();
                for column in definition.columns(table) {
                    statements.extend(self.add_column(table, &column)?);
                }
                Ok(statements)
            }
            Operation::DropColumn { table, column } => self.drop_column(table, column),
            Operation::RenameColumn { table, from, to } => self.rename_column(table, from, to),
            Operation::AddIndex(index) | Operation::AddUniqueIndex(index) => self.add_index(index),
            Operation::CreateView(view) => self.create_view(view),
            Operation::DropView { name } => self.drop_view(name),
        }
    }

    /// Compiles a whole operation log, in order.
    fn compile_all(&self, operations: &[Operation]) -> CompileResult {
        let mut statements = Vec::new();
        for operation in operations {
            statements.extend(self.compile(operation)?);
        }
        Ok(statements)
    }
}
