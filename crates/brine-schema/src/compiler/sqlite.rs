//! SQLite compiler.
//!
//! Covers drops and renames only. SQLite cannot drop a column without a
//! table rebuild, so `drop_column` stays unsupported here.

use super::{CompileResult, Driver, SqlCompiler, quote_identifier};
use crate::operation::OperationKind;

/// SQLite compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCompiler;

impl SqliteCompiler {
    /// Creates a new SQLite compiler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlCompiler for SqliteCompiler {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn supports(&self, kind: OperationKind) -> bool {
        matches!(
            kind,
            OperationKind::DropTableIfExists
                | OperationKind::RenameColumn
                | OperationKind::RenameTable
                | OperationKind::DropView
        )
    }

    fn drop_table_if_exists(&self, name: &str) -> CompileResult {
        Ok(vec![format!("DROP TABLE IF EXISTS {}", quote_identifier(name))])
    }

    fn rename_column(&self, table: &str, from: &str, to: &str) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_identifier(table),
            quote_identifier(from),
            quote_identifier(to)
        )])
    }

    fn rename_table(&self, from: &str, to: &str) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_identifier(from),
            quote_identifier(to)
        )])
    }

    fn drop_view(&self, name: &str) -> CompileResult {
        Ok(vec![format!("DROP VIEW IF EXISTS {}", quote_identifier(name))])
    }
}
