//! MySQL compiler.
//!
//! Only covers operations that need no type mapping. Table creation, column
//! additions, indexes and views report [`CompileError::Unsupported`].
//!
//! [`CompileError::Unsupported`]: crate::CompileError::Unsupported

use super::{CompileResult, Driver, SqlCompiler};
use crate::operation::OperationKind;

/// Quotes a MySQL identifier with backticks.
fn quote(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// MySQL compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlCompiler;

impl MySqlCompiler {
    /// Creates a new MySQL compiler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlCompiler for MySqlCompiler {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn supports(&self, kind: OperationKind) -> bool {
        matches!(
            kind,
            OperationKind::DropTableIfExists
                | OperationKind::DropColumn
                | OperationKind::RenameColumn
                | OperationKind::RenameTable
                | OperationKind::DropView
        )
    }

    fn drop_table_if_exists(&self, name: &str) -> CompileResult {
        Ok(vec![format!("DROP TABLE IF EXISTS {}", quote(name))])
    }

    fn drop_column(&self, table: &str, column: &str) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote(table),
            quote(column)
        )])
    }

    fn rename_column(&self, table: &str, from: &str, to: &str) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote(table),
            quote(from),
            quote(to)
        )])
    }

    fn rename_table(&self, from: &str, to: &str) -> CompileResult {
        Ok(vec![format!("RENAME TABLE {} TO {}", quote(from), quote(to))])
    }

    fn drop_view(&self, name: &str) -> CompileResult {
        Ok(vec![format!("DROP VIEW IF EXISTS {}", quote(name))])
    }
}
