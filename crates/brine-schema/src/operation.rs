//! Recorded schema operations.

use std::fmt;
use std::sync::Arc;

use crate::column::Column;
use crate::table::{Index, Table};
use crate::view::View;

/// Deferred column definition recorded by `add_column`.
///
/// The callback runs against a table each time the operation is compiled
/// or folded into a snapshot, so it must be repeatable.
#[derive(Clone)]
pub struct ColumnDefinition(Arc<dyn Fn(&mut Table) + Send + Sync>);

impl ColumnDefinition {
    /// Wraps a column-defining callback.
    pub fn new(define: impl Fn(&mut Table) + Send + Sync + 'static) -> Self {
        Self(Arc::new(define))
    }

    /// Applies the callback to `table`, appending whatever columns it defines.
    pub fn apply(&self, table: &mut Table) {
        (self.0)(table);
    }

    /// Runs the callback against a scratch table and returns the columns it
    /// declared.
    #[must_use]
    pub fn columns(&self, table: &str) -> Vec<Column> {
        let mut scratch = Table::new(table);
        self.apply(&mut scratch);
        scratch.columns
    }
}

impl fmt::Debug for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ColumnDefinition").field(&"<fn>").finish()
    }
}

/// One recorded schema change.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Create a table.
    CreateTable(Table),
    /// Drop a table if it exists.
    DropTableIfExists {
        /// Table name.
        table: String,
    },
    /// Rename a table.
    RenameTable {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Add the columns produced by a deferred definition.
    AddColumn {
        /// Target table.
        table: String,
        /// Column-defining callback.
        definition: ColumnDefinition,
    },
    /// Drop a column.
    DropColumn {
        /// Target table.
        table: String,
        /// Column name.
        column: String,
    },
    /// Rename a column.
    RenameColumn {
        /// Target table.
        table: String,
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Create a non-unique index.
    AddIndex(Index),
    /// Create a unique index.
    AddUniqueIndex(Index),
    /// Create a view.
    CreateView(View),
    /// Drop a view if it exists.
    DropView {
        /// View name.
        name: String,
    },
}

impl Operation {
    /// Returns the fieldless tag of this operation.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::CreateTable(_) => OperationKind::CreateTable,
            Self::DropTableIfExists { .. } => OperationKind::DropTableIfExists,
            Self::RenameTable { .. } => OperationKind::RenameTable,
            Self::AddColumn { .. } => OperationKind::AddColumn,
            Self::DropColumn { .. } => OperationKind::DropColumn,
            Self::RenameColumn { .. } => OperationKind::RenameColumn,
            Self::AddIndex(_) => OperationKind::AddIndex,
            Self::AddUniqueIndex(_) => OperationKind::AddUniqueIndex,
            Self::CreateView(_) => OperationKind::CreateView,
            Self::DropView { .. } => OperationKind::DropView,
        }
    }
}

/// Operation tags, used for driver capability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// See [`Operation::CreateTable`].
    CreateTable,
    /// See [`Operation::DropTableIfExists`].
    DropTableIfExists,
    /// See [`Operation::RenameTable`].
    RenameTable,
    /// See [`Operation::AddColumn`].
    AddColumn,
    /// See [`Operation::DropColumn`].
    DropColumn,
    /// See [`Operation::RenameColumn`].
    RenameColumn,
    /// See [`Operation::AddIndex`].
    AddIndex,
    /// See [`Operation::AddUniqueIndex`].
    AddUniqueIndex,
    /// See [`Operation::CreateView`].
    CreateView,
    /// See [`Operation::DropView`].
    DropView,
}

impl OperationKind {
    /// Every operation kind.
    pub const ALL: [Self; 10] = [
        Self::CreateTable,
        Self::DropTableIfExists,
        Self::RenameTable,
        Self::AddColumn,
        Self::DropColumn,
        Self::RenameColumn,
        Self::AddIndex,
        Self::AddUniqueIndex,
        Self::CreateView,
        Self::DropView,
    ];

    /// Returns a human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTable => "create table",
            Self::DropTableIfExists => "drop table",
            Self::RenameTable => "rename table",
            Self::AddColumn => "add column",
            Self::DropColumn => "drop column",
            Self::RenameColumn => "rename column",
            Self::AddIndex => "add index",
            Self::AddUniqueIndex => "add unique index",
            Self::CreateView => "create view",
            Self::DropView => "drop view",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
