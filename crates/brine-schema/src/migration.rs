//! The migration recorder and the `Migrate` trait.
//!
//! Every authored migration is a tuple struct whose single field is the
//! [`Migration`] recorder. Its `up`/`down` hooks call recorder methods, which
//! append [`Operation`]s to an ordered log; nothing touches a database here.
//!
//! ```rust
//! use brine_schema::{Migrate, Migration};
//!
//! #[derive(Default)]
//! pub struct CreateUsersTable(Migration);
//!
//! impl Migrate for CreateUsersTable {
//!     fn recorder(&mut self) -> &mut Migration {
//!         &mut self.0
//!     }
//!
//!     fn up(&mut self) {
//!         self.0.create_table("users", |t| {
//!             t.uuid("id").primary_key().default("gen_random_uuid()");
//!             t.string("email").not_null().unique();
//!             t.timestamps();
//!         });
//!         self.0.add_index("users", &["email"]);
//!     }
//!
//!     fn down(&mut self) {
//!         self.0.drop_table_if_exists("users");
//!     }
//! }
//!
//! let mut migration = CreateUsersTable::default();
//! assert_eq!(migration.record_up().len(), 2);
//! assert_eq!(migration.record_down().len(), 1);
//! ```

use crate::operation::{ColumnDefinition, Operation};
use crate::table::{Index, Table};
use crate::view::View;

/// Records schema operations in call order.
#[derive(Debug, Clone, Default)]
pub struct Migration {
    operations: Vec<Operation>,
}

impl Migration {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Builds a table with `define` and records its creation.
    pub fn create_table(&mut self, name: &str, define: impl FnOnce(&mut Table)) {
        let mut table = Table::new(name);
        define(&mut table);
        self.record(Operation::CreateTable(table));
    }

    /// Records `DROP TABLE IF EXISTS`.
    pub fn drop_table_if_exists(&mut self, name: &str) {
        self.record(Operation::DropTableIfExists {
            table: name.to_string(),
        });
    }

    /// Records a table rename.
    pub fn rename_table(&mut self, from: &str, to: &str) {
        self.record(Operation::RenameTable {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    /// Records the addition of every column `define` declares.
    ///
    /// The callback is stored and evaluated later, once per compilation or
    /// snapshot replay.
    pub fn add_column(&mut self, table: &str, define: impl Fn(&mut Table) + Send + Sync + 'static) {
        self.record(Operation::AddColumn {
            table: table.to_string(),
            definition: ColumnDefinition::new(define),
        });
    }

    /// Records a column drop.
    pub fn drop_column(&mut self, table: &str, column: &str) {
        self.record(Operation::DropColumn {
            table: table.to_string(),
            column: column.to_string(),
        });
    }

    /// Records a column rename.
    pub fn rename_column(&mut self, table: &str, from: &str, to: &str) {
        self.record(Operation::RenameColumn {
            table: table.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    /// Records a non-unique index over `columns`, in the given order.
    pub fn add_index<S: AsRef<str>>(&mut self, table: &str, columns: &[S]) {
        self.record(Operation::AddIndex(Index::new(table, columns, false)));
    }

    /// Records a unique index over `columns`, in the given order.
    pub fn add_unique_index<S: AsRef<str>>(&mut self, table: &str, columns: &[S]) {
        self.record(Operation::AddUniqueIndex(Index::new(table, columns, true)));
    }

    /// Builds a view with `define` and records its creation.
    pub fn create_view(&mut self, name: &str, define: impl FnOnce(&mut View)) {
        let mut view = View::new(name);
        define(&mut view);
        self.record(Operation::CreateView(view));
    }

    /// Records `DROP VIEW IF EXISTS`.
    pub fn drop_view(&mut self, name: &str) {
        self.record(Operation::DropView {
            name: name.to_string(),
        });
    }

    /// Clears the log so the recorder can be reused.
    pub fn reset(&mut self) {
        self.operations.clear();
    }

    /// Returns the recorded operations.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Moves the recorded operations out, leaving the log empty.
    pub fn take_operations(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.operations)
    }
}

/// An authored migration.
///
/// Implementors embed a [`Migration`] and expose it through `recorder`.
/// `up` and `down` only record; the runner decides what executes.
pub trait Migrate: Send {
    /// Returns the embedded recorder.
    fn recorder(&mut self) -> &mut Migration;

    /// Records the forward schema change.
    fn up(&mut self);

    /// Records the reverse schema change.
    fn down(&mut self);

    /// Whether the migration's statements run inside one transaction.
    ///
    /// Override to return `false` for statements that cannot run in a
    /// transaction. `down` must then be safe to re-run after a partial
    /// failure (use `drop_table_if_exists` and friends).
    fn transactional(&self) -> bool {
        true
    }

    /// Resets the recorder, runs `up`, and returns the recorded log.
    fn record_up(&mut self) -> Vec<Operation> {
        self.recorder().reset();
        self.up();
        self.recorder().take_operations()
    }

    /// Resets the recorder, runs `down`, and returns the recorded log.
    fn record_down(&mut self) -> Vec<Operation> {
        self.recorder().reset();
        self.down();
        self.recorder().take_operations()
    }
}
