//! Declarative schema changes for brine migrations.
//!
//! `brine-schema` holds everything about a migration that does not need a
//! database:
//!
//! - **Model** - [`Table`], [`Column`], [`View`] and the builder DSL used to
//!   describe them
//! - **Recorder** - [`Migration`] and the [`Migrate`] trait; `up`/`down`
//!   record an ordered log of [`Operation`]s
//! - **Compilers** - one [`SqlCompiler`] per [`Driver`], translating
//!   operations to DDL
//! - **Snapshot** - [`SchemaSnapshot`], the cumulative schema obtained by
//!   replaying every `up`, and its JSON wire form
//!
//! # Example
//!
//! ```rust
//! use brine_schema::prelude::*;
//!
//! #[derive(Default)]
//! pub struct CreatePostsTable(Migration);
//!
//! impl Migrate for CreatePostsTable {
//!     fn recorder(&mut self) -> &mut Migration {
//!         &mut self.0
//!     }
//!
//!     fn up(&mut self) {
//!         self.0.create_table("posts", |t| {
//!             t.uuid("id").primary_key().default("gen_random_uuid()");
//!             t.uuid("user_id").foreign_key("users", "id").is_owner();
//!             t.string("title");
//!             t.timestamps();
//!         });
//!         self.0.add_index("posts", &["user_id"]);
//!     }
//!
//!     fn down(&mut self) {
//!         self.0.drop_table_if_exists("posts");
//!     }
//! }
//!
//! let mut migration = CreatePostsTable::default();
//! let sql = Driver::Postgres
//!     .compiler()
//!     .compile_all(&migration.record_up())
//!     .unwrap();
//! assert_eq!(
//!     sql[1],
//!     r#"CREATE INDEX IF NOT EXISTS "posts_user_id_idx" ON "posts" ("user_id")"#
//! );
//! ```

pub mod column;
pub mod compiler;
pub mod error;
pub mod migration;
pub mod operation;
pub mod snapshot;
pub mod table;
pub mod view;

pub use column::{Column, ColumnType, DefaultValue, ForeignKey};
pub use compiler::{Driver, SqlCompiler};
pub use error::{CompileError, SchemaError};
pub use migration::{Migrate, Migration};
pub use operation::{Operation, OperationKind};
pub use snapshot::SchemaSnapshot;
pub use table::{Index, Table};
pub use view::{View, ViewColumn};

/// Prelude for migration files.
pub mod prelude {
    pub use crate::column::{Column, ColumnType, DefaultValue};
    pub use crate::compiler::{Driver, SqlCompiler};
    pub use crate::migration::{Migrate, Migration};
    pub use crate::table::Table;
    pub use crate::view::View;
}
