//! Runner behavior against an in-memory SQLite database.
//!
//! The SQLite compiler only covers drops and renames, so these tests compile
//! with the Postgres compiler (whose DDL SQLite accepts) minus CASCADE. The
//! bookkeeping, placeholder and lock paths are the real SQLite ones.

use brine_migrate::cli::{self, MigrateCommand};
use brine_migrate::prelude::*;
use brine_schema::compiler::{CompileResult, PostgresCompiler};
use brine_schema::{Index, OperationKind};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

struct SqliteDdl(PostgresCompiler);

impl SqlCompiler for SqliteDdl {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn supports(&self, _kind: OperationKind) -> bool {
        true
    }

    fn create_table(&self, table: &Table) -> CompileResult {
        self.0.create_table(table)
    }

    fn drop_table_if_exists(&self, name: &str) -> CompileResult {
        Ok(vec![format!("DROP TABLE IF EXISTS \"{name}\"")])
    }

    fn add_column(&self, table: &str, column: &Column) -> CompileResult {
        self.0.add_column(table, column)
    }

    fn drop_column(&self, table: &str, column: &str) -> CompileResult {
        self.0.drop_column(table, column)
    }

    fn rename_column(&self, table: &str, from: &str, to: &str) -> CompileResult {
        self.0.rename_column(table, from, to)
    }

    fn add_index(&self, index: &Index) -> CompileResult {
        self.0.add_index(index)
    }

    fn rename_table(&self, from: &str, to: &str) -> CompileResult {
        self.0.rename_table(from, to)
    }

    fn create_view(&self, view: &View) -> CompileResult {
        self.0.create_view(view)
    }

    fn drop_view(&self, name: &str) -> CompileResult {
        self.0.drop_view(name)
    }
}

async fn create_test_runner() -> Runner {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    Runner::with_compiler(pool, Driver::Sqlite, Box::new(SqliteDdl(PostgresCompiler::new())))
}

async fn table_exists(pool: &AnyPool, name: &str) -> bool {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap();
    count > 0
}

async fn recorded(pool: &AnyPool) -> Vec<(String, i64)> {
    sqlx::query_as("SELECT migration, batch FROM migrations ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

// ============================================================================
// Migrations
// ============================================================================

#[derive(Default)]
struct CreateUsersTable(Migration);

impl Migrate for CreateUsersTable {
    fn recorder(&mut self) -> &mut Migration {
        &mut self.0
    }

    fn up(&mut self) {
        self.0.create_table("users", |t| {
            t.uuid("id").primary_key();
            t.string("email").unique();
            t.timestamps();
        });
    }

    fn down(&mut self) {
        self.0.drop_table_if_exists("users");
    }
}

#[derive(Default)]
struct CreatePostsTable(Migration);

impl Migrate for CreatePostsTable {
    fn recorder(&mut self) -> &mut Migration {
        &mut self.0
    }

    fn up(&mut self) {
        self.0.create_table("posts", |t| {
            t.uuid("id").primary_key();
            t.uuid("user_id").foreign_key("users", "id");
            t.string("title");
        });
        self.0.add_index("posts", &["user_id"]);
    }

    fn down(&mut self) {
        self.0.drop_table_if_exists("posts");
    }
}

#[derive(Default)]
struct CreateTagsTable(Migration);

impl Migrate for CreateTagsTable {
    fn recorder(&mut self) -> &mut Migration {
        &mut self.0
    }

    fn up(&mut self) {
        self.0.create_table("tags", |t| {
            t.integer("id").primary_key();
            t.string("label");
        });
    }

    fn down(&mut self) {
        self.0.drop_table_if_exists("tags");
    }
}

/// Creates a table, then fails on a table that does not exist.
#[derive(Default)]
struct BrokenMigration {
    recorder: Migration,
    transactional: bool,
}

impl Migrate for BrokenMigration {
    fn recorder(&mut self) -> &mut Migration {
        &mut self.recorder
    }

    fn up(&mut self) {
        self.recorder.create_table("partial", |t| {
            t.integer("id").primary_key();
        });
        self.recorder.add_column("ghosts", |t| {
            t.text("boo").nullable();
        });
    }

    fn down(&mut self) {
        self.recorder.drop_table_if_exists("partial");
    }

    fn transactional(&self) -> bool {
        self.transactional
    }
}

fn registry() -> Vec<MigrationEntry> {
    vec![
        MigrationEntry::new("2026_01_01_create_users_table", CreateUsersTable::default()),
        MigrationEntry::new("2026_01_02_create_posts_table", CreatePostsTable::default()),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_migrate_applies_in_order_as_one_batch() {
    let runner = create_test_runner().await;
    let mut entries = registry();

    let migrated = runner.migrate(&mut entries).await.unwrap();
    assert_eq!(
        migrated,
        vec!["2026_01_01_create_users_table", "2026_01_02_create_posts_table"]
    );

    assert!(table_exists(runner.pool(), "users").await);
    assert!(table_exists(runner.pool(), "posts").await);
    assert_eq!(
        recorded(runner.pool()).await,
        vec![
            ("2026_01_01_create_users_table".to_string(), 1),
            ("2026_01_02_create_posts_table".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn test_migrate_twice_applies_nothing() {
    let runner = create_test_runner().await;
    let mut entries = registry();

    runner.migrate(&mut entries).await.unwrap();
    let second = runner.migrate(&mut entries).await.unwrap();

    assert!(second.is_empty());
    assert_eq!(recorded(runner.pool()).await.len(), 2);
}

#[tokio::test]
async fn test_rollback_reverts_only_the_last_batch() {
    let runner = create_test_runner().await;
    let mut entries = registry();
    runner.migrate(&mut entries).await.unwrap();

    entries.push(MigrationEntry::new(
        "2026_01_03_create_tags_table",
        CreateTagsTable::default(),
    ));
    let migrated = runner.migrate(&mut entries).await.unwrap();
    assert_eq!(migrated, vec!["2026_01_03_create_tags_table"]);
    assert_eq!(recorded(runner.pool()).await[2].1, 2);

    let rolled_back = runner.rollback(&mut entries).await.unwrap();
    assert_eq!(rolled_back, vec!["2026_01_03_create_tags_table"]);
    assert!(!table_exists(runner.pool(), "tags").await);
    assert!(table_exists(runner.pool(), "users").await);
    assert!(table_exists(runner.pool(), "posts").await);

    // The next rollback takes batch 1, newest first.
    let rolled_back = runner.rollback(&mut entries).await.unwrap();
    assert_eq!(
        rolled_back,
        vec!["2026_01_02_create_posts_table", "2026_01_01_create_users_table"]
    );
    assert!(recorded(runner.pool()).await.is_empty());
}

#[tokio::test]
async fn test_rollback_with_nothing_applied() {
    let runner = create_test_runner().await;
    let mut entries = registry();

    assert!(runner.rollback(&mut entries).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transactional_failure_leaves_no_trace() {
    let runner = create_test_runner().await;
    let mut entries = registry();
    entries.push(MigrationEntry::new(
        "2026_01_03_broken",
        BrokenMigration {
            recorder: Migration::new(),
            transactional: true,
        },
    ));

    let err = runner.migrate(&mut entries).await.unwrap_err();
    match err {
        MigrateError::Migration { id, source } => {
            assert_eq!(id, "2026_01_03_broken");
            assert!(matches!(*source, MigrateError::Execution { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Earlier migrations of the same run stay applied.
    assert_eq!(recorded(runner.pool()).await.len(), 2);
    assert!(table_exists(runner.pool(), "users").await);
    assert!(!table_exists(runner.pool(), "partial").await);
}

#[tokio::test]
async fn test_non_transactional_failure_keeps_partial_changes() {
    let runner = create_test_runner().await;
    let mut entries = vec![MigrationEntry::new(
        "2026_01_03_broken",
        BrokenMigration::default(),
    )];

    assert!(runner.migrate(&mut entries).await.is_err());
    assert!(table_exists(runner.pool(), "partial").await);
    assert!(recorded(runner.pool()).await.is_empty());
}

#[tokio::test]
async fn test_fresh_rebuilds_everything_in_batch_one() {
    let runner = create_test_runner().await;
    let mut entries = registry();
    runner.migrate(&mut entries[..1]).await.unwrap();
    runner.migrate(&mut entries).await.unwrap();
    assert_eq!(recorded(runner.pool()).await[1].1, 2);

    sqlx::query("INSERT INTO users (id, email, created_at, updated_at) VALUES ('u1', 'a@b.c', 'now', 'now')")
        .execute(runner.pool())
        .await
        .unwrap();

    let migrated = runner.fresh(&mut entries).await.unwrap();
    assert_eq!(migrated.len(), 2);
    assert_eq!(
        recorded(runner.pool()).await,
        vec![
            ("2026_01_01_create_users_table".to_string(), 1),
            ("2026_01_02_create_posts_table".to_string(), 1),
        ]
    );

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(runner.pool())
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn test_fresh_on_empty_database() {
    let runner = create_test_runner().await;
    let mut entries = registry();

    // Teardown of tables that never existed is ignored.
    let migrated = runner.fresh(&mut entries).await.unwrap();
    assert_eq!(migrated.len(), 2);
}

#[tokio::test]
async fn test_status_reports_batches() {
    let runner = create_test_runner().await;
    let mut entries = registry();
    runner.migrate(&mut entries[..1]).await.unwrap();

    let status = runner.status(&entries).await.unwrap();
    assert_eq!(
        status,
        vec![
            MigrationStatus {
                id: "2026_01_01_create_users_table".into(),
                batch: Some(1),
                applied: true,
            },
            MigrationStatus {
                id: "2026_01_02_create_posts_table".into(),
                batch: None,
                applied: false,
            },
        ]
    );
}

#[tokio::test]
async fn test_sql_preview_does_not_execute() {
    let runner = create_test_runner().await;
    let mut entries = registry();

    let up = runner.sql_for(&mut entries[1], Direction::Up).unwrap();
    assert_eq!(up.len(), 2);
    assert!(up[1].starts_with("CREATE INDEX IF NOT EXISTS \"posts_user_id_idx\""));

    let down = runner.sql_for(&mut entries[1], Direction::Down).unwrap();
    assert_eq!(down, vec!["DROP TABLE IF EXISTS \"posts\""]);

    assert!(!table_exists(runner.pool(), "posts").await);
}

#[tokio::test]
async fn test_unsupported_operation_fails_before_executing() {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let runner = Runner::new(pool, Driver::Sqlite);
    let mut entries = registry();

    let err = runner.migrate(&mut entries).await.unwrap_err();
    match err {
        MigrateError::Migration { source, .. } => {
            assert!(matches!(*source, MigrateError::Compile(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(recorded(runner.pool()).await.is_empty());
}

#[tokio::test]
async fn test_pending_reads_without_bootstrapping() {
    let runner = create_test_runner().await;
    let mut entries = registry();

    let pending = runner.pending(&entries).await.unwrap();
    assert_eq!(
        pending,
        vec!["2026_01_01_create_users_table", "2026_01_02_create_posts_table"]
    );
    assert!(!table_exists(runner.pool(), "migrations").await);

    runner.migrate(&mut entries[..1]).await.unwrap();
    assert_eq!(
        runner.pending(&entries).await.unwrap(),
        vec!["2026_01_02_create_posts_table"]
    );
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let runner = create_test_runner().await;
    let mut entries = registry();

    cli::execute(&runner, MigrateCommand::Migrate { dry_run: true }, &mut entries)
        .await
        .unwrap();

    assert!(!table_exists(runner.pool(), "migrations").await);
    assert!(!table_exists(runner.pool(), "users").await);
}

