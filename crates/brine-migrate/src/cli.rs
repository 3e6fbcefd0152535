//! Command-line front end for application migration binaries.
//!
//! An application owns its migration registry, so it provides the binary:
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     brine_migrate::cli::run(vec![
//!         MigrationEntry::new("2026_01_01_create_users_table", CreateUsersTable::default()),
//!         MigrationEntry::new("2026_01_02_create_posts_table", CreatePostsTable::default()),
//!     ])
//!     .await
//! }
//! ```
//!
//! which then understands `migrate`, `rollback`, `fresh`, `status` and `sql`.

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::config::DatabaseConfig;
use crate::runner::{Direction, MigrationEntry, Runner, print_status};

/// Arguments of an application migration binary.
#[derive(Debug, Parser)]
#[command(name = "migrate")]
#[command(version, about = "Apply and revert database migrations", long_about = None)]
pub struct MigrateCli {
    /// Connection settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Runner commands.
#[derive(Debug, Clone, Subcommand)]
pub enum MigrateCommand {
    /// Apply pending migrations as a new batch.
    Migrate {
        /// Print the SQL of pending migrations instead of executing it.
        /// Nothing is written, not even the bookkeeping table.
        #[arg(long)]
        dry_run: bool,
    },

    /// Revert the most recent batch.
    Rollback,

    /// Tear everything down and re-apply every migration.
    Fresh,

    /// Show which migrations have been applied.
    Status {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show the SQL of one migration without executing it.
    Sql {
        /// Registry id of the migration.
        id: String,

        /// Show the rollback SQL instead.
        #[arg(short, long)]
        down: bool,
    },
}

/// Installs the global tracing subscriber. Logs go to stderr so stdout stays
/// free for command output.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Parses the process arguments and runs the command over `entries`.
///
/// # Errors
///
/// Returns any configuration, connection or migration error.
pub async fn run(entries: Vec<MigrationEntry>) -> anyhow::Result<()> {
    run_with(MigrateCli::parse(), entries).await
}

/// Runs already-parsed arguments over `entries`.
///
/// # Errors
///
/// Returns any configuration, connection or migration error.
pub async fn run_with(cli: MigrateCli, mut entries: Vec<MigrationEntry>) -> anyhow::Result<()> {
    init_tracing(cli.verbose)?;
    let runner = Runner::connect(&cli.database).await?;
    let result = execute(&runner, cli.command, &mut entries).await;
    runner.close().await;
    result
}

/// Runs one command with an existing runner.
///
/// # Errors
///
/// Returns the runner's error, or an error for an unknown id in `sql`.
pub async fn execute(
    runner: &Runner,
    command: MigrateCommand,
    entries: &mut [MigrationEntry],
) -> anyhow::Result<()> {
    match command {
        MigrateCommand::Migrate { dry_run: true } => {
            let pending = runner.pending(entries).await?;
            for entry in entries.iter_mut().filter(|e| pending.contains(&e.id)) {
                println!("-- {}", entry.id);
                for sql in runner.sql_for(entry, Direction::Up)? {
                    println!("{sql};");
                }
            }
        }
        MigrateCommand::Migrate { dry_run: false } => {
            let migrated = runner.migrate(entries).await?;
            info!(count = migrated.len(), "Migration complete");
        }
        MigrateCommand::Rollback => {
            let rolled_back = runner.rollback(entries).await?;
            info!(count = rolled_back.len(), "Rollback complete");
        }
        MigrateCommand::Fresh => {
            let migrated = runner.fresh(entries).await?;
            info!(count = migrated.len(), "Fresh migration complete");
        }
        MigrateCommand::Status { json: false } => {
            print_status(&runner.status(entries).await?);
        }
        MigrateCommand::Status { json: true } => {
            let statuses = runner.status(entries).await?;
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
        MigrateCommand::Sql { id, down } => {
            let entry = entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| anyhow::anyhow!("no migration registered as '{id}'"))?;
            let direction = if down { Direction::Down } else { Direction::Up };
            for sql in runner.sql_for(entry, direction)? {
                println!("{sql};");
            }
        }
    }
    Ok(())
}
