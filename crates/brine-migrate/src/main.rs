//! brine CLI
//!
//! Project-level tooling: lists a project's migration types and prints the
//! schema they describe.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use brine_migrate::cli::init_tracing;
use brine_migrate::prelude::*;

/// Schema tooling for brine migrations.
#[derive(Parser)]
#[command(name = "brine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project root.
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Migrations directory, relative to the project root.
    #[arg(short, long, default_value = "migrations")]
    migrations_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered migration types in replay order.
    Discover,

    /// Print the cumulative schema as JSON.
    Inspect {
        /// Path of the brine-schema crate used by the inspector. Required
        /// unless brine was built from a workspace checkout on this machine.
        #[arg(long, env = "BRINE_SCHEMA_PATH")]
        schema_path: Option<PathBuf>,

        /// Cargo target directory for inspector builds.
        #[arg(long)]
        target_dir: Option<PathBuf>,

        /// Program used instead of cargo.
        #[arg(long, env = "CARGO", default_value = "cargo")]
        toolchain: String,

        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = InspectorConfig::new(&cli.project).migrations_dir(&cli.migrations_dir);

    match cli.command {
        Commands::Discover => {
            let inspector = Inspector::new(config);
            let migrations = inspector.discover()?;
            if migrations.is_empty() {
                info!("No migrations found.");
            }
            for migration in &migrations {
                println!("{}  {}", migration.file_stem(), migration.type_name);
            }
        }

        Commands::Inspect {
            schema_path,
            target_dir,
            toolchain,
            pretty,
        } => {
            config = config.toolchain(toolchain);
            if let Some(path) = schema_path {
                config = config.schema_dependency(path);
            }
            if let Some(dir) = target_dir {
                config = config.target_dir(dir);
            }

            let snapshot = Inspector::new(config).inspect().await?;
            let payload = snapshot.to_payload();
            let json = if pretty {
                serde_json::to_string_pretty(&payload)?
            } else {
                serde_json::to_string(&payload)?
            };
            println!("{json}");
        }
    }

    Ok(())
}
