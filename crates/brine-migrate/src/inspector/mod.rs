//! Schema inspection.
//!
//! Migrations are ordinary Rust code, so the only way to learn the schema
//! they describe is to run them. The inspector discovers the migration types
//! of a project, generates a small binary crate that replays every `up`
//! against an in-memory [`SchemaSnapshot`], runs it through cargo, and
//! decodes the JSON it prints.
//!
//! The crate is generated in a temporary directory inside the project root,
//! which is removed however the inspection ends.

pub mod program;

use std::fs;
use std::process::Output;

use brine_schema::snapshot::{InspectorPayload, SchemaSnapshot};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::InspectorConfig;
use crate::discovery::{self, DiscoveredMigration};
use crate::error::{MigrateError, Result};

pub use program::InspectorProgram;

/// Runs the inspector for one project.
#[derive(Debug, Clone)]
pub struct Inspector {
    config: InspectorConfig,
}

impl Inspector {
    /// Creates an inspector.
    #[must_use]
    pub const fn new(config: InspectorConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &InspectorConfig {
        &self.config
    }

    /// Lists the project's migration types, in replay order.
    ///
    /// # Errors
    ///
    /// See [`discovery::discover`].
    pub fn discover(&self) -> Result<Vec<DiscoveredMigration>> {
        discovery::discover(&self.config.migrations_path())
    }

    /// Returns the cumulative schema described by the project's migrations.
    ///
    /// A project without migration types yields an empty snapshot without
    /// spawning anything.
    ///
    /// # Errors
    ///
    /// Returns discovery errors, [`MigrateError::Inspection`] if the
    /// generated program fails to build or run, and [`MigrateError::Decode`]
    /// if it prints something other than a payload.
    pub async fn inspect(&self) -> Result<SchemaSnapshot> {
        let mut migrations = self.discover()?;
        if migrations.is_empty() {
            info!("No migrations found, schema is empty");
            return Ok(SchemaSnapshot::default());
        }
        for migration in &mut migrations {
            migration.path = fs::canonicalize(&migration.path)?;
        }
        info!(count = migrations.len(), "Inspecting migrations");

        let schema_dependency = fs::canonicalize(&self.config.schema_dependency).map_err(|e| {
            MigrateError::Config(format!(
                "brine-schema not found at {}: {e}; set --schema-path or BRINE_SCHEMA_PATH",
                self.config.schema_dependency.display()
            ))
        })?;

        // Removed on drop, on every exit path below.
        let workdir = tempfile::Builder::new()
            .prefix(".brine-inspect")
            .tempdir_in(&self.config.project_root)?;
        let manifest_path =
            InspectorProgram::generate(&migrations, &schema_dependency).write_to(workdir.path())?;
        debug!(manifest = %manifest_path.display(), "Generated inspector crate");

        let output = Command::new(&self.config.toolchain)
            .arg("run")
            .arg("--quiet")
            .arg("--manifest-path")
            .arg(&manifest_path)
            .arg("--")
            .arg("--json")
            .env("CARGO_TARGET_DIR", self.config.target_path())
            .current_dir(&self.config.project_root)
            .output()
            .await
            .map_err(|e| MigrateError::Inspection {
                message: format!(
                    "failed to start {}: {e}",
                    self.config.toolchain.to_string_lossy()
                ),
                output: String::new(),
            })?;

        if !output.status.success() {
            return Err(MigrateError::Inspection {
                message: format!("inspector exited with {}", output.status),
                output: combined_output(&output),
            });
        }

        decode_payload(&output.stdout)
    }
}

/// Decodes the inspector's stdout.
///
/// # Errors
///
/// Returns [`MigrateError::Decode`] for anything but a valid payload.
pub fn decode_payload(stdout: &[u8]) -> Result<SchemaSnapshot> {
    let payload: InspectorPayload = serde_json::from_slice(stdout).map_err(MigrateError::Decode)?;
    Ok(payload.into())
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
