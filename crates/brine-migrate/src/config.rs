//! Connection and inspector configuration.

use std::ffi::OsString;
use std::path::PathBuf;

use brine_schema::Driver;

use crate::error::{MigrateError, Result};

/// Advisory lock key used when none is configured.
pub const DEFAULT_LOCK_KEY: i64 = 20_260_101;

/// Database connection settings.
///
/// Parsed from the command line with environment fallbacks, or built in
/// code with [`DatabaseConfig::new`].
#[derive(Debug, Clone, clap::Args)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...`, `mysql://...`, `sqlite:...`).
    #[arg(long = "database-url", env = "DATABASE_URL")]
    pub url: String,

    /// Driver identifier (pgsql, mysql, sqlite). Inferred from the URL if omitted.
    #[arg(long, env = "DB_CONNECTION")]
    pub driver: Option<Driver>,

    /// Maximum pool size.
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,

    /// Advisory lock key shared by every migrating process.
    #[arg(long, default_value_t = DEFAULT_LOCK_KEY)]
    pub lock_key: i64,
}

impl DatabaseConfig {
    /// Creates a configuration for `url` with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            driver: None,
            max_connections: 5,
            lock_key: DEFAULT_LOCK_KEY,
        }
    }

    /// Sets the driver explicitly.
    #[must_use]
    pub const fn driver(mut self, driver: Driver) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Sets the pool size.
    #[must_use]
    pub const fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Returns the configured driver, falling back to the URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Config`] if neither names a known driver.
    pub fn resolve_driver(&self) -> Result<Driver> {
        self.driver
            .or_else(|| Driver::from_url(&self.url))
            .ok_or_else(|| {
                MigrateError::Config(format!(
                    "cannot infer the database driver from '{}'; set DB_CONNECTION",
                    self.url
                ))
            })
    }
}

/// Workspace location of `brine-schema` when this crate was built.
pub const BUILT_SCHEMA_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../brine-schema");

/// Settings for discovering and inspecting a project's migrations.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Project root; the temporary inspector crate is created here.
    pub project_root: PathBuf,
    /// Migrations directory, relative to the project root.
    pub migrations_dir: PathBuf,
    /// Program used to build and run the inspector.
    pub toolchain: OsString,
    /// Path of the `brine-schema` crate the inspector depends on.
    ///
    /// Defaults to [`BUILT_SCHEMA_PATH`], which only exists on the machine
    /// that built this crate from a checkout of the workspace. Installed
    /// binaries must set it (`--schema-path` or `BRINE_SCHEMA_PATH`).
    pub schema_dependency: PathBuf,
    /// Cargo target directory shared between runs.
    pub target_dir: Option<PathBuf>,
}

impl InspectorConfig {
    /// Creates a configuration for the project at `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            migrations_dir: PathBuf::from("migrations"),
            toolchain: OsString::from("cargo"),
            schema_dependency: PathBuf::from(BUILT_SCHEMA_PATH),
            target_dir: None,
        }
    }

    /// Sets the migrations directory.
    #[must_use]
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Sets the program used instead of `cargo`.
    #[must_use]
    pub fn toolchain(mut self, program: impl Into<OsString>) -> Self {
        self.toolchain = program.into();
        self
    }

    /// Sets the `brine-schema` path dependency.
    #[must_use]
    pub fn schema_dependency(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_dependency = path.into();
        self
    }

    /// Sets the shared target directory.
    #[must_use]
    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    /// Absolute path of the migrations directory.
    #[must_use]
    pub fn migrations_path(&self) -> PathBuf {
        self.project_root.join(&self.migrations_dir)
    }

    /// Target directory for inspector builds.
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        self.target_dir
            .clone()
            .unwrap_or_else(|| self.project_root.join("target").join("brine-inspector"))
    }
}
