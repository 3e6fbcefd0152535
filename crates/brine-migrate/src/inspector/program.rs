//! Source generation for the throwaway inspector crate.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use quote::{format_ident, quote};

use crate::discovery::DiscoveredMigration;
use crate::error::Result;

/// Package name of the generated crate.
pub const PACKAGE_NAME: &str = "brine-inspector";

/// A generated inspector crate, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct InspectorProgram {
    /// Contents of `Cargo.toml`.
    pub manifest: String,
    /// Contents of `src/main.rs`.
    pub main: String,
}

impl InspectorProgram {
    /// Generates the crate for `migrations`.
    ///
    /// Migration paths and `schema_dependency` must be absolute; the crate
    /// lives in a temporary directory.
    #[must_use]
    pub fn generate(migrations: &[DiscoveredMigration], schema_dependency: &Path) -> Self {
        Self {
            manifest: manifest(schema_dependency),
            main: main_source(migrations),
        }
    }

    /// Writes the crate under `dir` and returns the manifest path.
    ///
    /// # Errors
    ///
    /// Returns IO errors.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir.join("src"))?;
        let manifest_path = dir.join("Cargo.toml");
        fs::write(&manifest_path, &self.manifest)?;
        fs::write(dir.join("src").join("main.rs"), &self.main)?;
        Ok(manifest_path)
    }
}

/// `Cargo.toml` of the inspector crate. The empty `[workspace]` table keeps
/// cargo from attaching it to the enclosing project's workspace.
#[must_use]
pub fn manifest(schema_dependency: &Path) -> String {
    format!(
        r#"[package]
name = "{PACKAGE_NAME}"
version = "0.0.0"
edition = "2021"
publish = false

[workspace]

[dependencies]
brine-schema = {{ path = {:?} }}
"#,
        schema_dependency.to_string_lossy()
    )
}

/// `src/main.rs` of the inspector crate.
///
/// Each migration file is mounted once, by absolute path, under a private
/// `migrations` module; every discovered type is instantiated with
/// `Default` in discovery order.
#[must_use]
pub fn main_source(migrations: &[DiscoveredMigration]) -> String {
    let modules = module_names(migrations);

    let mounts = modules.iter().map(|(path, module)| {
        let module = format_ident!("{}", module);
        let path = path.to_string_lossy();
        quote! {
            #[path = #path]
            pub mod #module;
        }
    });

    let instances = migrations.iter().filter_map(|m| {
        let module = format_ident!("{}", modules.get(&m.path)?);
        let ty = format_ident!("{}", m.type_name);
        Some(quote! {
            ::std::boxed::Box::new(migrations::#module::#ty::default())
        })
    });

    let tokens = quote! {
        #[allow(dead_code, unused_imports)]
        mod migrations {
            #(#mounts)*
        }

        fn main() {
            if !::std::env::args().any(|arg| arg == "--json") {
                eprintln!("usage: brine-inspector --json");
                ::std::process::exit(2);
            }

            let mut migrations: ::std::vec::Vec<::std::boxed::Box<dyn ::brine_schema::Migrate>> =
                vec![#(#instances),*];

            let stdout = ::std::io::stdout();
            if let Err(err) = ::brine_schema::snapshot::write_payload(&mut migrations, stdout.lock()) {
                eprintln!("brine-inspector: {err}");
                ::std::process::exit(1);
            }
        }
    };
    tokens.to_string()
}

/// Assigns each file its module name. Files whose stems sanitize to the same
/// name get a numeric suffix, in discovery order.
fn module_names(migrations: &[DiscoveredMigration]) -> BTreeMap<PathBuf, String> {
    let mut modules = BTreeMap::new();
    let mut taken = BTreeSet::new();
    for migration in migrations {
        if modules.contains_key(&migration.path) {
            continue;
        }
        let base = migration.module_name();
        let mut name = base.clone();
        let mut suffix = 1;
        while taken.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        taken.insert(name.clone());
        modules.insert(migration.path.clone(), name);
    }
    modules
}
