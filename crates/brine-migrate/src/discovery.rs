//! Migration discovery.
//!
//! Scans a migrations directory for types that embed the migration recorder,
//! i.e. tuple structs such as `pub struct CreateUsersTable(Migration);`.
//! The check is purely syntactic: any unnamed field whose type path ends in
//! `Migration` qualifies.
//!
//! The inspector mounts each file into a crate that only depends on
//! `brine-schema`, so top-level imports must come from `brine_schema` or the
//! standard library. Files importing anything else are rejected here rather
//! than failing later inside cargo.

use std::fs;
use std::path::{Path, PathBuf};

use syn::{Fields, Item, Type, UseTree};

use crate::error::{MigrateError, Result};

/// A migration type found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMigration {
    /// File declaring the type.
    pub path: PathBuf,
    /// Type name.
    pub type_name: String,
}

impl DiscoveredMigration {
    /// File name without extension.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Name of the module the file is mounted as.
    #[must_use]
    pub fn module_name(&self) -> String {
        module_name(self.file_stem())
    }
}

/// Turns a file stem into a valid module identifier.
///
/// Migration files usually start with a timestamp, so the result is always
/// prefixed to keep it from starting with a digit.
#[must_use]
pub fn module_name(stem: &str) -> String {
    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("m_{sanitized}")
}

/// Crate roots a migration file may import from.
pub const ALLOWED_IMPORT_ROOTS: [&str; 5] = ["brine_schema", "std", "core", "alloc", "self"];

/// Returns the names of migration types declared in `source`, in
/// declaration order.
///
/// # Errors
///
/// Returns the parse error if `source` is not valid Rust, or an error
/// pointing at the first import outside [`ALLOWED_IMPORT_ROOTS`].
pub fn scan_source(source: &str) -> syn::Result<Vec<String>> {
    let file = syn::parse_file(source)?;
    for item in &file.items {
        if let Item::Use(item) = item {
            check_import(&item.tree)?;
        }
    }
    Ok(file
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Struct(s) if embeds_migration(&s.fields) => Some(s.ident.to_string()),
            _ => None,
        })
        .collect())
}

fn check_import(tree: &UseTree) -> syn::Result<()> {
    let ident = match tree {
        UseTree::Path(path) => &path.ident,
        UseTree::Name(name) => &name.ident,
        UseTree::Rename(rename) => &rename.ident,
        UseTree::Group(group) => {
            return group.items.iter().try_for_each(check_import);
        }
        UseTree::Glob(glob) => {
            return Err(syn::Error::new(
                glob.star_token.spans[0],
                "glob import of the enclosing module cannot be inspected",
            ));
        }
    };
    if ALLOWED_IMPORT_ROOTS.iter().any(|root| ident == root) {
        return Ok(());
    }
    Err(syn::Error::new(
        ident.span(),
        format!(
            "`use {ident}` cannot be resolved by the inspector; \
             import from brine_schema or std instead"
        ),
    ))
}

fn embeds_migration(fields: &Fields) -> bool {
    let Fields::Unnamed(fields) = fields else {
        return false;
    };
    fields.unnamed.iter().any(|field| match &field.ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Migration"),
        _ => false,
    })
}

/// Scans every `*.rs` file in `dir` except `mod.rs`.
///
/// Results are ordered by file name, then by declaration order within a
/// file.
///
/// # Errors
///
/// Fails if the directory cannot be read or a file does not parse.
pub fn discover(dir: &Path) -> Result<Vec<DiscoveredMigration>> {
    let read_dir = fs::read_dir(dir).map_err(|e| MigrateError::Discovery {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in read_dir {
        let path = entry?.path();
        let is_source = path.is_file()
            && path.extension().is_some_and(|ext| ext == "rs")
            && path.file_name().is_some_and(|name| name != "mod.rs");
        if is_source {
            files.push(path);
        }
    }
    files.sort();

    let mut found = Vec::new();
    for path in files {
        let source = fs::read_to_string(&path)?;
        let types = scan_source(&source).map_err(|e| MigrateError::Discovery {
            path: path.clone(),
            message: e.to_string(),
        })?;
        found.extend(types.into_iter().map(|type_name| DiscoveredMigration {
            path: path.clone(),
            type_name,
        }));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_source_finds_tuple_structs() {
        let source = r"
            use brine_schema::prelude::*;

            #[derive(Default)]
            pub struct CreateUsersTable(Migration);

            pub struct NotAMigration(String);

            pub struct Named {
                inner: Migration,
            }

            #[derive(Default)]
            pub struct AddEmail(pub brine_schema::Migration);
        ";
        let types = scan_source(source).unwrap();
        assert_eq!(types, vec!["CreateUsersTable", "AddEmail"]);
    }

    #[test]
    fn test_scan_source_accepts_schema_and_std_imports() {
        let source = r"
            use ::brine_schema::Migration;
            use std::fmt;
            use {brine_schema::prelude::Table, core::mem};

            pub struct CreateUsersTable(Migration);
        ";
        assert_eq!(scan_source(source).unwrap(), vec!["CreateUsersTable"]);
    }

    #[test]
    fn test_scan_source_rejects_other_imports() {
        for import in [
            "use brine_migrate::prelude::*;",
            "use crate::helpers::users_table;",
            "use super::Shared;",
            "use {std::fmt, anyhow::Result};",
        ] {
            let source = format!("{import}\npub struct CreateUsersTable(Migration);");
            let err = scan_source(&source).unwrap_err();
            assert!(
                err.to_string().contains("cannot be resolved by the inspector"),
                "{import}: {err}"
            );
        }
    }

    #[test]
    fn test_discover_reports_foreign_imports_with_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("2026_01_01_notes.rs"),
            "use brine_migrate::prelude::*;\npub struct CreateNotes(Migration);",
        )
        .unwrap();

        match discover(dir.path()).unwrap_err() {
            MigrateError::Discovery { path, message } => {
                assert!(path.ends_with("2026_01_01_notes.rs"));
                assert!(message.contains("brine_migrate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scan_source_rejects_invalid_rust() {
        assert!(scan_source("pub struct (").is_err());
    }

    #[test]
    fn test_module_name() {
        assert_eq!(
            module_name("2026_01_01_create-users"),
            "m_2026_01_01_create_users"
        );
    }

    #[test]
    fn test_discover_orders_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("2026_02_01_create_posts.rs"),
            "pub struct CreatePosts(Migration);",
        )
        .unwrap();
        fs::write(
            dir.path().join("2026_01_01_create_users.rs"),
            "pub struct CreateUsers(Migration);\npub struct SeedRoles(Migration);",
        )
        .unwrap();
        fs::write(dir.path().join("mod.rs"), "pub struct Ignored(Migration);").unwrap();
        fs::write(dir.path().join("README.md"), "not rust").unwrap();

        let found = discover(dir.path()).unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.type_name.as_str()).collect();
        assert_eq!(names, vec!["CreateUsers", "SeedRoles", "CreatePosts"]);
        assert_eq!(found[0].file_stem(), "2026_01_01_create_users");
    }

    #[test]
    fn test_discover_missing_directory() {
        let err = discover(Path::new("/nonexistent/brine/migrations")).unwrap_err();
        assert!(matches!(err, MigrateError::Discovery { .. }));
    }

    #[test]
    fn test_discover_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.rs"), "pub struct Broken(").unwrap();

        match discover(dir.path()).unwrap_err() {
            MigrateError::Discovery { path, .. } => assert!(path.ends_with("broken.rs")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
