//! Cumulative schema snapshots and the inspector payload.
//!
//! A [`SchemaSnapshot`] is what the database looks like after every
//! migration's `up` has been replayed in order. Views are resolved while
//! folding: a reference column copies its type from the source table as it
//! exists at the moment the view is created.
//!
//! The snapshot travels between processes as JSON ([`InspectorPayload`]).
//! The wire structs are kept separate from the model so the format can stay
//! stable while the DSL evolves.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnType, DefaultValue, ForeignKey};
use crate::error::{Result, SchemaError};
use crate::migration::Migrate;
use crate::operation::Operation;
use crate::table::{Index, Table};
use crate::view::{JoinKind, View, ViewColumn, ViewColumnSource, ViewSource};

/// The cumulative schema produced by replaying migrations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaSnapshot {
    /// Tables in creation order.
    pub tables: Vec<Table>,
    /// Views in creation order, with reference columns resolved.
    pub views: Vec<View>,
}

impl SchemaSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays every migration's `up` in order and returns the result.
    ///
    /// # Errors
    ///
    /// Returns the first fold error.
    pub fn replay(migrations: &mut [Box<dyn Migrate>]) -> Result<Self> {
        let mut snapshot = Self::new();
        for migration in migrations.iter_mut() {
            for operation in migration.record_up() {
                snapshot.apply(&operation)?;
            }
        }
        Ok(snapshot)
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Looks up a view by name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    /// Folds one operation into the snapshot.
    ///
    /// # Errors
    ///
    /// Fails when the operation references a missing table, column or view
    /// source, when a raw view column has no declared type, or when a table
    /// ends up with more than one owner column.
    pub fn apply(&mut self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::CreateTable(table) => {
                check_owner_columns(table)?;
                match self.tables.iter_mut().find(|t| t.name == table.name) {
                    Some(existing) => *existing = table.clone(),
                    None => self.tables.push(table.clone()),
                }
            }
            Operation::DropTableIfExists { table } => {
                self.tables.retain(|t| t.name != *table);
            }
            Operation::RenameTable { from, to } => {
                let table = self.table_mut(from)?;
                table.name.clone_from(to);
                for index in &mut table.indexes {
                    index.table.clone_from(to);
                }
            }
            Operation::AddColumn { table, definition } => {
                let table = self.table_mut(table)?;
                definition.apply(table);
                check_owner_columns(table)?;
            }
            Operation::DropColumn { table, column } => {
                let table = self.table_mut(table)?;
                let before = table.columns.len();
                table.columns.retain(|c| c.name != *column);
                if table.columns.len() == before {
                    return Err(SchemaError::UnknownColumn {
                        table: table.name.clone(),
                        column: column.clone(),
                    });
                }
            }
            Operation::RenameColumn { table, from, to } => {
                let table = self.table_mut(table)?;
                let name = table.name.clone();
                let column = table
                    .column_mut(from)
                    .ok_or_else(|| SchemaError::UnknownColumn {
                        table: name,
                        column: from.clone(),
                    })?;
                column.name.clone_from(to);
                for index in &mut table.indexes {
                    for col in &mut index.columns {
                        if col == from {
                            col.clone_from(to);
                        }
                    }
                }
            }
            Operation::AddIndex(index) | Operation::AddUniqueIndex(index) => {
                self.table_mut(&index.table)?.indexes.push(index.clone());
            }
            Operation::CreateView(view) => {
                let resolved = self.resolve_view(view)?;
                match self.views.iter_mut().find(|v| v.name == view.name) {
                    Some(existing) => *existing = resolved,
                    None => self.views.push(resolved),
                }
            }
            Operation::DropView { name } => {
                self.views.retain(|v| v.name != *name);
            }
        }
        Ok(())
    }

    /// Fills in the type details of every reference column from the tables
    /// currently in the snapshot.
    fn resolve_view(&self, view: &View) -> Result<View> {
        let mut resolved = view.clone();
        for column in &mut resolved.columns {
            match &column.source {
                ViewColumnSource::Reference { alias, column: source } => {
                    // A bare reference reads from the base table.
                    let view_source = if alias.is_empty() {
                        view.sources.first()
                    } else {
                        view.source(alias)
                    };
                    let view_source =
                        view_source.ok_or_else(|| SchemaError::UnknownViewSource {
                            view: view.name.clone(),
                            alias: alias.clone(),
                        })?;
                    let table = self
                        .table(&view_source.table)
                        .ok_or_else(|| SchemaError::UnknownTable(view_source.table.clone()))?;
                    let origin = table.column(source).ok_or_else(|| SchemaError::UnknownColumn {
                        table: table.name.clone(),
                        column: source.clone(),
                    })?;

                    column.column_type = Some(origin.column_type);
                    column.nullable = origin.nullable;
                    column.length = origin.length;
                    column.precision = origin.precision;
                    column.scale = origin.scale;
                }
                ViewColumnSource::Raw(_) => {
                    if column.column_type.is_none() {
                        return Err(SchemaError::UntypedRawColumn {
                            view: view.name.clone(),
                            column: column.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(resolved)
    }

    /// Converts the snapshot to its wire form.
    #[must_use]
    pub fn to_payload(&self) -> InspectorPayload {
        InspectorPayload {
            tables: self.tables.iter().map(TableInfo::from).collect(),
            views: self.views.iter().map(ViewInfo::from).collect(),
        }
    }
}

fn check_owner_columns(table: &Table) -> Result<()> {
    let owners: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.is_owner)
        .map(|c| c.name.clone())
        .collect();
    if owners.len() > 1 {
        return Err(SchemaError::MultipleOwnerColumns {
            table: table.name.clone(),
            columns: owners,
        });
    }
    Ok(())
}

/// Replays `migrations` and writes the payload as one line of JSON.
///
/// This is the entry point of the synthesized inspector program.
///
/// # Errors
///
/// Returns fold, serialization or IO errors.
pub fn write_payload(migrations: &mut [Box<dyn Migrate>], mut out: impl Write) -> Result<()> {
    let snapshot = SchemaSnapshot::replay(migrations)?;
    serde_json::to_writer(&mut out, &snapshot.to_payload())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

// ============================================================================
// Wire format
// ============================================================================

/// Top-level inspector output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InspectorPayload {
    /// Tables in creation order.
    pub tables: Vec<TableInfo>,
    /// Views in creation order.
    #[serde(default)]
    pub views: Vec<ViewInfo>,
}

impl From<InspectorPayload> for SchemaSnapshot {
    fn from(payload: InspectorPayload) -> Self {
        Self {
            tables: payload.tables.into_iter().map(Into::into).collect(),
            views: payload.views.into_iter().map(Into::into).collect(),
        }
    }
}

/// Wire form of a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
    /// Indexes.
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
}

/// Wire form of a [`Column`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Primary key flag.
    pub primary_key: bool,
    /// UNIQUE flag.
    pub unique: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Referenced table.
    pub foreign_key_table: Option<String>,
    /// Referenced column.
    pub foreign_key_column: Option<String>,
    /// String length.
    pub length: Option<u32>,
    /// Decimal precision.
    pub precision: Option<u32>,
    /// Decimal scale.
    pub scale: Option<u32>,
    /// Visible to anyone.
    #[serde(default)]
    pub public: bool,
    /// Visible only to the row's owner.
    #[serde(default)]
    pub owner_sees: bool,
    /// Ownership column.
    #[serde(default)]
    pub is_owner: bool,
}

/// Wire form of an [`Index`]; the table is implied by the enclosing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Indexed columns.
    pub columns: Vec<String>,
    /// UNIQUE flag.
    pub unique: bool,
}

/// Wire form of a [`View`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewInfo {
    /// View name.
    pub name: String,
    /// Sources; the first is the FROM table.
    pub sources: Vec<ViewSourceInfo>,
    /// Output columns.
    pub columns: Vec<ViewColumnInfo>,
    /// GROUP BY expressions.
    #[serde(default)]
    pub group_by: Vec<String>,
}

/// Wire form of a [`ViewSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSourceInfo {
    /// Source table.
    pub table: String,
    /// Alias.
    pub alias: String,
    /// `null` for the base table.
    pub join_type: Option<JoinKind>,
    /// Join condition.
    pub join_condition: Option<String>,
}

/// Wire form of a [`ViewColumn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewColumnInfo {
    /// Output name.
    pub name: String,
    /// Resolved or declared type.
    #[serde(rename = "type")]
    pub column_type: Option<ColumnType>,
    /// Whether the output can be NULL.
    pub nullable: bool,
    /// Source alias for reference columns.
    pub source_alias: Option<String>,
    /// Source column for reference columns.
    pub source_column: Option<String>,
    /// Expression for raw columns.
    pub raw_expr: Option<String>,
    /// Decimal precision.
    pub precision: Option<u32>,
    /// Decimal scale.
    pub scale: Option<u32>,
    /// String length.
    #[serde(default)]
    pub length: Option<u32>,
}

impl From<&Column> for ColumnInfo {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            column_type: column.column_type,
            nullable: column.nullable,
            primary_key: column.primary_key,
            unique: column.unique,
            default: column.default.clone(),
            foreign_key_table: column.foreign_key.as_ref().map(|fk| fk.table.clone()),
            foreign_key_column: column.foreign_key.as_ref().map(|fk| fk.column.clone()),
            length: column.length,
            precision: column.precision,
            scale: column.scale,
            public: column.public,
            owner_sees: column.owner_sees,
            is_owner: column.is_owner,
        }
    }
}

impl From<ColumnInfo> for Column {
    fn from(info: ColumnInfo) -> Self {
        let foreign_key = match (info.foreign_key_table, info.foreign_key_column) {
            (Some(table), Some(column)) => Some(ForeignKey { table, column }),
            _ => None,
        };
        Self {
            name: info.name,
            column_type: info.column_type,
            length: info.length,
            precision: info.precision,
            scale: info.scale,
            primary_key: info.primary_key,
            nullable: info.nullable,
            unique: info.unique,
            default: info.default,
            foreign_key,
            public: info.public,
            owner_sees: info.owner_sees,
            is_owner: info.is_owner,
        }
    }
}

impl From<&Table> for TableInfo {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            columns: table.columns.iter().map(ColumnInfo::from).collect(),
            indexes: table
                .indexes
                .iter()
                .map(|idx| IndexInfo {
                    columns: idx.columns.clone(),
                    unique: idx.unique,
                })
                .collect(),
        }
    }
}

impl From<TableInfo> for Table {
    fn from(info: TableInfo) -> Self {
        let indexes = info
            .indexes
            .into_iter()
            .map(|idx| Index::new(info.name.as_str(), &idx.columns, idx.unique))
            .collect();
        Self {
            columns: info.columns.into_iter().map(Column::from).collect(),
            indexes,
            name: info.name,
        }
    }
}

impl From<&View> for ViewInfo {
    fn from(view: &View) -> Self {
        Self {
            name: view.name.clone(),
            sources: view
                .sources
                .iter()
                .map(|s| ViewSourceInfo {
                    table: s.table.clone(),
                    alias: s.alias.clone(),
                    join_type: s.join,
                    join_condition: s.condition.clone(),
                })
                .collect(),
            columns: view.columns.iter().map(ViewColumnInfo::from).collect(),
            group_by: view.group_by.clone(),
        }
    }
}

impl From<&ViewColumn> for ViewColumnInfo {
    fn from(column: &ViewColumn) -> Self {
        let (source_alias, source_column, raw_expr) = match &column.source {
            ViewColumnSource::Reference { alias, column } => {
                (Some(alias.clone()), Some(column.clone()), None)
            }
            ViewColumnSource::Raw(expr) => (None, None, Some(expr.clone())),
        };
        Self {
            name: column.name.clone(),
            column_type: column.column_type,
            nullable: column.nullable,
            source_alias,
            source_column,
            raw_expr,
            precision: column.precision,
            scale: column.scale,
            length: column.length,
        }
    }
}

impl From<ViewInfo> for View {
    fn from(info: ViewInfo) -> Self {
        let sources = info
            .sources
            .into_iter()
            .map(|s| ViewSource {
                table: s.table,
                alias: s.alias,
                join: s.join_type,
                condition: s.join_condition,
            })
            .collect();
        let columns = info
            .columns
            .into_iter()
            .map(|c| {
                let (source, aliased) = match (c.raw_expr, c.source_column) {
                    (Some(expr), _) => (ViewColumnSource::Raw(expr), false),
                    (None, Some(source_column)) => {
                        let aliased = source_column != c.name;
                        (
                            ViewColumnSource::Reference {
                                alias: c.source_alias.unwrap_or_default(),
                                column: source_column,
                            },
                            aliased,
                        )
                    }
                    (None, None) => (ViewColumnSource::Raw(String::new()), false),
                };
                ViewColumn {
                    name: c.name,
                    source,
                    aliased,
                    column_type: c.column_type,
                    nullable: c.nullable,
                    length: c.length,
                    precision: c.precision,
                    scale: c.scale,
                }
            })
            .collect();
        Self {
            name: info.name,
            sources,
            columns,
            group_by: info.group_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Migration;

    fn fold(define: impl FnOnce(&mut Migration)) -> Result<SchemaSnapshot> {
        let mut m = Migration::new();
        define(&mut m);
        let mut snapshot = SchemaSnapshot::new();
        for op in m.operations() {
            snapshot.apply(op)?;
        }
        Ok(snapshot)
    }

    fn users(m: &mut Migration) {
        m.create_table("users", |t| {
            t.uuid("id").primary_key();
            t.string_with_length("name", 120);
            t.text("bio").nullable();
        });
    }

    #[test]
    fn test_column_changes_net_out() {
        let snapshot = fold(|m| {
            users(m);
            m.add_column("users", |t| {
                t.string("nickname").nullable();
            });
            m.drop_column("users", "bio");
            m.rename_column("users", "nickname", "handle");
        })
        .unwrap();

        let names: Vec<&str> = snapshot.tables[0]
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "name", "handle"]);
        assert!(snapshot.tables[0].column("handle").unwrap().nullable);
    }

    #[test]
    fn test_create_table_replaces_in_place() {
        let snapshot = fold(|m| {
            users(m);
            m.create_table("posts", |t| {
                t.uuid("id").primary_key();
            });
            m.create_table("users", |t| {
                t.uuid("id").primary_key();
            });
        })
        .unwrap();

        assert_eq!(snapshot.tables.len(), 2);
        assert_eq!(snapshot.tables[0].name, "users");
        assert_eq!(snapshot.tables[0].columns.len(), 1);
    }

    #[test]
    fn test_drop_and_rename_tables() {
        let snapshot = fold(|m| {
            users(m);
            m.add_index("users", &["name"]);
            m.rename_table("users", "accounts");
            m.drop_table_if_exists("missing");
        })
        .unwrap();

        assert!(snapshot.table("users").is_none());
        let accounts = snapshot.table("accounts").unwrap();
        assert_eq!(accounts.indexes[0].name(), "accounts_name_idx");

        let snapshot = fold(|m| {
            users(m);
            m.drop_table_if_exists("users");
        })
        .unwrap();
        assert!(snapshot.tables.is_empty());
    }

    #[test]
    fn test_missing_targets_are_errors() {
        let err = fold(|m| m.drop_column("ghosts", "id")).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTable(ref t) if t == "ghosts"));

        let err = fold(|m| {
            users(m);
            m.rename_column("users", "nope", "still_nope");
        })
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownColumn { .. }));
    }

    #[test]
    fn test_view_reference_columns_are_resolved() {
        let snapshot = fold(|m| {
            users(m);
            m.create_table("posts", |t| {
                t.uuid("id").primary_key();
                t.uuid("user_id").foreign_key("users", "id");
            });
            m.create_view("user_post_stats", |v| {
                v.from("users", "u");
                v.left_join("posts", "p", "p.user_id = u.id");
                v.column("u.id");
                v.column_as("u.name", "author");
                v.select_raw("post_count", "COUNT(p.id)").big_integer();
                v.group_by(&["u.id", "u.name"]);
            });
        })
        .unwrap();

        let view = snapshot.view("user_post_stats").unwrap();
        assert_eq!(view.columns[0].column_type, Some(ColumnType::Uuid));
        assert_eq!(view.columns[1].column_type, Some(ColumnType::String));
        assert_eq!(view.columns[1].length, Some(120));
        assert_eq!(view.columns[1].output_name(), "author");
        assert_eq!(view.columns[2].column_type, Some(ColumnType::BigInteger));
    }

    #[test]
    fn test_view_resolves_against_schema_at_creation_time() {
        let snapshot = fold(|m| {
            users(m);
            m.create_view("names", |v| {
                v.from("users", "u");
                v.column("u.name");
            });
            m.drop_column("users", "name");
        })
        .unwrap();

        let view = snapshot.view("names").unwrap();
        assert_eq!(view.columns[0].column_type, Some(ColumnType::String));
    }

    #[test]
    fn test_view_errors() {
        let err = fold(|m| {
            users(m);
            m.create_view("v", |v| {
                v.from("users", "u");
                v.column("x.id");
            });
        })
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownViewSource { ref alias, .. } if alias == "x"));

        let err = fold(|m| {
            users(m);
            m.create_view("v", |v| {
                v.from("users", "u");
                v.select_raw("n", "COUNT(*)");
            });
        })
        .unwrap_err();
        assert!(matches!(err, SchemaError::UntypedRawColumn { ref column, .. } if column == "n"));
    }

    #[test]
    fn test_drop_view() {
        let snapshot = fold(|m| {
            users(m);
            m.create_view("v", |v| {
                v.from("users", "u");
                v.column("u.id");
            });
            m.drop_view("v");
        })
        .unwrap();
        assert!(snapshot.views.is_empty());
    }

    #[test]
    fn test_multiple_owner_columns_rejected() {
        let err = fold(|m| {
            m.create_table("posts", |t| {
                t.uuid("author_id").is_owner();
            });
            m.add_column("posts", |t| {
                t.uuid("editor_id").is_owner();
            });
        })
        .unwrap_err();
        match err {
            SchemaError::MultipleOwnerColumns { table, columns } => {
                assert_eq!(table, "posts");
                assert_eq!(columns, vec!["author_id", "editor_id"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[derive(Default)]
    struct CreateUsers(Migration);

    impl Migrate for CreateUsers {
        fn recorder(&mut self) -> &mut Migration {
            &mut self.0
        }

        fn up(&mut self) {
            self.0.create_table("users", |t| {
                t.uuid("id").primary_key().default("gen_random_uuid()");
                t.string("email").unique().public();
                t.uuid("owner_id").is_owner();
            });
            self.0.add_unique_index("users", &["email"]);
        }

        fn down(&mut self) {
            self.0.drop_table_if_exists("users");
        }
    }

    #[derive(Default)]
    struct CreateEmails(Migration);

    impl Migrate for CreateEmails {
        fn recorder(&mut self) -> &mut Migration {
            &mut self.0
        }

        fn up(&mut self) {
            self.0.create_view("emails", |v| {
                v.from("users", "u");
                v.column_as("u.email", "address");
            });
        }

        fn down(&mut self) {
            self.0.drop_view("emails");
        }
    }

    #[test]
    fn test_write_payload_shape() {
        let mut migrations: Vec<Box<dyn Migrate>> = vec![
            Box::new(CreateUsers::default()),
            Box::new(CreateEmails::default()),
        ];
        let mut out = Vec::new();
        write_payload(&mut migrations, &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let table = &json["tables"][0];
        assert_eq!(table["name"], "users");
        assert_eq!(table["columns"][0]["type"], "uuid");
        assert_eq!(table["columns"][0]["default"], "gen_random_uuid()");
        assert_eq!(table["columns"][1]["length"], 255);
        assert_eq!(table["columns"][1]["public"], true);
        assert_eq!(table["columns"][2]["is_owner"], true);
        assert_eq!(table["indexes"][0]["unique"], true);

        let view = &json["views"][0];
        assert_eq!(view["sources"][0]["join_type"], serde_json::Value::Null);
        assert_eq!(view["columns"][0]["name"], "address");
        assert_eq!(view["columns"][0]["source_alias"], "u");
        assert_eq!(view["columns"][0]["source_column"], "email");
        assert_eq!(view["columns"][0]["type"], "string");
    }

    #[test]
    fn test_payload_decodes_back_into_model() {
        let mut migrations: Vec<Box<dyn Migrate>> = vec![
            Box::new(CreateUsers::default()),
            Box::new(CreateEmails::default()),
        ];
        let snapshot = SchemaSnapshot::replay(&mut migrations).unwrap();
        let json = serde_json::to_string(&snapshot.to_payload()).unwrap();
        let payload: InspectorPayload = serde_json::from_str(&json).unwrap();

        assert_eq!(SchemaSnapshot::from(payload), snapshot);
    }

    #[test]
    fn test_minimal_payload_decodes() {
        let json = r#"{"tables":[{"name":"t","columns":[{"name":"id","type":"integer",
            "nullable":false,"primary_key":true,"unique":false,"default":null,
            "foreign_key_table":null,"foreign_key_column":null,"length":null,
            "precision":null,"scale":null}]}]}"#;
        let payload: InspectorPayload = serde_json::from_str(json).unwrap();
        let snapshot = SchemaSnapshot::from(payload);

        assert!(snapshot.views.is_empty());
        let col = &snapshot.tables[0].columns[0];
        assert!(col.primary_key);
        assert!(!col.public);
    }

    #[test]
    fn test_view_payload_decodes_into_view() {
        let json = r#"{"tables":[],"views":[{"name":"stats",
            "sources":[{"table":"users","alias":"u","join_type":null,"join_condition":null},
                       {"table":"posts","alias":"p","join_type":"LEFT JOIN","join_condition":"p.user_id = u.id"}],
            "columns":[{"name":"id","type":"uuid","nullable":false,"source_alias":"u",
                        "source_column":"id","raw_expr":null,"precision":null,"scale":null},
                       {"name":"post_count","type":"biginteger","nullable":false,"source_alias":null,
                        "source_column":null,"raw_expr":"COUNT(p.id)","precision":null,"scale":null}],
            "group_by":["u.id"]}]}"#;
        let payload: InspectorPayload = serde_json::from_str(json).unwrap();
        let snapshot = SchemaSnapshot::from(payload);

        let view = snapshot.view("stats").unwrap();
        assert_eq!(view.sources.len(), 2);
        assert_eq!(view.sources[1].join, Some(JoinKind::Left));
        assert_eq!(view.sources[1].condition.as_deref(), Some("p.user_id = u.id"));
        assert_eq!(view.columns[1].column_type, Some(ColumnType::BigInteger));
        assert_eq!(view.group_by, vec!["u.id"]);
    }
}
