//! PostgreSQL compiler. Implements every operation.

use super::{CompileResult, Driver, SqlCompiler};
use crate::column::{Column, ColumnType, DEFAULT_STRING_LENGTH, DefaultValue};
use crate::error::CompileError;
use crate::operation::OperationKind;
use crate::table::{Index, Table};
use crate::view::{View, ViewColumnSource};

/// Quotes a Postgres identifier, doubling embedded quote characters.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Inverts [`quote_identifier`]. Returns `None` if `quoted` is not a
/// well-formed quoted identifier.
#[must_use]
pub fn unquote_identifier(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' {
            // A lone quote inside the body is malformed.
            if chars.next() != Some('"') {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

/// PostgreSQL compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresCompiler;

impl PostgresCompiler {
    /// Creates a new PostgreSQL compiler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Maps a column to its native type.
    #[must_use]
    pub fn column_type(&self, column: &Column) -> String {
        match column.column_type {
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::String => format!(
                "VARCHAR({})",
                column
                    .length
                    .filter(|len| *len > 0)
                    .unwrap_or(DEFAULT_STRING_LENGTH)
            ),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::Decimal => match column.precision {
                Some(p) if p > 0 => format!("NUMERIC({p}, {})", column.scale.unwrap_or(0)),
                _ => "NUMERIC".to_string(),
            },
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Timestamp => "TIMESTAMPTZ".to_string(),
            ColumnType::Jsonb => "JSONB".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Binary => "BYTEA".to_string(),
        }
    }

    /// Renders a default value.
    #[must_use]
    pub fn render_default(&self, default: &DefaultValue) -> String {
        match default {
            // Function calls such as gen_random_uuid() pass through unquoted.
            DefaultValue::String(s) if s.contains('(') => s.clone(),
            DefaultValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_string(),
        }
    }

    /// Generates a column definition.
    #[must_use]
    pub fn column_definition(&self, column: &Column) -> String {
        let mut sql = format!(
            "{} {}",
            quote_identifier(&column.name),
            self.column_type(column)
        );

        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if column.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(ref default) = column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if let Some(ref fk) = column.foreign_key {
            sql.push_str(&format!(
                " REFERENCES {}({})",
                quote_identifier(&fk.table),
                quote_identifier(&fk.column)
            ));
        }

        sql
    }

    fn select_list(&self, view: &View) -> Vec<String> {
        view.columns
            .iter()
            .map(|col| match &col.source {
                ViewColumnSource::Reference { alias, column } => {
                    let mut item = if alias.is_empty() {
                        quote_identifier(column)
                    } else {
                        format!("{}.{}", quote_identifier(alias), quote_identifier(column))
                    };
                    if col.aliased {
                        item.push_str(" AS ");
                        item.push_str(&quote_identifier(&col.name));
                    }
                    item
                }
                ViewColumnSource::Raw(expr) => {
                    format!("{expr} AS {}", quote_identifier(&col.name))
                }
            })
            .collect()
    }
}

impl SqlCompiler for PostgresCompiler {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn supports(&self, _kind: OperationKind) -> bool {
        true
    }

    fn create_table(&self, table: &Table) -> CompileResult {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        Ok(vec![format!(
            "CREATE TABLE {} (\n\t{}\n)",
            quote_identifier(&table.name),
            columns.join(",\n\t")
        )])
    }

    fn drop_table_if_exists(&self, name: &str) -> CompileResult {
        Ok(vec![format!(
            "DROP TABLE IF EXISTS {} CASCADE",
            quote_identifier(name)
        )])
    }

    fn add_column(&self, table: &str, column: &Column) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_identifier(table),
            self.column_definition(column)
        )])
    }

    fn drop_column(&self, table: &str, column: &str) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_identifier(table),
            quote_identifier(column)
        )])
    }

    fn rename_column(&self, table: &str, from: &str, to: &str) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_identifier(table),
            quote_identifier(from),
            quote_identifier(to)
        )])
    }

    fn add_index(&self, index: &Index) -> CompileResult {
        let unique = if index.unique { "UNIQUE " } else { "" };
        let columns: Vec<String> = index.columns.iter().map(|c| quote_identifier(c)).collect();
        Ok(vec![format!(
            "CREATE {unique}INDEX IF NOT EXISTS {} ON {} ({})",
            quote_identifier(&index.name()),
            quote_identifier(&index.table),
            columns.join(", ")
        )])
    }

    fn rename_table(&self, from: &str, to: &str) -> CompileResult {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_identifier(from),
            quote_identifier(to)
        )])
    }

    fn create_view(&self, view: &View) -> CompileResult {
        let Some((base, joins)) = view.sources.split_first() else {
            return Err(CompileError::Invalid {
                operation: OperationKind::CreateView,
                message: format!("view '{}' has no FROM source", view.name),
            });
        };
        if view.columns.is_empty() {
            return Err(CompileError::Invalid {
                operation: OperationKind::CreateView,
                message: format!("view '{}' selects no columns", view.name),
            });
        }

        let mut sql = format!(
            "CREATE VIEW {} AS\nSELECT\n\t{}\nFROM {}",
            quote_identifier(&view.name),
            self.select_list(view).join(",\n\t"),
            source_sql(&base.table, &base.alias)
        );

        for join in joins {
            let kind = join.join.map_or("JOIN", |k| k.as_sql());
            sql.push_str(&format!("\n{kind} {}", source_sql(&join.table, &join.alias)));
            if let Some(ref on) = join.condition {
                sql.push_str(" ON ");
                sql.push_str(on);
            }
        }

        if !view.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&view.group_by.join(", "));
        }

        Ok(vec![sql])
    }

    fn drop_view(&self, name: &str) -> CompileResult {
        Ok(vec![format!("DROP VIEW IF EXISTS {}", quote_identifier(name))])
    }
}

fn source_sql(table: &str, alias: &str) -> String {
    if alias.is_empty() {
        quote_identifier(table)
    } else {
        format!("{} AS {}", quote_identifier(table), quote_identifier(alias))
    }
}
