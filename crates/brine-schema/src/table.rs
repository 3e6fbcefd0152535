//! Table definitions and index descriptors.

use crate::column::{Column, ColumnType, DEFAULT_STRING_LENGTH};

/// An index over one or more columns of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Indexed table.
    pub table: String,
    /// Indexed columns, in key order.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    pub unique: bool,
}

impl Index {
    /// Creates an index descriptor.
    #[must_use]
    pub fn new<S: AsRef<str>>(table: impl Into<String>, columns: &[S], unique: bool) -> Self {
        Self {
            table: table.into(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            unique,
        }
    }

    /// Returns the synthesized index name, `{table}_{col1_col2...}_idx`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}_{}_idx", self.table, self.columns.join("_"))
    }
}

/// A table and its columns in declaration order.
///
/// Declaration order is preserved everywhere: generated DDL and the
/// inspector payload list columns exactly as they were declared.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Indexes recorded against the table by later operations.
    pub indexes: Vec<Index>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    fn add_column(&mut self, name: &str, column_type: ColumnType) -> &mut Column {
        self.columns.push(Column::new(name, column_type));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Adds a UUID column.
    pub fn uuid(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Uuid)
    }

    /// Adds a string column of the default length (255).
    pub fn string(&mut self, name: &str) -> &mut Column {
        self.string_with_length(name, DEFAULT_STRING_LENGTH)
    }

    /// Adds a string column with an explicit maximum length.
    pub fn string_with_length(&mut self, name: &str, length: u32) -> &mut Column {
        let col = self.add_column(name, ColumnType::String);
        col.length = Some(length);
        col
    }

    /// Adds a text column.
    pub fn text(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Text)
    }

    /// Adds a 32-bit integer column.
    pub fn integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Integer)
    }

    /// Adds a 64-bit integer column.
    pub fn big_integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::BigInteger)
    }

    /// Adds a decimal column.
    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> &mut Column {
        let col = self.add_column(name, ColumnType::Decimal);
        col.precision = Some(precision);
        col.scale = Some(scale);
        col
    }

    /// Adds a boolean column.
    pub fn boolean(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Boolean)
    }

    /// Adds a timestamp column.
    pub fn timestamp(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Timestamp)
    }

    /// Adds a JSONB column.
    pub fn jsonb(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Jsonb)
    }

    /// Adds a date column.
    pub fn date(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Date)
    }

    /// Adds a time column.
    pub fn time(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Time)
    }

    /// Adds a binary column.
    pub fn binary(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Binary)
    }

    /// Adds NOT NULL `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").not_null();
        self.timestamp("updated_at").not_null();
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name, mutably.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Returns the ownership column, if one is marked.
    #[must_use]
    pub fn owner_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns_in_declaration_order() {
        let mut table = Table::new("users");
        table.uuid("id").primary_key().default("gen_random_uuid()");
        table.string_with_length("name", 100).not_null();
        table.string("email").not_null().unique();
        table.timestamps();

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "email", "created_at", "updated_at"]
        );

        let id = &table.columns[0];
        assert!(id.primary_key);
        assert!(id.has_default());
        assert_eq!(table.columns[1].length, Some(100));
        assert!(table.columns[2].unique);
    }

    #[test]
    fn test_string_default_length() {
        let mut table = Table::new("test");
        table.string("name");
        assert_eq!(table.columns[0].length, Some(255));
    }

    #[test]
    fn test_timestamps_are_not_null() {
        let mut table = Table::new("test");
        table.timestamps();
        assert_eq!(table.columns.len(), 2);
        for col in &table.columns {
            assert_eq!(col.column_type, ColumnType::Timestamp);
            assert!(!col.nullable);
        }
    }

    #[test]
    fn test_decimal_precision() {
        let mut table = Table::new("transfers");
        table.decimal("amount", 18, 2).not_null();
        let col = &table.columns[0];
        assert_eq!(col.precision, Some(18));
        assert_eq!(col.scale, Some(2));
    }

    #[test]
    fn test_foreign_key() {
        let mut table = Table::new("posts");
        table.uuid("user_id").foreign_key("users", "id").is_owner();

        let fk = table.columns[0].foreign_key.as_ref().unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.column, "id");
        assert_eq!(table.owner_column().unwrap().name, "user_id");
    }

    #[test]
    fn test_index_name() {
        let idx = Index::new("posts", &["user_id", "status"], false);
        assert_eq!(idx.name(), "posts_user_id_status_idx");
    }
}
