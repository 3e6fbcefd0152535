//! View definitions.
//!
//! A view is a SELECT over one base table plus any number of joins. Its
//! output columns are either references to source columns (`"u.name"`),
//! whose types are looked up from the schema when the view is resolved, or
//! raw SQL expressions whose type must be declared explicitly:
//!
//! ```rust
//! use brine_schema::View;
//!
//! let mut view = View::new("user_post_stats");
//! view.from("users", "u");
//! view.left_join("posts", "p", "p.user_id = u.id");
//! view.column("u.id");
//! view.column_as("u.name", "author");
//! view.select_raw("post_count", "COUNT(p.id)").big_integer();
//! view.group_by(&["u.id", "u.name"]);
//!
//! assert_eq!(view.columns[1].output_name(), "author");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::{ColumnType, DEFAULT_STRING_LENGTH};

/// How a non-base source is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    /// `JOIN`
    #[serde(rename = "JOIN")]
    Inner,
    /// `LEFT JOIN`
    #[serde(rename = "LEFT JOIN")]
    Left,
}

impl JoinKind {
    /// Returns the SQL keyword(s) for this join.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A table referenced by a view. The first source is the FROM table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSource {
    /// Source table.
    pub table: String,
    /// Alias used by column references.
    pub alias: String,
    /// Join kind; `None` for the base table.
    pub join: Option<JoinKind>,
    /// Join condition, passed through verbatim.
    pub condition: Option<String>,
}

/// Where a view column's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewColumnSource {
    /// A column of one of the view's sources.
    Reference {
        /// Source alias (`u` in `u.id`).
        alias: String,
        /// Source column (`id` in `u.id`).
        column: String,
    },
    /// A raw SQL expression, passed through verbatim.
    Raw(String),
}

/// One column of a view's SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewColumn {
    /// Output column name.
    pub name: String,
    /// Value source.
    pub source: ViewColumnSource,
    /// Whether `name` was set by an explicit alias.
    pub aliased: bool,
    /// Column type. Declared for raw columns, resolved for references.
    pub column_type: Option<ColumnType>,
    /// Whether the output can be NULL.
    pub nullable: bool,
    /// Maximum length (String).
    pub length: Option<u32>,
    /// Total digits (Decimal).
    pub precision: Option<u32>,
    /// Digits after the decimal point (Decimal).
    pub scale: Option<u32>,
}

impl ViewColumn {
    fn new(name: String, source: ViewColumnSource, aliased: bool) -> Self {
        Self {
            name,
            source,
            aliased,
            column_type: None,
            nullable: false,
            length: None,
            precision: None,
            scale: None,
        }
    }

    /// Returns the column name as it appears in the view's output.
    #[must_use]
    pub fn output_name(&self) -> &str {
        &self.name
    }

    /// Returns the raw expression for computed columns.
    #[must_use]
    pub fn raw_expr(&self) -> Option<&str> {
        match &self.source {
            ViewColumnSource::Raw(expr) => Some(expr),
            ViewColumnSource::Reference { .. } => None,
        }
    }

    fn declare(&mut self, column_type: ColumnType) -> &mut Self {
        self.column_type = Some(column_type);
        self
    }

    /// Declares the output as a 64-bit integer.
    pub fn big_integer(&mut self) -> &mut Self {
        self.declare(ColumnType::BigInteger)
    }

    /// Declares the output as a 32-bit integer.
    pub fn integer(&mut self) -> &mut Self {
        self.declare(ColumnType::Integer)
    }

    /// Declares the output as a decimal.
    pub fn decimal(&mut self, precision: u32, scale: u32) -> &mut Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self.declare(ColumnType::Decimal)
    }

    /// Declares the output as a string of the default length.
    pub fn string(&mut self) -> &mut Self {
        self.string_with_length(DEFAULT_STRING_LENGTH)
    }

    /// Declares the output as a string with an explicit length.
    pub fn string_with_length(&mut self, length: u32) -> &mut Self {
        self.length = Some(length);
        self.declare(ColumnType::String)
    }

    /// Declares the output as text.
    pub fn text(&mut self) -> &mut Self {
        self.declare(ColumnType::Text)
    }

    /// Declares the output as a boolean.
    pub fn boolean(&mut self) -> &mut Self {
        self.declare(ColumnType::Boolean)
    }

    /// Declares the output as a timestamp.
    pub fn timestamp(&mut self) -> &mut Self {
        self.declare(ColumnType::Timestamp)
    }

    /// Declares the output as a UUID.
    pub fn uuid(&mut self) -> &mut Self {
        self.declare(ColumnType::Uuid)
    }

    /// Declares the output as JSONB.
    pub fn jsonb(&mut self) -> &mut Self {
        self.declare(ColumnType::Jsonb)
    }

    /// Marks the output as nullable (aggregates over outer joins, etc).
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }
}

/// A view definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct View {
    /// View name.
    pub name: String,
    /// Sources in registration order; the first is the base table.
    pub sources: Vec<ViewSource>,
    /// SELECT list in registration order.
    pub columns: Vec<ViewColumn>,
    /// GROUP BY expressions, passed through verbatim.
    pub group_by: Vec<String>,
}

impl View {
    /// Creates an empty view.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn add_source(&mut self, table: &str, alias: &str, join: Option<JoinKind>, on: Option<&str>) {
        self.sources.push(ViewSource {
            table: table.to_string(),
            alias: alias.to_string(),
            join,
            condition: on.map(str::to_string),
        });
    }

    /// Sets the base table.
    pub fn from(&mut self, table: &str, alias: &str) {
        self.add_source(table, alias, None, None);
    }

    /// Adds an inner join.
    pub fn join(&mut self, table: &str, alias: &str, on: &str) {
        self.add_source(table, alias, Some(JoinKind::Inner), Some(on));
    }

    /// Adds a left join.
    pub fn left_join(&mut self, table: &str, alias: &str, on: &str) {
        self.add_source(table, alias, Some(JoinKind::Left), Some(on));
    }

    /// Selects a source column; the output name is the source column name.
    pub fn column(&mut self, reference: &str) -> &mut ViewColumn {
        let (alias, column) = parse_column_ref(reference);
        let source = ViewColumnSource::Reference {
            alias: alias.to_string(),
            column: column.to_string(),
        };
        self.push_column(ViewColumn::new(column.to_string(), source, false))
    }

    /// Selects a source column under a different output name.
    pub fn column_as(&mut self, reference: &str, output: &str) -> &mut ViewColumn {
        let (alias, column) = parse_column_ref(reference);
        let source = ViewColumnSource::Reference {
            alias: alias.to_string(),
            column: column.to_string(),
        };
        self.push_column(ViewColumn::new(output.to_string(), source, true))
    }

    /// Selects a raw SQL expression. Chain a type declaration on the result.
    pub fn select_raw(&mut self, name: &str, expr: &str) -> &mut ViewColumn {
        let source = ViewColumnSource::Raw(expr.to_string());
        self.push_column(ViewColumn::new(name.to_string(), source, false))
    }

    /// Sets the GROUP BY list.
    pub fn group_by<S: AsRef<str>>(&mut self, columns: &[S]) {
        self.group_by = columns.iter().map(|c| c.as_ref().to_string()).collect();
    }

    /// Finds a source by alias.
    #[must_use]
    pub fn source(&self, alias: &str) -> Option<&ViewSource> {
        self.sources.iter().find(|s| s.alias == alias)
    }

    fn push_column(&mut self, column: ViewColumn) -> &mut ViewColumn {
        self.columns.push(column);
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }
}

/// Splits `"alias.column"` at the first dot. A bare name has no alias.
#[must_use]
pub fn parse_column_ref(reference: &str) -> (&str, &str) {
    reference.split_once('.').unwrap_or(("", reference))
}
