//! Column definitions for the schema DSL.
//!
//! Columns are created through the typed constructors on
//! [`Table`](crate::Table) and refined with chained modifiers:
//!
//! ```rust
//! use brine_schema::Table;
//!
//! let mut table = Table::new("posts");
//! table.uuid("user_id").not_null().foreign_key("users", "id").is_owner();
//! table.string("status").default("draft").public();
//!
//! assert_eq!(table.columns[1].length, Some(255));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length used for `String` columns declared without an explicit length.
pub const DEFAULT_STRING_LENGTH: u32 = 255;

/// The closed set of column types understood by the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// UUID.
    Uuid,
    /// Variable-length string with a maximum length.
    String,
    /// Unbounded text.
    Text,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// Fixed-point decimal with precision and scale.
    Decimal,
    /// Boolean.
    Boolean,
    /// Timestamp with time zone.
    Timestamp,
    /// Binary JSON document.
    Jsonb,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Raw bytes.
    Binary,
}

impl ColumnType {
    /// Returns the wire name used in the inspector payload.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::BigInteger => "biginteger",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Jsonb => "jsonb",
            Self::Date => "date",
            Self::Time => "time",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value attached to a column.
///
/// String defaults containing `(` are treated as function calls by the
/// Postgres compiler (`gen_random_uuid()`, `now()`); every other string is
/// emitted as a quoted literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Boolean literal.
    Boolean(bool),
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal or function-call expression.
    String(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Target of a foreign key reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// A single column definition.
///
/// Columns start out NOT NULL; call [`Column::nullable`] to relax that.
/// Every modifier mutates in place and returns the same column, so the last
/// call wins when modifiers conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    pub column_type: ColumnType,
    /// Maximum length (String columns).
    pub length: Option<u32>,
    /// Total digits (Decimal columns).
    pub precision: Option<u32>,
    /// Digits after the decimal point (Decimal columns).
    pub scale: Option<u32>,
    /// Whether the column is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether a UNIQUE constraint is attached.
    pub unique: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Foreign key target, if any.
    pub foreign_key: Option<ForeignKey>,
    /// Visible to anyone, no authentication required.
    pub public: bool,
    /// Visible only to the owner of the row.
    pub owner_sees: bool,
    /// Holds the id of the row's owner.
    pub is_owner: bool,
}

impl Column {
    /// Creates a column of the given type with no modifiers applied.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            precision: None,
            scale: None,
            primary_key: false,
            nullable: false,
            unique: false,
            default: None,
            foreign_key: None,
            public: false,
            owner_sees: false,
            is_owner: false,
        }
    }

    /// Marks the column as the primary key.
    pub fn primary_key(&mut self) -> &mut Self {
        self.primary_key = true;
        self
    }

    /// Disallows NULL.
    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    /// Allows NULL.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Adds a UNIQUE constraint.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    pub fn default(&mut self, value: impl Into<DefaultValue>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    /// References `table.column`.
    pub fn foreign_key(&mut self, table: impl Into<String>, column: impl Into<String>) -> &mut Self {
        self.foreign_key = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Marks the column as visible to anyone.
    pub fn public(&mut self) -> &mut Self {
        self.public = true;
        self
    }

    /// Marks the column as visible only to the row's owner.
    pub fn owner_sees(&mut self) -> &mut Self {
        self.owner_sees = true;
        self
    }

    /// Marks the column as the table's ownership column.
    ///
    /// Its value is compared against the authenticated user's id. Only one
    /// column per table may carry this flag.
    pub fn is_owner(&mut self) -> &mut Self {
        self.is_owner = true;
        self
    }

    /// Returns whether a default value was set.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}
