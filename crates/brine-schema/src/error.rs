//! Error types for schema compilation and snapshot replay.

use crate::compiler::Driver;
use crate::operation::OperationKind;

/// Errors raised while translating an operation to SQL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The driver does not implement this operation.
    #[error("{operation} is not supported by the {driver} driver")]
    Unsupported {
        /// Active driver.
        driver: Driver,
        /// Rejected operation.
        operation: OperationKind,
    },

    /// The operation is structurally unusable (e.g. a view without sources).
    #[error("Invalid {operation}: {message}")]
    Invalid {
        /// Offending operation.
        operation: OperationKind,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors raised while folding operations into a schema snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// An operation could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// An operation referenced a table that does not exist.
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    /// An operation referenced a column that does not exist.
    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn {
        /// Table that was searched.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A view column referenced an alias no source declares.
    #[error("View '{view}' references unknown source alias '{alias}'")]
    UnknownViewSource {
        /// View being resolved.
        view: String,
        /// Missing alias.
        alias: String,
    },

    /// A raw view column never had its type declared.
    #[error("View '{view}' column '{column}' is a raw expression without a declared type")]
    UntypedRawColumn {
        /// View being resolved.
        view: String,
        /// Untyped column.
        column: String,
    },

    /// More than one column of a table is marked as the owner column.
    #[error("Table '{table}' marks more than one owner column: {columns:?}")]
    MultipleOwnerColumns {
        /// Offending table.
        table: String,
        /// Columns carrying the owner flag.
        columns: Vec<String>,
    },

    /// Serialization failure.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while writing the payload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
