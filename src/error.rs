use thiserror::Error;

use crate::types::DataType;

/// Convenience result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Error type returned by table, view, grouping, join and stack operations.
///
/// Every error is raised synchronously at the point of detection. Errors returned by user
/// callbacks (predicates, grouping keys, aggregation blocks) are passed through unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// Vector-like inputs disagree on their row count.
    ///
    /// `lengths` lists the distinct lengths in first-seen order.
    #[error("differing number of rows: {lengths:?}")]
    ShapeMismatch { lengths: Vec<usize> },

    /// A value could not be turned into a column (or a stackable column set).
    #[error("unsupported column source: {message}")]
    UnsupportedColumnSource { message: String },

    /// Two column sets that must share their column names do not.
    #[error("mismatch in column names: expected {expected:?}, found {found:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Malformed configuration (e.g. `reduce` defaults that are not a name->value mapping).
    #[error("configuration error: {message}")]
    ConfigurationError { message: String },

    /// A grouping callback or key column cannot be used to derive group keys.
    #[error("group key error: {message}")]
    GroupKeyTypeError { message: String },

    /// The named column does not exist.
    #[error("column not found: '{name}'")]
    ColumnNotFound { name: String },

    /// Non-row dimensions differ where they must match.
    #[error("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A value does not fit the column's data type.
    #[error("type mismatch: column of type {expected:?} cannot hold {found}")]
    TypeMismatch { expected: DataType, found: String },

    /// An elementwise operator was applied to operands it does not support.
    #[error("unsupported operation {op} between {lhs} and {rhs}")]
    InvalidOperation {
        op: String,
        lhs: String,
        rhs: String,
    },

    /// Integer overflow, division by zero and friends.
    #[error("arithmetic error: {message}")]
    Arithmetic { message: String },

    /// A position is outside the addressed column or view.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl TableError {
    pub(crate) fn not_found(name: &str) -> Self {
        TableError::ColumnNotFound {
            name: name.to_string(),
        }
    }
}
