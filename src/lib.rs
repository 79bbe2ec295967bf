//! `rust-column-table` is a small in-memory columnar table library: named, typed, possibly
//! multi-dimensional [`column::Column`]s of equal row count, with row views that write through to
//! their parent table.
//!
//! ## What you can do
//!
//! - Build tables from a [`grid::ColumnSet`]: lists, ranges and columns are checked for equal
//!   length and scalars are broadcast ([`grid::ColumnSet::ensure_uniform`]).
//! - Filter rows into a lazy [`view::View`] (re-evaluated on every access) or a fixed
//!   [`view::StaticView`]. Columns read through a view are [`masked::MaskedColumn`]s: writing to
//!   them updates the parent table.
//! - Group by key columns (or by computed keys) and [`grouping::Grouping::apply`] a function per
//!   group, or fold rows into per-group accumulators with [`grouping::Grouping::reduce`].
//! - [`join::join`] two tables (`inner`, `left`, `right`, `outer`) and [`stack::stack`] tables
//!   row-wise.
//! - Exchange tables as JSON ([`table::Table::from_json`], [`table::Table::to_json`]).
//!
//! Across operations, [`types::Value::Null`] marks a missing value; joins produce it for rows
//! without a match.
//!
//! ## Quick example: filter and write through
//!
//! ```rust
//! use rust_column_table::grid::ColumnSet;
//! use rust_column_table::table::Table;
//! use rust_column_table::types::Value;
//!
//! # fn main() -> Result<(), rust_column_table::TableError> {
//! let t = Table::new(ColumnSet::new().with("x", vec![1, 2, 3, 4]))?;
//! let big = t.filter(|t| t.column("x")?.greater(2));
//! big.get_column("x")?.fill(0)?;
//! assert_eq!(
//!     t.column("x")?.to_vec(),
//!     vec![Value::Int64(1), Value::Int64(2), Value::Int64(0), Value::Int64(0)]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Grouping example
//!
//! ```rust
//! use rust_column_table::grid::ColumnSet;
//! use rust_column_table::table::{GroupableView, Table};
//! use rust_column_table::types::Value;
//!
//! # fn main() -> Result<(), rust_column_table::TableError> {
//! let t = Table::new(
//!     ColumnSet::new()
//!         .with("team", vec!["a", "b", "a"])
//!         .with("score", vec![1.0, 2.0, 4.0]),
//! )?;
//! let totals = t.group_by(&["team"]).apply(|g| g.get_column("score")?.sum())?;
//! // The value column gets the first free `v_<n>` name.
//! assert_eq!(
//!     totals.column("v_0")?.to_vec(),
//!     vec![Value::Float64(5.0), Value::Float64(2.0)]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`table`]: the [`table::Table`] container and the [`table::TableLike`] capability trait
//! - [`column`]: typed column storage, elementwise operators and reductions
//! - [`masked`]: write-through columns over a subset of rows
//! - [`view`]: lazy and static row views
//! - [`grouping`]: group-by with `each`, `apply` and `reduce`
//! - [`join`], [`stack`]: relational joins and row-wise concatenation
//! - [`grid`]: column sources and the uniform-length check
//! - [`json`]: JSON interchange
//! - [`error`]: error types used across the crate
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade: operation summaries at
//! `debug`, view cache scopes at `trace`. Install any `log` backend to see them.

pub mod column;
pub mod error;
pub mod grid;
pub mod grouping;
pub mod join;
pub mod json;
pub mod masked;
pub mod stack;
pub mod table;
pub mod types;
pub mod view;

pub use column::{Column, SharedColumn};
pub use error::{TableError, TableResult};
pub use grid::ColumnSet;
pub use join::JoinType;
pub use masked::MaskedColumn;
pub use table::{GroupableView, Table, TableLike};
pub use types::{DataType, Value};
pub use view::{StaticView, View};
