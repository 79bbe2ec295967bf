//! Raw column input and the uniform-length validator.
//!
//! Tables are built from a [`ColumnSet`]: an insertion-ordered list of `name -> source` entries
//! where each source is a scalar, a list, a range or an existing [`Column`].
//! [`ColumnSet::ensure_uniform`] turns it into equal-length columns, broadcasting scalars.

use std::ops::Range;

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::types::{DataType, Value};

/// A raw value supplied for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// Broadcast to the row count.
    Scalar(Value),
    /// One value per row; the type is inferred.
    List(Vec<Value>),
    /// Materialized to integers.
    Range(Range<i64>),
    /// Used as is.
    Column(Column),
}

impl ColumnSource {
    /// Row count (trailing length) of a vector-like source.
    pub fn row_len(&self) -> Option<usize> {
        match self {
            ColumnSource::Scalar(_) => None,
            ColumnSource::List(values) => Some(values.len()),
            ColumnSource::Range(r) => Some(r.clone().count()),
            ColumnSource::Column(c) => Some(c.len()),
        }
    }

    /// Type and leading shape of the column this source produces.
    pub(crate) fn layout(&self) -> (DataType, Vec<usize>) {
        match self {
            ColumnSource::Scalar(v) => (v.data_type().unwrap_or(DataType::Object), Vec::new()),
            ColumnSource::List(values) => (DataType::infer(values), Vec::new()),
            ColumnSource::Range(_) => (DataType::Int64, Vec::new()),
            ColumnSource::Column(c) => (c.dtype(), c.leading_shape().to_vec()),
        }
    }

    fn into_column(self, rows: usize) -> TableResult<Column> {
        match self {
            ColumnSource::Scalar(v) => {
                let dtype = v.data_type().unwrap_or(DataType::Object);
                Column::full(dtype, &[], rows, v)
            }
            other => Column::make(other),
        }
    }
}

macro_rules! scalar_source_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for ColumnSource {
                fn from(v: $t) -> Self {
                    ColumnSource::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_source_from!(Value, i64, i32, f64, bool, &str, String);

macro_rules! list_source_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<Vec<$t>> for ColumnSource {
                fn from(v: Vec<$t>) -> Self {
                    ColumnSource::Column(Column::from(v))
                }
            }
        )*
    };
}

list_source_from!(i64, i32, f64, bool, &str, String);

impl From<Vec<Value>> for ColumnSource {
    fn from(v: Vec<Value>) -> Self {
        ColumnSource::List(v)
    }
}

impl From<Range<i64>> for ColumnSource {
    fn from(r: Range<i64>) -> Self {
        ColumnSource::Range(r)
    }
}

impl From<Column> for ColumnSource {
    fn from(c: Column) -> Self {
        ColumnSource::Column(c)
    }
}

/// Insertion-ordered `name -> source` mapping.
///
/// Inserting an existing name replaces its source in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    entries: Vec<(String, ColumnSource)>,
}

/// Output of [`ColumnSet::ensure_uniform`]: equal-length columns and their row count.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformColumnSet {
    pub nrows: usize,
    pub columns: Vec<(String, Column)>,
}

impl ColumnSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ColumnSet::insert`].
    pub fn with(mut self, name: impl Into<String>, source: impl Into<ColumnSource>) -> Self {
        self.insert(name, source);
        self
    }

    /// Add or replace the source for `name`; insertion order is kept for new names.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<ColumnSource>) {
        let name = name.into();
        let source = source.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = source,
            None => self.entries.push((name, source)),
        }
    }

    /// The source registered for `name`.
    pub fn get(&self, name: &str) -> Option<&ColumnSource> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Column names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnSource)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Normalize into equal-length columns.
    ///
    /// - Vector-like entries must agree on their row count, and on `expected_rows` when given;
    ///   otherwise [`TableError::ShapeMismatch`] lists the distinct lengths found.
    /// - Without vector-like entries the row count is `expected_rows`, or 1.
    /// - Scalars are broadcast to the row count; ranges and lists are materialized.
    pub fn ensure_uniform(self, expected_rows: Option<usize>) -> TableResult<UniformColumnSet> {
        let mut lengths: Vec<usize> = Vec::new();
        for (_, source) in &self.entries {
            if let Some(n) = source.row_len() {
                if !lengths.contains(&n) {
                    lengths.push(n);
                }
            }
        }

        let nrows = match (expected_rows, lengths.as_slice()) {
            (Some(rows), []) => rows,
            (Some(rows), [n]) if *n == rows => rows,
            (Some(_), _) => return Err(TableError::ShapeMismatch { lengths }),
            (None, []) => 1,
            (None, [n]) => *n,
            (None, _) => return Err(TableError::ShapeMismatch { lengths }),
        };

        let columns = self
            .entries
            .into_iter()
            .map(|(name, source)| Ok((name, source.into_column(nrows)?)))
            .collect::<TableResult<Vec<_>>>()?;

        Ok(UniformColumnSet { nrows, columns })
    }
}

impl<K, V> FromIterator<(K, V)> for ColumnSet
where
    K: Into<String>,
    V: Into<ColumnSource>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ColumnSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl IntoIterator for ColumnSet {
    type Item = (String, ColumnSource);
    type IntoIter = std::vec::IntoIter<(String, ColumnSource)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// `prefix` followed by one more than the largest numeric suffix already used with `prefix`.
///
/// `next_available_name("v_", ["k", "v_0", "v_7"]) == "v_8"`; with no such names, `"v_0"`.
pub fn next_available_name<S: AsRef<str>>(prefix: &str, names: &[S]) -> String {
    let next = names
        .iter()
        .filter_map(|n| n.as_ref().strip_prefix(prefix))
        .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max + 1);
    format!("{prefix}{next}")
}
