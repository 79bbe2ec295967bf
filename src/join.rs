//! Relational joins on equal key tuples.
//!
//! Right rows are hashed by key; every left row is paired with every right row sharing its key.
//! Rows without a partner are kept according to [`JoinType`], paired with `None`, and read as
//! nulls. The output holds the left columns followed by the right columns the left side lacks;
//! key columns of unmatched right rows are filled from the right.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::column::{Column, Operand};
use crate::error::{TableError, TableResult};
use crate::grouping::{Partition, key_tuples};
use crate::table::{Table, TableLike};

/// Which unmatched rows a join keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Only matched pairs.
    #[default]
    Inner,
    /// Plus left rows without a match.
    Left,
    /// Plus right rows without a match.
    Right,
    /// Plus unmatched rows of both sides.
    Outer,
}

impl JoinType {
    pub fn keeps_left(self) -> bool {
        matches!(self, JoinType::Left | JoinType::Outer)
    }

    pub fn keeps_right(self) -> bool {
        matches!(self, JoinType::Right | JoinType::Outer)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Outer => "outer",
        };
        f.write_str(s)
    }
}

impl FromStr for JoinType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "outer" => Ok(JoinType::Outer),
            other => Err(TableError::ConfigurationError {
                message: format!("expected one of inner, left, right, outer; got {other:?}"),
            }),
        }
    }
}

/// Paired row positions; `None` marks the side without a match.
#[derive(Debug, Default, PartialEq)]
struct JoinIndex {
    left: Vec<Option<usize>>,
    right: Vec<Option<usize>>,
}

impl JoinIndex {
    fn push(&mut self, left: Option<usize>, right: Option<usize>) {
        self.left.push(left);
        self.right.push(right);
    }

    fn len(&self) -> usize {
        self.left.len()
    }
}

fn build_index(
    left_keys: &[Column],
    right_keys: &[Column],
    right_rows: usize,
    how: JoinType,
) -> JoinIndex {
    let right = Partition::build(key_tuples(right_keys));
    let mut matched = vec![false; right_rows];
    let mut index = JoinIndex::default();

    for (l, tuple) in key_tuples(left_keys).iter().enumerate() {
        match right.find(tuple) {
            Some(slot) => {
                for &r in right.members(slot) {
                    index.push(Some(l), Some(r));
                    matched[r] = true;
                }
            }
            None if how.keeps_left() => index.push(Some(l), None),
            None => {}
        }
    }

    if how.keeps_right() {
        for (r, _) in matched.iter().enumerate().filter(|(_, m)| !**m) {
            index.push(None, Some(r));
        }
    }
    index
}

fn check_keys(side: &dyn TableLike, keys: &[&str]) -> TableResult<()> {
    if keys.iter().all(|k| side.has_column(k)) {
        return Ok(());
    }
    Err(TableError::ColumnMismatch {
        expected: keys.iter().map(|k| k.to_string()).collect(),
        found: side.colnames(),
    })
}

/// Join two table-like values on the named key columns.
pub fn join(
    left: &dyn TableLike,
    right: &dyn TableLike,
    keys: &[&str],
    how: JoinType,
) -> TableResult<Table> {
    check_keys(left, keys)?;
    check_keys(right, keys)?;

    let left_keys = keys
        .iter()
        .map(|k| left.read_column(k))
        .collect::<TableResult<Vec<_>>>()?;
    let right_keys = keys
        .iter()
        .map(|k| right.read_column(k))
        .collect::<TableResult<Vec<_>>>()?;
    let right_rows = right.nrows()?;
    let index = build_index(&left_keys, &right_keys, right_rows, how);

    log::debug!(
        "{how} join on {keys:?}: {} x {} rows -> {} rows",
        left.nrows()?,
        right_rows,
        index.len()
    );

    let blanks: Vec<usize> = index
        .left
        .iter()
        .enumerate()
        .filter_map(|(i, l)| l.is_none().then_some(i))
        .collect();

    let left_names = left.colnames();
    let mut columns = Vec::with_capacity(left_names.len());
    for name in &left_names {
        let mut column = left.read_column(name)?.take_optional(&index.left)?;
        if let Some(k) = keys.iter().position(|k| *k == name.as_str()) {
            if !blanks.is_empty() {
                column = fill_keys(column, &right_keys[k], &index, &blanks)?;
            }
        }
        columns.push((name.clone(), column));
    }
    for name in right.colnames() {
        if left_names.contains(&name) {
            continue;
        }
        let column = right.read_column(&name)?.take_optional(&index.right)?;
        columns.push((name, column));
    }

    Ok(Table::from_parts(columns))
}

/// Copy right key values into the rows that have no left partner.
fn fill_keys(
    left: Column,
    right: &Column,
    index: &JoinIndex,
    blanks: &[usize],
) -> TableResult<Column> {
    let dtype = left.dtype().unify(right.dtype());
    let mut out = left.cast(dtype)?;
    let from_right: Vec<Option<usize>> = blanks.iter().map(|&i| index.right[i]).collect();
    let values = right.take_optional(&from_right)?.cast(dtype)?;
    out.write_rows(blanks, &Operand::Column(&values))?;
    Ok(out)
}

impl Table {
    /// Join with `other` on the named key columns.
    ///
    /// ```rust
    /// use rust_column_table::grid::ColumnSet;
    /// use rust_column_table::join::JoinType;
    /// use rust_column_table::table::Table;
    ///
    /// let left = ColumnSet::new().with("k", vec![1, 2]).with("l", vec!["a", "b"]);
    /// let left = Table::new(left).unwrap();
    /// let right = ColumnSet::new().with("k", vec![2, 3]).with("r", vec![true, false]);
    /// let right = Table::new(right).unwrap();
    /// assert_eq!(left.join(&right, &["k"], JoinType::Inner).unwrap().row_count(), 1);
    /// assert_eq!(left.join(&right, &["k"], JoinType::Outer).unwrap().row_count(), 3);
    /// ```
    pub fn join(&self, other: &dyn TableLike, keys: &[&str], how: JoinType) -> TableResult<Table> {
        join(self, other, keys, how)
    }
}
