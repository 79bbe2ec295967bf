//! Row-wise concatenation of same-schema column sets.
//!
//! Sources without rows are skipped entirely; every other source must carry exactly the same set
//! of column names as the first one (in any order). Columns are concatenated in source order with
//! [`Column::stack`].

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::grid::ColumnSet;
use crate::grouping::Group;
use crate::table::{Table, TableLike};
use crate::view::{StaticView, View};

/// Anything [`stack`] accepts.
pub enum Stackable<'a> {
    /// A table, view or group, read through [`TableLike`].
    Frame(&'a (dyn TableLike + 'a)),
    Table(Table),
    /// Raw column sources; normalized with [`ColumnSet::ensure_uniform`].
    Columns(ColumnSet),
}

impl<'a> From<&'a Table> for Stackable<'a> {
    fn from(t: &'a Table) -> Self {
        Stackable::Frame(t)
    }
}

impl<'a, 'b: 'a> From<&'a View<'b>> for Stackable<'a> {
    fn from(v: &'a View<'b>) -> Self {
        Stackable::Frame(v)
    }
}

impl<'a, 'b: 'a> From<&'a StaticView<'b>> for Stackable<'a> {
    fn from(v: &'a StaticView<'b>) -> Self {
        Stackable::Frame(v)
    }
}

impl<'a, 'b: 'a> From<&'a Group<'b>> for Stackable<'a> {
    fn from(g: &'a Group<'b>) -> Self {
        Stackable::Frame(g.view())
    }
}

impl From<Table> for Stackable<'_> {
    fn from(t: Table) -> Self {
        Stackable::Table(t)
    }
}

impl From<ColumnSet> for Stackable<'_> {
    fn from(set: ColumnSet) -> Self {
        Stackable::Columns(set)
    }
}

impl Stackable<'_> {
    /// Named columns, or nothing when the source has no rows.
    fn into_columns(self) -> TableResult<Vec<(String, Column)>> {
        match self {
            Stackable::Frame(frame) => {
                if frame.nrows()? == 0 {
                    return Ok(Vec::new());
                }
                frame
                    .colnames()
                    .into_iter()
                    .map(|name| {
                        let column = frame.read_column(&name)?;
                        Ok((name, column))
                    })
                    .collect()
            }
            Stackable::Table(t) if t.row_count() == 0 => Ok(Vec::new()),
            Stackable::Table(t) => Ok(t.columns()),
            Stackable::Columns(set) if set.is_empty() => Ok(Vec::new()),
            Stackable::Columns(set) => {
                let uniform = set.ensure_uniform(None)?;
                if uniform.nrows == 0 {
                    return Ok(Vec::new());
                }
                Ok(uniform.columns)
            }
        }
    }
}

fn same_names(expected: &[String], found: &[(String, Column)]) -> bool {
    expected.len() == found.len() && found.iter().all(|(n, _)| expected.contains(n))
}

/// Concatenate uniform column sets; sets without columns or rows are skipped.
pub(crate) fn stack_column_sets(
    sets: Vec<Vec<(String, Column)>>,
) -> TableResult<Vec<(String, Column)>> {
    let total = sets.len();
    let sets: Vec<_> = sets
        .into_iter()
        .filter(|set| set.first().is_some_and(|(_, c)| !c.is_empty()))
        .collect();

    let Some(first) = sets.first() else {
        return Ok(Vec::new());
    };
    let names: Vec<String> = first.iter().map(|(n, _)| n.clone()).collect();
    for set in &sets[1..] {
        if !same_names(&names, set) {
            return Err(TableError::ColumnMismatch {
                expected: names,
                found: set.iter().map(|(n, _)| n.clone()).collect(),
            });
        }
    }

    log::debug!("stacking {} of {} sources over {:?}", sets.len(), total, names);
    names
        .into_iter()
        .map(|name| {
            let segments: Vec<&Column> = sets
                .iter()
                .filter_map(|set| set.iter().find(|(n, _)| *n == name).map(|(_, c)| c))
                .collect();
            let column = Column::stack(&segments)?;
            Ok((name, column))
        })
        .collect()
}

/// Stack sources row-wise into a new table.
///
/// ```rust
/// use rust_column_table::grid::ColumnSet;
/// use rust_column_table::stack::stack;
/// use rust_column_table::table::Table;
/// use rust_column_table::types::Value;
///
/// let a = Table::new(ColumnSet::new().with("x", vec![1, 2])).unwrap();
/// let b = Table::new(ColumnSet::new().with("x", vec![3])).unwrap();
/// let out = stack([&a, &b]).unwrap();
/// assert_eq!(
///     out.column("x").unwrap().to_vec(),
///     vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]
/// );
/// ```
pub fn stack<'a, S>(sources: impl IntoIterator<Item = S>) -> TableResult<Table>
where
    S: Into<Stackable<'a>>,
{
    let sets = sources
        .into_iter()
        .map(|s| s.into().into_columns())
        .collect::<TableResult<Vec<_>>>()?;
    Ok(Table::from_parts(stack_column_sets(sets)?))
}

impl Table {
    /// See [`stack`].
    pub fn stack<'a, S>(sources: impl IntoIterator<Item = S>) -> TableResult<Table>
    where
        S: Into<Stackable<'a>>,
    {
        stack(sources)
    }

    /// This table's rows followed by those of `others`.
    pub fn stack_with<'a, S>(&self, others: impl IntoIterator<Item = S>) -> TableResult<Table>
    where
        S: Into<Stackable<'a>>,
    {
        let mut sources: Vec<Stackable<'_>> = vec![Stackable::Frame(self)];
        for other in others {
            sources.push(other.into());
        }
        stack(sources)
    }

    /// Append the rows of `others` to this table, replacing its columns.
    ///
    /// Nothing changes when stacking fails.
    pub fn stack_in_place<'a, S>(&mut self, others: impl IntoIterator<Item = S>) -> TableResult<()>
    where
        S: Into<Stackable<'a>>,
    {
        let stacked = self.stack_with(others)?;
        *self = stacked;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Stackable, stack};
    use crate::column::Column;
    use crate::error::TableError;
    use crate::grid::ColumnSet;
    use crate::table::Table;
    use crate::types::Value;

    fn xs(values: Vec<i64>) -> Table {
        Table::new(ColumnSet::new().with("x", values)).unwrap()
    }

    #[test]
    fn empty_sources_are_skipped() {
        let empty = Table::new(ColumnSet::new().with("other", Vec::<i64>::new())).unwrap();
        let out = stack([&xs(vec![1]), &empty, &xs(vec![2])]).unwrap();
        assert_eq!(out.column("x").unwrap(), Column::from(vec![1, 2]));
    }

    #[test]
    fn names_must_match_in_any_order() {
        let a = Table::new(ColumnSet::new().with("x", vec![1]).with("y", vec![2])).unwrap();
        let b = Table::new(ColumnSet::new().with("y", vec![3]).with("x", vec![4])).unwrap();
        let out = stack([&a, &b]).unwrap();
        assert_eq!(out.column("y").unwrap(), Column::from(vec![2, 3]));

        let c = xs(vec![5]);
        assert!(matches!(
            stack([&a, &c]),
            Err(TableError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn mixes_tables_views_and_raw_columns() {
        let t = xs(vec![1, 2, 3]);
        let v = t.filter(|t| t.column("x")?.greater(1));
        let out = stack(vec![
            Stackable::from(&v),
            Stackable::from(ColumnSet::new().with("x", 9)),
        ])
        .unwrap();
        assert_eq!(out.column("x").unwrap(), Column::from(vec![2, 3, 9]));
    }

    #[test]
    fn all_empty_gives_an_empty_table() {
        let out = stack([xs(vec![]), xs(vec![])]).unwrap();
        assert_eq!(out.ncols(), 0);
        assert_eq!(out.row_count(), 0);
    }

    #[test]
    fn stack_in_place_replaces_columns() {
        let mut t = xs(vec![1]);
        t.stack_in_place([&xs(vec![2])]).unwrap();
        assert_eq!(t.column("x").unwrap().to_vec(), vec![Value::Int64(1), Value::Int64(2)]);

        let bad = Table::new(ColumnSet::new().with("z", vec![0])).unwrap();
        assert!(t.stack_in_place([&bad]).is_err());
        assert_eq!(t.row_count(), 2);
    }
}
