//! The [`Table`] type and the capability traits shared by tables, views and groups.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::column::{Column, SharedColumn};
use crate::error::{TableError, TableResult};
use crate::grid::{ColumnSet, ColumnSource, UniformColumnSet};
use crate::grouping::{Computed, GroupSource, Grouping};
use crate::masked::check_indices;
use crate::types::{DataType, Value};
use crate::view::{StaticView, View};

/// Read access shared by [`Table`], [`View`], [`StaticView`] and groups.
///
/// Grouping callbacks receive their source through this trait, and [`crate::stack::Stackable`]
/// accepts anything implementing it.
pub trait TableLike {
    /// Row count; fails when a lazy view's predicate fails.
    fn nrows(&self) -> TableResult<usize>;

    fn colnames(&self) -> Vec<String>;

    fn ncols(&self) -> usize {
        self.colnames().len()
    }

    fn has_column(&self, name: &str) -> bool;

    /// Detached copy of the named column, restricted to this object's rows.
    fn read_column(&self, name: &str) -> TableResult<Column>;

    /// Materialize into a new, independent table.
    fn to_table(&self) -> TableResult<Table>;
}

/// Anything that can be partitioned by [`Grouping`].
pub trait GroupableView {
    #[doc(hidden)]
    fn grouping_source(&self) -> GroupSource<'_>;

    /// Group rows by the values of the named columns.
    fn group_by(&self, keys: &[&str]) -> Grouping<'_> {
        Grouping::by_names(self.grouping_source(), keys)
    }

    /// Group rows by the columns a callback derives from this object.
    ///
    /// The callback must return [`Computed::Columns`] or [`Computed::Table`] with one row per
    /// row of `self`; anything else fails with [`TableError::GroupKeyTypeError`].
    fn group_by_with<'a, F>(&'a self, keys: F) -> Grouping<'a>
    where
        F: Fn(&dyn TableLike) -> TableResult<Computed> + 'a,
    {
        Grouping::by_callback(self.grouping_source(), Box::new(keys))
    }
}

/// An ordered set of equal-length, named columns.
///
/// Columns are shared handles so that views can write through to them; all mutation goes through
/// `&self`. [`Clone`] deep-copies every column.
#[derive(Debug, Default)]
pub struct Table {
    columns: RefCell<Vec<(String, SharedColumn)>>,
}

/// One table row, detached from the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    index: usize,
    names: Rc<[String]>,
    blocks: Vec<Vec<Value>>,
}

impl Row {
    /// Position of the row in the table it was read from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The row's block of values for `name` (one value for one-dimensional columns).
    pub fn get(&self, name: &str) -> Option<&[Value]> {
        let pos = self.names.iter().position(|n| n == name)?;
        self.blocks.get(pos).map(Vec::as_slice)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(|block| block.first())
    }
}

impl Table {
    /// Build a table from raw column sources; see [`ColumnSet::ensure_uniform`].
    ///
    /// ```rust
    /// use rust_column_table::grid::ColumnSet;
    /// use rust_column_table::table::Table;
    /// use rust_column_table::types::Value;
    ///
    /// let t = Table::new(ColumnSet::new().with("a", vec![1, 2, 3]).with("b", 5)).unwrap();
    /// assert_eq!(t.column("b").unwrap().to_vec(), vec![Value::Int64(5); 3]);
    /// ```
    pub fn new(set: ColumnSet) -> TableResult<Self> {
        if set.is_empty() {
            return Ok(Self::empty());
        }
        Ok(Self::from(set.ensure_uniform(None)?))
    }

    /// A table without columns (and so without rows).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from named columns; lengths must agree.
    pub fn from_columns(columns: Vec<(String, Column)>) -> TableResult<Self> {
        Self::new(columns.into_iter().collect())
    }

    /// Assemble a table from columns already known to be uniform.
    pub(crate) fn from_parts(columns: Vec<(String, Column)>) -> Self {
        Self {
            columns: RefCell::new(
                columns
                    .into_iter()
                    .map(|(name, column)| (name, column.into_shared()))
                    .collect(),
            ),
        }
    }

    /// Snapshot of the column handles; no borrow is held afterwards.
    pub(crate) fn handles(&self) -> Vec<(String, SharedColumn)> {
        self.columns
            .borrow()
            .iter()
            .map(|(name, column)| (name.clone(), Rc::clone(column)))
            .collect()
    }

    /// Number of rows; 0 for a table without columns.
    pub fn row_count(&self) -> usize {
        self.columns
            .borrow()
            .first()
            .map_or(0, |(_, column)| column.borrow().len())
    }

    pub fn ncols(&self) -> usize {
        self.columns.borrow().len()
    }

    pub fn colnames(&self) -> Vec<String> {
        self.columns.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.borrow().iter().any(|(n, _)| n == name)
    }

    /// Detached copy of a column.
    pub fn column(&self, name: &str) -> TableResult<Column> {
        Ok(self.column_ref(name)?.borrow().clone())
    }

    /// Shared handle to a column's storage; writes are visible to the table.
    ///
    /// Element writes through the handle are fine. Replacing or resizing the column through it is
    /// not supported and breaks the equal-row-count guarantee; use [`Table::set_column`] or
    /// [`Table::replace_column`] for that.
    pub fn column_ref(&self, name: &str) -> TableResult<SharedColumn> {
        self.columns
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, column)| Rc::clone(column))
            .ok_or_else(|| TableError::not_found(name))
    }

    /// Detached copies of every column, in order.
    pub fn columns(&self) -> Vec<(String, Column)> {
        self.handles()
            .into_iter()
            .map(|(name, column)| {
                let column = column.borrow().clone();
                (name, column)
            })
            .collect()
    }

    /// Create a one-dimensional column filled with the type's default value.
    ///
    /// An existing column of the same name is replaced.
    pub fn add_column(&self, name: &str, dtype: DataType) -> TableResult<SharedColumn> {
        self.add_column_shaped(name, dtype, &[])
    }

    /// Like [`Table::add_column`], with leading dimensions `shape`.
    pub fn add_column_shaped(
        &self,
        name: &str,
        dtype: DataType,
        shape: &[usize],
    ) -> TableResult<SharedColumn> {
        let column = Column::full(dtype, shape, self.row_count(), dtype.default_value())?;
        let shared = column.into_shared();
        self.put(name, Rc::clone(&shared));
        Ok(shared)
    }

    fn put(&self, name: &str, column: SharedColumn) {
        let mut columns = self.columns.borrow_mut();
        match columns.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = column,
            None => columns.push((name.to_string(), column)),
        }
    }

    /// Assign a column from a source; scalars are broadcast.
    ///
    /// An existing column is written in place (views over it see the change). A missing column is
    /// created first; if the assignment then fails, it is removed again and the table is left as
    /// it was. The first column of an empty table sets the row count.
    pub fn set_column(&self, name: &str, source: impl Into<ColumnSource>) -> TableResult<()> {
        let source = source.into();

        if self.ncols() == 0 {
            let uniform = ColumnSet::new().with(name, source).ensure_uniform(None)?;
            for (name, column) in uniform.columns {
                self.put(&name, column.into_shared());
            }
            return Ok(());
        }

        if let Ok(existing) = self.column_ref(name) {
            return existing.borrow_mut().assign(&source);
        }

        let (dtype, shape) = source.layout();
        let created = self.add_column_shaped(name, dtype, &shape)?;
        let result = created.borrow_mut().assign(&source);
        if result.is_err() {
            self.pop_column(name)?;
        }
        result
    }

    /// Swap in a whole new column of the table's row count.
    ///
    /// Masks over the old column stop writing through.
    pub fn replace_column(&self, name: &str, column: Column) -> TableResult<()> {
        let rows = self.row_count();
        let has_others = self.columns.borrow().iter().any(|(n, _)| n != name);
        if has_others && column.len() != rows {
            return Err(TableError::ShapeMismatch {
                lengths: vec![rows, column.len()],
            });
        }
        self.put(name, column.into_shared());
        Ok(())
    }

    /// Remove a column and return its values.
    pub fn pop_column(&self, name: &str) -> TableResult<Column> {
        let mut columns = self.columns.borrow_mut();
        let pos = columns
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| TableError::not_found(name))?;
        let (_, column) = columns.remove(pos);
        let values = column.borrow().clone();
        Ok(values)
    }

    /// Detached rows at `positions`, in order.
    pub(crate) fn rows_at(&self, positions: &[usize]) -> TableResult<Vec<Row>> {
        let handles = self.handles();
        let names: Rc<[String]> = handles.iter().map(|(n, _)| n.clone()).collect();
        check_indices(positions, self.row_count())?;

        let columns: Vec<_> = handles.iter().map(|(_, c)| c.borrow()).collect();
        Ok(positions
            .iter()
            .map(|&index| Row {
                index,
                names: Rc::clone(&names),
                blocks: columns
                    .iter()
                    .map(|c| c.row(index).map(<[Value]>::to_vec).unwrap_or_default())
                    .collect(),
            })
            .collect())
    }

    /// Every row, detached.
    pub fn rows(&self) -> Vec<Row> {
        let all: Vec<usize> = (0..self.row_count()).collect();
        self.rows_at(&all).unwrap_or_default()
    }

    pub fn row(&self, index: usize) -> TableResult<Row> {
        self.rows_at(&[index])?
            .pop()
            .ok_or(TableError::IndexOutOfBounds {
                index,
                len: self.row_count(),
            })
    }

    /// Lazy view of the rows where `predicate` holds.
    ///
    /// The predicate returns one boolean per table row and is evaluated on every access, so the
    /// view follows later changes to the table.
    pub fn filter<'a, F>(&'a self, predicate: F) -> View<'a>
    where
        F: Fn(&Table) -> TableResult<Column> + 'a,
    {
        View::new(self, predicate)
    }

    /// Snapshot view of the rows at `indices`.
    pub fn view_at(&self, indices: impl Into<Rc<[usize]>>) -> TableResult<StaticView<'_>> {
        StaticView::new(self, indices)
    }

    /// New table holding the rows at `positions`, in order.
    pub(crate) fn take_rows(&self, positions: &[usize]) -> TableResult<Table> {
        let columns = self
            .handles()
            .into_iter()
            .map(|(name, column)| {
                let taken = column.borrow().take(positions)?;
                Ok((name, taken))
            })
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Table::from_parts(columns))
    }

    /// New table sorted by the named columns (stable, ascending, [`Value::total_cmp`] order).
    pub fn sort_by(&self, names: &[&str]) -> TableResult<Table> {
        let keys = names
            .iter()
            .map(|name| self.column(name))
            .collect::<TableResult<Vec<_>>>()?;

        let mut order: Vec<usize> = (0..self.row_count()).collect();
        order.sort_by(|&a, &b| {
            keys.iter()
                .map(|k| k.cmp_rows(a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        self.take_rows(&order)
    }
}

impl From<UniformColumnSet> for Table {
    fn from(uniform: UniformColumnSet) -> Self {
        Table::from_parts(uniform.columns)
    }
}

impl Clone for Table {
    fn clone(&self) -> Self {
        Table::from_parts(self.columns())
    }
}

/// Tables are equal when they hold the same names with equal columns, in any order.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        let ours = self.columns();
        let theirs = other.columns();
        ours.len() == theirs.len()
            && ours
                .iter()
                .all(|(name, column)| theirs.iter().any(|(n, c)| n == name && c == column))
    }
}

impl TableLike for Table {
    fn nrows(&self) -> TableResult<usize> {
        Ok(self.row_count())
    }

    fn colnames(&self) -> Vec<String> {
        Table::colnames(self)
    }

    fn has_column(&self, name: &str) -> bool {
        Table::has_column(self, name)
    }

    fn read_column(&self, name: &str) -> TableResult<Column> {
        self.column(name)
    }

    fn to_table(&self) -> TableResult<Table> {
        Ok(self.clone())
    }
}

impl GroupableView for Table {
    fn grouping_source(&self) -> GroupSource<'_> {
        GroupSource::Table(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Table, TableLike};
    use crate::column::Column;
    use crate::error::TableError;
    use crate::grid::ColumnSet;
    use crate::types::{DataType, Value};

    fn sample() -> Table {
        Table::new(
            ColumnSet::new()
                .with("id", vec![3, 1, 2])
                .with("name", vec!["c", "a", "b"]),
        )
        .unwrap()
    }

    #[test]
    fn set_column_writes_existing_columns_in_place() {
        let t = sample();
        let handle = t.column_ref("id").unwrap();
        t.set_column("id", vec![7, 8, 9]).unwrap();
        assert_eq!(handle.borrow().to_vec()[0], Value::Int64(7));
    }

    #[test]
    fn failed_set_column_leaves_no_partial_column() {
        let t = sample();
        let err = t.set_column("extra", vec![1, 2]).unwrap_err();
        assert!(matches!(err, TableError::ShapeMismatch { .. }));
        assert!(!t.has_column("extra"));
        assert_eq!(t.ncols(), 2);
    }

    #[test]
    fn first_column_sets_row_count() {
        let t = Table::empty();
        assert_eq!(t.row_count(), 0);
        t.set_column("x", 0..4).unwrap();
        assert_eq!(t.row_count(), 4);
        t.set_column("y", "k").unwrap();
        assert_eq!(t.column("y").unwrap().dtype(), DataType::Utf8);
    }

    #[test]
    fn add_column_fills_defaults() {
        let t = sample();
        t.add_column("flag", DataType::Bool).unwrap();
        assert_eq!(t.column("flag").unwrap().to_vec(), vec![Value::Bool(false); 3]);
    }

    #[test]
    fn sort_by_is_stable() {
        let t = Table::new(
            ColumnSet::new()
                .with("k", vec![2, 1, 2, 1])
                .with("v", vec!["a", "b", "c", "d"]),
        )
        .unwrap();
        let sorted = t.sort_by(&["k"]).unwrap();
        assert_eq!(
            sorted.column("v").unwrap(),
            Column::from(vec!["b", "d", "a", "c"])
        );
    }

    #[test]
    fn clone_is_deep_and_equality_ignores_order() {
        let t = sample();
        let copy = t.clone();
        t.set_column("id", 0).unwrap();
        assert_ne!(t, copy);

        let reordered = Table::new(
            ColumnSet::new()
                .with("name", vec!["c", "a", "b"])
                .with("id", vec![3, 1, 2]),
        )
        .unwrap();
        assert_eq!(copy, reordered);
    }

    #[test]
    fn rows_expose_values_by_name() {
        let t = sample();
        let row = t.row(1).unwrap();
        assert_eq!(row.value("name"), Some(&Value::from("a")));
        assert_eq!(row.index(), 1);
        assert!(t.row(3).is_err());
        assert_eq!(t.rows().len(), 3);
    }

    #[test]
    fn pop_column_removes_and_returns() {
        let t = sample();
        let popped = t.pop_column("name").unwrap();
        assert_eq!(popped.len(), 3);
        assert_eq!(TableLike::colnames(&t), vec!["id".to_string()]);
        assert!(matches!(
            t.pop_column("name"),
            Err(TableError::ColumnNotFound { .. })
        ));
    }
}
