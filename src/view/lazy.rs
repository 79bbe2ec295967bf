use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::grid::ColumnSource;
use crate::grouping::GroupSource;
use crate::masked::MaskedColumn;
use crate::table::{GroupableView, Table, TableLike};
use crate::types::DataType;

use super::scope::Pin;
use super::{StaticView, materialize, set_through};

type Predicate<'a> = Box<dyn Fn(&Table) -> TableResult<Column> + 'a>;
type PinnedColumns = Rc<Vec<(String, MaskedColumn)>>;

/// A lazily filtered view of a table.
///
/// ```rust
/// use rust_column_table::grid::ColumnSet;
/// use rust_column_table::table::Table;
///
/// let t = Table::new(ColumnSet::new().with("a", vec![1, 2, 3])).unwrap();
/// let v = t.filter(|t| t.column("a")?.greater(1));
/// assert_eq!(v.nrows().unwrap(), 2);
///
/// t.set_column("a", vec![5, 6, 7]).unwrap();
/// assert_eq!(v.nrows().unwrap(), 3);
/// ```
pub struct View<'a> {
    parent: &'a Table,
    predicate: Predicate<'a>,
    pinned_indices: RefCell<Option<Rc<[usize]>>>,
    pinned_columns: RefCell<Option<PinnedColumns>>,
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("parent", &self.parent)
            .field("pinned_indices", &self.pinned_indices)
            .finish_non_exhaustive()
    }
}

impl<'a> View<'a> {
    pub fn new<F>(parent: &'a Table, predicate: F) -> Self
    where
        F: Fn(&Table) -> TableResult<Column> + 'a,
    {
        Self {
            parent,
            predicate: Box::new(predicate),
            pinned_indices: RefCell::new(None),
            pinned_columns: RefCell::new(None),
        }
    }

    pub fn parent(&self) -> &'a Table {
        self.parent
    }

    /// Parent row positions selected by the predicate, evaluated now unless pinned by
    /// [`View::cache_indices`].
    pub fn indices(&self) -> TableResult<Rc<[usize]>> {
        if let Some(pinned) = self.pinned_indices.borrow().as_ref() {
            return Ok(Rc::clone(pinned));
        }

        let mask = (self.predicate)(self.parent)?;
        let rows = self.parent.row_count();
        if mask.len() != rows {
            return Err(TableError::ShapeMismatch {
                lengths: vec![rows, mask.len()],
            });
        }
        Ok(mask.where_true()?.into())
    }

    pub fn nrows(&self) -> TableResult<usize> {
        Ok(self.indices()?.len())
    }

    pub fn colnames(&self) -> Vec<String> {
        self.parent.colnames()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.parent.has_column(name)
    }

    /// The view rows of `name`, as a mask over the parent column.
    pub fn get_column(&self, name: &str) -> TableResult<MaskedColumn> {
        if let Some(pinned) = self.pinned_columns.borrow().as_ref() {
            if let Some((_, mask)) = pinned.iter().find(|(n, _)| n == name) {
                return Ok(mask.share());
            }
        }
        let column = self.parent.column_ref(name)?;
        MaskedColumn::mask(&column, self.indices()?)
    }

    /// Masks over every parent column, sharing one evaluation of the predicate.
    pub fn columns(&self) -> TableResult<Vec<(String, MaskedColumn)>> {
        if let Some(pinned) = self.pinned_columns.borrow().as_ref() {
            return Ok(pinned.iter().map(|(n, m)| (n.clone(), m.share())).collect());
        }
        let indices = self.indices()?;
        self.parent
            .handles()
            .into_iter()
            .map(|(name, column)| Ok((name, MaskedColumn::mask(&column, Rc::clone(&indices))?)))
            .collect()
    }

    /// Create a full-length column on the parent and return the view's slice of it.
    pub fn add_column(&self, name: &str, dtype: DataType) -> TableResult<MaskedColumn> {
        let indices = self.indices()?;
        let column = self.parent.add_column(name, dtype)?;
        MaskedColumn::mask(&column, indices)
    }

    /// Write `source` into the view rows of `name`, creating the column on the parent first if
    /// needed. On failure a newly created column is removed again.
    pub fn set_column(&self, name: &str, source: impl Into<ColumnSource>) -> TableResult<()> {
        set_through(self.parent, &self.indices()?, name, source.into()).map(|_| ())
    }

    /// Remove a column from the parent; returns the view's rows of it.
    pub fn pop_column(&self, name: &str) -> TableResult<Column> {
        let indices = self.indices()?;
        let popped = self.parent.pop_column(name)?.take(&indices)?;

        let kept = self.pinned_columns.borrow().as_ref().map(|columns| {
            columns
                .iter()
                .filter(|(n, _)| n != name)
                .map(|(n, m)| (n.clone(), m.share()))
                .collect::<Vec<_>>()
        });
        if let Some(kept) = kept {
            self.pinned_columns.replace(Some(Rc::new(kept)));
        }
        Ok(popped)
    }

    /// Freeze the current rows into a [`StaticView`].
    pub fn snapshot(&self) -> TableResult<StaticView<'a>> {
        StaticView::new(self.parent, self.indices()?)
    }

    /// Run `f` with the rows computed once and pinned; the pin is released when `f` returns.
    pub fn cache_indices<R>(&self, f: impl FnOnce(&Self) -> TableResult<R>) -> TableResult<R> {
        let indices = self.indices()?;
        let _pin = Pin::new(&self.pinned_indices, indices);
        f(self)
    }

    /// Run `f` with the rows and the column masks pinned; repeated [`View::get_column`] calls
    /// return the same mask.
    pub fn cache_columns<R>(&self, f: impl FnOnce(&Self) -> TableResult<R>) -> TableResult<R> {
        self.cache_indices(|view| {
            let columns = view.columns()?;
            let _pin = Pin::new(&view.pinned_columns, Rc::new(columns));
            f(view)
        })
    }
}

impl TableLike for View<'_> {
    fn nrows(&self) -> TableResult<usize> {
        View::nrows(self)
    }

    fn colnames(&self) -> Vec<String> {
        View::colnames(self)
    }

    fn has_column(&self, name: &str) -> bool {
        View::has_column(self, name)
    }

    fn read_column(&self, name: &str) -> TableResult<Column> {
        Ok(self.get_column(name)?.to_column())
    }

    fn to_table(&self) -> TableResult<Table> {
        materialize(self.parent, &self.indices()?)
    }
}

impl GroupableView for View<'_> {
    fn grouping_source(&self) -> GroupSource<'_> {
        GroupSource::Lazy(self)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::column::Column;
    use crate::grid::ColumnSet;
    use crate::table::{Table, TableLike};
    use crate::types::{DataType, Value};

    fn table() -> Table {
        Table::new(ColumnSet::new().with("a", vec![1, 2, 3, 4])).unwrap()
    }

    #[test]
    fn predicate_length_must_match() {
        let t = table();
        let v = t.filter(|_| Ok(Column::from(vec![true])));
        assert!(v.indices().is_err());
    }

    #[test]
    fn cache_indices_evaluates_once() {
        let t = table();
        let calls = Cell::new(0);
        let v = t.filter(|t| {
            calls.set(calls.get() + 1);
            t.column("a")?.greater(2)
        });
        v.cache_indices(|v| {
            v.nrows()?;
            v.get_column("a")?;
            v.nrows()
        })
        .unwrap();
        assert_eq!(calls.get(), 1);
        v.nrows().unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_columns_returns_the_same_mask() {
        let t = table();
        let v = t.filter(|t| t.column("a")?.less(3));
        v.cache_columns(|v| {
            let first = v.get_column("a")?;
            let second = v.get_column("a")?;
            assert!(first.ptr_eq(&second));
            Ok(())
        })
        .unwrap();
        let a = v.get_column("a").unwrap();
        let b = v.get_column("a").unwrap();
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn add_column_lives_on_the_parent() {
        let t = table();
        let v = t.filter(|t| t.column("a")?.greater(2));
        let m = v.add_column("b", DataType::Int64).unwrap();
        m.fill(9).unwrap();
        assert_eq!(
            t.column("b").unwrap().to_vec(),
            vec![Value::Int64(0), Value::Int64(0), Value::Int64(9), Value::Int64(9)]
        );
    }

    #[test]
    fn zero_row_view_materializes_typed_columns() {
        let t = table();
        let v = t.filter(|t| t.column("a")?.greater(10));
        let out = v.to_table().unwrap();
        assert_eq!(out.row_count(), 0);
        assert_eq!(out.column("a").unwrap().dtype(), DataType::Int64);
    }
}
