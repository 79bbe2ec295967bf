use std::cell::RefCell;
use std::rc::Rc;

use crate::column::Column;
use crate::error::TableResult;
use crate::grid::ColumnSource;
use crate::grouping::GroupSource;
use crate::masked::{MaskedColumn, check_indices};
use crate::table::{GroupableView, Table, TableLike};
use crate::types::DataType;

use super::{materialize, set_through};

/// A view over a fixed list of parent rows.
///
/// Column masks are built on first access and cached; asking for the same column again returns
/// the same [`MaskedColumn`] (see [`MaskedColumn::ptr_eq`]) until the parent replaces that
/// column.
#[derive(Debug)]
pub struct StaticView<'a> {
    parent: &'a Table,
    indices: Rc<[usize]>,
    cache: RefCell<Vec<(String, MaskedColumn)>>,
}

impl<'a> StaticView<'a> {
    /// Every index must be a row of `parent`.
    pub fn new(parent: &'a Table, indices: impl Into<Rc<[usize]>>) -> TableResult<Self> {
        let indices = indices.into();
        check_indices(&indices, parent.row_count())?;
        Ok(Self {
            parent,
            indices,
            cache: RefCell::new(Vec::new()),
        })
    }

    pub fn parent(&self) -> &'a Table {
        self.parent
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn nrows(&self) -> usize {
        self.indices.len()
    }

    pub fn colnames(&self) -> Vec<String> {
        self.parent.colnames()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.parent.has_column(name)
    }

    pub fn get_column(&self, name: &str) -> TableResult<MaskedColumn> {
        let column = self.parent.column_ref(name)?;
        let mut cache = self.cache.borrow_mut();
        if let Some((_, mask)) = cache.iter().find(|(n, _)| n == name) {
            if mask.is_masking(&column) {
                return Ok(mask.share());
            }
        }

        let mask = MaskedColumn::mask(&column, Rc::clone(&self.indices))?;
        let handle = mask.share();
        cache.retain(|(n, _)| n != name);
        cache.push((name.to_string(), mask));
        Ok(handle)
    }

    pub fn columns(&self) -> TableResult<Vec<(String, MaskedColumn)>> {
        self.parent
            .colnames()
            .into_iter()
            .map(|name| {
                let mask = self.get_column(&name)?;
                Ok((name, mask))
            })
            .collect()
    }

    /// Create a full-length column on the parent and return the view's slice of it.
    pub fn add_column(&self, name: &str, dtype: DataType) -> TableResult<MaskedColumn> {
        self.parent.add_column(name, dtype)?;
        self.get_column(name)
    }

    /// Write `source` into the view rows of `name`, creating the column on the parent first if
    /// needed. On failure a newly created column is removed again.
    pub fn set_column(&self, name: &str, source: impl Into<ColumnSource>) -> TableResult<()> {
        let mask = set_through(self.parent, &self.indices, name, source.into())?;
        let mut cache = self.cache.borrow_mut();
        cache.retain(|(n, _)| n != name);
        cache.push((name.to_string(), mask));
        Ok(())
    }

    /// Remove a column from the parent; returns the view's rows of it.
    pub fn pop_column(&self, name: &str) -> TableResult<Column> {
        let popped = self.parent.pop_column(name)?;
        self.cache.borrow_mut().retain(|(n, _)| n != name);
        popped.take(&self.indices)
    }
}

impl TableLike for StaticView<'_> {
    fn nrows(&self) -> TableResult<usize> {
        Ok(StaticView::nrows(self))
    }

    fn colnames(&self) -> Vec<String> {
        StaticView::colnames(self)
    }

    fn has_column(&self, name: &str) -> bool {
        StaticView::has_column(self, name)
    }

    fn read_column(&self, name: &str) -> TableResult<Column> {
        Ok(self.get_column(name)?.to_column())
    }

    fn to_table(&self) -> TableResult<Table> {
        materialize(self.parent, &self.indices)
    }
}

impl GroupableView for StaticView<'_> {
    fn grouping_source(&self) -> GroupSource<'_> {
        GroupSource::Static(self)
    }
}
