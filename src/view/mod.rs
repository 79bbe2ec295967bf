//! Row-filtered views over a [`Table`].
//!
//! - [`View`] re-evaluates its predicate whenever it needs its rows, so it always reflects the
//!   current state of the table. [`View::cache_indices`] and [`View::cache_columns`] pin the rows
//!   (and the masked columns) for the duration of a closure.
//! - [`StaticView`] fixes its rows at construction and caches one [`MaskedColumn`] per column.
//!
//! Both expose columns as [`MaskedColumn`]s, so writes land in the parent table. Columns created
//! through a view are created on the parent at full length, with the type's default value outside
//! the view's rows.

mod lazy;
mod scope;
mod static_view;

pub use lazy::View;
pub use static_view::StaticView;

use std::rc::Rc;

use crate::column::Column;
use crate::error::TableResult;
use crate::grid::ColumnSource;
use crate::masked::MaskedColumn;
use crate::table::Table;

/// Write `source` into the view rows of `name`, creating the column on the parent if needed.
///
/// A column created here is removed again when the write fails.
pub(crate) fn set_through(
    parent: &Table,
    indices: &Rc<[usize]>,
    name: &str,
    source: ColumnSource,
) -> TableResult<MaskedColumn> {
    let created = !parent.has_column(name);
    let shared = if created {
        let (dtype, shape) = source.layout();
        parent.add_column_shaped(name, dtype, &shape)?
    } else {
        parent.column_ref(name)?
    };

    let written = MaskedColumn::mask(&shared, Rc::clone(indices)).and_then(|mask| {
        mask.assign(&source)?;
        Ok(mask)
    });
    if written.is_err() && created {
        parent.pop_column(name)?;
    }
    written
}

/// Materialize the view rows of every parent column into a new table.
pub(crate) fn materialize(parent: &Table, indices: &[usize]) -> TableResult<Table> {
    let columns = parent
        .handles()
        .into_iter()
        .map(|(name, column)| {
            let taken: Column = column.borrow().take(indices)?;
            Ok((name, taken))
        })
        .collect::<TableResult<Vec<_>>>()?;
    Ok(Table::from_parts(columns))
}
