//! Write-through row views over a shared column.
//!
//! A [`MaskedColumn`] pairs a non-owning handle to a parent column with an ordered list of parent
//! row positions. Reads behave like `parent.take(indices)`; writes are translated through the
//! index list and land in the parent. Derived values (arithmetic, `map`, `to_column`) are always
//! detached [`Column`]s.
//!
//! ```rust
//! use rust_column_table::column::Column;
//! use rust_column_table::masked::MaskedColumn;
//! use rust_column_table::types::Value;
//!
//! let col = Column::from(vec![0, 1, 2, 3]).into_shared();
//! let m = MaskedColumn::mask(&col, vec![1, 3]).unwrap();
//! m.set(0, 99).unwrap();
//! assert_eq!(
//!     col.borrow().to_vec(),
//!     vec![Value::Int64(0), Value::Int64(99), Value::Int64(2), Value::Int64(3)]
//! );
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::Rng;

use crate::column::{BinaryOp, Column, Operand, ReduceOp, RowSelector, SharedColumn, UnaryOp};
use crate::error::{TableError, TableResult};
use crate::grid::ColumnSource;
use crate::types::{DataType, Value};

/// An index-addressed, write-through view of a parent column.
///
/// The parent is held weakly: once the owning table drops or replaces the column, the mask keeps
/// working on its local copy as a detached column.
#[derive(Debug)]
pub struct MaskedColumn {
    parent: Option<Weak<RefCell<Column>>>,
    indices: Rc<[usize]>,
    local: Rc<RefCell<Column>>,
}

impl MaskedColumn {
    /// Mask `parent` at `indices` (ordered, repeats allowed).
    ///
    /// Every index must be a valid row of `parent`. An empty index list gives a valid, empty
    /// mask.
    pub fn mask(parent: &SharedColumn, indices: impl Into<Rc<[usize]>>) -> TableResult<Self> {
        let indices = indices.into();
        let local = parent.borrow().take(&indices)?;
        Ok(Self {
            parent: Some(Rc::downgrade(parent)),
            indices,
            local: Rc::new(RefCell::new(local)),
        })
    }

    /// A mask with no parent; writes only affect the local values.
    pub fn detached(column: Column) -> Self {
        let indices: Rc<[usize]> = (0..column.len()).collect();
        Self {
            parent: None,
            indices,
            local: Rc::new(RefCell::new(column)),
        }
    }

    /// A second handle to the same mask (same parent, indices and local values).
    pub(crate) fn share(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            indices: Rc::clone(&self.indices),
            local: Rc::clone(&self.local),
        }
    }

    /// Whether both handles refer to the same mask.
    pub fn ptr_eq(&self, other: &MaskedColumn) -> bool {
        Rc::ptr_eq(&self.local, &other.local)
    }

    /// Whether this mask still writes through to `column`.
    pub fn is_masking(&self, column: &SharedColumn) -> bool {
        self.parent_column()
            .is_some_and(|parent| Rc::ptr_eq(&parent, column))
    }

    /// Whether the parent column is still alive.
    pub fn has_parent(&self) -> bool {
        self.parent_column().is_some()
    }

    fn parent_column(&self) -> Option<SharedColumn> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Parent row positions, in view order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of masked rows.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Element type of the parent column.
    pub fn dtype(&self) -> DataType {
        self.local.borrow().dtype()
    }

    /// Full shape; the last entry is the number of masked rows.
    pub fn shape(&self) -> Vec<usize> {
        self.local.borrow().shape()
    }

    /// Detached copy of the current values.
    ///
    /// While the parent is alive the values are read from it, so direct writes to the parent are
    /// visible.
    pub fn to_column(&self) -> Column {
        if let Some(parent) = self.parent_column() {
            if let Ok(fresh) = parent.borrow().take(&self.indices) {
                *self.local.borrow_mut() = fresh.clone();
                return fresh;
            }
        }
        self.local.borrow().clone()
    }

    /// Current values as a flat vector.
    pub fn to_vec(&self) -> Vec<Value> {
        self.to_column().into_values()
    }

    /// Run `f` against the current values.
    pub fn read<R>(&self, f: impl FnOnce(&Column) -> R) -> R {
        f(&self.to_column())
    }

    /// First value of row `i` of the view.
    pub fn value(&self, i: usize) -> Option<Value> {
        self.to_column().value(i).cloned()
    }

    /// Rows of the view addressed by `selector`, detached.
    pub fn get(&self, selector: impl Into<RowSelector>) -> TableResult<Column> {
        self.to_column().get(selector)
    }

    /// Write `operand` into the view rows addressed by `selector`; the parent is updated at the
    /// translated positions.
    pub fn set<'o>(
        &self,
        selector: impl Into<RowSelector>,
        operand: impl Into<Operand<'o>>,
    ) -> TableResult<()> {
        let positions = selector.into().resolve(self.len())?;
        let operand = operand.into();

        let mut next = self.to_column();
        next.write_rows(&positions, &operand)?;

        if let Some(parent) = self.parent_column() {
            let absolute: Vec<usize> = positions.iter().map(|&p| self.indices[p]).collect();
            parent.borrow_mut().write_rows(&absolute, &operand)?;
        }
        *self.local.borrow_mut() = next;
        Ok(())
    }

    /// Replace every row from a column source; scalars are broadcast.
    pub fn assign(&self, source: &ColumnSource) -> TableResult<()> {
        self.mutate(|c| c.assign(source))
    }

    /// Set every masked row to `value`.
    pub fn fill(&self, value: impl Into<Value>) -> TableResult<()> {
        let value = value.into();
        self.mutate(|c| c.fill(value))
    }

    /// Fill the view with `0, 1, 2, ...` in view order.
    pub fn indgen(&self) -> TableResult<()> {
        self.mutate(Column::indgen)
    }

    /// Uniform random floats in `[0, max)`.
    pub fn fill_random<R: Rng + ?Sized>(&self, rng: &mut R, max: f64) -> TableResult<()> {
        self.mutate(|c| c.fill_random(rng, max))
    }

    pub fn map_in_place(&self, f: impl FnMut(&Value) -> Value) -> TableResult<()> {
        self.mutate(|c| c.map_in_place(f))
    }

    /// `self op= rhs`, written through to the parent.
    pub fn op_assign<'o>(&self, op: BinaryOp, rhs: impl Into<Operand<'o>>) -> TableResult<()> {
        let rhs = rhs.into();
        self.mutate(|c| c.op_assign(op, rhs))
    }

    /// Add one to every masked element.
    pub fn increment(&self) -> TableResult<()> {
        self.op_assign(BinaryOp::Add, 1)
    }

    pub fn decrement(&self) -> TableResult<()> {
        self.op_assign(BinaryOp::Sub, 1)
    }

    /// Mutate a local copy, write the whole result back to the parent, then keep it.
    fn mutate(&self, f: impl FnOnce(&mut Column) -> TableResult<()>) -> TableResult<()> {
        let mut next = self.to_column();
        f(&mut next)?;
        if let Some(parent) = self.parent_column() {
            parent
                .borrow_mut()
                .write_rows(&self.indices, &Operand::Column(&next))?;
        }
        *self.local.borrow_mut() = next;
        Ok(())
    }

    /// Detached elementwise map.
    pub fn map(&self, f: impl FnMut(&Value) -> Value) -> Column {
        self.to_column().map(f)
    }

    /// Detached elementwise binary operation.
    pub fn binary<'o>(&self, op: BinaryOp, rhs: impl Into<Operand<'o>>) -> TableResult<Column> {
        self.to_column().binary(op, rhs)
    }

    pub fn unary(&self, op: UnaryOp) -> TableResult<Column> {
        self.to_column().unary(op)
    }

    /// Reduce the masked rows, ignoring nulls.
    pub fn reduce(&self, op: ReduceOp) -> TableResult<Value> {
        self.to_column().reduce(op)
    }

    pub fn sum(&self) -> TableResult<Value> {
        self.reduce(ReduceOp::Sum)
    }

    pub fn min(&self) -> TableResult<Value> {
        self.reduce(ReduceOp::Min)
    }

    pub fn max(&self) -> TableResult<Value> {
        self.reduce(ReduceOp::Max)
    }

    pub fn mean(&self) -> TableResult<Value> {
        self.reduce(ReduceOp::Mean)
    }

    pub fn uniq(&self) -> Column {
        self.to_column().uniq()
    }
}

macro_rules! detached_binary {
    ($($name:ident => $op:expr),* $(,)?) => {
        impl MaskedColumn {
            $(
                /// Elementwise operation producing a detached column.
                pub fn $name<'o>(&self, rhs: impl Into<Operand<'o>>) -> TableResult<Column> {
                    self.binary($op, rhs)
                }
            )*
        }
    };
}

detached_binary! {
    add => BinaryOp::Add,
    sub => BinaryOp::Sub,
    mul => BinaryOp::Mul,
    div => BinaryOp::Div,
    equals => BinaryOp::Eq,
    less => BinaryOp::Lt,
    greater => BinaryOp::Gt,
}

impl PartialEq<Column> for MaskedColumn {
    fn eq(&self, other: &Column) -> bool {
        self.to_column() == *other
    }
}

impl From<&MaskedColumn> for ColumnSource {
    fn from(m: &MaskedColumn) -> Self {
        ColumnSource::Column(m.to_column())
    }
}

pub(crate) fn check_indices(indices: &[usize], len: usize) -> TableResult<()> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(TableError::IndexOutOfBounds { index, len }),
        None => Ok(()),
    }
}
