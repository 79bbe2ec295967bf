//! Typed, dense column vectors.
//!
//! A [`Column`] stores its values row by row: each row is a contiguous block whose size is the
//! product of the column's leading (non-row) dimensions. One-dimensional columns have no leading
//! dimensions and one value per row. The row axis is always the *last* dimension of
//! [`Column::shape`].
//!
//! Every operation in this module produces a fresh, detached column. Aliased writes into a
//! table's storage go through [`crate::masked::MaskedColumn`].

mod ops;
mod reduce;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::{Range, RangeFull};
use std::rc::Rc;

use rand::Rng;

use crate::error::{TableError, TableResult};
use crate::grid::ColumnSource;
use crate::types::{DataType, Value};

pub use ops::{BinaryOp, UnaryOp};
pub use reduce::ReduceOp;

/// A column shared between a table and the masked views over it.
pub type SharedColumn = Rc<RefCell<Column>>;

/// A typed, possibly multi-dimensional vector of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    dtype: DataType,
    /// Leading dimensions; the row axis is not included.
    shape: Vec<usize>,
    rows: usize,
    data: Vec<Value>,
}

/// Addresses a subset of rows (of a column, or of a view).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSelector {
    /// Every row.
    All,
    /// A single row.
    Index(usize),
    /// A contiguous range of rows.
    Range(Range<usize>),
    /// An explicit ordered list of rows; repeats are allowed.
    Indices(Vec<usize>),
    /// A boolean mask, one entry per row.
    Mask(Vec<bool>),
}

impl RowSelector {
    /// Resolve to explicit row positions for a vector of `len` rows.
    pub(crate) fn resolve(&self, len: usize) -> TableResult<Vec<usize>> {
        let check = |index: usize| {
            if index < len {
                Ok(index)
            } else {
                Err(TableError::IndexOutOfBounds { index, len })
            }
        };

        match self {
            RowSelector::All => Ok((0..len).collect()),
            RowSelector::Index(i) => Ok(vec![check(*i)?]),
            RowSelector::Range(r) => {
                if r.start < r.end && r.end > len {
                    return Err(TableError::IndexOutOfBounds {
                        index: r.end - 1,
                        len,
                    });
                }
                Ok(r.clone().collect())
            }
            RowSelector::Indices(ix) => ix.iter().map(|&i| check(i)).collect(),
            RowSelector::Mask(mask) => {
                if mask.len() != len {
                    return Err(TableError::ShapeMismatch {
                        lengths: vec![len, mask.len()],
                    });
                }
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, keep)| keep.then_some(i))
                    .collect())
            }
        }
    }
}

impl From<usize> for RowSelector {
    fn from(i: usize) -> Self {
        RowSelector::Index(i)
    }
}

impl From<Range<usize>> for RowSelector {
    fn from(r: Range<usize>) -> Self {
        RowSelector::Range(r)
    }
}

impl From<RangeFull> for RowSelector {
    fn from(_: RangeFull) -> Self {
        RowSelector::All
    }
}

impl From<Vec<usize>> for RowSelector {
    fn from(ix: Vec<usize>) -> Self {
        RowSelector::Indices(ix)
    }
}

impl From<&[usize]> for RowSelector {
    fn from(ix: &[usize]) -> Self {
        RowSelector::Indices(ix.to_vec())
    }
}

impl From<Vec<bool>> for RowSelector {
    fn from(mask: Vec<bool>) -> Self {
        RowSelector::Mask(mask)
    }
}

/// Right-hand side of an elementwise operation or assignment.
#[derive(Debug, Clone)]
pub enum Operand<'a> {
    /// Broadcast to every element.
    Scalar(Value),
    /// Paired position by position; shapes must agree.
    Column(&'a Column),
}

impl<'a> From<&'a Column> for Operand<'a> {
    fn from(c: &'a Column) -> Self {
        Operand::Column(c)
    }
}

impl From<Value> for Operand<'_> {
    fn from(v: Value) -> Self {
        Operand::Scalar(v)
    }
}

impl From<i64> for Operand<'_> {
    fn from(v: i64) -> Self {
        Operand::Scalar(Value::Int64(v))
    }
}

impl From<i32> for Operand<'_> {
    fn from(v: i32) -> Self {
        Operand::Scalar(Value::Int64(v as i64))
    }
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Scalar(Value::Float64(v))
    }
}

impl From<bool> for Operand<'_> {
    fn from(v: bool) -> Self {
        Operand::Scalar(Value::Bool(v))
    }
}

impl From<&str> for Operand<'_> {
    fn from(v: &str) -> Self {
        Operand::Scalar(Value::from(v))
    }
}

fn widen(dtype: DataType, value: Value) -> Value {
    match (dtype, value) {
        (DataType::Float64, Value::Int64(i)) => Value::Float64(i as f64),
        (_, v) => v,
    }
}

impl Column {
    /// Create a one-dimensional column of the given type.
    pub fn new(dtype: DataType, values: Vec<Value>) -> TableResult<Self> {
        let data = values
            .into_iter()
            .map(|v| dtype.coerce(v))
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self {
            dtype,
            shape: Vec::new(),
            rows: data.len(),
            data,
        })
    }

    /// Create a one-dimensional column, inferring its type from the values.
    pub fn from_values(values: Vec<Value>) -> Self {
        let dtype = DataType::infer(&values);
        let data: Vec<Value> = values.into_iter().map(|v| widen(dtype, v)).collect();
        Self {
            dtype,
            shape: Vec::new(),
            rows: data.len(),
            data,
        }
    }

    /// An empty one-dimensional column.
    pub fn empty(dtype: DataType) -> Self {
        Self {
            dtype,
            shape: Vec::new(),
            rows: 0,
            data: Vec::new(),
        }
    }

    /// A column of `rows` rows with leading dimensions `shape`, every element set to `value`.
    pub fn full(dtype: DataType, shape: &[usize], rows: usize, value: Value) -> TableResult<Self> {
        let value = dtype.coerce(value)?;
        let width: usize = shape.iter().product();
        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            rows,
            data: vec![value; width * rows],
        })
    }

    /// Build a column from per-row blocks; every block must hold `product(shape)` values.
    pub fn with_shape(
        dtype: DataType,
        shape: Vec<usize>,
        blocks: Vec<Vec<Value>>,
    ) -> TableResult<Self> {
        let width: usize = shape.iter().product();
        let rows = blocks.len();
        let mut data = Vec::with_capacity(width * rows);
        for block in blocks {
            if block.len() != width {
                return Err(TableError::DimensionMismatch {
                    expected: shape,
                    found: vec![block.len()],
                });
            }
            for v in block {
                data.push(dtype.coerce(v)?);
            }
        }
        Ok(Self {
            dtype,
            shape,
            rows,
            data,
        })
    }

    /// Build a two-dimensional column from equally sized row blocks, inferring the type.
    pub fn from_rows(blocks: Vec<Vec<Value>>) -> TableResult<Self> {
        let width = blocks.first().map_or(0, Vec::len);
        let dtype = DataType::infer(blocks.iter().flatten());
        Self::with_shape(dtype, vec![width], blocks)
    }

    /// Coerce a vector-like source into a column.
    ///
    /// Lists and ranges are materialized; an existing column is returned as is. Scalars are not
    /// columns and fail with [`TableError::UnsupportedColumnSource`].
    pub fn make(source: impl Into<ColumnSource>) -> TableResult<Self> {
        match source.into() {
            ColumnSource::Column(c) => Ok(c),
            ColumnSource::List(values) => Ok(Self::from_values(values)),
            ColumnSource::Range(r) => Ok(Self::from(r)),
            ColumnSource::Scalar(v) => Err(TableError::UnsupportedColumnSource {
                message: format!("expected a list, range or column, got scalar {v}"),
            }),
        }
    }

    /// Wrap the column for sharing with masked views.
    pub fn into_shared(self) -> SharedColumn {
        Rc::new(RefCell::new(self))
    }

    /// Element type.
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Full shape; the last entry is the row count.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.shape.clone();
        shape.push(self.rows);
        shape
    }

    /// Leading (non-row) dimensions.
    pub fn leading_shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions, counting the row axis.
    pub fn rank(&self) -> usize {
        self.shape.len() + 1
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of values in one row.
    pub fn width(&self) -> usize {
        self.shape.iter().product()
    }

    /// All values, row after row.
    pub fn values(&self) -> &[Value] {
        &self.data
    }

    /// Copy of all values, row after row.
    pub fn to_vec(&self) -> Vec<Value> {
        self.data.clone()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.data
    }

    /// The block of values making up row `i`.
    pub fn row(&self, i: usize) -> Option<&[Value]> {
        let w = self.width();
        (i < self.rows).then(|| &self.data[i * w..(i + 1) * w])
    }

    /// The first value of row `i`; for one-dimensional columns, the row's value.
    pub fn value(&self, i: usize) -> Option<&Value> {
        self.row(i).and_then(|block| block.first())
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        let w = self.width();
        (0..self.rows).map(move |i| &self.data[i * w..(i + 1) * w])
    }

    /// Rows addressed by `selector`, as a new column (leading dimensions preserved).
    pub fn get(&self, selector: impl Into<RowSelector>) -> TableResult<Column> {
        let positions = selector.into().resolve(self.rows)?;
        self.take(&positions)
    }

    /// Rows at `positions`, in order, as a new column.
    pub fn take(&self, positions: &[usize]) -> TableResult<Column> {
        let w = self.width();
        let mut data = Vec::with_capacity(w * positions.len());
        for &p in positions {
            if p >= self.rows {
                return Err(TableError::IndexOutOfBounds {
                    index: p,
                    len: self.rows,
                });
            }
            data.extend_from_slice(&self.data[p * w..(p + 1) * w]);
        }
        Ok(Self {
            dtype: self.dtype,
            shape: self.shape.clone(),
            rows: positions.len(),
            data,
        })
    }

    /// Like [`Column::take`], with `None` producing a row of nulls.
    pub fn take_optional(&self, positions: &[Option<usize>]) -> TableResult<Column> {
        let w = self.width();
        let mut data = Vec::with_capacity(w * positions.len());
        for p in positions {
            match *p {
                Some(p) if p < self.rows => data.extend_from_slice(&self.data[p * w..(p + 1) * w]),
                Some(p) => {
                    return Err(TableError::IndexOutOfBounds {
                        index: p,
                        len: self.rows,
                    });
                }
                None => data.extend(std::iter::repeat_n(Value::Null, w)),
            }
        }
        Ok(Self {
            dtype: self.dtype,
            shape: self.shape.clone(),
            rows: positions.len(),
            data,
        })
    }

    /// Positions of the rows whose value is true.
    ///
    /// Integers count as true when non-zero; nulls are false.
    pub fn where_true(&self) -> TableResult<Vec<usize>> {
        if !self.shape.is_empty() {
            return Err(TableError::DimensionMismatch {
                expected: Vec::new(),
                found: self.shape.clone(),
            });
        }
        let mut out = Vec::new();
        for (i, v) in self.data.iter().enumerate() {
            let keep = match v {
                Value::Bool(b) => *b,
                Value::Int64(n) => *n != 0,
                Value::Null => false,
                other => {
                    return Err(TableError::TypeMismatch {
                        expected: DataType::Bool,
                        found: other.type_name().to_string(),
                    });
                }
            };
            if keep {
                out.push(i);
            }
        }
        Ok(out)
    }

    /// Write `operand` into the rows addressed by `selector`.
    pub fn set<'o>(
        &mut self,
        selector: impl Into<RowSelector>,
        operand: impl Into<Operand<'o>>,
    ) -> TableResult<()> {
        let positions = selector.into().resolve(self.rows)?;
        self.write_rows(&positions, &operand.into())
    }

    /// Validate, then write. Nothing is modified when an error is returned.
    pub(crate) fn write_rows(
        &mut self,
        positions: &[usize],
        operand: &Operand<'_>,
    ) -> TableResult<()> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.rows) {
            return Err(TableError::IndexOutOfBounds {
                index: bad,
                len: self.rows,
            });
        }
        let w = self.width();

        match operand {
            Operand::Scalar(v) => {
                let v = self.dtype.coerce(v.clone())?;
                for &p in positions {
                    for slot in &mut self.data[p * w..(p + 1) * w] {
                        *slot = v.clone();
                    }
                }
            }
            Operand::Column(src) => {
                if positions.is_empty() && src.is_empty() {
                    return Ok(());
                }
                if src.rows != positions.len() {
                    return Err(TableError::ShapeMismatch {
                        lengths: vec![positions.len(), src.rows],
                    });
                }
                if src.shape != self.shape {
                    return Err(TableError::DimensionMismatch {
                        expected: self.shape.clone(),
                        found: src.shape.clone(),
                    });
                }
                let converted = src
                    .data
                    .iter()
                    .cloned()
                    .map(|v| self.dtype.coerce(v))
                    .collect::<TableResult<Vec<_>>>()?;
                for (k, &p) in positions.iter().enumerate() {
                    self.data[p * w..(p + 1) * w].clone_from_slice(&converted[k * w..(k + 1) * w]);
                }
            }
        }
        Ok(())
    }

    /// Replace every row from a column source; scalars are broadcast.
    pub fn assign(&mut self, source: &ColumnSource) -> TableResult<()> {
        let positions: Vec<usize> = (0..self.rows).collect();
        match source {
            ColumnSource::Scalar(v) => self.write_rows(&positions, &Operand::Scalar(v.clone())),
            other => {
                let column = Column::make(other.clone())?;
                self.write_rows(&positions, &Operand::Column(&column))
            }
        }
    }

    /// Set every element to `value`, coerced to the column type.
    pub fn fill(&mut self, value: impl Into<Value>) -> TableResult<()> {
        let value = self.dtype.coerce(value.into())?;
        self.data.iter_mut().for_each(|slot| *slot = value.clone());
        Ok(())
    }

    /// Fill with the flat element index `0, 1, 2, ...`.
    pub fn indgen(&mut self) -> TableResult<()> {
        let data = (0..self.data.len())
            .map(|i| self.dtype.coerce(Value::Int64(i as i64)))
            .collect::<TableResult<Vec<_>>>()?;
        self.data = data;
        Ok(())
    }

    /// Fill with uniform random values in `[0, max)`.
    ///
    /// Integer columns draw integers, float and untyped columns draw floats, boolean columns
    /// draw fair coin flips (`max` is ignored).
    pub fn fill_random<R: Rng + ?Sized>(&mut self, rng: &mut R, max: f64) -> TableResult<()> {
        let draw = |rng: &mut R| -> TableResult<Value> {
            match self.dtype {
                DataType::Int64 => {
                    let upper = max as i64;
                    if upper <= 0 {
                        return Err(TableError::Arithmetic {
                            message: format!("random upper bound must be positive, got {max}"),
                        });
                    }
                    Ok(Value::Int64(rng.gen_range(0..upper)))
                }
                DataType::Float64 | DataType::Object => {
                    Ok(Value::Float64(rng.r#gen::<f64>() * max))
                }
                DataType::Bool => Ok(Value::Bool(rng.r#gen::<bool>())),
                DataType::Utf8 => Err(TableError::InvalidOperation {
                    op: "random".to_string(),
                    lhs: "utf8".to_string(),
                    rhs: "float64".to_string(),
                }),
            }
        };
        let data = (0..self.data.len())
            .map(|_| draw(rng))
            .collect::<TableResult<Vec<_>>>()?;
        self.data = data;
        Ok(())
    }

    /// Detached elementwise map; the result type is inferred from the mapped values.
    pub fn map(&self, mut f: impl FnMut(&Value) -> Value) -> Column {
        let values: Vec<Value> = self.data.iter().map(&mut f).collect();
        let dtype = DataType::infer(&values);
        Column {
            dtype,
            shape: self.shape.clone(),
            rows: self.rows,
            data: values.into_iter().map(|v| widen(dtype, v)).collect(),
        }
    }

    /// Elementwise map in place; mapped values must fit the column type.
    pub fn map_in_place(&mut self, mut f: impl FnMut(&Value) -> Value) -> TableResult<()> {
        let data = self
            .data
            .iter()
            .map(|v| self.dtype.coerce(f(v)))
            .collect::<TableResult<Vec<_>>>()?;
        self.data = data;
        Ok(())
    }

    /// Copy of the column converted to `dtype`.
    pub fn cast(&self, dtype: DataType) -> TableResult<Column> {
        let data = self
            .data
            .iter()
            .cloned()
            .map(|v| dtype.coerce(v))
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Column {
            dtype,
            shape: self.shape.clone(),
            rows: self.rows,
            data,
        })
    }

    /// Concatenate columns along the row axis.
    ///
    /// Empty inputs are skipped; the remaining inputs must agree on every non-row dimension.
    /// The result type is the unification of the input types.
    pub fn stack(columns: &[&Column]) -> TableResult<Column> {
        let non_empty: Vec<&Column> = columns.iter().copied().filter(|c| !c.is_empty()).collect();

        match non_empty.as_slice() {
            [] => Ok(columns.first().map_or_else(
                || Column::empty(DataType::Object),
                |c| Column {
                    dtype: c.dtype,
                    shape: c.shape.clone(),
                    rows: 0,
                    data: Vec::new(),
                },
            )),
            [only] => Ok((*only).clone()),
            [first, rest @ ..] => {
                let mut dtype = first.dtype;
                for c in rest {
                    if c.shape != first.shape {
                        return Err(TableError::DimensionMismatch {
                            expected: first.shape.clone(),
                            found: c.shape.clone(),
                        });
                    }
                    dtype = dtype.unify(c.dtype);
                }

                let rows = non_empty.iter().map(|c| c.rows).sum();
                let mut data = Vec::with_capacity(rows * first.width());
                for c in &non_empty {
                    for v in &c.data {
                        data.push(dtype.coerce(v.clone())?);
                    }
                }
                Ok(Column {
                    dtype,
                    shape: first.shape.clone(),
                    rows,
                    data,
                })
            }
        }
    }

    /// Rows with duplicates removed, keeping first occurrences in order.
    pub fn uniq(&self) -> Column {
        let mut seen: HashSet<&[Value]> = HashSet::new();
        let mut data = Vec::new();
        let mut rows = 0;
        for block in self.iter_rows() {
            if seen.insert(block) {
                data.extend_from_slice(block);
                rows += 1;
            }
        }
        Column {
            dtype: self.dtype,
            shape: self.shape.clone(),
            rows,
            data,
        }
    }

    /// Lexicographic comparison of rows `a` and `b` using [`Value::total_cmp`].
    pub(crate) fn cmp_rows(&self, a: usize, b: usize) -> Ordering {
        let w = self.width();
        let lhs = &self.data[a * w..(a + 1) * w];
        let rhs = &self.data[b * w..(b + 1) * w];
        lhs.iter()
            .zip(rhs)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

macro_rules! typed_column_from {
    ($($t:ty => $dtype:expr),* $(,)?) => {
        $(
            impl From<Vec<$t>> for Column {
                fn from(values: Vec<$t>) -> Self {
                    let data: Vec<Value> = values.into_iter().map(Value::from).collect();
                    Column {
                        dtype: $dtype,
                        shape: Vec::new(),
                        rows: data.len(),
                        data,
                    }
                }
            }
        )*
    };
}

typed_column_from! {
    i64 => DataType::Int64,
    i32 => DataType::Int64,
    f64 => DataType::Float64,
    bool => DataType::Bool,
    &str => DataType::Utf8,
    String => DataType::Utf8,
}

impl From<Vec<Value>> for Column {
    fn from(values: Vec<Value>) -> Self {
        Column::from_values(values)
    }
}

impl From<Range<i64>> for Column {
    fn from(r: Range<i64>) -> Self {
        Column::from(r.collect::<Vec<i64>>())
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, RowSelector};
    use crate::error::TableError;
    use crate::types::{DataType, Value};

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Int64(v)).collect()
    }

    #[test]
    fn make_rejects_scalars() {
        let err = Column::make(5).unwrap_err();
        assert!(matches!(err, TableError::UnsupportedColumnSource { .. }));
        assert_eq!(Column::make(0..3).unwrap().to_vec(), ints(&[0, 1, 2]));
    }

    #[test]
    fn get_by_indices_range_and_mask() {
        let col = Column::from(vec![10, 20, 30, 40]);
        assert_eq!(col.get(vec![3, 0, 3]).unwrap().to_vec(), ints(&[40, 10, 40]));
        assert_eq!(col.get(1..3).unwrap().to_vec(), ints(&[20, 30]));
        assert_eq!(
            col.get(vec![true, false, false, true]).unwrap().to_vec(),
            ints(&[10, 40])
        );
        assert!(matches!(
            col.get(RowSelector::Index(4)),
            Err(TableError::IndexOutOfBounds { index: 4, len: 4 })
        ));
    }

    #[test]
    fn multi_dimensional_rows_keep_leading_shape() {
        let col = Column::from_rows(vec![ints(&[1, 2]), ints(&[3, 4]), ints(&[5, 6])]).unwrap();
        assert_eq!(col.shape(), vec![2, 3]);
        let picked = col.get(vec![2, 0]).unwrap();
        assert_eq!(picked.shape(), vec![2, 2]);
        assert_eq!(picked.to_vec(), ints(&[5, 6, 1, 2]));
    }

    #[test]
    fn stack_skips_empty_and_checks_dimensions() {
        let a = Column::from(vec![1, 2]);
        let b = Column::empty(DataType::Utf8);
        let c = Column::from(vec![3.5]);
        let out = Column::stack(&[&a, &b, &c]).unwrap();
        assert_eq!(out.dtype(), DataType::Float64);
        assert_eq!(
            out.to_vec(),
            vec![Value::Float64(1.0), Value::Float64(2.0), Value::Float64(3.5)]
        );

        let only = Column::stack(&[&b, &a]).unwrap();
        assert_eq!(only, a);

        let empty = Column::stack(&[&b]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.dtype(), DataType::Utf8);

        let wide = Column::from_rows(vec![ints(&[1, 2])]).unwrap();
        assert!(matches!(
            Column::stack(&[&a, &wide]),
            Err(TableError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn uniq_keeps_first_occurrence_order() {
        let col = Column::from(vec!["b", "a", "b", "c", "a"]);
        assert_eq!(
            col.uniq().to_vec(),
            vec![Value::from("b"), Value::from("a"), Value::from("c")]
        );
    }

    #[test]
    fn set_is_atomic_on_type_errors() {
        let mut col = Column::from(vec![1, 2, 3]);
        let bad = Column::from(vec![Value::Int64(9), Value::from("x")]);
        assert!(col.set(vec![0, 1], &bad).is_err());
        assert_eq!(col.to_vec(), ints(&[1, 2, 3]));

        col.set(vec![0, 2], 7).unwrap();
        assert_eq!(col.to_vec(), ints(&[7, 2, 7]));
    }

    #[test]
    fn take_optional_fills_nulls() {
        let col = Column::from(vec![1, 2]);
        let out = col.take_optional(&[Some(1), None, Some(0)]).unwrap();
        assert_eq!(out.to_vec(), vec![Value::Int64(2), Value::Null, Value::Int64(1)]);
        assert_eq!(out.dtype(), DataType::Int64);
    }

    #[test]
    fn where_true_lists_positions() {
        let mask = Column::from(vec![false, true, true]);
        assert_eq!(mask.where_true().unwrap(), vec![1, 2]);
    }
}
