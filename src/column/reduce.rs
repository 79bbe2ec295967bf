//! Whole-column reductions.

use crate::error::{TableError, TableResult};
use crate::types::{DataType, Value};

use super::Column;

/// Built-in reduction operations over every element of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum value, ignoring nulls.
    Min,
    /// Maximum value, ignoring nulls.
    Max,
    /// Arithmetic mean of numeric values, ignoring nulls.
    Mean,
}

impl Column {
    /// Reduce the column using a built-in [`ReduceOp`].
    ///
    /// - `Count` always returns `Value::Int64(len)`.
    /// - `Sum`/`Min`/`Max`/`Mean` return `Value::Null` if there are no non-null values.
    /// - `Sum`/`Mean` of non-numeric columns return `Value::Null`; `Min`/`Max` use
    ///   [`Value::total_cmp`] for any type.
    pub fn reduce(&self, op: ReduceOp) -> TableResult<Value> {
        if op == ReduceOp::Count {
            return Ok(Value::Int64(self.len() as i64));
        }

        let dtype = match self.dtype() {
            DataType::Object => DataType::infer(self.values()),
            other => other,
        };
        match dtype {
            DataType::Int64 => reduce_int(self.values(), op),
            DataType::Float64 => Ok(reduce_float(self.values(), op)),
            _ => Ok(reduce_ordered(self.values(), op)),
        }
    }

    pub fn count(&self) -> usize {
        self.len()
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
}

fn reduce_int(values: &[Value], op: ReduceOp) -> TableResult<Value> {
    let mut acc: Option<i64> = None;
    let mut n = 0usize;
    for v in values {
        let Some(v) = v.as_i64() else { continue };
        n += 1;
        acc = Some(match (op, acc) {
            (ReduceOp::Sum | ReduceOp::Mean, Some(a)) => {
                a.checked_add(v).ok_or_else(|| TableError::Arithmetic {
                    message: format!("sum overflows at {a} + {v}"),
                })?
            }
            (ReduceOp::Min, Some(a)) => a.min(v),
            (ReduceOp::Max, Some(a)) => a.max(v),
            (_, None) => v,
            (ReduceOp::Count, Some(a)) => a,
        });
    }
    Ok(match (op, acc) {
        (_, None) => Value::Null,
        (ReduceOp::Mean, Some(total)) => Value::Float64(total as f64 / n as f64),
        (_, Some(a)) => Value::Int64(a),
    })
}

fn reduce_float(values: &[Value], op: ReduceOp) -> Value {
    let mut acc: Option<f64> = None;
    let mut n = 0usize;
    for v in values {
        let Some(v) = v.as_f64() else { continue };
        n += 1;
        acc = Some(match (op, acc) {
            (ReduceOp::Sum | ReduceOp::Mean, Some(a)) => a + v,
            (ReduceOp::Min, Some(a)) => a.min(v),
            (ReduceOp::Max, Some(a)) => a.max(v),
            (_, None) => v,
            (ReduceOp::Count, Some(a)) => a,
        });
    }
    match (op, acc) {
        (_, None) => Value::Null,
        (ReduceOp::Mean, Some(total)) => Value::Float64(total / n as f64),
        (_, Some(a)) => Value::Float64(a),
    }
}

fn reduce_ordered(values: &[Value], op: ReduceOp) -> Value {
    let non_null = values.iter().filter(|v| !v.is_null());
    let picked = match op {
        ReduceOp::Min => non_null.min_by(|a, b| a.total_cmp(b)),
        ReduceOp::Max => non_null.max_by(|a, b| a.total_cmp(b)),
        _ => None,
    };
    picked.cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::ReduceOp;
    use crate::column::Column;
    use crate::types::Value;

    fn scores() -> Column {
        Column::from(vec![Value::Float64(10.0), Value::Null, Value::Float64(5.5)])
    }

    #[test]
    fn count_counts_rows_including_nulls() {
        assert_eq!(scores().reduce(ReduceOp::Count).unwrap(), Value::Int64(3));
    }

    #[test]
    fn sum_ignores_nulls_and_preserves_type() {
        assert_eq!(scores().sum().unwrap(), Value::Float64(15.5));
        assert_eq!(Column::from(vec![1, 2, 3]).sum().unwrap(), Value::Int64(6));
    }

    #[test]
    fn min_max_mean_ignore_nulls() {
        assert_eq!(scores().min().unwrap(), Value::Float64(5.5));
        assert_eq!(scores().max().unwrap(), Value::Float64(10.0));
        assert_eq!(Column::from(vec![1, 2]).mean().unwrap(), Value::Float64(1.5));
        assert_eq!(
            Column::from(vec!["b", "a"]).min().unwrap(),
            Value::from("a")
        );
    }

    #[test]
    fn all_null_reduces_to_null() {
        let col = Column::from(vec![Value::Null, Value::Null]);
        assert_eq!(col.sum().unwrap(), Value::Null);
        assert_eq!(col.max().unwrap(), Value::Null);
    }
}
