//! Single-pass, per-row aggregation for [`Grouping::reduce`].

use crate::column::{BinaryOp, Column};
use crate::error::{TableError, TableResult};
use crate::grid::ColumnSource;
use crate::table::{Row, Table};
use crate::types::Value;

use super::{Computed, GroupKey, Grouping};

/// One group's running value for a named accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Scalar(Value),
    /// Projected as one row of a two-dimensional column.
    Vector(Vec<Value>),
}

impl Accumulator {
    fn kind(&self) -> &'static str {
        match self {
            Accumulator::Scalar(_) => "scalar",
            Accumulator::Vector(_) => "vector",
        }
    }

    fn from_source(name: &str, source: ColumnSource) -> TableResult<Self> {
        match source {
            ColumnSource::Scalar(v) => Ok(Accumulator::Scalar(v)),
            ColumnSource::List(values) => Ok(Accumulator::Vector(values)),
            ColumnSource::Range(r) => Ok(Accumulator::Vector(r.map(Value::Int64).collect())),
            ColumnSource::Column(c) if c.rank() == 1 => Ok(Accumulator::Vector(c.into_values())),
            ColumnSource::Column(c) => Err(TableError::ConfigurationError {
                message: format!(
                    "default for `{name}` must be a scalar or a flat vector, got shape {:?}",
                    c.shape()
                ),
            }),
        }
    }
}

macro_rules! scalar_accumulator_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Accumulator {
                fn from(v: $t) -> Self {
                    Accumulator::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_accumulator_from!(Value, i64, i32, f64, bool, &str, String);

impl From<Vec<Value>> for Accumulator {
    fn from(values: Vec<Value>) -> Self {
        Accumulator::Vector(values)
    }
}

/// Named accumulators, one slot per group.
#[derive(Debug)]
struct Accumulators {
    names: Vec<String>,
    defaults: Vec<Accumulator>,
    slots: Vec<Vec<Accumulator>>,
    groups: usize,
}

impl Accumulators {
    fn new(defaults: Computed, groups: usize) -> TableResult<Self> {
        let set = match defaults {
            Computed::Columns(set) => set,
            other => {
                return Err(TableError::ConfigurationError {
                    message: format!(
                        "reduce defaults must map accumulator names to values, got {}",
                        other.kind()
                    ),
                });
            }
        };

        let mut out = Accumulators {
            names: Vec::new(),
            defaults: Vec::new(),
            slots: Vec::new(),
            groups,
        };
        for (name, source) in set {
            let default = Accumulator::from_source(&name, source)?;
            out.slots.push(vec![default.clone(); groups]);
            out.defaults.push(default);
            out.names.push(name);
        }
        Ok(out)
    }

    /// Position of `name`, creating it (defaulting to `0`) on first use.
    fn position(&mut self, name: &str) -> usize {
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            return pos;
        }
        let default = Accumulator::Scalar(Value::Int64(0));
        self.slots.push(vec![default.clone(); self.groups]);
        self.defaults.push(default);
        self.names.push(name.to_string());
        self.names.len() - 1
    }

    fn slot(&mut self, name: &str, group: usize) -> &mut Accumulator {
        let pos = self.position(name);
        &mut self.slots[pos][group]
    }

    fn project(self) -> TableResult<Vec<(String, Column)>> {
        self.names
            .into_iter()
            .zip(self.slots)
            .map(|(name, slots)| {
                let column = project_slots(&name, slots)?;
                Ok((name, column))
            })
            .collect()
    }
}

fn project_slots(name: &str, slots: Vec<Accumulator>) -> TableResult<Column> {
    let mut scalars = Vec::new();
    let mut vectors = Vec::new();
    for slot in slots {
        match slot {
            Accumulator::Scalar(v) => scalars.push(v),
            Accumulator::Vector(values) => vectors.push(values),
        }
    }

    match (scalars.is_empty(), vectors.is_empty()) {
        (_, true) => Ok(Column::from_values(scalars)),
        (true, false) => {
            let mut lengths: Vec<usize> = Vec::new();
            for v in &vectors {
                if !lengths.contains(&v.len()) {
                    lengths.push(v.len());
                }
            }
            if lengths.len() > 1 {
                return Err(TableError::ShapeMismatch { lengths });
            }
            Column::from_rows(vectors)
        }
        (false, false) => Err(TableError::ConfigurationError {
            message: format!("accumulator `{name}` mixes scalar and vector values across groups"),
        }),
    }
}

/// The evaluation context of one source row in [`Grouping::reduce`].
///
/// Exposes the row's values, its group key and its group's accumulators. Accumulators not named
/// in the defaults start at `Int64(0)` on first access.
pub struct ReduceRow<'r> {
    row: &'r Row,
    key: &'r GroupKey,
    group: usize,
    accumulators: &'r mut Accumulators,
}

impl ReduceRow<'_> {
    /// Parent row position.
    pub fn index(&self) -> usize {
        self.row.index()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.row.value(name)
    }

    /// The row's block for a multi-dimensional column.
    pub fn block(&self, name: &str) -> Option<&[Value]> {
        self.row.get(name)
    }

    /// Like [`ReduceRow::get`], failing on unknown names.
    pub fn value(&self, name: &str) -> TableResult<&Value> {
        self.get(name).ok_or_else(|| TableError::not_found(name))
    }

    pub fn key(&self) -> &GroupKey {
        self.key
    }

    pub fn acc(&mut self, name: &str) -> &Accumulator {
        self.accumulators.slot(name, self.group)
    }

    pub fn set_acc(&mut self, name: &str, value: impl Into<Accumulator>) {
        *self.accumulators.slot(name, self.group) = value.into();
    }

    /// `acc += value`; a vector accumulator adds `value` to every element.
    pub fn add(&mut self, name: &str, value: impl Into<Value>) -> TableResult<()> {
        let value = value.into();
        match self.accumulators.slot(name, self.group) {
            Accumulator::Scalar(acc) => *acc = BinaryOp::Add.apply(acc, &value)?,
            Accumulator::Vector(acc) => {
                for slot in acc.iter_mut() {
                    *slot = BinaryOp::Add.apply(slot, &value)?;
                }
            }
        }
        Ok(())
    }

    /// Elementwise `acc += block`; the lengths must match.
    pub fn add_block(&mut self, name: &str, block: &[Value]) -> TableResult<()> {
        match self.accumulators.slot(name, self.group) {
            Accumulator::Scalar(acc) => match block {
                [single] => *acc = BinaryOp::Add.apply(acc, single)?,
                _ => {
                    return Err(TableError::ShapeMismatch {
                        lengths: vec![1, block.len()],
                    });
                }
            },
            Accumulator::Vector(acc) => {
                if acc.len() != block.len() {
                    return Err(TableError::ShapeMismatch {
                        lengths: vec![acc.len(), block.len()],
                    });
                }
                let summed = acc
                    .iter()
                    .zip(block)
                    .map(|(a, b)| BinaryOp::Add.apply(a, b))
                    .collect::<TableResult<Vec<_>>>()?;
                *acc = summed;
            }
        }
        Ok(())
    }

    /// Append to a vector accumulator.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> TableResult<()> {
        self.extend(name, &[value.into()])
    }

    pub fn extend(&mut self, name: &str, values: &[Value]) -> TableResult<()> {
        match self.accumulators.slot(name, self.group) {
            Accumulator::Vector(acc) => {
                acc.extend_from_slice(values);
                Ok(())
            }
            scalar => Err(TableError::InvalidOperation {
                op: "push".to_string(),
                lhs: scalar.kind().to_string(),
                rhs: "vector".to_string(),
            }),
        }
    }
}

impl Grouping<'_> {
    /// Single pass over the source rows, in order, updating per-group accumulators.
    ///
    /// `defaults` must be named values ([`Computed::Columns`]); anything else fails with
    /// [`TableError::ConfigurationError`]. Every group starts from its own copy of each default.
    /// The result holds the key columns (first-occurrence order) followed by one column per
    /// accumulator: defaults first, then names first touched by `f`. Vector accumulators become
    /// two-dimensional columns and must end with equal lengths.
    ///
    /// ```rust
    /// use rust_column_table::grid::ColumnSet;
    /// use rust_column_table::table::{GroupableView, Table};
    /// use rust_column_table::types::Value;
    ///
    /// let t = Table::new(
    ///     ColumnSet::new()
    ///         .with("k", vec!["x", "y", "x"])
    ///         .with("v", vec![1, 2, 3]),
    /// )
    /// .unwrap();
    /// let out = t
    ///     .group_by(&["k"])
    ///     .reduce(ColumnSet::new().with("total", 0), |row| {
    ///         let v = row.value("v")?.clone();
    ///         row.add("total", v)
    ///     })
    ///     .unwrap();
    /// assert_eq!(out.column("total").unwrap().to_vec(), vec![Value::Int64(4), Value::Int64(2)]);
    /// ```
    pub fn reduce<F>(&self, defaults: impl Into<Computed>, mut f: F) -> TableResult<Table>
    where
        F: FnMut(&mut ReduceRow<'_>) -> TableResult<()>,
    {
        let defaults = defaults.into();
        let resolved = self.resolve()?;
        let mut accumulators = Accumulators::new(defaults, resolved.partition.len())?;
        if resolved.partition.is_empty() {
            return Self::empty_aggregation(&resolved);
        }

        let rows = resolved.parent.rows_at(&resolved.positions)?;
        let keys: Vec<GroupKey> = (0..resolved.partition.len())
            .map(|slot| resolved.key(slot))
            .collect();

        for (pos, row) in rows.iter().enumerate() {
            let group = resolved.partition.slot_of(pos);
            let mut context = ReduceRow {
                row,
                key: &keys[group],
                group,
                accumulators: &mut accumulators,
            };
            f(&mut context)?;
        }

        let slots: Vec<usize> = (0..resolved.partition.len()).collect();
        let mut columns = resolved.key_columns(&slots)?;
        for (name, column) in accumulators.project()? {
            match columns.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = column,
                None => columns.push((name, column)),
            }
        }
        Table::from_columns(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::Accumulator;
    use crate::column::Column;
    use crate::error::TableError;
    use crate::grid::ColumnSet;
    use crate::table::{GroupableView, Table};
    use crate::types::Value;

    fn table() -> Table {
        Table::new(
            ColumnSet::new()
                .with("k", vec!["a", "b", "a", "a"])
                .with("v", vec![1.0, 2.0, 3.0, 4.0]),
        )
        .unwrap()
    }

    #[test]
    fn running_sums_per_group() {
        let out = table()
            .group_by(&["k"])
            .reduce(ColumnSet::new().with("sum", 0.0), |row| {
                let v = row.value("v")?.clone();
                row.add("sum", v)?;
                row.add("n", 1)
            })
            .unwrap();
        assert_eq!(out.colnames(), vec!["k", "sum", "n"]);
        assert_eq!(out.column("sum").unwrap(), Column::from(vec![8.0, 2.0]));
        assert_eq!(out.column("n").unwrap(), Column::from(vec![3, 1]));
    }

    #[test]
    fn defaults_must_be_named() {
        let err = table().group_by(&["k"]).reduce(0, |_| Ok(())).unwrap_err();
        assert!(matches!(err, TableError::ConfigurationError { .. }));
    }

    #[test]
    fn vector_accumulators_project_to_two_dimensions() {
        let out = table()
            .group_by(&["k"])
            .reduce(ColumnSet::new().with("minmax", vec![Value::Null, Value::Null]), |row| {
                let v = row.value("v")?.clone();
                let next = match row.acc("minmax") {
                    Accumulator::Vector(mm) => match (&mm[0], &mm[1]) {
                        (Value::Null, _) => vec![v.clone(), v],
                        (lo, hi) => vec![
                            if v.total_cmp(lo).is_lt() { v.clone() } else { lo.clone() },
                            if v.total_cmp(hi).is_gt() { v } else { hi.clone() },
                        ],
                    },
                    Accumulator::Scalar(_) => unreachable!(),
                };
                row.set_acc("minmax", next);
                Ok(())
            })
            .unwrap();
        let minmax = out.column("minmax").unwrap();
        assert_eq!(minmax.shape(), vec![2, 2]);
        assert_eq!(
            minmax.to_vec(),
            vec![
                Value::Float64(1.0),
                Value::Float64(4.0),
                Value::Float64(2.0),
                Value::Float64(2.0)
            ]
        );
    }

    #[test]
    fn uneven_vectors_fail_projection() {
        let err = table()
            .group_by(&["k"])
            .reduce(ColumnSet::new().with("seen", Vec::<Value>::new()), |row| {
                let v = row.value("v")?.clone();
                row.push("seen", v)
            })
            .unwrap_err();
        assert_eq!(err, TableError::ShapeMismatch { lengths: vec![3, 1] });
    }

    #[test]
    fn groups_do_not_share_default_vectors() {
        let out = table()
            .group_by(&["k"])
            .reduce(ColumnSet::new().with("acc", vec![Value::Int64(0)]), |row| {
                row.add_block("acc", &[Value::Int64(1)])
            })
            .unwrap();
        assert_eq!(
            out.column("acc").unwrap().to_vec(),
            vec![Value::Int64(3), Value::Int64(1)]
        );
    }

    #[test]
    fn empty_source_yields_key_columns_only() {
        let t = Table::new(ColumnSet::new().with("k", Vec::<i64>::new())).unwrap();
        let out = t
            .group_by(&["k"])
            .reduce(ColumnSet::new().with("n", 0), |row| row.add("n", 1))
            .unwrap();
        assert_eq!(out.colnames(), vec!["k"]);
    }
}
