//! Hash group-by over tables and views.
//!
//! A [`Grouping`] is only a description (source + key columns or key callback); rows are
//! partitioned each time it is consumed. Distinct keys keep their first-occurrence order.
//!
//! - [`Grouping::groups`] / [`Grouping::each`] yield one [`Group`] (a [`StaticView`] plus its
//!   [`GroupKey`]) per distinct key.
//! - [`Grouping::apply`] runs a callback per group and stacks the results, with the key columns
//!   repeated once per produced row.
//! - [`Grouping::reduce`] runs a callback per source row against per-group accumulators.
//!
//! ```rust
//! use rust_column_table::grid::ColumnSet;
//! use rust_column_table::table::{GroupableView, Table};
//! use rust_column_table::types::Value;
//!
//! let t = Table::new(
//!     ColumnSet::new()
//!         .with("k", vec!["x", "y", "x"])
//!         .with("v", vec![1, 2, 3]),
//! )
//! .unwrap();
//! let out = t.group_by(&["k"]).apply(|g| g.get_column("v")?.sum()).unwrap();
//! assert_eq!(out.column("v_0").unwrap().to_vec(), vec![Value::Int64(4), Value::Int64(2)]);
//! ```

mod partition;
mod reduce;

pub(crate) use partition::{Partition, key_tuples};
pub use reduce::{Accumulator, ReduceRow};

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::grid::{ColumnSet, next_available_name};
use crate::masked::MaskedColumn;
use crate::stack::stack_column_sets;
use crate::table::{Table, TableLike};
use crate::types::Value;
use crate::view::{StaticView, View};

/// What grouping reads rows from.
#[derive(Debug, Clone, Copy)]
pub enum GroupSource<'a> {
    Table(&'a Table),
    Static(&'a StaticView<'a>),
    /// Rows are taken from the view's predicate once per consumption.
    Lazy(&'a View<'a>),
}

impl<'a> GroupSource<'a> {
    fn parent(&self) -> &'a Table {
        match *self {
            GroupSource::Table(t) => t,
            GroupSource::Static(v) => v.parent(),
            GroupSource::Lazy(v) => v.parent(),
        }
    }

    fn positions(&self) -> TableResult<Rc<[usize]>> {
        match *self {
            GroupSource::Table(t) => Ok((0..t.row_count()).collect()),
            GroupSource::Static(v) => Ok(v.indices().into()),
            GroupSource::Lazy(v) => v.indices(),
        }
    }

    fn as_table_like(&self) -> &(dyn TableLike + 'a) {
        match *self {
            GroupSource::Table(t) => t,
            GroupSource::Static(v) => v,
            GroupSource::Lazy(v) => v,
        }
    }
}

/// Options for [`Grouping::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOptions {
    /// Prefix of the generated value column name (`v_0`, `v_1`, ...).
    pub value_prefix: String,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            value_prefix: "v_".to_string(),
        }
    }
}

/// The value a group (or a key callback) produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Computed {
    /// One row.
    Scalar(Value),
    /// One row per element, under the generated value name.
    Column(Column),
    /// Named columns; scalars are broadcast.
    Columns(ColumnSet),
    /// Named columns of a table.
    Table(Table),
}

impl Computed {
    fn kind(&self) -> &'static str {
        match self {
            Computed::Scalar(_) => "a scalar",
            Computed::Column(_) => "an unnamed column",
            Computed::Columns(_) => "named columns",
            Computed::Table(_) => "a table",
        }
    }

    /// Row count and named columns; unnamed values are stored under `value_name`.
    fn into_frame(self, value_name: &str) -> TableResult<(usize, Vec<(String, Column)>)> {
        match self {
            Computed::Scalar(v) => {
                let column = Column::from_values(vec![v]);
                Ok((1, vec![(value_name.to_string(), column)]))
            }
            Computed::Column(c) => Ok((c.len(), vec![(value_name.to_string(), c)])),
            Computed::Columns(set) if set.is_empty() => Ok((0, Vec::new())),
            Computed::Columns(set) => {
                let uniform = set.ensure_uniform(None)?;
                Ok((uniform.nrows, uniform.columns))
            }
            Computed::Table(t) => Ok((t.row_count(), t.columns())),
        }
    }

    /// Named columns, for key callbacks.
    fn into_column_set(self) -> TableResult<ColumnSet> {
        match self {
            Computed::Columns(set) => Ok(set),
            Computed::Table(t) => Ok(t.columns().into_iter().collect()),
            other => Err(TableError::GroupKeyTypeError {
                message: format!("key callback must return named columns, got {}", other.kind()),
            }),
        }
    }
}

macro_rules! scalar_computed_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Computed {
                fn from(v: $t) -> Self {
                    Computed::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_computed_from!(Value, i64, i32, f64, bool, &str, String);

impl From<Column> for Computed {
    fn from(c: Column) -> Self {
        Computed::Column(c)
    }
}

impl From<MaskedColumn> for Computed {
    fn from(m: MaskedColumn) -> Self {
        Computed::Column(m.to_column())
    }
}

impl From<ColumnSet> for Computed {
    fn from(set: ColumnSet) -> Self {
        Computed::Columns(set)
    }
}

impl From<Table> for Computed {
    fn from(t: Table) -> Self {
        Computed::Table(t)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Computed {
    fn from(values: Vec<T>) -> Self {
        Computed::Column(Column::from_values(values.into_iter().map(Into::into).collect()))
    }
}

/// The key tuple shared by every row of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupKey {
    names: Rc<[String]>,
    widths: Rc<[usize]>,
    values: Vec<Value>,
}

impl GroupKey {
    /// Key column names, in key order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// All key components, concatenated in name order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The key's block for `name` (one value unless the key column is multi-dimensional).
    pub fn get(&self, name: &str) -> Option<&[Value]> {
        let pos = self.names.iter().position(|n| n == name)?;
        let start: usize = self.widths[..pos].iter().sum();
        self.values.get(start..start + self.widths[pos])
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(|block| block.first())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}=")?;
            match self.get(name) {
                Some([single]) => write!(f, "{single}")?,
                Some(block) => {
                    let parts: Vec<String> = block.iter().map(ToString::to_string).collect();
                    write!(f, "[{}]", parts.join(", "))?;
                }
                None => {}
            }
        }
        f.write_str(")")
    }
}

/// One group: a [`StaticView`] of its rows plus its key.
#[derive(Debug)]
pub struct Group<'a> {
    view: StaticView<'a>,
    key: GroupKey,
}

impl<'a> Group<'a> {
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn view(&self) -> &StaticView<'a> {
        &self.view
    }
}

impl<'a> Deref for Group<'a> {
    type Target = StaticView<'a>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

type KeyCallback<'a> = Box<dyn Fn(&dyn TableLike) -> TableResult<Computed> + 'a>;

enum KeySpec<'a> {
    Names(Vec<String>),
    Callback(KeyCallback<'a>),
}

/// Rows partitioned by key, ready to be turned into groups.
struct Resolved<'a> {
    parent: &'a Table,
    /// Parent row of each source row.
    positions: Rc<[usize]>,
    names: Rc<[String]>,
    widths: Rc<[usize]>,
    /// Key columns, one row per source row.
    keys: Vec<Column>,
    partition: Partition,
}

impl Resolved<'_> {
    fn key(&self, slot: usize) -> GroupKey {
        GroupKey {
            names: Rc::clone(&self.names),
            widths: Rc::clone(&self.widths),
            values: self.partition.key(slot).to_vec(),
        }
    }

    /// Key columns with one row per entry of `slots`.
    fn key_columns(&self, slots: &[usize]) -> TableResult<Vec<(String, Column)>> {
        let rows: Vec<usize> = slots
            .iter()
            .map(|&slot| self.partition.members(slot)[0])
            .collect();
        self.names
            .iter()
            .zip(&self.keys)
            .map(|(name, column)| Ok((name.clone(), column.take(&rows)?)))
            .collect()
    }
}

/// An unmaterialized group-by over a table or view.
pub struct Grouping<'a> {
    source: GroupSource<'a>,
    keys: KeySpec<'a>,
    options: GroupOptions,
}

impl fmt::Debug for Grouping<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = match &self.keys {
            KeySpec::Names(names) => format!("{names:?}"),
            KeySpec::Callback(_) => "<callback>".to_string(),
        };
        f.debug_struct("Grouping")
            .field("source", &self.source)
            .field("keys", &keys)
            .field("options", &self.options)
            .finish()
    }
}

impl<'a> Grouping<'a> {
    pub(crate) fn by_names(source: GroupSource<'a>, names: &[&str]) -> Self {
        Self {
            source,
            keys: KeySpec::Names(names.iter().map(|n| n.to_string()).collect()),
            options: GroupOptions::default(),
        }
    }

    pub(crate) fn by_callback(source: GroupSource<'a>, callback: KeyCallback<'a>) -> Self {
        Self {
            source,
            keys: KeySpec::Callback(callback),
            options: GroupOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GroupOptions) -> Self {
        self.options = options;
        self
    }

    fn resolve(&self) -> TableResult<Resolved<'a>> {
        let parent = self.source.parent();
        let positions = self.source.positions()?;

        let (names, keys): (Vec<String>, Vec<Column>) = match &self.keys {
            KeySpec::Names(names) => {
                let keys = names
                    .iter()
                    .map(|name| parent.column_ref(name)?.borrow().take(&positions))
                    .collect::<TableResult<Vec<_>>>()?;
                (names.clone(), keys)
            }
            KeySpec::Callback(callback) => {
                let computed = callback(self.source.as_table_like())?;
                let uniform = computed
                    .into_column_set()?
                    .ensure_uniform(Some(positions.len()))?;
                uniform.columns.into_iter().unzip()
            }
        };

        let partition = Partition::build(key_tuples(&keys));
        log::debug!(
            "grouped {} rows by {:?} into {} groups",
            positions.len(),
            names,
            partition.len()
        );

        Ok(Resolved {
            parent,
            positions,
            widths: keys.iter().map(Column::width).collect(),
            names: names.into(),
            keys,
            partition,
        })
    }

    fn make_groups(resolved: &Resolved<'a>) -> TableResult<Vec<Group<'a>>> {
        (0..resolved.partition.len())
            .map(|slot| {
                let indices: Vec<usize> = resolved
                    .partition
                    .members(slot)
                    .iter()
                    .map(|&row| resolved.positions[row])
                    .collect();
                Ok(Group {
                    view: StaticView::new(resolved.parent, indices)?,
                    key: resolved.key(slot),
                })
            })
            .collect()
    }

    /// Key columns only, all empty.
    fn empty_aggregation(resolved: &Resolved<'a>) -> TableResult<Table> {
        Table::from_columns(resolved.key_columns(&[])?)
    }

    /// Every group, in first-occurrence order of its key.
    ///
    /// Keys are computed and rows partitioned before anything is returned, so callers may mutate
    /// the parent while walking the groups.
    pub fn groups(&self) -> TableResult<Vec<Group<'a>>> {
        Self::make_groups(&self.resolve()?)
    }

    /// Call `f` once per group, in first-occurrence order; stops at the first error.
    pub fn each(&self, mut f: impl FnMut(&Group<'a>) -> TableResult<()>) -> TableResult<()> {
        for group in self.groups()? {
            f(&group)?;
        }
        Ok(())
    }

    /// Run `f` per group and stack the results into one table.
    ///
    /// A scalar contributes one row, a column one row per element (both stored under a
    /// generated `v_<n>` name), named columns or a table their own row count. The key columns
    /// come first and are repeated once per produced row. With no groups the result holds only
    /// the (empty) key columns.
    ///
    /// The generated name is the value prefix ([`GroupOptions::value_prefix`]) followed by one
    /// more than the highest numeric suffix found among both the key names and the parent's
    /// column names, so it never collides with a data column of the parent either.
    pub fn apply<C, F>(&self, mut f: F) -> TableResult<Table>
    where
        C: Into<Computed>,
        F: FnMut(&Group<'a>) -> TableResult<C>,
    {
        let resolved = self.resolve()?;
        if resolved.partition.is_empty() {
            return Self::empty_aggregation(&resolved);
        }

        let mut taken: Vec<String> = resolved.names.to_vec();
        taken.extend(resolved.parent.colnames());
        let value_name = next_available_name(&self.options.value_prefix, &taken);

        let groups = Self::make_groups(&resolved)?;
        let mut key_slots = Vec::new();
        let mut frames = Vec::with_capacity(groups.len());
        for (slot, group) in groups.iter().enumerate() {
            let computed: Computed = f(group)?.into();
            let (rows, columns) = computed.into_frame(&value_name)?;
            key_slots.extend(std::iter::repeat_n(slot, rows));
            frames.push(columns);
        }

        let mut columns = resolved.key_columns(&key_slots)?;
        for (name, column) in stack_column_sets(frames)? {
            match columns.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = column,
                None => columns.push((name, column)),
            }
        }
        Table::from_columns(columns)
    }
}
