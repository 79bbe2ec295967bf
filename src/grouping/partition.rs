//! Hash partitioning of rows by key tuple.

use std::collections::HashMap;

use crate::column::Column;
use crate::types::Value;

/// Distinct key tuples in first-occurrence order, with the rows holding each.
#[derive(Debug, Clone, Default)]
pub(crate) struct Partition {
    keys: Vec<Vec<Value>>,
    members: Vec<Vec<usize>>,
    lookup: HashMap<Vec<Value>, usize>,
    slots: Vec<usize>,
}

impl Partition {
    /// Partition rows `0..tuples.len()` by equal tuples.
    pub(crate) fn build(tuples: Vec<Vec<Value>>) -> Self {
        let mut out = Partition {
            slots: Vec::with_capacity(tuples.len()),
            ..Partition::default()
        };
        for (row, tuple) in tuples.into_iter().enumerate() {
            let slot = match out.lookup.get(&tuple) {
                Some(&slot) => slot,
                None => {
                    let slot = out.keys.len();
                    out.lookup.insert(tuple.clone(), slot);
                    out.keys.push(tuple);
                    out.members.push(Vec::new());
                    slot
                }
            };
            out.members[slot].push(row);
            out.slots.push(slot);
        }
        out
    }

    /// Number of distinct keys.
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn key(&self, slot: usize) -> &[Value] {
        &self.keys[slot]
    }

    /// Rows holding the key at `slot`, ascending.
    pub(crate) fn members(&self, slot: usize) -> &[usize] {
        &self.members[slot]
    }

    pub(crate) fn slot_of(&self, row: usize) -> usize {
        self.slots[row]
    }

    pub(crate) fn find(&self, tuple: &[Value]) -> Option<usize> {
        self.lookup.get(tuple).copied()
    }
}

/// Per-row key tuples: the row blocks of each column, concatenated.
///
/// All columns must have the same number of rows.
pub(crate) fn key_tuples(columns: &[Column]) -> Vec<Vec<Value>> {
    let rows = columns.first().map_or(0, Column::len);
    (0..rows)
        .map(|i| {
            columns
                .iter()
                .flat_map(|c| c.row(i).unwrap_or_default().iter().cloned())
                .collect()
        })
        .collect()
}
