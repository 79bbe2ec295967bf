//! JSON interchange for tables.
//!
//! A table is represented as an object mapping column names to arrays, one element per row.
//! Rows of a multi-dimensional column are nested arrays. On input, scalars are broadcast like any
//! other [`ColumnSource`](crate::grid::ColumnSource) scalar.
//!
//! `serde_json` objects are ordered by key, so column order does not survive a round trip.

use serde_json::{Map, Number, Value as JsonValue};

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::grid::{ColumnSet, ColumnSource};
use crate::table::Table;
use crate::types::Value;

/// Convert a JSON scalar into a cell value.
pub fn value_from_json(v: &JsonValue) -> TableResult<Value> {
    match v {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::String(s) => Ok(Value::Utf8(s.clone())),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int64(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float64(f))
            } else {
                Err(TableError::UnsupportedColumnSource {
                    message: format!("number {n} does not fit an int64 or float64"),
                })
            }
        }
        JsonValue::Array(_) | JsonValue::Object(_) => Err(TableError::UnsupportedColumnSource {
            message: format!("expected a json scalar, got {v}"),
        }),
    }
}

/// Convert a cell value into JSON. Non-finite floats become `null`.
pub fn value_to_json(v: &Value) -> JsonValue {
    match v {
        Value::Null => JsonValue::Null,
        Value::Int64(i) => JsonValue::from(*i),
        Value::Float64(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Utf8(s) => JsonValue::String(s.clone()),
    }
}

fn column_source(name: &str, v: &JsonValue) -> TableResult<ColumnSource> {
    let items = match v {
        JsonValue::Array(items) => items,
        JsonValue::Object(_) => {
            return Err(TableError::UnsupportedColumnSource {
                message: format!("column '{name}' is a json object"),
            });
        }
        scalar => return Ok(ColumnSource::Scalar(value_from_json(scalar)?)),
    };

    let nested: Vec<&Vec<JsonValue>> = items.iter().filter_map(JsonValue::as_array).collect();
    if !items.is_empty() && nested.len() == items.len() {
        let blocks = nested
            .into_iter()
            .map(|cells| cells.iter().map(value_from_json).collect())
            .collect::<TableResult<Vec<Vec<Value>>>>()?;
        let widths: Vec<usize> = blocks.iter().map(Vec::len).collect();
        if widths.windows(2).any(|w| w[0] != w[1]) {
            return Err(TableError::UnsupportedColumnSource {
                message: format!("rows of column '{name}' have different lengths {widths:?}"),
            });
        }
        return Ok(ColumnSource::Column(Column::from_rows(blocks)?));
    }

    let values = items
        .iter()
        .map(value_from_json)
        .collect::<TableResult<Vec<_>>>()
        .map_err(|e| match e {
            TableError::UnsupportedColumnSource { message } => TableError::UnsupportedColumnSource {
                message: format!("column '{name}': {message}"),
            },
            other => other,
        })?;
    Ok(ColumnSource::List(values))
}

/// Nest a row block according to the leading shape.
fn nest(block: &[Value], shape: &[usize]) -> JsonValue {
    let Some((&outer, inner)) = shape.split_first() else {
        return block.first().map_or(JsonValue::Null, value_to_json);
    };
    let width: usize = inner.iter().product();
    if width == 0 {
        return JsonValue::Array(vec![JsonValue::Array(Vec::new()); outer]);
    }
    JsonValue::Array(block.chunks(width).map(|chunk| nest(chunk, inner)).collect())
}

fn column_to_json(column: &Column) -> JsonValue {
    let shape = column.leading_shape();
    JsonValue::Array(column.iter_rows().map(|block| nest(block, shape)).collect())
}

impl Table {
    /// Build a table from a JSON object of columns.
    ///
    /// ```rust
    /// use rust_column_table::table::Table;
    ///
    /// let t = Table::from_json(&serde_json::json!({"a": [1, 2, 3], "b": "x"})).unwrap();
    /// assert_eq!(t.row_count(), 3);
    /// assert_eq!(t.column("b").unwrap().value(2).unwrap().as_str(), Some("x"));
    /// ```
    pub fn from_json(json: &JsonValue) -> TableResult<Table> {
        let JsonValue::Object(map) = json else {
            return Err(TableError::UnsupportedColumnSource {
                message: format!("expected a json object of columns, got {json}"),
            });
        };
        let mut set = ColumnSet::new();
        for (name, v) in map {
            set.insert(name.clone(), column_source(name, v)?);
        }
        Table::new(set)
    }

    /// Parse a JSON document and build a table from it.
    pub fn from_json_str(input: &str) -> TableResult<Table> {
        let json: JsonValue =
            serde_json::from_str(input).map_err(|e| TableError::UnsupportedColumnSource {
                message: format!("invalid json: {e}"),
            })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .columns()
            .iter()
            .map(|(name, column)| (name.clone(), column_to_json(column)))
            .collect();
        JsonValue::Object(map)
    }
}
