//! Core cell model: logical column types and scalar values.
//!
//! A [`Column`](crate::column::Column) is a dense vector of [`Value`]s tagged with one
//! [`DataType`]. `Null` may appear in a column of any type; it is what joins produce for rows
//! without a match.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};

/// Logical data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Untyped column; holds any mix of values.
    Object,
}

impl DataType {
    /// The value used to fill rows of a freshly created column.
    pub fn default_value(self) -> Value {
        match self {
            DataType::Int64 => Value::Int64(0),
            DataType::Float64 => Value::Float64(0.0),
            DataType::Bool => Value::Bool(false),
            DataType::Utf8 => Value::Utf8(String::new()),
            DataType::Object => Value::Null,
        }
    }

    /// The narrowest type able to hold values of both `self` and `other`.
    pub fn unify(self, other: DataType) -> DataType {
        match (self, other) {
            (a, b) if a == b => a,
            (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
                DataType::Float64
            }
            _ => DataType::Object,
        }
    }

    /// Convert `value` so it can be stored in a column of this type.
    pub fn coerce(self, value: Value) -> TableResult<Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (DataType::Object, v) => Ok(v),
            (DataType::Int64, v @ Value::Int64(_)) => Ok(v),
            (DataType::Float64, v @ Value::Float64(_)) => Ok(v),
            (DataType::Float64, Value::Int64(i)) => Ok(Value::Float64(i as f64)),
            (DataType::Bool, v @ Value::Bool(_)) => Ok(v),
            (DataType::Utf8, v @ Value::Utf8(_)) => Ok(v),
            (expected, v) => Err(TableError::TypeMismatch {
                expected,
                found: v.type_name().to_string(),
            }),
        }
    }

    /// Infer the column type for a list of values.
    ///
    /// Nulls are ignored; an all-null (or empty) list is `Object`.
    pub fn infer<'v>(values: impl IntoIterator<Item = &'v Value>) -> DataType {
        let mut out: Option<DataType> = None;
        for v in values {
            let Some(t) = v.data_type() else { continue };
            out = Some(match out {
                None => t,
                Some(prev) => prev.unify(t),
            });
            if out == Some(DataType::Object) {
                break;
            }
        }
        out.unwrap_or(DataType::Object)
    }
}

/// A single cell value.
///
/// Equality and hashing are structural: floats compare by value with NaN equal to itself, so
/// values can be used directly as grouping and join keys. Values of different variants are never
/// equal (`Int64(1) != Float64(1.0)`).
#[derive(Debug, Clone)]
pub enum Value {
    /// Missing value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// The type of this value, or `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Bool(_) => Some(DataType::Bool),
            Value::Utf8(_) => Some(DataType::Utf8),
        }
    }

    /// Short lowercase name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::Bool(_) => "bool",
            Value::Utf8(_) => "utf8",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Total order used for sorting.
    ///
    /// `Null` sorts first, then booleans, then numbers (integers and floats compared
    /// numerically, NaN last), then strings.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int64(_) | Value::Float64(_) => 2,
                Value::Utf8(_) => 3,
            }
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (Value::Int64(a), Value::Float64(b)) => OrderedFloat(*a as f64)
                .cmp(&OrderedFloat(*b))
                .then(Ordering::Less),
            (Value::Float64(a), Value::Int64(b)) => OrderedFloat(*a)
                .cmp(&OrderedFloat(*b as f64))
                .then(Ordering::Greater),
            (Value::Utf8(a), Value::Utf8(b)) => a.cmp(b),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Utf8(a), Value::Utf8(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Int64(v) => v.hash(state),
            Value::Float64(v) => OrderedFloat(*v).hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Utf8(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
