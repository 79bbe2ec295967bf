//! Elementwise operators.
//!
//! Operators never alias: the result is always a new column, whether the operands are plain
//! columns or snapshots taken from a masked view. `Null` propagates through every operator.

use std::fmt;

use crate::error::{TableError, TableResult};
use crate::types::{DataType, Value};

use super::{Column, Operand};

/// Binary elementwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`; also concatenates strings.
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// Integer division truncates toward zero.
    Div,
    /// Remainder with the sign of the dividend.
    Rem,
    /// Integer exponents must fit in `u32`.
    Pow,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Bitwise on integers, logical on booleans.
    BitAnd,
    /// Bitwise on integers, logical on booleans.
    BitOr,
    /// Bitwise on integers, logical on booleans.
    BitXor,
}

/// Unary elementwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not on booleans, bitwise not on integers.
    Not,
    /// Absolute value.
    Abs,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        };
        f.write_str(s)
    }
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Column type of `lhs op rhs`.
    fn result_type(self, lhs: DataType, rhs: DataType) -> DataType {
        use DataType::*;
        if self.is_comparison() {
            return Bool;
        }
        match (self, lhs, rhs) {
            (_, Object, _) | (_, _, Object) => Object,
            (BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor, Bool, Bool) => Bool,
            (_, Int64, Int64) => Int64,
            (_, Int64 | Float64, Int64 | Float64) => Float64,
            (BinaryOp::Add, Utf8, Utf8) => Utf8,
            _ => Object,
        }
    }

    fn invalid(self, lhs: &Value, rhs: &Value) -> TableError {
        TableError::InvalidOperation {
            op: self.to_string(),
            lhs: lhs.type_name().to_string(),
            rhs: rhs.type_name().to_string(),
        }
    }

    /// Apply the operator to two values.
    pub fn apply(self, lhs: &Value, rhs: &Value) -> TableResult<Value> {
        use std::cmp::Ordering;

        if lhs.is_null() || rhs.is_null() {
            return Ok(Value::Null);
        }

        if self.is_comparison() {
            let ord = match (lhs, rhs) {
                (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
                (Value::Utf8(a), Value::Utf8(b)) => Some(a.cmp(b)),
                (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
                (a, b) => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x.partial_cmp(&y),
                    _ if matches!(self, BinaryOp::Eq | BinaryOp::Ne) => {
                        // Different, non-numeric variants are simply unequal.
                        Some(Ordering::Less)
                    }
                    _ => return Err(self.invalid(lhs, rhs)),
                },
            };
            let out = match (self, ord) {
                (_, None) => self == BinaryOp::Ne,
                (BinaryOp::Eq, Some(o)) => o == Ordering::Equal,
                (BinaryOp::Ne, Some(o)) => o != Ordering::Equal,
                (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
                (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
                (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
                (BinaryOp::Ge, Some(o)) => o != Ordering::Less,
                (_, Some(_)) => false,
            };
            return Ok(Value::Bool(out));
        }

        match (lhs, rhs) {
            (Value::Int64(a), Value::Int64(b)) => self.apply_int(*a, *b).map(Value::Int64),
            (Value::Bool(a), Value::Bool(b)) => match self {
                BinaryOp::BitAnd => Ok(Value::Bool(a & b)),
                BinaryOp::BitOr => Ok(Value::Bool(a | b)),
                BinaryOp::BitXor => Ok(Value::Bool(a ^ b)),
                _ => Err(self.invalid(lhs, rhs)),
            },
            (Value::Utf8(a), Value::Utf8(b)) if self == BinaryOp::Add => {
                Ok(Value::Utf8(format!("{a}{b}")))
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => self
                    .apply_float(x, y)
                    .map(Value::Float64)
                    .ok_or_else(|| self.invalid(lhs, rhs)),
                _ => Err(self.invalid(lhs, rhs)),
            },
        }
    }

    fn apply_int(self, a: i64, b: i64) -> TableResult<i64> {
        let overflow = || TableError::Arithmetic {
            message: format!("{a} {self} {b} overflows or divides by zero"),
        };
        match self {
            BinaryOp::Add => a.checked_add(b).ok_or_else(overflow),
            BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow),
            BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow),
            BinaryOp::Div => a.checked_div(b).ok_or_else(overflow),
            BinaryOp::Rem => a.checked_rem(b).ok_or_else(overflow),
            BinaryOp::Pow => {
                let exp = u32::try_from(b).map_err(|_| TableError::Arithmetic {
                    message: format!("integer exponent {b} out of range"),
                })?;
                a.checked_pow(exp).ok_or_else(overflow)
            }
            BinaryOp::BitAnd => Ok(a & b),
            BinaryOp::BitOr => Ok(a | b),
            BinaryOp::BitXor => Ok(a ^ b),
            _ => Err(self.invalid(&Value::Int64(a), &Value::Int64(b))),
        }
    }

    fn apply_float(self, a: f64, b: f64) -> Option<f64> {
        match self {
            BinaryOp::Add => Some(a + b),
            BinaryOp::Sub => Some(a - b),
            BinaryOp::Mul => Some(a * b),
            BinaryOp::Div => Some(a / b),
            BinaryOp::Rem => Some(a % b),
            BinaryOp::Pow => Some(a.powf(b)),
            _ => None,
        }
    }
}

impl UnaryOp {
    pub fn apply(self, v: &Value) -> TableResult<Value> {
        let invalid = || TableError::InvalidOperation {
            op: format!("{self:?}").to_lowercase(),
            lhs: v.type_name().to_string(),
            rhs: "none".to_string(),
        };
        match (self, v) {
            (_, Value::Null) => Ok(Value::Null),
            (UnaryOp::Neg, Value::Int64(i)) => i.checked_neg().map(Value::Int64).ok_or_else(|| {
                TableError::Arithmetic {
                    message: format!("-({i}) overflows"),
                }
            }),
            (UnaryOp::Neg, Value::Float64(f)) => Ok(Value::Float64(-f)),
            (UnaryOp::Abs, Value::Int64(i)) => i.checked_abs().map(Value::Int64).ok_or_else(|| {
                TableError::Arithmetic {
                    message: format!("|{i}| overflows"),
                }
            }),
            (UnaryOp::Abs, Value::Float64(f)) => Ok(Value::Float64(f.abs())),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Not, Value::Int64(i)) => Ok(Value::Int64(!i)),
            _ => Err(invalid()),
        }
    }
}

impl Column {
    /// Elementwise `self op rhs` as a new column.
    ///
    /// A column operand must have exactly the same shape; a scalar is broadcast.
    pub fn binary<'o>(&self, op: BinaryOp, rhs: impl Into<Operand<'o>>) -> TableResult<Column> {
        let rhs = rhs.into();
        let (rhs_type, data) = match &rhs {
            Operand::Scalar(s) => {
                let data = self
                    .data
                    .iter()
                    .map(|v| op.apply(v, s))
                    .collect::<TableResult<Vec<_>>>()?;
                (s.data_type().unwrap_or(self.dtype), data)
            }
            Operand::Column(other) => {
                if other.rows != self.rows {
                    return Err(TableError::ShapeMismatch {
                        lengths: vec![self.rows, other.rows],
                    });
                }
                if other.shape != self.shape {
                    return Err(TableError::DimensionMismatch {
                        expected: self.shape.clone(),
                        found: other.shape.clone(),
                    });
                }
                let data = self
                    .data
                    .iter()
                    .zip(&other.data)
                    .map(|(a, b)| op.apply(a, b))
                    .collect::<TableResult<Vec<_>>>()?;
                (other.dtype, data)
            }
        };

        Ok(self.derived(op.result_type(self.dtype, rhs_type), data))
    }

    /// Elementwise unary operator as a new column.
    pub fn unary(&self, op: UnaryOp) -> TableResult<Column> {
        let data = self
            .data
            .iter()
            .map(|v| op.apply(v))
            .collect::<TableResult<Vec<_>>>()?;
        Ok(self.derived(self.dtype, data))
    }

    /// In-place `self = self op rhs`; the result must fit the column type.
    pub fn op_assign<'o>(&mut self, op: BinaryOp, rhs: impl Into<Operand<'o>>) -> TableResult<()> {
        let result = self.binary(op, rhs)?;
        let data = result
            .data
            .into_iter()
            .map(|v| self.dtype.coerce(v))
            .collect::<TableResult<Vec<_>>>()?;
        self.data = data;
        Ok(())
    }

    fn derived(&self, hint: DataType, data: Vec<Value>) -> Column {
        let dtype = if data.iter().all(|v| hint.coerce(v.clone()).is_ok()) {
            hint
        } else {
            DataType::infer(&data)
        };
        let data = data
            .into_iter()
            .map(|v| dtype.coerce(v.clone()).unwrap_or(v))
            .collect();
        Column {
            dtype,
            shape: self.shape.clone(),
            rows: self.rows,
            data,
        }
    }
}

macro_rules! binary_methods {
    ($($(#[$doc:meta])* $name:ident => $op:expr),* $(,)?) => {
        impl Column {
            $(
                $(#[$doc])*
                pub fn $name<'o>(&self, rhs: impl Into<Operand<'o>>) -> TableResult<Column> {
                    self.binary($op, rhs)
                }
            )*
        }
    };
}
binary_methods! {
    add => BinaryOp::Add,
    sub => BinaryOp::Sub,
    mul => BinaryOp::Mul,
    div => BinaryOp::Div,
    rem => BinaryOp::Rem,
    pow => BinaryOp::Pow,
    /// Elementwise `==`, as a boolean column.
    equals => BinaryOp::Eq,
    not_equals => BinaryOp::Ne,
    less => BinaryOp::Lt,
    less_eq => BinaryOp::Le,
    greater => BinaryOp::Gt,
    greater_eq => BinaryOp::Ge,
    bitand => BinaryOp::BitAnd,
    bitor => BinaryOp::BitOr,
    bitxor => BinaryOp::BitXor,
}

impl Column {
    pub fn neg(&self) -> TableResult<Column> {
        self.unary(UnaryOp::Neg)
    }

    pub fn not(&self) -> TableResult<Column> {
        self.unary(UnaryOp::Not)
    }

    pub fn abs(&self) -> TableResult<Column> {
        self.unary(UnaryOp::Abs)
    }
}
