//! Pure instruction semantics.
//!
//! Every function here takes concrete values and either produces a new
//! value or reports why it cannot. Integer arithmetic is exact: results are
//! computed in `i128` and range-checked against the operand type, so
//! nothing ever wraps.

use std::cmp::Ordering;

use assay_common::{BinaryOp, CompareOp, IntType, IntValue, Value};
use thiserror::Error;

/// Why an operation could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    /// The exact result does not fit the result type.
    #[error("integer overflow")]
    Overflow,

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Operands do not fit the operation.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },

    /// Field index past the end of an aggregate.
    #[error("field {index} out of bounds (size {size})")]
    OutOfBounds { index: u32, size: usize },
}

fn mismatch(expected: &'static str, lhs: &Value, rhs: &Value) -> OpError {
    OpError::Mismatch {
        expected,
        found: format!("{} and {}", describe(lhs), describe(rhs)),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Int(i) => i.ty().to_string(),
        other => other.kind().to_string(),
    }
}

/// Materialise an integer literal, range-checked against its type.
pub fn literal(ty: IntType, value: i128) -> Result<Value, OpError> {
    Value::int(ty, value).map_err(|_| OpError::Overflow)
}

/// Evaluate a two-operand arithmetic or bitwise operation.
pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) if a.ty() == b.ty() => int_binary(op, a, b),
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::And => Ok(Value::Bool(*a && *b)),
            BinaryOp::Or => Ok(Value::Bool(*a || *b)),
            BinaryOp::Xor => Ok(Value::Bool(a ^ b)),
            _ => Err(mismatch("integer operands", lhs, rhs)),
        },
        _ => Err(mismatch("operands of the same integer type", lhs, rhs)),
    }
}

fn int_binary(op: BinaryOp, a: &IntValue, b: &IntValue) -> Result<Value, OpError> {
    let (x, y) = (a.get(), b.get());
    // Operands are at most 64 bits wide, so only `mul` of two extreme
    // values can leave i128; checked ops turn that into an overflow too.
    let exact = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Div => {
            if y == 0 {
                return Err(OpError::DivisionByZero);
            }
            x.checked_div(y)
        }
        BinaryOp::Rem => {
            if y == 0 {
                return Err(OpError::DivisionByZero);
            }
            // The remainder traps wherever the matching quotient would.
            if !a.ty().contains(x / y) {
                return Err(OpError::Overflow);
            }
            x.checked_rem(y)
        }
        BinaryOp::And => Some(x & y),
        BinaryOp::Or => Some(x | y),
        BinaryOp::Xor => Some(x ^ y),
    };
    let exact = exact.ok_or(OpError::Overflow)?;
    Value::int(a.ty(), exact).map_err(|_| OpError::Overflow)
}

/// Evaluate a comparison. Never overflows.
pub fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .compare(b)
            .ok_or_else(|| mismatch("operands of the same integer type", lhs, rhs))?,
        (Value::Bool(a), Value::Bool(b)) => match op {
            CompareOp::Eq | CompareOp::Ne => a.cmp(b),
            _ => return Err(mismatch("integer operands", lhs, rhs)),
        },
        (Value::Aggregate(_), Value::Aggregate(_)) => match op {
            CompareOp::Eq => return Ok(Value::Bool(lhs == rhs)),
            CompareOp::Ne => return Ok(Value::Bool(lhs != rhs)),
            _ => return Err(mismatch("integer operands", lhs, rhs)),
        },
        _ => return Err(mismatch("operands of the same kind", lhs, rhs)),
    };

    let result = match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

/// Convert an integer to another type, trapping instead of truncating.
pub fn convert(value: &Value, to: IntType) -> Result<Value, OpError> {
    match value {
        Value::Int(i) => Value::int(to, i.get()).map_err(|_| OpError::Overflow),
        other => Err(OpError::Mismatch {
            expected: "integer",
            found: describe(other),
        }),
    }
}

/// Boolean negation.
pub fn not(value: &Value) -> Result<Value, OpError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(OpError::Mismatch {
            expected: "bool",
            found: describe(other),
        }),
    }
}

/// Extract field `index` of an aggregate.
pub fn extract(value: &Value, index: u32) -> Result<Value, OpError> {
    let aggregate = value.as_aggregate().ok_or_else(|| OpError::Mismatch {
        expected: "aggregate",
        found: describe(value),
    })?;
    aggregate
        .field(index as usize)
        .cloned()
        .ok_or(OpError::OutOfBounds {
            index,
            size: aggregate.len(),
        })
}
