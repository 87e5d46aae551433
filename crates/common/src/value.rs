//! Compile-time value representation.
//!
//! Values are immutable. Every operation of the evaluator produces a new
//! value; nothing is updated in place.

use std::cmp::Ordering;
use std::fmt;

use crate::error::ValueError;
use crate::int_type::IntType;

/// An integer together with its declared type.
///
/// Invariant: `ty.contains(value)`. The only constructor checks it, so an
/// out-of-range integer can never be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntValue {
    ty: IntType,
    value: i128,
}

impl IntValue {
    /// Build an integer, failing with [`ValueError::Overflow`] instead of
    /// wrapping when `value` does not fit `ty`.
    pub fn new(ty: IntType, value: i128) -> Result<Self, ValueError> {
        if !ty.contains(value) {
            return Err(ValueError::Overflow { value, ty });
        }
        Ok(Self { ty, value })
    }

    /// The declared type.
    pub fn ty(&self) -> IntType {
        self.ty
    }

    /// The mathematical value.
    pub fn get(&self) -> i128 {
        self.value
    }

    /// Two's-complement bit pattern, zero-extended to 64 bits.
    pub fn to_bits(&self) -> u64 {
        let mask = if self.ty.bits() == 64 {
            u64::MAX
        } else {
            (1u64 << self.ty.bits()) - 1
        };
        (self.value as u64) & mask
    }

    /// Compare two integers of the same type. Returns `None` when the
    /// types differ.
    pub fn compare(&self, other: &IntValue) -> Option<Ordering> {
        if self.ty != other.ty {
            return None;
        }
        Some(self.value.cmp(&other.value))
    }
}

/// A product value: ordered fields with optional field names.
///
/// Tuples have no names; structs name every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregate {
    fields: Vec<Value>,
    names: Option<Vec<String>>,
}

impl Aggregate {
    /// An unnamed aggregate (tuple).
    pub fn tuple(fields: Vec<Value>) -> Self {
        Self {
            fields,
            names: None,
        }
    }

    /// A named aggregate (struct), one name per field.
    pub fn record(fields: Vec<(String, Value)>) -> Self {
        let (names, fields) = fields.into_iter().unzip();
        Self {
            fields,
            names: Some(names),
        }
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Field at `index`, if in bounds.
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A fully known compile-time value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Fixed-width integer.
    Int(IntValue),
    /// Boolean.
    Bool(bool),
    /// Struct or tuple.
    Aggregate(Aggregate),
}

impl Value {
    /// Range-checked integer constructor.
    pub fn int(ty: IntType, value: i128) -> Result<Self, ValueError> {
        IntValue::new(ty, value).map(Value::Int)
    }

    /// Shorthand for a 64-bit signed integer, which always fits.
    pub fn i64(value: i64) -> Self {
        Value::Int(IntValue {
            ty: IntType::I64,
            value: value as i128,
        })
    }

    pub fn as_int(&self) -> Option<&IntValue> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            Value::Aggregate(a) => Some(a),
            _ => None,
        }
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Bool(_) => "bool",
            Value::Aggregate(_) => "aggregate",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i.get()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Aggregate(agg) => match agg.names() {
                None => {
                    write!(f, "(")?;
                    for (i, field) in agg.fields().iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{field}")?;
                    }
                    write!(f, ")")
                }
                Some(names) => {
                    write!(f, "{{")?;
                    for (i, (name, field)) in names.iter().zip(agg.fields()).enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{name}: {field}")?;
                    }
                    write!(f, "}}")
                }
            },
        }
    }
}
