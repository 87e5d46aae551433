//! Fixed-width integer types.
//!
//! Every integer value carries its type: a bit width in 1..=64 and a
//! signedness. The value itself is held as an `i128`, which is wide enough
//! to represent every value of every supported type exactly.

use std::fmt;

use crate::error::ValueError;

/// Largest supported integer width.
pub const MAX_INT_WIDTH: u32 = 64;

/// A fixed-width, signed or unsigned integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntType {
    bits: u8,
    signed: bool,
}

impl IntType {
    pub const I8: IntType = IntType { bits: 8, signed: true };
    pub const I16: IntType = IntType { bits: 16, signed: true };
    pub const I32: IntType = IntType { bits: 32, signed: true };
    pub const I64: IntType = IntType { bits: 64, signed: true };
    pub const U8: IntType = IntType { bits: 8, signed: false };
    pub const U16: IntType = IntType { bits: 16, signed: false };
    pub const U32: IntType = IntType { bits: 32, signed: false };
    pub const U64: IntType = IntType { bits: 64, signed: false };

    /// Create an integer type, rejecting widths outside 1..=64.
    pub fn new(bits: u32, signed: bool) -> Result<Self, ValueError> {
        if bits == 0 || bits > MAX_INT_WIDTH {
            return Err(ValueError::InvalidWidth(bits));
        }
        Ok(Self {
            bits: bits as u8,
            signed,
        })
    }

    /// Bit width of the type.
    pub fn bits(self) -> u32 {
        self.bits as u32
    }

    /// Whether values are interpreted as two's-complement signed.
    pub fn is_signed(self) -> bool {
        self.signed
    }

    /// Smallest representable value.
    pub fn min_value(self) -> i128 {
        if self.signed {
            -(1i128 << (self.bits - 1))
        } else {
            0
        }
    }

    /// Largest representable value.
    pub fn max_value(self) -> i128 {
        if self.signed {
            (1i128 << (self.bits - 1)) - 1
        } else {
            (1i128 << self.bits) - 1
        }
    }

    /// Returns true if `value` is representable in this type.
    pub fn contains(self, value: i128) -> bool {
        value >= self.min_value() && value <= self.max_value()
    }

    /// Parse a type name: `Int8`..`Int64`, `UInt8`..`UInt64`, `Int`, `UInt`,
    /// or the generic spelling `iN` / `uN`.
    pub fn from_name(name: &str) -> Option<Self> {
        let named = match name {
            "Int" | "Int64" => Some(Self::I64),
            "Int8" => Some(Self::I8),
            "Int16" => Some(Self::I16),
            "Int32" => Some(Self::I32),
            "UInt" | "UInt64" => Some(Self::U64),
            "UInt8" => Some(Self::U8),
            "UInt16" => Some(Self::U16),
            "UInt32" => Some(Self::U32),
            _ => None,
        };
        if named.is_some() {
            return named;
        }

        let (signed, digits) = match name.as_bytes().first()? {
            b'i' => (true, &name[1..]),
            b'u' => (false, &name[1..]),
            _ => return None,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let bits: u32 = digits.parse().ok()?;
        Self::new(bits, signed).ok()
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.bits, self.signed) {
            (8 | 16 | 32 | 64, true) => write!(f, "Int{}", self.bits),
            (8 | 16 | 32 | 64, false) => write!(f, "UInt{}", self.bits),
            (bits, true) => write!(f, "i{bits}"),
            (bits, false) => write!(f, "u{bits}"),
        }
    }
}
