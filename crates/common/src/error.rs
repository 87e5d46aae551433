//! Errors raised while constructing compile-time values.

use crate::int_type::IntType;
use thiserror::Error;

/// Errors that occur when building a [`Value`](crate::Value).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The mathematical value does not fit the declared integer type.
    #[error("integer {value} overflows when stored into '{ty}'")]
    Overflow { value: i128, ty: IntType },

    /// Integer widths must be in 1..=64.
    #[error("invalid integer width: {0} (must be 1..=64)")]
    InvalidWidth(u32),
}
