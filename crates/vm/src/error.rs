//! Malformed-input errors for the evaluator.
//!
//! These are defects in the lowered program handed to the evaluator, not
//! user-facing assertion diagnostics. A well-formed module (one that
//! passes the verifier) never produces them.

use assay_common::{BlockId, FunctionId, GlobalId, SourceLoc, ValueId};
use thiserror::Error;

/// Errors caused by a malformed module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// A call or assertion names a function that does not exist.
    #[error("unknown function #{}", function.0)]
    UnknownFunction { function: FunctionId },

    /// A branch names a block that does not exist.
    #[error("unknown block {block} in function '{function}'")]
    UnknownBlock { function: String, block: BlockId },

    /// A `global` instruction names a binding that does not exist.
    #[error("unknown global #{} at {at}", global.0)]
    UnknownGlobal { at: SourceLoc, global: GlobalId },

    /// An operand was read before anything defined it.
    #[error("value {value} used before definition in function '{function}'")]
    UndefinedValue { function: String, value: ValueId },

    /// Execution ran off the end of a block.
    #[error("block {block} in function '{function}' has no terminator")]
    MissingTerminator { function: String, block: BlockId },

    /// A function has no blocks at all.
    #[error("function '{function}' has no blocks")]
    EmptyFunction { function: String },

    /// Operand kinds do not fit the operation.
    #[error("type mismatch at {at}: expected {expected}, found {found}")]
    TypeMismatch {
        at: SourceLoc,
        expected: &'static str,
        found: String,
    },

    /// Field extraction past the end of an aggregate.
    #[error("field {index} out of bounds (size {size}) at {at}")]
    FieldOutOfBounds {
        at: SourceLoc,
        index: u32,
        size: usize,
    },

    /// A named aggregate whose name list does not match its fields.
    #[error("aggregate at {at} has {fields} field(s) but {names} name(s)")]
    FieldNameCount {
        at: SourceLoc,
        fields: usize,
        names: usize,
    },

    /// A call passes the wrong number of arguments.
    #[error("call to '{callee}' at {at} passes {found} argument(s), expected {expected}")]
    ArityMismatch {
        at: SourceLoc,
        callee: String,
        expected: usize,
        found: usize,
    },

    /// A branch passes the wrong number of block arguments.
    #[error("branch to {block} at {at} passes {found} argument(s), expected {expected}")]
    BlockArityMismatch {
        at: SourceLoc,
        block: BlockId,
        expected: usize,
        found: usize,
    },

    /// The interpreter stepped with an empty frame stack.
    #[error("no active frame")]
    NoActiveFrame,

    /// An assertion's condition function returned something other than a
    /// boolean.
    #[error("condition function '{function}' returned {found}, expected bool")]
    ConditionNotBool {
        function: String,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            VmError::UnknownFunction {
                function: FunctionId(3)
            }
            .to_string(),
            "unknown function #3"
        );
        assert_eq!(
            VmError::UndefinedValue {
                function: "isOne".into(),
                value: ValueId(4)
            }
            .to_string(),
            "value %4 used before definition in function 'isOne'"
        );
        assert_eq!(
            VmError::FieldOutOfBounds {
                at: SourceLoc::new(3, 9),
                index: 2,
                size: 2
            }
            .to_string(),
            "field 2 out of bounds (size 2) at 3:9"
        );
        assert_eq!(
            VmError::ConditionNotBool {
                function: "cond".into(),
                found: "integer"
            }
            .to_string(),
            "condition function 'cond' returned integer, expected bool"
        );
        assert_eq!(
            VmError::FieldNameCount {
                at: SourceLoc::new(7, 2),
                fields: 2,
                names: 1
            }
            .to_string(),
            "aggregate at 7:2 has 2 field(s) but 1 name(s)"
        );
    }
}
