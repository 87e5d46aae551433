//! Verification errors for the assay verifier.
//!
//! Every error names the function it was found in, and instruction-level
//! errors carry a [`Site`]. The verifier collects ALL errors, not just the
//! first.

use std::fmt;

use assay_common::{BlockId, FunctionId, GlobalId, ValueId};
use thiserror::Error;

/// Position of an instruction: function, block and offset in the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub function: String,
    pub block: BlockId,
    pub index: usize,
}

impl Site {
    pub fn new(function: &str, block: BlockId, index: usize) -> Self {
        Self {
            function: function.to_string(),
            block,
            index,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}[{}]", self.function, self.block, self.index)
    }
}

/// Errors found during static verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    // --- Limits ---
    #[error("module has {count} functions (limit 65536)")]
    TooManyFunctions { count: usize },

    #[error("function '{function}' has {count} blocks (limit 65536)")]
    TooManyBlocks { function: String, count: usize },

    #[error("function '{function}' has {count} values (limit 1048576)")]
    TooManyValues { function: String, count: usize },

    // --- Structural ---
    #[error("function '{function}' has no blocks")]
    EmptyFunction { function: String },

    #[error("function '{function}' parameters differ from its entry block parameters")]
    EntryParamsMismatch { function: String },

    #[error("block {block} in function '{function}' does not end in a terminator")]
    MissingTerminator { function: String, block: BlockId },

    #[error("terminator before the end of the block at {at}")]
    TerminatorNotLast { at: Site },

    #[error("value id out of order at {at}: expected {expected}, found {found}")]
    NonPositionalValue {
        at: Site,
        expected: ValueId,
        found: ValueId,
    },

    #[error("function '{function}' declares {declared} value slots, found {found}")]
    ValueCountMismatch {
        function: String,
        declared: usize,
        found: usize,
    },

    #[error("value {value} used before definition at {at}")]
    UseBeforeDefinition { at: Site, value: ValueId },

    #[error("branch to unknown block {target} at {at}")]
    UnknownBlock { at: Site, target: BlockId },

    #[error("branch to {target} at {at} passes {found} argument(s), expected {expected}")]
    BlockArityMismatch {
        at: Site,
        target: BlockId,
        expected: usize,
        found: usize,
    },

    #[error("call to unknown function #{} at {at}", callee.0)]
    UnknownFunction { at: Site, callee: FunctionId },

    #[error("call to '{callee}' at {at} passes {found} argument(s), expected {expected}")]
    CallArityMismatch {
        at: Site,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("aggregate at {at} has {fields} field(s) but {names} name(s)")]
    FieldNameCount {
        at: Site,
        fields: usize,
        names: usize,
    },

    #[error("reference to unknown global #{} at {at}", global.0)]
    UnknownGlobal { at: Site, global: GlobalId },

    #[error("{mnemonic} at {at} must define a result")]
    MissingResult { at: Site, mnemonic: &'static str },

    #[error("{mnemonic} at {at} cannot define a result")]
    UnexpectedResult { at: Site, mnemonic: &'static str },

    // --- Assertions ---
    #[error("assertion {index} names unknown function #{}", condition.0)]
    UnknownCondition { index: usize, condition: FunctionId },

    #[error("assertion {index} condition '{function}' takes {count} parameter(s), expected 0")]
    ConditionHasParams {
        index: usize,
        function: String,
        count: usize,
    },
}
