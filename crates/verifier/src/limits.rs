//! Limits checking for assay modules.

use crate::error::VerifyError;
use assay_common::Module;

/// Maximum number of functions in a module.
pub const MAX_FUNCTIONS: usize = 65_536;

/// Maximum number of blocks in a function.
pub const MAX_BLOCKS: usize = 65_536;

/// Maximum number of SSA values in a function.
pub const MAX_VALUES: usize = 1_048_576;

/// Run the limits check. Integer widths need no check here: `IntType`
/// cannot be built outside 1..=64.
pub fn check_limits(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    if module.functions.len() > MAX_FUNCTIONS {
        errors.push(VerifyError::TooManyFunctions {
            count: module.functions.len(),
        });
    }

    for function in &module.functions {
        if function.blocks.len() > MAX_BLOCKS {
            errors.push(VerifyError::TooManyBlocks {
                function: function.name.clone(),
                count: function.blocks.len(),
            });
        }
        if function.value_count > MAX_VALUES {
            errors.push(VerifyError::TooManyValues {
                function: function.name.clone(),
                count: function.value_count,
            });
        }
    }

    errors
}
