//! Assay verifier: static well-formedness checks for lowered modules.
//!
//! The verifier checks a `Module` BEFORE evaluation. It collects ALL errors
//! (not just the first) and returns them.
//!
//! # Usage
//!
//! ```
//! use assay_common::{FunctionBuilder, Module};
//! use assay_verifier::verify;
//!
//! let mut module = Module::new();
//! let mut b = FunctionBuilder::new("cond");
//! let t = b.bool(true);
//! b.ret(t);
//! module.add_function(b.finish());
//!
//! assert!(verify(&module).is_ok());
//! ```
//!
//! # Passes
//!
//! 1. **Limits**: function, block and value counts
//! 2. **Structural**: terminators, positional ids, use-before-definition,
//!    branch/call/global targets, assertion conditions

pub mod error;
pub mod limits;
pub mod structural;

pub use error::{Site, VerifyError};

use assay_common::Module;
use tracing::debug;

/// Verify a module for well-formedness.
///
/// Returns `Ok(())` if the module passes all checks, or
/// `Err(Vec<VerifyError>)` with all errors found.
pub fn verify(module: &Module) -> Result<(), Vec<VerifyError>> {
    let mut all_errors = Vec::new();

    // Pass 1: Limits (independent)
    all_errors.extend(limits::check_limits(module));

    // Pass 2: Structural
    all_errors.extend(structural::check_structural(module));

    debug!(
        functions = module.functions.len(),
        errors = all_errors.len(),
        "verified module"
    );

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay_common::{Assertion, FunctionBuilder, IntType, SourceLoc, ValueId};

    #[test]
    fn minimal_valid_module() {
        let mut module = Module::new();
        let mut b = FunctionBuilder::new("cond");
        let v = b.int(IntType::I64, 42);
        let eq = b.compare(assay_common::CompareOp::Eq, v, v);
        b.ret(eq);
        let cond = module.add_function(b.finish());
        module.add_assertion(Assertion {
            condition: cond,
            message: None,
            loc: SourceLoc::new(1, 1),
        });
        assert!(verify(&module).is_ok());
    }

    #[test]
    fn empty_module_is_valid() {
        assert!(verify(&Module::new()).is_ok());
    }

    #[test]
    fn multiple_errors_collected() {
        let mut module = Module::new();
        let mut b = FunctionBuilder::new("broken");
        b.ret(ValueId(7));
        let broken = module.add_function(b.finish());
        let mut b = FunctionBuilder::new("unary");
        let x = b.param();
        b.ret(x);
        let unary = module.add_function(b.finish());
        for condition in [broken, unary] {
            module.add_assertion(Assertion {
                condition,
                message: None,
                loc: SourceLoc::UNKNOWN,
            });
        }

        let errors = verify(&module).unwrap_err();
        assert!(errors.len() >= 2, "expected multiple errors, got: {errors:?}");
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::UseBeforeDefinition { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::ConditionHasParams { count: 1, .. })));
    }
}
