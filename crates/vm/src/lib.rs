//! Assay evaluator: reduces static assertion conditions to constants.
//!
//! The evaluator is a small abstract machine over the lowered SSA form in
//! `assay_common`:
//! - Local value slots per call frame, which may hold an unknown input
//! - An explicit heap-resident frame stack with caller back-links
//! - One instruction budget shared by the whole call tree
//! - Conservative loop detection on block re-entry
//!
//! Anything that cannot be reduced to a constant ends the evaluation with
//! a [`Reason`] and a trail of [`Note`]s. Malformed input is reported
//! separately as a [`VmError`].
//!
//! # Usage
//!
//! ```
//! use assay_common::{CompareOp, FunctionBuilder, IntType, Module};
//! use assay_vm::{evaluate_condition, EvalConfig, EvaluationOutcome};
//!
//! let mut module = Module::new();
//! let mut b = FunctionBuilder::new("cond");
//! let one = b.int(IntType::I64, 1);
//! let eq = b.compare(CompareOp::Eq, one, one);
//! b.ret(eq);
//! let cond = module.add_function(b.finish());
//!
//! let outcome = evaluate_condition(&module, cond, EvalConfig::default()).unwrap();
//! assert_eq!(outcome, EvaluationOutcome::ConstantTrue);
//! ```

pub mod budget;
pub mod config;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod execute;
pub mod machine;
pub mod semantics;

pub use budget::Budget;
pub use config::{EvalConfig, DEFAULT_INSTRUCTION_LIMIT};
pub use diagnostic::{AssertionReport, Diagnostic, EvaluationOutcome, Note, NoteKind, Reason};
pub use driver::{check_module, evaluate_assertion, evaluate_condition};
pub use error::VmError;
pub use machine::{Completion, Machine, Trap};
pub use semantics::OpError;
