//! Assay common types: values and the lowered instruction set.
//!
//! This crate provides the data handed from the lowering stage to the
//! compile-time evaluator:
//!
//! - [`IntType`]: fixed-width signed/unsigned integer types
//! - [`Value`]: immutable compile-time values (integers, booleans, aggregates)
//! - [`Instruction`]: one SSA instruction with its source location
//! - [`BasicBlock`], [`Function`], [`Module`]: the control-flow graph
//! - [`FunctionBuilder`]: incremental construction with positional value ids
//! - [`ValueError`]: errors from range-checked value construction
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod builder;
pub mod error;
pub mod instruction;
pub mod int_type;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use builder::FunctionBuilder;
pub use error::ValueError;
pub use instruction::{
    BinaryOp, BlockId, BranchTarget, CompareOp, FunctionId, GlobalId, Instruction,
    InstructionKind, SourceLoc, ValueId,
};
pub use int_type::IntType;
pub use program::{Assertion, BasicBlock, Binding, Function, Global, Module};
pub use value::{Aggregate, IntValue, Value};
