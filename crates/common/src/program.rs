//! Lowered program structure: blocks, functions and the module handed to
//! the evaluator.
//!
//! Everything here is read-only once built. The evaluator borrows a
//! [`Module`] for the duration of an evaluation and never modifies it.

use crate::instruction::{BlockId, FunctionId, GlobalId, Instruction, SourceLoc, ValueId};
use crate::value::Value;

/// A straight-line sequence of instructions ending in one terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Values bound from the branch arguments when the block is entered.
    pub params: Vec<ValueId>,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(params: Vec<ValueId>, instructions: Vec<Instruction>) -> Self {
        Self {
            params,
            instructions,
        }
    }

    /// The final instruction, if it is a terminator.
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }
}

/// A function: an ordered list of blocks, entered at block 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    /// The parameters. Identical to the entry block's parameters.
    pub params: Vec<ValueId>,
    pub blocks: Vec<BasicBlock>,
    /// Number of value slots a frame needs (highest value id + 1).
    pub value_count: usize,
}

impl Function {
    /// Build a function. The entry block's parameters are the function's
    /// parameters.
    pub fn new(name: impl Into<String>, blocks: Vec<BasicBlock>) -> Self {
        let params = blocks
            .first()
            .map(|b| b.params.clone())
            .unwrap_or_default();
        let value_count = blocks
            .iter()
            .flat_map(|b| {
                b.params
                    .iter()
                    .copied()
                    .chain(b.instructions.iter().filter_map(|i| i.result))
            })
            .map(|v| v.index() + 1)
            .max()
            .unwrap_or(0);

        Self {
            name: name.into(),
            params,
            blocks,
            value_count,
        }
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// The instruction that defines `value`, or `None` for block
    /// parameters and undefined ids.
    pub fn definition(&self, value: ValueId) -> Option<&Instruction> {
        self.blocks
            .iter()
            .flat_map(|b| b.instructions.iter())
            .find(|i| i.result == Some(value))
    }

    /// Total number of instructions across all blocks.
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }
}

/// What the external propagation stage knows about a module-level binding
/// at the point of the assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// The snapshot value.
    Known(Value),
    /// The binding could not be determined (for example, it is mutated
    /// under a runtime condition).
    Unknown(String),
}

/// A module-level binding, already resolved by the lowering stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub binding: Binding,
    pub loc: SourceLoc,
}

/// One static assertion directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// Zero-parameter function computing the condition.
    pub condition: FunctionId,
    /// Literal failure message, if the directive supplied one.
    pub message: Option<String>,
    /// Location of the directive itself.
    pub loc: SourceLoc,
}

/// Everything the lowering stage hands to the evaluator for one
/// translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
    pub assertions: Vec<Assertion>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a function and return its id.
    pub fn add_function(&mut self, function: Function) -> FunctionId {
        self.functions.push(function);
        FunctionId(self.functions.len() as u32 - 1)
    }

    /// Append a global and return its id.
    pub fn add_global(&mut self, global: Global) -> GlobalId {
        self.globals.push(global);
        GlobalId(self.globals.len() as u32 - 1)
    }

    pub fn add_assertion(&mut self, assertion: Assertion) {
        self.assertions.push(assertion);
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    pub fn global(&self, id: GlobalId) -> Option<&Global> {
        self.globals.get(id.index())
    }

    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| FunctionId(i as u32))
    }

    pub fn global_by_name(&self, name: &str) -> Option<GlobalId> {
        self.globals
            .iter()
            .position(|g| g.name == name)
            .map(|i| GlobalId(i as u32))
    }
}
