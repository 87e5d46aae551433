//! Incremental construction of [`Function`]s.
//!
//! Blocks and values can be created in any order; [`FunctionBuilder::finish`]
//! renumbers every value so that ids follow layout order (entry parameters
//! first, then each block's parameters and results in turn).
//!
//! ```
//! use assay_common::{CompareOp, FunctionBuilder, IntType};
//!
//! let mut b = FunctionBuilder::new("isOne");
//! let x = b.param();
//! let one = b.int(IntType::I64, 1);
//! let eq = b.compare(CompareOp::Eq, x, one);
//! b.ret(eq);
//! let f = b.finish();
//! assert_eq!(f.value_count, 3);
//! ```

use std::collections::HashMap;

use crate::instruction::{
    BinaryOp, BlockId, BranchTarget, CompareOp, FunctionId, GlobalId, Instruction,
    InstructionKind, SourceLoc, ValueId,
};
use crate::int_type::IntType;
use crate::program::{BasicBlock, Function};

/// Builds one function. The entry block exists from the start and is the
/// insertion point until [`switch_to`](Self::switch_to) is called.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    blocks: Vec<BasicBlock>,
    current: BlockId,
    next_value: u32,
    loc: SourceLoc,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: vec![BasicBlock::new(Vec::new(), Vec::new())],
            current: BlockId::ENTRY,
            next_value: 0,
            loc: SourceLoc::UNKNOWN,
        }
    }

    /// Add a function parameter (a parameter of the entry block).
    pub fn param(&mut self) -> ValueId {
        self.block_param(BlockId::ENTRY)
    }

    /// Add a parameter to `block`.
    pub fn block_param(&mut self, block: BlockId) -> ValueId {
        let v = self.fresh();
        self.blocks[block.index()].params.push(v);
        v
    }

    /// Append a new empty block.
    pub fn create_block(&mut self) -> BlockId {
        self.blocks.push(BasicBlock::new(Vec::new(), Vec::new()));
        BlockId(self.blocks.len() as u32 - 1)
    }

    /// Make `block` the insertion point.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Location attached to instructions added from now on.
    pub fn set_loc(&mut self, line: u32, column: u32) {
        self.loc = SourceLoc::new(line, column);
    }

    pub fn int(&mut self, ty: IntType, value: i128) -> ValueId {
        self.push_value(InstructionKind::IntLiteral { ty, value })
    }

    pub fn bool(&mut self, value: bool) -> ValueId {
        self.push_value(InstructionKind::BoolLiteral(value))
    }

    pub fn global(&mut self, global: GlobalId) -> ValueId {
        self.push_value(InstructionKind::Global(global))
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push_value(InstructionKind::Binary { op, lhs, rhs })
    }

    pub fn compare(&mut self, op: CompareOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push_value(InstructionKind::Compare { op, lhs, rhs })
    }

    pub fn convert(&mut self, value: ValueId, to: IntType) -> ValueId {
        self.push_value(InstructionKind::Convert { value, to })
    }

    pub fn not(&mut self, value: ValueId) -> ValueId {
        self.push_value(InstructionKind::Not(value))
    }

    pub fn tuple(&mut self, fields: Vec<ValueId>) -> ValueId {
        self.push_value(InstructionKind::Aggregate {
            fields,
            names: None,
        })
    }

    pub fn record(&mut self, fields: Vec<(&str, ValueId)>) -> ValueId {
        let (names, fields): (Vec<String>, Vec<ValueId>) = fields
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .unzip();
        self.push_value(InstructionKind::Aggregate {
            fields,
            names: Some(names),
        })
    }

    pub fn extract(&mut self, aggregate: ValueId, index: u32) -> ValueId {
        self.push_value(InstructionKind::Extract { aggregate, index })
    }

    pub fn call(&mut self, callee: FunctionId, args: Vec<ValueId>) -> ValueId {
        self.push_value(InstructionKind::Call { callee, args })
    }

    pub fn unknown(&mut self, description: &str) -> ValueId {
        self.push_value(InstructionKind::Unknown {
            description: description.to_string(),
        })
    }

    /// An unsupported operation that produces no value.
    pub fn unsupported(&mut self, description: &str) {
        self.push(
            None,
            InstructionKind::Unsupported {
                description: description.to_string(),
            },
        );
    }

    pub fn br(&mut self, block: BlockId, args: Vec<ValueId>) {
        self.push(None, InstructionKind::Branch(BranchTarget::new(block, args)));
    }

    pub fn cond_br(&mut self, cond: ValueId, then_target: BranchTarget, else_target: BranchTarget) {
        self.push(
            None,
            InstructionKind::CondBranch {
                cond,
                then_target,
                else_target,
            },
        );
    }

    pub fn ret(&mut self, value: ValueId) {
        self.push(None, InstructionKind::Return(value));
    }

    /// Renumber values into layout order and produce the function.
    pub fn finish(self) -> Function {
        let mut renumber = HashMap::new();
        let mut next = 0u32;
        for block in &self.blocks {
            let defined = block
                .params
                .iter()
                .copied()
                .chain(block.instructions.iter().filter_map(|i| i.result));
            for v in defined {
                renumber.insert(v, ValueId(next));
                next += 1;
            }
        }

        let map = |v: ValueId| renumber.get(&v).copied().unwrap_or(v);
        let blocks = self
            .blocks
            .into_iter()
            .map(|mut block| {
                for p in block.params.iter_mut() {
                    *p = map(*p);
                }
                for inst in block.instructions.iter_mut() {
                    inst.result = inst.result.map(map);
                    inst.kind.map_operands(map);
                }
                block
            })
            .collect();

        Function::new(self.name, blocks)
    }

    fn fresh(&mut self) -> ValueId {
        let v = ValueId(self.next_value);
        self.next_value += 1;
        v
    }

    fn push_value(&mut self, kind: InstructionKind) -> ValueId {
        let v = self.fresh();
        self.push(Some(v), kind);
        v
    }

    fn push(&mut self, result: Option<ValueId>, kind: InstructionKind) {
        let loc = self.loc;
        self.blocks[self.current.index()]
            .instructions
            .push(Instruction::new(result, kind, loc));
    }
}
