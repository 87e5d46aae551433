//! The lowered instruction set.
//!
//! Instructions are SSA: each value-producing instruction defines exactly
//! one [`ValueId`], and operands name values defined earlier in the same
//! function. Control flow merges through block parameters, so branch
//! targets carry the arguments bound on block entry.

use std::fmt;

use crate::int_type::IntType;

/// An SSA value within a function, printed as `%N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// A basic block within a function, printed as `bbN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// A function within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

/// A module-level binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlockId {
    pub const ENTRY: BlockId = BlockId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl GlobalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A position in the original source. `line == 0` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub const UNKNOWN: SourceLoc = SourceLoc { line: 0, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Two-operand arithmetic and bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Checked addition.
    Add,
    /// Checked subtraction.
    Sub,
    /// Checked multiplication.
    Mul,
    /// Checked division, truncating toward zero.
    Div,
    /// Checked remainder; the sign follows the dividend.
    Rem,
    /// Bitwise AND for integers, logical AND for booleans.
    And,
    /// Bitwise OR for integers, logical OR for booleans.
    Or,
    /// Bitwise XOR for integers, logical XOR for booleans.
    Xor,
}

/// All binary operations, in definition order.
pub const ALL_BINARY_OPS: [BinaryOp; 8] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Rem,
    BinaryOp::And,
    BinaryOp::Or,
    BinaryOp::Xor,
];

impl BinaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Rem => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    /// Source-level operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
        }
    }
}

/// Comparison operations. Always produce a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// All comparison operations, in definition order.
pub const ALL_COMPARE_OPS: [CompareOp; 6] = [
    CompareOp::Eq,
    CompareOp::Ne,
    CompareOp::Lt,
    CompareOp::Le,
    CompareOp::Gt,
    CompareOp::Ge,
];

impl CompareOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        }
    }
}

/// A branch destination together with the arguments for its block
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTarget {
    pub block: BlockId,
    pub args: Vec<ValueId>,
}

impl BranchTarget {
    pub fn new(block: BlockId, args: Vec<ValueId>) -> Self {
        Self { block, args }
    }

    /// A target block without parameters.
    pub fn to(block: BlockId) -> Self {
        Self {
            block,
            args: Vec::new(),
        }
    }
}

/// The operation performed by an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    /// Integer literal. Range-checked against `ty` when executed, so a
    /// narrowing literal like `Int8(123231)` traps instead of wrapping.
    IntLiteral { ty: IntType, value: i128 },
    /// Boolean literal.
    BoolLiteral(bool),
    /// Read the snapshot of a module-level binding.
    Global(GlobalId),
    /// Checked arithmetic or bitwise operation.
    Binary {
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Comparison.
    Compare {
        op: CompareOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Checked integer conversion to another width or signedness.
    Convert { value: ValueId, to: IntType },
    /// Boolean negation.
    Not(ValueId),
    /// Struct or tuple construction. `names` is `None` for tuples.
    Aggregate {
        fields: Vec<ValueId>,
        names: Option<Vec<String>>,
    },
    /// Field extraction by position.
    Extract { aggregate: ValueId, index: u32 },
    /// Call to another function of the module.
    Call {
        callee: FunctionId,
        args: Vec<ValueId>,
    },
    /// A value that is not known at compile time.
    Unknown { description: String },
    /// An operation the evaluator never executes (mutation, I/O, ...).
    Unsupported { description: String },
    /// Unconditional branch.
    Branch(BranchTarget),
    /// Two-way branch on a boolean.
    CondBranch {
        cond: ValueId,
        then_target: BranchTarget,
        else_target: BranchTarget,
    },
    /// Complete the current frame with a value.
    Return(ValueId),
}

impl InstructionKind {
    /// Returns true for branch and return instructions.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstructionKind::Branch(_)
                | InstructionKind::CondBranch { .. }
                | InstructionKind::Return(_)
        )
    }

    /// Returns true if the instruction must define a result value.
    /// `Unsupported` may or may not define one.
    pub fn requires_result(&self) -> bool {
        !self.is_terminator() && !matches!(self, InstructionKind::Unsupported { .. })
    }

    /// Every value this instruction reads, in operand order.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            InstructionKind::IntLiteral { .. }
            | InstructionKind::BoolLiteral(_)
            | InstructionKind::Global(_)
            | InstructionKind::Unknown { .. }
            | InstructionKind::Unsupported { .. } => Vec::new(),
            InstructionKind::Binary { lhs, rhs, .. } | InstructionKind::Compare { lhs, rhs, .. } => {
                vec![*lhs, *rhs]
            }
            InstructionKind::Convert { value, .. } => vec![*value],
            InstructionKind::Not(value) => vec![*value],
            InstructionKind::Aggregate { fields, .. } => fields.clone(),
            InstructionKind::Extract { aggregate, .. } => vec![*aggregate],
            InstructionKind::Call { args, .. } => args.clone(),
            InstructionKind::Branch(target) => target.args.clone(),
            InstructionKind::CondBranch {
                cond,
                then_target,
                else_target,
            } => {
                let mut ops = vec![*cond];
                ops.extend(&then_target.args);
                ops.extend(&else_target.args);
                ops
            }
            InstructionKind::Return(value) => vec![*value],
        }
    }

    /// Rewrite every operand in place.
    pub fn map_operands(&mut self, mut f: impl FnMut(ValueId) -> ValueId) {
        match self {
            InstructionKind::IntLiteral { .. }
            | InstructionKind::BoolLiteral(_)
            | InstructionKind::Global(_)
            | InstructionKind::Unknown { .. }
            | InstructionKind::Unsupported { .. } => {}
            InstructionKind::Binary { lhs, rhs, .. } | InstructionKind::Compare { lhs, rhs, .. } => {
                *lhs = f(*lhs);
                *rhs = f(*rhs);
            }
            InstructionKind::Convert { value, .. }
            | InstructionKind::Not(value)
            | InstructionKind::Return(value) => *value = f(*value),
            InstructionKind::Extract { aggregate, .. } => *aggregate = f(*aggregate),
            InstructionKind::Aggregate { fields: values, .. }
            | InstructionKind::Call { args: values, .. } => {
                for v in values.iter_mut() {
                    *v = f(*v);
                }
            }
            InstructionKind::Branch(target) => {
                for v in target.args.iter_mut() {
                    *v = f(*v);
                }
            }
            InstructionKind::CondBranch {
                cond,
                then_target,
                else_target,
            } => {
                *cond = f(*cond);
                for v in then_target.args.iter_mut().chain(else_target.args.iter_mut()) {
                    *v = f(*v);
                }
            }
        }
    }

    /// Branch targets of a terminator; empty for everything else.
    pub fn successors(&self) -> Vec<&BranchTarget> {
        match self {
            InstructionKind::Branch(target) => vec![target],
            InstructionKind::CondBranch {
                then_target,
                else_target,
                ..
            } => vec![then_target, else_target],
            _ => Vec::new(),
        }
    }

    /// Mnemonic used by the text form.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            InstructionKind::IntLiteral { .. } => "int",
            InstructionKind::BoolLiteral(_) => "bool",
            InstructionKind::Global(_) => "global",
            InstructionKind::Binary { op, .. } => op.mnemonic(),
            InstructionKind::Compare { .. } => "cmp",
            InstructionKind::Convert { .. } => "convert",
            InstructionKind::Not(_) => "not",
            InstructionKind::Aggregate { .. } => "aggregate",
            InstructionKind::Extract { .. } => "extract",
            InstructionKind::Call { .. } => "call",
            InstructionKind::Unknown { .. } => "unknown",
            InstructionKind::Unsupported { .. } => "unsupported",
            InstructionKind::Branch(_) => "br",
            InstructionKind::CondBranch { .. } => "cond_br",
            InstructionKind::Return(_) => "ret",
        }
    }
}

/// One instruction: its operation, the value it defines (if any) and the
/// source location diagnostics point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub result: Option<ValueId>,
    pub kind: InstructionKind,
    pub loc: SourceLoc,
}

impl Instruction {
    pub fn new(result: Option<ValueId>, kind: InstructionKind, loc: SourceLoc) -> Self {
        Self { result, kind, loc }
    }

    pub fn is_terminator(&self) -> bool {
        self.kind.is_terminator()
    }
}
