//! Evaluator state: call frames, local slots and the shared budget.

use assay_common::{BlockId, Function, FunctionId, Module, SourceLoc, Value, ValueId};

use crate::budget::Budget;
use crate::config::EvalConfig;
use crate::diagnostic::{Note, NoteKind, Reason};
use crate::error::VmError;

/// Contents of one local value slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Not yet defined.
    Empty,
    Known(Value),
    /// Defined, but not known at compile time. `source` is where the
    /// unknown input entered the computation.
    Unknown { source: SourceLoc },
}

/// A conditional branch whose condition is a boolean literal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Guard {
    pub loc: SourceLoc,
    /// Budget step at which the branch ran.
    pub step: u32,
    pub always_true: bool,
}

/// Execution state of one function invocation.
#[derive(Debug, Clone)]
pub(crate) struct Frame<'m> {
    pub function: &'m Function,
    pub slots: Vec<Slot>,
    pub block: BlockId,
    /// Offset of the next instruction within `block`.
    pub pc: usize,
    /// Index of the calling frame. `None` for the root frame.
    pub caller: Option<usize>,
    /// Location of the call instruction in the caller.
    pub call_site: SourceLoc,
    /// Caller slot that receives the return value.
    pub return_slot: Option<ValueId>,
    /// Entries per block, for loop detection.
    pub block_visits: Vec<u32>,
    /// Budget step at which each block was last entered.
    pub last_entry: Vec<u32>,
    /// Step of the most recent branch on a non-literal condition.
    pub last_varying_guard: Option<u32>,
    /// The most recent branch on a literal condition.
    pub last_constant_guard: Option<Guard>,
}

impl<'m> Frame<'m> {
    pub fn new(function: &'m Function, entered_at: u32) -> Self {
        let blocks = function.blocks.len();
        let mut block_visits = vec![0; blocks];
        let mut last_entry = vec![0; blocks];
        if blocks > 0 {
            block_visits[0] = 1;
            last_entry[0] = entered_at;
        }
        Self {
            function,
            slots: vec![Slot::Empty; function.value_count],
            block: BlockId::ENTRY,
            pc: 0,
            caller: None,
            call_site: SourceLoc::UNKNOWN,
            return_slot: None,
            block_visits,
            last_entry,
            last_varying_guard: None,
            last_constant_guard: None,
        }
    }

    /// Store `slot` as the definition of `value`.
    pub fn define(&mut self, value: ValueId, slot: Slot) -> Result<(), VmError> {
        match self.slots.get_mut(value.index()) {
            Some(entry) => {
                *entry = slot;
                Ok(())
            }
            None => Err(VmError::UndefinedValue {
                function: self.function.name.clone(),
                value,
            }),
        }
    }

    pub fn slot(&self, value: ValueId) -> Option<&Slot> {
        self.slots.get(value.index())
    }
}

/// Why an evaluation stopped without producing a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trap {
    pub reason: Reason,
    pub notes: Vec<Note>,
}

impl Trap {
    pub fn new(reason: Reason, notes: Vec<Note>) -> Self {
        Self { reason, notes }
    }

    pub(crate) fn at(reason: Reason, loc: SourceLoc, kind: NoteKind) -> Self {
        Self::new(reason, vec![Note::new(loc, kind)])
    }
}

/// How an evaluation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Returned(Value),
    Trapped(Trap),
}

/// Internal failure channel of the interpreter loop.
#[derive(Debug)]
pub(crate) enum Fault {
    NotConstant(Trap),
    Malformed(VmError),
}

impl From<Trap> for Fault {
    fn from(trap: Trap) -> Self {
        Fault::NotConstant(trap)
    }
}

impl From<VmError> for Fault {
    fn from(err: VmError) -> Self {
        Fault::Malformed(err)
    }
}

/// The assay evaluator.
///
/// One machine evaluates one call tree at a time. Frames live on an
/// explicit heap stack, so recursion depth is bounded by the instruction
/// budget rather than the native stack.
pub struct Machine<'m> {
    pub(crate) module: &'m Module,
    pub(crate) config: EvalConfig,
    pub(crate) frames: Vec<Frame<'m>>,
    pub(crate) budget: Budget,
}

impl<'m> Machine<'m> {
    pub fn new(module: &'m Module, config: EvalConfig) -> Self {
        Self {
            module,
            config,
            frames: Vec::new(),
            budget: Budget::new(config.instruction_limit),
        }
    }

    /// Instructions executed by the most recent evaluation.
    pub fn executed(&self) -> u32 {
        self.budget.executed()
    }

    /// Number of live frames. Zero outside an evaluation.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn function(&self, id: FunctionId) -> Result<&'m Function, VmError> {
        let module: &'m Module = self.module;
        module
            .function(id)
            .ok_or(VmError::UnknownFunction { function: id })
    }

    pub(crate) fn current(&self) -> Result<&Frame<'m>, VmError> {
        self.frames.last().ok_or(VmError::NoActiveFrame)
    }

    pub(crate) fn current_mut(&mut self) -> Result<&mut Frame<'m>, VmError> {
        self.frames.last_mut().ok_or(VmError::NoActiveFrame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay_common::{FunctionBuilder, IntType};

    fn sample() -> Function {
        let mut b = FunctionBuilder::new("f");
        let x = b.param();
        let one = b.int(IntType::I64, 1);
        let _ = (x, one);
        b.ret(one);
        b.finish()
    }

    #[test]
    fn new_frame_counts_entry_visit() {
        let f = sample();
        let frame = Frame::new(&f, 7);
        assert_eq!(frame.block_visits, vec![1]);
        assert_eq!(frame.last_entry, vec![7]);
        assert_eq!(frame.slots.len(), 2);
        assert!(frame.caller.is_none());
    }

    #[test]
    fn define_rejects_out_of_range_ids() {
        let f = sample();
        let mut frame = Frame::new(&f, 0);
        assert!(frame.define(ValueId(1), Slot::Known(Value::i64(1))).is_ok());
        assert_eq!(frame.slot(ValueId(1)), Some(&Slot::Known(Value::i64(1))));
        assert!(matches!(
            frame.define(ValueId(9), Slot::Empty),
            Err(VmError::UndefinedValue { .. })
        ));
    }

    #[test]
    fn faults_convert_from_both_sources() {
        let trap = Trap::at(Reason::LoopDetected, SourceLoc::UNKNOWN, NoteKind::LoopFound);
        assert!(matches!(Fault::from(trap), Fault::NotConstant(_)));
        let err = VmError::EmptyFunction {
            function: "f".into(),
        };
        assert!(matches!(Fault::from(err), Fault::Malformed(_)));
    }
}
