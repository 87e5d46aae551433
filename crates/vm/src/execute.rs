//! Main execution loop and instruction dispatch.

use assay_common::{
    Aggregate, Binding, BranchTarget, FunctionId, GlobalId, Instruction, InstructionKind,
    SourceLoc, Value, ValueId,
};
use tracing::{debug, trace};

use crate::budget::Budget;
use crate::diagnostic::{Note, NoteKind, Reason};
use crate::error::VmError;
use crate::machine::{Completion, Fault, Frame, Guard, Machine, Slot, Trap};
use crate::semantics::{self, OpError};

impl<'m> Machine<'m> {
    /// Evaluate `function` applied to `args`.
    ///
    /// Returns `Completion::Trapped` when the call tree cannot be reduced
    /// to a constant, and `Err` only for malformed input. Each call starts
    /// from a fresh budget and an empty frame stack.
    pub fn evaluate(
        &mut self,
        function: FunctionId,
        args: Vec<Value>,
    ) -> Result<Completion, VmError> {
        self.frames.clear();
        self.budget = Budget::new(self.config.instruction_limit);

        let result = self
            .push_frame(function, args, None, SourceLoc::UNKNOWN, None)
            .and_then(|()| self.run());
        let completion = match result {
            Ok(value) => Ok(Completion::Returned(value)),
            Err(Fault::NotConstant(trap)) => {
                let trap = self.annotate(trap);
                debug!(reason = %trap.reason, notes = trap.notes.len(), "evaluation trapped");
                Ok(Completion::Trapped(trap))
            }
            Err(Fault::Malformed(err)) => Err(err),
        };
        self.frames.clear();
        completion
    }

    /// Run until the root frame returns.
    fn run(&mut self) -> Result<Value, Fault> {
        loop {
            let instr = self.fetch()?;
            if !self.budget.consume() {
                return Err(Trap::at(
                    Reason::BudgetExceeded,
                    instr.loc,
                    NoteKind::InstructionLimit(self.budget.limit()),
                )
                .into());
            }
            trace!(
                step = self.budget.executed(),
                depth = self.frames.len(),
                op = instr.kind.mnemonic(),
                "execute"
            );

            match &instr.kind {
                InstructionKind::IntLiteral { ty, value } => {
                    let v = semantics::literal(*ty, *value).map_err(|e| op_fault(e, instr.loc))?;
                    self.set_result(instr, Slot::Known(v))?;
                }
                InstructionKind::BoolLiteral(b) => {
                    self.set_result(instr, Slot::Known(Value::Bool(*b)))?;
                }
                InstructionKind::Global(id) => self.exec_global(instr, *id)?,
                InstructionKind::Binary { op, lhs, rhs } => {
                    let (a, b) = (self.operand(*lhs)?, self.operand(*rhs)?);
                    let v = semantics::binary(*op, &a, &b).map_err(|e| op_fault(e, instr.loc))?;
                    self.set_result(instr, Slot::Known(v))?;
                }
                InstructionKind::Compare { op, lhs, rhs } => {
                    let (a, b) = (self.operand(*lhs)?, self.operand(*rhs)?);
                    let v = semantics::compare(*op, &a, &b).map_err(|e| op_fault(e, instr.loc))?;
                    self.set_result(instr, Slot::Known(v))?;
                }
                InstructionKind::Convert { value, to } => {
                    let a = self.operand(*value)?;
                    let v = semantics::convert(&a, *to).map_err(|e| op_fault(e, instr.loc))?;
                    self.set_result(instr, Slot::Known(v))?;
                }
                InstructionKind::Not(value) => {
                    let a = self.operand(*value)?;
                    let v = semantics::not(&a).map_err(|e| op_fault(e, instr.loc))?;
                    self.set_result(instr, Slot::Known(v))?;
                }
                InstructionKind::Aggregate { fields, names } => {
                    if let Some(names) = names {
                        if names.len() != fields.len() {
                            return Err(VmError::FieldNameCount {
                                at: instr.loc,
                                fields: fields.len(),
                                names: names.len(),
                            }
                            .into());
                        }
                    }
                    let values = self.operands(fields)?;
                    let aggregate = match names {
                        Some(names) => {
                            Aggregate::record(names.iter().cloned().zip(values).collect())
                        }
                        None => Aggregate::tuple(values),
                    };
                    self.set_result(instr, Slot::Known(Value::Aggregate(aggregate)))?;
                }
                InstructionKind::Extract { aggregate, index } => {
                    let a = self.operand(*aggregate)?;
                    let v = semantics::extract(&a, *index).map_err(|e| op_fault(e, instr.loc))?;
                    self.set_result(instr, Slot::Known(v))?;
                }
                InstructionKind::Call { callee, args } => self.exec_call(instr, *callee, args)?,
                InstructionKind::Unknown { description } => {
                    trace!(description = description.as_str(), "unknown input");
                    self.set_result(instr, Slot::Unknown { source: instr.loc })?;
                }
                InstructionKind::Unsupported { description } => {
                    debug!(description = description.as_str(), "unsupported operation");
                    return Err(Trap::at(
                        Reason::UnsupportedOperation,
                        instr.loc,
                        NoteKind::CouldNotFold,
                    )
                    .into());
                }
                InstructionKind::Branch(target) => self.exec_branch(target, instr.loc)?,
                InstructionKind::CondBranch {
                    cond,
                    then_target,
                    else_target,
                } => self.exec_cond_branch(instr, *cond, then_target, else_target)?,
                InstructionKind::Return(value) => {
                    if let Some(result) = self.exec_return(*value)? {
                        return Ok(result);
                    }
                }
            }
        }
    }

    /// Fetch the instruction at the current frame's pc.
    fn fetch(&self) -> Result<&'m Instruction, VmError> {
        let frame = self.current()?;
        let function = frame.function;
        let block = function
            .block(frame.block)
            .ok_or_else(|| VmError::UnknownBlock {
                function: function.name.clone(),
                block: frame.block,
            })?;
        block
            .instructions
            .get(frame.pc)
            .ok_or_else(|| VmError::MissingTerminator {
                function: function.name.clone(),
                block: frame.block,
            })
    }

    /// Read a concrete operand from the current frame.
    fn operand(&self, value: ValueId) -> Result<Value, Fault> {
        let frame = self.current()?;
        match frame.slot(value) {
            Some(Slot::Known(v)) => Ok(v.clone()),
            Some(Slot::Unknown { source }) => {
                Err(Trap::at(Reason::NonConstantInput, *source, NoteKind::CouldNotFold).into())
            }
            Some(Slot::Empty) | None => Err(VmError::UndefinedValue {
                function: frame.function.name.clone(),
                value,
            }
            .into()),
        }
    }

    fn operands(&self, values: &[ValueId]) -> Result<Vec<Value>, Fault> {
        values.iter().map(|v| self.operand(*v)).collect()
    }

    /// Define the instruction's result and advance to the next instruction.
    fn set_result(&mut self, instr: &Instruction, slot: Slot) -> Result<(), VmError> {
        let frame = self.current_mut()?;
        if let Some(result) = instr.result {
            frame.define(result, slot)?;
        }
        frame.pc += 1;
        Ok(())
    }

    fn exec_global(&mut self, instr: &Instruction, id: GlobalId) -> Result<(), Fault> {
        let global = self
            .module
            .global(id)
            .ok_or(VmError::UnknownGlobal {
                at: instr.loc,
                global: id,
            })?;
        let slot = match &global.binding {
            Binding::Known(value) => Slot::Known(value.clone()),
            Binding::Unknown(_) => Slot::Unknown {
                source: if global.loc.is_unknown() {
                    instr.loc
                } else {
                    global.loc
                },
            },
        };
        self.set_result(instr, slot)?;
        Ok(())
    }

    fn exec_call(
        &mut self,
        instr: &Instruction,
        callee: FunctionId,
        args: &[ValueId],
    ) -> Result<(), Fault> {
        let values = self.operands(args)?;
        let caller = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or(VmError::NoActiveFrame)?;
        self.current_mut()?.pc += 1;
        self.push_frame(callee, values, Some(caller), instr.loc, instr.result)
    }

    fn push_frame(
        &mut self,
        id: FunctionId,
        args: Vec<Value>,
        caller: Option<usize>,
        call_site: SourceLoc,
        return_slot: Option<ValueId>,
    ) -> Result<(), Fault> {
        let function = self.function(id)?;
        if function.blocks.is_empty() {
            return Err(VmError::EmptyFunction {
                function: function.name.clone(),
            }
            .into());
        }
        if function.params.len() != args.len() {
            return Err(VmError::ArityMismatch {
                at: call_site,
                callee: function.name.clone(),
                expected: function.params.len(),
                found: args.len(),
            }
            .into());
        }

        let mut frame = Frame::new(function, self.budget.executed());
        frame.caller = caller;
        frame.call_site = call_site;
        frame.return_slot = return_slot;
        for (param, value) in function.params.iter().zip(args) {
            frame.define(*param, Slot::Known(value))?;
        }

        debug!(
            function = function.name.as_str(),
            depth = self.frames.len() + 1,
            "push frame"
        );
        self.frames.push(frame);
        Ok(())
    }

    fn exec_branch(&mut self, target: &BranchTarget, loc: SourceLoc) -> Result<(), Fault> {
        self.enter_block(target, loc)
    }

    fn exec_cond_branch(
        &mut self,
        instr: &Instruction,
        cond: ValueId,
        then_target: &BranchTarget,
        else_target: &BranchTarget,
    ) -> Result<(), Fault> {
        let taken = match self.operand(cond)? {
            Value::Bool(b) => b,
            other => {
                return Err(VmError::TypeMismatch {
                    at: instr.loc,
                    expected: "bool",
                    found: other.kind().to_string(),
                }
                .into())
            }
        };

        let step = self.budget.executed();
        let frame = self.current_mut()?;
        match frame.function.definition(cond).map(|d| &d.kind) {
            Some(InstructionKind::BoolLiteral(always_true)) => {
                frame.last_constant_guard = Some(Guard {
                    loc: instr.loc,
                    step,
                    always_true: *always_true,
                });
            }
            _ => frame.last_varying_guard = Some(step),
        }

        let target = if taken { then_target } else { else_target };
        self.enter_block(target, instr.loc)
    }

    /// Transfer control to `target`, binding its parameters.
    ///
    /// Re-entering a block is a loop unless a branch on a non-literal
    /// condition ran since the previous entry; such loops are left to the
    /// budget.
    fn enter_block(&mut self, target: &BranchTarget, loc: SourceLoc) -> Result<(), Fault> {
        let args = self.operands(&target.args)?;
        let step = self.budget.executed();
        let frame = self.current_mut()?;
        let function = frame.function;
        let block = function
            .block(target.block)
            .ok_or_else(|| VmError::UnknownBlock {
                function: function.name.clone(),
                block: target.block,
            })?;
        if block.params.len() != args.len() {
            return Err(VmError::BlockArityMismatch {
                at: loc,
                block: target.block,
                expected: block.params.len(),
                found: args.len(),
            }
            .into());
        }

        let index = target.block.index();
        if frame.block_visits[index] > 0 {
            let since = frame.last_entry[index];
            let varying = frame.last_varying_guard.is_some_and(|s| s > since);
            if !varying {
                let notes = match frame.last_constant_guard.filter(|g| g.step > since) {
                    Some(guard) if guard.always_true => vec![
                        Note::new(guard.loc, NoteKind::ConditionAlwaysTrue),
                        Note::new(guard.loc, NoteKind::LoopFound),
                    ],
                    Some(guard) => vec![Note::new(guard.loc, NoteKind::LoopFound)],
                    None => vec![Note::new(loc, NoteKind::LoopFound)],
                };
                debug!(
                    function = function.name.as_str(),
                    block = %target.block,
                    "loop detected"
                );
                return Err(Trap::new(Reason::LoopDetected, notes).into());
            }
        }

        frame.block_visits[index] += 1;
        frame.last_entry[index] = step;
        for (param, value) in block.params.iter().zip(args) {
            frame.define(*param, Slot::Known(value))?;
        }
        frame.block = target.block;
        frame.pc = 0;
        trace!(
            function = function.name.as_str(),
            block = %target.block,
            visits = frame.block_visits[index],
            "enter block"
        );
        Ok(())
    }

    /// Complete the current frame. Returns the value once the root frame
    /// has returned.
    fn exec_return(&mut self, value: ValueId) -> Result<Option<Value>, Fault> {
        let result = self.operand(value)?;
        let frame = self.frames.pop().ok_or(VmError::NoActiveFrame)?;
        debug!(
            function = frame.function.name.as_str(),
            depth = self.frames.len(),
            result = %result,
            "pop frame"
        );

        match self.frames.last_mut() {
            None => Ok(Some(result)),
            Some(caller) => {
                if let Some(slot) = frame.return_slot {
                    caller.define(slot, Slot::Known(result))?;
                }
                Ok(None)
            }
        }
    }

    /// Append a "when called from here" note for every caller of the
    /// frame that trapped, innermost first.
    fn annotate(&self, mut trap: Trap) -> Trap {
        let mut index = self.frames.len().checked_sub(1);
        while let Some(i) = index {
            let frame = &self.frames[i];
            if frame.caller.is_some() {
                trap.notes
                    .push(Note::new(frame.call_site, NoteKind::CalledFromHere));
            }
            index = frame.caller;
        }
        trap
    }
}

/// Map a semantic failure at `loc` to the interpreter's fault channel.
fn op_fault(err: OpError, loc: SourceLoc) -> Fault {
    match err {
        OpError::Overflow => {
            Trap::at(Reason::OverflowDetected, loc, NoteKind::IntegerOverflow).into()
        }
        OpError::DivisionByZero => {
            Trap::at(Reason::DivisionByZero, loc, NoteKind::DivisionByZero).into()
        }
        OpError::Mismatch { expected, found } => VmError::TypeMismatch {
            at: loc,
            expected,
            found,
        }
        .into(),
        OpError::OutOfBounds { index, size } => {
            VmError::FieldOutOfBounds { at: loc, index, size }.into()
        }
    }
}
