//! Structural validation pass for assay modules.
//!
//! Checks block shape, positional value numbering, use-before-definition in
//! layout order, branch and call targets, and assertion conditions.

use crate::error::{Site, VerifyError};
use assay_common::{BlockId, Function, Instruction, InstructionKind, Module, ValueId};

/// Run the structural validation pass over every function and assertion.
pub fn check_structural(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    for function in &module.functions {
        check_function(module, function, &mut errors);
    }

    for (index, assertion) in module.assertions.iter().enumerate() {
        match module.function(assertion.condition) {
            None => errors.push(VerifyError::UnknownCondition {
                index,
                condition: assertion.condition,
            }),
            Some(f) if !f.params.is_empty() => errors.push(VerifyError::ConditionHasParams {
                index,
                function: f.name.clone(),
                count: f.params.len(),
            }),
            Some(_) => {}
        }
    }

    errors
}

/// Per-function walk in layout order.
struct FunctionContext<'a> {
    module: &'a Module,
    function: &'a Function,
    /// Next positional id.
    next: u32,
    defined: Vec<bool>,
}

impl<'a> FunctionContext<'a> {
    fn new(module: &'a Module, function: &'a Function) -> Self {
        Self {
            module,
            function,
            next: 0,
            defined: vec![false; function.value_count],
        }
    }

    fn site(&self, block: BlockId, index: usize) -> Site {
        Site::new(&self.function.name, block, index)
    }

    /// Record a definition, checking that it takes the next positional id.
    fn define(&mut self, value: ValueId, at: Site, errors: &mut Vec<VerifyError>) {
        let expected = ValueId(self.next);
        if value != expected {
            errors.push(VerifyError::NonPositionalValue {
                at,
                expected,
                found: value,
            });
        }
        self.next += 1;
        if let Some(slot) = self.defined.get_mut(value.index()) {
            *slot = true;
        }
    }

    fn is_defined(&self, value: ValueId) -> bool {
        self.defined.get(value.index()).copied().unwrap_or(false)
    }
}

fn check_function(module: &Module, function: &Function, errors: &mut Vec<VerifyError>) {
    let Some(entry) = function.blocks.first() else {
        errors.push(VerifyError::EmptyFunction {
            function: function.name.clone(),
        });
        return;
    };
    if entry.params != function.params {
        errors.push(VerifyError::EntryParamsMismatch {
            function: function.name.clone(),
        });
    }

    let mut ctx = FunctionContext::new(module, function);

    for (b, block) in function.blocks.iter().enumerate() {
        let block_id = BlockId(b as u32);

        for param in &block.params {
            let at = ctx.site(block_id, 0);
            ctx.define(*param, at, errors);
        }

        match block.instructions.last() {
            Some(last) if last.is_terminator() => {}
            _ => errors.push(VerifyError::MissingTerminator {
                function: function.name.clone(),
                block: block_id,
            }),
        }

        let count = block.instructions.len();
        for (i, instr) in block.instructions.iter().enumerate() {
            let at = ctx.site(block_id, i);
            if instr.is_terminator() && i + 1 != count {
                errors.push(VerifyError::TerminatorNotLast { at: at.clone() });
            }
            check_instruction(&ctx, instr, &at, errors);
            if let Some(result) = instr.result {
                ctx.define(result, at, errors);
            }
        }
    }

    if ctx.next as usize != function.value_count {
        errors.push(VerifyError::ValueCountMismatch {
            function: function.name.clone(),
            declared: function.value_count,
            found: ctx.next as usize,
        });
    }
}

fn check_instruction(
    ctx: &FunctionContext<'_>,
    instr: &Instruction,
    at: &Site,
    errors: &mut Vec<VerifyError>,
) {
    let mnemonic = instr.kind.mnemonic();
    match (instr.kind.requires_result(), instr.result) {
        (true, None) => errors.push(VerifyError::MissingResult {
            at: at.clone(),
            mnemonic,
        }),
        (false, Some(_)) if instr.is_terminator() => errors.push(VerifyError::UnexpectedResult {
            at: at.clone(),
            mnemonic,
        }),
        _ => {}
    }

    for operand in instr.kind.operands() {
        if !ctx.is_defined(operand) {
            errors.push(VerifyError::UseBeforeDefinition {
                at: at.clone(),
                value: operand,
            });
        }
    }

    for target in instr.kind.successors() {
        match ctx.function.block(target.block) {
            None => errors.push(VerifyError::UnknownBlock {
                at: at.clone(),
                target: target.block,
            }),
            Some(block) if block.params.len() != target.args.len() => {
                errors.push(VerifyError::BlockArityMismatch {
                    at: at.clone(),
                    target: target.block,
                    expected: block.params.len(),
                    found: target.args.len(),
                })
            }
            Some(_) => {}
        }
    }

    match &instr.kind {
        InstructionKind::Call { callee, args } => match ctx.module.function(*callee) {
            None => errors.push(VerifyError::UnknownFunction {
                at: at.clone(),
                callee: *callee,
            }),
            Some(f) if f.params.len() != args.len() => {
                errors.push(VerifyError::CallArityMismatch {
                    at: at.clone(),
                    callee: f.name.clone(),
                    expected: f.params.len(),
                    found: args.len(),
                })
            }
            Some(_) => {}
        },
        InstructionKind::Aggregate {
            fields,
            names: Some(names),
        } if names.len() != fields.len() => errors.push(VerifyError::FieldNameCount {
            at: at.clone(),
            fields: fields.len(),
            names: names.len(),
        }),
        InstructionKind::Global(global) => {
            if ctx.module.global(*global).is_none() {
                errors.push(VerifyError::UnknownGlobal {
                    at: at.clone(),
                    global: *global,
                });
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay_common::{
        BasicBlock, BranchTarget, CompareOp, FunctionBuilder, FunctionId, IntType, SourceLoc,
    };

    fn instr(result: Option<u32>, kind: InstructionKind) -> Instruction {
        Instruction::new(result.map(ValueId), kind, SourceLoc::UNKNOWN)
    }

    fn single(function: Function) -> Module {
        let mut module = Module::new();
        module.add_function(function);
        module
    }

    #[test]
    fn built_function_passes() {
        let mut b = FunctionBuilder::new("isOne");
        let x = b.param();
        let one = b.int(IntType::I64, 1);
        let eq = b.compare(CompareOp::Eq, x, one);
        b.ret(eq);
        assert!(check_structural(&single(b.finish())).is_empty());
    }

    #[test]
    fn missing_terminator() {
        let f = Function::new(
            "f",
            vec![BasicBlock::new(
                vec![],
                vec![instr(Some(0), InstructionKind::BoolLiteral(true))],
            )],
        );
        let errors = check_structural(&single(f));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::MissingTerminator { .. })));
    }

    #[test]
    fn terminator_in_the_middle() {
        let f = Function::new(
            "f",
            vec![BasicBlock::new(
                vec![],
                vec![
                    instr(Some(0), InstructionKind::BoolLiteral(true)),
                    instr(None, InstructionKind::Return(ValueId(0))),
                    instr(None, InstructionKind::Return(ValueId(0))),
                ],
            )],
        );
        let errors = check_structural(&single(f));
        assert_eq!(
            errors,
            vec![VerifyError::TerminatorNotLast {
                at: Site::new("f", BlockId(0), 1)
            }]
        );
    }

    #[test]
    fn out_of_order_ids() {
        let f = Function::new(
            "f",
            vec![BasicBlock::new(
                vec![],
                vec![
                    instr(Some(1), InstructionKind::BoolLiteral(true)),
                    instr(Some(0), InstructionKind::BoolLiteral(false)),
                    instr(None, InstructionKind::Return(ValueId(0))),
                ],
            )],
        );
        let errors = check_structural(&single(f));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::NonPositionalValue { .. })));
    }

    #[test]
    fn use_before_definition() {
        let f = Function::new(
            "f",
            vec![BasicBlock::new(
                vec![],
                vec![
                    instr(Some(0), InstructionKind::Not(ValueId(1))),
                    instr(Some(1), InstructionKind::BoolLiteral(true)),
                    instr(None, InstructionKind::Return(ValueId(0))),
                ],
            )],
        );
        let errors = check_structural(&single(f));
        assert_eq!(
            errors,
            vec![VerifyError::UseBeforeDefinition {
                at: Site::new("f", BlockId(0), 0),
                value: ValueId(1)
            }]
        );
    }

    #[test]
    fn branch_target_checks() {
        let mut b = FunctionBuilder::new("f");
        let next = b.create_block();
        let _p = b.block_param(next);
        let t = b.bool(true);
        b.cond_br(t, BranchTarget::to(next), BranchTarget::to(BlockId(9)));
        b.switch_to(next);
        b.ret(t);
        let errors = check_structural(&single(b.finish()));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::BlockArityMismatch { expected: 1, found: 0, .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::UnknownBlock { target: BlockId(9), .. })));
    }

    #[test]
    fn call_checks() {
        let mut module = Module::new();
        let mut b = FunctionBuilder::new("id");
        let x = b.param();
        b.ret(x);
        let id = module.add_function(b.finish());

        let mut b = FunctionBuilder::new("caller");
        let r = b.call(id, vec![]);
        let s = b.call(FunctionId(5), vec![r]);
        b.ret(s);
        module.add_function(b.finish());

        let errors = check_structural(&module);
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::CallArityMismatch { expected: 1, found: 0, .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::UnknownFunction { .. })));
    }

    #[test]
    fn result_presence() {
        let f = Function::new(
            "f",
            vec![BasicBlock::new(
                vec![],
                vec![
                    instr(None, InstructionKind::BoolLiteral(true)),
                    instr(Some(0), InstructionKind::Return(ValueId(0))),
                ],
            )],
        );
        let errors = check_structural(&single(f));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::MissingResult { mnemonic: "bool", .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::UnexpectedResult { mnemonic: "ret", .. })));
    }

    #[test]
    fn record_names_must_match_fields() {
        let mut b = FunctionBuilder::new("f");
        let x = b.int(IntType::I64, 1);
        let y = b.int(IntType::I64, 2);
        let point = b.record(vec![("x", x), ("y", y)]);
        let first = b.extract(point, 0);
        let one = b.int(IntType::I64, 1);
        let eq = b.compare(CompareOp::Eq, first, one);
        b.ret(eq);
        let mut f = b.finish();
        f.blocks[0].instructions[2].kind = InstructionKind::Aggregate {
            fields: vec![x, y],
            names: Some(vec!["x".to_string()]),
        };

        assert_eq!(
            check_structural(&single(f)),
            vec![VerifyError::FieldNameCount {
                at: Site::new("f", BlockId(0), 2),
                fields: 2,
                names: 1,
            }]
        );
    }

    #[test]
    fn empty_function() {
        let errors = check_structural(&single(Function::new("f", vec![])));
        assert_eq!(
            errors,
            vec![VerifyError::EmptyFunction {
                function: "f".into()
            }]
        );
    }
}
