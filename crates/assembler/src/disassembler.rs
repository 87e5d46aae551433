//! Disassembler: module → canonical IR text.
//!
//! Layout: globals, then one function per paragraph, then assertions.
//! Instructions are indented two spaces; block headers and braces are not.
//! Unknown locations are omitted.

use std::fmt::Write;

use assay_common::{
    Binding, BranchTarget, Function, Instruction, InstructionKind, Module, SourceLoc, Value,
    ValueId,
};

/// Disassemble a module into canonical text.
///
/// The output parses back to an identical module
/// (`assemble(&disassemble(&module)) == Ok(module)`) whenever every
/// function and global name is made of letters, digits, `_` and `.`.
pub fn disassemble(module: &Module) -> String {
    let mut out = String::new();

    for global in &module.globals {
        let binding = match &global.binding {
            Binding::Known(value) => literal(value),
            Binding::Unknown(why) => format!("unknown {}", quote(why)),
        };
        let line = format!("global ${} = {binding}", global.name);
        push_line(&mut out, &line, global.loc);
    }
    if !module.globals.is_empty() {
        out.push('\n');
    }

    for function in &module.functions {
        write_function(&mut out, module, function);
        out.push('\n');
    }

    for assertion in &module.assertions {
        let name = module
            .function(assertion.condition)
            .map(|f| f.name.as_str())
            .unwrap_or("?");
        let mut line = format!("assert @{name}");
        if let Some(message) = &assertion.message {
            let _ = write!(line, " {}", quote(message));
        }
        push_line(&mut out, &line, assertion.loc);
    }

    out
}

fn write_function(out: &mut String, module: &Module, function: &Function) {
    let _ = writeln!(out, "func @{}({}) {{", function.name, values(&function.params));
    for (b, block) in function.blocks.iter().enumerate() {
        if block.params.is_empty() {
            let _ = writeln!(out, "bb{b}:");
        } else {
            let _ = writeln!(out, "bb{b}({}):", values(&block.params));
        }
        for instr in &block.instructions {
            let line = format!("  {}", instruction(module, instr));
            push_line(out, &line, instr.loc);
        }
    }
    out.push_str("}\n");
}

fn instruction(module: &Module, instr: &Instruction) -> String {
    let body = match &instr.kind {
        InstructionKind::IntLiteral { ty, value } => format!("int {ty} {value}"),
        InstructionKind::BoolLiteral(b) => format!("bool {b}"),
        InstructionKind::Global(id) => {
            let name = module.global(*id).map(|g| g.name.as_str()).unwrap_or("?");
            format!("global ${name}")
        }
        InstructionKind::Binary { op, lhs, rhs } => format!("{} {lhs}, {rhs}", op.mnemonic()),
        InstructionKind::Compare { op, lhs, rhs } => {
            format!("cmp {} {lhs}, {rhs}", op.mnemonic())
        }
        InstructionKind::Convert { value, to } => format!("convert {value} to {to}"),
        InstructionKind::Not(value) => format!("not {value}"),
        InstructionKind::Aggregate {
            fields,
            names: None,
        } => format!("aggregate ({})", values(fields)),
        InstructionKind::Aggregate {
            fields,
            names: Some(names),
        } => {
            let pairs: Vec<String> = names
                .iter()
                .zip(fields)
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            format!("aggregate {{{}}}", pairs.join(", "))
        }
        InstructionKind::Extract { aggregate, index } => format!("extract {aggregate}, {index}"),
        InstructionKind::Call { callee, args } => {
            let name = module.function(*callee).map(|f| f.name.as_str()).unwrap_or("?");
            format!("call @{name}({})", values(args))
        }
        InstructionKind::Unknown { description } => format!("unknown {}", quote(description)),
        InstructionKind::Unsupported { description } => {
            format!("unsupported {}", quote(description))
        }
        InstructionKind::Branch(target) => format!("br {}", target_text(target)),
        InstructionKind::CondBranch {
            cond,
            then_target,
            else_target,
        } => format!(
            "cond_br {cond}, {}, {}",
            target_text(then_target),
            target_text(else_target)
        ),
        InstructionKind::Return(value) => format!("ret {value}"),
    };
    match instr.result {
        Some(result) => format!("{result} = {body}"),
        None => body,
    }
}

/// Append `text`, followed by its location when known.
fn push_line(out: &mut String, text: &str, loc: SourceLoc) {
    out.push_str(text);
    if loc != SourceLoc::UNKNOWN {
        let _ = write!(out, " @{}:{}", loc.line, loc.column);
    }
    out.push('\n');
}

fn values(ids: &[ValueId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn target_text(target: &BranchTarget) -> String {
    if target.args.is_empty() {
        target.block.to_string()
    } else {
        format!("{}({})", target.block, values(&target.args))
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Int(i) => format!("int {} {}", i.ty(), i.get()),
        Value::Bool(b) => format!("bool {b}"),
        Value::Aggregate(agg) => {
            let fields = agg.fields().iter().map(literal);
            match agg.names() {
                None => format!("({})", fields.collect::<Vec<_>>().join(", ")),
                Some(names) => {
                    let pairs: Vec<String> = names
                        .iter()
                        .zip(fields)
                        .map(|(name, field)| format!("{name}: {field}"))
                        .collect();
                    format!("{{{}}}", pairs.join(", "))
                }
            }
        }
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay_common::{Aggregate, Assertion, FunctionBuilder, Global, IntType};

    #[test]
    fn prints_function_with_locations() {
        let mut module = Module::new();
        let mut b = FunctionBuilder::new("isOne");
        let x = b.param();
        b.set_loc(8, 15);
        let one = b.int(IntType::I64, 1);
        b.set_loc(8, 12);
        let eq = b.compare(assay_common::CompareOp::Eq, x, one);
        b.set_loc(8, 3);
        b.ret(eq);
        module.add_function(b.finish());

        assert_eq!(
            disassemble(&module),
            "func @isOne(%0) {\nbb0(%0):\n  %1 = int Int64 1 @8:15\n  %2 = cmp eq %0, %1 @8:12\n  ret %2 @8:3\n}\n\n"
        );
    }

    #[test]
    fn prints_globals_and_assertions() {
        let mut module = Module::new();
        module.add_global(Global {
            name: "limit".into(),
            binding: Binding::Known(Value::i64(10)),
            loc: SourceLoc::UNKNOWN,
        });
        module.add_global(Global {
            name: "pair".into(),
            binding: Binding::Known(Value::Aggregate(Aggregate::tuple(vec![
                Value::Bool(true),
                Value::i64(-3),
            ]))),
            loc: SourceLoc::new(2, 1),
        });
        let mut b = FunctionBuilder::new("cond");
        let t = b.bool(true);
        b.ret(t);
        let cond = module.add_function(b.finish());
        module.add_assertion(Assertion {
            condition: cond,
            message: Some("say \"hi\"".into()),
            loc: SourceLoc::new(18, 3),
        });

        let text = disassemble(&module);
        assert!(text.starts_with(
            "global $limit = int Int64 10\nglobal $pair = (bool true, int Int64 -3) @2:1\n\n"
        ));
        assert!(text.ends_with("assert @cond \"say \\\"hi\\\"\" @18:3\n"));
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
    }
}
