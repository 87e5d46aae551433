//! Integration tests for the assay assembler.
//!
//! Tests cover:
//! - The fixture programs under `tests/programs/` (assemble, verify, evaluate)
//! - Roundtrip properties (disassemble → assemble, assemble → disassemble → assemble)
//! - Error cases with line numbers

use assay_assembler::{assemble, disassemble, AsmError};
use assay_common::{
    Assertion, BinaryOp, CompareOp, FunctionBuilder, IntType, Module, SourceLoc, ValueId,
};
use assay_vm::{check_module, AssertionReport, EvalConfig, NoteKind, Reason};

const POUND_ASSERT: &str = include_str!("../../../tests/programs/pound_assert.air");
const PASSING: &str = include_str!("../../../tests/programs/passing.air");
const INVALID: &str = include_str!("../../../tests/programs/invalid.air");
const SYNTAX_ERROR: &str = include_str!("../../../tests/programs/syntax_error.air");

// ---- Test helpers ----

/// Assemble, verify and evaluate every assertion.
fn assemble_verify_check(text: &str) -> (Module, Vec<AssertionReport>) {
    let module = assemble(text).unwrap_or_else(|err| panic!("assembly failed: {err}"));
    assay_verifier::verify(&module).unwrap_or_else(|errors| {
        panic!("verification failed: {errors:?}");
    });
    let reports = check_module(&module, EvalConfig::default())
        .into_iter()
        .map(|r| r.unwrap_or_else(|err| panic!("malformed module: {err}")))
        .collect();
    (module, reports)
}

/// The report of the assertion whose condition function is `name`.
fn report<'a>(module: &Module, reports: &'a [AssertionReport], name: &str) -> &'a AssertionReport {
    let id = module.function_by_name(name).unwrap();
    let index = module
        .assertions
        .iter()
        .position(|a| a.condition == id)
        .unwrap();
    &reports[index]
}

fn notes(report: &AssertionReport) -> Vec<(SourceLoc, NoteKind)> {
    report
        .outcome
        .trail()
        .iter()
        .map(|n| (n.loc, n.kind))
        .collect()
}

fn loc(line: u32, column: u32) -> SourceLoc {
    SourceLoc::new(line, column)
}

// ---- Fixture programs ----

#[test]
fn pound_assert_summary() {
    let (module, reports) = assemble_verify_check(POUND_ASSERT);
    assert_eq!(module.assertions.len(), 31);
    assert_eq!(reports.iter().filter(|r| r.passed()).count(), 18);
}

#[test]
fn pound_assert_failures_carry_messages() {
    let (module, reports) = assemble_verify_check(POUND_ASSERT);

    let plain = report(&module, &reports, "failure.0");
    let diagnostic = plain.diagnostic.as_ref().unwrap();
    assert_eq!(diagnostic.message, "assertion failed");
    assert_eq!(diagnostic.loc, loc(17, 3));
    assert!(diagnostic.notes.is_empty());

    let custom = report(&module, &reports, "failure.1");
    assert_eq!(custom.diagnostic.as_ref().unwrap().message, "2 is not 1");

    // A message never replaces the not-constant error.
    let input = report(&module, &reports, "nonConstant.1");
    assert_eq!(
        input.diagnostic.as_ref().unwrap().message,
        "assertion condition not constant"
    );
    assert_eq!(input.outcome.reason(), Some(Reason::NonConstantInput));
    assert_eq!(notes(input), vec![(loc(23, 21), NoteKind::CouldNotFold)]);
}

#[test]
fn pound_assert_loop_and_recursion() {
    let (module, reports) = assemble_verify_check(POUND_ASSERT);

    let looping = report(&module, &reports, "loop.0");
    assert_eq!(looping.outcome.reason(), Some(Reason::LoopDetected));
    assert_eq!(
        notes(looping),
        vec![
            (loc(31, 3), NoteKind::ConditionAlwaysTrue),
            (loc(31, 3), NoteKind::LoopFound),
            (loc(39, 11), NoteKind::CalledFromHere),
        ]
    );

    let recursion = report(&module, &reports, "recursion.0");
    assert_eq!(recursion.outcome.reason(), Some(Reason::BudgetExceeded));
    let trail = recursion.outcome.trail();
    assert_eq!(trail[0].kind, NoteKind::InstructionLimit(512));
    assert!(trail.len() > 80);
    assert_eq!(trail[trail.len() - 1].loc, loc(49, 11));
}

#[test]
fn pound_assert_top_level_and_integers() {
    let (module, reports) = assemble_verify_check(POUND_ASSERT);

    assert!(report(&module, &reports, "topLevel.0").passed());
    assert!(report(&module, &reports, "topLevel.1").passed());
    assert_eq!(
        notes(report(&module, &reports, "topLevel.2")),
        vec![(loc(84, 7), NoteKind::CouldNotFold)]
    );
    assert_eq!(
        report(&module, &reports, "topLevel.3").outcome.reason(),
        Some(Reason::NonConstantInput)
    );

    for (name, at) in [
        ("overflow.0", loc(106, 27)),
        ("overflow.1", loc(113, 16)),
        ("overflow.2", loc(122, 22)),
    ] {
        let r = report(&module, &reports, name);
        assert_eq!(r.outcome.reason(), Some(Reason::OverflowDetected), "{name}");
        assert_eq!(notes(r), vec![(at, NoteKind::IntegerOverflow)], "{name}");
    }

    for name in [
        "arith.add",
        "arith.sub",
        "arith.mul",
        "arith.div",
        "arith.rem",
        "compare.lt",
        "compare.le",
        "compare.gt",
        "compare.ge",
        "struct.0",
        "struct.1",
        "struct.2",
    ] {
        assert!(report(&module, &reports, name).passed(), "{name}");
    }
}

#[test]
fn rendered_diagnostic_for_infinite_loop() {
    let (module, reports) = assemble_verify_check(POUND_ASSERT);
    let rendered = report(&module, &reports, "loop.0")
        .diagnostic
        .as_ref()
        .unwrap()
        .render("pound_assert.air");
    assert_eq!(
        rendered,
        "pound_assert.air:39:3: error: assertion condition not constant\n\
         pound_assert.air:31:3: note: condition always evaluates to true\n\
         pound_assert.air:31:3: note: control flow loop found\n\
         pound_assert.air:39:11: note: when called from here\n"
    );
}

#[test]
fn passing_program_holds() {
    let (_, reports) = assemble_verify_check(PASSING);
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(AssertionReport::passed));
}

#[test]
fn invalid_program_assembles_but_fails_verification() {
    let module = assemble(INVALID).unwrap();
    let errors = assay_verifier::verify(&module).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        assay_verifier::VerifyError::CallArityMismatch {
            expected: 2,
            found: 1,
            ..
        }
    )));
}

#[test]
fn syntax_error_reports_line() {
    assert_eq!(
        assemble(SYNTAX_ERROR).unwrap_err(),
        AsmError::UnexpectedToken {
            line: 3,
            token: "maybe".to_string()
        }
    );
}

// ---- Roundtrip ----

#[test]
fn roundtrip_all_fixtures() {
    for text in [POUND_ASSERT, PASSING, INVALID] {
        let module = assemble(text).unwrap();
        let canonical = disassemble(&module);
        assert_eq!(assemble(&canonical).unwrap(), module);
        // Canonical text is a fixed point.
        assert_eq!(disassemble(&assemble(&canonical).unwrap()), canonical);
    }
}

#[test]
fn comments_and_indentation_ignored() {
    let tidy = "func @f() {\nbb0:\n  %0 = bool true\n  ret %0\n}\n";
    let messy = "\
; leading comment
func   @f( )   {   ; header
        bb0 :
%0=bool true
            ret %0     ; done

}
";
    assert_eq!(assemble(messy).unwrap(), assemble(tidy).unwrap());
}

#[test]
fn builder_module_roundtrips() {
    let mut module = Module::new();
    let mut b = FunctionBuilder::new("pair");
    let x = b.param();
    let y = b.param();
    b.set_loc(3, 4);
    let t = b.tuple(vec![x, y]);
    let r = b.record(vec![("first", t), ("second", y)]);
    let f = b.extract(r, 0);
    let g = b.extract(f, 1);
    b.ret(g);
    let pair = module.add_function(b.finish());

    let mut b = FunctionBuilder::new("cond");
    let a = b.int(IntType::U32, 7);
    let c = b.int(IntType::U32, 9);
    let r = b.call(pair, vec![a, c]);
    let n = b.convert(r, IntType::I8);
    let m = b.binary(BinaryOp::Xor, n, n);
    let z = b.int(IntType::I8, 0);
    let eq = b.compare(CompareOp::Eq, m, z);
    let neg = b.not(eq);
    b.unsupported("print(\"side effect\")");
    let no = b.not(neg);
    b.ret(no);
    let cond = module.add_function(b.finish());
    module.add_assertion(Assertion {
        condition: cond,
        message: Some("tab\there".into()),
        loc: SourceLoc::new(20, 1),
    });

    let text = disassemble(&module);
    assert_eq!(assemble(&text).unwrap(), module);
}

// ---- Errors ----

#[test]
fn error_value_out_of_order_with_line() {
    let text = "func @f() {\nbb0:\n  %0 = bool true\n  %2 = not %0\n  ret %2\n}\n";
    assert_eq!(
        assemble(text).unwrap_err(),
        AsmError::ValueOutOfOrder {
            line: 4,
            expected: 1,
            found: 2
        }
    );
}

#[test]
fn error_invalid_extract_index() {
    let text = "func @f() {\nbb0:\n  %0 = aggregate ()\n  %1 = extract %0, -1\n  ret %1\n}\n";
    assert!(matches!(
        assemble(text).unwrap_err(),
        AsmError::InvalidNumber { line: 4, .. }
    ));
}

#[test]
fn error_duplicate_record_field() {
    let text = "func @f() {\nbb0:\n  %0 = bool true\n  %1 = aggregate {x: %0, x: %0}\n  ret %0\n}\n";
    assert_eq!(
        assemble(text).unwrap_err(),
        AsmError::DuplicateField {
            line: 4,
            name: "x".to_string()
        }
    );
}

// ---- Properties ----

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn op_strategy() -> impl Strategy<Value = BinaryOp> {
        prop::sample::select(assay_common::instruction::ALL_BINARY_OPS.to_vec())
    }

    fn type_strategy() -> impl Strategy<Value = IntType> {
        (1u32..=64, any::<bool>()).prop_map(|(bits, signed)| IntType::new(bits, signed).unwrap())
    }

    proptest! {
        /// Straight-line builder output survives disassemble → assemble
        /// unchanged, including raw out-of-range literals and locations.
        #[test]
        fn straight_line_roundtrip(
            ty in type_strategy(),
            literals in prop::collection::vec(any::<i64>(), 1..5),
            ops in prop::collection::vec(
                (op_strategy(), any::<prop::sample::Index>(), any::<prop::sample::Index>(), 0u32..200),
                0..10,
            ),
        ) {
            let mut b = FunctionBuilder::new("f");
            let mut values: Vec<ValueId> = literals
                .iter()
                .map(|v| b.int(ty, *v as i128))
                .collect();
            for (op, lhs, rhs, line) in ops {
                b.set_loc(line, 1);
                let l = *lhs.get(&values);
                let r = *rhs.get(&values);
                values.push(b.binary(op, l, r));
            }
            let last = values[values.len() - 1];
            let cmp = b.compare(CompareOp::Ne, last, last);
            b.ret(cmp);

            let mut module = Module::new();
            module.add_function(b.finish());
            let text = disassemble(&module);
            prop_assert_eq!(assemble(&text).unwrap(), module);
        }
    }
}
