//! Per-assertion entry points.
//!
//! The driver runs one condition function on a fresh [`Machine`], maps the
//! completion to an [`EvaluationOutcome`] and renders at most one primary
//! diagnostic for it.

use assay_common::{Assertion, FunctionId, Module, Value};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::EvalConfig;
use crate::diagnostic::{
    AssertionReport, Diagnostic, EvaluationOutcome, DEFAULT_FAILURE_MESSAGE, NOT_CONSTANT_MESSAGE,
};
use crate::error::VmError;
use crate::machine::{Completion, Machine};

/// Evaluate a zero-parameter condition function.
pub fn evaluate_condition(
    module: &Module,
    condition: FunctionId,
    config: EvalConfig,
) -> Result<EvaluationOutcome, VmError> {
    let mut machine = Machine::new(module, config);
    match machine.evaluate(condition, Vec::new())? {
        Completion::Returned(Value::Bool(true)) => Ok(EvaluationOutcome::ConstantTrue),
        Completion::Returned(Value::Bool(false)) => Ok(EvaluationOutcome::ConstantFalse),
        Completion::Returned(other) => Err(VmError::ConditionNotBool {
            function: module
                .function(condition)
                .map(|f| f.name.clone())
                .unwrap_or_default(),
            found: other.kind(),
        }),
        Completion::Trapped(trap) => Ok(EvaluationOutcome::NotConstant {
            reason: trap.reason,
            trail: trap.notes,
        }),
    }
}

/// Evaluate one assertion and build its report.
pub fn evaluate_assertion(
    module: &Module,
    assertion: &Assertion,
    config: EvalConfig,
) -> Result<AssertionReport, VmError> {
    let outcome = evaluate_condition(module, assertion.condition, config)?;
    let diagnostic = match &outcome {
        EvaluationOutcome::ConstantTrue => None,
        EvaluationOutcome::ConstantFalse => Some(Diagnostic {
            loc: assertion.loc,
            message: assertion
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            notes: Vec::new(),
        }),
        EvaluationOutcome::NotConstant { trail, .. } => Some(Diagnostic {
            loc: assertion.loc,
            message: NOT_CONSTANT_MESSAGE.to_string(),
            notes: trail.clone(),
        }),
    };
    debug!(
        at = %assertion.loc,
        outcome = ?outcome.reason(),
        passed = diagnostic.is_none(),
        "assertion evaluated"
    );
    Ok(AssertionReport {
        loc: assertion.loc,
        outcome,
        diagnostic,
    })
}

/// Evaluate every assertion of `module` independently.
///
/// Assertions run in parallel; results come back in assertion order. A
/// malformed condition only affects its own entry.
pub fn check_module(module: &Module, config: EvalConfig) -> Vec<Result<AssertionReport, VmError>> {
    let reports: Vec<_> = module
        .assertions
        .par_iter()
        .map(|assertion| evaluate_assertion(module, assertion, config))
        .collect();
    let failed = reports
        .iter()
        .filter(|r| !matches!(r, Ok(report) if report.passed()))
        .count();
    info!(assertions = reports.len(), failed, "module checked");
    reports
}
