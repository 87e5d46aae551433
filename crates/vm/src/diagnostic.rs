//! Evaluation outcomes and the diagnostics rendered from them.

use std::fmt;

use assay_common::SourceLoc;

/// Primary message for every condition that could not be reduced to a
/// constant.
pub const NOT_CONSTANT_MESSAGE: &str = "assertion condition not constant";

/// Primary message for a false condition without a literal message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "assertion failed";

/// Why a condition could not be reduced to a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// An operand depends on a value unknown at compile time.
    NonConstantInput,
    /// A block was re-entered under a guard that cannot change.
    LoopDetected,
    /// The shared instruction budget ran out.
    BudgetExceeded,
    /// An integer result or literal does not fit its type.
    OverflowDetected,
    /// Division or remainder by zero.
    DivisionByZero,
    /// The function contains an operation the evaluator never executes.
    UnsupportedOperation,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reason::NonConstantInput => "non-constant input",
            Reason::LoopDetected => "loop detected",
            Reason::BudgetExceeded => "budget exceeded",
            Reason::OverflowDetected => "overflow detected",
            Reason::DivisionByZero => "division by zero",
            Reason::UnsupportedOperation => "unsupported operation",
        };
        f.write_str(name)
    }
}

/// The fixed set of secondary note texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    ConditionAlwaysTrue,
    LoopFound,
    CalledFromHere,
    InstructionLimit(u32),
    CouldNotFold,
    IntegerOverflow,
    DivisionByZero,
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteKind::ConditionAlwaysTrue => f.write_str("condition always evaluates to true"),
            NoteKind::LoopFound => f.write_str("control flow loop found"),
            NoteKind::CalledFromHere => f.write_str("when called from here"),
            NoteKind::InstructionLimit(limit) => write!(
                f,
                "exceeded instruction limit: {limit} when evaluating the expression at compile time"
            ),
            NoteKind::CouldNotFold => f.write_str("could not fold operation"),
            NoteKind::IntegerOverflow => f.write_str("integer overflow detected"),
            NoteKind::DivisionByZero => f.write_str("division by zero"),
        }
    }
}

/// A secondary note anchored at a source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub loc: SourceLoc,
    pub kind: NoteKind,
}

impl Note {
    pub fn new(loc: SourceLoc, kind: NoteKind) -> Self {
        Self { loc, kind }
    }
}

/// The result of evaluating one assertion condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    ConstantTrue,
    ConstantFalse,
    NotConstant { reason: Reason, trail: Vec<Note> },
}

impl EvaluationOutcome {
    pub fn reason(&self) -> Option<Reason> {
        match self {
            EvaluationOutcome::NotConstant { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn trail(&self) -> &[Note] {
        match self {
            EvaluationOutcome::NotConstant { trail, .. } => trail,
            _ => &[],
        }
    }
}

/// One primary error with its notes, ready for the host's diagnostic
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub loc: SourceLoc,
    pub message: String,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    /// Render compiler-style, one line per message:
    /// `file:line:col: error: ...` followed by `file:line:col: note: ...`.
    pub fn render(&self, file: &str) -> String {
        let mut out = format!("{file}:{}: error: {}\n", self.loc, self.message);
        for note in &self.notes {
            out.push_str(&format!("{file}:{}: note: {}\n", note.loc, note.kind));
        }
        out
    }
}

/// What the driver reports for one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionReport {
    /// Location of the assertion directive.
    pub loc: SourceLoc,
    pub outcome: EvaluationOutcome,
    /// At most one primary diagnostic; `None` when the assertion holds.
    pub diagnostic: Option<Diagnostic>,
}

impl AssertionReport {
    pub fn passed(&self) -> bool {
        self.outcome == EvaluationOutcome::ConstantTrue
    }
}
