//! Error types for the assay assembler.

use thiserror::Error;

/// Errors produced while assembling IR text into a module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// An unrecognized instruction or statement keyword.
    #[error("line {line}: unknown mnemonic '{token}'")]
    UnknownMnemonic { line: usize, token: String },

    /// An unrecognized integer type name.
    #[error("line {line}: unknown type '{token}'")]
    UnknownType { line: usize, token: String },

    /// The line ended before a required operand.
    #[error("line {line}: expected {expected}")]
    MissingArgument { line: usize, expected: &'static str },

    /// A numeric literal could not be parsed or is out of range.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// A `@line:col` location is malformed.
    #[error("line {line}: invalid location '{token}'")]
    InvalidLocation { line: usize, token: String },

    /// A string literal has no closing quote or a bad escape.
    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    /// A character that cannot start any token.
    #[error("line {line}: invalid character '{ch}'")]
    InvalidCharacter { line: usize, ch: char },

    /// A token appeared where it was not expected.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// A value id that does not follow positional numbering.
    #[error("line {line}: expected %{expected}, found %{found}")]
    ValueOutOfOrder { line: usize, expected: u32, found: u32 },

    /// A block header that does not follow `bb0, bb1, ...` order.
    #[error("line {line}: expected bb{expected}, found bb{found}")]
    BlockOutOfOrder { line: usize, expected: u32, found: u32 },

    /// The entry block's parameters differ from the function header's.
    #[error("line {line}: entry block parameters differ from function parameters")]
    EntryParamsMismatch { line: usize },

    /// A reference to a function that is never defined.
    #[error("line {line}: undefined function '@{name}'")]
    UndefinedFunction { line: usize, name: String },

    /// A reference to a global that is never defined.
    #[error("line {line}: undefined global '${name}'")]
    UndefinedGlobal { line: usize, name: String },

    /// A second definition of the same function name.
    #[error("line {line}: duplicate function '@{name}'")]
    DuplicateFunction { line: usize, name: String },

    /// A second definition of the same global name.
    #[error("line {line}: duplicate global '${name}'")]
    DuplicateGlobal { line: usize, name: String },

    /// A value-producing instruction without `%N =`.
    #[error("line {line}: {mnemonic} must define a value")]
    MissingResult { line: usize, mnemonic: &'static str },

    /// A terminator with `%N =`.
    #[error("line {line}: {mnemonic} cannot define a value")]
    UnexpectedResult { line: usize, mnemonic: &'static str },

    /// A global initializer that does not fit its type.
    #[error("line {line}: literal {value} does not fit {ty}")]
    LiteralOutOfRange { line: usize, value: i128, ty: String },

    /// A record literal names the same field twice.
    #[error("line {line}: duplicate field name '{name}'")]
    DuplicateField { line: usize, name: String },

    /// An instruction or block header outside a function body.
    #[error("line {line}: statement outside a function")]
    OutsideFunction { line: usize },

    /// An instruction before the first block header.
    #[error("line {line}: instruction outside a block")]
    OutsideBlock { line: usize },

    /// A module-level statement inside a function body.
    #[error("line {line}: unexpected statement inside function '@{function}'")]
    InsideFunction { line: usize, function: String },

    /// End of input inside a function body.
    #[error("line {line}: function '@{name}' is never closed")]
    UnclosedFunction { line: usize, name: String },
}
