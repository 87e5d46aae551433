//! Assay assembler: text form of lowered modules.
//!
//! The text form is line-oriented: one global, header, block label,
//! instruction or assertion per line. Mechanical 1:1 translation, no sugar.
//!
//! # Usage
//!
//! ```
//! use assay_assembler::{assemble, disassemble};
//!
//! let text = "\
//! func @cond() {
//! bb0:
//!   %0 = bool true @1:8
//!   ret %0
//! }
//!
//! assert @cond @1:1
//! ";
//! let module = assemble(text).unwrap();
//! assert_eq!(module.functions.len(), 1);
//! assert_eq!(disassemble(&module), text);
//! ```
//!
//! # Roundtrip Guarantee
//!
//! `assemble(&disassemble(&module)) == Ok(module)` holds for every module
//! whose names are plain identifiers. The disassembler outputs canonical
//! text; the assembler also accepts free indentation, comments and blank
//! lines.

pub mod error;

mod disassembler;
mod lexer;
mod parser;

pub use error::AsmError;

use assay_common::Module;
use lexer::tokenize_line;
use parser::{collect_symbols, ModuleParser};
use tracing::debug;

/// Assemble text into a module.
///
/// Returns the first error encountered. Fix one error at a time.
pub fn assemble(text: &str) -> Result<Module, AsmError> {
    let lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| tokenize_line(line, idx + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let mut parser = ModuleParser::new(collect_symbols(&lines)?);
    for (idx, tokens) in lines.iter().enumerate() {
        parser.parse_line(tokens, idx + 1)?;
    }
    let module = parser.finish()?;

    debug!(
        functions = module.functions.len(),
        globals = module.globals.len(),
        assertions = module.assertions.len(),
        "assembled module"
    );
    Ok(module)
}

/// Disassemble a module into canonical text.
pub fn disassemble(module: &Module) -> String {
    disassembler::disassemble(module)
}
