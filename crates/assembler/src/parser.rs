//! Parser for assay IR tokens → module.
//!
//! Works line by line over pre-tokenized input. Function and global names
//! are collected in a first pass so that bodies may reference items defined
//! further down the file.

use std::collections::HashMap;

use crate::error::AsmError;
use crate::lexer::Token;
use assay_common::instruction::{ALL_BINARY_OPS, ALL_COMPARE_OPS};
use assay_common::{
    Aggregate, Assertion, BasicBlock, BinaryOp, Binding, BlockId, BranchTarget, CompareOp,
    Function, FunctionId, Global, GlobalId, Instruction, InstructionKind, IntType, Module,
    SourceLoc, Value, ValueId,
};

/// Function and global ids, assigned in definition order.
#[derive(Debug, Default)]
pub(crate) struct Symbols {
    functions: HashMap<String, FunctionId>,
    globals: HashMap<String, GlobalId>,
}

/// First pass: assign an id to every `func @name` and `global $name`
/// definition, rejecting duplicates.
pub(crate) fn collect_symbols(lines: &[Vec<Token>]) -> Result<Symbols, AsmError> {
    let mut symbols = Symbols::default();

    for (idx, tokens) in lines.iter().enumerate() {
        let line = idx + 1;
        match tokens.as_slice() {
            [Token::Ident(kw), Token::Function(name), ..] if kw == "func" => {
                let id = FunctionId(symbols.functions.len() as u32);
                if symbols.functions.insert(name.clone(), id).is_some() {
                    return Err(AsmError::DuplicateFunction {
                        line,
                        name: name.clone(),
                    });
                }
            }
            [Token::Ident(kw), Token::Global(name), ..] if kw == "global" => {
                let id = GlobalId(symbols.globals.len() as u32);
                if symbols.globals.insert(name.clone(), id).is_some() {
                    return Err(AsmError::DuplicateGlobal {
                        line,
                        name: name.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(symbols)
}

/// A function whose closing `}` has not been seen yet.
struct OpenFunction {
    name: String,
    line: usize,
    params: Vec<ValueId>,
    blocks: Vec<BasicBlock>,
    next_value: u32,
}

impl OpenFunction {
    /// Check that `value` takes the next positional id.
    fn define(&mut self, value: ValueId, line: usize) -> Result<(), AsmError> {
        if value.0 != self.next_value {
            return Err(AsmError::ValueOutOfOrder {
                line,
                expected: self.next_value,
                found: value.0,
            });
        }
        self.next_value += 1;
        Ok(())
    }
}

/// Second pass: builds the module one line at a time.
pub(crate) struct ModuleParser {
    symbols: Symbols,
    module: Module,
    current: Option<OpenFunction>,
}

impl ModuleParser {
    pub(crate) fn new(symbols: Symbols) -> Self {
        Self {
            symbols,
            module: Module::new(),
            current: None,
        }
    }

    /// Parse one tokenized line. Blank lines are ignored.
    pub(crate) fn parse_line(&mut self, tokens: &[Token], line: usize) -> Result<(), AsmError> {
        if tokens.is_empty() {
            return Ok(());
        }
        let mut cursor = Cursor::new(tokens, line);

        if let Some(open) = &self.current {
            return match &tokens[0] {
                Token::Punct('}') => {
                    cursor.pos += 1;
                    cursor.end()?;
                    self.close_function();
                    Ok(())
                }
                Token::Block(_) => self.parse_block_header(&mut cursor),
                Token::Ident(kw) if matches!(kw.as_str(), "func" | "global" | "assert") => {
                    Err(AsmError::InsideFunction {
                        line,
                        function: open.name.clone(),
                    })
                }
                _ => self.parse_instruction(&mut cursor),
            };
        }

        match &tokens[0] {
            Token::Ident(kw) => match kw.as_str() {
                "func" => self.parse_function_header(&mut cursor),
                "global" => self.parse_global(&mut cursor),
                "assert" => self.parse_assertion(&mut cursor),
                _ if is_instruction_mnemonic(kw) => Err(AsmError::OutsideFunction { line }),
                _ => Err(AsmError::UnknownMnemonic {
                    line,
                    token: kw.clone(),
                }),
            },
            Token::Value(_) | Token::Block(_) | Token::Punct('}') => {
                Err(AsmError::OutsideFunction { line })
            }
            other => Err(cursor.unexpected(other)),
        }
    }

    /// Finish parsing, rejecting a function left open at end of input.
    pub(crate) fn finish(self) -> Result<Module, AsmError> {
        if let Some(open) = self.current {
            return Err(AsmError::UnclosedFunction {
                line: open.line,
                name: open.name,
            });
        }
        Ok(self.module)
    }

    fn close_function(&mut self) {
        if let Some(open) = self.current.take() {
            self.module.add_function(Function::new(open.name, open.blocks));
        }
    }

    fn open(&mut self, line: usize) -> Result<&mut OpenFunction, AsmError> {
        self.current
            .as_mut()
            .ok_or(AsmError::OutsideFunction { line })
    }

    fn function_id(&self, name: &str, line: usize) -> Result<FunctionId, AsmError> {
        self.symbols
            .functions
            .get(name)
            .copied()
            .ok_or_else(|| AsmError::UndefinedFunction {
                line,
                name: name.to_string(),
            })
    }

    fn global_id(&self, name: &str, line: usize) -> Result<GlobalId, AsmError> {
        self.symbols
            .globals
            .get(name)
            .copied()
            .ok_or_else(|| AsmError::UndefinedGlobal {
                line,
                name: name.to_string(),
            })
    }

    /// `func @name(%0, %1) {`
    fn parse_function_header(&mut self, c: &mut Cursor<'_>) -> Result<(), AsmError> {
        c.keyword("func")?;
        let name = c.function()?.to_string();
        c.punct('(')?;
        let params = c.list(')', Cursor::value)?;
        c.punct('{')?;
        c.end()?;

        let mut open = OpenFunction {
            name,
            line: c.line,
            params: Vec::new(),
            blocks: Vec::new(),
            next_value: 0,
        };
        for param in &params {
            open.define(*param, c.line)?;
        }
        open.params = params;
        self.current = Some(open);
        Ok(())
    }

    /// `bbN:` or `bbN(%a, %b):`
    fn parse_block_header(&mut self, c: &mut Cursor<'_>) -> Result<(), AsmError> {
        let line = c.line;
        let block = c.block()?;
        let params = if c.eat('(') {
            c.list(')', Cursor::value)?
        } else {
            Vec::new()
        };
        c.punct(':')?;
        c.end()?;

        let open = self.open(line)?;
        let expected = open.blocks.len() as u32;
        if block.0 != expected {
            return Err(AsmError::BlockOutOfOrder {
                line,
                expected,
                found: block.0,
            });
        }
        if block == BlockId::ENTRY {
            if params != open.params {
                return Err(AsmError::EntryParamsMismatch { line });
            }
        } else {
            for param in &params {
                open.define(*param, line)?;
            }
        }
        open.blocks.push(BasicBlock::new(params, Vec::new()));
        Ok(())
    }

    /// `global $name = <literal> [@l:c]` or `global $name = unknown "why" [@l:c]`
    fn parse_global(&mut self, c: &mut Cursor<'_>) -> Result<(), AsmError> {
        c.keyword("global")?;
        let name = c.global()?.to_string();
        c.punct('=')?;
        let binding = match c.peek() {
            Some(Token::Ident(kw)) if kw == "unknown" => {
                c.pos += 1;
                Binding::Unknown(c.string()?)
            }
            _ => Binding::Known(c.literal()?),
        };
        let loc = c.loc();
        c.end()?;

        self.module.add_global(Global { name, binding, loc });
        Ok(())
    }

    /// `assert @f ["message"] [@l:c]`
    fn parse_assertion(&mut self, c: &mut Cursor<'_>) -> Result<(), AsmError> {
        c.keyword("assert")?;
        let condition = self.function_id(c.function()?, c.line)?;
        let message = match c.peek() {
            Some(Token::Str(_)) => Some(c.string()?),
            _ => None,
        };
        let loc = c.loc();
        c.end()?;

        self.module.add_assertion(Assertion {
            condition,
            message,
            loc,
        });
        Ok(())
    }

    /// `[%N =] mnemonic operands... [@l:c]`
    fn parse_instruction(&mut self, c: &mut Cursor<'_>) -> Result<(), AsmError> {
        let line = c.line;
        let result = match c.peek() {
            Some(Token::Value(_)) => {
                let value = c.value()?;
                c.punct('=')?;
                Some(value)
            }
            _ => None,
        };
        let mnemonic = c.ident("mnemonic")?;

        let kind = match mnemonic {
            "int" => {
                let ty = c.int_type()?;
                let value = c.int()?;
                InstructionKind::IntLiteral { ty, value }
            }
            "bool" => InstructionKind::BoolLiteral(c.bool()?),
            "global" => InstructionKind::Global(self.global_id(c.global()?, line)?),
            "cmp" => {
                let op = c.compare_op()?;
                let (lhs, rhs) = c.value_pair()?;
                InstructionKind::Compare { op, lhs, rhs }
            }
            "convert" => {
                let value = c.value()?;
                c.keyword("to")?;
                let to = c.int_type()?;
                InstructionKind::Convert { value, to }
            }
            "not" => InstructionKind::Not(c.value()?),
            "aggregate" => {
                if c.eat('{') {
                    let fields = c.list('}', |c| {
                        let name = c.ident("field name")?.to_string();
                        c.punct(':')?;
                        Ok((name, c.value()?))
                    })?;
                    let (names, fields): (Vec<String>, Vec<ValueId>) = fields.into_iter().unzip();
                    check_unique(&names, line)?;
                    InstructionKind::Aggregate {
                        fields,
                        names: Some(names),
                    }
                } else {
                    c.punct('(')?;
                    InstructionKind::Aggregate {
                        fields: c.list(')', Cursor::value)?,
                        names: None,
                    }
                }
            }
            "extract" => {
                let aggregate = c.value()?;
                c.punct(',')?;
                InstructionKind::Extract {
                    aggregate,
                    index: c.index()?,
                }
            }
            "call" => {
                let callee = self.function_id(c.function()?, line)?;
                c.punct('(')?;
                InstructionKind::Call {
                    callee,
                    args: c.list(')', Cursor::value)?,
                }
            }
            "unknown" => InstructionKind::Unknown {
                description: c.string()?,
            },
            "unsupported" => InstructionKind::Unsupported {
                description: c.string()?,
            },
            "br" => InstructionKind::Branch(c.target()?),
            "cond_br" => {
                let cond = c.value()?;
                c.punct(',')?;
                let then_target = c.target()?;
                c.punct(',')?;
                let else_target = c.target()?;
                InstructionKind::CondBranch {
                    cond,
                    then_target,
                    else_target,
                }
            }
            "ret" => InstructionKind::Return(c.value()?),
            other => match binary_op(other) {
                Some(op) => {
                    let (lhs, rhs) = c.value_pair()?;
                    InstructionKind::Binary { op, lhs, rhs }
                }
                None => {
                    return Err(AsmError::UnknownMnemonic {
                        line,
                        token: other.to_string(),
                    })
                }
            },
        };
        let loc = c.loc();
        c.end()?;

        match result {
            None if kind.requires_result() => {
                return Err(AsmError::MissingResult {
                    line,
                    mnemonic: kind.mnemonic(),
                })
            }
            Some(_) if kind.is_terminator() => {
                return Err(AsmError::UnexpectedResult {
                    line,
                    mnemonic: kind.mnemonic(),
                })
            }
            _ => {}
        }

        let open = self.open(line)?;
        if open.blocks.is_empty() {
            return Err(AsmError::OutsideBlock { line });
        }
        if let Some(value) = result {
            open.define(value, line)?;
        }
        if let Some(block) = open.blocks.last_mut() {
            block
                .instructions
                .push(Instruction::new(result, kind, loc));
        }
        Ok(())
    }
}

fn binary_op(mnemonic: &str) -> Option<BinaryOp> {
    ALL_BINARY_OPS
        .iter()
        .find(|op| op.mnemonic() == mnemonic)
        .copied()
}

fn is_instruction_mnemonic(word: &str) -> bool {
    binary_op(word).is_some()
        || matches!(
            word,
            "int"
                | "bool"
                | "cmp"
                | "convert"
                | "not"
                | "aggregate"
                | "extract"
                | "call"
                | "unknown"
                | "unsupported"
                | "br"
                | "cond_br"
                | "ret"
        )
}

fn check_unique(names: &[String], line: usize) -> Result<(), AsmError> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(AsmError::DuplicateField {
                line,
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn punct_name(c: char) -> &'static str {
    match c {
        '=' => "'='",
        ',' => "','",
        '(' => "'('",
        ')' => "')'",
        '{' => "'{'",
        '}' => "'}'",
        ':' => "':'",
        _ => "punctuation",
    }
}

/// Position within one line's tokens.
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    line: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token], line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &'static str) -> Result<&'t Token, AsmError> {
        let token = self.peek().ok_or(AsmError::MissingArgument {
            line: self.line,
            expected,
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn unexpected(&self, token: &Token) -> AsmError {
        AsmError::UnexpectedToken {
            line: self.line,
            token: token.text(),
        }
    }

    /// No tokens may remain on the line.
    fn end(&self) -> Result<(), AsmError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.unexpected(token)),
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn punct(&mut self, c: char) -> Result<(), AsmError> {
        match self.next(punct_name(c))? {
            Token::Punct(p) if *p == c => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<&'t str, AsmError> {
        match self.next(expected)? {
            Token::Ident(s) => Ok(s.as_str()),
            other => Err(self.unexpected(other)),
        }
    }

    fn keyword(&mut self, kw: &'static str) -> Result<(), AsmError> {
        match self.next(kw)? {
            Token::Ident(s) if s == kw => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    fn value(&mut self) -> Result<ValueId, AsmError> {
        match self.next("value")? {
            Token::Value(n) => Ok(ValueId(*n)),
            other => Err(self.unexpected(other)),
        }
    }

    /// `%a, %b`
    fn value_pair(&mut self) -> Result<(ValueId, ValueId), AsmError> {
        let lhs = self.value()?;
        self.punct(',')?;
        Ok((lhs, self.value()?))
    }

    fn block(&mut self) -> Result<BlockId, AsmError> {
        match self.next("block")? {
            Token::Block(n) => Ok(BlockId(*n)),
            other => Err(self.unexpected(other)),
        }
    }

    fn function(&mut self) -> Result<&'t str, AsmError> {
        match self.next("function name")? {
            Token::Function(name) => Ok(name.as_str()),
            other => Err(self.unexpected(other)),
        }
    }

    fn global(&mut self) -> Result<&'t str, AsmError> {
        match self.next("global name")? {
            Token::Global(name) => Ok(name.as_str()),
            other => Err(self.unexpected(other)),
        }
    }

    fn int(&mut self) -> Result<i128, AsmError> {
        match self.next("integer")? {
            Token::Int(n) => Ok(*n),
            other => Err(self.unexpected(other)),
        }
    }

    fn index(&mut self) -> Result<u32, AsmError> {
        let n = self.int()?;
        u32::try_from(n).map_err(|_| AsmError::InvalidNumber {
            line: self.line,
            token: n.to_string(),
        })
    }

    fn string(&mut self) -> Result<String, AsmError> {
        match self.next("string")? {
            Token::Str(s) => Ok(s.clone()),
            other => Err(self.unexpected(other)),
        }
    }

    fn bool(&mut self) -> Result<bool, AsmError> {
        match self.ident("true or false")? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(AsmError::UnexpectedToken {
                line: self.line,
                token: other.to_string(),
            }),
        }
    }

    fn int_type(&mut self) -> Result<IntType, AsmError> {
        let name = self.ident("type")?;
        IntType::from_name(name).ok_or_else(|| AsmError::UnknownType {
            line: self.line,
            token: name.to_string(),
        })
    }

    fn compare_op(&mut self) -> Result<CompareOp, AsmError> {
        let name = self.ident("comparison")?;
        ALL_COMPARE_OPS
            .iter()
            .find(|op| op.mnemonic() == name)
            .copied()
            .ok_or_else(|| AsmError::UnknownMnemonic {
                line: self.line,
                token: name.to_string(),
            })
    }

    /// Trailing `@line:col`, or unknown when absent.
    fn loc(&mut self) -> SourceLoc {
        match self.peek() {
            Some(Token::Loc(line, column)) => {
                self.pos += 1;
                SourceLoc::new(*line, *column)
            }
            _ => SourceLoc::UNKNOWN,
        }
    }

    /// Comma-separated items up to `close`. The opening bracket has
    /// already been consumed.
    fn list<T>(
        &mut self,
        close: char,
        mut item: impl FnMut(&mut Self) -> Result<T, AsmError>,
    ) -> Result<Vec<T>, AsmError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            if self.eat(close) {
                return Ok(items);
            }
            self.punct(',')?;
        }
    }

    /// `bbN` or `bbN(%a, ...)`
    fn target(&mut self) -> Result<BranchTarget, AsmError> {
        let block = self.block()?;
        let args = if self.eat('(') {
            self.list(')', Cursor::value)?
        } else {
            Vec::new()
        };
        Ok(BranchTarget::new(block, args))
    }

    /// A constant: `int <type> <n>`, `bool <b>`, `(lit, ...)` or
    /// `{name: lit, ...}`.
    fn literal(&mut self) -> Result<Value, AsmError> {
        if self.eat('(') {
            let fields = self.list(')', Cursor::literal)?;
            return Ok(Value::Aggregate(Aggregate::tuple(fields)));
        }
        if self.eat('{') {
            let fields = self.list('}', |c| {
                let name = c.ident("field name")?.to_string();
                c.punct(':')?;
                Ok((name, c.literal()?))
            })?;
            let names: Vec<String> = fields.iter().map(|(name, _)| name.clone()).collect();
            check_unique(&names, self.line)?;
            return Ok(Value::Aggregate(Aggregate::record(fields)));
        }
        match self.ident("literal")? {
            "int" => {
                let ty = self.int_type()?;
                let value = self.int()?;
                Value::int(ty, value).map_err(|_| AsmError::LiteralOutOfRange {
                    line: self.line,
                    value,
                    ty: ty.to_string(),
                })
            }
            "bool" => Ok(Value::Bool(self.bool()?)),
            other => Err(AsmError::UnknownMnemonic {
                line: self.line,
                token: other.to_string(),
            }),
        }
    }
}
