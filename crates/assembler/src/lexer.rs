//! Tokenizer for assay IR text.

use crate::error::AsmError;

/// A single token from an IR line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A bare word: mnemonic, type name, keyword or field name.
    Ident(String),
    /// `%N`
    Value(u32),
    /// `bbN`
    Block(u32),
    /// `@name`
    Function(String),
    /// `$name`
    Global(String),
    /// `@line:col`
    Loc(u32, u32),
    /// A signed decimal literal.
    Int(i128),
    /// A double-quoted string with `\"`, `\\`, `\n` and `\t` escapes.
    Str(String),
    /// One of `= , ( ) { } :`.
    Punct(char),
}

impl Token {
    /// Source-like rendering for error messages.
    pub(crate) fn text(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Value(n) => format!("%{n}"),
            Token::Block(n) => format!("bb{n}"),
            Token::Function(s) => format!("@{s}"),
            Token::Global(s) => format!("${s}"),
            Token::Loc(l, c) => format!("@{l}:{c}"),
            Token::Int(n) => n.to_string(),
            Token::Str(s) => format!("{s:?}"),
            Token::Punct(c) => c.to_string(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Tokenize a single line of IR text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `;` outside a string and extend to end of line.
pub(crate) fn tokenize_line(line: &str, line_num: usize) -> Result<Vec<Token>, AsmError> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let word = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && is_name_char(chars[end]) {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            ';' => break,
            c if c.is_whitespace() => i += 1,
            '=' | ',' | '(' | ')' | '{' | '}' | ':' => {
                tokens.push(Token::Punct(c));
                i += 1;
            }
            '"' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(AsmError::UnterminatedString { line: line_num }),
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = match chars.get(i + 1) {
                                Some('n') => '\n',
                                Some('t') => '\t',
                                Some('"') => '"',
                                Some('\\') => '\\',
                                _ => return Err(AsmError::UnterminatedString { line: line_num }),
                            };
                            text.push(escaped);
                            i += 2;
                        }
                        Some(other) => {
                            text.push(*other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            '%' => {
                let (digits, end) = word(i + 1);
                let id = digits.parse().map_err(|_| AsmError::InvalidNumber {
                    line: line_num,
                    token: format!("%{digits}"),
                })?;
                tokens.push(Token::Value(id));
                i = end;
            }
            '$' => {
                let (name, end) = word(i + 1);
                if name.is_empty() {
                    return Err(AsmError::UnexpectedToken {
                        line: line_num,
                        token: "$".to_string(),
                    });
                }
                tokens.push(Token::Global(name));
                i = end;
            }
            '@' if chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                let (l, end) = word(i + 1);
                if chars.get(end) != Some(&':') {
                    return Err(AsmError::InvalidLocation {
                        line: line_num,
                        token: format!("@{l}"),
                    });
                }
                let (col, end) = word(end + 1);
                let bad = || AsmError::InvalidLocation {
                    line: line_num,
                    token: format!("@{l}:{col}"),
                };
                let line_no = l.parse().map_err(|_| bad())?;
                let col_no = col.parse().map_err(|_| bad())?;
                tokens.push(Token::Loc(line_no, col_no));
                i = end;
            }
            '@' => {
                let (name, end) = word(i + 1);
                if name.is_empty() {
                    return Err(AsmError::UnexpectedToken {
                        line: line_num,
                        token: "@".to_string(),
                    });
                }
                tokens.push(Token::Function(name));
                i = end;
            }
            '-' | '0'..='9' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse().map_err(|_| AsmError::InvalidNumber {
                    line: line_num,
                    token: text.clone(),
                })?;
                tokens.push(Token::Int(value));
            }
            c if is_name_char(c) => {
                let (name, end) = word(i);
                match name.strip_prefix("bb").map(str::parse::<u32>) {
                    Some(Ok(n)) => tokens.push(Token::Block(n)),
                    _ => tokens.push(Token::Ident(name)),
                }
                i = end;
            }
            other => {
                return Err(AsmError::InvalidCharacter {
                    line: line_num,
                    ch: other,
                })
            }
        }
    }

    Ok(tokens)
}
