use thiserror::Error;

/// A character that matches no lexical rule. Scanning stops here.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unexpected character `{ch}` at line {line}, col {col}")]
pub struct LexError {
    pub ch: char,
    pub line: usize,
    pub col: usize,
}

/// A malformed construct. Parsing of the whole program stops here.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("syntax error at line {line}, col {col}: expected {expected}, got {got}")]
pub struct SyntaxError {
    pub expected: String,
    pub got: String,
    pub line: usize,
    pub col: usize,
}

impl SyntaxError {
    pub fn new(expected: impl Into<String>, got: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            expected: expected.into(),
            got: got.into(),
            line,
            col,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lex(e) => e.line,
            ParseError::Syntax(e) => e.line,
        }
    }
}
