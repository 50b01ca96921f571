/// Token types for the ercs lexer.
use crate::ast::Span;

/// A single token produced by the lexer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }

    /// Human readable form used in syntax errors.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::LineBreak => "line break".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", self.lexeme),
        }
    }
}

/// All token variants recognized by the lexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Number,

    // Identifiers
    Ident,
    /// An identifier immediately followed by `(`.
    CallIdent,

    // Keywords
    Def,
    Var,
    If,
    Else,
    For,
    Return,

    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,

    // Boolean
    AndAnd,
    OrOr,
    Not,

    // Bit
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    // Trivia
    Comment,
    LineBreak,

    Eof,
}

/// Coarse grouping of token kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Literal,
    Identifier,
    CallIdentifier,
    Keyword,
    Assignment,
    Arithmetic,
    Boolean,
    Bit,
    Comparison,
    Punctuation,
    Comment,
    LineBreak,
    EndOfInput,
}

impl TokenKind {
    pub fn category(self) -> TokenCategory {
        use TokenKind::*;
        match self {
            Number => TokenCategory::Literal,
            Ident => TokenCategory::Identifier,
            CallIdent => TokenCategory::CallIdentifier,
            Def | Var | If | Else | For | Return => TokenCategory::Keyword,
            Assign | PlusAssign | MinusAssign | StarAssign | SlashAssign => {
                TokenCategory::Assignment
            }
            Plus | Minus | Star | Slash => TokenCategory::Arithmetic,
            AndAnd | OrOr | Not => TokenCategory::Boolean,
            Amp | Pipe | Caret | Shl | Shr => TokenCategory::Bit,
            EqEq | NotEq | Lt | Le | Gt | Ge => TokenCategory::Comparison,
            LParen | RParen | LBracket | RBracket | LBrace | RBrace | Comma | Semicolon => {
                TokenCategory::Punctuation
            }
            Comment => TokenCategory::Comment,
            LineBreak => TokenCategory::LineBreak,
            Eof => TokenCategory::EndOfInput,
        }
    }

    /// Tokens that may split an expression into two operands.
    ///
    /// `!` is boolean but strictly unary, so it is excluded.
    pub fn is_binary_operator(self) -> bool {
        match self.category() {
            TokenCategory::Arithmetic | TokenCategory::Bit | TokenCategory::Comparison => true,
            TokenCategory::Boolean => self != TokenKind::Not,
            _ => false,
        }
    }

    pub fn is_open_bracket(self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)
    }

    pub fn is_close_bracket(self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)
    }

    /// Look up a keyword by its spelling.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "def" => Some(TokenKind::Def),
            "var" => Some(TokenKind::Var),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "for" => Some(TokenKind::For),
            "return" => Some(TokenKind::Return),
            _ => None,
        }
    }
}
