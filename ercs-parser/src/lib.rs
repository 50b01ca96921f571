pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod stream;
pub mod token;

pub use ast::{ArrayInit, AssignOp, AssignTarget, BinOp, Expr, FunctionDef, Program, Span, Stmt, UnaryOp};
pub use error::{LexError, ParseError, SyntaxError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use stream::parse_program_buffered;
pub use token::{Token, TokenCategory, TokenKind};

/// Parse a whole program, pulling tokens from the lexer on demand.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let functions = Parser::new(Lexer::new(source)).collect::<Result<Vec<_>, _>>()?;
    Ok(Program { functions })
}
