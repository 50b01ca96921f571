/// Lexer and parser connected through a bounded channel.
///
/// The lexer runs on its own scoped thread and blocks once `capacity`
/// tokens are waiting. Tokens arrive in source order and ownership moves to
/// the parser on receipt. When the parser stops early (syntax error) the
/// receiver is dropped, the next send fails and the lexer thread exits.
use std::sync::mpsc;
use std::thread;

use crate::ast::{FunctionDef, Program};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::parser::Parser;

pub fn parse_program_buffered(source: &str, capacity: usize) -> Result<Program, ParseError> {
    let (tx, rx) = mpsc::sync_channel(capacity);
    thread::scope(|scope| {
        scope.spawn(move || {
            for token in Lexer::new(source) {
                if tx.send(token).is_err() {
                    break;
                }
            }
        });
        let functions: Result<Vec<FunctionDef>, ParseError> = Parser::new(rx.into_iter()).collect();
        functions.map(|functions| Program { functions })
    })
}
