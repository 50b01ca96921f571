/// Single-pass pull lexer for ercs source code.
///
/// The lexer is an iterator: it scans exactly one token per `next()` call,
/// so a consumer that stops pulling stops the scan. After the `Eof` token or
/// the first `LexError` the iterator is exhausted.
use crate::ast::Span;
use crate::error::LexError;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            col: 1,
            done: false,
        }
    }

    /// Scan the whole source, including the trailing `Eof` token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(source).collect()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_blanks();

        let sp = self.span();
        let start = self.pos;

        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", sp));
        };

        // A run of newlines and blank lines is one logical break.
        if ch == '\n' {
            while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
                self.advance();
            }
            return Ok(Token::new(TokenKind::LineBreak, "\n", sp));
        }

        if ch == '#' {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
            return Ok(Token::new(
                TokenKind::Comment,
                &self.source[start..self.pos],
                sp,
            ));
        }

        if ch.is_ascii_digit() {
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            return Ok(Token::new(
                TokenKind::Number,
                &self.source[start..self.pos],
                sp,
            ));
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                self.advance();
            }
            let word = &self.source[start..self.pos];
            let kind = match TokenKind::keyword(word) {
                Some(kind) => kind,
                None if self.peek() == Some('(') => TokenKind::CallIdent,
                None => TokenKind::Ident,
            };
            return Ok(Token::new(kind, word, sp));
        }

        // Two-character operators first.
        if let Some(next) = self.peek2() {
            let two = match (ch, next) {
                ('=', '=') => Some(TokenKind::EqEq),
                ('!', '=') => Some(TokenKind::NotEq),
                ('<', '=') => Some(TokenKind::Le),
                ('>', '=') => Some(TokenKind::Ge),
                ('&', '&') => Some(TokenKind::AndAnd),
                ('|', '|') => Some(TokenKind::OrOr),
                ('<', '<') => Some(TokenKind::Shl),
                ('>', '>') => Some(TokenKind::Shr),
                ('+', '=') => Some(TokenKind::PlusAssign),
                ('-', '=') => Some(TokenKind::MinusAssign),
                ('*', '=') => Some(TokenKind::StarAssign),
                ('/', '=') => Some(TokenKind::SlashAssign),
                _ => None,
            };
            if let Some(kind) = two {
                self.advance();
                self.advance();
                return Ok(Token::new(kind, &self.source[start..self.pos], sp));
            }
        }

        let one = match ch {
            '=' => TokenKind::Assign,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '!' => TokenKind::Not,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => {
                return Err(LexError {
                    ch,
                    line: sp.line,
                    col: sp.col,
                })
            }
        };
        self.advance();
        Ok(Token::new(one, &self.source[start..self.pos], sp))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(tok) if tok.kind == TokenKind::Eof => self.done = true,
            Err(_) => self.done = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn function_header() {
        assert_eq!(
            kinds("def main(x, z) {"),
            vec![Def, CallIdent, LParen, Ident, Comma, Ident, RParen, LBrace, Eof]
        );
    }

    #[test]
    fn call_ident_needs_adjacent_paren() {
        assert_eq!(kinds("f(x)"), vec![CallIdent, LParen, Ident, RParen, Eof]);
        assert_eq!(kinds("f (x)"), vec![Ident, LParen, Ident, RParen, Eof]);
    }

    #[test]
    fn maximal_munch() {
        assert_eq!(kinds("a <= b"), vec![Ident, Le, Ident, Eof]);
        assert_eq!(kinds("a < = b"), vec![Ident, Lt, Assign, Ident, Eof]);
        assert_eq!(kinds("x += 1"), vec![Ident, PlusAssign, Number, Eof]);
        assert_eq!(kinds("a<<b>>c"), vec![Ident, Shl, Ident, Shr, Ident, Eof]);
        assert_eq!(kinds("a==b!=c"), vec![Ident, EqEq, Ident, NotEq, Ident, Eof]);
        assert_eq!(kinds("!a && b"), vec![Not, Ident, AndAnd, Ident, Eof]);
    }

    #[test]
    fn line_breaks_collapse() {
        assert_eq!(
            kinds("a\n\n   \n\tb\n"),
            vec![Ident, LineBreak, Ident, LineBreak, Eof]
        );
    }

    #[test]
    fn comments_are_emitted() {
        let tokens = Lexer::tokenize("x # note\ny").unwrap();
        assert_eq!(tokens[1].kind, Comment);
        assert_eq!(tokens[1].lexeme, "# note");
        assert_eq!(tokens[2].kind, LineBreak);
        assert_eq!(tokens[3].span.line, 2);
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let tokens = Lexer::tokenize("var a = 1\n  return a").unwrap();
        let ret = tokens.iter().find(|t| t.kind == Return).unwrap();
        assert_eq!(ret.span, Span { line: 2, col: 3 });
    }

    #[test]
    fn unexpected_character_halts() {
        let mut lexer = Lexer::new("a $ b");
        assert_eq!(lexer.next().unwrap().unwrap().kind, Ident);
        let err = lexer.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            LexError {
                ch: '$',
                line: 1,
                col: 3
            }
        );
        assert!(lexer.next().is_none());
    }

    #[test]
    fn non_ascii_is_rejected() {
        let err = Lexer::tokenize("var é = 1").unwrap_err();
        assert_eq!(err.ch, 'é');
    }
}
