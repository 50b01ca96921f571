/// Recursive-descent parser for ercs programs.
///
/// Statements are parsed token by token. Expressions are parsed by first
/// collecting the tokens up to the end of the expression, then splitting
/// that slice at the first binary operator found at bracket depth zero and
/// recursing on both halves. Grouping therefore follows token order and
/// there is no precedence table: `a * b + c` is `a * (b + c)` and
/// `10 - 4 - 3` is `10 - (4 - 3)`. Parenthesize to group differently.
///
/// The parser pulls tokens lazily from any token iterator and yields one
/// completed top-level function at a time.
use std::collections::VecDeque;

use crate::ast::{
    ArrayInit, AssignOp, AssignTarget, BinOp, Expr, FunctionDef, Span, Stmt, UnaryOp,
};
use crate::error::{LexError, ParseError, SyntaxError};
use crate::token::{Token, TokenCategory, TokenKind};

pub struct Parser<I> {
    tokens: I,
    lookahead: VecDeque<Token>,
    last_span: Span,
    finished: bool,
}

fn syntax(expected: impl Into<String>, got: &Token) -> SyntaxError {
    SyntaxError::new(expected, got.describe(), got.span.line, got.span.col)
}

fn closer_of(open: TokenKind) -> TokenKind {
    match open {
        TokenKind::LParen => TokenKind::RParen,
        TokenKind::LBracket => TokenKind::RBracket,
        _ => TokenKind::RBrace,
    }
}

fn closer_text(open: TokenKind) -> &'static str {
    match open {
        TokenKind::LParen => "`)`",
        TokenKind::LBracket => "`]`",
        _ => "`}`",
    }
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token, LexError>>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            lookahead: VecDeque::new(),
            last_span: Span { line: 1, col: 1 },
            finished: false,
        }
    }

    // ========================================================================
    // Token access
    // ========================================================================

    /// Make sure at least `n + 1` significant tokens are buffered.
    /// Comments are dropped here.
    fn fill(&mut self, n: usize) -> Result<(), ParseError> {
        while self.lookahead.len() <= n {
            match self.tokens.next() {
                Some(Ok(tok)) if tok.kind == TokenKind::Comment => {}
                Some(Ok(tok)) => {
                    self.last_span = tok.span;
                    self.lookahead.push_back(tok);
                }
                Some(Err(e)) => return Err(e.into()),
                None => self
                    .lookahead
                    .push_back(Token::new(TokenKind::Eof, "", self.last_span)),
            }
        }
        Ok(())
    }

    fn peek_nth(&mut self, n: usize) -> Result<&Token, ParseError> {
        self.fill(n)?;
        Ok(&self.lookahead[n])
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        self.peek_nth(0)
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.peek()?.kind)
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        self.fill(0)?;
        Ok(self
            .lookahead
            .pop_front()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", self.last_span)))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        let tok = self.bump()?;
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(syntax(what, &tok).into())
        }
    }

    fn skip_line_breaks(&mut self) -> Result<(), ParseError> {
        while self.peek_kind()? == TokenKind::LineBreak {
            self.bump()?;
        }
        Ok(())
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Parse the next top-level function, or `None` at end of input.
    pub fn next_function(&mut self) -> Result<Option<FunctionDef>, ParseError> {
        loop {
            match self.peek_kind()? {
                TokenKind::LineBreak | TokenKind::Semicolon => {
                    self.bump()?;
                }
                TokenKind::Eof => return Ok(None),
                TokenKind::Def => return self.parse_function().map(Some),
                _ => {
                    let tok = self.bump()?;
                    return Err(syntax("`def`", &tok).into());
                }
            }
        }
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        let def = self.expect(TokenKind::Def, "`def`")?;
        let name = self.expect(TokenKind::CallIdent, "function name")?;
        let params = self.parse_params()?;
        let body = self.parse_block(true)?;
        Ok(FunctionDef {
            name: name.lexeme,
            params,
            body,
            span: def.span,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        self.skip_line_breaks()?;
        let mut params = Vec::new();
        if self.peek_kind()? == TokenKind::RParen {
            self.bump()?;
            return Ok(params);
        }
        loop {
            let tok = self.bump()?;
            if tok.kind != TokenKind::Ident {
                return Err(syntax("parameter name", &tok).into());
            }
            params.push(tok.lexeme);
            self.skip_line_breaks()?;
            let sep = self.bump()?;
            match sep.kind {
                TokenKind::Comma => self.skip_line_breaks()?,
                TokenKind::RParen => break,
                _ => return Err(syntax("`,` or `)`", &sep).into()),
            }
        }
        Ok(params)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// `{ statements }`. Nested `def` is only accepted when `allow_defs` is
    /// set, i.e. directly in a function body.
    fn parse_block(&mut self, allow_defs: bool) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::LineBreak | TokenKind::Semicolon => {
                    self.bump()?;
                }
                TokenKind::RBrace => {
                    self.bump()?;
                    return Ok(stmts);
                }
                TokenKind::Eof => {
                    let tok = self.bump()?;
                    return Err(syntax("`}`", &tok).into());
                }
                _ => {
                    stmts.push(self.parse_statement(allow_defs)?);
                    let next = self.peek()?;
                    if !matches!(
                        next.kind,
                        TokenKind::LineBreak
                            | TokenKind::Semicolon
                            | TokenKind::RBrace
                            | TokenKind::Eof
                    ) {
                        let next = next.clone();
                        return Err(syntax("end of statement", &next).into());
                    }
                }
            }
        }
    }

    fn parse_statement(&mut self, allow_defs: bool) -> Result<Stmt, ParseError> {
        match self.peek_kind()? {
            TokenKind::Def if allow_defs => Ok(Stmt::Function(self.parse_function()?)),
            TokenKind::Var => self.parse_var(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Ident => self.parse_assignment(),
            TokenKind::CallIdent => {
                let span = self.peek()?.span;
                let expr = self.parse_expr(false)?;
                Ok(Stmt::Expr { expr, span })
            }
            _ => {
                let tok = self.bump()?;
                Err(syntax("statement", &tok).into())
            }
        }
    }

    /// Statements allowed in a `for` header.
    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind()? {
            TokenKind::Var => self.parse_var(),
            TokenKind::Ident => self.parse_assignment(),
            _ => {
                let tok = self.bump()?;
                Err(syntax("declaration or assignment", &tok).into())
            }
        }
    }

    fn parse_var(&mut self) -> Result<Stmt, ParseError> {
        let var = self.expect(TokenKind::Var, "`var`")?;
        let name = self.expect(TokenKind::Ident, "variable name")?.lexeme;

        if self.peek_kind()? == TokenKind::LBracket {
            self.bump()?;
            self.expect(TokenKind::RBracket, "`]`")?;
            self.expect(TokenKind::Assign, "`=`")?;
            let init = if self.peek_kind()? == TokenKind::LBrace {
                self.parse_array_list()?
            } else {
                ArrayInit::Element(self.parse_expr(false)?)
            };
            return Ok(Stmt::ArrayDecl {
                name,
                init,
                span: var.span,
            });
        }

        self.expect(TokenKind::Assign, "`=`")?;
        let value = if self.peek_kind()? == TokenKind::Def {
            let def = self.bump()?;
            let params = self.parse_params()?;
            let body = self.parse_block(true)?;
            Expr::Function(Box::new(FunctionDef {
                name: FunctionDef::anonymous_name(def.span),
                params,
                body,
                span: def.span,
            }))
        } else {
            self.parse_expr(false)?
        };
        Ok(Stmt::VarDecl {
            name,
            value,
            span: var.span,
        })
    }

    fn parse_array_list(&mut self) -> Result<ArrayInit, ParseError> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut items = Vec::new();
        self.skip_line_breaks()?;
        if self.peek_kind()? == TokenKind::RBrace {
            self.bump()?;
            return Ok(ArrayInit::List(items));
        }
        loop {
            self.skip_line_breaks()?;
            if self.peek_kind()? == TokenKind::LBrace {
                items.push(self.parse_array_list()?);
            } else {
                items.push(ArrayInit::Element(self.parse_expr(false)?));
            }
            self.skip_line_breaks()?;
            let sep = self.bump()?;
            match sep.kind {
                TokenKind::Comma => {}
                TokenKind::RBrace => break,
                _ => return Err(syntax("`,` or `}`", &sep).into()),
            }
        }
        Ok(ArrayInit::List(items))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let if_tok = self.expect(TokenKind::If, "`if`")?;
        let condition = self.parse_expr(true)?;
        let then_body = self.parse_block(false)?;

        // `else` may sit on the line after the closing brace.
        let mut n = 0;
        while self.peek_nth(n)?.kind == TokenKind::LineBreak {
            n += 1;
        }
        let else_body = if self.peek_nth(n)?.kind == TokenKind::Else {
            for _ in 0..=n {
                self.bump()?;
            }
            if self.peek_kind()? == TokenKind::If {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block(false)?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
            span: if_tok.span,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let for_tok = self.expect(TokenKind::For, "`for`")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let init = if self.peek_kind()? == TokenKind::Semicolon {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenKind::Semicolon, "`;`")?;
        let condition = self.parse_expr(false)?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        let step = if self.peek_kind()? == TokenKind::RParen {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.parse_block(false)?;
        Ok(Stmt::For {
            init,
            condition,
            step,
            body,
            span: for_tok.span,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let ret = self.expect(TokenKind::Return, "`return`")?;
        let value = match self.peek_kind()? {
            TokenKind::LineBreak | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => {
                None
            }
            _ => Some(self.parse_expr(false)?),
        };
        Ok(Stmt::Return {
            value,
            span: ret.span,
        })
    }

    fn parse_assignment(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect(TokenKind::Ident, "identifier")?;
        let mut indices = Vec::new();
        while self.peek_kind()? == TokenKind::LBracket {
            self.bump()?;
            indices.push(self.parse_expr(false)?);
            self.expect(TokenKind::RBracket, "`]`")?;
        }
        let op_tok = self.bump()?;
        let op = AssignOp::from_token(op_tok.kind)
            .ok_or_else(|| syntax("assignment operator", &op_tok))?;
        let value = self.parse_expr(false)?;
        Ok(Stmt::Assign {
            target: AssignTarget {
                name: name.lexeme,
                indices,
            },
            op,
            value,
            span: op_tok.span,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Collect the tokens of one expression. Stops, without consuming, at a
    /// line break, `;`, `,` or assignment operator at depth zero, at a
    /// closing bracket that was not opened inside the expression, and at
    /// `{` when `stop_at_brace` is set (conditions).
    fn collect_expr(&mut self, stop_at_brace: bool) -> Result<Vec<Token>, ParseError> {
        let mut open: Vec<TokenKind> = Vec::new();
        let mut out = Vec::new();
        loop {
            let tok = self.peek()?.clone();
            let at_top = open.is_empty();
            match tok.kind {
                TokenKind::Eof => {
                    if let Some(&kind) = open.last() {
                        return Err(syntax(closer_text(kind), &tok).into());
                    }
                    break;
                }
                TokenKind::LineBreak if at_top => break,
                TokenKind::LineBreak => {
                    self.bump()?;
                }
                TokenKind::Semicolon | TokenKind::Comma if at_top => break,
                TokenKind::LBrace if at_top && stop_at_brace => break,
                kind if kind.category() == TokenCategory::Assignment && at_top => break,
                TokenKind::Semicolon => {
                    let kind = open.last().copied().unwrap_or(TokenKind::LParen);
                    return Err(syntax(closer_text(kind), &tok).into());
                }
                kind if kind.category() == TokenCategory::Assignment
                    || kind.category() == TokenCategory::Keyword =>
                {
                    return Err(syntax("expression", &tok).into());
                }
                kind if kind.is_open_bracket() => {
                    open.push(kind);
                    out.push(self.bump()?);
                }
                kind if kind.is_close_bracket() => match open.pop() {
                    None => break,
                    Some(opener) if closer_of(opener) == kind => out.push(self.bump()?),
                    Some(opener) => return Err(syntax(closer_text(opener), &tok).into()),
                },
                _ => out.push(self.bump()?),
            }
        }
        Ok(out)
    }

    fn parse_expr(&mut self, stop_at_brace: bool) -> Result<Expr, ParseError> {
        let tokens = self.collect_expr(stop_at_brace)?;
        let after = self.peek()?.clone();
        Ok(parse_slice(&tokens, &after)?)
    }
}

/// Index of the bracket closing the one opened at `open_idx`.
fn find_matching(tokens: &[Token], open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open_idx) {
        if tok.kind.is_open_bracket() {
            depth += 1;
        } else if tok.kind.is_close_bracket() {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Parse a collected, bracket-balanced token slice. `after` is the token
/// that follows the slice and is only used for error reporting.
fn parse_slice(tokens: &[Token], after: &Token) -> Result<Expr, SyntaxError> {
    let Some(first) = tokens.first() else {
        return Err(syntax("expression", after));
    };

    // A leading `-` or `!` is unary over everything that follows.
    let unary = match first.kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Not => Some(UnaryOp::Not),
        _ => None,
    };
    if let Some(op) = unary {
        let operand = parse_slice(&tokens[1..], after)?;
        return Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span: first.span,
        });
    }

    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind.is_open_bracket() {
            depth += 1;
        } else if tok.kind.is_close_bracket() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && i > 0 {
            if let Some(op) = BinOp::from_token(tok.kind) {
                let lhs = parse_slice(&tokens[..i], tok)?;
                let rhs = parse_slice(&tokens[i + 1..], after)?;
                return Ok(Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    span: tok.span,
                });
            }
        }
    }

    parse_atom(tokens, after)
}

fn parse_atom(tokens: &[Token], after: &Token) -> Result<Expr, SyntaxError> {
    let first = &tokens[0];
    match first.kind {
        TokenKind::Number | TokenKind::Ident if tokens.len() == 1 => Ok(match first.kind {
            TokenKind::Number => Expr::Number {
                value: first.lexeme.clone(),
                span: first.span,
            },
            _ => Expr::Ident {
                name: first.lexeme.clone(),
                span: first.span,
            },
        }),
        TokenKind::LParen => {
            let close = find_matching(tokens, 0).ok_or_else(|| syntax("`)`", after))?;
            if close + 1 != tokens.len() {
                return Err(syntax("operator", &tokens[close + 1]));
            }
            parse_slice(&tokens[1..close], &tokens[close])
        }
        TokenKind::Ident if tokens[1].kind == TokenKind::LBracket => {
            let mut indices = Vec::new();
            let mut pos = 1;
            while pos < tokens.len() {
                if tokens[pos].kind != TokenKind::LBracket {
                    return Err(syntax("operator", &tokens[pos]));
                }
                let close = find_matching(tokens, pos).ok_or_else(|| syntax("`]`", after))?;
                indices.push(parse_slice(&tokens[pos + 1..close], &tokens[close])?);
                pos = close + 1;
            }
            Ok(Expr::Index {
                name: first.lexeme.clone(),
                indices,
                span: first.span,
            })
        }
        TokenKind::CallIdent => {
            let open = 1;
            if tokens.get(open).map(|t| t.kind) != Some(TokenKind::LParen) {
                return Err(syntax("`(`", tokens.get(open).unwrap_or(after)));
            }
            let close = find_matching(tokens, open).ok_or_else(|| syntax("`)`", after))?;
            if close + 1 != tokens.len() {
                return Err(syntax("operator", &tokens[close + 1]));
            }
            Ok(Expr::Call {
                name: first.lexeme.clone(),
                args: parse_args(&tokens[open + 1..close], &tokens[close])?,
                span: first.span,
            })
        }
        TokenKind::Number | TokenKind::Ident => Err(syntax("operator", &tokens[1])),
        _ => Err(syntax("expression", first)),
    }
}

/// Split call arguments at depth-zero commas.
fn parse_args(tokens: &[Token], close: &Token) -> Result<Vec<Expr>, SyntaxError> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind.is_open_bracket() {
            depth += 1;
        } else if tok.kind.is_close_bracket() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && tok.kind == TokenKind::Comma {
            args.push(parse_slice(&tokens[start..i], tok)?);
            start = i + 1;
        }
    }
    args.push(parse_slice(&tokens[start..], close)?);
    Ok(args)
}

impl<I> Iterator for Parser<I>
where
    I: Iterator<Item = Result<Token, LexError>>,
{
    type Item = Result<FunctionDef, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_function() {
            Ok(Some(def)) => Some(Ok(def)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_fn(src: &str) -> FunctionDef {
        let mut parser = Parser::new(Lexer::new(src));
        parser.next().unwrap().unwrap()
    }

    fn parse_err(src: &str) -> ParseError {
        Parser::new(Lexer::new(src))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err()
    }

    fn ret_expr(src: &str) -> String {
        let def = parse_fn(&format!("def main(a, b, c) {{\n return {src}\n}}"));
        match &def.body[0] {
            Stmt::Return {
                value: Some(expr), ..
            } => expr.to_string(),
            other => panic!("expected return, got {other:?}"),
        }
    }

    #[test]
    fn function_header_and_params() {
        let def = parse_fn("def main(x, z) { return x }");
        assert_eq!(def.name, "main");
        assert_eq!(def.params, vec!["x", "z"]);
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn grouping_follows_first_operator() {
        assert_eq!(ret_expr("a * b + c"), "(a * (b + c))");
        assert_eq!(ret_expr("10 - 4 - 3"), "(10 - (4 - 3))");
        assert_eq!(ret_expr("(a * b) + c"), "((a * b) + c)");
        assert_eq!(ret_expr("a + b * c"), "(a + (b * c))");
    }

    #[test]
    fn unary_operators() {
        assert_eq!(ret_expr("-a"), "(-a)");
        assert_eq!(ret_expr("a * -b"), "(a * (-b))");
        assert_eq!(ret_expr("-a + b"), "(-(a + b))");
        assert_eq!(ret_expr("!(a == b)"), "(!(a == b))");
    }

    #[test]
    fn calls_and_indices() {
        assert_eq!(ret_expr("f(a, b * c, g(1))"), "f(a, (b * c), g(1))");
        assert_eq!(ret_expr("arr[a + 1][2] * b"), "(arr[(a + 1)][2] * b)");
        assert_eq!(ret_expr("f()"), "f()");
    }

    #[test]
    fn statements() {
        let src = "def main(x) {\n\
                   var a = 1\n\
                   var arr[] = {1, {2, 3}}\n\
                   a += x\n\
                   arr[0] = a\n\
                   equal(a, x)\n\
                   if a == 1 { a = 2 } else if a == 2 { a = 3 } else { a = 4 }\n\
                   for(var i = 0; i < 3; i += 1) { a = a * x }\n\
                   return a\n\
                   }";
        let def = parse_fn(src);
        assert_eq!(def.body.len(), 8);
        assert!(matches!(def.body[0], Stmt::VarDecl { .. }));
        match &def.body[1] {
            Stmt::ArrayDecl {
                init: ArrayInit::List(items),
                ..
            } => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[1], ArrayInit::List(inner) if inner.len() == 2));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            def.body[2],
            Stmt::Assign {
                op: AssignOp::Add,
                ..
            }
        ));
        assert!(matches!(&def.body[3], Stmt::Assign { target, .. } if target.indices.len() == 1));
        assert!(matches!(def.body[4], Stmt::Expr { .. }));
        match &def.body[5] {
            Stmt::If {
                else_body: Some(else_body),
                ..
            } => assert!(matches!(else_body[0], Stmt::If { .. })),
            other => panic!("unexpected {other:?}"),
        }
        match &def.body[6] {
            Stmt::For {
                init: Some(_),
                step: Some(_),
                body,
                ..
            } => assert_eq!(body.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn else_on_next_line() {
        let def = parse_fn("def main(x) {\n if 1 { return 1 }\n else { return 2 }\n}");
        assert!(matches!(
            &def.body[0],
            Stmt::If {
                else_body: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn nested_and_anonymous_functions() {
        let src = "def main(x) {\n\
                   def sq(v) { return v * v }\n\
                   var cube = def(v) { return v * sq(v) }\n\
                   return cube(x)\n\
                   }";
        let def = parse_fn(src);
        assert!(matches!(&def.body[0], Stmt::Function(inner) if inner.name == "sq"));
        match &def.body[1] {
            Stmt::VarDecl {
                value: Expr::Function(anon),
                ..
            } => {
                assert_eq!(anon.params, vec!["v"]);
                assert!(anon.name.starts_with("<anon@"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn comments_are_ignored() {
        let def = parse_fn("# header\ndef main(x) { # trailing\n return x # done\n}");
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn multiple_functions_stream_one_at_a_time() {
        let mut parser = Parser::new(Lexer::new(
            "def a(x) { return x }\n\n def b(y) { return y }",
        ));
        assert_eq!(parser.next().unwrap().unwrap().name, "a");
        assert_eq!(parser.next().unwrap().unwrap().name, "b");
        assert!(parser.next().is_none());
    }

    #[test]
    fn missing_brace_is_syntax_error() {
        match parse_err("def main(x) { return x") {
            ParseError::Syntax(e) => {
                assert_eq!(e.expected, "`}`");
                assert_eq!(e.got, "end of input");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_parameter_name() {
        match parse_err("def main(1) { return 1 }") {
            ParseError::Syntax(e) => {
                assert_eq!(e.expected, "parameter name");
                assert_eq!(e.got, "`1`");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unbalanced_brackets() {
        assert!(matches!(
            parse_err("def main(x) { return (x + 1 }"),
            ParseError::Syntax(_)
        ));
        assert!(matches!(
            parse_err("def main(x) { return x[1) }"),
            ParseError::Syntax(_)
        ));
    }

    #[test]
    fn missing_operand() {
        match parse_err("def main(x) {\n return x +\n}") {
            ParseError::Syntax(e) => {
                assert_eq!(e.expected, "expression");
                assert_eq!(e.line, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn juxtaposed_operands() {
        match parse_err("def main(x) { return x x }") {
            ParseError::Syntax(e) => assert_eq!(e.expected, "operator"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn def_outside_function_body_top_level() {
        assert!(parse_err("def main(x) { if 1 { def f(a) { return a } } }")
            .to_string()
            .contains("expected statement"));
    }

    #[test]
    fn lex_error_surfaces() {
        assert!(matches!(
            parse_err("def main(x) { return x @ 1 }"),
            ParseError::Lex(LexError { ch: '@', .. })
        ));
    }

    #[test]
    fn top_level_must_be_def() {
        match parse_err("var x = 1") {
            ParseError::Syntax(e) => assert_eq!(e.expected, "`def`"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
