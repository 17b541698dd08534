//! Recursive-descent parser with buffered backtracking.
//!
//! Each grammar procedure notes
//! its entry cursor, tries an alternative, and rewinds on a *soft*
//! mismatch (one that hasn't consumed an unambiguous prefix yet). Once a
//! production has consumed enough to be unambiguous — e.g. the `{` that
//! opens a function body — further mismatches are fatal parse errors,
//! not backtracking signals.

use cminusc_lex::{Lexer, Token, TokenKind};
use cminusc_util::Span;

use crate::ast::*;
use crate::buffer::TokenBuffer;
use crate::error::{ParseError, ParseResult};

/// Internal result of attempting the `function` alternative at the top
/// level: either it parsed, or it turned out not to look like a function
/// at all (so the caller should rewind and fall back to `declaration`),
/// or it committed to being a function and then hit a real syntax error.
enum FunctionAttempt {
    NotAFunction,
    Fatal(ParseError),
}

impl From<ParseError> for FunctionAttempt {
    fn from(e: ParseError) -> Self {
        FunctionAttempt::Fatal(e)
    }
}

pub struct Parser<'a> {
    buf: TokenBuffer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            buf: TokenBuffer::new(Lexer::new(source)),
        }
    }

    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut items = Vec::new();
        loop {
            let tok = self.current()?;
            if tok.is_eof() {
                break;
            }

            let mark = self.buf.mark();
            match self.try_parse_function() {
                Ok(def) => {
                    items.push(Item::FunctionDef(def));
                    continue;
                }
                Err(FunctionAttempt::Fatal(e)) => return Err(e),
                Err(FunctionAttempt::NotAFunction) => {
                    self.buf.rewind(mark);
                }
            }

            let item = self.parse_declaration()?;
            self.expect_kind(&TokenKind::Semicolon, ";", "declaration")?;
            items.push(item);
        }
        Ok(Program { items })
    }

    // ---- token-buffer plumbing ----------------------------------------

    fn current(&mut self) -> ParseResult<Token> {
        Ok(self.buf.current()?)
    }

    fn advance(&mut self) -> ParseResult<()> {
        Ok(self.buf.advance()?)
    }

    /// Consume the current token iff its kind matches `pred`, returning it.
    fn accept(&mut self, pred: impl Fn(&TokenKind) -> bool) -> ParseResult<Option<Token>> {
        let tok = self.current()?;
        if pred(&tok.kind) {
            self.advance()?;
            Ok(Some(tok))
        } else {
            Ok(None)
        }
    }

    fn expect_kind(&mut self, want: &TokenKind, expected: &str, context: &str) -> ParseResult<Token> {
        let tok = self.current()?;
        if std::mem::discriminant(&tok.kind) == std::mem::discriminant(want) {
            self.advance()?;
            Ok(tok)
        } else {
            Err(ParseError::Expected {
                expected: expected.to_string(),
                context: context.to_string(),
                span: tok.span,
            })
        }
    }

    fn expect_ident(&mut self, context: &str) -> ParseResult<(String, Span)> {
        let tok = self.current()?;
        match tok.kind {
            TokenKind::Ident(name) => {
                self.advance()?;
                Ok((name, tok.span))
            }
            _ => Err(ParseError::Expected {
                expected: "an identifier".to_string(),
                context: context.to_string(),
                span: tok.span,
            }),
        }
    }

    // ---- type / return-type -------------------------------------------

    fn parse_type(&mut self) -> ParseResult<Option<(Type, Span)>> {
        let tok = self.current()?;
        let ty = match tok.kind {
            TokenKind::Int => Type::Int,
            TokenKind::Float => Type::Float,
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some((ty, tok.span)))
    }

    fn parse_return_type_or_void(&mut self) -> ParseResult<Option<(ReturnType, Span)>> {
        let tok = self.current()?;
        let rt = match tok.kind {
            TokenKind::Int => ReturnType::Int,
            TokenKind::Float => ReturnType::Float,
            TokenKind::Void => ReturnType::Void,
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some((rt, tok.span)))
    }

    /// `param_types ::= 'void' | type IDENT { ',' type IDENT }`
    fn parse_param_types(&mut self) -> ParseResult<Vec<Param>> {
        if self.accept(|k| matches!(k, TokenKind::Void))?.is_some() {
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        loop {
            let (ty, ty_span) = self
                .parse_type()?
                .ok_or_else(|| self.expected_error("a type or 'void'", "parameter list"))?;
            let (name, name_span) = self.expect_ident("parameter declaration")?;
            params.push(Param {
                name,
                ty,
                span: ty_span.to(name_span),
            });
            if self.accept(|k| matches!(k, TokenKind::Comma))?.is_none() {
                break;
            }
        }
        Ok(params)
    }

    fn expected_error(&mut self, expected: &str, context: &str) -> ParseError {
        let span = self.current().map(|t| t.span).unwrap_or(Span::DUMMY);
        ParseError::Expected {
            expected: expected.to_string(),
            context: context.to_string(),
            span,
        }
    }

    // ---- top-level function vs. declaration ----------------------------

    /// Attempts the `function` production. Anything before the body's
    /// opening `{` that doesn't match is reported as `NotAFunction` so the
    /// caller can rewind and retry as a `declaration`; anything after is
    /// a committed, fatal parse error.
    fn try_parse_function(&mut self) -> Result<FunctionDef, FunctionAttempt> {
        let start_span = self.current().map_err(FunctionAttempt::Fatal)?.span;

        let (return_type, _) = match self.parse_return_type_or_void().map_err(FunctionAttempt::Fatal)? {
            Some(rt) => rt,
            None => return Err(FunctionAttempt::NotAFunction),
        };

        let (name, _) = match self.accept(|k| matches!(k, TokenKind::Ident(_))).map_err(FunctionAttempt::Fatal)? {
            Some(tok) => match tok.kind {
                TokenKind::Ident(n) => (n, tok.span),
                _ => unreachable!(),
            },
            None => return Err(FunctionAttempt::NotAFunction),
        };

        if self
            .accept(|k| matches!(k, TokenKind::LParen))
            .map_err(FunctionAttempt::Fatal)?
            .is_none()
        {
            return Err(FunctionAttempt::NotAFunction);
        }

        let params = self.parse_param_types().map_err(FunctionAttempt::Fatal)?;
        self.expect_kind(&TokenKind::RParen, ")", "function parameter list")
            .map_err(FunctionAttempt::Fatal)?;

        if self
            .accept(|k| matches!(k, TokenKind::LBrace))
            .map_err(FunctionAttempt::Fatal)?
            .is_none()
        {
            // No body: this is a function_decl, not a function. Let the
            // caller rewind all the way and reparse as a declaration.
            return Err(FunctionAttempt::NotAFunction);
        }

        // Committed: a real syntax error from here on is fatal.
        let mut locals = Vec::new();
        loop {
            let mark = self.buf.mark();
            match self.parse_type().map_err(FunctionAttempt::Fatal)? {
                Some((ty, ty_span)) => {
                    let (first_name, mut last_span) = self
                        .expect_ident("local variable declaration")
                        .map_err(FunctionAttempt::Fatal)?;
                    let mut names = vec![first_name];
                    while self
                        .accept(|k| matches!(k, TokenKind::Comma))
                        .map_err(FunctionAttempt::Fatal)?
                        .is_some()
                    {
                        let (n, span) = self
                            .expect_ident("local variable declaration")
                            .map_err(FunctionAttempt::Fatal)?;
                        names.push(n);
                        last_span = span;
                    }
                    self.expect_kind(&TokenKind::Semicolon, ";", "local variable declaration")
                        .map_err(FunctionAttempt::Fatal)?;
                    locals.push(VarDeclGroup {
                        ty,
                        names,
                        span: ty_span.to(last_span),
                    });
                }
                None => {
                    self.buf.rewind(mark);
                    break;
                }
            }
        }

        let mut body = Vec::new();
        while self.accept(|k| matches!(k, TokenKind::RBrace)).map_err(FunctionAttempt::Fatal)?.is_none() {
            let stmt = self.parse_statement().map_err(FunctionAttempt::Fatal)?;
            body.push(stmt);
        }

        let end_span = self.current().map_err(FunctionAttempt::Fatal)?.span;
        Ok(FunctionDef {
            name,
            return_type,
            params,
            locals,
            body,
            span: start_span.to(end_span),
        })
    }

    /// `declaration ::= function_decl | var_decl_list`
    fn parse_declaration(&mut self) -> ParseResult<Item> {
        let start = self.current()?;

        if matches!(start.kind, TokenKind::Void) {
            return Ok(Item::FunctionDecl(self.parse_function_decl_group()?));
        }

        let (ty, ty_span) = self
            .parse_type()?
            .ok_or_else(|| self.expected_error("a type or 'void'", "declaration"))?;
        let (first_name, name_span) = self.expect_ident("declaration")?;

        if self.accept(|k| matches!(k, TokenKind::LParen))?.is_some() {
            let params = self.parse_param_types()?;
            self.expect_kind(&TokenKind::RParen, ")", "function parameter list")?;
            let return_type = match ty {
                Type::Int => ReturnType::Int,
                Type::Float => ReturnType::Float,
            };
            let mut sigs = vec![FunctionSig {
                name: first_name,
                params,
                span: name_span.to(name_span),
            }];
            self.parse_function_decl_tail(&mut sigs)?;
            return Ok(Item::FunctionDecl(FunctionDeclGroup {
                return_type,
                sigs,
                span: ty_span,
            }));
        }

        let mut names = vec![first_name];
        let mut last_span = name_span;
        while self.accept(|k| matches!(k, TokenKind::Comma))?.is_some() {
            let (n, span) = self.expect_ident("variable declaration")?;
            names.push(n);
            last_span = span;
        }
        Ok(Item::VarDecl(VarDeclGroup {
            ty,
            names,
            span: ty_span.to(last_span),
        }))
    }

    /// `(type | 'void') IDENT '(' param_types ')' { ',' IDENT '(' param_types ')' }`
    /// for the case where the leading `'void'` keyword was seen.
    fn parse_function_decl_group(&mut self) -> ParseResult<FunctionDeclGroup> {
        let void_tok = self.expect_kind(&TokenKind::Void, "'void'", "function declaration")?;
        let (name, name_span) = self.expect_ident("function declaration")?;
        self.expect_kind(&TokenKind::LParen, "(", "function declaration")?;
        let params = self.parse_param_types()?;
        self.expect_kind(&TokenKind::RParen, ")", "function parameter list")?;
        let mut sigs = vec![FunctionSig {
            name,
            params,
            span: name_span,
        }];
        self.parse_function_decl_tail(&mut sigs)?;
        Ok(FunctionDeclGroup {
            return_type: ReturnType::Void,
            sigs,
            span: void_tok.span,
        })
    }

    fn parse_function_decl_tail(&mut self, sigs: &mut Vec<FunctionSig>) -> ParseResult<()> {
        while self.accept(|k| matches!(k, TokenKind::Comma))?.is_some() {
            let (name, name_span) = self.expect_ident("function declaration")?;
            self.expect_kind(&TokenKind::LParen, "(", "function declaration")?;
            let params = self.parse_param_types()?;
            self.expect_kind(&TokenKind::RParen, ")", "function parameter list")?;
            sigs.push(FunctionSig {
                name,
                params,
                span: name_span,
            });
        }
        Ok(())
    }

    // ---- statements ------------------------------------------------------

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let tok = self.current()?;
        match tok.kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Read => self.parse_read(),
            TokenKind::Write => self.parse_write(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Stmt::Empty)
            }
            TokenKind::Ident(_) => self.parse_ident_led_statement(),
            _ => Err(ParseError::ExpectedStatement { span: tok.span }),
        }
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_kind(&TokenKind::If, "'if'", "if statement")?;
        self.expect_kind(&TokenKind::LParen, "(", "if condition")?;
        let cond = self.parse_expr()?;
        self.expect_kind(&TokenKind::RParen, ")", "if condition")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.accept(|k| matches!(k, TokenKind::Else))?.is_some() {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            span: start.span,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_kind(&TokenKind::While, "'while'", "while statement")?;
        self.expect_kind(&TokenKind::LParen, "(", "while condition")?;
        let cond = self.parse_expr()?;
        self.expect_kind(&TokenKind::RParen, ")", "while condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While {
            cond,
            body,
            span: start.span,
        })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_kind(&TokenKind::Return, "'return'", "return statement")?;
        let value = if matches!(self.current()?.kind, TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_kind(&TokenKind::Semicolon, ";", "return statement")?;
        Ok(Stmt::Return {
            value,
            span: start.span,
        })
    }

    fn parse_read(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_kind(&TokenKind::Read, "'read'", "read statement")?;
        self.expect_kind(&TokenKind::LParen, "(", "read statement")?;
        let (name, _) = self.expect_ident("read statement")?;
        self.expect_kind(&TokenKind::RParen, ")", "read statement")?;
        self.expect_kind(&TokenKind::Semicolon, ";", "read statement")?;
        Ok(Stmt::Read {
            name,
            span: start.span,
        })
    }

    fn parse_write(&mut self) -> ParseResult<Stmt> {
        let start = self.expect_kind(&TokenKind::Write, "'write'", "write statement")?;
        self.expect_kind(&TokenKind::LParen, "(", "write statement")?;
        let tok = self.current()?;
        let arg = if let TokenKind::StringLiteral(s) = tok.kind {
            self.advance()?;
            WriteArg::Str(s)
        } else {
            WriteArg::Expr(self.parse_expr()?)
        };
        self.expect_kind(&TokenKind::RParen, ")", "write statement")?;
        self.expect_kind(&TokenKind::Semicolon, ";", "write statement")?;
        Ok(Stmt::Write {
            arg,
            span: start.span,
        })
    }

    fn parse_block(&mut self) -> ParseResult<Stmt> {
        self.expect_kind(&TokenKind::LBrace, "{", "block")?;
        let mut stmts = Vec::new();
        while self.accept(|k| matches!(k, TokenKind::RBrace))?.is_none() {
            stmts.push(self.parse_statement()?);
        }
        Ok(Stmt::Block(stmts))
    }

    /// `IDENT '(' [ expr { ',' expr } ] ')' ';'` (call) or `IDENT '=' expr ';'` (assignment).
    fn parse_ident_led_statement(&mut self) -> ParseResult<Stmt> {
        let (name, span) = self.expect_ident("statement")?;
        let tok = self.current()?;
        match tok.kind {
            TokenKind::LParen => {
                self.advance()?;
                let args = self.parse_call_args()?;
                self.expect_kind(&TokenKind::RParen, ")", "function call")?;
                self.expect_kind(&TokenKind::Semicolon, ";", "function call statement")?;
                Ok(Stmt::CallStmt { name, args, span })
            }
            TokenKind::Assign => {
                self.advance()?;
                let value = self.parse_expr()?;
                self.expect_kind(&TokenKind::Semicolon, ";", "assignment")?;
                Ok(Stmt::Assignment { name, value, span })
            }
            _ => Err(ParseError::Expected {
                expected: "'(' or '='".to_string(),
                context: format!("identifier '{name}'"),
                span: tok.span,
            }),
        }
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if matches!(self.current()?.kind, TokenKind::RParen) {
            return Ok(args);
        }
        args.push(self.parse_expr()?);
        while self.accept(|k| matches!(k, TokenKind::Comma))?.is_some() {
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    // ---- expressions -------------------------------------------------

    /// Right-recursive by design: no operator precedence is
    /// modelled. `a + b * c` associates as `a + (b * c)` only because that
    /// is the order the tokens are consumed in, not because of any
    /// precedence table.
    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let tok = self.current()?;
        match tok.kind {
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?.parenthesise();
                self.expect_kind(&TokenKind::RParen, ")", "parenthesised expression")?;
                self.parse_optional_binop_tail(inner)
            }
            TokenKind::Minus => {
                self.advance()?;
                let operand = self.parse_expr()?;
                let span = tok.span.to(operand.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::Not => {
                self.advance()?;
                let operand = self.parse_expr()?;
                let span = tok.span.to(operand.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::IntLiteral(text) => {
                self.advance()?;
                let lit = Expr::new(ExprKind::IntLiteral(text), tok.span);
                self.parse_optional_binop_tail(lit)
            }
            TokenKind::FloatLiteral(text) => {
                self.advance()?;
                let lit = Expr::new(ExprKind::FloatLiteral(text), tok.span);
                self.parse_optional_binop_tail(lit)
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                let head = if self.accept(|k| matches!(k, TokenKind::LParen))?.is_some() {
                    let args = self.parse_call_args()?;
                    self.expect_kind(&TokenKind::RParen, ")", "function call expression")?;
                    Expr::new(ExprKind::Call { name, args }, tok.span)
                } else {
                    Expr::new(ExprKind::Variable(name), tok.span)
                };
                self.parse_optional_binop_tail(head)
            }
            _ => Err(ParseError::ExpectedExpression { span: tok.span }),
        }
    }

    fn parse_optional_binop_tail(&mut self, lhs: Expr) -> ParseResult<Expr> {
        match self.try_binop()? {
            Some(op) => {
                let rhs = self.parse_expr()?;
                let span = lhs.span.to(rhs.span);
                Ok(Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    },
                    span,
                ))
            }
            None => Ok(lhs),
        }
    }

    fn try_binop(&mut self) -> ParseResult<Option<BinOp>> {
        let tok = self.current()?;
        let op = match tok.kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::Ne,
            TokenKind::Less => BinOp::Lt,
            TokenKind::LessEq => BinOp::Le,
            TokenKind::Greater => BinOp::Gt,
            TokenKind::GreaterEq => BinOp::Ge,
            TokenKind::AndAnd => BinOp::And,
            TokenKind::OrOr => BinOp::Or,
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(op))
    }
}
