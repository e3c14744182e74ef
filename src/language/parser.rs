use crate::language::{
    ast::*,
    errors::SyntaxError,
    lexer::lex,
    span::Span,
    token::{Token, TokenKind},
};

/// Parses a full program of the shape the fragment machine produces:
/// `package main; func main() { ... }`. Fails on the first error so the
/// machine can classify it by position.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, SyntaxError> {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(mut errors) => {
            let err = errors.remove(0);
            return Err(SyntaxError::new(err.message, err.span));
        }
    };
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    // Set while parsing an if/for/switch header, where a `{` opens the
    // body rather than a composite literal.
    no_composite: bool,
}

type Parse<T> = Result<T, SyntaxError>;

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            no_composite: false,
        }
    }

    fn parse_program(mut self) -> Parse<Vec<Stmt>> {
        self.expect(TokenKind::Package)?;
        self.expect_identifier("Expected package name")?;
        self.expect(TokenKind::Semi)?;
        self.expect(TokenKind::Func)?;
        self.expect_identifier("Expected function name")?;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::RParen)?;
        let block = self.parse_block()?;
        self.consume(TokenKind::Semi);
        self.expect(TokenKind::Eof)?;
        Ok(block.statements)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        *self.current_kind() == kind
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Parse<Token> {
        if self.check(kind.clone()) {
            Ok(self.bump())
        } else {
            Err(self.error_here(format!(
                "Expected '{}', found '{}'",
                kind.describe(),
                self.current_kind().describe()
            )))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Parse<Ident> {
        if let TokenKind::Identifier(name) = self.current_kind() {
            let name = name.clone();
            let span = self.current_span();
            self.bump();
            Ok(Ident { name, span })
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.current_span())
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Semi
                | TokenKind::RBrace
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Eof
        )
    }

    fn finish_statement(&mut self) -> Parse<()> {
        if self.consume(TokenKind::Semi) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "Unexpected '{}' after statement",
                self.current_kind().describe()
            )))
        }
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Parse<Block> {
        let start = self.expect(TokenKind::LBrace)?.span.start;
        let saved = std::mem::replace(&mut self.no_composite, false);
        let mut statements = Vec::new();
        loop {
            while self.consume(TokenKind::Semi) {}
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            statements.push(self.parse_statement()?);
            self.finish_statement()?;
        }
        self.no_composite = saved;
        let end = self.expect(TokenKind::RBrace)?.span.end;
        Ok(Block {
            statements,
            span: Span::new(start, end),
        })
    }

    fn parse_statement(&mut self) -> Parse<Stmt> {
        match self.current_kind() {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Var | TokenKind::Const => self.parse_decl(),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch().map(Stmt::Switch),
            TokenKind::Break => {
                let span = self.bump().span;
                Ok(Stmt::Branch(BranchStmt {
                    kind: BranchKind::Break,
                    span,
                }))
            }
            TokenKind::Continue => {
                let span = self.bump().span;
                Ok(Stmt::Branch(BranchStmt {
                    kind: BranchKind::Continue,
                    span,
                }))
            }
            TokenKind::Return => {
                let start = self.bump().span;
                let mut values = Vec::new();
                if !self.at_statement_end() {
                    values.push(self.parse_expr()?);
                    while self.consume(TokenKind::Comma) {
                        values.push(self.parse_expr()?);
                    }
                }
                let end = values.last().map(|v| v.span()).unwrap_or(start);
                Ok(Stmt::Return(ReturnStmt {
                    values,
                    span: start.join(end),
                }))
            }
            TokenKind::Go => Err(self.error_here("Goroutines are not supported")),
            TokenKind::Select => Err(self.error_here("Select statements are not supported")),
            TokenKind::Goto => Err(self.error_here("Goto is not supported")),
            TokenKind::Defer => Err(self.error_here("Defer statements are not supported")),
            TokenKind::Fallthrough => Err(self.error_here("Fallthrough is not supported")),
            TokenKind::TypeKw => Err(self.error_here("Type declarations are not supported")),
            TokenKind::Import => Err(self.error_here("Import declarations are not supported")),
            _ => self.parse_simple_stmt(),
        }
    }

    fn parse_decl(&mut self) -> Parse<Stmt> {
        let tok = self.bump();
        let kind = if tok.kind == TokenKind::Var {
            DeclKind::Var
        } else {
            DeclKind::Const
        };
        let start = tok.span.start;

        let mut specs = Vec::new();
        if self.consume(TokenKind::LParen) {
            loop {
                while self.consume(TokenKind::Semi) {}
                if self.check(TokenKind::RParen) {
                    break;
                }
                specs.push(self.parse_value_spec()?);
                if !self.consume(TokenKind::Semi) && !self.check(TokenKind::RParen) {
                    return Err(self.error_here("Expected ';' or ')' in declaration group"));
                }
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_value_spec()?);
        }

        let end = specs.last().map(|s| s.span.end).unwrap_or(start);
        Ok(Stmt::Decl(DeclStmt {
            kind,
            specs,
            span: Span::new(start, end),
        }))
    }

    fn parse_value_spec(&mut self) -> Parse<ValueSpec> {
        let mut names = vec![self.expect_identifier("Expected identifier in declaration")?];
        while self.consume(TokenKind::Comma) {
            names.push(self.expect_identifier("Expected identifier after ','")?);
        }
        let start = names[0].span.start;

        let ty = if !self.check(TokenKind::Eq) && !self.at_statement_end() {
            Some(self.parse_type()?)
        } else {
            None
        };

        let mut values = Vec::new();
        if self.consume(TokenKind::Eq) {
            values.push(self.parse_expr()?);
            while self.consume(TokenKind::Comma) {
                values.push(self.parse_expr()?);
            }
        }

        let end = values
            .last()
            .map(|v| v.span().end)
            .or_else(|| ty.as_ref().map(|t| t.span().end))
            .unwrap_or_else(|| names.last().unwrap().span.end);
        Ok(ValueSpec {
            names,
            ty,
            values,
            span: Span::new(start, end),
        })
    }

    /// Expression statements, assignments, definitions, and `++`/`--`.
    /// Also used for if/for/switch headers.
    fn parse_simple_stmt(&mut self) -> Parse<Stmt> {
        let first = self.parse_expr()?;
        let start = first.span().start;

        match self.current_kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let inc = self.check(TokenKind::PlusPlus);
                let end = self.bump().span.end;
                Ok(Stmt::IncDec(IncDecStmt {
                    expr: first,
                    inc,
                    span: Span::new(start, end),
                }))
            }
            TokenKind::Arrow => Err(self.error_here("Send statements are not supported")),
            TokenKind::Comma
            | TokenKind::ColonEq
            | TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq
            | TokenKind::ShlEq
            | TokenKind::ShrEq
            | TokenKind::AmpCaretEq => {
                let mut lhs = vec![first];
                while self.consume(TokenKind::Comma) {
                    lhs.push(self.parse_expr()?);
                }
                let op = self.parse_assign_op()?;
                let mut rhs = Vec::new();
                rhs.push(self.parse_expr()?);
                while self.consume(TokenKind::Comma) {
                    rhs.push(self.parse_expr()?);
                }
                let end = rhs.last().unwrap().span().end;
                Ok(Stmt::Assign(AssignStmt {
                    lhs,
                    op,
                    rhs,
                    span: Span::new(start, end),
                }))
            }
            _ => Ok(Stmt::Expr(first)),
        }
    }

    fn parse_assign_op(&mut self) -> Parse<AssignOp> {
        let op = match self.current_kind() {
            TokenKind::ColonEq => AssignOp::Define,
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Rem,
            TokenKind::AmpEq => AssignOp::And,
            TokenKind::PipeEq => AssignOp::Or,
            TokenKind::CaretEq => AssignOp::Xor,
            TokenKind::ShlEq => AssignOp::Shl,
            TokenKind::ShrEq => AssignOp::Shr,
            TokenKind::AmpCaretEq => AssignOp::AndNot,
            _ => return Err(self.error_here("Expected assignment operator")),
        };
        self.bump();
        Ok(op)
    }

    fn parse_if(&mut self) -> Parse<IfStmt> {
        let start = self.expect(TokenKind::If)?.span.start;
        let saved = std::mem::replace(&mut self.no_composite, true);

        let mut init = None;
        let first = self.parse_simple_stmt()?;
        let cond = if self.consume(TokenKind::Semi) {
            init = Some(Box::new(first));
            self.parse_expr()?
        } else {
            match first {
                Stmt::Expr(expr) => expr,
                _ => return Err(self.error_here("Expected condition after statement in if")),
            }
        };

        self.no_composite = saved;
        let then = self.parse_block()?;
        let els = if self.consume(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(Box::new(Stmt::If(self.parse_if()?)))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };

        let end = els
            .as_ref()
            .map(|s| stmt_span(s).end)
            .unwrap_or(then.span.end);
        Ok(IfStmt {
            init,
            cond,
            then,
            els,
            span: Span::new(start, end),
        })
    }

    fn parse_for(&mut self) -> Parse<Stmt> {
        let start = self.expect(TokenKind::For)?.span.start;
        let saved = std::mem::replace(&mut self.no_composite, true);

        // `for { ... }`
        if self.check(TokenKind::LBrace) {
            self.no_composite = saved;
            let body = self.parse_block()?;
            let span = Span::new(start, body.span.end);
            return Ok(Stmt::For(ForStmt {
                init: None,
                cond: None,
                post: None,
                body,
                span,
            }));
        }

        // `for range x { ... }`
        if self.consume(TokenKind::Range) {
            let expr = self.parse_expr()?;
            self.no_composite = saved;
            let body = self.parse_block()?;
            let span = Span::new(start, body.span.end);
            return Ok(Stmt::Range(RangeStmt {
                key: None,
                value: None,
                define: true,
                expr,
                body,
                span,
            }));
        }

        let header = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_simple_stmt_or_range(start)?)
        };
        let first = match header {
            Some(HeaderStmt::Range(range)) => {
                self.no_composite = saved;
                let body = self.parse_block()?;
                let span = Span::new(start, body.span.end);
                return Ok(Stmt::Range(RangeStmt { body, span, ..range }));
            }
            Some(HeaderStmt::Simple(stmt)) => Some(stmt),
            None => None,
        };

        if self.consume(TokenKind::Semi) {
            // `for init; cond; post { ... }`
            let cond = if self.check(TokenKind::Semi) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenKind::Semi)?;
            let post = if self.check(TokenKind::LBrace) {
                None
            } else {
                Some(Box::new(self.parse_simple_stmt()?))
            };
            self.no_composite = saved;
            let body = self.parse_block()?;
            let span = Span::new(start, body.span.end);
            Ok(Stmt::For(ForStmt {
                init: first.map(Box::new),
                cond,
                post,
                body,
                span,
            }))
        } else {
            // `for cond { ... }`
            let cond = match first {
                Some(Stmt::Expr(expr)) => Some(expr),
                Some(_) => return Err(self.error_here("Expected for loop condition")),
                None => None,
            };
            self.no_composite = saved;
            let body = self.parse_block()?;
            let span = Span::new(start, body.span.end);
            Ok(Stmt::For(ForStmt {
                init: None,
                cond,
                post: None,
                body,
                span,
            }))
        }
    }

    /// Inside a `for` header an assignment's right side may be a range
    /// clause.
    fn parse_simple_stmt_or_range(&mut self, start: usize) -> Parse<HeaderStmt> {
        let first = self.parse_expr()?;

        if matches!(self.current_kind(), TokenKind::ColonEq | TokenKind::Eq)
            || self.check(TokenKind::Comma)
        {
            let mut lhs = vec![first];
            while self.consume(TokenKind::Comma) {
                lhs.push(self.parse_expr()?);
            }
            if !matches!(self.current_kind(), TokenKind::ColonEq | TokenKind::Eq) {
                return Err(self.error_here("Expected ':=' or '=' in for header"));
            }
            let define = self.check(TokenKind::ColonEq);
            self.bump();

            if self.consume(TokenKind::Range) {
                let expr = self.parse_expr()?;
                let mut idents = Vec::with_capacity(lhs.len());
                for expr in &lhs {
                    match expr {
                        Expr::Ident(ident) => idents.push(ident.clone()),
                        _ => {
                            return Err(SyntaxError::new(
                                "Range variables must be identifiers",
                                expr.span(),
                            ));
                        }
                    }
                }
                if idents.len() > 2 {
                    return Err(self.error_here("Too many variables in range clause"));
                }
                let key = idents.first().cloned();
                let value = idents.get(1).cloned();
                let span = Span::new(start, expr.span().end);
                return Ok(HeaderStmt::Range(RangeStmt {
                    key,
                    value,
                    define,
                    expr,
                    body: Block {
                        statements: Vec::new(),
                        span: Span::default(),
                    },
                    span,
                }));
            }

            let op = if define { AssignOp::Define } else { AssignOp::Assign };
            let mut rhs = Vec::new();
            rhs.push(self.parse_expr()?);
            while self.consume(TokenKind::Comma) {
                rhs.push(self.parse_expr()?);
            }
            let end = rhs.last().unwrap().span().end;
            let span = Span::new(lhs[0].span().start, end);
            return Ok(HeaderStmt::Simple(Stmt::Assign(AssignStmt {
                lhs,
                op,
                rhs,
                span,
            })));
        }

        match self.current_kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let inc = self.check(TokenKind::PlusPlus);
                let end = self.bump().span.end;
                let span = Span::new(first.span().start, end);
                Ok(HeaderStmt::Simple(Stmt::IncDec(IncDecStmt {
                    expr: first,
                    inc,
                    span,
                })))
            }
            _ => {
                let op = self.try_op_assign()?;
                match op {
                    Some(op) => {
                        let rhs = self.parse_expr()?;
                        let span = Span::new(first.span().start, rhs.span().end);
                        Ok(HeaderStmt::Simple(Stmt::Assign(AssignStmt {
                            lhs: vec![first],
                            op,
                            rhs: vec![rhs],
                            span,
                        })))
                    }
                    None => Ok(HeaderStmt::Simple(Stmt::Expr(first))),
                }
            }
        }
    }

    fn try_op_assign(&mut self) -> Parse<Option<AssignOp>> {
        let op = match self.current_kind() {
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Rem,
            TokenKind::AmpEq => AssignOp::And,
            TokenKind::PipeEq => AssignOp::Or,
            TokenKind::CaretEq => AssignOp::Xor,
            TokenKind::ShlEq => AssignOp::Shl,
            TokenKind::ShrEq => AssignOp::Shr,
            TokenKind::AmpCaretEq => AssignOp::AndNot,
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(op))
    }

    fn parse_switch(&mut self) -> Parse<SwitchStmt> {
        let start = self.expect(TokenKind::Switch)?.span.start;
        let saved = std::mem::replace(&mut self.no_composite, true);

        let mut init = None;
        let mut tag = None;
        if !self.check(TokenKind::LBrace) {
            let first = self.parse_simple_stmt()?;
            if self.consume(TokenKind::Semi) {
                init = Some(Box::new(first));
                if !self.check(TokenKind::LBrace) {
                    tag = Some(self.parse_expr()?);
                }
            } else {
                match first {
                    Stmt::Expr(expr) => tag = Some(expr),
                    _ => return Err(self.error_here("Expected switch tag expression")),
                }
            }
        }
        self.no_composite = saved;

        self.expect(TokenKind::LBrace)?;
        let mut cases = Vec::new();
        loop {
            while self.consume(TokenKind::Semi) {}
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            cases.push(self.parse_case_clause()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span.end;

        Ok(SwitchStmt {
            init,
            tag,
            cases,
            span: Span::new(start, end),
        })
    }

    fn parse_case_clause(&mut self) -> Parse<CaseClause> {
        let start = self.current_span().start;
        let mut values = Vec::new();
        if self.consume(TokenKind::Case) {
            values.push(self.parse_expr()?);
            while self.consume(TokenKind::Comma) {
                values.push(self.parse_expr()?);
            }
        } else if !self.consume(TokenKind::Default) {
            return Err(self.error_here("Expected 'case' or 'default'"));
        }
        self.expect(TokenKind::Colon)?;

        let mut body = Vec::new();
        loop {
            while self.consume(TokenKind::Semi) {}
            if matches!(
                self.current_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                break;
            }
            body.push(self.parse_statement()?);
            self.finish_statement()?;
        }
        let end = body
            .last()
            .map(|s| stmt_span(s).end)
            .unwrap_or_else(|| self.current_span().start);
        Ok(CaseClause {
            values,
            body,
            span: Span::new(start, end),
        })
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Parse<Expr> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Parse<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let Some((op, prec)) = binary_op(self.current_kind()) else {
                return Ok(left);
            };
            if prec < min_prec {
                return Ok(left);
            }
            self.bump();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span().join(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
    }

    fn parse_unary(&mut self) -> Parse<Expr> {
        let op = match self.current_kind() {
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Caret => Some(UnaryOp::BitNot),
            TokenKind::Amp => Some(UnaryOp::Addr),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Arrow => Some(UnaryOp::Recv),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.bump().span.start;
            let expr = self.parse_unary()?;
            let span = Span::new(start, expr.span().end);
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Parse<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::LParen => {
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    self.bump();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        while self.consume(TokenKind::Comma) {
                            if self.check(TokenKind::RParen) {
                                break;
                            }
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.no_composite = saved;
                    let end = self.expect(TokenKind::RParen)?.span.end;
                    let span = Span::new(expr.span().start, end);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    self.bump();
                    let low = if self.check(TokenKind::Colon) {
                        None
                    } else {
                        Some(Box::new(self.parse_expr()?))
                    };
                    if self.consume(TokenKind::Colon) {
                        let high = if self.check(TokenKind::Colon) || self.check(TokenKind::RBracket)
                        {
                            None
                        } else {
                            Some(Box::new(self.parse_expr()?))
                        };
                        let max = if self.consume(TokenKind::Colon) {
                            Some(Box::new(self.parse_expr()?))
                        } else {
                            None
                        };
                        self.no_composite = saved;
                        let end = self.expect(TokenKind::RBracket)?.span.end;
                        let span = Span::new(expr.span().start, end);
                        expr = Expr::Slice {
                            x: Box::new(expr),
                            low,
                            high,
                            max,
                            span,
                        };
                    } else {
                        self.no_composite = saved;
                        let end = self.expect(TokenKind::RBracket)?.span.end;
                        let index = low
                            .ok_or_else(|| self.error_here("Expected index expression"))?;
                        let span = Span::new(expr.span().start, end);
                        expr = Expr::Index {
                            x: Box::new(expr),
                            index,
                            span,
                        };
                    }
                }
                TokenKind::Dot => {
                    self.bump();
                    if self.consume(TokenKind::LParen) {
                        let saved = std::mem::replace(&mut self.no_composite, false);
                        let ty = self.parse_type()?;
                        self.no_composite = saved;
                        let end = self.expect(TokenKind::RParen)?.span.end;
                        let span = Span::new(expr.span().start, end);
                        expr = Expr::TypeAssert {
                            x: Box::new(expr),
                            ty,
                            span,
                        };
                    } else {
                        let name = self.expect_identifier("Expected field or method name")?;
                        let span = Span::new(expr.span().start, name.span.end);
                        expr = Expr::Selector {
                            x: Box::new(expr),
                            name,
                            span,
                        };
                    }
                }
                // In an if/for/switch header only literals whose type
                // starts with [, map or chan are unambiguous.
                TokenKind::LBrace if !self.no_composite || matches!(expr, Expr::TypeLit(_)) => {
                    let Some(ty) = as_type_expr(&expr) else {
                        return Ok(expr);
                    };
                    let (elts, end) = self.parse_composite_body()?;
                    let span = Span::new(expr.span().start, end);
                    expr = Expr::Composite { ty, elts, span };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_composite_body(&mut self) -> Parse<(Vec<CompositeElt>, usize)> {
        let saved = std::mem::replace(&mut self.no_composite, false);
        self.expect(TokenKind::LBrace)?;
        let mut elts = Vec::new();
        loop {
            while self.consume(TokenKind::Semi) {}
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            let first = self.parse_expr()?;
            let elt = if self.consume(TokenKind::Colon) {
                let value = self.parse_expr()?;
                CompositeElt {
                    key: Some(first),
                    value,
                }
            } else {
                CompositeElt {
                    key: None,
                    value: first,
                }
            };
            elts.push(elt);
            if !self.consume(TokenKind::Comma) {
                while self.consume(TokenKind::Semi) {}
                break;
            }
        }
        self.no_composite = saved;
        let end = self.expect(TokenKind::RBrace)?.span.end;
        Ok((elts, end))
    }

    fn parse_primary(&mut self) -> Parse<Expr> {
        match self.current_kind().clone() {
            TokenKind::Int(v) => {
                let span = self.bump().span;
                Ok(Expr::IntLit(v, span))
            }
            TokenKind::Float(v) => {
                let span = self.bump().span;
                Ok(Expr::FloatLit(v, span))
            }
            TokenKind::Imag(v) => {
                let span = self.bump().span;
                Ok(Expr::ImagLit(v, span))
            }
            TokenKind::Rune(c) => {
                let span = self.bump().span;
                Ok(Expr::RuneLit(c, span))
            }
            TokenKind::Str(s) => {
                let span = self.bump().span;
                Ok(Expr::StringLit(s, span))
            }
            TokenKind::Identifier(name) => {
                let span = self.bump().span;
                Ok(Expr::Ident(Ident { name, span }))
            }
            TokenKind::LParen => {
                let start = self.bump().span.start;
                let saved = std::mem::replace(&mut self.no_composite, false);
                let inner = self.parse_expr()?;
                self.no_composite = saved;
                let end = self.expect(TokenKind::RParen)?.span.end;
                Ok(Expr::Paren {
                    expr: Box::new(inner),
                    span: Span::new(start, end),
                })
            }
            TokenKind::LBracket | TokenKind::Map | TokenKind::Chan => {
                Ok(Expr::TypeLit(self.parse_type()?))
            }
            TokenKind::Func => self.parse_func_lit(),
            other => Err(self.error_here(format!(
                "Unexpected '{}' in expression",
                other.describe()
            ))),
        }
    }

    fn parse_func_lit(&mut self) -> Parse<Expr> {
        let start = self.expect(TokenKind::Func)?.span.start;
        self.expect(TokenKind::LParen)?;
        let mut params = 0;
        while !self.check(TokenKind::RParen) && !self.check(TokenKind::Eof) {
            self.expect_identifier("Expected parameter name")?;
            self.parse_type()?;
            params += 1;
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        let mut results = 0;
        if !self.check(TokenKind::LBrace) {
            if self.consume(TokenKind::LParen) {
                while !self.check(TokenKind::RParen) && !self.check(TokenKind::Eof) {
                    self.parse_type()?;
                    results += 1;
                    if !self.consume(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
            } else {
                self.parse_type()?;
                results = 1;
            }
        }
        let body = self.parse_block()?;
        let span = Span::new(start, body.span.end);
        Ok(Expr::FuncLit {
            params,
            results,
            body,
            span,
        })
    }

    // ---- types ----

    fn parse_type(&mut self) -> Parse<TypeExpr> {
        match self.current_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.bump().span;
                let ident = Ident { name, span };
                if self.consume(TokenKind::Dot) {
                    let sel = self.expect_identifier("Expected type name after '.'")?;
                    let span = Span::new(ident.span.start, sel.span.end);
                    Ok(TypeExpr::Qualified {
                        pkg: ident,
                        name: sel,
                        span,
                    })
                } else {
                    Ok(TypeExpr::Name(ident))
                }
            }
            TokenKind::LBracket => {
                let start = self.bump().span.start;
                if self.consume(TokenKind::RBracket) {
                    let elem = self.parse_type()?;
                    let span = Span::new(start, elem.span().end);
                    Ok(TypeExpr::Slice {
                        elem: Box::new(elem),
                        span,
                    })
                } else {
                    let len = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    let elem = self.parse_type()?;
                    let span = Span::new(start, elem.span().end);
                    Ok(TypeExpr::Array {
                        len: Box::new(len),
                        elem: Box::new(elem),
                        span,
                    })
                }
            }
            TokenKind::Map => {
                let start = self.bump().span.start;
                self.expect(TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.parse_type()?;
                let span = Span::new(start, value.span().end);
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                    span,
                })
            }
            TokenKind::Chan => {
                let start = self.bump().span.start;
                let dir = if self.consume(TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                let span = Span::new(start, elem.span().end);
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(elem),
                    span,
                })
            }
            TokenKind::Arrow => {
                let start = self.bump().span.start;
                self.expect(TokenKind::Chan)?;
                let elem = self.parse_type()?;
                let span = Span::new(start, elem.span().end);
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(elem),
                    span,
                })
            }
            TokenKind::Star => {
                let start = self.bump().span.start;
                let elem = self.parse_type()?;
                let span = Span::new(start, elem.span().end);
                Ok(TypeExpr::Pointer {
                    elem: Box::new(elem),
                    span,
                })
            }
            TokenKind::Func => {
                let start = self.bump().span.start;
                self.expect(TokenKind::LParen)?;
                let mut depth = 1usize;
                let mut end = self.current_span().end;
                while depth > 0 && !self.check(TokenKind::Eof) {
                    match self.current_kind() {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen => depth -= 1,
                        _ => {}
                    }
                    end = self.bump().span.end;
                }
                // An optional result type may follow.
                if let TokenKind::Identifier(_)
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Star = self.current_kind()
                {
                    end = self.parse_type()?.span().end;
                }
                Ok(TypeExpr::Func {
                    span: Span::new(start, end),
                })
            }
            other => Err(self.error_here(format!("Expected type, found '{}'", other.describe()))),
        }
    }
}

enum HeaderStmt {
    Simple(Stmt),
    Range(RangeStmt),
}

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::PipePipe => (BinaryOp::LogOr, 1),
        TokenKind::AmpAmp => (BinaryOp::LogAnd, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::BangEq => (BinaryOp::NotEq, 3),
        TokenKind::Lt => (BinaryOp::Lt, 3),
        TokenKind::LtEq => (BinaryOp::LtEq, 3),
        TokenKind::Gt => (BinaryOp::Gt, 3),
        TokenKind::GtEq => (BinaryOp::GtEq, 3),
        TokenKind::Plus => (BinaryOp::Add, 4),
        TokenKind::Minus => (BinaryOp::Sub, 4),
        TokenKind::Pipe => (BinaryOp::Or, 4),
        TokenKind::Caret => (BinaryOp::Xor, 4),
        TokenKind::Star => (BinaryOp::Mul, 5),
        TokenKind::Slash => (BinaryOp::Div, 5),
        TokenKind::Percent => (BinaryOp::Rem, 5),
        TokenKind::Shl => (BinaryOp::Shl, 5),
        TokenKind::Shr => (BinaryOp::Shr, 5),
        TokenKind::Amp => (BinaryOp::And, 5),
        TokenKind::AmpCaret => (BinaryOp::AndNot, 5),
        _ => return None,
    })
}

/// Reinterprets an already-parsed expression as the type of a composite
/// literal.
fn as_type_expr(expr: &Expr) -> Option<TypeExpr> {
    match expr {
        Expr::Ident(ident) => Some(TypeExpr::Name(ident.clone())),
        Expr::Selector { x, name, span } => match x.as_ref() {
            Expr::Ident(pkg) => Some(TypeExpr::Qualified {
                pkg: pkg.clone(),
                name: name.clone(),
                span: *span,
            }),
            _ => None,
        },
        Expr::TypeLit(ty) => Some(ty.clone()),
        _ => None,
    }
}

fn stmt_span(stmt: &Stmt) -> Span {
    match stmt {
        Stmt::Expr(expr) => expr.span(),
        Stmt::Assign(s) => s.span,
        Stmt::Decl(s) => s.span,
        Stmt::Block(b) => b.span,
        Stmt::If(s) => s.span,
        Stmt::For(s) => s.span,
        Stmt::Range(s) => s.span,
        Stmt::Switch(s) => s.span,
        Stmt::Branch(s) => s.span,
        Stmt::IncDec(s) => s.span,
        Stmt::Return(s) => s.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_body(body: &str) -> Result<Vec<Stmt>, SyntaxError> {
        parse_program(&format!("package main; func main() {{\n{}\n}}", body))
    }

    #[test]
    fn parses_define_and_for() {
        let stmts = parse_body("sum := 0\nfor i := 0; i < 10; i++ {\n\tsum += i\n}").unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Assign(a) if a.op == AssignOp::Define));
        match &stmts[1] {
            Stmt::For(f) => {
                assert!(f.init.is_some());
                assert!(f.cond.is_some());
                assert!(matches!(f.post.as_deref(), Some(Stmt::IncDec(_))));
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn parses_range_over_string() {
        let stmts = parse_body("for i, c := range \"go\" {\n\t_ = i + int(c)\n}").unwrap();
        match &stmts[0] {
            Stmt::Range(r) => {
                assert_eq!(r.key.as_ref().unwrap().name, "i");
                assert_eq!(r.value.as_ref().unwrap().name, "c");
                assert!(r.define);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn parses_composite_literals() {
        let stmts =
            parse_body("m := map[string]int{\"k1\": 7, \"k2\": 13}\ns := []string{\"abc\"}")
                .unwrap();
        match &stmts[0] {
            Stmt::Assign(a) => match &a.rhs[0] {
                Expr::Composite { ty, elts, .. } => {
                    assert!(matches!(ty, TypeExpr::Map { .. }));
                    assert_eq!(elts.len(), 2);
                    assert!(elts[0].key.is_some());
                }
                other => panic!("expected composite, got {other:?}"),
            },
            other => panic!("expected assign, got {other:?}"),
        }
        assert!(matches!(&stmts[1], Stmt::Assign(_)));
    }

    #[test]
    fn header_braces_open_blocks_not_literals() {
        // `x` followed by `{` must be the switch body, not a composite.
        parse_body("x := 1\nswitch x {\ncase 1:\n\tx = 2\ndefault:\n\tx = 3\n}").unwrap();
        parse_body("if x := 1; x < 2 {\n\tx = 3\n}").unwrap();
    }

    #[test]
    fn slice_literals_are_allowed_in_headers() {
        let stmts = parse_body("for _, n := range []int{2, 3, 4} {\n\t_ = n\n}").unwrap();
        match &stmts[0] {
            Stmt::Range(r) => assert!(matches!(r.expr, Expr::Composite { .. })),
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn parses_multi_assignment() {
        let stmts = parse_body("a, b = b, a").unwrap();
        match &stmts[0] {
            Stmt::Assign(a) => {
                assert_eq!(a.lhs.len(), 2);
                assert_eq!(a.rhs.len(), 2);
                assert_eq!(a.op, AssignOp::Assign);
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_brace_errors_at_last_line() {
        let src = "package main; func main() {\nfor i := 0; i < 10; i++ {\n}";
        let err = parse_program(src).unwrap_err();
        assert!(err.span.start >= src.rfind('\n').unwrap());
    }

    #[test]
    fn parses_var_and_const_decls() {
        let stmts = parse_body("var sum, j int\nconst n = 500000000").unwrap();
        match &stmts[0] {
            Stmt::Decl(d) => {
                assert_eq!(d.kind, DeclKind::Var);
                assert_eq!(d.specs[0].names.len(), 2);
                assert!(d.specs[0].ty.is_some());
            }
            other => panic!("expected decl, got {other:?}"),
        }
        assert!(matches!(&stmts[1], Stmt::Decl(d) if d.kind == DeclKind::Const));
    }
}
