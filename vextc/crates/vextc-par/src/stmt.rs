//! Statement parsing - declarations, control flow, assignments.

use crate::ast::*;
use crate::expr::dummy_literal;
use crate::Parser;
use vextc_lex::TokenKind;

impl<'a> Parser<'a> {
    /// Parse a single statement.
    ///
    /// `top_level` gates function definitions, which are only legal at the
    /// outermost statement list.
    pub(crate) fn parse_stmt(&mut self, top_level: bool) -> Option<Stmt> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Keyword => match token.text.as_str() {
                "if" => self.parse_if_stmt(),
                "while" => self.parse_while_stmt(),
                "for" => self.parse_for_stmt(),
                "return" => self.parse_return_stmt(),
                "else" => {
                    self.error("'else' without a matching 'if'", token.span());
                    self.advance();
                    None
                }
                // remaining keywords are type names: declaration or function
                _ => {
                    if self.peek(1).kind == TokenKind::Identifier
                        && self.peek(2).is(TokenKind::Punctuation, "(")
                    {
                        if !top_level {
                            self.error(
                                "function definitions are only allowed at top level",
                                token.span(),
                            );
                        }
                        self.parse_func_def()
                    } else {
                        let stmt = self.parse_var_decl()?;
                        self.expect_punct(";")?;
                        Some(stmt)
                    }
                }
            },
            TokenKind::Identifier => {
                let next = self.peek(1);
                if next.kind == TokenKind::Operator
                    && matches!(next.text.as_str(), "=" | "+=" | "-=" | "*=" | "/=")
                {
                    let stmt = self.parse_assign()?;
                    self.expect_punct(";")?;
                    Some(stmt)
                } else if next.kind == TokenKind::Operator
                    && matches!(next.text.as_str(), "++" | "--")
                {
                    let stmt = self.parse_increment()?;
                    self.expect_punct(";")?;
                    Some(stmt)
                } else {
                    self.parse_expr_stmt()
                }
            }
            _ => self.parse_expr_stmt(),
        }
    }

    /// Bare expression statement; only function calls are allowed here.
    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let expr = self.parse_expr()?;
        if !expr.is_call() {
            self.error(
                "only function call expressions can be used as statements",
                expr.span(),
            );
        }
        self.expect_punct(";")?;
        Some(Stmt::Expr(ExprStmt { expr }))
    }

    /// `<type> <name> (= <expr>)?` - the terminating `;` belongs to the caller
    /// so the same parse serves `for` initializers.
    pub(crate) fn parse_var_decl(&mut self) -> Option<Stmt> {
        let ty_token = self.bump();
        let ty = Ty::from_keyword(&ty_token.text).unwrap_or(Ty::Error);
        let name_token = self.expect_identifier("variable name")?;

        let init = if self.match_op("=") {
            Some(self.parse_expr_or_dummy())
        } else {
            None
        };

        Some(Stmt::VarDecl(VarDeclStmt {
            ty,
            name: name_token.text.clone(),
            slot: -1,
            init,
            span: ty_token.span(),
            name_span: name_token.span(),
        }))
    }

    /// `<name> <assign-op> <expr>` without the trailing `;`.
    fn parse_assign(&mut self) -> Option<Stmt> {
        let name_token = self.bump();
        let op_token = self.bump();
        let op = match op_token.text.as_str() {
            "=" => AssignOp::Assign,
            "+=" => AssignOp::AddAssign,
            "-=" => AssignOp::SubAssign,
            "*=" => AssignOp::MulAssign,
            "/=" => AssignOp::DivAssign,
            _ => unreachable!("caller checked the operator"),
        };
        let value = self.parse_expr_or_dummy();

        Some(Stmt::Assign(AssignStmt {
            name: name_token.text.clone(),
            slot: -1,
            op,
            value,
            span: name_token.span(),
        }))
    }

    /// `<name>++` or `<name>--` without the trailing `;`.
    fn parse_increment(&mut self) -> Option<Stmt> {
        let name_token = self.bump();
        let op_token = self.bump();

        Some(Stmt::Increment(IncrementStmt {
            name: name_token.text.clone(),
            slot: -1,
            is_increment: op_token.text == "++",
            span: name_token.span(),
        }))
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let if_token = self.bump();
        self.expect_punct("(")?;
        let cond = self.parse_expr_or_dummy();
        self.expect_punct(")")?;
        let body = self.parse_body();

        let else_body = if self.at_keyword("else") {
            self.advance();
            Some(self.parse_body())
        } else {
            None
        };

        Some(Stmt::If(IfStmt {
            cond,
            body,
            else_body,
            span: if_token.span(),
        }))
    }

    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let while_token = self.bump();
        self.expect_punct("(")?;
        let cond = self.parse_expr_or_dummy();
        self.expect_punct(")")?;
        let body = self.parse_body();

        Some(Stmt::While(WhileStmt {
            cond,
            body,
            span: while_token.span(),
        }))
    }

    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let for_token = self.bump();
        self.expect_punct("(")?;

        let init = if self.at_punct(";") {
            None
        } else {
            self.parse_simple_stmt().map(Box::new)
        };
        self.expect_punct(";")?;

        let cond = if self.at_punct(";") {
            None
        } else {
            Some(self.parse_expr_or_dummy())
        };
        self.expect_punct(";")?;

        let step = if self.at_punct(")") {
            None
        } else {
            self.parse_simple_stmt().map(Box::new)
        };
        self.expect_punct(")")?;

        let body = self.parse_body();

        Some(Stmt::For(ForStmt {
            init,
            cond,
            step,
            body,
            span: for_token.span(),
        }))
    }

    /// A `for` clause: variable declaration, assignment, increment or a
    /// bare expression. No terminating `;`.
    fn parse_simple_stmt(&mut self) -> Option<Stmt> {
        let token = self.current().clone();

        if token.kind == TokenKind::Keyword && Ty::from_keyword(&token.text).is_some() {
            return self.parse_var_decl();
        }

        if token.kind == TokenKind::Identifier {
            let next = self.peek(1);
            if next.kind == TokenKind::Operator
                && matches!(next.text.as_str(), "=" | "+=" | "-=" | "*=" | "/=")
            {
                return self.parse_assign();
            }
            if next.kind == TokenKind::Operator && matches!(next.text.as_str(), "++" | "--") {
                return self.parse_increment();
            }
        }

        let expr = self.parse_expr()?;
        Some(Stmt::Expr(ExprStmt { expr }))
    }

    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let return_token = self.bump();
        let value = if self.at_punct(";") {
            None
        } else {
            Some(self.parse_expr_or_dummy())
        };
        self.expect_punct(";")?;

        Some(Stmt::Return(ReturnStmt {
            value,
            span: return_token.span(),
        }))
    }

    /// `<returnType> <name> ( <paramList> ) { <block> }`
    fn parse_func_def(&mut self) -> Option<Stmt> {
        let ty_token = self.bump();
        let ret = Ty::from_keyword(&ty_token.text).unwrap_or(Ty::Error);
        let name_token = self.expect_identifier("function name")?;

        self.expect_punct("(")?;
        let mut params = Vec::new();
        if !self.at_punct(")") {
            loop {
                match self.parse_param() {
                    Some(param) => params.push(param),
                    None => break,
                }
                if !self.match_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct(")")?;

        self.expect_punct("{")?;
        let body = self.parse_block_stmts();

        Some(Stmt::FuncDef(FuncDefStmt {
            ret,
            name: name_token.text.clone(),
            params,
            body,
            span: ty_token.span(),
            name_span: name_token.span(),
        }))
    }

    fn parse_param(&mut self) -> Option<Param> {
        let token = self.current().clone();
        if token.kind != TokenKind::Keyword || Ty::from_keyword(&token.text).is_none() {
            self.error(
                format!("expected parameter type, found '{}'", token.text),
                token.span(),
            );
            return None;
        }
        self.advance();
        let ty = Ty::from_keyword(&token.text).unwrap_or(Ty::Error);
        let name_token = self.expect_identifier("parameter name")?;

        Some(Param {
            ty,
            name: name_token.text.clone(),
            slot: -1,
            span: name_token.span(),
        })
    }

    /// A statement body: a braced block or a single statement.
    fn parse_body(&mut self) -> Vec<Stmt> {
        if self.match_punct("{") {
            self.parse_block_stmts()
        } else {
            match self.parse_stmt(false) {
                Some(stmt) => vec![stmt],
                None => {
                    self.recover_to_sync_point();
                    vec![dummy_stmt(self)]
                }
            }
        }
    }

    /// Statements up to the closing `}` (the `{` is already consumed).
    fn parse_block_stmts(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();

        while !self.is_at_end() && !self.at_punct("}") {
            let before = self.position;
            match self.parse_stmt(false) {
                Some(stmt) => stmts.push(stmt),
                None => self.recover_in_block(),
            }
            if self.position == before {
                self.advance();
            }
        }

        let _ = self.expect_punct("}");
        stmts
    }
}

/// Placeholder statement so a failed single-statement body is still a
/// well-formed tree.
fn dummy_stmt(parser: &Parser<'_>) -> Stmt {
    Stmt::Expr(ExprStmt {
        expr: dummy_literal(parser.current_span()),
    })
}
