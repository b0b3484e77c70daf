//! Statement parsing.
//!
//! One function per statement form, dispatched on the leading token. Block
//! statements consume their own terminators (`END IF`, `NEXT`, `WEND`,
//! `LOOP`, `END SELECT`, `END SUB`, `END FUNCTION`, `END TYPE`).
//!
//! A statement beginning with an identifier, `(`, or `^` is ambiguous
//! between assignment and expression. The left side is parsed with an
//! equality floor, so a top-level `=` is left unconsumed, and the next
//! token decides: `=` makes an assignment, `,` collects multi-assignment
//! targets, anything else leaves an expression statement.

use super::expr::Precedence;
use super::Parser;
use crate::ast::{
    CaseClause, ElseIf, ExitKind, Expr, FieldDecl, Param, PrintSep, Stmt, TypeSpec,
};
use crate::token::TokenKind;

impl<'a, 't> Parser<'a, 't> {
    /// Parses one statement; `None` means an error was recorded.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        match token.kind {
            TokenKind::Import => self.parse_import(),
            TokenKind::Dim => self.parse_dim_list(),
            TokenKind::Let => self.parse_let(),
            TokenKind::Const => self.parse_const(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Input => self.parse_input(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do(),
            TokenKind::Select => self.parse_select(),
            TokenKind::Type => self.parse_type_decl(),
            TokenKind::Sub => self.parse_subprogram(true),
            TokenKind::Function => self.parse_subprogram(false),
            TokenKind::Return => self.parse_return(),
            TokenKind::Exit => self.parse_exit(),
            TokenKind::Goto => self.parse_goto(),
            TokenKind::Spawn => self.parse_spawn(),
            TokenKind::Send => self.parse_send(),
            TokenKind::Receive => self.parse_receive_stmt(),
            TokenKind::Ident if self.peek_is(TokenKind::Colon) => self.parse_label(),
            _ => self.parse_assignment_or_expression(),
        }
    }

    // =========================================================================
    // Simple statements
    // =========================================================================

    fn parse_import(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let path_token = self.cur();
        if !self.expect(TokenKind::Str) {
            return None;
        }
        let alias = if self.cur_is(TokenKind::As) {
            self.advance();
            let alias_token = self.cur();
            if !self.expect(TokenKind::Ident) {
                return None;
            }
            Some(alias_token.literal)
        } else {
            None
        };
        Some(Stmt::Import { token, path: path_token.literal, alias })
    }

    /// `DIM a AS T [= e]` — possibly chained: `DIM a AS T, DIM b AS U`.
    fn parse_dim_list(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        let first = self.parse_dim()?;
        if !(self.cur_is(TokenKind::Comma) && self.peek_is(TokenKind::Dim)) {
            return Some(first);
        }
        let mut dims = vec![first];
        while self.cur_is(TokenKind::Comma) && self.peek_is(TokenKind::Dim) {
            self.advance();
            dims.push(self.parse_dim()?);
        }
        Some(Stmt::BlockStmt { token, stmts: self.ctx.alloc_stmts(dims) })
    }

    fn parse_dim(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        if !self.expect(TokenKind::Dim) {
            return None;
        }
        let name_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        let array_size = if self.cur_is(TokenKind::LParen) {
            self.advance();
            let size = self.parse_expression(Precedence::Lowest)?;
            self.expect(TokenKind::RParen);
            Some(&*self.ctx.alloc_expr(size))
        } else {
            None
        };
        if !self.expect(TokenKind::As) {
            return None;
        }
        let ty = self.parse_type_spec()?;
        let init = if self.cur_is(TokenKind::Eq) {
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            Some(&*self.ctx.alloc_expr(value))
        } else {
            None
        };
        Some(Stmt::Dim {
            token,
            name: name_token.literal,
            ty: self.ctx.alloc_type(ty),
            array_size,
            init,
        })
    }

    fn parse_let(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let name_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        if !self.expect(TokenKind::Eq) {
            return None;
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Let {
            token,
            name: name_token.literal,
            value: self.ctx.alloc_expr(value),
        })
    }

    fn parse_const(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let name_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        if !self.expect(TokenKind::As) {
            return None;
        }
        let ty = self.parse_type_spec()?;
        if !self.expect(TokenKind::Eq) {
            return None;
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Const {
            token,
            name: name_token.literal,
            ty: self.ctx.alloc_type(ty),
            value: self.ctx.alloc_expr(value),
        })
    }

    fn parse_print(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let mut values = Vec::new();
        let mut separators = Vec::new();
        while !self.at_statement_end() {
            let value = self.parse_expression(Precedence::Lowest)?;
            values.push(value);
            match self.cur().kind {
                TokenKind::Comma => {
                    separators.push(PrintSep::Comma);
                    self.advance();
                }
                TokenKind::Semicolon => {
                    separators.push(PrintSep::Semicolon);
                    self.advance();
                }
                _ => break,
            }
            // A trailing separator before end-of-line suppresses the newline.
            if self.at_statement_end() {
                break;
            }
        }
        Some(Stmt::Print {
            token,
            values: self.ctx.alloc_exprs(values),
            separators: self.ctx.alloc_seps(separators),
        })
    }

    fn parse_input(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let prompt = if self.cur_is(TokenKind::Str) {
            let prompt_token = self.cur();
            self.advance();
            self.expect(TokenKind::Semicolon);
            Some(&*self.ctx.alloc_expr(Expr::StringLit {
                token: prompt_token,
                value: prompt_token.literal,
            }))
        } else {
            None
        };
        let var_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        Some(Stmt::Input { token, prompt, var: var_token.literal, var_token })
    }

    fn parse_return(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let mut values = Vec::new();
        if !self.at_statement_end() && !self.at_block_keyword() {
            loop {
                let value = self.parse_expression(Precedence::Lowest)?;
                values.push(value);
                if self.cur_is(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        Some(Stmt::Return { token, values: self.ctx.alloc_exprs(values) })
    }

    fn parse_exit(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let kind = match self.cur().kind {
            TokenKind::For => ExitKind::For,
            TokenKind::While => ExitKind::While,
            TokenKind::Do => ExitKind::Do,
            TokenKind::Sub => ExitKind::Sub,
            TokenKind::Function => ExitKind::Function,
            _ => {
                let found = self.describe(self.cur());
                let diag = self
                    .error_at(self.cur(), format!("expected FOR, WHILE, DO, SUB, or FUNCTION after EXIT, found {}", found));
                self.errors.push(diag);
                return None;
            }
        };
        self.advance();
        Some(Stmt::Exit { token, kind })
    }

    fn parse_goto(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let label_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        Some(Stmt::Goto { token, label: label_token.literal })
    }

    fn parse_label(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance(); // label name
        self.advance(); // colon
        Some(Stmt::Label { token, name: token.literal })
    }

    fn parse_spawn(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let call = self.parse_expression(Precedence::Lowest)?;
        if !matches!(call, Expr::Call { .. }) {
            self.push_error(token, "SPAWN requires a call".to_string());
            return None;
        }
        Some(Stmt::Spawn { token, call: self.ctx.alloc_expr(call) })
    }

    fn parse_send(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::To) {
            return None;
        }
        let channel = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Send {
            token,
            value: self.ctx.alloc_expr(value),
            channel: self.ctx.alloc_expr(channel),
        })
    }

    fn parse_receive_stmt(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let var = self.parse_expression(Precedence::Equality)?;
        if !self.expect(TokenKind::From) {
            return None;
        }
        let channel = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Receive {
            token,
            var: self.ctx.alloc_expr(var),
            channel: self.ctx.alloc_expr(channel),
        })
    }

    fn parse_assignment_or_expression(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        match token.kind {
            TokenKind::Ident | TokenKind::LParen | TokenKind::Caret => {}
            _ => {
                // Any other expression head is a plain expression statement.
                let expr = self.parse_expression(Precedence::Lowest)?;
                return Some(Stmt::ExprStmt { token, expr: self.ctx.alloc_expr(expr) });
            }
        }

        // Parse with an equality floor so a top-level `=` stays unconsumed.
        let left = self.parse_expression(Precedence::Equality)?;

        if self.cur_is(TokenKind::Eq) {
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            return Some(Stmt::Assignment {
                token,
                target: self.ctx.alloc_expr(left),
                value: self.ctx.alloc_expr(value),
            });
        }

        if self.cur_is(TokenKind::Comma) {
            let mut targets = vec![left];
            while self.cur_is(TokenKind::Comma) {
                self.advance();
                let target = self.parse_expression(Precedence::Equality)?;
                targets.push(target);
            }
            if !self.expect(TokenKind::Eq) {
                return None;
            }
            let value = self.parse_expression(Precedence::Lowest)?;
            return Some(Stmt::MultiAssignment {
                token,
                targets: self.ctx.alloc_exprs(targets),
                value: self.ctx.alloc_expr(value),
            });
        }

        Some(Stmt::ExprStmt { token, expr: self.ctx.alloc_expr(left) })
    }

    // =========================================================================
    // Block statements
    // =========================================================================

    fn parse_if(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::Then) {
            return None;
        }

        let then_block = self.parse_block(|p| p.at_if_end() || p.cur_is(TokenKind::ElseIf) || p.cur_is(TokenKind::Else));

        let mut elseifs = Vec::new();
        while self.cur_is(TokenKind::ElseIf) {
            let clause_token = self.cur();
            self.advance();
            let clause_cond = self.parse_expression(Precedence::Lowest)?;
            if !self.expect(TokenKind::Then) {
                return None;
            }
            let block = self.parse_block(|p| {
                p.at_if_end() || p.cur_is(TokenKind::ElseIf) || p.cur_is(TokenKind::Else)
            });
            elseifs.push(ElseIf {
                token: clause_token,
                cond: self.ctx.alloc_expr(clause_cond),
                block,
            });
        }

        let else_block = if self.cur_is(TokenKind::Else) {
            self.advance();
            Some(self.parse_block(|p| p.at_if_end()))
        } else {
            None
        };

        self.consume_if_end();
        Some(Stmt::If {
            token,
            cond: self.ctx.alloc_expr(cond),
            then_block,
            elseifs: self.ctx.alloc_elseifs(elseifs),
            else_block,
        })
    }

    fn parse_for(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let var_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        if !self.expect(TokenKind::Eq) {
            return None;
        }
        let start = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::To) {
            return None;
        }
        let end = self.parse_expression(Precedence::Lowest)?;
        let step = if self.cur_is(TokenKind::Step) {
            self.advance();
            let step = self.parse_expression(Precedence::Lowest)?;
            Some(&*self.ctx.alloc_expr(step))
        } else {
            None
        };

        let body = self.parse_block(|p| p.cur_is(TokenKind::Next));
        if self.expect(TokenKind::Next) {
            // `NEXT i` — the counter name is optional and ignored.
            if self.cur_is(TokenKind::Ident) {
                self.advance();
            }
        }
        Some(Stmt::For {
            token,
            var: var_token.literal,
            start: self.ctx.alloc_expr(start),
            end: self.ctx.alloc_expr(end),
            step,
            body,
        })
    }

    fn parse_while(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let cond = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block(|p| p.cur_is(TokenKind::Wend));
        self.expect(TokenKind::Wend);
        Some(Stmt::While { token, cond: self.ctx.alloc_expr(cond), body })
    }

    fn parse_do(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();

        let mut cond = None;
        let mut is_while = true;
        let mut pre_condition = false;
        if self.cur_is(TokenKind::While) || self.cur_is(TokenKind::Until) {
            is_while = self.cur_is(TokenKind::While);
            pre_condition = true;
            self.advance();
            let parsed = self.parse_expression(Precedence::Lowest)?;
            cond = Some(&*self.ctx.alloc_expr(parsed));
        }

        let body = self.parse_block(|p| p.cur_is(TokenKind::Loop));
        if !self.expect(TokenKind::Loop) {
            return None;
        }

        if self.cur_is(TokenKind::While) || self.cur_is(TokenKind::Until) {
            if pre_condition {
                self.push_error(
                    token,
                    "DO and LOOP cannot both carry a condition".to_string(),
                );
            } else {
                is_while = self.cur_is(TokenKind::While);
                self.advance();
                let parsed = self.parse_expression(Precedence::Lowest)?;
                cond = Some(&*self.ctx.alloc_expr(parsed));
            }
        }

        Some(Stmt::DoLoop { token, cond, body, is_while, pre_condition })
    }

    fn parse_select(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        if !self.expect(TokenKind::Case) {
            return None;
        }
        let test = self.parse_expression(Precedence::Lowest)?;

        let mut cases = Vec::new();
        let mut default = None;
        self.skip_terminators();
        while !self.at_select_end() && !self.cur_is(TokenKind::Eof) {
            let case_token = self.cur();
            if !self.expect(TokenKind::Case) {
                self.synchronize();
                self.skip_terminators();
                continue;
            }
            if self.cur_is(TokenKind::Else) {
                self.advance();
                let block = self.parse_block(|p| p.cur_is(TokenKind::Case) || p.at_select_end());
                if default.is_some() {
                    self.push_error(case_token, "duplicate CASE ELSE".to_string());
                }
                default = Some(block);
            } else {
                let mut values = Vec::new();
                loop {
                    let value = self.parse_expression(Precedence::Lowest)?;
                    values.push(value);
                    if self.cur_is(TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                let block = self.parse_block(|p| p.cur_is(TokenKind::Case) || p.at_select_end());
                cases.push(CaseClause {
                    token: case_token,
                    values: self.ctx.alloc_exprs(values),
                    block,
                });
            }
            self.skip_terminators();
        }
        self.consume_end_pair(TokenKind::Select);
        Some(Stmt::Select {
            token,
            test: self.ctx.alloc_expr(test),
            cases: self.ctx.alloc_cases(cases),
            default,
        })
    }

    fn parse_type_decl(&mut self) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();
        let name_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        let implements = if self.cur_is(TokenKind::Implements) {
            self.advance();
            let iface_token = self.cur();
            if !self.expect(TokenKind::Ident) {
                return None;
            }
            Some(iface_token.literal)
        } else {
            None
        };

        let mut embedded = Vec::new();
        let mut fields = Vec::new();
        self.skip_terminators();
        while !self.at_end_pair(TokenKind::Type) && !self.cur_is(TokenKind::Eof) {
            if self.cur_is(TokenKind::Embed) {
                self.advance();
                let base_token = self.cur();
                if !self.expect(TokenKind::Ident) {
                    return None;
                }
                embedded.push(base_token.literal);
            } else {
                let field_token = self.cur();
                if !self.expect(TokenKind::Ident) {
                    self.synchronize();
                    self.skip_terminators();
                    continue;
                }
                if !self.expect(TokenKind::As) {
                    return None;
                }
                let ty = self.parse_type_spec()?;
                fields.push(FieldDecl {
                    token: field_token,
                    name: field_token.literal,
                    ty: self.ctx.alloc_type(ty),
                });
            }
            self.skip_terminators();
        }
        self.consume_end_pair(TokenKind::Type);
        Some(Stmt::TypeDecl {
            token,
            name: name_token.literal,
            implements,
            embedded: self.ctx.alloc_syms(embedded),
            fields: self.ctx.alloc_fields(fields),
        })
    }

    /// `SUB name(...)`, `FUNCTION name(...) AS R`, or the method forms
    /// `SUB (recv AS T) name(...)` / `FUNCTION (recv AS T) name(...) AS R`.
    fn parse_subprogram(&mut self, is_sub: bool) -> Option<Stmt<'a>> {
        let token = self.cur();
        self.advance();

        // Method form: a receiver parenthesis right after the keyword.
        let receiver = if self.cur_is(TokenKind::LParen) {
            self.advance();
            let recv_token = self.cur();
            if !self.expect(TokenKind::Ident) {
                return None;
            }
            if !self.expect(TokenKind::As) {
                return None;
            }
            let recv_type = self.parse_type_spec()?;
            self.expect(TokenKind::RParen);
            Some((recv_token.literal, self.ctx.alloc_type(recv_type)))
        } else {
            None
        };

        let name_token = self.cur();
        if !self.expect(TokenKind::Ident) {
            return None;
        }

        let params = self.parse_params()?;

        let returns: Vec<TypeSpec<'a>> = if !is_sub {
            if !self.expect(TokenKind::As) {
                return None;
            }
            self.parse_return_types()?
        } else {
            Vec::new()
        };

        let ender = if is_sub { TokenKind::Sub } else { TokenKind::Function };
        let body = self.parse_block(|p| p.at_end_pair(ender));
        self.consume_end_pair(ender);

        match receiver {
            Some((receiver_name, receiver_type)) => Some(Stmt::Method {
                token,
                receiver_name,
                receiver_type,
                name: name_token.literal,
                params,
                returns: self.ctx.alloc_types(returns),
                body,
            }),
            None if is_sub => Some(Stmt::Sub {
                token,
                name: name_token.literal,
                params,
                body,
            }),
            None => Some(Stmt::Function {
                token,
                name: name_token.literal,
                params,
                returns: self.ctx.alloc_types(returns),
                body,
            }),
        }
    }

    fn parse_params(&mut self) -> Option<&'a [Param<'a>]> {
        if !self.expect(TokenKind::LParen) {
            return None;
        }
        let mut params = Vec::new();
        self.skip_terminators();
        while !self.cur_is(TokenKind::RParen) && !self.cur_is(TokenKind::Eof) {
            let by_ref = if self.cur_is(TokenKind::ByRef) {
                self.advance();
                true
            } else {
                false
            };
            let name_token = self.cur();
            if !self.expect(TokenKind::Ident) {
                return None;
            }
            if !self.expect(TokenKind::As) {
                return None;
            }
            let ty = self.parse_type_spec()?;
            params.push(Param {
                token: name_token,
                name: name_token.literal,
                ty: self.ctx.alloc_type(ty),
                by_ref,
            });
            self.skip_terminators();
            if self.cur_is(TokenKind::Comma) {
                self.advance();
                self.skip_terminators();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        Some(self.ctx.alloc_params(params))
    }

    /// `AS T` or `AS (T1, T2, ...)` after a function's parameter list.
    fn parse_return_types(&mut self) -> Option<Vec<TypeSpec<'a>>> {
        if self.cur_is(TokenKind::LParen) {
            self.advance();
            let mut types = Vec::new();
            while !self.cur_is(TokenKind::RParen) && !self.cur_is(TokenKind::Eof) {
                types.push(self.parse_type_spec()?);
                if self.cur_is(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
            Some(types)
        } else {
            Some(vec![self.parse_type_spec()?])
        }
    }

    // =========================================================================
    // Block plumbing
    // =========================================================================

    /// Parses statements until `stop` says the block is over (or EOF).
    fn parse_block(&mut self, stop: impl Fn(&Self) -> bool) -> &'a [Stmt<'a>] {
        let mut stmts = Vec::new();
        self.skip_terminators();
        while !self.cur_is(TokenKind::Eof) && !stop(self) {
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
            if self.pos == before {
                self.advance();
            }
            self.skip_terminators();
        }
        self.ctx.alloc_stmts(stmts)
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.cur().kind,
            TokenKind::Newline | TokenKind::Comment | TokenKind::Eof
        )
    }

    /// True at keywords that close or continue an enclosing block; used by
    /// single-line forms like `IF c THEN RETURN 0 ENDIF`.
    fn at_block_keyword(&self) -> bool {
        matches!(
            self.cur().kind,
            TokenKind::EndIf
                | TokenKind::End
                | TokenKind::Else
                | TokenKind::ElseIf
                | TokenKind::Next
                | TokenKind::Wend
                | TokenKind::Loop
                | TokenKind::Case
        )
    }

    pub(crate) fn at_if_end(&self) -> bool {
        self.cur_is(TokenKind::EndIf) || self.at_end_pair(TokenKind::If)
    }

    fn consume_if_end(&mut self) {
        if self.cur_is(TokenKind::EndIf) {
            self.advance();
            return;
        }
        self.consume_end_pair(TokenKind::If);
    }

    pub(crate) fn at_select_end(&self) -> bool {
        self.at_end_pair(TokenKind::Select)
    }

    /// True at `END <kind>`.
    pub(crate) fn at_end_pair(&self, kind: TokenKind) -> bool {
        self.cur_is(TokenKind::End) && self.peek().kind == kind
    }

    fn consume_end_pair(&mut self, kind: TokenKind) {
        if self.at_end_pair(kind) {
            self.advance();
            self.advance();
            return;
        }
        let found = self.describe(self.cur());
        let expected = match kind {
            TokenKind::If => "END IF",
            TokenKind::Select => "END SELECT",
            TokenKind::Type => "END TYPE",
            TokenKind::Sub => "END SUB",
            TokenKind::Function => "END FUNCTION",
            _ => "END",
        };
        let diag = self.error_at(self.cur(), format!("expected {}, found {}", expected, found));
        self.errors.push(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::{AstArenas, AstContext};
    use crate::ast::print::program_to_source;
    use crate::lexer::Lexer;
    use dbas_base::Interner;

    /// Parses, renders, and asserts there were no errors.
    fn roundtrip(source: &str) -> String {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let mut parser = Parser::new(&tokens, ctx, &interner, source);
        let stmts = parser.parse_program();
        assert!(parser.errors.is_empty(), "errors: {:#?}", parser.errors);
        program_to_source(&stmts, &interner)
    }

    fn parse_errors(source: &str) -> Vec<String> {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let mut parser = Parser::new(&tokens, ctx, &interner, source);
        parser.parse_program();
        parser.errors.into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn dim_with_initializer() {
        assert_eq!(roundtrip("DIM x AS INTEGER = 5\n"), "DIM x AS INTEGER = 5\n");
    }

    #[test]
    fn dim_array_form() {
        assert_eq!(roundtrip("DIM xs(10) AS INTEGER\n"), "DIM xs(10) AS INTEGER\n");
    }

    #[test]
    fn chained_dims_on_one_line() {
        let out = roundtrip("DIM q AS INTEGER, DIM ok AS BOOLEAN\n");
        assert!(out.contains("DIM q AS INTEGER"));
        assert!(out.contains("DIM ok AS BOOLEAN"));
    }

    #[test]
    fn assignment_statement() {
        assert_eq!(roundtrip("x = 1 + 2\n"), "x = (1 + 2)\n");
    }

    #[test]
    fn member_assignment() {
        assert_eq!(roundtrip("p.x = 3\n"), "p.x = 3\n");
    }

    #[test]
    fn dereference_assignment() {
        assert_eq!(roundtrip("^p = 5\n"), "(^p) = 5\n");
    }

    #[test]
    fn multi_assignment() {
        assert_eq!(roundtrip("q, ok = Divide(10, 2)\n"), "q, ok = Divide(10, 2)\n");
    }

    #[test]
    fn assignment_keeps_comparison_on_rhs() {
        assert_eq!(roundtrip("eq = a = b\n"), "eq = (a = b)\n");
    }

    #[test]
    fn print_with_separators() {
        assert_eq!(roundtrip("PRINT a, b; c\n"), "PRINT a, b; c\n");
        assert_eq!(roundtrip("PRINT a;\n"), "PRINT a;\n");
    }

    #[test]
    fn input_with_prompt() {
        assert_eq!(roundtrip("INPUT \"name? \"; n\n"), "INPUT \"name? \"; n\n");
    }

    #[test]
    fn if_elseif_else() {
        let source = "IF a THEN\nPRINT 1\nELSEIF b THEN\nPRINT 2\nELSE\nPRINT 3\nEND IF\n";
        let out = roundtrip(source);
        assert!(out.contains("IF a THEN"));
        assert!(out.contains("ELSEIF b THEN"));
        assert!(out.contains("ELSE"));
        assert!(out.ends_with("END IF\n"));
    }

    #[test]
    fn single_line_if_with_endif() {
        let out = roundtrip("IF b = 0 THEN RETURN 0, FALSE ENDIF\n");
        assert!(out.contains("RETURN 0, FALSE"));
    }

    #[test]
    fn for_loop_with_step() {
        let out = roundtrip("FOR i = 10 TO 1 STEP -1\nPRINT i\nNEXT\n");
        assert!(out.starts_with("FOR i = 10 TO 1 STEP (-1)"));
        assert!(out.ends_with("NEXT\n"));
    }

    #[test]
    fn next_with_counter_name() {
        let out = roundtrip("FOR i = 1 TO 3\nPRINT i\nNEXT i\n");
        assert!(out.ends_with("NEXT\n"));
    }

    #[test]
    fn while_wend() {
        let out = roundtrip("WHILE x < 10\nx = x + 1\nWEND\n");
        assert!(out.starts_with("WHILE (x < 10)"));
        assert!(out.ends_with("WEND\n"));
    }

    #[test]
    fn do_loop_post_condition() {
        let out = roundtrip("DO\nx = x + 1\nLOOP UNTIL x > 3\n");
        assert!(out.ends_with("LOOP UNTIL (x > 3)\n"));
    }

    #[test]
    fn do_loop_pre_condition() {
        let out = roundtrip("DO WHILE x < 3\nx = x + 1\nLOOP\n");
        assert!(out.starts_with("DO WHILE (x < 3)"));
    }

    #[test]
    fn select_case_with_default() {
        let source =
            "SELECT CASE n\nCASE 1, 2\nPRINT \"small\"\nCASE 3\nPRINT \"three\"\nCASE ELSE\nPRINT \"big\"\nEND SELECT\n";
        let out = roundtrip(source);
        assert!(out.contains("SELECT CASE n"));
        assert!(out.contains("CASE 1, 2"));
        assert!(out.contains("CASE ELSE"));
        assert!(out.ends_with("END SELECT\n"));
    }

    #[test]
    fn type_declaration_with_embed_and_implements() {
        let source = "TYPE Dog IMPLEMENTS Animal\nEMBED Base\nname AS STRING\nage AS INTEGER\nEND TYPE\n";
        let out = roundtrip(source);
        assert!(out.contains("TYPE Dog IMPLEMENTS Animal"));
        assert!(out.contains("EMBED Base"));
        assert!(out.contains("name AS STRING"));
    }

    #[test]
    fn sub_declaration() {
        let out = roundtrip("SUB Main()\nPRINT \"hi\"\nEND SUB\n");
        assert!(out.starts_with("SUB Main()"));
        assert!(out.ends_with("END SUB\n"));
    }

    #[test]
    fn function_with_multiple_returns() {
        let source = "FUNCTION Divide(a AS INTEGER, b AS INTEGER) AS (INTEGER, BOOLEAN)\nRETURN a / b, TRUE\nEND FUNCTION\n";
        let out = roundtrip(source);
        assert!(out.contains("AS (INTEGER, BOOLEAN)"));
        assert!(out.contains("RETURN (a / b), TRUE"));
    }

    #[test]
    fn method_form() {
        let source = "FUNCTION (d AS Dog) Speak() AS STRING\nRETURN d.name\nEND FUNCTION\n";
        let out = roundtrip(source);
        assert!(out.starts_with("FUNCTION (d AS Dog) Speak() AS STRING"));
    }

    #[test]
    fn sub_method_form() {
        let source = "SUB (d AS Dog) Reset()\nd.age = 0\nEND SUB\n";
        let out = roundtrip(source);
        assert!(out.starts_with("SUB (d AS Dog) Reset()"));
    }

    #[test]
    fn byref_parameter() {
        let out = roundtrip("SUB Bump(BYREF n AS INTEGER)\nn = n + 1\nEND SUB\n");
        assert!(out.contains("BYREF n AS INTEGER"));
    }

    #[test]
    fn import_with_alias() {
        assert_eq!(
            roundtrip("IMPORT \"net/http\" AS web\n"),
            "IMPORT \"net/http\" AS web\n"
        );
    }

    #[test]
    fn channel_statements() {
        let source = "SEND 42 TO ch\nRECEIVE x FROM ch\nSPAWN Work(1)\n";
        let out = roundtrip(source);
        assert!(out.contains("SEND 42 TO ch"));
        assert!(out.contains("RECEIVE x FROM ch"));
        assert!(out.contains("SPAWN Work(1)"));
    }

    #[test]
    fn labels_and_goto() {
        let out = roundtrip("again:\nx = x + 1\nGOTO again\n");
        assert!(out.starts_with("again:"));
        assert!(out.contains("GOTO again"));
    }

    #[test]
    fn exit_kinds() {
        let out = roundtrip("FOR i = 1 TO 3\nEXIT FOR\nNEXT\n");
        assert!(out.contains("EXIT FOR"));
    }

    #[test]
    fn spawn_requires_a_call() {
        let errors = parse_errors("SPAWN 42\n");
        assert!(errors.iter().any(|e| e.contains("SPAWN requires a call")));
    }

    #[test]
    fn comments_are_skipped_between_statements() {
        let out = roundtrip("' header\nPRINT 1 ' trailing\nPRINT 2\n");
        assert!(out.contains("PRINT 1"));
        assert!(out.contains("PRINT 2"));
    }

    #[test]
    fn parse_then_reparse_is_stable() {
        let source = "SUB Main()\nDIM total AS INTEGER = 0\nFOR i = 1 TO 10\ntotal = total + i\nNEXT\nPRINT total\nEND SUB\n";
        let first = roundtrip(source);
        let second = roundtrip(&first);
        assert_eq!(first, second);
    }
}
