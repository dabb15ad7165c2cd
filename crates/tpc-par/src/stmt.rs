//! Statement parsing.

use tpc_lex::TokenKind;

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses a `begin ... end` compound statement.
    pub(crate) fn parse_compound(&mut self) -> Stmt {
        let start = self.span();
        self.expect(TokenKind::Begin);

        let mut stmts = Vec::new();
        while !self.check(TokenKind::End) && !self.at_end() {
            let before = self.position;
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.recover_to_sync_point(),
            }
            if !self.match_token(TokenKind::Semicolon) && !self.check(TokenKind::End) {
                self.error_here("expected ';' between statements");
                self.recover_to_sync_point();
            }
            // Recovery can stop at a token this loop does not own;
            // force progress so a bad token cannot wedge the parser.
            if self.position == before {
                self.advance();
            }
        }
        self.expect(TokenKind::End);

        Stmt {
            kind: StmtKind::Compound(stmts),
            span: start.to(self.prev_span()),
        }
    }

    /// Parses a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        let start = self.span();

        // `label: statement`
        if self.check(TokenKind::IntLiteral) && self.peek_kind() == TokenKind::Colon {
            let label = self.current().lexeme.clone();
            self.advance();
            self.advance();
            let stmt = self.parse_statement()?;
            let span = start.to(self.prev_span());
            return Some(Stmt {
                kind: StmtKind::Labeled {
                    label,
                    stmt: Box::new(stmt),
                },
                span,
            });
        }

        match self.kind() {
            TokenKind::Begin => Some(self.parse_compound()),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::For => self.parse_for(),
            TokenKind::Case => self.parse_case(),
            TokenKind::With => self.parse_with(),
            TokenKind::Goto => {
                self.advance();
                if self.check(TokenKind::IntLiteral) || self.check(TokenKind::Identifier) {
                    let label = self.current().lexeme.clone();
                    self.advance();
                    Some(Stmt {
                        kind: StmtKind::Goto(label),
                        span: start.to(self.prev_span()),
                    })
                } else {
                    self.error_here("expected label after 'goto'");
                    None
                }
            }
            TokenKind::Break => {
                self.advance();
                Some(Stmt {
                    kind: StmtKind::Break,
                    span: start,
                })
            }
            TokenKind::Continue => {
                self.advance();
                Some(Stmt {
                    kind: StmtKind::Continue,
                    span: start,
                })
            }
            // Empty statement: stray `;` or a terminator owned by the caller.
            TokenKind::Semicolon | TokenKind::End | TokenKind::Until | TokenKind::Else => {
                Some(Stmt {
                    kind: StmtKind::Empty,
                    span: start,
                })
            }
            TokenKind::Identifier => self.parse_simple_statement(),
            _ => {
                self.error_here(format!(
                    "expected statement, found {}",
                    self.kind().describe()
                ));
                None
            }
        }
    }

    /// Assignment or call: both start with a designator.
    fn parse_simple_statement(&mut self) -> Option<Stmt> {
        let start = self.span();
        let name = self.current().lexeme.clone();
        self.advance();
        let ident = self.mk_expr(ExprKind::Ident(name), start);
        let target = self.parse_postfix(ident)?;

        if self.match_token(TokenKind::Assign) {
            let value = self.parse_expression()?;
            let span = start.to(self.prev_span());
            return Some(Stmt {
                kind: StmtKind::Assign { target, value },
                span,
            });
        }

        // A call statement: either an explicit `f(...)` or a bare routine
        // identifier, which is treated as a call.
        match target.kind {
            ExprKind::Call { .. } | ExprKind::Ident(_) => {
                let span = start.to(self.prev_span());
                Some(Stmt {
                    kind: StmtKind::Call(target),
                    span,
                })
            }
            _ => {
                self.error_at(target.span, "expected ':=' or a call");
                None
            }
        }
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.span();
        self.advance();

        let cond = self.parse_expression()?;
        if !self.expect(TokenKind::Then) {
            return None;
        }
        let then_branch = self.parse_statement()?;

        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        let span = start.to(self.prev_span());
        Some(Stmt {
            kind: StmtKind::If {
                cond,
                then_branch: Box::new(then_branch),
                else_branch,
            },
            span,
        })
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.span();
        self.advance();

        let cond = self.parse_expression()?;
        if !self.expect(TokenKind::Do) {
            return None;
        }
        let body = self.parse_statement()?;

        let span = start.to(self.prev_span());
        Some(Stmt {
            kind: StmtKind::While {
                cond,
                body: Box::new(body),
            },
            span,
        })
    }

    fn parse_repeat(&mut self) -> Option<Stmt> {
        let start = self.span();
        self.advance();

        let mut body = Vec::new();
        while !self.check(TokenKind::Until) && !self.at_end() {
            let before = self.position;
            match self.parse_statement() {
                Some(stmt) => body.push(stmt),
                None => self.recover_to_sync_point(),
            }
            if !self.match_token(TokenKind::Semicolon) && !self.check(TokenKind::Until) {
                self.error_here("expected ';' between statements");
                self.recover_to_sync_point();
            }
            if self.position == before {
                self.advance();
            }
        }
        self.expect(TokenKind::Until);
        let until = self.parse_expression()?;

        let span = start.to(self.prev_span());
        Some(Stmt {
            kind: StmtKind::Repeat { body, until },
            span,
        })
    }

    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.span();
        self.advance();

        let var_span = self.span();
        let var_name = self.expect_identifier("loop variable")?;
        let var = self.mk_expr(ExprKind::Ident(var_name), var_span);

        if !self.expect(TokenKind::Assign) {
            return None;
        }
        let start_value = self.parse_expression()?;

        let downto = match self.kind() {
            TokenKind::To => {
                self.advance();
                false
            }
            TokenKind::Downto => {
                self.advance();
                true
            }
            _ => {
                self.error_here("expected 'to' or 'downto'");
                return None;
            }
        };

        let end_value = self.parse_expression()?;
        if !self.expect(TokenKind::Do) {
            return None;
        }
        let body = self.parse_statement()?;

        let span = start.to(self.prev_span());
        Some(Stmt {
            kind: StmtKind::For {
                var,
                start: start_value,
                end: end_value,
                downto,
                body: Box::new(body),
            },
            span,
        })
    }

    fn parse_case(&mut self) -> Option<Stmt> {
        let start = self.span();
        self.advance();

        let selector = self.parse_expression()?;
        if !self.expect(TokenKind::Of) {
            return None;
        }

        let mut arms = Vec::new();
        while !self.check(TokenKind::End) && !self.check(TokenKind::Else) && !self.at_end() {
            let before = self.position;
            let mut labels = Vec::new();
            loop {
                labels.push(self.parse_range_item()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            if !self.expect(TokenKind::Colon) {
                return None;
            }
            let body = self.parse_statement()?;
            arms.push(CaseArm {
                labels,
                body: Box::new(body),
            });

            if !self.match_token(TokenKind::Semicolon)
                && !self.check(TokenKind::End)
                && !self.check(TokenKind::Else)
            {
                self.error_here("expected ';' between case branches");
                self.recover_to_sync_point();
            }
            if self.position == before {
                self.advance();
            }
        }

        let else_branch = if self.match_token(TokenKind::Else) {
            let mut stmts = Vec::new();
            while !self.check(TokenKind::End) && !self.at_end() {
                let before = self.position;
                match self.parse_statement() {
                    Some(stmt) => stmts.push(stmt),
                    None => self.recover_to_sync_point(),
                }
                if !self.match_token(TokenKind::Semicolon) && !self.check(TokenKind::End) {
                    break;
                }
                if self.position == before {
                    self.advance();
                }
            }
            Some(stmts)
        } else {
            None
        };

        self.expect(TokenKind::End);

        let span = start.to(self.prev_span());
        Some(Stmt {
            kind: StmtKind::Case {
                selector,
                arms,
                else_branch,
            },
            span,
        })
    }

    fn parse_with(&mut self) -> Option<Stmt> {
        let start = self.span();
        self.advance();

        let mut targets = Vec::new();
        loop {
            targets.push(self.parse_expression()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        if !self.expect(TokenKind::Do) {
            return None;
        }
        let body = self.parse_statement()?;

        let span = start.to(self.prev_span());
        Some(Stmt {
            kind: StmtKind::With {
                targets,
                body: Box::new(body),
            },
            span,
        })
    }
}
