//! Declaration parsing: label/const/type/var blocks, routines, uses.

use tpc_lex::TokenKind;

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses a `uses` clause: `uses a, b, c;`.
    pub(crate) fn parse_uses_clause(&mut self) -> Vec<String> {
        self.expect(TokenKind::Uses);
        let mut names = Vec::new();
        loop {
            match self.expect_identifier("unit name") {
                Some(name) => names.push(name),
                None => {
                    self.recover_to_sync_point();
                    return names;
                }
            }
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semicolon);
        names
    }

    /// Parses declaration blocks until a non-declaration token.
    ///
    /// The blocks are order-insensitive and may repeat. With
    /// `headers_only` set (unit interface sections), routines are parsed
    /// as signatures without bodies.
    pub(crate) fn parse_decls(&mut self, headers_only: bool) -> Vec<Decl> {
        let mut decls = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Label => self.parse_label_block(&mut decls),
                TokenKind::Const => self.parse_const_block(&mut decls),
                TokenKind::Type => self.parse_type_block(&mut decls),
                TokenKind::Var => self.parse_var_block(&mut decls),
                TokenKind::Procedure | TokenKind::Function => {
                    if let Some(decl) = self.parse_routine(headers_only) {
                        decls.push(decl);
                    } else {
                        self.recover_to_sync_point();
                    }
                }
                _ => return decls,
            }
        }
    }

    /// `label 10, 20;`
    fn parse_label_block(&mut self, decls: &mut Vec<Decl>) {
        let start = self.span();
        self.advance();

        let mut labels = Vec::new();
        loop {
            if self.check(TokenKind::IntLiteral) || self.check(TokenKind::Identifier) {
                labels.push(self.current().lexeme.clone());
                self.advance();
            } else {
                self.error_here("expected label");
                self.recover_to_sync_point();
                break;
            }
            if !self.match_token(TokenKind::Comma) {
                self.expect(TokenKind::Semicolon);
                break;
            }
        }

        decls.push(Decl::Labels(labels, start.to(self.prev_span())));
    }

    /// `const Name = value; ...` - also accepts typed constants
    /// (`const Origin: TPoint = ...;`), which declare an initialised
    /// variable.
    fn parse_const_block(&mut self, decls: &mut Vec<Decl>) {
        self.advance();

        while self.check(TokenKind::Identifier) {
            let start = self.span();
            let name = self.current().lexeme.clone();
            self.advance();

            if self.match_token(TokenKind::Colon) {
                // Typed constant: a variable with an initializer.
                let Some(ty) = self.parse_type_expr() else {
                    self.recover_to_sync_point();
                    continue;
                };
                self.expect(TokenKind::Equal);
                let Some(init) = self.parse_expression() else {
                    self.recover_to_sync_point();
                    continue;
                };
                self.expect(TokenKind::Semicolon);
                decls.push(Decl::Var(VarDecl {
                    names: vec![name],
                    ty,
                    init: Some(init),
                    span: start.to(self.prev_span()),
                }));
                continue;
            }

            self.expect(TokenKind::Equal);
            let Some(value) = self.parse_expression() else {
                self.recover_to_sync_point();
                continue;
            };
            self.expect(TokenKind::Semicolon);
            decls.push(Decl::Const(ConstDecl {
                name,
                value,
                span: start.to(self.prev_span()),
            }));
        }
    }

    /// `type Name = type-expression; ...`
    fn parse_type_block(&mut self, decls: &mut Vec<Decl>) {
        self.advance();

        while self.check(TokenKind::Identifier) {
            let start = self.span();
            let name = self.current().lexeme.clone();
            self.advance();

            self.expect(TokenKind::Equal);
            let Some(ty) = self.parse_type_expr() else {
                self.recover_to_sync_point();
                continue;
            };
            self.expect(TokenKind::Semicolon);
            decls.push(Decl::TypeDef(TypeDecl {
                name,
                ty,
                span: start.to(self.prev_span()),
            }));
        }
    }

    /// `var a, b: T; c: U = init; ...`
    fn parse_var_block(&mut self, decls: &mut Vec<Decl>) {
        self.advance();

        while self.check(TokenKind::Identifier) {
            let start = self.span();
            let mut names = Vec::new();
            loop {
                match self.expect_identifier("variable name") {
                    Some(name) => names.push(name),
                    None => {
                        self.recover_to_sync_point();
                        return;
                    }
                }
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }

            if !self.expect(TokenKind::Colon) {
                self.recover_to_sync_point();
                continue;
            }
            let Some(ty) = self.parse_type_expr() else {
                self.recover_to_sync_point();
                continue;
            };

            let init = if self.match_token(TokenKind::Equal) {
                self.parse_expression()
            } else {
                None
            };

            self.expect(TokenKind::Semicolon);
            decls.push(Decl::Var(VarDecl {
                names,
                ty,
                init,
                span: start.to(self.prev_span()),
            }));
        }
    }

    /// Parses a procedure or function declaration.
    ///
    /// With `header_only`, stops after the signature (interface section).
    /// Otherwise the signature is followed by `forward;`, or by nested
    /// declarations and a body.
    pub(crate) fn parse_routine(&mut self, header_only: bool) -> Option<Decl> {
        let start = self.span();
        let is_function = self.check(TokenKind::Function);
        self.advance();

        let name = self.expect_identifier("routine name")?;

        let params = if self.check(TokenKind::LParen) {
            self.parse_param_list()?
        } else {
            Vec::new()
        };

        let ret = if is_function {
            if !self.expect(TokenKind::Colon) {
                return None;
            }
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon);

        if header_only {
            return Some(Decl::Routine(RoutineDecl {
                name,
                params,
                ret,
                decls: Vec::new(),
                body: None,
                span: start.to(self.prev_span()),
            }));
        }

        if self.match_token(TokenKind::Forward) {
            self.expect(TokenKind::Semicolon);
            return Some(Decl::Routine(RoutineDecl {
                name,
                params,
                ret,
                decls: Vec::new(),
                body: None,
                span: start.to(self.prev_span()),
            }));
        }

        let decls = self.parse_decls(false);
        let body = self.parse_compound();
        self.expect(TokenKind::Semicolon);

        Some(Decl::Routine(RoutineDecl {
            name,
            params,
            ret,
            decls,
            body: Some(body),
            span: start.to(self.prev_span()),
        }))
    }

    /// `(a, b: integer; var s: string; const t: string)`
    fn parse_param_list(&mut self) -> Option<Vec<ParamGroup>> {
        self.expect(TokenKind::LParen);
        let mut groups = Vec::new();

        if self.match_token(TokenKind::RParen) {
            return Some(groups);
        }

        loop {
            let mode = if self.match_token(TokenKind::Var) {
                ParamMode::Var
            } else if self.match_token(TokenKind::Const) {
                ParamMode::Const
            } else {
                ParamMode::Value
            };

            let mut names = Vec::new();
            loop {
                names.push(self.expect_identifier("parameter name")?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }

            if !self.expect(TokenKind::Colon) {
                return None;
            }
            let ty = self.parse_type_expr()?;
            groups.push(ParamGroup { names, ty, mode });

            if !self.match_token(TokenKind::Semicolon) {
                break;
            }
        }

        self.expect(TokenKind::RParen);
        Some(groups)
    }
}
