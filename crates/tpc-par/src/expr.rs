//! Expression parsing.
//!
//! Pascal has four infix precedence levels, here expressed as binding
//! powers for the precedence-climbing loop:
//!
//! | Level | Operators | BP |
//! |-------|-----------|----|
//! | 1 | `=` `<>` `<` `<=` `>` `>=` `in` | 2,3 |
//! | 2 | `+` `-` `or` `xor` | 4,5 |
//! | 3 | `*` `/` `div` `mod` `and` `shl` `shr` | 6,7 |
//! | 4 | unary `+` `-` `not` `@` | prefix |
//!
//! Postfix forms (`.field`, `[indices]`, `^`, `(args)`) bind tighter than
//! everything and associate left. `..` is not an infix operator; ranges
//! are parsed only where the grammar allows them (set constructors, case
//! labels, type bounds) via [`Parser::parse_range_item`].

use tpc_lex::{decode_string_lexeme, TokenKind};

use crate::ast::*;
use crate::Parser;

/// Binding power of the unary operators: tighter than multiplicative.
const UNARY_BP: u8 = 8;

impl<'a> Parser<'a> {
    /// Parses a complete expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parses an expression, or an `lo..hi` range where one is allowed.
    pub(crate) fn parse_range_item(&mut self) -> Option<Expr> {
        let lo = self.parse_expression()?;
        if self.match_token(TokenKind::DotDot) {
            let hi = self.parse_expression()?;
            let span = lo.span.to(hi.span);
            Some(self.mk_expr(
                ExprKind::Range {
                    lo: Box::new(lo),
                    hi: Box::new(hi),
                },
                span,
            ))
        } else {
            Some(lo)
        }
    }

    /// Precedence-climbing core.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let (_, rbp) = match self.infix_binding_power() {
                Some(bp) if bp.0 >= min_bp => bp,
                _ => break,
            };

            let op = self.token_to_binop(self.kind())?;
            self.advance();

            let rhs = self.parse_expr_bp(rbp)?;
            let span = lhs.span.to(rhs.span);
            lhs = self.mk_expr(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Some(lhs)
    }

    /// Binding powers of the current token as an infix operator.
    fn infix_binding_power(&self) -> Option<(u8, u8)> {
        match self.kind() {
            TokenKind::Equal
            | TokenKind::NotEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::In => Some((2, 3)),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Or | TokenKind::Xor => Some((4, 5)),
            TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Div
            | TokenKind::Mod
            | TokenKind::And
            | TokenKind::Shl
            | TokenKind::Shr => Some((6, 7)),
            _ => None,
        }
    }

    /// Maps an operator token to its [`BinOp`].
    fn token_to_binop(&self, kind: TokenKind) -> Option<BinOp> {
        Some(match kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Div => BinOp::IntDiv,
            TokenKind::Mod => BinOp::Mod,
            TokenKind::And => BinOp::And,
            TokenKind::Or => BinOp::Or,
            TokenKind::Xor => BinOp::Xor,
            TokenKind::Shl => BinOp::Shl,
            TokenKind::Shr => BinOp::Shr,
            TokenKind::Equal => BinOp::Eq,
            TokenKind::NotEqual => BinOp::Ne,
            TokenKind::Less => BinOp::Lt,
            TokenKind::LessEqual => BinOp::Le,
            TokenKind::Greater => BinOp::Gt,
            TokenKind::GreaterEqual => BinOp::Ge,
            TokenKind::In => BinOp::In,
            _ => return None,
        })
    }

    /// Parses a prefix expression: literal, unary operator, designator,
    /// parenthesised expression, or set constructor.
    fn parse_prefix(&mut self) -> Option<Expr> {
        let start = self.span();

        match self.kind() {
            TokenKind::IntLiteral => {
                let value = self.parse_int_lexeme();
                self.advance();
                Some(self.mk_expr(ExprKind::IntLiteral(value), start))
            }
            TokenKind::RealLiteral => {
                let value: f64 = self.current().lexeme.parse().unwrap_or_else(|_| {
                    self.error_here("invalid real literal");
                    0.0
                });
                self.advance();
                Some(self.mk_expr(ExprKind::RealLiteral(value), start))
            }
            TokenKind::StringLiteral => {
                let value = decode_string_lexeme(&self.current().lexeme);
                self.advance();
                Some(self.mk_expr(ExprKind::StringLiteral(value), start))
            }
            TokenKind::CharLiteral => {
                let decoded = decode_string_lexeme(&self.current().lexeme);
                let c = decoded.chars().next().unwrap_or('\0');
                self.advance();
                Some(self.mk_expr(ExprKind::CharLiteral(c), start))
            }
            TokenKind::Nil => {
                self.advance();
                Some(self.mk_expr(ExprKind::Nil, start))
            }
            TokenKind::True => {
                self.advance();
                Some(self.mk_expr(ExprKind::BoolLiteral(true), start))
            }
            TokenKind::False => {
                self.advance();
                Some(self.mk_expr(ExprKind::BoolLiteral(false), start))
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr_bp(UNARY_BP)?;
                let span = start.to(operand.span);
                Some(self.mk_expr(
                    ExprKind::Unary {
                        op: UnOp::Neg,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.parse_expr_bp(UNARY_BP)?;
                let span = start.to(operand.span);
                Some(self.mk_expr(
                    ExprKind::Unary {
                        op: UnOp::Plus,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_expr_bp(UNARY_BP)?;
                let span = start.to(operand.span);
                Some(self.mk_expr(
                    ExprKind::Unary {
                        op: UnOp::Not,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::At => {
                self.advance();
                let operand = self.parse_expr_bp(UNARY_BP)?;
                let span = start.to(operand.span);
                Some(self.mk_expr(ExprKind::AddressOf(Box::new(operand)), span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen);
                self.parse_postfix(inner)
            }
            TokenKind::LBracket => self.parse_set_literal(),
            TokenKind::Identifier => {
                let name = self.current().lexeme.clone();
                self.advance();
                let ident = self.mk_expr(ExprKind::Ident(name), start);
                self.parse_postfix(ident)
            }
            _ => {
                self.error_here(format!("expected expression, found {}", self.kind().describe()));
                None
            }
        }
    }

    /// Applies postfix forms to a base expression.
    pub(crate) fn parse_postfix(&mut self, mut base: Expr) -> Option<Expr> {
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_identifier("field name")?;
                    let span = base.span.to(self.prev_span());
                    base = self.mk_expr(
                        ExprKind::Field {
                            base: Box::new(base),
                            field,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let mut indices = Vec::new();
                    loop {
                        indices.push(self.parse_expression()?);
                        if !self.match_token(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RBracket);
                    let span = base.span.to(self.prev_span());
                    base = self.mk_expr(
                        ExprKind::Index {
                            base: Box::new(base),
                            indices,
                        },
                        span,
                    );
                }
                TokenKind::Caret => {
                    self.advance();
                    let span = base.span.to(self.prev_span());
                    base = self.mk_expr(ExprKind::Deref(Box::new(base)), span);
                }
                TokenKind::LParen => {
                    let ExprKind::Ident(name) = &base.kind else {
                        self.error_here("only a named routine can be called");
                        return None;
                    };
                    let name = name.clone();
                    self.advance();

                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_call_arg()?);
                            if !self.match_token(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen);
                    let span = base.span.to(self.prev_span());
                    base = self.mk_expr(ExprKind::Call { name, args }, span);
                }
                _ => return Some(base),
            }
        }
    }

    /// Parses a call argument, allowing the `e:width[:precision]`
    /// formatting suffix used by write/writeln.
    fn parse_call_arg(&mut self) -> Option<Expr> {
        let value = self.parse_expression()?;

        if self.match_token(TokenKind::Colon) {
            let width = self.parse_expression()?;
            let precision = if self.match_token(TokenKind::Colon) {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            let span = value.span.to(self.prev_span());
            return Some(self.mk_expr(
                ExprKind::Formatted {
                    value: Box::new(value),
                    width: Box::new(width),
                    precision,
                },
                span,
            ));
        }

        Some(value)
    }

    /// Parses `[elem, lo..hi, ...]`.
    fn parse_set_literal(&mut self) -> Option<Expr> {
        let start = self.span();
        self.expect(TokenKind::LBracket);

        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                elements.push(self.parse_range_item()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket);

        let span = start.to(self.prev_span());
        Some(self.mk_expr(ExprKind::SetLiteral(elements), span))
    }

    /// Decodes the current integer-literal lexeme (decimal or `$HEX`).
    fn parse_int_lexeme(&self) -> i64 {
        let lexeme = &self.current().lexeme;
        let parsed = if let Some(hex) = lexeme.strip_prefix('$') {
            i64::from_str_radix(hex, 16)
        } else {
            lexeme.parse()
        };
        match parsed {
            Ok(value) => value,
            Err(_) => {
                self.error_here(format!("integer literal '{}' out of range", lexeme));
                0
            }
        }
    }
}
