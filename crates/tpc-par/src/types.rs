//! Type-expression parsing.
//!
//! Covers built-in names, user type references, `^T`, multi-dimensional
//! arrays, `set of T`, records with variant parts, `string[N]`,
//! subranges and enumerations. `packed` is accepted and ignored.

use tpc_lex::TokenKind;

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses a type expression.
    pub(crate) fn parse_type_expr(&mut self) -> Option<TypeExpr> {
        let start = self.span();

        let kind = match self.kind() {
            TokenKind::Caret => {
                self.advance();
                TypeExprKind::Pointer(Box::new(self.parse_type_expr()?))
            }
            TokenKind::Packed => {
                self.advance();
                return self.parse_type_expr();
            }
            TokenKind::Array => {
                self.advance();
                self.parse_array_tail()?
            }
            TokenKind::Set => {
                self.advance();
                if !self.expect(TokenKind::Of) {
                    return None;
                }
                TypeExprKind::SetOf(Box::new(self.parse_type_expr()?))
            }
            TokenKind::Record => {
                self.advance();
                self.parse_record_tail()?
            }
            TokenKind::StringKw => {
                self.advance();
                if self.match_token(TokenKind::LBracket) {
                    let len = self.parse_expression()?;
                    self.expect(TokenKind::RBracket);
                    TypeExprKind::BoundedString(len)
                } else {
                    TypeExprKind::Named("string".to_string())
                }
            }
            TokenKind::File => {
                self.advance();
                if self.match_token(TokenKind::Of) {
                    TypeExprKind::FileOf(Box::new(self.parse_type_expr()?))
                } else {
                    TypeExprKind::Named("file".to_string())
                }
            }
            TokenKind::Text => {
                self.advance();
                TypeExprKind::Named("text".to_string())
            }
            TokenKind::LParen => {
                self.advance();
                let mut values = Vec::new();
                loop {
                    values.push(self.expect_identifier("enumeration value")?);
                    if !self.match_token(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen);
                TypeExprKind::Enum(values)
            }
            _ => {
                // A type name, or the start of a constant subrange like
                // `1..10`, `'a'..'z'` or `-5..5`.
                let lo = self.parse_expression()?;
                if self.match_token(TokenKind::DotDot) {
                    let hi = self.parse_expression()?;
                    TypeExprKind::Subrange(lo, hi)
                } else if let ExprKind::Ident(name) = lo.kind {
                    TypeExprKind::Named(name)
                } else {
                    self.error_at(lo.span, "expected a type");
                    return None;
                }
            }
        };

        Some(TypeExpr {
            kind,
            span: start.to(self.prev_span()),
        })
    }

    /// `[d1, ..., dN] of T` after the `array` keyword.
    fn parse_array_tail(&mut self) -> Option<TypeExprKind> {
        if !self.expect(TokenKind::LBracket) {
            return None;
        }

        let mut dims = Vec::new();
        loop {
            let lo = self.parse_expression()?;
            if self.match_token(TokenKind::DotDot) {
                let hi = self.parse_expression()?;
                dims.push(ArrayDim::Range(lo, hi));
            } else if let ExprKind::Ident(name) = lo.kind {
                dims.push(ArrayDim::Named(name));
            } else {
                self.error_at(lo.span, "expected an index range");
                return None;
            }
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RBracket);
        if !self.expect(TokenKind::Of) {
            return None;
        }
        let elem = self.parse_type_expr()?;
        Some(TypeExprKind::Array {
            dims,
            elem: Box::new(elem),
        })
    }

    /// Field list and optional variant part after the `record` keyword.
    fn parse_record_tail(&mut self) -> Option<TypeExprKind> {
        let mut fields = Vec::new();
        let mut variant = None;

        while !self.check(TokenKind::End) && !self.at_end() {
            if self.check(TokenKind::Case) {
                variant = self.parse_variant_part();
                break;
            }

            let mut names = Vec::new();
            loop {
                names.push(self.expect_identifier("field name")?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            if !self.expect(TokenKind::Colon) {
                return None;
            }
            let ty = self.parse_type_expr()?;
            fields.push(FieldGroup { names, ty });

            if !self.match_token(TokenKind::Semicolon) {
                break;
            }
        }

        self.expect(TokenKind::End);
        Some(TypeExprKind::Record { fields, variant })
    }

    /// `case [tag :] T of label-list : (fields); ...` up to the record's
    /// `end` (which is left for the caller).
    fn parse_variant_part(&mut self) -> Option<VariantPart> {
        self.expect(TokenKind::Case);

        let first = self.expect_identifier("variant selector")?;
        let (tag_name, tag_type) = if self.match_token(TokenKind::Colon) {
            let ty = self.expect_identifier("selector type")?;
            (Some(first), ty)
        } else {
            (None, first)
        };
        if !self.expect(TokenKind::Of) {
            return None;
        }

        let mut branches = Vec::new();
        while !self.check(TokenKind::End) && !self.at_end() {
            let mut labels = Vec::new();
            loop {
                labels.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            if !self.expect(TokenKind::Colon) {
                return None;
            }

            if !self.expect(TokenKind::LParen) {
                return None;
            }
            let mut fields = Vec::new();
            while !self.check(TokenKind::RParen) && !self.at_end() {
                let mut names = Vec::new();
                loop {
                    names.push(self.expect_identifier("field name")?);
                    if !self.match_token(TokenKind::Comma) {
                        break;
                    }
                }
                if !self.expect(TokenKind::Colon) {
                    return None;
                }
                let ty = self.parse_type_expr()?;
                fields.push(FieldGroup { names, ty });
                if !self.match_token(TokenKind::Semicolon) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
            branches.push(VariantBranch { labels, fields });

            if !self.match_token(TokenKind::Semicolon) {
                break;
            }
        }

        Some(VariantPart {
            tag_name,
            tag_type,
            branches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpc_util::{FileId, Handler};

    fn parse_type(source: &str) -> (Option<TypeExpr>, Handler) {
        let handler = Handler::new();
        let tokens = tpc_lex::tokenize(source, &handler, FileId::DUMMY);
        let mut parser = Parser::new(tokens, &handler);
        let ty = parser.parse_type_expr();
        (ty, handler)
    }

    fn parse_type_ok(source: &str) -> TypeExprKind {
        let (ty, handler) = parse_type(source);
        assert!(!handler.has_errors(), "unexpected errors for {:?}", source);
        ty.unwrap().kind
    }

    #[test]
    fn test_named_types() {
        assert!(matches!(parse_type_ok("integer"), TypeExprKind::Named(n) if n == "integer"));
        assert!(matches!(parse_type_ok("TPoint"), TypeExprKind::Named(n) if n == "TPoint"));
        assert!(matches!(parse_type_ok("string"), TypeExprKind::Named(n) if n == "string"));
        assert!(matches!(parse_type_ok("text"), TypeExprKind::Named(n) if n == "text"));
    }

    #[test]
    fn test_pointer_type() {
        match parse_type_ok("^TNode") {
            TypeExprKind::Pointer(inner) => {
                assert!(matches!(inner.kind, TypeExprKind::Named(n) if n == "TNode"))
            }
            other => panic!("expected pointer, got {:?}", other),
        }
    }

    #[test]
    fn test_bounded_string() {
        assert!(matches!(parse_type_ok("string[20]"), TypeExprKind::BoundedString(_)));
    }

    #[test]
    fn test_array_single_dim() {
        match parse_type_ok("array[1..10] of integer") {
            TypeExprKind::Array { dims, elem } => {
                assert_eq!(dims.len(), 1);
                assert!(matches!(&dims[0], ArrayDim::Range(_, _)));
                assert!(matches!(elem.kind, TypeExprKind::Named(n) if n == "integer"));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_array_multi_dim() {
        match parse_type_ok("array[1..3, 'a'..'z', TColor] of real") {
            TypeExprKind::Array { dims, .. } => {
                assert_eq!(dims.len(), 3);
                assert!(matches!(&dims[2], ArrayDim::Named(n) if n == "TColor"));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_set_of_char() {
        match parse_type_ok("set of char") {
            TypeExprKind::SetOf(inner) => {
                assert!(matches!(inner.kind, TypeExprKind::Named(n) if n == "char"))
            }
            other => panic!("expected set, got {:?}", other),
        }
    }

    #[test]
    fn test_subrange() {
        assert!(matches!(parse_type_ok("1..100"), TypeExprKind::Subrange(_, _)));
        assert!(matches!(parse_type_ok("'a'..'z'"), TypeExprKind::Subrange(_, _)));
    }

    #[test]
    fn test_enum() {
        match parse_type_ok("(Red, Green, Blue)") {
            TypeExprKind::Enum(values) => assert_eq!(values, vec!["Red", "Green", "Blue"]),
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_record_plain() {
        match parse_type_ok("record x, y: integer; name: string end") {
            TypeExprKind::Record { fields, variant } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].names, vec!["x", "y"]);
                assert!(variant.is_none());
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_record_with_variant_part() {
        let source = "record\n  id: integer;\n  case kind: integer of\n    1: (radius: real);\n    2: (width, height: real)\nend";
        match parse_type_ok(source) {
            TypeExprKind::Record { fields, variant } => {
                assert_eq!(fields.len(), 1);
                let variant = variant.expect("variant part");
                assert_eq!(variant.tag_name.as_deref(), Some("kind"));
                assert_eq!(variant.tag_type, "integer");
                assert_eq!(variant.branches.len(), 2);
                assert_eq!(variant.branches[1].fields[0].names, vec!["width", "height"]);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_variant_tag_without_name() {
        let source = "record case boolean of true: (a: integer); false: (b: real) end";
        match parse_type_ok(source) {
            TypeExprKind::Record { variant, .. } => {
                let variant = variant.expect("variant part");
                assert!(variant.tag_name.is_none());
                assert_eq!(variant.tag_type, "boolean");
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_packed_is_ignored() {
        assert!(matches!(
            parse_type_ok("packed array[1..4] of char"),
            TypeExprKind::Array { .. }
        ));
    }

    #[test]
    fn test_file_of() {
        assert!(matches!(parse_type_ok("file of integer"), TypeExprKind::FileOf(_)));
        assert!(matches!(parse_type_ok("file"), TypeExprKind::Named(n) if n == "file"));
    }
}
