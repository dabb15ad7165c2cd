//! Numeric literal lexing.
//!
//! A literal is an integer unless a fraction or exponent is seen. The
//! fraction requires a digit after the dot so that a range like `1..3`
//! lexes as integer, `..`, integer.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a decimal integer or real literal.
    pub(crate) fn lex_number(&mut self) -> Token {
        let mut is_real = false;

        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        // Fraction only when a digit follows the dot; `1..3` stays integer.
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            is_real = true;
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let c = self.cursor.current_char();
        if c == 'e' || c == 'E' {
            let mut lookahead = 1;
            let sign = self.cursor.peek_char(1);
            if sign == '+' || sign == '-' {
                lookahead = 2;
            }
            if self.cursor.peek_char(lookahead).is_ascii_digit() {
                is_real = true;
                self.cursor.advance();
                if sign == '+' || sign == '-' {
                    self.cursor.advance();
                }
                while self.cursor.current_char().is_ascii_digit() {
                    self.cursor.advance();
                }
            }
        }

        if is_real {
            self.make_token(TokenKind::RealLiteral)
        } else {
            self.make_token(TokenKind::IntLiteral)
        }
    }

    /// Lexes a `$FF`-style hexadecimal integer literal.
    pub(crate) fn lex_hex_number(&mut self) -> Token {
        self.cursor.advance();

        let digits_start = self.cursor.position();
        while self.cursor.current_char().is_ascii_hexdigit() {
            self.cursor.advance();
        }

        if self.cursor.position() == digits_start {
            self.report_error("expected hexadecimal digits after '$'".to_string());
            return self.make_token(TokenKind::Error);
        }

        self.make_token(TokenKind::IntLiteral)
    }
}

#[cfg(test)]
mod tests {
    use tpc_util::{FileId, Handler};

    use crate::token::TokenKind;

    fn lex_all(source: &str) -> Vec<(TokenKind, String)> {
        let handler = Handler::new();
        crate::tokenize(source, &handler, FileId::DUMMY)
            .into_iter()
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    #[test]
    fn test_integer() {
        assert_eq!(lex_all("42"), vec![(TokenKind::IntLiteral, "42".to_string())]);
    }

    #[test]
    fn test_real_with_fraction() {
        assert_eq!(lex_all("3.14"), vec![(TokenKind::RealLiteral, "3.14".to_string())]);
    }

    #[test]
    fn test_real_with_exponent() {
        assert_eq!(lex_all("1e9"), vec![(TokenKind::RealLiteral, "1e9".to_string())]);
        assert_eq!(
            lex_all("2.5E-3"),
            vec![(TokenKind::RealLiteral, "2.5E-3".to_string())]
        );
    }

    #[test]
    fn test_range_is_not_a_real() {
        assert_eq!(
            lex_all("1..3"),
            vec![
                (TokenKind::IntLiteral, "1".to_string()),
                (TokenKind::DotDot, "..".to_string()),
                (TokenKind::IntLiteral, "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_member_access_on_number_stays_integer() {
        // `5.x` is nonsense Pascal, but the lexer must not eat the dot.
        let tokens = lex_all("5.x");
        assert_eq!(tokens[0].0, TokenKind::IntLiteral);
        assert_eq!(tokens[1].0, TokenKind::Dot);
    }

    #[test]
    fn test_hex_literal() {
        assert_eq!(lex_all("$FF"), vec![(TokenKind::IntLiteral, "$FF".to_string())]);
        assert_eq!(lex_all("$2a"), vec![(TokenKind::IntLiteral, "$2a".to_string())]);
    }

    #[test]
    fn test_bare_dollar_is_an_error() {
        let handler = Handler::new();
        let tokens = crate::tokenize("$", &handler, FileId::DUMMY);
        assert!(handler.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Error);
    }

    #[test]
    fn test_exponent_needs_digits() {
        // `10east` is an integer followed by an identifier.
        let tokens = lex_all("10east");
        assert_eq!(tokens[0].0, TokenKind::IntLiteral);
        assert_eq!(tokens[0].1, "10");
        assert_eq!(tokens[1].0, TokenKind::Identifier);
    }
}
