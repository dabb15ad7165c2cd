//! Multi-character operator lexing.
//!
//! Two-character operators (`:=`, `<=`, `>=`, `<>`, `..`) are matched
//! before their single-character prefixes.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes `:` or `:=`.
    pub(crate) fn lex_colon(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.make_token(TokenKind::Assign)
        } else {
            self.make_token(TokenKind::Colon)
        }
    }

    /// Lexes `<`, `<=` or `<>`.
    pub(crate) fn lex_less(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.make_token(TokenKind::LessEqual)
        } else if self.cursor.match_char('>') {
            self.make_token(TokenKind::NotEqual)
        } else {
            self.make_token(TokenKind::Less)
        }
    }

    /// Lexes `>` or `>=`.
    pub(crate) fn lex_greater(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.make_token(TokenKind::GreaterEqual)
        } else {
            self.make_token(TokenKind::Greater)
        }
    }

    /// Lexes `.` or `..`.
    pub(crate) fn lex_dot(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('.') {
            self.make_token(TokenKind::DotDot)
        } else {
            self.make_token(TokenKind::Dot)
        }
    }
}

#[cfg(test)]
mod tests {
    use tpc_util::{FileId, Handler};

    use crate::token::TokenKind;

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        let handler = Handler::new();
        crate::tokenize(source, &handler, FileId::DUMMY)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_assign_vs_colon() {
        assert_eq!(lex_kinds(":="), vec![TokenKind::Assign]);
        assert_eq!(lex_kinds(": ="), vec![TokenKind::Colon, TokenKind::Equal]);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(lex_kinds("<="), vec![TokenKind::LessEqual]);
        assert_eq!(lex_kinds(">="), vec![TokenKind::GreaterEqual]);
        assert_eq!(lex_kinds("<>"), vec![TokenKind::NotEqual]);
        assert_eq!(lex_kinds("< >"), vec![TokenKind::Less, TokenKind::Greater]);
    }

    #[test]
    fn test_dots() {
        assert_eq!(lex_kinds(".."), vec![TokenKind::DotDot]);
        assert_eq!(lex_kinds("."), vec![TokenKind::Dot]);
        assert_eq!(
            lex_kinds("..."),
            vec![TokenKind::DotDot, TokenKind::Dot]
        );
    }

    #[test]
    fn test_pointer_and_address_ops() {
        assert_eq!(lex_kinds("p^"), vec![TokenKind::Identifier, TokenKind::Caret]);
        assert_eq!(lex_kinds("@p"), vec![TokenKind::At, TokenKind::Identifier]);
    }
}
