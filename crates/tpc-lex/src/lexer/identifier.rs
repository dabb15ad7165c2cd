//! Identifier and keyword lexing.

use crate::token::{keyword_kind, Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword.
    ///
    /// Identifiers match `[A-Za-z_][A-Za-z0-9_]*`. Keyword classification
    /// folds the lexeme to lowercase first; Pascal keywords are
    /// case-insensitive.
    pub(crate) fn lex_identifier(&mut self) -> Token {
        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if c.is_ascii_alphanumeric() || c == '_' {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let lexeme = self.cursor.slice_from(self.token_start);
        let kind = keyword_kind(&lexeme.to_ascii_lowercase()).unwrap_or(TokenKind::Identifier);
        self.make_token(kind)
    }
}

#[cfg(test)]
mod tests {
    use tpc_util::{FileId, Handler};

    use crate::token::TokenKind;

    fn lex_one(source: &str) -> (TokenKind, String) {
        let handler = Handler::new();
        let tokens = crate::tokenize(source, &handler, FileId::DUMMY);
        assert!(!handler.has_errors());
        (tokens[0].kind, tokens[0].lexeme.clone())
    }

    #[test]
    fn test_plain_identifier() {
        let (kind, lexeme) = lex_one("counter");
        assert_eq!(kind, TokenKind::Identifier);
        assert_eq!(lexeme, "counter");
    }

    #[test]
    fn test_identifier_with_digits_and_underscore() {
        let (kind, lexeme) = lex_one("node_2");
        assert_eq!(kind, TokenKind::Identifier);
        assert_eq!(lexeme, "node_2");
    }

    #[test]
    fn test_keyword_case_insensitive() {
        assert_eq!(lex_one("begin").0, TokenKind::Begin);
        assert_eq!(lex_one("BEGIN").0, TokenKind::Begin);
        assert_eq!(lex_one("Begin").0, TokenKind::Begin);
        assert_eq!(lex_one("WriteLn").0, TokenKind::Identifier);
    }

    #[test]
    fn test_keyword_lexeme_preserved() {
        // The kind folds, the lexeme keeps the source spelling.
        let (kind, lexeme) = lex_one("PROGRAM");
        assert_eq!(kind, TokenKind::Program);
        assert_eq!(lexeme, "PROGRAM");
    }

    #[test]
    fn test_word_operators() {
        assert_eq!(lex_one("div").0, TokenKind::Div);
        assert_eq!(lex_one("MOD").0, TokenKind::Mod);
        assert_eq!(lex_one("shl").0, TokenKind::Shl);
        assert_eq!(lex_one("In").0, TokenKind::In);
    }

    #[test]
    fn test_nil_true_false() {
        assert_eq!(lex_one("nil").0, TokenKind::Nil);
        assert_eq!(lex_one("True").0, TokenKind::True);
        assert_eq!(lex_one("FALSE").0, TokenKind::False);
    }
}
