//! String and character literal lexing.
//!
//! Pascal strings are single-quoted; two consecutive quotes inside the
//! body are one escaped quote. A one-character body is reclassified as a
//! character literal. `#N` spells the character with ordinal N.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a quoted string or character literal.
    pub(crate) fn lex_string(&mut self) -> Token {
        self.cursor.advance();

        let mut content_chars: usize = 0;
        loop {
            if self.cursor.is_at_end() || self.cursor.current_char() == '\n' {
                self.report_error("unterminated string literal".to_string());
                return self.make_token(TokenKind::Error);
            }

            let c = self.cursor.current_char();
            if c == '\'' {
                if self.cursor.peek_char(1) == '\'' {
                    self.cursor.advance();
                    self.cursor.advance();
                    content_chars += 1;
                } else {
                    self.cursor.advance();
                    break;
                }
            } else {
                self.cursor.advance();
                content_chars += 1;
            }
        }

        if content_chars == 1 {
            self.make_token(TokenKind::CharLiteral)
        } else {
            self.make_token(TokenKind::StringLiteral)
        }
    }

    /// Lexes a `#N` numeric character code.
    pub(crate) fn lex_char_code(&mut self) -> Token {
        self.cursor.advance();

        let digits_start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.position() == digits_start {
            self.report_error("expected digits after '#'".to_string());
            return self.make_token(TokenKind::Error);
        }

        self.make_token(TokenKind::CharLiteral)
    }
}

/// Decode the body of a string/char token lexeme.
///
/// Strips the surrounding quotes and collapses `''` to `'`. For a `#N`
/// lexeme, returns the character with ordinal N.
pub fn decode_string_lexeme(lexeme: &str) -> String {
    if let Some(digits) = lexeme.strip_prefix('#') {
        let code: u32 = digits.parse().unwrap_or(0);
        return char::from_u32(code).unwrap_or('\0').to_string();
    }

    let body = lexeme
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(lexeme);
    body.replace("''", "'")
}

#[cfg(test)]
mod tests {
    use tpc_util::{FileId, Handler};

    use super::decode_string_lexeme;
    use crate::token::TokenKind;

    fn lex_one(source: &str) -> (TokenKind, String) {
        let handler = Handler::new();
        let tokens = crate::tokenize(source, &handler, FileId::DUMMY);
        (tokens[0].kind, tokens[0].lexeme.clone())
    }

    #[test]
    fn test_string_literal() {
        let (kind, lexeme) = lex_one("'hello world'");
        assert_eq!(kind, TokenKind::StringLiteral);
        assert_eq!(lexeme, "'hello world'");
    }

    #[test]
    fn test_single_char_is_char_literal() {
        assert_eq!(lex_one("'a'").0, TokenKind::CharLiteral);
    }

    #[test]
    fn test_empty_string_is_string_literal() {
        assert_eq!(lex_one("''").0, TokenKind::StringLiteral);
    }

    #[test]
    fn test_escaped_quote() {
        let (kind, lexeme) = lex_one("'it''s'");
        assert_eq!(kind, TokenKind::StringLiteral);
        assert_eq!(decode_string_lexeme(&lexeme), "it's");
    }

    #[test]
    fn test_lone_escaped_quote_is_char() {
        let (kind, lexeme) = lex_one("''''");
        assert_eq!(kind, TokenKind::CharLiteral);
        assert_eq!(decode_string_lexeme(&lexeme), "'");
    }

    #[test]
    fn test_char_code() {
        let (kind, lexeme) = lex_one("#65");
        assert_eq!(kind, TokenKind::CharLiteral);
        assert_eq!(decode_string_lexeme(&lexeme), "A");
    }

    #[test]
    fn test_unterminated_string() {
        let handler = Handler::new();
        let tokens = crate::tokenize("'open", &handler, FileId::DUMMY);
        assert!(handler.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Error);
    }

    #[test]
    fn test_string_does_not_cross_newline() {
        let handler = Handler::new();
        crate::tokenize("'a\nb'", &handler, FileId::DUMMY);
        assert!(handler.has_errors());
    }
}
