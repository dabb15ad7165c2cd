//! Lexer implementation, split by token family.
//!
//! - `comment.rs` - whitespace and the three comment syntaxes
//! - `identifier.rs` - identifiers and keyword folding
//! - `number.rs` - integer, real and hexadecimal literals
//! - `string.rs` - quoted strings and `#N` character codes
//! - `operator.rs` - multi-character operators

mod comment;
mod identifier;
mod number;
mod operator;
mod string;

pub use string::decode_string_lexeme;

use tpc_util::{FileId, Handler, Span, Stage};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lexer for the Turbo Pascal 7 dialect.
///
/// Wraps a [`Cursor`] and produces tokens on demand. Errors are reported
/// into the shared diagnostic [`Handler`]; the lexer itself never fails,
/// it degrades to [`TokenKind::Error`] tokens and keeps going.
pub struct Lexer<'a> {
    /// Character cursor over the source.
    pub(crate) cursor: Cursor<'a>,

    /// Diagnostic sink.
    handler: &'a Handler,

    /// File the spans refer to.
    file_id: FileId,

    /// Byte offset where the current token started.
    pub(crate) token_start: usize,

    /// Line where the current token started (1-based).
    token_start_line: u32,

    /// Column where the current token started (1-based).
    token_start_column: u32,

    /// One token of lookahead for `peek_token`.
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over `source`.
    pub fn new(source: &'a str, handler: &'a Handler, file_id: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            file_id,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            peeked: None,
        }
    }

    /// Returns the next token, consuming it.
    ///
    /// After the end of input this keeps returning the EOF sentinel.
    pub fn next_token(&mut self) -> Token {
        match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token(),
        }
    }

    /// Returns the next token without consuming it. Idempotent.
    pub fn peek_token(&mut self) -> Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan_token());
        }
        self.peeked.clone().unwrap()
    }

    /// Scans one token from the input.
    fn scan_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::eof(self.token_span());
        }

        match self.cursor.current_char() {
            '(' => {
                self.cursor.advance();
                self.make_token(TokenKind::LParen)
            }
            ')' => {
                self.cursor.advance();
                self.make_token(TokenKind::RParen)
            }
            '[' => {
                self.cursor.advance();
                self.make_token(TokenKind::LBracket)
            }
            ']' => {
                self.cursor.advance();
                self.make_token(TokenKind::RBracket)
            }
            ',' => {
                self.cursor.advance();
                self.make_token(TokenKind::Comma)
            }
            ';' => {
                self.cursor.advance();
                self.make_token(TokenKind::Semicolon)
            }
            '+' => {
                self.cursor.advance();
                self.make_token(TokenKind::Plus)
            }
            '-' => {
                self.cursor.advance();
                self.make_token(TokenKind::Minus)
            }
            '*' => {
                self.cursor.advance();
                self.make_token(TokenKind::Star)
            }
            '/' => {
                self.cursor.advance();
                self.make_token(TokenKind::Slash)
            }
            '=' => {
                self.cursor.advance();
                self.make_token(TokenKind::Equal)
            }
            '^' => {
                self.cursor.advance();
                self.make_token(TokenKind::Caret)
            }
            '@' => {
                self.cursor.advance();
                self.make_token(TokenKind::At)
            }
            ':' => self.lex_colon(),
            '<' => self.lex_less(),
            '>' => self.lex_greater(),
            '.' => self.lex_dot(),
            '\'' => self.lex_string(),
            '#' => self.lex_char_code(),
            '$' => self.lex_hex_number(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(),
            c => {
                self.cursor.advance();
                self.report_error(format!("unexpected character '{}'", c));
                self.make_token(TokenKind::Error)
            }
        }
    }

    /// Builds a token from the recorded start position to the cursor.
    pub(crate) fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.cursor.slice_from(self.token_start), self.token_span())
    }

    /// Span of the token currently being scanned.
    pub(crate) fn token_span(&self) -> Span {
        Span::with_file(
            self.token_start,
            self.cursor.position(),
            self.file_id,
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Reports a lexical error at the current token.
    pub(crate) fn report_error(&self, message: String) {
        self.handler.error(Stage::Lex, message, self.token_span());
    }
}

/// The lexer is an iterator over tokens, ending before EOF.
impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}
