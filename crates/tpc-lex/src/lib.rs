//! tpc-lex - Lexical analyzer for the Turbo Pascal 7 dialect.
//!
//! Transforms source text into a forward stream of [`Token`]s. The lexer
//! is lazy: callers pull tokens one at a time with [`Lexer::next_token`]
//! or look ahead without consuming via [`Lexer::peek_token`]. After the
//! end of input the lexer keeps returning an EOF sentinel.
//!
//! Pascal specifics handled here: case-insensitive keywords, the three
//! comment syntaxes (`{ }`, `(* *)` and `//`, the block styles nesting
//! within each other), single-quoted strings with `''` as the escaped
//! quote, `#N` character codes, `$FF` hexadecimal literals, and the
//! `1..3` ambiguity (a fraction requires a digit after the dot).

pub mod cursor;
pub mod token;

mod lexer;

#[cfg(test)]
mod edge_cases;

pub use cursor::Cursor;
pub use lexer::{decode_string_lexeme, Lexer};
pub use token::{keyword_kind, Token, TokenKind};

use tpc_util::{FileId, Handler};

/// Tokenize an entire source string.
///
/// Returns every token up to (but excluding) the EOF sentinel. Lex errors
/// are reported into `handler` and produce [`TokenKind::Error`] tokens in
/// the stream.
pub fn tokenize(source: &str, handler: &Handler, file_id: FileId) -> Vec<Token> {
    let mut lexer = Lexer::new(source, handler, file_id);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    tokens
}
