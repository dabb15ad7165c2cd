//! Edge-case and property tests for the lexer.

use proptest::prelude::*;
use tpc_util::{FileId, Handler};

use crate::token::TokenKind;
use crate::tokenize;

#[test]
fn lexes_a_whole_program() {
    let source = "program P;\nvar i: integer;\nbegin\n  for i := 1 to 3 do writeln(i * i)\nend.\n";
    let handler = Handler::new();
    let tokens = tokenize(source, &handler, FileId::DUMMY);
    assert!(!handler.has_errors());

    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds[0], TokenKind::Program);
    assert_eq!(kinds[1], TokenKind::Identifier);
    assert_eq!(*kinds.last().unwrap(), TokenKind::Dot);
    assert!(kinds.contains(&TokenKind::Assign));
    assert!(kinds.contains(&TokenKind::To));
}

#[test]
fn spans_slice_back_to_lexemes() {
    let source = "const Max = $FF; { limit }\nvar s: string[20];";
    let handler = Handler::new();
    for token in tokenize(source, &handler, FileId::DUMMY) {
        assert_eq!(&source[token.span.start..token.span.end], token.lexeme);
    }
}

#[test]
fn set_constructor_tokens() {
    let handler = Handler::new();
    let tokens = tokenize("['a'..'c', 'x']", &handler, FileId::DUMMY);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::LBracket,
            TokenKind::CharLiteral,
            TokenKind::DotDot,
            TokenKind::CharLiteral,
            TokenKind::Comma,
            TokenKind::CharLiteral,
            TokenKind::RBracket,
        ]
    );
}

#[test]
fn errors_do_not_stop_the_stream() {
    let handler = Handler::new();
    let tokens = tokenize("a ? b ~ c", &handler, FileId::DUMMY);
    assert_eq!(handler.error_count(), 2);
    let idents = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Identifier)
        .count();
    assert_eq!(idents, 3);
}

#[test]
fn crlf_line_endings() {
    let handler = Handler::new();
    let tokens = tokenize("a\r\nb", &handler, FileId::DUMMY);
    assert!(!handler.has_errors());
    assert_eq!(tokens[1].span.line, 2);
}

proptest! {
    /// Lexemes joined with the original whitespace reconstruct the file.
    #[test]
    fn round_trip_identifiers_and_numbers(
        words in prop::collection::vec("[a-z][a-z0-9_]{0,8}|[0-9]{1,6}", 1..20)
    ) {
        let source = words.join(" ");
        let handler = Handler::new();
        let tokens = tokenize(&source, &handler, FileId::DUMMY);
        prop_assert!(!handler.has_errors());

        let rebuilt = tokens
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(rebuilt, source);
    }

    /// Every token's span slices the source back to its lexeme.
    #[test]
    fn spans_are_exact(
        words in prop::collection::vec("[a-z]{1,6}|[0-9]{1,4}|:=|<=|>=|<>|\\.\\.", 1..30)
    ) {
        let source = words.join("  ");
        let handler = Handler::new();
        for token in tokenize(&source, &handler, FileId::DUMMY) {
            prop_assert_eq!(&source[token.span.start..token.span.end], token.lexeme.as_str());
        }
    }

    /// Decimal integer literals survive the trip through the lexer.
    #[test]
    fn integer_literals_parse_back(n in 0u32..1_000_000) {
        let source = n.to_string();
        let handler = Handler::new();
        let tokens = tokenize(&source, &handler, FileId::DUMMY);
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        prop_assert_eq!(tokens[0].lexeme.parse::<u32>().unwrap(), n);
    }
}
