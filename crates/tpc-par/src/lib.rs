//! tpc-par - Recursive-descent parser for the Turbo Pascal 7 dialect.
//!
//! The parser consumes a token stream and builds the AST defined in
//! [`ast`]. It is error-and-continue: an unexpected token produces a
//! positioned diagnostic and the parser synchronises to the next `;`,
//! `end` or declaration keyword, so one run surfaces multiple errors.
//! Callers must check the handler's `has_errors()` before consuming the
//! tree.
//!
//! Grammar entry points: [`Parser::parse_module`] (auto-detects `program`
//! vs `unit`), [`Parser::parse_program`], [`Parser::parse_unit`].

pub mod ast;

mod expr;
mod items;
mod stmt;
mod types;

#[cfg(test)]
mod edge_cases;

pub use ast::*;

use tpc_lex::{Token, TokenKind};
use tpc_util::{Handler, Span, Stage};

/// Recursive-descent parser over a pre-lexed token stream.
pub struct Parser<'a> {
    /// Token stream, without the EOF sentinel.
    tokens: Vec<Token>,

    /// Index of the current token.
    position: usize,

    /// Diagnostic sink.
    handler: &'a Handler,

    /// Synthetic EOF token returned past the end of the stream.
    eof: Token,

    /// Next expression node id.
    next_node_id: u32,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `tokens`.
    pub fn new(tokens: Vec<Token>, handler: &'a Handler) -> Self {
        Self::with_node_offset(tokens, handler, 0)
    }

    /// Creates a parser whose expression node ids start at `offset`.
    ///
    /// Node ids key the analyser's side tables, so every parse that
    /// contributes to one compilation (the program plus any loaded
    /// units) must draw from one id space.
    pub fn with_node_offset(tokens: Vec<Token>, handler: &'a Handler, offset: u32) -> Self {
        let eof_span = tokens.last().map(|t| t.span).unwrap_or(Span::DUMMY);
        Self {
            tokens,
            position: 0,
            handler,
            eof: Token::eof(eof_span),
            next_node_id: offset,
        }
    }

    /// One past the highest node id handed out so far.
    pub fn node_count(&self) -> u32 {
        self.next_node_id
    }

    /// Parses a whole source file, auto-detecting program vs unit.
    pub fn parse_module(&mut self) -> Module {
        if self.check(TokenKind::Unit) {
            Module::Unit(self.parse_unit())
        } else {
            Module::Program(self.parse_program())
        }
    }

    /// Parses a `program` (the header keyword itself is optional in
    /// legacy sources).
    pub fn parse_program(&mut self) -> Program {
        let start = self.span();

        let name = if self.match_token(TokenKind::Program) {
            let name = self.expect_identifier("program name").unwrap_or_default();
            // Legacy `program P(input, output);` parameters are ignored.
            if self.match_token(TokenKind::LParen) {
                while !self.check(TokenKind::RParen) && !self.at_end() {
                    self.advance();
                }
                self.expect(TokenKind::RParen);
            }
            self.expect(TokenKind::Semicolon);
            name
        } else {
            String::new()
        };

        let uses = if self.check(TokenKind::Uses) {
            self.parse_uses_clause()
        } else {
            Vec::new()
        };

        let decls = self.parse_decls(false);

        let body = if self.check(TokenKind::Begin) {
            match self.parse_compound() {
                Stmt {
                    kind: StmtKind::Compound(stmts),
                    ..
                } => stmts,
                other => vec![other],
            }
        } else {
            self.error_here("expected 'begin' to start the program body");
            Vec::new()
        };

        self.expect(TokenKind::Dot);

        Program {
            name,
            uses,
            decls,
            body,
            span: start.to(self.prev_span()),
        }
    }

    /// Parses a `unit` with interface, implementation and an optional
    /// initialization section.
    pub fn parse_unit(&mut self) -> Unit {
        let start = self.span();

        self.expect(TokenKind::Unit);
        let name = self.expect_identifier("unit name").unwrap_or_default();
        self.expect(TokenKind::Semicolon);

        self.expect(TokenKind::Interface);
        let interface_uses = if self.check(TokenKind::Uses) {
            self.parse_uses_clause()
        } else {
            Vec::new()
        };
        let interface = self.parse_decls(true);

        self.expect(TokenKind::Implementation);
        let implementation_uses = if self.check(TokenKind::Uses) {
            self.parse_uses_clause()
        } else {
            Vec::new()
        };
        let implementation = self.parse_decls(false);

        // `initialization` section, or the legacy `begin` spelling.
        let initialization = if self.check(TokenKind::Initialization) || self.check(TokenKind::Begin)
        {
            self.advance();
            let mut stmts = Vec::new();
            while !self.check(TokenKind::End) && !self.at_end() {
                let before = self.position;
                match self.parse_statement() {
                    Some(stmt) => stmts.push(stmt),
                    None => self.recover_to_sync_point(),
                }
                if !self.match_token(TokenKind::Semicolon) && !self.check(TokenKind::End) {
                    self.error_here("expected ';' between statements");
                    self.recover_to_sync_point();
                }
                if self.position == before {
                    self.advance();
                }
            }
            Some(stmts)
        } else {
            None
        };

        self.expect(TokenKind::End);
        self.expect(TokenKind::Dot);

        Unit {
            name,
            interface_uses,
            interface,
            implementation_uses,
            implementation,
            initialization,
            span: start.to(self.prev_span()),
        }
    }

    // =========================================================================
    // Token stream helpers
    // =========================================================================

    /// Current token; EOF sentinel past the end.
    pub(crate) fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    /// Current token kind.
    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Current token span.
    pub(crate) fn span(&self) -> Span {
        self.current().span
    }

    /// Span of the previously consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        if self.position == 0 {
            self.span()
        } else {
            self.tokens
                .get(self.position - 1)
                .map(|t| t.span)
                .unwrap_or(self.eof.span)
        }
    }

    /// Kind of the token after the current one.
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.position + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// True at the end of the stream.
    pub(crate) fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Consume the current token.
    pub(crate) fn advance(&mut self) {
        if !self.at_end() {
            self.position += 1;
        }
    }

    /// True if the current token has the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require a token kind; report and leave the token in place on
    /// mismatch.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            self.error_here(format!(
                "expected {}, found {}",
                kind.describe(),
                self.kind().describe()
            ));
            false
        }
    }

    /// Require an identifier and return its lexeme.
    pub(crate) fn expect_identifier(&mut self, what: &str) -> Option<String> {
        if self.check(TokenKind::Identifier) {
            let name = self.current().lexeme.clone();
            self.advance();
            Some(name)
        } else {
            self.error_here(format!("expected {}, found {}", what, self.kind().describe()));
            None
        }
    }

    /// Report a parse error at the current token.
    pub(crate) fn error_here(&self, message: impl Into<String>) {
        self.handler.error(Stage::Parse, message, self.span());
    }

    /// Report a parse error at a specific span.
    pub(crate) fn error_at(&self, span: Span, message: impl Into<String>) {
        self.handler.error(Stage::Parse, message, span);
    }

    /// Skip tokens until a synchronisation point: just past a `;`, or at
    /// an `end`/`until`/`else`, a declaration keyword, or EOF.
    pub(crate) fn recover_to_sync_point(&mut self) {
        while !self.at_end() {
            match self.kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::End
                | TokenKind::Until
                | TokenKind::Else
                | TokenKind::Const
                | TokenKind::Type
                | TokenKind::Var
                | TokenKind::Label
                | TokenKind::Procedure
                | TokenKind::Function
                | TokenKind::Begin => return,
                _ => self.advance(),
            }
        }
    }

    /// Allocate an expression node.
    pub(crate) fn mk_expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        Expr { id, kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpc_util::FileId;

    fn parse(source: &str) -> (Module, Handler) {
        let handler = Handler::new();
        let tokens = tpc_lex::tokenize(source, &handler, FileId::DUMMY);
        let mut parser = Parser::new(tokens, &handler);
        let module = parser.parse_module();
        (module, handler)
    }

    #[test]
    fn test_minimal_program() {
        let (module, handler) = parse("program P; begin end.");
        assert!(!handler.has_errors());
        match module {
            Module::Program(p) => {
                assert_eq!(p.name, "P");
                assert!(p.body.is_empty());
            }
            _ => panic!("expected a program"),
        }
    }

    #[test]
    fn test_program_with_legacy_parameters() {
        let (module, handler) = parse("program P(input, output); begin end.");
        assert!(!handler.has_errors());
        assert_eq!(module.name(), "P");
    }

    #[test]
    fn test_uses_clause() {
        let (module, handler) = parse("program P; uses crt, mylib; begin end.");
        assert!(!handler.has_errors());
        match module {
            Module::Program(p) => assert_eq!(p.uses, vec!["crt", "mylib"]),
            _ => panic!("expected a program"),
        }
    }

    #[test]
    fn test_minimal_unit() {
        let (module, handler) = parse(
            "unit U;\ninterface\nfunction Twice(x: integer): integer;\n\
             implementation\nfunction Twice(x: integer): integer;\nbegin\n  Twice := x * 2\nend;\nend.",
        );
        assert!(!handler.has_errors());
        match module {
            Module::Unit(u) => {
                assert_eq!(u.name, "U");
                assert_eq!(u.interface.len(), 1);
                assert_eq!(u.implementation.len(), 1);
                assert!(u.initialization.is_none());
            }
            _ => panic!("expected a unit"),
        }
    }

    #[test]
    fn test_unit_with_initialization() {
        let (module, handler) = parse(
            "unit U;\ninterface\nvar Count: integer;\nimplementation\n\
             initialization\n  Count := 0\nend.",
        );
        assert!(!handler.has_errors());
        match module {
            Module::Unit(u) => assert!(u.initialization.is_some()),
            _ => panic!("expected a unit"),
        }
    }

    #[test]
    fn test_errors_recover_and_accumulate() {
        let (_, handler) = parse("program P; var x integer; var y: integer begin end.");
        assert!(handler.has_errors());
        assert!(handler.error_count() >= 2);
    }

    #[test]
    fn test_node_ids_are_unique() {
        let (module, handler) = parse("program P; var a: integer; begin a := 1 + 2 * 3 end.");
        assert!(!handler.has_errors());
        let Module::Program(p) = module else {
            panic!("expected a program")
        };
        let mut seen = std::collections::HashSet::new();
        fn walk(expr: &Expr, seen: &mut std::collections::HashSet<u32>) {
            assert!(seen.insert(expr.id.0), "duplicate node id {:?}", expr.id);
            match &expr.kind {
                ExprKind::Binary { lhs, rhs, .. } => {
                    walk(lhs, seen);
                    walk(rhs, seen);
                }
                ExprKind::Unary { operand, .. } => walk(operand, seen),
                _ => {}
            }
        }
        if let StmtKind::Assign { target, value } = &p.body[0].kind {
            walk(target, &mut seen);
            walk(value, &mut seen);
        } else {
            panic!("expected an assignment");
        }
    }
}
