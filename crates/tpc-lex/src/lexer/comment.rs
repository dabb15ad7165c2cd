//! Whitespace and comment skipping.
//!
//! Pascal has three comment syntaxes: `{ ... }`, `(* ... *)` and `// ...`.
//! The two block styles nest within each other, so `{ (* } *)` closes at
//! the final `*)`. An unterminated block comment is reported and the
//! cursor ends up at EOF.

use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Skips whitespace and comments. Called before each token scan.
    pub(crate) fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.cursor.is_at_end() {
                return;
            }

            match self.cursor.current_char() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.cursor.advance();
                }
                '{' => {
                    self.mark_comment_start();
                    self.cursor.advance();
                    self.skip_block_comment();
                }
                '(' if self.cursor.peek_char(1) == '*' => {
                    self.mark_comment_start();
                    self.cursor.advance();
                    self.cursor.advance();
                    self.skip_block_comment();
                }
                '/' if self.cursor.peek_char(1) == '/' => {
                    self.skip_line_comment();
                }
                _ => return,
            }
        }
    }

    /// Records the comment opener position so an unterminated-comment
    /// diagnostic points at the opener, not at the previous token.
    fn mark_comment_start(&mut self) {
        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();
    }

    /// Skips a block comment body after its opener has been consumed.
    ///
    /// Both opener styles increment the same depth counter, so the two
    /// syntaxes may nest within each other.
    fn skip_block_comment(&mut self) {
        let mut depth: u32 = 1;

        while depth > 0 && !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if c == '{' {
                self.cursor.advance();
                depth += 1;
            } else if c == '}' {
                self.cursor.advance();
                depth -= 1;
            } else if c == '(' && self.cursor.peek_char(1) == '*' {
                self.cursor.advance();
                self.cursor.advance();
                depth += 1;
            } else if c == '*' && self.cursor.peek_char(1) == ')' {
                self.cursor.advance();
                self.cursor.advance();
                depth -= 1;
            } else {
                self.cursor.advance();
            }
        }

        if depth > 0 {
            self.report_error("unterminated block comment".to_string());
        }
    }

    /// Skips a line comment (from `//` to end of line).
    fn skip_line_comment(&mut self) {
        self.cursor.advance();
        self.cursor.advance();

        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
    }
}
