//! Numeric literal lexing.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a numeric literal: one or more digits, optionally followed by
    /// `.` and more digits.
    ///
    /// The `.` is only consumed when a digit follows, so `foo.bar` style
    /// member access tokenizes as identifier / dot / identifier and `1.x`
    /// as number / dot / identifier. Exponent syntax is not recognized by
    /// the scanner; the parser's numeric conversion accepts `e`/`E` when
    /// it builds literal values.
    pub(crate) fn lex_number(&mut self) -> Token {
        let start = self.cursor.position();

        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let text = self.cursor.slice_from(start).to_string();
        self.finish(TokenKind::Numeric, text)
    }
}
