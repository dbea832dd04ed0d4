//! Identifier and keyword lexing.

use crate::token::{Token, TokenKind, KEYWORDS};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    ///
    /// Reserved words become [`TokenKind::Keyword`]; `true`/`false` become
    /// [`TokenKind::Boolean`].
    pub(crate) fn lex_identifier(&mut self) -> Token {
        let start = self.cursor.position();

        while {
            let c = self.cursor.current_char();
            c == '_' || c.is_ascii_alphanumeric()
        } {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(start);
        let kind = if text == "true" || text == "false" {
            TokenKind::Boolean
        } else if KEYWORDS.contains(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };

        self.finish(kind, text.to_string())
    }
}
