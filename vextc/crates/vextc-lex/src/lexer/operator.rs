//! Operator lexing with longest-match.

use crate::token::{Token, TokenKind};
use crate::Lexer;

/// Two-character operators, tried before any single-character match.
const MULTI_CHAR: &[&str] = &[
    "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "&&", "||", "++", "--", "**",
];

impl<'a> Lexer<'a> {
    /// Lexes an operator starting at one of `+ - * / = & | ! < > %`.
    ///
    /// Multi-character operators win over their single-character prefixes.
    /// `//` never reaches this method; the dispatcher treats it as a comment.
    pub(crate) fn lex_operator(&mut self) -> Token {
        let first = self.cursor.current_char();
        let second = self.cursor.peek_char(1);

        let mut pair = String::with_capacity(2);
        pair.push(first);
        pair.push(second);

        if MULTI_CHAR.contains(&pair.as_str()) {
            self.cursor.advance();
            self.cursor.advance();
            return self.finish(TokenKind::Operator, pair);
        }

        self.cursor.advance();
        self.finish(TokenKind::Operator, first.to_string())
    }
}
