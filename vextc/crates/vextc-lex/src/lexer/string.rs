//! String literal lexing.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a string literal opened by `"` or `'` and closed by the same
    /// quote character.
    ///
    /// Escape sequences `\n \r \t \\ \" \'` produce the corresponding
    /// character; any other escape is reported and recovers by emitting the
    /// escaped character literally. A raw newline or end of input before the
    /// closing quote is an unterminated-string error; the partial content is
    /// still emitted so later phases can keep working.
    pub(crate) fn lex_string(&mut self, quote: char) -> Token {
        self.cursor.advance();

        let mut content = String::new();

        loop {
            if self.cursor.is_at_end() {
                self.report_error("unterminated string literal".to_string());
                break;
            }

            let c = self.cursor.current_char();

            if c == quote {
                self.cursor.advance();
                break;
            }

            if c == '\n' {
                self.report_error("unterminated string literal".to_string());
                break;
            }

            if c == '\\' {
                self.cursor.advance();
                if let Some(escaped) = self.lex_escape() {
                    content.push(escaped);
                }
            } else {
                content.push(c);
                self.cursor.advance();
            }
        }

        self.finish(TokenKind::String, content)
    }

    /// Processes the character after a backslash.
    ///
    /// Returns `None` only when the input ends mid-escape; an unknown escape
    /// recovers by returning the raw character.
    fn lex_escape(&mut self) -> Option<char> {
        if self.cursor.is_at_end() {
            return None;
        }

        let c = self.cursor.current_char();
        self.cursor.advance();

        match c {
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            _ => {
                self.report_error(format!("invalid escape sequence '\\{}'", c));
                Some(c)
            }
        }
    }
}
