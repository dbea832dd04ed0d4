//! Core lexer implementation.
//!
//! The `Lexer` struct and its dispatch loop live here; the per-token-class
//! lexing methods are split across the sibling modules.

mod identifier;
mod number;
mod operator;
mod string;

use vextc_util::{Handler, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lexer for Vext source code.
///
/// Transforms source text into a stream of spanned tokens. Lexical errors
/// (unterminated strings, invalid escapes, unexpected characters) are
/// reported through the handler; scanning always continues to end of input.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Sink for lexical errors.
    handler: &'a Handler,

    /// Line where the current token starts (1-based).
    token_line: u32,

    /// Column where the current token starts (1-based).
    token_col: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source code.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_line: 1,
            token_col: 1,
        }
    }

    /// Returns the next token from the source.
    ///
    /// Whitespace is skipped; comments are returned as [`TokenKind::Comment`]
    /// tokens so the editor layer can highlight them. The final token is
    /// always [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        self.token_line = self.cursor.line();
        self.token_col = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::new(TokenKind::Eof, "", self.token_line, self.token_col, self.token_col);
        }

        let c = self.cursor.current_char();
        match c {
            '/' if self.cursor.peek_char(1) == '/' => self.lex_comment(),
            '(' | ')' | '{' | '}' | ',' | ';' | '.' => {
                self.cursor.advance();
                self.finish(TokenKind::Punctuation, c.to_string())
            }
            '"' | '\'' => self.lex_string(c),
            '0'..='9' => self.lex_number(),
            c if c == '_' || c.is_ascii_alphabetic() => self.lex_identifier(),
            '+' | '-' | '*' | '=' | '&' | '|' | '!' | '<' | '>' | '%' | '/' => self.lex_operator(),
            _ => {
                self.cursor.advance();
                self.report_error(format!("unexpected character '{}'", c));
                self.finish(TokenKind::Unknown, c.to_string())
            }
        }
    }

    /// Lexes a `//` line comment, up to but not including the newline.
    fn lex_comment(&mut self) -> Token {
        let start = self.cursor.position();
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start).to_string();
        self.finish(TokenKind::Comment, text)
    }

    fn skip_whitespace(&mut self) {
        while !self.cursor.is_at_end() && self.cursor.current_char().is_whitespace() {
            self.cursor.advance();
        }
    }

    /// Builds a token starting at the recorded token position and ending at
    /// the character just consumed.
    pub(crate) fn finish(&self, kind: TokenKind, text: impl Into<String>) -> Token {
        let end_col = self.cursor.column().saturating_sub(1).max(self.token_col);
        Token::new(kind, text, self.token_line, self.token_col, end_col)
    }

    /// Reports a lexical error spanning the current token.
    pub(crate) fn report_error(&self, message: String) {
        let end_col = self.cursor.column().saturating_sub(1).max(self.token_col);
        self.handler
            .error(message, Span::new(self.token_line, self.token_col, end_col));
    }
}
