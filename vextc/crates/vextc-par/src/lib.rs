//! vextc-par - Recursive-descent parser.
//!
//! Turns the token stream into a statement list. The parser never aborts:
//! problems are reported into the shared [`Handler`] and recovery skips to
//! the next statement boundary (`;` or `}`), inserting a dummy `0` literal
//! where an expression was required so downstream phases always see a
//! well-formed tree. Every token-advancing loop is bounded by a progress
//! check so malformed input cannot hang the parser.

pub mod ast;
mod expr;
mod stmt;

pub use ast::*;
pub use expr::bp;

use vextc_lex::{Token, TokenKind};
use vextc_util::{Handler, Span};

/// Parses a token stream into a statement list.
///
/// # Example
///
/// ```
/// use vextc_lex::tokenize;
/// use vextc_par::parse;
/// use vextc_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = tokenize("int x = 1;", &handler);
/// let stmts = parse(tokens, &handler);
/// assert_eq!(stmts.len(), 1);
/// assert!(!handler.has_errors());
/// ```
pub fn parse(tokens: Vec<Token>, handler: &Handler) -> Vec<Stmt> {
    Parser::new(tokens, handler).parse()
}

/// Parser over a comment-free token stream.
pub struct Parser<'a> {
    /// Token stream (comments filtered out).
    tokens: Vec<Token>,

    /// Current position in the token stream.
    position: usize,

    /// Sink for syntax errors.
    handler: &'a Handler,

    /// Fallback token returned past the end of the stream.
    eof: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser. Comment tokens are dropped here; they only
    /// matter to the editor layer.
    pub fn new(tokens: Vec<Token>, handler: &'a Handler) -> Self {
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Self {
            tokens,
            position: 0,
            handler,
            eof: Token::new(TokenKind::Eof, "", 0, 0, 0),
        }
    }

    /// Parse the whole stream into a statement list.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            let before = self.position;
            match self.parse_stmt(true) {
                Some(stmt) => stmts.push(stmt),
                None => self.recover_to_sync_point(),
            }
            if self.position == before {
                // no progress on malformed input: skip the offending token
                self.advance();
            }
        }

        stmts
    }

    // =========================================================================
    // Token stream helpers
    // =========================================================================

    /// Current token (`Eof` past the end).
    pub(crate) fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    /// Token `n` positions ahead.
    pub(crate) fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.position + n).unwrap_or(&self.eof)
    }

    /// Span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.current().span()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().is_eof()
    }

    /// Advance past the current token.
    pub(crate) fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Clone the current token and advance past it.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current().clone();
        self.advance();
        token
    }

    pub(crate) fn at_punct(&self, text: &str) -> bool {
        self.current().is(TokenKind::Punctuation, text)
    }

    pub(crate) fn at_op(&self, text: &str) -> bool {
        self.current().is(TokenKind::Operator, text)
    }

    pub(crate) fn at_keyword(&self, text: &str) -> bool {
        self.current().is(TokenKind::Keyword, text)
    }

    /// Consume the current token if it is the given punctuation.
    pub(crate) fn match_punct(&mut self, text: &str) -> bool {
        if self.at_punct(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it is the given operator.
    pub(crate) fn match_op(&mut self, text: &str) -> bool {
        if self.at_op(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require the given punctuation, reporting an error otherwise.
    pub(crate) fn expect_punct(&mut self, text: &str) -> Option<()> {
        if self.match_punct(text) {
            Some(())
        } else {
            self.error(
                format!("expected '{}', found '{}'", text, self.describe_current()),
                self.current_span(),
            );
            None
        }
    }

    /// Require an identifier, reporting what was expected otherwise.
    pub(crate) fn expect_identifier(&mut self, what: &str) -> Option<Token> {
        if self.current().kind == TokenKind::Identifier {
            Some(self.bump())
        } else {
            self.error(
                format!("expected {}, found '{}'", what, self.describe_current()),
                self.current_span(),
            );
            None
        }
    }

    fn describe_current(&self) -> String {
        let token = self.current();
        if token.is_eof() {
            "end of input".to_string()
        } else {
            token.text.clone()
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>, span: Span) {
        self.handler.error(message, span);
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Panic-mode recovery: skip tokens until just past the next `;` or `}`.
    pub(crate) fn recover_to_sync_point(&mut self) {
        while !self.is_at_end() {
            if self.at_punct(";") || self.at_punct("}") {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    /// Recovery inside a block: skip to the next `;` (consumed) but stop
    /// before `}` so the block parser can close it.
    pub(crate) fn recover_in_block(&mut self) {
        while !self.is_at_end() {
            if self.at_punct(";") {
                self.advance();
                return;
            }
            if self.at_punct("}") {
                return;
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vextc_lex::tokenize;

    fn parse_source(source: &str) -> (Vec<Stmt>, Handler) {
        let handler = Handler::new();
        let tokens = tokenize(source, &handler);
        let stmts = parse(tokens, &handler);
        (stmts, handler)
    }

    #[test]
    fn test_parse_empty() {
        let (stmts, handler) = parse_source("");
        assert!(stmts.is_empty());
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_parse_clean_program() {
        let (stmts, handler) = parse_source(
            "int a = 2;\nint b = 3;\nstring s = \"sum=\" + (a + b);",
        );
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn test_comments_are_skipped() {
        let (stmts, handler) = parse_source("// leading\nint x = 1; // trailing");
        assert!(!handler.has_errors());
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_recovery_continues_after_bad_statement() {
        let (stmts, handler) = parse_source("int = 5;\nint y = 2;");
        assert!(handler.has_errors());
        // the second declaration survives
        assert!(stmts
            .iter()
            .any(|s| matches!(s, Stmt::VarDecl(d) if d.name == "y")));
    }

    #[test]
    fn test_garbage_input_terminates() {
        let (_, handler) = parse_source(") } ; ( { = + %%% int");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_missing_semicolon_reported() {
        let (_, handler) = parse_source("int x = 1 int y = 2;");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_all_spans_within_input() {
        let source = "int x = 1;\nif (x > 0) { x = 2; }";
        let (stmts, _) = parse_source(source);
        let lines: Vec<&str> = source.lines().collect();
        fn walk(stmts: &[Stmt], check: &impl Fn(Span)) {
            for s in stmts {
                match s {
                    Stmt::VarDecl(d) => check(d.span),
                    Stmt::Assign(a) => check(a.span),
                    Stmt::If(i) => {
                        check(i.span);
                        walk(&i.body, check);
                        if let Some(e) = &i.else_body {
                            walk(e, check);
                        }
                    }
                    _ => {}
                }
            }
        }
        walk(&stmts, &|span: Span| {
            assert!(span.line >= 1 && span.line as usize <= lines.len());
            assert!(span.start_col >= 1);
            assert!(span.end_col >= span.start_col);
        });
    }
}
