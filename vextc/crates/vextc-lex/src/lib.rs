//! vextc-lex - Lexical analyzer.
//!
//! Transforms source text into a stream of spanned tokens. The lexer never
//! aborts: every problem becomes a diagnostic in the shared [`Handler`] and
//! scanning continues to end of input, so the parser always receives a
//! complete, `Eof`-terminated stream.

pub mod cursor;
mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Token, TokenKind, KEYWORDS};

use vextc_util::Handler;

/// Tokenizes `source`, reporting lexical errors into `handler`.
///
/// The returned stream always ends with an [`TokenKind::Eof`] token.
/// Comment tokens are included in-stream; consumers that do not care about
/// them (the parser) filter them out.
///
/// # Example
///
/// ```
/// use vextc_lex::{tokenize, TokenKind};
/// use vextc_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = tokenize("int x = 1;", &handler);
/// assert!(!handler.has_errors());
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
/// ```
pub fn tokenize(source: &str, handler: &Handler) -> Vec<Token> {
    let mut lexer = Lexer::new(source, handler);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let done = token.is_eof();
        tokens.push(token);
        if done {
            break;
        }
    }

    tokens
}
