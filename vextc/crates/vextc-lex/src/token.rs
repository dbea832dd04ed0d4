//! Token definitions.

use vextc_util::Span;

/// Reserved words of the language.
pub const KEYWORDS: &[&str] = &[
    "int", "float", "bool", "string", "auto", "void", "if", "else", "while", "for", "return",
];

/// Classification tag of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A name: `[A-Za-z_][A-Za-z0-9_]*`, not a keyword or boolean.
    Identifier,
    /// One of [`KEYWORDS`].
    Keyword,
    /// A string literal; the token text is the processed content.
    String,
    /// An integer or decimal literal.
    Numeric,
    /// An operator, single- or multi-character.
    Operator,
    /// `( ) { } , ; .`
    Punctuation,
    /// A `//` line comment, including the slashes.
    Comment,
    /// `true` or `false`.
    Boolean,
    /// End of input; always the final token of a stream.
    Eof,
    /// Anything the lexer could not classify.
    Unknown,
}

/// A lexed token with its source position.
///
/// Positions are 1-based and counted in characters; `end_col` is the
/// inclusive column of the token's last character. For string tokens the
/// text holds the processed content (escapes applied, quotes stripped)
/// while the columns still cover the quoted source form.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Classification tag.
    pub kind: TokenKind,
    /// Token text (processed content for strings).
    pub text: String,
    /// Line the token starts on (1-based).
    pub line: u32,
    /// Column of the first character (1-based).
    pub start_col: u32,
    /// Column of the last character (inclusive).
    pub end_col: u32,
}

impl Token {
    /// Create a token.
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        line: u32,
        start_col: u32,
        end_col: u32,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            start_col,
            end_col,
        }
    }

    /// The source span this token covers.
    pub fn span(&self) -> Span {
        Span::new(self.line, self.start_col, self.end_col)
    }

    /// True if the token has the given kind and text.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    /// True for the end-of-input token.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
