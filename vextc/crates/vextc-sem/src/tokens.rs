//! Semantic highlighting tokens.
//!
//! Purely additive metadata emitted during analysis and consumed by the
//! editor integration, which converts the 1-based positions to its own
//! coordinate space.

use vextc_util::Span;

/// Highlighting category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenCategory {
    Type,
    Function,
    Variable,
    Keyword,
    Operator,
    Number,
    String,
    Boolean,
    Comment,
}

/// Modifier bit flags.
pub mod modifier {
    pub const DECLARATION: u8 = 1 << 0;
    pub const PARAMETER: u8 = 1 << 1;
    pub const CONTROL: u8 = 1 << 2;
    pub const CALL: u8 = 1 << 3;
    pub const READONLY: u8 = 1 << 4;
    pub const STATIC: u8 = 1 << 5;
}

/// A single highlighting record.
#[derive(Clone, Debug, PartialEq)]
pub struct SemanticToken {
    pub line: u32,
    pub start_col: u32,
    pub end_col: u32,
    pub category: TokenCategory,
    /// Bitwise OR of [`modifier`] flags.
    pub modifiers: u8,
}

impl SemanticToken {
    /// Build a token from a span.
    pub fn new(span: Span, category: TokenCategory, modifiers: u8) -> Self {
        Self {
            line: span.line,
            start_col: span.start_col,
            end_col: span.end_col,
            category,
            modifiers,
        }
    }

    /// Is the given modifier flag set?
    pub fn has_modifier(&self, flag: u8) -> bool {
        self.modifiers & flag != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_span() {
        let token = SemanticToken::new(
            Span::new(2, 5, 9),
            TokenCategory::Variable,
            modifier::DECLARATION,
        );
        assert_eq!(token.line, 2);
        assert_eq!(token.start_col, 5);
        assert_eq!(token.end_col, 9);
        assert!(token.has_modifier(modifier::DECLARATION));
        assert!(!token.has_modifier(modifier::CALL));
    }

    #[test]
    fn test_combined_modifiers() {
        let token = SemanticToken::new(
            Span::point(1, 1),
            TokenCategory::Function,
            modifier::CALL | modifier::STATIC,
        );
        assert!(token.has_modifier(modifier::CALL));
        assert!(token.has_modifier(modifier::STATIC));
        assert!(!token.has_modifier(modifier::PARAMETER));
    }
}
