//! Expression parsing using Pratt parsing (top-down operator precedence).
//!
//! # Operator precedence (lowest to highest)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1 | `=` (rejected inside expressions) | - |
//! | 2 | `\|\|` | Left |
//! | 3 | `&&` | Left |
//! | 4 | `==`, `!=` | Left |
//! | 5 | `<`, `>`, `<=`, `>=` | Left |
//! | 6 | `+`, `-` | Left |
//! | 7 | `*`, `/`, `%` | Left |
//! | 8 | `**` | Left |
//!
//! Prefix `-`/`!` bind tighter than any binary operator; postfix `++`/`--`
//! bind tightest and only apply to an identifier primary.

use crate::ast::*;
use crate::Parser;
use vextc_lex::TokenKind;
use vextc_util::Span;

/// Binding power levels. Higher numbers bind tighter; left-associative
/// operators use `(level, level + 1)`.
pub mod bp {
    /// Minimum binding power (start of expression).
    pub const MIN: u8 = 0;

    /// Logical OR: `||`
    pub const LOGICAL_OR: u8 = 2;

    /// Logical AND: `&&`
    pub const LOGICAL_AND: u8 = 4;

    /// Equality: `==`, `!=`
    pub const EQUALITY: u8 = 6;

    /// Relational: `<`, `>`, `<=`, `>=`
    pub const COMPARISON: u8 = 8;

    /// Additive: `+`, `-`
    pub const ADDITIVE: u8 = 10;

    /// Multiplicative: `*`, `/`, `%`
    pub const MULTIPLICATIVE: u8 = 12;

    /// Exponentiation: `**`
    pub const POWER: u8 = 14;

    /// Prefix operators: `-`, `!`
    pub const UNARY: u8 = 16;
}

/// The recovery placeholder: a literal `0` standing in for a missing
/// expression, so downstream passes always see a well-typed tree.
pub(crate) fn dummy_literal(span: Span) -> Expr {
    Expr::Literal(LiteralExpr {
        value: LitValue::Int(0),
        span,
    })
}

impl<'a> Parser<'a> {
    /// Parse a complete expression. Exposed for callers that embed
    /// expression parsing directly (tests, tooling).
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expr_bp(bp::MIN)
    }

    /// Parse an expression, falling back to the dummy `0` literal so the
    /// caller always receives a node.
    pub(crate) fn parse_expr_or_dummy(&mut self) -> Expr {
        let span = self.current_span();
        match self.parse_expr() {
            Some(expr) => expr,
            None => dummy_literal(span),
        }
    }

    /// Pratt parser core: parse an expression whose operators all have
    /// left binding power >= `min_bp`.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            if self.at_op("=") {
                // assignment can never appear inside an expression; consume
                // the token so the loop is guaranteed to make progress
                self.error(
                    "assignment is not allowed inside an expression",
                    self.current_span(),
                );
                self.advance();
                continue;
            }

            let Some((left_bp, op)) = self.peek_binary_op() else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.advance();

            let rhs = match self.parse_expr_bp(left_bp + 1) {
                Some(expr) => expr,
                None => dummy_literal(self.current_span()),
            };

            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                span,
            });
        }

        Some(lhs)
    }

    /// Left binding power and operator for the current token, if it is a
    /// binary operator. All binary operators are left-associative, so the
    /// right binding power is always `left + 1`.
    fn peek_binary_op(&self) -> Option<(u8, BinOp)> {
        let token = self.current();
        if token.kind != TokenKind::Operator {
            return None;
        }
        match token.text.as_str() {
            "||" => Some((bp::LOGICAL_OR, BinOp::Or)),
            "&&" => Some((bp::LOGICAL_AND, BinOp::And)),
            "==" => Some((bp::EQUALITY, BinOp::Eq)),
            "!=" => Some((bp::EQUALITY, BinOp::Ne)),
            "<" => Some((bp::COMPARISON, BinOp::Lt)),
            ">" => Some((bp::COMPARISON, BinOp::Gt)),
            "<=" => Some((bp::COMPARISON, BinOp::Le)),
            ">=" => Some((bp::COMPARISON, BinOp::Ge)),
            "+" => Some((bp::ADDITIVE, BinOp::Add)),
            "-" => Some((bp::ADDITIVE, BinOp::Sub)),
            "*" => Some((bp::MULTIPLICATIVE, BinOp::Mul)),
            "/" => Some((bp::MULTIPLICATIVE, BinOp::Div)),
            "%" => Some((bp::MULTIPLICATIVE, BinOp::Mod)),
            "**" => Some((bp::POWER, BinOp::Pow)),
            _ => None,
        }
    }

    /// Parse a prefix expression: unary operator, parenthesized group, or
    /// primary.
    fn parse_prefix(&mut self) -> Option<Expr> {
        let token = self.current().clone();

        if token.is(TokenKind::Operator, "-") {
            self.advance();
            let operand = match self.parse_expr_bp(bp::UNARY) {
                Some(expr) => expr,
                None => dummy_literal(self.current_span()),
            };
            let span = token.span().merge(operand.span());
            return Some(Expr::Unary(UnaryExpr {
                op: UnOp::Neg,
                operand: Box::new(operand),
                span,
            }));
        }

        if token.is(TokenKind::Operator, "!") {
            self.advance();
            let operand = match self.parse_expr_bp(bp::UNARY) {
                Some(expr) => expr,
                None => dummy_literal(self.current_span()),
            };
            let span = token.span().merge(operand.span());
            return Some(Expr::Unary(UnaryExpr {
                op: UnOp::Not,
                operand: Box::new(operand),
                span,
            }));
        }

        if token.is(TokenKind::Punctuation, "(") {
            self.advance();
            let inner = self.parse_expr_or_dummy();
            let _ = self.expect_punct(")");
            return Some(inner);
        }

        match token.kind {
            TokenKind::Numeric => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: numeric_value(&token.text),
                    span: token.span(),
                }))
            }
            TokenKind::String => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: LitValue::Str(token.text.clone()),
                    span: token.span(),
                }))
            }
            TokenKind::Boolean => {
                self.advance();
                Some(Expr::Literal(LiteralExpr {
                    value: LitValue::Bool(token.text == "true"),
                    span: token.span(),
                }))
            }
            TokenKind::Identifier => self.parse_identifier_expr(),
            _ => {
                self.error(
                    format!(
                        "expected expression, found '{}'",
                        if token.is_eof() {
                            "end of input"
                        } else {
                            token.text.as_str()
                        }
                    ),
                    token.span(),
                );
                None
            }
        }
    }

    /// An identifier primary: call, module access, or variable reference
    /// with optional postfix `++`/`--`.
    fn parse_identifier_expr(&mut self) -> Option<Expr> {
        let name_token = self.bump();

        // Module.function(...)
        if self.at_punct(".")
            && self.peek(1).kind == TokenKind::Identifier
            && self.peek(2).is(TokenKind::Punctuation, "(")
        {
            self.advance();
            let func_token = self.bump();
            let args = self.parse_call_args()?;
            return Some(Expr::ModuleCall(ModuleCallExpr {
                module: name_token.text.clone(),
                name: func_token.text.clone(),
                args,
                ret: Ty::Auto,
                span: name_token.span().merge(func_token.span()),
            }));
        }

        // function(...)
        if self.at_punct("(") {
            let args = self.parse_call_args()?;
            return Some(Expr::Call(CallExpr {
                name: name_token.text.clone(),
                args,
                ret: Ty::Auto,
                span: name_token.span(),
            }));
        }

        let variable = Expr::Variable(VariableExpr {
            name: name_token.text.clone(),
            slot: -1,
            span: name_token.span(),
        });

        // postfix ++/-- binds tightest, and only on an identifier primary
        if self.at_op("++") || self.at_op("--") {
            let op_token = self.bump();
            let op = if op_token.text == "++" {
                UnOp::Inc
            } else {
                UnOp::Dec
            };
            return Some(Expr::Unary(UnaryExpr {
                op,
                operand: Box::new(variable),
                span: name_token.span().merge(op_token.span()),
            }));
        }

        Some(variable)
    }

    /// `( expr, expr, ... )` argument list.
    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        self.expect_punct("(")?;
        let mut args = Vec::new();

        if !self.at_punct(")") {
            loop {
                args.push(self.parse_expr_or_dummy());
                if !self.match_punct(",") {
                    break;
                }
            }
        }

        self.expect_punct(")")?;
        Some(args)
    }
}

/// Converts numeric token text into a literal value. Text containing `.`,
/// `e` or `E` becomes a float; everything else an int, with float as the
/// overflow fallback.
fn numeric_value(text: &str) -> LitValue {
    if text.contains(['.', 'e', 'E']) {
        LitValue::Float(text.parse().unwrap_or(0.0))
    } else {
        match text.parse::<i64>() {
            Ok(value) => LitValue::Int(value),
            Err(_) => LitValue::Float(text.parse().unwrap_or(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vextc_lex::tokenize;
    use vextc_util::Handler;

    /// Helper to parse a single expression.
    fn parse_expr_source(source: &str) -> (Option<Expr>, Handler) {
        let handler = Handler::new();
        let tokens = tokenize(source, &handler);
        let expr = {
            let mut parser = Parser::new(tokens, &handler);
            parser.parse_expr()
        };
        (expr, handler)
    }

    fn parse_ok(source: &str) -> Expr {
        let (expr, handler) = parse_expr_source(source);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        expr.expect("expression should parse")
    }

    fn assert_binary(expr: &Expr, op: BinOp) -> (&Expr, &Expr) {
        match expr {
            Expr::Binary(b) => {
                assert_eq!(b.op, op, "expected operator {:?}", op);
                (&b.left, &b.right)
            }
            _ => panic!("expected binary expression, got {:?}", expr),
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    #[test]
    fn test_int_literal() {
        let expr = parse_ok("42");
        assert!(matches!(
            expr,
            Expr::Literal(LiteralExpr {
                value: LitValue::Int(42),
                ..
            })
        ));
    }

    #[test]
    fn test_float_literal() {
        let expr = parse_ok("3.25");
        let Expr::Literal(LiteralExpr {
            value: LitValue::Float(f),
            ..
        }) = expr
        else {
            panic!("expected float literal");
        };
        assert!((f - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_string_literal() {
        let expr = parse_ok("\"hi\"");
        assert!(matches!(
            expr,
            Expr::Literal(LiteralExpr {
                value: LitValue::Str(s),
                ..
            }) if s == "hi"
        ));
    }

    #[test]
    fn test_bool_literals() {
        assert!(matches!(
            parse_ok("true"),
            Expr::Literal(LiteralExpr {
                value: LitValue::Bool(true),
                ..
            })
        ));
        assert!(matches!(
            parse_ok("false"),
            Expr::Literal(LiteralExpr {
                value: LitValue::Bool(false),
                ..
            })
        ));
    }

    // =========================================================================
    // Precedence and associativity
    // =========================================================================

    #[test]
    fn test_mul_binds_tighter_than_add() {
        let expr = parse_ok("1 + 2 * 3");
        let (left, right) = assert_binary(&expr, BinOp::Add);
        assert!(matches!(left, Expr::Literal(_)));
        assert_binary(right, BinOp::Mul);
    }

    #[test]
    fn test_left_associativity() {
        let expr = parse_ok("10 - 4 - 3");
        let (left, _) = assert_binary(&expr, BinOp::Sub);
        assert_binary(left, BinOp::Sub);
    }

    #[test]
    fn test_pow_binds_tighter_than_mul() {
        let expr = parse_ok("2 * 3 ** 4");
        let (_, right) = assert_binary(&expr, BinOp::Mul);
        assert_binary(right, BinOp::Pow);
    }

    #[test]
    fn test_pow_left_associative() {
        let expr = parse_ok("2 ** 3 ** 2");
        let (left, _) = assert_binary(&expr, BinOp::Pow);
        assert_binary(left, BinOp::Pow);
    }

    #[test]
    fn test_comparison_below_additive() {
        let expr = parse_ok("a + 1 < b * 2");
        let (left, right) = assert_binary(&expr, BinOp::Lt);
        assert_binary(left, BinOp::Add);
        assert_binary(right, BinOp::Mul);
    }

    #[test]
    fn test_logical_precedence() {
        let expr = parse_ok("a == 1 || b == 2 && c == 3");
        let (_, right) = assert_binary(&expr, BinOp::Or);
        assert_binary(right, BinOp::And);
    }

    #[test]
    fn test_parens_override() {
        let expr = parse_ok("(1 + 2) * 3");
        let (left, _) = assert_binary(&expr, BinOp::Mul);
        assert_binary(left, BinOp::Add);
    }

    // =========================================================================
    // Unary and postfix
    // =========================================================================

    #[test]
    fn test_unary_minus_tighter_than_pow() {
        // -2 ** 2 parses as (-2) ** 2
        let expr = parse_ok("-2 ** 2");
        let (left, _) = assert_binary(&expr, BinOp::Pow);
        assert!(matches!(left, Expr::Unary(u) if u.op == UnOp::Neg));
    }

    #[test]
    fn test_not() {
        let expr = parse_ok("!a && b");
        let (left, _) = assert_binary(&expr, BinOp::And);
        assert!(matches!(left, Expr::Unary(u) if u.op == UnOp::Not));
    }

    #[test]
    fn test_postfix_increment_in_expression() {
        let expr = parse_ok("f(i++)");
        let Expr::Call(call) = expr else { panic!() };
        assert!(matches!(&call.args[0], Expr::Unary(u) if u.op == UnOp::Inc));
    }

    // =========================================================================
    // Calls, module access, variables
    // =========================================================================

    #[test]
    fn test_call_with_args() {
        let expr = parse_ok("max(1, 2 + 3)");
        let Expr::Call(call) = expr else { panic!() };
        assert_eq!(call.name, "max");
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.ret, Ty::Auto);
    }

    #[test]
    fn test_module_call() {
        let expr = parse_ok("Math.pow(2, 8)");
        let Expr::ModuleCall(call) = expr else { panic!() };
        assert_eq!(call.module, "Math");
        assert_eq!(call.name, "pow");
        assert_eq!(call.qualified_name(), "Math.pow");
        assert_eq!(call.args.len(), 2);
    }

    #[test]
    fn test_variable_reference() {
        let expr = parse_ok("count");
        assert!(matches!(expr, Expr::Variable(v) if v.name == "count" && v.slot == -1));
    }

    // =========================================================================
    // Errors and recovery
    // =========================================================================

    #[test]
    fn test_assignment_inside_expression_reported() {
        let (expr, handler) = parse_expr_source("a = 1");
        assert!(expr.is_some());
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0]
            .message
            .contains("assignment is not allowed"));
    }

    #[test]
    fn test_missing_operand_recovers_with_dummy() {
        let (expr, handler) = parse_expr_source("1 +");
        assert!(handler.has_errors());
        let expr = expr.unwrap();
        let (_, right) = assert_binary(&expr, BinOp::Add);
        assert!(matches!(
            right,
            Expr::Literal(LiteralExpr {
                value: LitValue::Int(0),
                ..
            })
        ));
    }

    #[test]
    fn test_unclosed_paren_reported() {
        let (_, handler) = parse_expr_source("(1 + 2");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_numeric_value_conversion() {
        assert_eq!(numeric_value("7"), LitValue::Int(7));
        assert_eq!(numeric_value("2.5"), LitValue::Float(2.5));
        // the parser-side conversion accepts exponent notation even though
        // the scanner never produces it in one token
        assert_eq!(numeric_value("1e3"), LitValue::Float(1000.0));
    }
}
