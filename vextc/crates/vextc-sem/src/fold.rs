//! Constant folding.
//!
//! Applied to every checked expression: children fold first, then a node
//! whose operands are all literals is replaced by its computed literal.
//! `&&`/`||` with a literal left operand short-circuit at fold time, which
//! also means the dead right operand is never folded (and a division by a
//! literal zero inside it is never reported).
//!
//! Arithmetic folds in `f64`, matching what the VM executes, so folding is
//! value-preserving by construction. The folded literal keeps the `int`
//! tag only when both operands were ints and the result is integer-valued.

use vextc_par::ast::*;
use vextc_util::Handler;

/// Largest double that still round-trips through `i64` exactly enough for
/// the compact integer rendering.
const INT_TAG_LIMIT: f64 = 9.0e15;

/// Fold `expr` in place, reporting fold-time errors into `handler`.
pub fn fold_expr(expr: &mut Expr, handler: &Handler) {
    match expr {
        Expr::Literal(_) | Expr::Variable(_) => {}
        Expr::Unary(unary) => {
            fold_expr(&mut unary.operand, handler);
            if matches!(unary.op, UnOp::Inc | UnOp::Dec) {
                return;
            }
            let span = unary.span;
            let Expr::Literal(lit) = unary.operand.as_ref() else {
                return;
            };
            let folded = match (unary.op, &lit.value) {
                (UnOp::Neg, LitValue::Int(i)) => Some(LitValue::Int(i.wrapping_neg())),
                (UnOp::Neg, LitValue::Float(f)) => Some(LitValue::Float(-f)),
                (UnOp::Not, LitValue::Bool(b)) => Some(LitValue::Bool(!b)),
                _ => None,
            };
            if let Some(value) = folded {
                *expr = Expr::Literal(LiteralExpr { value, span });
            }
        }
        Expr::Binary(binary) if matches!(binary.op, BinOp::And | BinOp::Or) => {
            fold_expr(&mut binary.left, handler);
            let span = binary.span;
            if let Expr::Literal(LiteralExpr {
                value: LitValue::Bool(left),
                ..
            }) = binary.left.as_ref()
            {
                let left = *left;
                let decided = (binary.op == BinOp::And && !left) || (binary.op == BinOp::Or && left);
                if decided {
                    // the right operand is dead; it is neither folded nor
                    // checked for fold-time errors
                    *expr = Expr::Literal(LiteralExpr {
                        value: LitValue::Bool(left),
                        span,
                    });
                } else {
                    // true && rhs == rhs, false || rhs == rhs
                    fold_expr(&mut binary.right, handler);
                    let rhs = std::mem::replace(
                        binary.right.as_mut(),
                        Expr::Literal(LiteralExpr {
                            value: LitValue::Null,
                            span,
                        }),
                    );
                    *expr = rhs;
                }
                return;
            }
            fold_expr(&mut binary.right, handler);
        }
        Expr::Binary(binary) => {
            fold_expr(&mut binary.left, handler);
            fold_expr(&mut binary.right, handler);
            try_fold_binary(expr, handler);
        }
        Expr::Call(call) => {
            for arg in &mut call.args {
                fold_expr(arg, handler);
            }
        }
        Expr::ModuleCall(call) => {
            for arg in &mut call.args {
                fold_expr(arg, handler);
            }
        }
    }
}

/// Replace a binary node whose operands are both literals.
fn try_fold_binary(expr: &mut Expr, handler: &Handler) {
    let Expr::Binary(binary) = expr else { return };
    let span = binary.span;
    let (Expr::Literal(left), Expr::Literal(right)) =
        (binary.left.as_ref(), binary.right.as_ref())
    else {
        return;
    };

    let value = match binary.op {
        BinOp::Add => {
            if matches!(left.value, LitValue::Str(_)) || matches!(right.value, LitValue::Str(_)) {
                fold_concat(&left.value, &right.value)
            } else {
                fold_arithmetic(BinOp::Add, left, right, handler)
            }
        }
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow => {
            fold_arithmetic(binary.op, left, right, handler)
        }
        BinOp::Eq => fold_equality(&left.value, &right.value).map(LitValue::Bool),
        BinOp::Ne => fold_equality(&left.value, &right.value).map(|b| LitValue::Bool(!b)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let (Some(l), Some(r)) = (as_f64(&left.value), as_f64(&right.value)) else {
                return;
            };
            let result = match binary.op {
                BinOp::Lt => l < r,
                BinOp::Le => l <= r,
                BinOp::Gt => l > r,
                _ => l >= r,
            };
            Some(LitValue::Bool(result))
        }
        // literal-left short-circuit is handled by the caller
        BinOp::And | BinOp::Or => None,
    };

    if let Some(value) = value {
        *expr = Expr::Literal(LiteralExpr { value, span });
    }
}

/// Numeric fold in double precision. The result keeps the `int` tag only
/// when both operands were ints and the value is integer-valued.
fn fold_arithmetic(
    op: BinOp,
    left: &LiteralExpr,
    right: &LiteralExpr,
    handler: &Handler,
) -> Option<LitValue> {
    let l = as_f64(&left.value)?;
    let r = as_f64(&right.value)?;

    if matches!(op, BinOp::Div) && r == 0.0 {
        handler.error("division by zero", right.span);
        return None;
    }
    if matches!(op, BinOp::Mod) && r == 0.0 {
        // left to the runtime error path
        return None;
    }

    let result = match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mul => l * r,
        BinOp::Div => l / r,
        BinOp::Mod => l % r,
        BinOp::Pow => l.powf(r),
        _ => return None,
    };

    let both_int =
        matches!(left.value, LitValue::Int(_)) && matches!(right.value, LitValue::Int(_));
    if both_int && result.fract() == 0.0 && result.is_finite() && result.abs() < INT_TAG_LIMIT {
        Some(LitValue::Int(result as i64))
    } else {
        Some(LitValue::Float(result))
    }
}

/// String concatenation with the canonical textual coercion.
fn fold_concat(left: &LitValue, right: &LitValue) -> Option<LitValue> {
    Some(LitValue::Str(format!(
        "{}{}",
        literal_text(left)?,
        literal_text(right)?
    )))
}

/// Canonical text of a literal: `true`/`false` for booleans, compact form
/// for integer-valued numbers. Must agree with the runtime value rendering.
fn literal_text(value: &LitValue) -> Option<String> {
    match value {
        LitValue::Int(i) => Some(i.to_string()),
        LitValue::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() && f.abs() < INT_TAG_LIMIT {
                Some(format!("{}", *f as i64))
            } else {
                Some(format!("{}", f))
            }
        }
        LitValue::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        LitValue::Str(s) => Some(s.clone()),
        LitValue::Null => None,
    }
}

/// Equality across the literal kinds the type checker lets through.
fn fold_equality(left: &LitValue, right: &LitValue) -> Option<bool> {
    match (left, right) {
        (LitValue::Bool(l), LitValue::Bool(r)) => Some(l == r),
        (LitValue::Str(l), LitValue::Str(r)) => Some(l == r),
        _ => {
            let (l, r) = (as_f64(left)?, as_f64(right)?);
            Some(l == r)
        }
    }
}

fn as_f64(value: &LitValue) -> Option<f64> {
    match value {
        LitValue::Int(i) => Some(*i as f64),
        LitValue::Float(f) => Some(*f),
        _ => None,
    }
}
