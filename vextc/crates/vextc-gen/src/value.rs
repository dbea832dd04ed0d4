//! Runtime value model.
//!
//! All numerics are double precision; the `int`/`float` split is a static
//! distinction only. The `Display` implementation is the canonical textual
//! form used everywhere a value becomes text: `print`, string
//! concatenation, and the final-state dump. Booleans render `true`/`false`
//! and integer-valued doubles render without a trailing `.0`.

use std::fmt;
use vextc_par::ast::LitValue;

/// Doubles beyond this magnitude are not rendered in integer form.
const COMPACT_LIMIT: f64 = 9.0e15;

/// A runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl Value {
    /// Convert a parsed literal into its runtime representation.
    pub fn from_literal(literal: &LitValue) -> Value {
        match literal {
            LitValue::Int(i) => Value::Number(*i as f64),
            LitValue::Float(f) => Value::Number(*f),
            LitValue::Bool(b) => Value::Bool(*b),
            LitValue::Str(s) => Value::Str(s.clone()),
            LitValue::Null => Value::Null,
        }
    }

    /// The runtime answer for `__v_gettype`. Numbers carry no static tag,
    /// so integer-valued numbers answer `int`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    "int"
                } else {
                    "float"
                }
            }
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Null => "null",
        }
    }

    /// The number payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < COMPACT_LIMIT {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
        }
    }
}
