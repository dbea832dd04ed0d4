//! Type compatibility rules.
//!
//! The type universe is the small fixed set in [`vextc_par::Ty`]. The
//! compatibility relation is directional (source value assigned into a
//! target slot); `error` is compatible in both directions so one reported
//! problem does not cascade into noise.

use vextc_par::Ty;

/// Can a value of type `source` be used where `target` is required?
///
/// - identical types are compatible
/// - `auto` is compatible with anything (inference placeholder)
/// - `numeral` accepts `int` or `float` (built-in parameters)
/// - `float` accepts `int` (widening)
/// - `error` propagates as compatible to suppress cascading diagnostics
/// - a `string` target only accepts a `string` source
pub fn compatible(target: Ty, source: Ty) -> bool {
    if target == source {
        return true;
    }
    if target == Ty::Error || source == Ty::Error {
        return true;
    }
    if target == Ty::Auto || source == Ty::Auto {
        return true;
    }
    match target {
        Ty::Numeral => matches!(source, Ty::Int | Ty::Float),
        Ty::Float => source == Ty::Int,
        _ => false,
    }
}

/// Symmetric compatibility, used for comparison operands.
pub fn mutually_compatible(a: Ty, b: Ty) -> bool {
    compatible(a, b) || compatible(b, a)
}

/// True for the concrete numeric types.
pub fn is_numeric(ty: Ty) -> bool {
    matches!(ty, Ty::Int | Ty::Float)
}

/// Result type of a numeric binary operation: `float` wins over `int`.
pub fn numeric_result(a: Ty, b: Ty) -> Ty {
    if a == Ty::Error || b == Ty::Error {
        Ty::Error
    } else if a == Ty::Float || b == Ty::Float {
        Ty::Float
    } else {
        Ty::Int
    }
}
