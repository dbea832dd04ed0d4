//! Native built-in functions.
//!
//! Natives receive their arguments as plain values and return an optional
//! result; `Ok(None)` means nothing is pushed (the `print` family). The
//! signatures registered in the semantic function table must stay in sync
//! with the dispatch here.

use crate::error::{Result, RuntimeError};
use crate::Vm;
use rand::Rng;
use vextc_gen::Value;

/// Dispatch a native call by (possibly qualified) name and argument list.
pub(crate) fn call_native(
    vm: &mut Vm,
    name: &str,
    args: &[Value],
    line: u32,
    col: u32,
) -> Result<Option<Value>> {
    match (name, args.len()) {
        ("print", 1) => {
            let text = args[0].to_string();
            vm.write_line(&text);
            Ok(None)
        }
        ("len", 1) => {
            let Value::Str(s) = &args[0] else {
                return Err(mismatch("string", &args[0], line, col));
            };
            Ok(Some(Value::Number(s.chars().count() as f64)))
        }
        ("__v_gettype", 1) => Ok(Some(Value::Str(args[0].type_name().to_string()))),
        ("__v_tostring", 1) => Ok(Some(Value::Str(args[0].to_string()))),

        ("Math.sqrt", 1) => math1(args, line, col, f64::sqrt),
        ("Math.sin", 1) => math1(args, line, col, f64::sin),
        ("Math.cos", 1) => math1(args, line, col, f64::cos),
        ("Math.tan", 1) => math1(args, line, col, f64::tan),
        ("Math.log", 1) => math1(args, line, col, f64::ln),
        ("Math.exp", 1) => math1(args, line, col, f64::exp),
        ("Math.abs", 1) => math1(args, line, col, f64::abs),
        ("Math.round", 1) => math1(args, line, col, f64::round),
        ("Math.floor", 1) => math1(args, line, col, f64::floor),
        ("Math.ceil", 1) => math1(args, line, col, f64::ceil),

        ("Math.pow", 2) => math2(args, line, col, f64::powf),
        ("Math.min", 2) => math2(args, line, col, f64::min),
        ("Math.max", 2) => math2(args, line, col, f64::max),

        // uniform in [0, 1)
        ("Math.random", 0) => Ok(Some(Value::Number(rand::thread_rng().gen::<f64>()))),
        // uniform in [min, max)
        ("Math.random", 2) => {
            let min = number_arg(args, 0, line, col)?;
            let max = number_arg(args, 1, line, col)?;
            let r: f64 = rand::thread_rng().gen();
            Ok(Some(Value::Number(min + r * (max - min))))
        }

        _ if is_known_native(name) => Err(RuntimeError::WrongArity {
            name: name.to_string(),
            argc: args.len(),
            line,
            col,
        }),
        _ => Err(RuntimeError::UnknownFunction {
            name: name.to_string(),
            line,
            col,
        }),
    }
}

/// Is this name a native at any arity?
fn is_known_native(name: &str) -> bool {
    matches!(
        name,
        "print"
            | "len"
            | "__v_gettype"
            | "__v_tostring"
            | "Math.sqrt"
            | "Math.sin"
            | "Math.cos"
            | "Math.tan"
            | "Math.log"
            | "Math.exp"
            | "Math.abs"
            | "Math.round"
            | "Math.floor"
            | "Math.ceil"
            | "Math.pow"
            | "Math.min"
            | "Math.max"
            | "Math.random"
    )
}

fn math1(args: &[Value], line: u32, col: u32, f: impl Fn(f64) -> f64) -> Result<Option<Value>> {
    let x = number_arg(args, 0, line, col)?;
    Ok(Some(Value::Number(f(x))))
}

fn math2(
    args: &[Value],
    line: u32,
    col: u32,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Option<Value>> {
    let x = number_arg(args, 0, line, col)?;
    let y = number_arg(args, 1, line, col)?;
    Ok(Some(Value::Number(f(x, y))))
}

fn number_arg(args: &[Value], index: usize, line: u32, col: u32) -> Result<f64> {
    args[index]
        .as_number()
        .ok_or_else(|| mismatch("number", &args[index], line, col))
}

fn mismatch(expected: &'static str, found: &Value, line: u32, col: u32) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected,
        found: crate::kind_name(found),
        line,
        col,
    }
}
