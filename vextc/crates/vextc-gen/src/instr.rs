//! Instruction set.
//!
//! A flat vector of [`Instr`] with absolute jump targets. Some opcodes
//! embed a [`Value`] directly; `DefFunc` embeds the compiled body of a
//! user function. Stack effects are noted per opcode.

use crate::value::Value;
use std::fmt;
use vextc_util::Span;

/// Comparison shape for the specialized loop-header opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Evaluate the comparison.
    pub fn eval(self, left: f64, right: f64) -> bool {
        match self {
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        }
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Opcode with its argument payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Push the embedded value.
    LoadConst(Value),
    /// Push the slot's value. Stack: `[] -> [v]`
    LoadVar(u32),
    /// Pop into the slot, growing the slot array as needed. `[v] -> []`
    StoreVar(u32),

    // arithmetic: pop right then left, push the result
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,

    // comparisons: pop right then left, push a bool
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,

    /// Pop a bool, push its negation.
    Not,

    /// Unconditional jump.
    Jmp(usize),
    /// Pop a bool, jump when false.
    JmpIfFalse(usize),
    /// Pop a bool, jump when true.
    JmpIfTrue(usize),
    /// Loop-exit jump: read the slot as a number and jump to `target` when
    /// the comparison against `limit` is NOT satisfied. No stack effect.
    JmpIfVarOpConst {
        slot: u32,
        cmp: CmpOp,
        limit: f64,
        target: usize,
    },

    /// Discard the top of stack.
    Pop,
    /// Increment the number in the slot, in place.
    IncVar(u32),
    /// Decrement the number in the slot, in place.
    DecVar(u32),

    /// Call by name; `argc` arguments are on the stack, left-to-right.
    /// The result (if any) is pushed.
    Call { name: String, argc: u8 },
    /// Call and discard any result.
    CallVoid { name: String, argc: u8 },
    /// Pop the return value and end the current invocation.
    Ret,
    /// Register the embedded user function under its name.
    DefFunc(UserFunction),
}

impl Op {
    /// The jump target argument, if this opcode has one.
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Op::Jmp(t) | Op::JmpIfFalse(t) | Op::JmpIfTrue(t) => Some(*t),
            Op::JmpIfVarOpConst { target, .. } => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::LoadConst(v) => write!(f, "LOAD_CONST {:?}", v),
            Op::LoadVar(s) => write!(f, "LOAD_VAR {}", s),
            Op::StoreVar(s) => write!(f, "STORE_VAR {}", s),
            Op::Add => f.write_str("ADD"),
            Op::Sub => f.write_str("SUB"),
            Op::Mul => f.write_str("MUL"),
            Op::Div => f.write_str("DIV"),
            Op::Pow => f.write_str("POW"),
            Op::Mod => f.write_str("MOD"),
            Op::Eq => f.write_str("EQ"),
            Op::Neq => f.write_str("NEQ"),
            Op::Lt => f.write_str("LT"),
            Op::Lte => f.write_str("LTE"),
            Op::Gt => f.write_str("GT"),
            Op::Gte => f.write_str("GTE"),
            Op::Not => f.write_str("NOT"),
            Op::Jmp(t) => write!(f, "JMP {}", t),
            Op::JmpIfFalse(t) => write!(f, "JMP_IF_FALSE {}", t),
            Op::JmpIfTrue(t) => write!(f, "JMP_IF_TRUE {}", t),
            Op::JmpIfVarOpConst {
                slot,
                cmp,
                limit,
                target,
            } => write!(
                f,
                "JMP_IF_VAR_OP_CONST s{} {} {} -> {}",
                slot,
                cmp.symbol(),
                limit,
                target
            ),
            Op::Pop => f.write_str("POP"),
            Op::IncVar(s) => write!(f, "INC_VAR {}", s),
            Op::DecVar(s) => write!(f, "DEC_VAR {}", s),
            Op::Call { name, argc } => write!(f, "CALL {} {}", name, argc),
            Op::CallVoid { name, argc } => write!(f, "CALL_VOID {} {}", name, argc),
            Op::Ret => f.write_str("RET"),
            Op::DefFunc(func) => write!(f, "DEF_FUNC {} ({} instrs)", func.name, func.body.len()),
        }
    }
}

/// One instruction with its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Instr {
    pub op: Op,
    /// Source line (1-based; 0 for synthesized epilogues).
    pub line: u32,
    /// Source column (1-based).
    pub col: u32,
}

impl Instr {
    pub fn new(op: Op, span: Span) -> Self {
        Self {
            op,
            line: span.line,
            col: span.start_col,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)
    }
}

/// A compiled user function. The body begins with `STORE_VAR` instructions
/// that pop the arguments in reverse order into the parameter slots, and
/// always ends in `RET`.
#[derive(Clone, Debug, PartialEq)]
pub struct UserFunction {
    pub name: String,
    pub param_slots: Vec<u32>,
    pub body: Vec<Instr>,
}

impl UserFunction {
    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.param_slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_eval() {
        assert!(CmpOp::Lt.eval(1.0, 2.0));
        assert!(!CmpOp::Lt.eval(2.0, 2.0));
        assert!(CmpOp::Le.eval(2.0, 2.0));
        assert!(CmpOp::Gt.eval(3.0, 2.0));
        assert!(CmpOp::Ge.eval(2.0, 2.0));
    }

    #[test]
    fn test_jump_target() {
        assert_eq!(Op::Jmp(7).jump_target(), Some(7));
        assert_eq!(Op::JmpIfFalse(3).jump_target(), Some(3));
        assert_eq!(
            Op::JmpIfVarOpConst {
                slot: 0,
                cmp: CmpOp::Lt,
                limit: 5.0,
                target: 9
            }
            .jump_target(),
            Some(9)
        );
        assert_eq!(Op::Add.jump_target(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Op::LoadVar(2).to_string(), "LOAD_VAR 2");
        assert_eq!(Op::JmpIfFalse(4).to_string(), "JMP_IF_FALSE 4");
        let op = Op::JmpIfVarOpConst {
            slot: 1,
            cmp: CmpOp::Lt,
            limit: 5.0,
            target: 8,
        };
        assert_eq!(op.to_string(), "JMP_IF_VAR_OP_CONST s1 < 5 -> 8");
    }
}
