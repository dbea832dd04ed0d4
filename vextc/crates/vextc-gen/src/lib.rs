//! vextc-gen - Value model, instruction set and bytecode emitter.
//!
//! The emitter consumes the analyzed AST (slots assigned, call return
//! types resolved) and produces a flat instruction vector with absolute
//! jump targets, ready for the stack machine in `vextc-vm`.

pub mod emit;
pub mod instr;
pub mod value;

pub use emit::{emit, validate_jumps};
pub use instr::{CmpOp, Instr, Op, UserFunction};
pub use value::Value;
