//! Runtime error type.
//!
//! Raised by the machine on invariant violation and caught by the engine,
//! which wraps the error as a single diagnostic. User code cannot observe
//! or catch these; the machine never panics the host process.

use thiserror::Error;

/// A runtime failure, carrying the source position of the faulting
/// instruction (0:0 when no position applies).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("stack underflow at {line}:{col}")]
    StackUnderflow { line: u32, col: u32 },

    #[error("type mismatch at {line}:{col}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        line: u32,
        col: u32,
    },

    #[error("division by zero at {line}:{col}")]
    DivisionByZero { line: u32, col: u32 },

    #[error("invalid jump target {target} at {line}:{col}")]
    BadJump { target: usize, line: u32, col: u32 },

    #[error("unknown function '{name}' at {line}:{col}")]
    UnknownFunction { name: String, line: u32, col: u32 },

    #[error("no overload of '{name}' takes {argc} arguments")]
    WrongArity { name: String, argc: usize, line: u32, col: u32 },
}

/// Result alias for machine operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
