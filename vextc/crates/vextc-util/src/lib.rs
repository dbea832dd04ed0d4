//! vextc-util - Foundation types shared by every compiler phase.
//!
//! This crate provides source location tracking ([`Span`]) and the
//! per-compilation diagnostic sink ([`Handler`]). It deliberately holds no
//! phase-specific logic so that every other crate can depend on it.

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, Handler, Severity};
pub use span::Span;

// Re-export commonly used hash types
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
