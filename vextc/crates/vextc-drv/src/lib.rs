//! vextc-drv - Engine façade.
//!
//! Drives the five pipeline stages (lex, parse, analyze, emit, execute)
//! and returns structured results. Each compile creates a fresh diagnostic
//! sink, so nothing leaks between compilations; bytecode is only emitted
//! when the compile produced zero error-severity diagnostics, and
//! execution wraps any runtime error as a single diagnostic.

use std::time::Instant;

use vextc_gen::{emit, Instr, Value};
use vextc_lex::{tokenize, Token};
use vextc_par::{count_nodes, parse, Stmt};
use vextc_sem::{analyze, FuncSig, FunctionTable, SemanticToken};
use vextc_util::{Diagnostic, Handler, Severity, Span};
use vextc_vm::Vm;

/// Wall-clock milliseconds per pipeline phase.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhaseTimings {
    pub lex_ms: f64,
    pub parse_ms: f64,
    pub analyze_ms: f64,
    pub emit_ms: f64,
}

/// Everything a compilation produces.
pub struct CompilationResult {
    /// Emitted bytecode; empty when the compile had errors.
    pub instructions: Vec<Instr>,
    /// All diagnostics of this compile, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    /// Slot index -> variable name.
    pub slot_names: Vec<String>,
    /// Editor highlighting records.
    pub semantic_tokens: Vec<SemanticToken>,
    /// The token stream, comments included.
    pub tokens: Vec<Token>,
    /// Discovered user functions.
    pub functions: Vec<FuncSig>,
    /// The analyzed (and folded) AST.
    pub ast: Option<Vec<Stmt>>,
    /// Per-phase timings.
    pub timings: PhaseTimings,
    pub token_count: usize,
    pub node_count: usize,
}

impl CompilationResult {
    /// True when no error-severity diagnostic was reported.
    pub fn is_success(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// The slot index of a named variable, if any. When shadowing reuses a
    /// name the first slot wins, which is what the conformance scenarios
    /// reference.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.slot_names.iter().position(|n| n == name)
    }
}

/// The outcome of executing a compiled program.
pub struct RunResult {
    pub elapsed_ms: f64,
    /// Final variable slot state (indexes match `slot_names`; slots that
    /// were never stored may be absent or `Null`).
    pub final_variables: Vec<Value>,
    /// Captured output of the `print` family.
    pub stdout: String,
    /// Empty on success; a single wrapped runtime error otherwise.
    pub diagnostics: Vec<Diagnostic>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The final value of a slot, `Null` when it was never stored.
    pub fn variable(&self, slot: usize) -> Value {
        self.final_variables.get(slot).cloned().unwrap_or(Value::Null)
    }
}

/// The compile-and-execute engine. Stateless between calls: every compile
/// gets a fresh diagnostic sink and a fresh built-in table, every run a
/// fresh machine.
#[derive(Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Compile source text through lexing, parsing, semantic analysis and
    /// bytecode emission.
    pub fn compile(&self, source: &str) -> CompilationResult {
        let handler = Handler::new();
        let mut timings = PhaseTimings::default();

        let start = Instant::now();
        let tokens = tokenize(source, &handler);
        timings.lex_ms = elapsed_ms(start);

        let start = Instant::now();
        let mut stmts = parse(tokens.clone(), &handler);
        timings.parse_ms = elapsed_ms(start);

        let start = Instant::now();
        let mut table = FunctionTable::with_builtins();
        let analysis = analyze(&mut stmts, &mut table, &handler);
        timings.analyze_ms = elapsed_ms(start);

        let start = Instant::now();
        let instructions = if handler.has_errors() {
            Vec::new()
        } else {
            emit(&stmts)
        };
        timings.emit_ms = elapsed_ms(start);

        let token_count = tokens.len();
        let node_count = count_nodes(&stmts);

        CompilationResult {
            instructions,
            diagnostics: handler.into_diagnostics(),
            slot_names: analysis.slot_names,
            semantic_tokens: analysis.semantic_tokens,
            tokens,
            functions: analysis.functions,
            ast: Some(stmts),
            timings,
            token_count,
            node_count,
        }
    }

    /// Execute a compiled instruction vector on a fresh machine.
    ///
    /// Runtime errors terminate execution and come back as a single error
    /// diagnostic at position 0:0; the machine state up to the fault is
    /// still reported.
    pub fn run(&self, instructions: &[Instr]) -> RunResult {
        let start = Instant::now();
        let mut vm = Vm::new();
        let outcome = vm.run(instructions);
        let elapsed = elapsed_ms(start);

        let (final_variables, stdout) = vm.into_state();
        let diagnostics = match outcome {
            Ok(_) => Vec::new(),
            Err(err) => vec![Diagnostic::error(err.to_string(), Span::new(0, 0, 0))],
        };

        RunResult {
            elapsed_ms: elapsed,
            final_variables,
            stdout,
            diagnostics,
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
