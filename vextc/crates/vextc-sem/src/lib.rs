//! vextc-sem - Semantic analyzer.
//!
//! Three phases over the parsed statement list:
//!
//! 1. **Function discovery** - collect top-level function definitions into
//!    the overloaded function table, checking signature uniqueness.
//! 2. **Top-level analysis** - analyze every non-definition statement in
//!    source order in the global scope.
//! 3. **Function bodies** - analyze each function in a fresh scope with its
//!    parameters bound, then verify the return path.
//!
//! Analysis assigns a unique program-wide slot to every declared variable
//! and parameter, resolves call return types, tracks definite assignment,
//! constant-folds checked expressions, and emits semantic highlighting
//! tokens. All problems flow into the shared [`Handler`].

mod analysis;
pub mod fold;
pub mod functions;
pub mod scope;
pub mod tokens;
pub mod types;

pub use analysis::{always_exits, block_exits, stmt_span, Analysis, Analyzer};
pub use functions::{FuncKind, FuncSig, FunctionTable};
pub use scope::{ScopeStack, SlotSet, VarBinding};
pub use tokens::{modifier, SemanticToken, TokenCategory};

use vextc_par::Stmt;
use vextc_util::Handler;

/// Run the semantic pass over `stmts`, mutating the tree in place.
///
/// `table` must already hold the built-ins (see
/// [`FunctionTable::with_builtins`]); user functions are added during
/// discovery.
///
/// # Example
///
/// ```
/// use vextc_lex::tokenize;
/// use vextc_par::parse;
/// use vextc_sem::{analyze, FunctionTable};
/// use vextc_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = tokenize("int x = 1 + 2;", &handler);
/// let mut stmts = parse(tokens, &handler);
/// let mut table = FunctionTable::with_builtins();
/// let analysis = analyze(&mut stmts, &mut table, &handler);
/// assert!(!handler.has_errors());
/// assert_eq!(analysis.slot_names, vec!["x"]);
/// ```
pub fn analyze(stmts: &mut [Stmt], table: &mut FunctionTable, handler: &Handler) -> Analysis {
    Analyzer::new(table, handler).analyze(stmts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vextc_lex::tokenize;
    use vextc_par::ast::*;
    use vextc_par::parse;

    fn analyze_source(source: &str) -> (Vec<Stmt>, Analysis, Handler) {
        let handler = Handler::new();
        let tokens = tokenize(source, &handler);
        let mut stmts = parse(tokens, &handler);
        let mut table = FunctionTable::with_builtins();
        let analysis = analyze(&mut stmts, &mut table, &handler);
        (stmts, analysis, handler)
    }

    fn assert_clean(source: &str) -> (Vec<Stmt>, Analysis) {
        let (stmts, analysis, handler) = analyze_source(source);
        assert!(
            !handler.has_errors() && handler.warning_count() == 0,
            "expected clean analysis, got {:?}",
            handler.diagnostics()
        );
        (stmts, analysis)
    }

    fn error_messages(handler: &Handler) -> Vec<String> {
        handler
            .diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    // =========================================================================
    // Slots and scoping
    // =========================================================================

    #[test]
    fn test_slots_are_unique_and_named() {
        let (stmts, analysis) = assert_clean("int a = 1; int b = 2; float c = 3.0;");
        assert_eq!(analysis.slot_names, vec!["a", "b", "c"]);
        for (i, stmt) in stmts.iter().enumerate() {
            let Stmt::VarDecl(decl) = stmt else { panic!() };
            assert_eq!(decl.slot, i as i32);
        }
    }

    #[test]
    fn test_variable_reference_gets_slot() {
        let (stmts, _) = assert_clean("int a = 1; int b = a;");
        let Stmt::VarDecl(decl) = &stmts[1] else { panic!() };
        let Some(Expr::Variable(var)) = decl.init.as_ref() else {
            panic!("expected variable initializer");
        };
        assert_eq!(var.slot, 0);
    }

    #[test]
    fn test_shadowing_gets_fresh_slot() {
        let (stmts, analysis) = assert_clean("int x = 1; if (x > 0) { int x = 2; }");
        assert_eq!(analysis.slot_names, vec!["x", "x"]);
        let Stmt::If(if_stmt) = &stmts[1] else { panic!() };
        let Stmt::VarDecl(inner) = &if_stmt.body[0] else { panic!() };
        assert_eq!(inner.slot, 1);
    }

    #[test]
    fn test_duplicate_declaration_in_scope() {
        let (_, _, handler) = analyze_source("int x = 1; int x = 2;");
        assert!(handler.has_errors());
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("already declared")));
    }

    #[test]
    fn test_unknown_variable() {
        let (_, _, handler) = analyze_source("int x = y;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("unknown variable 'y'")));
    }

    #[test]
    fn test_assign_before_declaration() {
        let (_, _, handler) = analyze_source("x = 1;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("unknown variable 'x'")));
    }

    // =========================================================================
    // Typing
    // =========================================================================

    #[test]
    fn test_auto_inference() {
        let (stmts, _) = assert_clean("auto s = \"hi\"; auto n = 1; auto f = 1.5;");
        let tys: Vec<Ty> = stmts
            .iter()
            .map(|s| match s {
                Stmt::VarDecl(d) => d.ty,
                _ => panic!(),
            })
            .collect();
        assert_eq!(tys, vec![Ty::Str, Ty::Int, Ty::Float]);
    }

    #[test]
    fn test_auto_without_initializer() {
        let (_, _, handler) = analyze_source("auto x;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("cannot infer")));
    }

    #[test]
    fn test_void_variable_rejected() {
        let (_, _, handler) = analyze_source("void x;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("type 'void'")));
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let (_, _, handler) = analyze_source("int x = 1; x = \"no\";");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("cannot assign 'string' to 'int'")));
    }

    #[test]
    fn test_float_accepts_int() {
        assert_clean("float f = 3;");
    }

    #[test]
    fn test_int_rejects_float() {
        let (_, _, handler) = analyze_source("int i = 3.5;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("cannot assign 'float' to 'int'")));
    }

    #[test]
    fn test_string_target_strict() {
        let (_, _, handler) = analyze_source("string s = 1;");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_string_concat_types() {
        assert_clean("int n = 5; string s = \"n=\" + n; string t = s + true;");
    }

    #[test]
    fn test_condition_must_be_bool() {
        let (_, _, handler) = analyze_source("if (1) { print(1); }");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("condition must be 'bool'")));
    }

    #[test]
    fn test_logical_requires_bool() {
        let (_, _, handler) = analyze_source("bool b = 1 && true;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("requires 'bool' operands")));
    }

    #[test]
    fn test_comparison_mismatch() {
        let (_, _, handler) = analyze_source("bool b = \"a\" < 1;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("cannot compare 'string' and 'int'")));
    }

    #[test]
    fn test_increment_requires_numeric() {
        let (_, _, handler) = analyze_source("bool b = true; b++;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("'++' requires")));
    }

    #[test]
    fn test_error_does_not_cascade() {
        let (_, _, handler) = analyze_source("int x = y; int z = x + 1;");
        // one unknown-variable error; the use of x must not add more
        assert_eq!(handler.error_count(), 1);
    }

    // =========================================================================
    // Definite assignment
    // =========================================================================

    #[test]
    fn test_unassigned_use_warns() {
        let (_, _, handler) = analyze_source("int x; int y = x;");
        assert!(!handler.has_errors());
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("may be unassigned")));
    }

    #[test]
    fn test_branch_join_intersection() {
        // assigned in both branches: definite
        assert_clean(
            "int x; bool c = true; if (c) { x = 1; } else { x = 2; } int y = x;",
        );
    }

    #[test]
    fn test_single_branch_not_definite() {
        let (_, _, handler) =
            analyze_source("int x; bool c = true; if (c) { x = 1; } int y = x;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("may be unassigned")));
    }

    #[test]
    fn test_loop_body_assignment_counts() {
        // the loop join is union with the pre-loop state
        assert_clean("int x; bool c = true; while (c) { x = 1; c = false; } int y = x;");
    }

    #[test]
    fn test_parameters_are_assigned() {
        assert_clean("int twice(int n) { return n + n; }");
    }

    // =========================================================================
    // Functions and overloads
    // =========================================================================

    #[test]
    fn test_function_discovery() {
        let (_, analysis) = assert_clean("int sq(int n) { return n * n; } int r = sq(4);");
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.functions[0].name, "sq");
        assert_eq!(analysis.functions[0].params, vec![Ty::Int]);
    }

    #[test]
    fn test_call_resolves_return_type() {
        let (stmts, _) = assert_clean("int sq(int n) { return n * n; } int r = sq(4);");
        let Stmt::VarDecl(decl) = &stmts[1] else { panic!() };
        let Some(Expr::Call(call)) = decl.init.as_ref() else { panic!() };
        assert_eq!(call.ret, Ty::Int);
    }

    #[test]
    fn test_duplicate_signature_rejected() {
        let (_, _, handler) =
            analyze_source("int f(int a) { return a; } int f(int b) { return b; }");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("already defined")));
    }

    #[test]
    fn test_overloading_by_type_allowed() {
        let (_, analysis) = assert_clean(
            "int f(int a) { return a; } float f(float a) { return a; } int r = f(1);",
        );
        assert_eq!(analysis.functions.len(), 2);
    }

    #[test]
    fn test_duplicate_parameter_names() {
        let (_, _, handler) = analyze_source("int f(int a, int a) { return a; }");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("duplicate parameter")));
    }

    #[test]
    fn test_no_matching_overload() {
        let (_, _, handler) = analyze_source("int r = len(5);");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("no matching overload")));
    }

    #[test]
    fn test_unknown_function() {
        let (_, _, handler) = analyze_source("nothing();");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("unknown function 'nothing'")));
    }

    #[test]
    fn test_module_call() {
        assert_clean("float r = Math.sqrt(2);");
    }

    #[test]
    fn test_unknown_module_function() {
        let (_, _, handler) = analyze_source("float r = Math.cbrt(2);");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("unknown function 'Math.cbrt'")));
    }

    #[test]
    fn test_void_call_result_unusable() {
        let (_, _, handler) = analyze_source("int x = print(1);");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("cannot assign 'void' to 'int'")));
    }

    #[test]
    fn test_globals_visible_in_function() {
        assert_clean("int g = 10; int read() { return g; }");
    }

    // =========================================================================
    // Return paths and reachability
    // =========================================================================

    #[test]
    fn test_missing_return_on_some_path() {
        let (_, _, handler) = analyze_source("int f(int x) { if (x > 0) { return x; } }");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("'f'") && m.contains("all paths")));
    }

    #[test]
    fn test_if_else_return_satisfies() {
        assert_clean("int f(int x) { if (x > 0) { return x; } else { return -x; } }");
    }

    #[test]
    fn test_literal_true_loop_return_satisfies() {
        assert_clean("int f() { while (true) { return 1; } }");
    }

    #[test]
    fn test_folded_condition_counts_as_literal_true() {
        assert_clean("int f() { while (1 < 2) { return 1; } }");
    }

    #[test]
    fn test_void_function_needs_no_return() {
        assert_clean("void hello() { print(\"hi\"); }");
    }

    #[test]
    fn test_void_function_cannot_return_value() {
        let (_, _, handler) = analyze_source("void f() { return 1; }");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("void function cannot return a value")));
    }

    #[test]
    fn test_bare_return_in_valued_function() {
        let (_, _, handler) = analyze_source("int f() { return; }");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("without a value")));
    }

    #[test]
    fn test_unreachable_code_warns() {
        let (_, _, handler) = analyze_source("int f() { return 1; int x = 2; }");
        assert!(!handler.has_errors());
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("unreachable code")));
    }

    #[test]
    fn test_return_type_mismatch() {
        let (_, _, handler) = analyze_source("int f() { return \"no\"; }");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("cannot return 'string'")));
    }

    // =========================================================================
    // Folding through the full pass
    // =========================================================================

    #[test]
    fn test_initializer_is_folded() {
        let (stmts, _) = assert_clean("int x = 2 + 3 * 4;");
        let Stmt::VarDecl(decl) = &stmts[0] else { panic!() };
        assert!(matches!(
            decl.init.as_ref(),
            Some(Expr::Literal(LiteralExpr {
                value: LitValue::Int(14),
                ..
            }))
        ));
    }

    #[test]
    fn test_short_circuit_suppresses_division_by_zero() {
        let (stmts, _, handler) = analyze_source("bool z = (1 < 2) || (1 / 0 == 0);");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        let Stmt::VarDecl(decl) = &stmts[0] else { panic!() };
        assert!(matches!(
            decl.init.as_ref(),
            Some(Expr::Literal(LiteralExpr {
                value: LitValue::Bool(true),
                ..
            }))
        ));
    }

    #[test]
    fn test_literal_division_by_zero_reported() {
        let (_, _, handler) = analyze_source("int x = 1 / 0;");
        assert!(error_messages(&handler)
            .iter()
            .any(|m| m.contains("division by zero")));
    }

    // =========================================================================
    // Semantic tokens
    // =========================================================================

    #[test]
    fn test_semantic_tokens_emitted() {
        let (_, analysis) = assert_clean("int x = 1;");
        let categories: Vec<TokenCategory> =
            analysis.semantic_tokens.iter().map(|t| t.category).collect();
        assert!(categories.contains(&TokenCategory::Type));
        assert!(categories.contains(&TokenCategory::Variable));
        assert!(categories.contains(&TokenCategory::Number));
    }

    #[test]
    fn test_declaration_modifier() {
        let (_, analysis) = assert_clean("int x = 1;");
        let decl_token = analysis
            .semantic_tokens
            .iter()
            .find(|t| t.category == TokenCategory::Variable)
            .unwrap();
        assert!(decl_token.has_modifier(modifier::DECLARATION));
    }

    #[test]
    fn test_parameter_modifier() {
        let (_, analysis) = assert_clean("int id(int n) { return n; }");
        assert!(analysis
            .semantic_tokens
            .iter()
            .any(|t| t.has_modifier(modifier::PARAMETER)));
    }

    #[test]
    fn test_module_call_token_is_static() {
        let (_, analysis) = assert_clean("float r = Math.sqrt(2);");
        let call_token = analysis
            .semantic_tokens
            .iter()
            .find(|t| t.category == TokenCategory::Function)
            .unwrap();
        assert!(call_token.has_modifier(modifier::CALL));
        assert!(call_token.has_modifier(modifier::STATIC));
    }
}
