//! Statement and expression analysis.
//!
//! Three phases drive the pass: function discovery, top-level statements,
//! then function bodies. Analysis mutates the AST in place: slots are
//! assigned to every variable-shaped node, call return types are resolved,
//! and checked expressions are constant-folded.

use crate::fold::fold_expr;
use crate::functions::{FuncKind, FuncSig, FunctionTable};
use crate::scope::ScopeStack;
use crate::tokens::{modifier, SemanticToken, TokenCategory};
use crate::types::{compatible, is_numeric, mutually_compatible, numeric_result};
use vextc_par::ast::*;
use vextc_util::{Handler, Span};

/// Result of the semantic pass, alongside the mutated AST.
pub struct Analysis {
    /// Slot index -> variable name, for diagnostics and final-state dumps.
    pub slot_names: Vec<String>,
    /// User functions in discovery order.
    pub functions: Vec<FuncSig>,
    /// Editor highlighting records.
    pub semantic_tokens: Vec<SemanticToken>,
}

/// The semantic analyzer.
pub struct Analyzer<'a> {
    handler: &'a Handler,
    table: &'a mut FunctionTable,
    scopes: ScopeStack,
    slot_names: Vec<String>,
    tokens: Vec<SemanticToken>,
    functions: Vec<FuncSig>,
    /// Declared return type of the function body under analysis; `None` at
    /// top level.
    current_ret: Option<Ty>,
}

impl<'a> Analyzer<'a> {
    pub fn new(table: &'a mut FunctionTable, handler: &'a Handler) -> Self {
        Self {
            handler,
            table,
            scopes: ScopeStack::new(),
            slot_names: Vec::new(),
            tokens: Vec::new(),
            functions: Vec::new(),
            current_ret: None,
        }
    }

    /// Run all three phases over the program.
    pub fn analyze(mut self, stmts: &mut [Stmt]) -> Analysis {
        self.discover_functions(stmts);
        self.analyze_block(stmts);
        self.analyze_function_bodies(stmts);

        Analysis {
            slot_names: self.slot_names,
            functions: self.functions,
            semantic_tokens: self.tokens,
        }
    }

    fn alloc_slot(&mut self, name: &str) -> u32 {
        let slot = self.slot_names.len() as u32;
        self.slot_names.push(name.to_string());
        slot
    }

    fn emit_token(&mut self, span: Span, category: TokenCategory, modifiers: u8) {
        if !span.is_dummy() {
            self.tokens.push(SemanticToken::new(span, category, modifiers));
        }
    }

    // =========================================================================
    // Phase A - function discovery
    // =========================================================================

    fn discover_functions(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            let Stmt::FuncDef(func) = stmt else { continue };

            let mut seen = Vec::new();
            for param in &func.params {
                if seen.contains(&&param.name) {
                    self.handler.error(
                        format!("duplicate parameter name '{}'", param.name),
                        param.span,
                    );
                }
                seen.push(&param.name);
            }

            let params: Vec<Ty> = func.params.iter().map(|p| p.ty).collect();
            if self.table.has_user_signature(&func.name, &params) {
                let dup = FuncSig {
                    name: func.name.clone(),
                    params: params.clone(),
                    ret: func.ret,
                    kind: FuncKind::User,
                };
                self.handler.error(
                    format!("function '{}' is already defined", dup.describe()),
                    func.name_span,
                );
                continue;
            }

            let sig = FuncSig {
                name: func.name.clone(),
                params,
                ret: func.ret,
                kind: FuncKind::User,
            };
            self.functions.push(sig.clone());
            self.table.register(sig);
        }
    }

    // =========================================================================
    // Phase C - function bodies
    // =========================================================================

    fn analyze_function_bodies(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts.iter_mut() {
            let Stmt::FuncDef(func) = stmt else { continue };

            self.emit_token(func.span, TokenCategory::Type, 0);
            self.emit_token(
                func.name_span,
                TokenCategory::Function,
                modifier::DECLARATION,
            );

            self.current_ret = Some(func.ret);
            self.scopes.push();

            for param in &mut func.params {
                let slot = self.alloc_slot(&param.name);
                param.slot = slot as i32;
                self.scopes.declare(param.name.clone(), slot, param.ty);
                self.scopes.mark_assigned(slot);
                self.emit_token(
                    param.span,
                    TokenCategory::Variable,
                    modifier::DECLARATION | modifier::PARAMETER,
                );
            }

            self.analyze_block(&mut func.body);
            self.scopes.pop();
            self.current_ret = None;

            if func.ret != Ty::Void && !block_exits(&func.body) {
                self.handler.error(
                    format!(
                        "function '{}' does not return a value on all paths",
                        func.name
                    ),
                    func.name_span,
                );
            }
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Analyze the statements of one block, warning about code after an
    /// always-exiting statement (which is still analyzed).
    fn analyze_block(&mut self, stmts: &mut [Stmt]) {
        let mut exited = false;
        for stmt in stmts.iter_mut() {
            if exited {
                self.handler.warning("unreachable code", stmt_span(stmt));
            }
            self.check_stmt(stmt);
            if !exited && always_exits(stmt) {
                exited = true;
            }
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => self.check_var_decl(decl),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Increment(inc) => self.check_increment(inc),
            Stmt::Expr(expr_stmt) => {
                self.check_and_fold(&mut expr_stmt.expr);
            }
            Stmt::If(if_stmt) => self.check_if(if_stmt),
            Stmt::While(while_stmt) => self.check_while(while_stmt),
            Stmt::For(for_stmt) => self.check_for(for_stmt),
            Stmt::Return(ret) => self.check_return(ret),
            // bodies are analyzed in their own phase; the parser has already
            // rejected nested definitions
            Stmt::FuncDef(_) => {}
        }
    }

    fn check_var_decl(&mut self, decl: &mut VarDeclStmt) {
        self.emit_token(decl.span, TokenCategory::Type, 0);
        self.emit_token(
            decl.name_span,
            TokenCategory::Variable,
            modifier::DECLARATION,
        );

        if decl.ty == Ty::Void {
            self.handler.error(
                format!("cannot declare variable '{}' of type 'void'", decl.name),
                decl.span,
            );
            decl.ty = Ty::Error;
        }

        let slot = self.alloc_slot(&decl.name);
        decl.slot = slot as i32;

        let init_ty = decl.init.as_mut().map(|init| self.check_and_fold(init));

        if decl.ty == Ty::Auto {
            match init_ty {
                Some(Ty::Error) | None => {
                    self.handler.error(
                        format!("cannot infer a type for '{}'", decl.name),
                        decl.name_span,
                    );
                    decl.ty = Ty::Error;
                }
                Some(inferred) => decl.ty = inferred,
            }
        } else if let (Some(init), Some(init_ty)) = (&decl.init, init_ty) {
            if !compatible(decl.ty, init_ty) {
                self.handler.error(
                    format!("cannot assign '{}' to '{}'", init_ty, decl.ty),
                    init.span(),
                );
            }
        }

        if !self.scopes.declare(decl.name.clone(), slot, decl.ty) {
            self.handler.error(
                format!("variable '{}' is already declared in this scope", decl.name),
                decl.name_span,
            );
        }
        if decl.init.is_some() {
            self.scopes.mark_assigned(slot);
        }
    }

    fn check_assign(&mut self, assign: &mut AssignStmt) {
        self.emit_token(assign.span, TokenCategory::Variable, 0);

        let Some(binding) = self.scopes.resolve(&assign.name) else {
            self.handler.error(
                format!(
                    "unknown variable '{}' (used before declaration?)",
                    assign.name
                ),
                assign.span,
            );
            self.check_and_fold(&mut assign.value);
            return;
        };
        assign.slot = binding.slot as i32;

        let value_ty = self.check_and_fold(&mut assign.value);
        if !compatible(binding.ty, value_ty) {
            self.handler.error(
                format!("cannot assign '{}' to '{}'", value_ty, binding.ty),
                assign.value.span(),
            );
        }
        self.scopes.mark_assigned(binding.slot);
    }

    fn check_increment(&mut self, inc: &mut IncrementStmt) {
        self.emit_token(inc.span, TokenCategory::Variable, 0);

        let op = if inc.is_increment { "++" } else { "--" };
        let Some(binding) = self.scopes.resolve(&inc.name) else {
            self.handler.error(
                format!("unknown variable '{}' (used before declaration?)", inc.name),
                inc.span,
            );
            return;
        };
        inc.slot = binding.slot as i32;

        if !is_numeric(binding.ty) && binding.ty != Ty::Error {
            self.handler.error(
                format!(
                    "operator '{}' requires an 'int' or 'float' variable, found '{}'",
                    op, binding.ty
                ),
                inc.span,
            );
        }
        if !self.scopes.is_assigned(binding.slot) {
            self.handler.warning(
                format!("variable '{}' may be unassigned", inc.name),
                inc.span,
            );
        }
        self.scopes.mark_assigned(binding.slot);
    }

    fn check_if(&mut self, if_stmt: &mut IfStmt) {
        self.emit_token(if_stmt.span, TokenCategory::Keyword, modifier::CONTROL);
        self.check_condition(&mut if_stmt.cond);

        let pre = self.scopes.snapshot_assigned();

        self.scopes.push();
        self.analyze_block(&mut if_stmt.body);
        let mut post = self.scopes.pop();

        if let Some(else_body) = &mut if_stmt.else_body {
            self.scopes.push();
            self.analyze_block(else_body);
            let after_else = self.scopes.pop();
            post.intersect_with(&after_else);
        } else {
            post.intersect_with(&pre);
        }

        self.scopes.set_assigned(post);
    }

    fn check_while(&mut self, while_stmt: &mut WhileStmt) {
        self.emit_token(while_stmt.span, TokenCategory::Keyword, modifier::CONTROL);
        self.check_condition(&mut while_stmt.cond);

        // the loop may run zero times: join is pre OR post-body
        let mut post = self.scopes.snapshot_assigned();
        self.scopes.push();
        self.analyze_block(&mut while_stmt.body);
        let after_body = self.scopes.pop();
        post.union_with(&after_body);
        self.scopes.set_assigned(post);
    }

    fn check_for(&mut self, for_stmt: &mut ForStmt) {
        self.emit_token(for_stmt.span, TokenCategory::Keyword, modifier::CONTROL);

        // one frame covers the initializer declaration, condition, step and
        // body; the initializer runs exactly once so its assignments are
        // definite after the loop
        self.scopes.push();

        if let Some(init) = &mut for_stmt.init {
            self.check_for_clause(init, "initializer");
        }
        if let Some(cond) = &mut for_stmt.cond {
            self.check_condition(cond);
        }
        if let Some(step) = &mut for_stmt.step {
            self.check_for_clause(step, "increment");
        }

        let mut post = self.scopes.snapshot_assigned();
        self.scopes.push();
        self.analyze_block(&mut for_stmt.body);
        let after_body = self.scopes.pop();
        post.union_with(&after_body);
        self.scopes.set_assigned(post);

        let after_for = self.scopes.pop();
        self.scopes.set_assigned(after_for);
    }

    /// A `for` clause is a declaration, assignment, increment, or a bare
    /// numeric expression.
    fn check_for_clause(&mut self, clause: &mut Stmt, what: &str) {
        match clause {
            Stmt::Expr(expr_stmt) => {
                let ty = self.check_and_fold(&mut expr_stmt.expr);
                if !is_numeric(ty) && ty != Ty::Error {
                    self.handler.error(
                        format!("for {} must be numeric, found '{}'", what, ty),
                        expr_stmt.expr.span(),
                    );
                }
            }
            other => self.check_stmt(other),
        }
    }

    fn check_return(&mut self, ret: &mut ReturnStmt) {
        self.emit_token(ret.span, TokenCategory::Keyword, modifier::CONTROL);

        let value_ty = ret.value.as_mut().map(|value| self.check_and_fold(value));

        // a top-level return ends the program and is not type-checked
        let Some(expected) = self.current_ret else {
            return;
        };

        match (expected, value_ty) {
            (Ty::Void, Some(_)) => {
                self.handler
                    .error("void function cannot return a value", ret.span);
            }
            (Ty::Void, None) => {}
            (_, None) => {
                self.handler.error(
                    format!(
                        "cannot return without a value from a function returning '{}'",
                        expected
                    ),
                    ret.span,
                );
            }
            (_, Some(actual)) => {
                if !compatible(expected, actual) {
                    self.handler.error(
                        format!(
                            "cannot return '{}' from a function returning '{}'",
                            actual, expected
                        ),
                        ret.value.as_ref().map(|v| v.span()).unwrap_or(ret.span),
                    );
                }
            }
        }
    }

    fn check_condition(&mut self, cond: &mut Expr) {
        let ty = self.check_and_fold(cond);
        if ty != Ty::Bool && ty != Ty::Error {
            self.handler.error(
                format!("condition must be 'bool', found '{}'", ty),
                cond.span(),
            );
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Type-check, then constant-fold.
    fn check_and_fold(&mut self, expr: &mut Expr) -> Ty {
        let ty = self.check_expr(expr);
        fold_expr(expr, self.handler);
        ty
    }

    fn check_expr(&mut self, expr: &mut Expr) -> Ty {
        match expr {
            Expr::Literal(lit) => {
                let (category, ty) = match &lit.value {
                    LitValue::Int(_) => (TokenCategory::Number, Ty::Int),
                    LitValue::Float(_) => (TokenCategory::Number, Ty::Float),
                    LitValue::Bool(_) => (TokenCategory::Boolean, Ty::Bool),
                    LitValue::Str(_) => (TokenCategory::String, Ty::Str),
                    LitValue::Null => return Ty::Error,
                };
                self.emit_token(lit.span, category, 0);
                ty
            }
            Expr::Variable(var) => self.check_variable(var),
            Expr::Unary(unary) => self.check_unary(unary),
            Expr::Binary(binary) => self.check_binary(binary),
            Expr::Call(call) => self.check_call(call),
            Expr::ModuleCall(call) => self.check_module_call(call),
        }
    }

    fn check_variable(&mut self, var: &mut VariableExpr) -> Ty {
        let Some(binding) = self.scopes.resolve(&var.name) else {
            self.handler
                .error(format!("unknown variable '{}'", var.name), var.span);
            return Ty::Error;
        };
        var.slot = binding.slot as i32;
        self.emit_token(var.span, TokenCategory::Variable, 0);

        if !self.scopes.is_assigned(binding.slot) {
            self.handler.warning(
                format!("variable '{}' may be unassigned", var.name),
                var.span,
            );
        }
        binding.ty
    }

    fn check_unary(&mut self, unary: &mut UnaryExpr) -> Ty {
        let operand_ty = self.check_expr(&mut unary.operand);
        if operand_ty == Ty::Error {
            return Ty::Error;
        }

        match unary.op {
            UnOp::Neg => {
                if !is_numeric(operand_ty) {
                    self.handler.error(
                        format!("operator '-' requires a numeric operand, found '{}'", operand_ty),
                        unary.span,
                    );
                    return Ty::Error;
                }
                operand_ty
            }
            UnOp::Not => {
                if operand_ty != Ty::Bool {
                    self.handler.error(
                        format!("operator '!' requires a 'bool' operand, found '{}'", operand_ty),
                        unary.span,
                    );
                    return Ty::Error;
                }
                Ty::Bool
            }
            UnOp::Inc | UnOp::Dec => {
                let op = if unary.op == UnOp::Inc { "++" } else { "--" };
                if !is_numeric(operand_ty) {
                    self.handler.error(
                        format!(
                            "operator '{}' requires an 'int' or 'float' variable, found '{}'",
                            op, operand_ty
                        ),
                        unary.span,
                    );
                    return Ty::Error;
                }
                // a postfix increment writes its variable
                if let Expr::Variable(var) = unary.operand.as_ref() {
                    if var.slot >= 0 {
                        self.scopes.mark_assigned(var.slot as u32);
                    }
                }
                operand_ty
            }
        }
    }

    fn check_binary(&mut self, binary: &mut BinaryExpr) -> Ty {
        let left = self.check_expr(&mut binary.left);
        let right = self.check_expr(&mut binary.right);
        if left == Ty::Error || right == Ty::Error {
            return Ty::Error;
        }

        match binary.op {
            BinOp::Add => {
                if left == Ty::Str || right == Ty::Str {
                    let other = if left == Ty::Str { right } else { left };
                    if matches!(other, Ty::Str | Ty::Int | Ty::Float | Ty::Bool) {
                        Ty::Str
                    } else {
                        self.operand_error(binary, left, right)
                    }
                } else if is_numeric(left) && is_numeric(right) {
                    numeric_result(left, right)
                } else {
                    self.operand_error(binary, left, right)
                }
            }
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow => {
                if is_numeric(left) && is_numeric(right) {
                    numeric_result(left, right)
                } else {
                    self.operand_error(binary, left, right)
                }
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                if mutually_compatible(left, right) {
                    Ty::Bool
                } else {
                    self.handler.error(
                        format!("cannot compare '{}' and '{}'", left, right),
                        binary.span,
                    );
                    Ty::Error
                }
            }
            BinOp::And | BinOp::Or => {
                if left == Ty::Bool && right == Ty::Bool {
                    Ty::Bool
                } else {
                    self.handler.error(
                        format!(
                            "operator '{}' requires 'bool' operands, found '{}' and '{}'",
                            binary.op, left, right
                        ),
                        binary.span,
                    );
                    Ty::Error
                }
            }
        }
    }

    fn operand_error(&mut self, binary: &BinaryExpr, left: Ty, right: Ty) -> Ty {
        self.handler.error(
            format!(
                "operator '{}' cannot be applied to '{}' and '{}'",
                binary.op, left, right
            ),
            binary.span,
        );
        Ty::Error
    }

    fn check_call(&mut self, call: &mut CallExpr) -> Ty {
        let arg_tys: Vec<Ty> = call
            .args
            .iter_mut()
            .map(|arg| self.check_expr(arg))
            .collect();

        self.emit_token(call.span, TokenCategory::Function, modifier::CALL);
        self.resolve_call(&call.name, &arg_tys, call.span, &mut call.ret)
    }

    fn check_module_call(&mut self, call: &mut ModuleCallExpr) -> Ty {
        let arg_tys: Vec<Ty> = call
            .args
            .iter_mut()
            .map(|arg| self.check_expr(arg))
            .collect();

        self.emit_token(
            call.span,
            TokenCategory::Function,
            modifier::CALL | modifier::STATIC,
        );
        let name = call.qualified_name();
        self.resolve_call(&name, &arg_tys, call.span, &mut call.ret)
    }

    fn resolve_call(&mut self, name: &str, args: &[Ty], span: Span, ret: &mut Ty) -> Ty {
        match self.table.resolve(name, args) {
            Some(sig) => {
                *ret = sig.ret;
                sig.ret
            }
            None => {
                if self.table.contains(name) {
                    let arg_names: Vec<&str> = args.iter().map(|t| t.name()).collect();
                    self.handler.error(
                        format!(
                            "no matching overload for '{}({})'",
                            name,
                            arg_names.join(", ")
                        ),
                        span,
                    );
                } else {
                    self.handler
                        .error(format!("unknown function '{}'", name), span);
                }
                *ret = Ty::Error;
                Ty::Error
            }
        }
    }
}

// =============================================================================
// Reachability
// =============================================================================

/// A statement after which control never continues in the same block.
pub fn always_exits(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::If(if_stmt) => if_stmt
            .else_body
            .as_ref()
            .is_some_and(|else_body| block_exits(&if_stmt.body) && block_exits(else_body)),
        Stmt::While(while_stmt) => {
            is_literal_true(&while_stmt.cond) && block_exits(&while_stmt.body)
        }
        Stmt::For(for_stmt) => {
            for_stmt.cond.as_ref().map_or(true, is_literal_true) && block_exits(&for_stmt.body)
        }
        _ => false,
    }
}

/// Does some statement of the block always exit? This is also the
/// return-path check for non-void functions.
pub fn block_exits(stmts: &[Stmt]) -> bool {
    stmts.iter().any(always_exits)
}

fn is_literal_true(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Literal(LiteralExpr {
            value: LitValue::Bool(true),
            ..
        })
    )
}

/// Span of a statement's introducing token, for diagnostics.
pub fn stmt_span(stmt: &Stmt) -> Span {
    match stmt {
        Stmt::VarDecl(s) => s.span,
        Stmt::Assign(s) => s.span,
        Stmt::Increment(s) => s.span,
        Stmt::Expr(s) => s.expr.span(),
        Stmt::If(s) => s.span,
        Stmt::While(s) => s.span,
        Stmt::For(s) => s.span,
        Stmt::Return(s) => s.span,
        Stmt::FuncDef(s) => s.span,
    }
}
