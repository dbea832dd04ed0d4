//! Bytecode emitter.
//!
//! Lowers the analyzed statement list to a flat instruction vector.
//! Forward jumps are emitted with a placeholder target and patched once
//! the destination index is known; `&&`/`||` lower to conditional jumps;
//! `while`/`for` headers whose condition has the shape
//! `variable <cmp> literal` collapse into the `JmpIfVarOpConst`
//! specialization.

use crate::instr::{CmpOp, Instr, Op, UserFunction};
use crate::value::Value;
use vextc_par::ast::*;
use vextc_util::Span;

/// Unpatched jump target. Never `-1`: every placeholder is patched before
/// `emit` returns, which the debug assertion at the end verifies.
const PLACEHOLDER: usize = usize::MAX;

/// Emit bytecode for an analyzed program.
///
/// The statement list must have passed semantic analysis with no errors:
/// every slot is assigned and every call return type resolved.
pub fn emit(stmts: &[Stmt]) -> Vec<Instr> {
    let mut emitter = Emitter::new();
    emitter.emit_stmts(stmts);
    debug_assert!(
        validate_jumps(&emitter.code),
        "emitter left an unpatched or out-of-range jump"
    );
    emitter.code
}

/// Every jump argument points into `[0, code.len()]` and no placeholder
/// survived emission. A target equal to the length is the loop-exit jump
/// of a loop that ends the program; the machine halts there. Nested
/// function bodies are checked recursively.
pub fn validate_jumps(code: &[Instr]) -> bool {
    code.iter().all(|instr| {
        if let Op::DefFunc(func) = &instr.op {
            return validate_jumps(&func.body);
        }
        match instr.op.jump_target() {
            Some(target) => target != PLACEHOLDER && target <= code.len(),
            None => true,
        }
    })
}

struct Emitter {
    code: Vec<Instr>,
}

impl Emitter {
    fn new() -> Self {
        Self { code: Vec::new() }
    }

    /// Append an instruction, returning its index.
    fn push(&mut self, op: Op, span: Span) -> usize {
        let index = self.code.len();
        self.code.push(Instr::new(op, span));
        index
    }

    /// The index the next instruction will occupy.
    fn here(&self) -> usize {
        self.code.len()
    }

    /// Point the placeholder jump at `at` to the current position.
    fn patch(&mut self, at: usize) {
        let target = self.here();
        match &mut self.code[at].op {
            Op::Jmp(t) | Op::JmpIfFalse(t) | Op::JmpIfTrue(t) => {
                debug_assert_eq!(*t, PLACEHOLDER, "jump patched twice");
                *t = target;
            }
            Op::JmpIfVarOpConst { target: t, .. } => {
                debug_assert_eq!(*t, PLACEHOLDER, "jump patched twice");
                *t = target;
            }
            other => unreachable!("patching a non-jump instruction {:?}", other),
        }
    }

    fn emit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.emit_stmt(stmt);
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => {
                if let Some(init) = &decl.init {
                    self.emit_expr(init);
                    self.push(Op::StoreVar(decl.slot as u32), decl.name_span);
                }
            }
            Stmt::Assign(assign) => {
                let slot = assign.slot as u32;
                match assign.op.binary_op() {
                    None => {
                        self.emit_expr(&assign.value);
                        self.push(Op::StoreVar(slot), assign.span);
                    }
                    Some(op) => {
                        self.push(Op::LoadVar(slot), assign.span);
                        self.emit_expr(&assign.value);
                        self.push(binary_opcode(op), assign.span);
                        self.push(Op::StoreVar(slot), assign.span);
                    }
                }
            }
            Stmt::Increment(inc) => {
                let slot = inc.slot as u32;
                let op = if inc.is_increment {
                    Op::IncVar(slot)
                } else {
                    Op::DecVar(slot)
                };
                self.push(op, inc.span);
            }
            Stmt::Expr(expr_stmt) => self.emit_expr_stmt(&expr_stmt.expr),
            Stmt::If(if_stmt) => self.emit_if(if_stmt),
            Stmt::While(while_stmt) => self.emit_while(while_stmt),
            Stmt::For(for_stmt) => self.emit_for(for_stmt),
            Stmt::Return(ret) => {
                match &ret.value {
                    Some(value) => self.emit_expr(value),
                    None => {
                        self.push(Op::LoadConst(Value::Null), ret.span);
                    }
                }
                self.push(Op::Ret, ret.span);
            }
            Stmt::FuncDef(func) => self.emit_func_def(func),
        }
    }

    /// An expression statement: void calls lower to `CALL_VOID`; anything
    /// that leaves a value is balanced with `POP`. Postfix `++`/`--`
    /// produce no value and need no balancing.
    fn emit_expr_stmt(&mut self, expr: &Expr) {
        match expr {
            Expr::Call(call) if call.ret == Ty::Void => {
                for arg in &call.args {
                    self.emit_expr(arg);
                }
                self.push(
                    Op::CallVoid {
                        name: call.name.clone(),
                        argc: call.args.len() as u8,
                    },
                    call.span,
                );
            }
            Expr::ModuleCall(call) if call.ret == Ty::Void => {
                for arg in &call.args {
                    self.emit_expr(arg);
                }
                self.push(
                    Op::CallVoid {
                        name: call.qualified_name(),
                        argc: call.args.len() as u8,
                    },
                    call.span,
                );
            }
            Expr::Unary(unary) if matches!(unary.op, UnOp::Inc | UnOp::Dec) => {
                self.emit_expr(expr);
            }
            _ => {
                self.emit_expr(expr);
                self.push(Op::Pop, expr.span());
            }
        }
    }

    fn emit_if(&mut self, if_stmt: &IfStmt) {
        self.emit_expr(&if_stmt.cond);
        let exit_then = self.push(Op::JmpIfFalse(PLACEHOLDER), if_stmt.cond.span());
        self.emit_stmts(&if_stmt.body);

        match &if_stmt.else_body {
            Some(else_body) => {
                let skip_else = self.push(Op::Jmp(PLACEHOLDER), if_stmt.span);
                self.patch(exit_then);
                self.emit_stmts(else_body);
                self.patch(skip_else);
            }
            None => self.patch(exit_then),
        }
    }

    fn emit_while(&mut self, while_stmt: &WhileStmt) {
        let loop_start = self.here();
        let exit = self.emit_loop_header(Some(&while_stmt.cond));
        self.emit_stmts(&while_stmt.body);
        self.push(Op::Jmp(loop_start), while_stmt.span);
        if let Some(exit) = exit {
            self.patch(exit);
        }
    }

    fn emit_for(&mut self, for_stmt: &ForStmt) {
        if let Some(init) = &for_stmt.init {
            self.emit_stmt(init);
        }

        let loop_start = self.here();
        let exit = self.emit_loop_header(for_stmt.cond.as_ref());
        self.emit_stmts(&for_stmt.body);
        if let Some(step) = &for_stmt.step {
            self.emit_stmt(step);
        }
        self.push(Op::Jmp(loop_start), for_stmt.span);
        if let Some(exit) = exit {
            self.patch(exit);
        }
    }

    /// Emit the loop-exit test. The fast pattern `variable <cmp> literal`
    /// collapses into a single `JmpIfVarOpConst`; anything else emits the
    /// condition followed by `JmpIfFalse`. Returns the placeholder index
    /// to patch, or `None` for a condition-less (infinite) loop.
    fn emit_loop_header(&mut self, cond: Option<&Expr>) -> Option<usize> {
        let cond = cond?;

        if let Some((slot, cmp, limit)) = fast_loop_pattern(cond) {
            return Some(self.push(
                Op::JmpIfVarOpConst {
                    slot,
                    cmp,
                    limit,
                    target: PLACEHOLDER,
                },
                cond.span(),
            ));
        }

        self.emit_expr(cond);
        Some(self.push(Op::JmpIfFalse(PLACEHOLDER), cond.span()))
    }

    fn emit_func_def(&mut self, func: &FuncDefStmt) {
        let mut inner = Emitter::new();

        // the caller pushed arguments left-to-right; pop them into their
        // slots in reverse
        for param in func.params.iter().rev() {
            inner.push(Op::StoreVar(param.slot as u32), param.span);
        }
        inner.emit_stmts(&func.body);

        if !matches!(inner.code.last().map(|i| &i.op), Some(Op::Ret)) {
            inner.push(Op::LoadConst(Value::Null), Span::DUMMY);
            inner.push(Op::Ret, Span::DUMMY);
        }

        self.push(
            Op::DefFunc(UserFunction {
                name: func.name.clone(),
                param_slots: func.params.iter().map(|p| p.slot as u32).collect(),
                body: inner.code,
            }),
            func.span,
        );
    }

    fn emit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(lit) => {
                self.push(Op::LoadConst(Value::from_literal(&lit.value)), lit.span);
            }
            Expr::Variable(var) => {
                self.push(Op::LoadVar(var.slot as u32), var.span);
            }
            Expr::Unary(unary) => self.emit_unary(unary),
            Expr::Binary(binary) => self.emit_binary(binary),
            Expr::Call(call) => {
                for arg in &call.args {
                    self.emit_expr(arg);
                }
                self.push(
                    Op::Call {
                        name: call.name.clone(),
                        argc: call.args.len() as u8,
                    },
                    call.span,
                );
            }
            Expr::ModuleCall(call) => {
                for arg in &call.args {
                    self.emit_expr(arg);
                }
                self.push(
                    Op::Call {
                        name: call.qualified_name(),
                        argc: call.args.len() as u8,
                    },
                    call.span,
                );
            }
        }
    }

    fn emit_unary(&mut self, unary: &UnaryExpr) {
        match unary.op {
            UnOp::Neg => {
                self.emit_expr(&unary.operand);
                self.push(Op::LoadConst(Value::Number(-1.0)), unary.span);
                self.push(Op::Mul, unary.span);
            }
            UnOp::Not => {
                self.emit_expr(&unary.operand);
                self.push(Op::Not, unary.span);
            }
            // postfix increment mutates in place and pushes nothing
            UnOp::Inc | UnOp::Dec => {
                let Expr::Variable(var) = unary.operand.as_ref() else {
                    unreachable!("postfix increment is only parsed on identifiers");
                };
                let op = if unary.op == UnOp::Inc {
                    Op::IncVar(var.slot as u32)
                } else {
                    Op::DecVar(var.slot as u32)
                };
                self.push(op, unary.span);
            }
        }
    }

    fn emit_binary(&mut self, binary: &BinaryExpr) {
        match binary.op {
            BinOp::And => {
                self.emit_expr(&binary.left);
                let short = self.push(Op::JmpIfFalse(PLACEHOLDER), binary.span);
                self.emit_expr(&binary.right);
                let end = self.push(Op::Jmp(PLACEHOLDER), binary.span);
                self.patch(short);
                self.push(Op::LoadConst(Value::Bool(false)), binary.span);
                self.patch(end);
            }
            BinOp::Or => {
                self.emit_expr(&binary.left);
                let short = self.push(Op::JmpIfTrue(PLACEHOLDER), binary.span);
                self.emit_expr(&binary.right);
                let end = self.push(Op::Jmp(PLACEHOLDER), binary.span);
                self.patch(short);
                self.push(Op::LoadConst(Value::Bool(true)), binary.span);
                self.patch(end);
            }
            op => {
                self.emit_expr(&binary.left);
                self.emit_expr(&binary.right);
                self.push(binary_opcode(op), binary.span);
            }
        }
    }
}

/// `variable <cmp> literal` with an ordering comparison, the shape the
/// loop specialization recognizes.
fn fast_loop_pattern(cond: &Expr) -> Option<(u32, CmpOp, f64)> {
    let Expr::Binary(binary) = cond else {
        return None;
    };
    let cmp = match binary.op {
        BinOp::Lt => CmpOp::Lt,
        BinOp::Le => CmpOp::Le,
        BinOp::Gt => CmpOp::Gt,
        BinOp::Ge => CmpOp::Ge,
        _ => return None,
    };
    let Expr::Variable(var) = binary.left.as_ref() else {
        return None;
    };
    if var.slot < 0 {
        return None;
    }
    let Expr::Literal(lit) = binary.right.as_ref() else {
        return None;
    };
    let limit = match lit.value {
        LitValue::Int(i) => i as f64,
        LitValue::Float(f) => f,
        _ => return None,
    };
    Some((var.slot as u32, cmp, limit))
}

fn binary_opcode(op: BinOp) -> Op {
    match op {
        BinOp::Add => Op::Add,
        BinOp::Sub => Op::Sub,
        BinOp::Mul => Op::Mul,
        BinOp::Div => Op::Div,
        BinOp::Mod => Op::Mod,
        BinOp::Pow => Op::Pow,
        BinOp::Eq => Op::Eq,
        BinOp::Ne => Op::Neq,
        BinOp::Lt => Op::Lt,
        BinOp::Le => Op::Lte,
        BinOp::Gt => Op::Gt,
        BinOp::Ge => Op::Gte,
        BinOp::And | BinOp::Or => unreachable!("short-circuit operators lower to jumps"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vextc_lex::tokenize;
    use vextc_par::parse;
    use vextc_sem::{analyze, FunctionTable};
    use vextc_util::Handler;

    /// Compile source through the front end and emit.
    fn emit_source(source: &str) -> Vec<Instr> {
        let handler = Handler::new();
        let tokens = tokenize(source, &handler);
        let mut stmts = parse(tokens, &handler);
        let mut table = FunctionTable::with_builtins();
        analyze(&mut stmts, &mut table, &handler);
        assert!(
            !handler.has_errors(),
            "source should analyze cleanly: {:?}",
            handler.diagnostics()
        );
        emit(&stmts)
    }

    fn ops(code: &[Instr]) -> Vec<&Op> {
        code.iter().map(|i| &i.op).collect()
    }

    #[test]
    fn test_declaration_stores_slot() {
        let code = emit_source("int x = 7;");
        assert_eq!(
            ops(&code),
            vec![&Op::LoadConst(Value::Number(7.0)), &Op::StoreVar(0)]
        );
    }

    #[test]
    fn test_uninitialized_declaration_emits_nothing() {
        let code = emit_source("int x;");
        assert!(code.is_empty());
    }

    #[test]
    fn test_operands_left_then_right() {
        let code = emit_source("int a = 1; int b = 2; int c = a - b;");
        let tail: Vec<&Op> = ops(&code)[4..].to_vec();
        assert_eq!(
            tail,
            vec![&Op::LoadVar(0), &Op::LoadVar(1), &Op::Sub, &Op::StoreVar(2)]
        );
    }

    #[test]
    fn test_compound_assignment() {
        let code = emit_source("int x = 1; x += 2;");
        let tail: Vec<&Op> = ops(&code)[2..].to_vec();
        assert_eq!(
            tail,
            vec![
                &Op::LoadVar(0),
                &Op::LoadConst(Value::Number(2.0)),
                &Op::Add,
                &Op::StoreVar(0)
            ]
        );
    }

    #[test]
    fn test_unary_minus_lowering() {
        let code = emit_source("int a = 1; int b = -a;");
        let tail: Vec<&Op> = ops(&code)[2..].to_vec();
        assert_eq!(
            tail,
            vec![
                &Op::LoadVar(0),
                &Op::LoadConst(Value::Number(-1.0)),
                &Op::Mul,
                &Op::StoreVar(1)
            ]
        );
    }

    #[test]
    fn test_increment_statement_lowering() {
        let code = emit_source("int i = 0; i++; i--;");
        let tail: Vec<&Op> = ops(&code)[2..].to_vec();
        assert_eq!(tail, vec![&Op::IncVar(0), &Op::DecVar(0)]);
    }

    #[test]
    fn test_void_call_statement_uses_call_void() {
        let code = emit_source("print(1);");
        assert!(matches!(
            &code[1].op,
            Op::CallVoid { name, argc: 1 } if name == "print"
        ));
        // no POP after CALL_VOID
        assert_eq!(code.len(), 2);
    }

    #[test]
    fn test_value_call_statement_is_popped() {
        let code = emit_source("int f() { return 1; } f();");
        let last_two: Vec<&Op> = ops(&code)[code.len() - 2..].to_vec();
        assert!(matches!(last_two[0], Op::Call { name, argc: 0 } if name == "f"));
        assert_eq!(last_two[1], &Op::Pop);
    }

    #[test]
    fn test_and_lowering_shape() {
        let code = emit_source("bool a = true; bool b = a && a;");
        // LOAD a, JIF ->false-site, LOAD a, JMP ->end, LOAD false, STORE
        let tail = &code[2..];
        assert!(matches!(tail[0].op, Op::LoadVar(0)));
        let &Op::JmpIfFalse(false_site) = &tail[1].op else {
            panic!("expected JMP_IF_FALSE, got {:?}", tail[1].op);
        };
        assert!(matches!(tail[2].op, Op::LoadVar(0)));
        let &Op::Jmp(end) = &tail[3].op else {
            panic!("expected JMP, got {:?}", tail[3].op);
        };
        assert_eq!(code[false_site].op, Op::LoadConst(Value::Bool(false)));
        assert!(matches!(code[end].op, Op::StoreVar(1)));
    }

    #[test]
    fn test_or_lowering_uses_jmp_if_true() {
        let code = emit_source("bool a = true; bool b = a || a;");
        assert!(code.iter().any(|i| matches!(i.op, Op::JmpIfTrue(_))));
        assert!(code
            .iter()
            .any(|i| i.op == Op::LoadConst(Value::Bool(true))));
    }

    #[test]
    fn test_if_else_patching() {
        let code = emit_source("int x = 0; bool c = true; if (c) { x = 1; } else { x = 2; }");
        assert!(validate_jumps(&code));
        let jif = code
            .iter()
            .find_map(|i| match i.op {
                Op::JmpIfFalse(t) => Some(t),
                _ => None,
            })
            .expect("if lowers to a conditional jump");
        // the else branch starts where the conditional jump lands
        assert!(matches!(code[jif].op, Op::LoadConst(_)));
    }

    #[test]
    fn test_while_general_condition() {
        // condition is not var-cmp-literal (literal on the left)
        let code = emit_source("int i = 10; bool c = true; while (c) { i--; c = i > 0; }");
        assert!(code.iter().any(|i| matches!(i.op, Op::JmpIfFalse(_))));
        assert!(!code
            .iter()
            .any(|i| matches!(i.op, Op::JmpIfVarOpConst { .. })));
        assert!(validate_jumps(&code));
    }

    #[test]
    fn test_while_specialized_header() {
        let code = emit_source("int i = 0; while (i < 5) { i++; }");
        let header = code
            .iter()
            .find_map(|i| match &i.op {
                Op::JmpIfVarOpConst {
                    slot,
                    cmp,
                    limit,
                    target,
                } => Some((*slot, *cmp, *limit, *target)),
                _ => None,
            })
            .expect("fast loop shape should specialize");
        assert_eq!(header.0, 0);
        assert_eq!(header.1, CmpOp::Lt);
        assert_eq!(header.2, 5.0);
        assert_eq!(header.3, code.len());
        assert!(validate_jumps(&code));
    }

    #[test]
    fn test_for_specialized_header_and_step_order() {
        let code = emit_source("int n = 0; for (int i = 0; i < 5; i++) { n += i; }");
        assert!(code
            .iter()
            .any(|i| matches!(i.op, Op::JmpIfVarOpConst { .. })));
        // the step is emitted after the body, right before the back jump
        let back_jump = code
            .iter()
            .rposition(|i| matches!(i.op, Op::Jmp(_)))
            .unwrap();
        assert_eq!(code[back_jump - 1].op, Op::IncVar(1));
        assert!(validate_jumps(&code));
    }

    #[test]
    fn test_condition_less_for_loops_forever() {
        let code = emit_source("int i = 0; for (;;) { i++; }");
        // no exit jump, only the back jump
        assert!(!code.iter().any(|i| matches!(i.op, Op::JmpIfFalse(_))));
        assert!(validate_jumps(&code));
    }

    #[test]
    fn test_function_body_shape() {
        let code = emit_source("int add(int a, int b) { return a + b; }");
        let Op::DefFunc(func) = &code[0].op else {
            panic!("expected DEF_FUNC");
        };
        assert_eq!(func.name, "add");
        assert_eq!(func.arity(), 2);
        // parameters popped in reverse: b first, then a
        assert_eq!(func.body[0].op, Op::StoreVar(func.param_slots[1]));
        assert_eq!(func.body[1].op, Op::StoreVar(func.param_slots[0]));
        assert!(matches!(func.body.last().unwrap().op, Op::Ret));
    }

    #[test]
    fn test_function_without_trailing_return_gets_epilogue() {
        let code = emit_source("void hello() { print(\"hi\"); }");
        let Op::DefFunc(func) = &code[0].op else { panic!() };
        let n = func.body.len();
        assert_eq!(func.body[n - 2].op, Op::LoadConst(Value::Null));
        assert_eq!(func.body[n - 1].op, Op::Ret);
    }

    #[test]
    fn test_bare_return_pushes_null() {
        let code = emit_source("void f() { return; }");
        let Op::DefFunc(func) = &code[0].op else { panic!() };
        assert!(func
            .body
            .windows(2)
            .any(|w| w[0].op == Op::LoadConst(Value::Null) && w[1].op == Op::Ret));
    }

    #[test]
    fn test_module_call_uses_qualified_name() {
        let code = emit_source("float r = Math.pow(2, 8);");
        assert!(code
            .iter()
            .any(|i| matches!(&i.op, Op::Call { name, argc: 2 } if name == "Math.pow")));
    }

    #[test]
    fn test_instruction_positions_recorded() {
        let code = emit_source("int x = 1;\nint y = 2;");
        assert_eq!(code[0].line, 1);
        assert_eq!(code[2].line, 2);
    }
}
