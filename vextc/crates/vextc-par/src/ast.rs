//! AST node definitions.
//!
//! Nodes are tagged sums (one struct per variant) carrying their source
//! span. Fields filled in by later phases (`slot`, call return types) start
//! out as sentinels: slots are `-1` until the analyzer assigns them.

use std::fmt;
use vextc_util::Span;

/// Static type tag.
///
/// `Numeral` (accepts int or float, used for built-in parameters) and
/// `Error` (the propagating type-error token) are internal: they cannot be
/// written in source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ty {
    Int,
    Float,
    Bool,
    Str,
    Auto,
    Void,
    Numeral,
    Error,
}

impl Ty {
    /// Maps a type keyword to its tag. `None` for non-type keywords.
    pub fn from_keyword(text: &str) -> Option<Ty> {
        match text {
            "int" => Some(Ty::Int),
            "float" => Some(Ty::Float),
            "bool" => Some(Ty::Bool),
            "string" => Some(Ty::Str),
            "auto" => Some(Ty::Auto),
            "void" => Some(Ty::Void),
            _ => None,
        }
    }

    /// The surface name of the type, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Ty::Int => "int",
            Ty::Float => "float",
            Ty::Bool => "bool",
            Ty::Str => "string",
            Ty::Auto => "auto",
            Ty::Void => "void",
            Ty::Numeral => "numeral",
            Ty::Error => "error",
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal value as parsed. `Int` and `Float` stay distinct statically even
/// though the runtime stores every numeric as a double.
#[derive(Clone, Debug, PartialEq)]
pub enum LitValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

/// Unary operator. `Inc`/`Dec` are the postfix `++`/`--` forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Inc,
    Dec,
}

/// Binary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    /// The operator's source spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }

    /// True for `== != < > <= >=`.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Assignment operator: plain `=` or one of the compound forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    /// The arithmetic operator a compound assignment expands to.
    pub fn binary_op(&self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::DivAssign => Some(BinOp::Div),
        }
    }
}

/// Expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    Variable(VariableExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Call(CallExpr),
    ModuleCall(ModuleCallExpr),
}

impl Expr {
    /// The source span of the expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Variable(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::ModuleCall(e) => e.span,
        }
    }

    /// True for function-call shaped expressions (free or module-qualified).
    pub fn is_call(&self) -> bool {
        matches!(self, Expr::Call(_) | Expr::ModuleCall(_))
    }
}

/// Literal expression.
#[derive(Clone, Debug, PartialEq)]
pub struct LiteralExpr {
    pub value: LitValue,
    pub span: Span,
}

/// Variable reference. `slot` is assigned by the analyzer.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableExpr {
    pub name: String,
    pub slot: i32,
    pub span: Span,
}

/// Unary expression (prefix `-`/`!`, postfix `++`/`--`).
#[derive(Clone, Debug, PartialEq)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

/// Free function call. `ret` is resolved during overload resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
    pub ret: Ty,
    pub span: Span,
}

/// Module-qualified call (`Math.sqrt(x)`).
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleCallExpr {
    pub module: String,
    pub name: String,
    pub args: Vec<Expr>,
    pub ret: Ty,
    pub span: Span,
}

impl ModuleCallExpr {
    /// The fully qualified `Module.function` name used for lookup.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

/// Binary expression.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinOp,
    pub right: Box<Expr>,
    pub span: Span,
}

/// Statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    VarDecl(VarDeclStmt),
    Assign(AssignStmt),
    Increment(IncrementStmt),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    FuncDef(FuncDefStmt),
}

/// Variable declaration: `<type> <name> (= <expr>)? ;`
#[derive(Clone, Debug, PartialEq)]
pub struct VarDeclStmt {
    /// Declared type; `auto` is replaced by the inferred type.
    pub ty: Ty,
    pub name: String,
    /// Assigned by the analyzer.
    pub slot: i32,
    pub init: Option<Expr>,
    /// Span of the type keyword.
    pub span: Span,
    /// Span of the declared name.
    pub name_span: Span,
}

/// Assignment: `<name> <op> <expr> ;`
#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub name: String,
    pub slot: i32,
    pub op: AssignOp,
    pub value: Expr,
    /// Span of the assignment target.
    pub span: Span,
}

/// Increment statement: `<name>++ ;` or `<name>-- ;`
#[derive(Clone, Debug, PartialEq)]
pub struct IncrementStmt {
    pub name: String,
    pub slot: i32,
    pub is_increment: bool,
    pub span: Span,
}

/// Bare expression statement (function calls only).
#[derive(Clone, Debug, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
}

/// If statement; bodies are single statements or braced blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

/// While loop.
#[derive(Clone, Debug, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// For loop; any of the three clauses may be empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub step: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Return statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// Function parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub ty: Ty,
    pub name: String,
    /// Assigned by the analyzer.
    pub slot: i32,
    /// Span of the parameter name.
    pub span: Span,
}

/// Function definition (top level only).
#[derive(Clone, Debug, PartialEq)]
pub struct FuncDefStmt {
    pub ret: Ty,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// Span of the return type keyword.
    pub span: Span,
    /// Span of the function name.
    pub name_span: Span,
}

/// Counts every statement and expression node in the tree.
///
/// Used for the engine's node-count metric.
pub fn count_nodes(stmts: &[Stmt]) -> usize {
    fn expr_nodes(e: &Expr) -> usize {
        1 + match e {
            Expr::Literal(_) | Expr::Variable(_) => 0,
            Expr::Unary(u) => expr_nodes(&u.operand),
            Expr::Binary(b) => expr_nodes(&b.left) + expr_nodes(&b.right),
            Expr::Call(c) => c.args.iter().map(expr_nodes).sum(),
            Expr::ModuleCall(c) => c.args.iter().map(expr_nodes).sum(),
        }
    }

    fn stmt_nodes(s: &Stmt) -> usize {
        1 + match s {
            Stmt::VarDecl(d) => d.init.as_ref().map_or(0, expr_nodes),
            Stmt::Assign(a) => expr_nodes(&a.value),
            Stmt::Increment(_) => 0,
            Stmt::Expr(e) => expr_nodes(&e.expr),
            Stmt::If(i) => {
                expr_nodes(&i.cond)
                    + count_nodes(&i.body)
                    + i.else_body.as_deref().map_or(0, count_nodes)
            }
            Stmt::While(w) => expr_nodes(&w.cond) + count_nodes(&w.body),
            Stmt::For(f) => {
                f.init.as_deref().map_or(0, |s| stmt_nodes(s))
                    + f.cond.as_ref().map_or(0, expr_nodes)
                    + f.step.as_deref().map_or(0, |s| stmt_nodes(s))
                    + count_nodes(&f.body)
            }
            Stmt::Return(r) => r.value.as_ref().map_or(0, expr_nodes),
            Stmt::FuncDef(f) => count_nodes(&f.body),
        }
    }

    stmts.iter().map(stmt_nodes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ty_from_keyword() {
        assert_eq!(Ty::from_keyword("int"), Some(Ty::Int));
        assert_eq!(Ty::from_keyword("string"), Some(Ty::Str));
        assert_eq!(Ty::from_keyword("void"), Some(Ty::Void));
        assert_eq!(Ty::from_keyword("while"), None);
        assert_eq!(Ty::from_keyword("numeral"), None);
    }

    #[test]
    fn test_ty_display() {
        assert_eq!(Ty::Str.to_string(), "string");
        assert_eq!(Ty::Numeral.to_string(), "numeral");
    }

    #[test]
    fn test_binop_symbol() {
        assert_eq!(BinOp::Pow.symbol(), "**");
        assert_eq!(BinOp::Ne.symbol(), "!=");
        assert!(BinOp::Le.is_comparison());
        assert!(!BinOp::Add.is_comparison());
    }

    #[test]
    fn test_assign_op_expansion() {
        assert_eq!(AssignOp::Assign.binary_op(), None);
        assert_eq!(AssignOp::AddAssign.binary_op(), Some(BinOp::Add));
        assert_eq!(AssignOp::DivAssign.binary_op(), Some(BinOp::Div));
    }

    #[test]
    fn test_count_nodes() {
        use vextc_util::Span;
        // x = 1 + 2;  -> Assign + Binary + 2 literals = 4 nodes
        let stmt = Stmt::Assign(AssignStmt {
            name: "x".into(),
            slot: -1,
            op: AssignOp::Assign,
            value: Expr::Binary(BinaryExpr {
                left: Box::new(Expr::Literal(LiteralExpr {
                    value: LitValue::Int(1),
                    span: Span::DUMMY,
                })),
                op: BinOp::Add,
                right: Box::new(Expr::Literal(LiteralExpr {
                    value: LitValue::Int(2),
                    span: Span::DUMMY,
                })),
                span: Span::DUMMY,
            }),
            span: Span::DUMMY,
        });
        assert_eq!(count_nodes(&[stmt]), 4);
    }
}
