//! Function table and overload resolution.
//!
//! A name maps to a list of overloads in discovery order. Built-ins are
//! registered at engine construction; user functions are added during
//! function discovery. Resolution walks user overloads first and falls
//! back to built-ins only when no user overload matches the call's arity.

use crate::types::compatible;
use indexmap::IndexMap;
use vextc_par::Ty;

/// Who provides the implementation of a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuncKind {
    /// Defined in the compiled program.
    User,
    /// Provided by the runtime (free built-in or module function).
    Native,
}

/// A function signature. Module built-ins carry their qualified name
/// (`Math.sqrt`); everything else the bare name.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncSig {
    pub name: String,
    pub params: Vec<Ty>,
    pub ret: Ty,
    pub kind: FuncKind,
}

impl FuncSig {
    /// Human-readable form for diagnostics: `name(int, float)`.
    pub fn describe(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|t| t.name()).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Name -> overload list, in registration order.
pub struct FunctionTable {
    funcs: IndexMap<String, Vec<FuncSig>>,
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            funcs: IndexMap::new(),
        }
    }

    /// A table pre-populated with the runtime's built-ins.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();

        let native = |name: &str, params: Vec<Ty>, ret: Ty| FuncSig {
            name: name.to_string(),
            params,
            ret,
            kind: FuncKind::Native,
        };

        // free built-ins
        table.register(native("print", vec![Ty::Auto], Ty::Void));
        table.register(native("len", vec![Ty::Str], Ty::Int));

        // internal helpers used by member-access lowering
        table.register(native("__v_gettype", vec![Ty::Auto], Ty::Str));
        table.register(native("__v_tostring", vec![Ty::Auto], Ty::Str));

        // Math module
        for name in ["sqrt", "sin", "cos", "tan", "log", "exp", "abs", "round", "floor", "ceil"] {
            table.register(native(
                &format!("Math.{}", name),
                vec![Ty::Numeral],
                Ty::Float,
            ));
        }
        for name in ["pow", "min", "max"] {
            table.register(native(
                &format!("Math.{}", name),
                vec![Ty::Numeral, Ty::Numeral],
                Ty::Float,
            ));
        }
        table.register(native("Math.random", vec![], Ty::Float));
        table.register(native(
            "Math.random",
            vec![Ty::Numeral, Ty::Numeral],
            Ty::Float,
        ));

        table
    }

    /// Append an overload under its name.
    pub fn register(&mut self, sig: FuncSig) {
        self.funcs.entry(sig.name.clone()).or_default().push(sig);
    }

    /// All overloads registered under `name`, in discovery order.
    pub fn overloads(&self, name: &str) -> &[FuncSig] {
        self.funcs.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Is any function (of either kind) registered under `name`?
    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Does a user function with this exact parameter-type sequence exist?
    /// Used to enforce signature-level uniqueness during discovery.
    pub fn has_user_signature(&self, name: &str, params: &[Ty]) -> bool {
        self.overloads(name)
            .iter()
            .any(|sig| sig.kind == FuncKind::User && sig.params == params)
    }

    /// Overload resolution: the first user overload whose arity matches and
    /// whose parameters accept the argument types pairwise. Built-ins are
    /// considered only when no user overload matched the arity.
    pub fn resolve(&self, name: &str, args: &[Ty]) -> Option<&FuncSig> {
        let overloads = self.overloads(name);

        let mut user_arity_match = false;
        for sig in overloads.iter().filter(|s| s.kind == FuncKind::User) {
            if sig.params.len() != args.len() {
                continue;
            }
            user_arity_match = true;
            if Self::params_accept(sig, args) {
                return Some(sig);
            }
        }
        if user_arity_match {
            return None;
        }

        overloads
            .iter()
            .filter(|s| s.kind == FuncKind::Native)
            .find(|sig| sig.params.len() == args.len() && Self::params_accept(sig, args))
    }

    fn params_accept(sig: &FuncSig, args: &[Ty]) -> bool {
        sig.params
            .iter()
            .zip(args)
            .all(|(param, arg)| compatible(*param, *arg))
    }
}
