//! vextc-vm - Stack-based virtual machine.
//!
//! Executes the instruction vector produced by `vextc-gen` on an explicit
//! operand stack and a growable variable slot array. User calls run the
//! callee's body recursively under snapshot-and-restore of the slot array:
//! each activation sees the globals but none of its writes survive the
//! return. Output from the `print` family is captured into a buffer.
//!
//! All failures are [`RuntimeError`] values; the machine never panics the
//! host process.

mod error;
mod natives;

pub use error::{Result, RuntimeError};

use rustc_hash::FxHashMap;
use vextc_gen::{Instr, Op, UserFunction, Value};

/// Initial operand stack capacity; the stack grows as needed.
const STACK_CAPACITY: usize = 256;

/// Initial slot array capacity; grown to the next power of two covering
/// any stored index.
const SLOT_CAPACITY: usize = 64;

/// The virtual machine.
pub struct Vm {
    stack: Vec<Value>,
    slots: Vec<Value>,
    functions: FxHashMap<String, Vec<UserFunction>>,
    output: String,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(STACK_CAPACITY),
            slots: Vec::with_capacity(SLOT_CAPACITY),
            functions: FxHashMap::default(),
            output: String::new(),
        }
    }

    /// Execute a program. Returns the value of a top-level `RET`, or
    /// `Null` when execution falls off the end.
    pub fn run(&mut self, code: &[Instr]) -> Result<Value> {
        self.execute(code)
    }

    /// Captured stdout so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The variable slot array.
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Consume the machine, yielding the final slots and captured output.
    pub fn into_state(self) -> (Vec<Value>, String) {
        (self.slots, self.output)
    }

    pub(crate) fn write_line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn execute(&mut self, code: &[Instr]) -> Result<Value> {
        let mut ip = 0usize;

        while ip < code.len() {
            let instr = &code[ip];
            match &instr.op {
                Op::LoadConst(value) => self.stack.push(value.clone()),
                Op::LoadVar(slot) => {
                    // slots that were never stored read as null
                    let value = self
                        .slots
                        .get(*slot as usize)
                        .cloned()
                        .unwrap_or(Value::Null);
                    self.stack.push(value);
                }
                Op::StoreVar(slot) => {
                    let value = self.pop(instr)?;
                    self.store(*slot as usize, value);
                }

                Op::Add => {
                    let right = self.pop(instr)?;
                    let left = self.pop(instr)?;
                    self.stack.push(add_values(left, right, instr)?);
                }
                Op::Sub | Op::Mul | Op::Div | Op::Pow | Op::Mod => {
                    let right = self.pop_number(instr)?;
                    let left = self.pop_number(instr)?;
                    if right == 0.0 && matches!(instr.op, Op::Div | Op::Mod) {
                        return Err(RuntimeError::DivisionByZero {
                            line: instr.line,
                            col: instr.col,
                        });
                    }
                    let result = match instr.op {
                        Op::Sub => left - right,
                        Op::Mul => left * right,
                        Op::Div => left / right,
                        Op::Mod => left % right,
                        _ => left.powf(right),
                    };
                    self.stack.push(Value::Number(result));
                }

                Op::Eq => {
                    let right = self.pop(instr)?;
                    let left = self.pop(instr)?;
                    let eq = eq_values(&left, &right, instr)?;
                    self.stack.push(Value::Bool(eq));
                }
                Op::Neq => {
                    let right = self.pop(instr)?;
                    let left = self.pop(instr)?;
                    let eq = eq_values(&left, &right, instr)?;
                    self.stack.push(Value::Bool(!eq));
                }
                Op::Lt | Op::Lte | Op::Gt | Op::Gte => {
                    let right = self.pop_number(instr)?;
                    let left = self.pop_number(instr)?;
                    let result = match instr.op {
                        Op::Lt => left < right,
                        Op::Lte => left <= right,
                        Op::Gt => left > right,
                        _ => left >= right,
                    };
                    self.stack.push(Value::Bool(result));
                }

                Op::Not => {
                    let value = self.pop_bool(instr)?;
                    self.stack.push(Value::Bool(!value));
                }

                Op::Jmp(target) => {
                    ip = self.jump(*target, code.len(), instr)?;
                    continue;
                }
                Op::JmpIfFalse(target) => {
                    if !self.pop_bool(instr)? {
                        ip = self.jump(*target, code.len(), instr)?;
                        continue;
                    }
                }
                Op::JmpIfTrue(target) => {
                    if self.pop_bool(instr)? {
                        ip = self.jump(*target, code.len(), instr)?;
                        continue;
                    }
                }
                Op::JmpIfVarOpConst {
                    slot,
                    cmp,
                    limit,
                    target,
                } => {
                    let value = match self.slots.get(*slot as usize) {
                        Some(Value::Number(n)) => *n,
                        other => {
                            return Err(RuntimeError::TypeMismatch {
                                expected: "number",
                                found: other.map(kind_name).unwrap_or("null"),
                                line: instr.line,
                                col: instr.col,
                            })
                        }
                    };
                    // the loop-exit jump fires when the comparison fails
                    if !cmp.eval(value, *limit) {
                        ip = self.jump(*target, code.len(), instr)?;
                        continue;
                    }
                }

                Op::Pop => {
                    self.pop(instr)?;
                }
                Op::IncVar(slot) => self.bump_slot(*slot as usize, 1.0, instr)?,
                Op::DecVar(slot) => self.bump_slot(*slot as usize, -1.0, instr)?,

                Op::Call { name, argc } => {
                    if let Some(value) = self.call(name, *argc as usize, instr)? {
                        self.stack.push(value);
                    }
                }
                Op::CallVoid { name, argc } => {
                    self.call(name, *argc as usize, instr)?;
                }
                Op::Ret => return self.pop(instr),
                Op::DefFunc(func) => {
                    self.functions
                        .entry(func.name.clone())
                        .or_default()
                        .push(func.clone());
                }
            }
            ip += 1;
        }

        Ok(Value::Null)
    }

    /// Resolve a call target and invoke it. `Ok(None)` means the callee
    /// produced nothing to push.
    fn call(&mut self, name: &str, argc: usize, instr: &Instr) -> Result<Option<Value>> {
        if self.stack.len() < argc {
            return Err(RuntimeError::StackUnderflow {
                line: instr.line,
                col: instr.col,
            });
        }

        // qualified names go straight to the module natives
        if !name.contains('.') {
            let user = self
                .functions
                .get(name)
                .and_then(|overloads| overloads.iter().find(|f| f.arity() == argc))
                .cloned();
            if let Some(func) = user {
                // snapshot-and-restore: the activation sees the globals but
                // none of its writes survive the return; the body's leading
                // STORE_VARs pop the arguments off the shared stack
                let saved = self.slots.clone();
                let result = self.execute(&func.body);
                self.slots = saved;
                return result.map(Some);
            }
            if self.functions.contains_key(name) {
                return Err(RuntimeError::WrongArity {
                    name: name.to_string(),
                    argc,
                    line: instr.line,
                    col: instr.col,
                });
            }
        }

        let args = self.stack.split_off(self.stack.len() - argc);
        natives::call_native(self, name, &args, instr.line, instr.col)
    }

    fn jump(&self, target: usize, len: usize, instr: &Instr) -> Result<usize> {
        // a target equal to the code length halts the loop naturally
        if target > len {
            return Err(RuntimeError::BadJump {
                target,
                line: instr.line,
                col: instr.col,
            });
        }
        Ok(target)
    }

    fn store(&mut self, slot: usize, value: Value) {
        if slot >= self.slots.len() {
            let new_len = (slot + 1).next_power_of_two();
            self.slots.resize(new_len, Value::Null);
        }
        self.slots[slot] = value;
    }

    fn bump_slot(&mut self, slot: usize, delta: f64, instr: &Instr) -> Result<()> {
        match self.slots.get_mut(slot) {
            Some(Value::Number(n)) => {
                *n += delta;
                Ok(())
            }
            other => Err(RuntimeError::TypeMismatch {
                expected: "number",
                found: other.map(|v| kind_name(v)).unwrap_or("null"),
                line: instr.line,
                col: instr.col,
            }),
        }
    }

    fn pop(&mut self, instr: &Instr) -> Result<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow {
            line: instr.line,
            col: instr.col,
        })
    }

    fn pop_number(&mut self, instr: &Instr) -> Result<f64> {
        match self.pop(instr)? {
            Value::Number(n) => Ok(n),
            other => Err(RuntimeError::TypeMismatch {
                expected: "number",
                found: kind_name(&other),
                line: instr.line,
                col: instr.col,
            }),
        }
    }

    fn pop_bool(&mut self, instr: &Instr) -> Result<bool> {
        match self.pop(instr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::TypeMismatch {
                expected: "bool",
                found: kind_name(&other),
                line: instr.line,
                col: instr.col,
            }),
        }
    }
}

/// Value kind for error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::Str(_) => "string",
        Value::Null => "null",
    }
}

/// `ADD` semantics: string concatenation via the canonical text when
/// either operand is a string, numeric addition otherwise.
fn add_values(left: Value, right: Value, instr: &Instr) -> Result<Value> {
    match (&left, &right) {
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", left, right)))
        }
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
        (Value::Number(_), other) | (other, _) => Err(RuntimeError::TypeMismatch {
            expected: "number",
            found: kind_name(other),
            line: instr.line,
            col: instr.col,
        }),
    }
}

/// `EQ`/`NEQ` semantics over matching value kinds.
fn eq_values(left: &Value, right: &Value, instr: &Instr) -> Result<bool> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(l == r),
        (Value::Bool(l), Value::Bool(r)) => Ok(l == r),
        (Value::Str(l), Value::Str(r)) => Ok(l == r),
        _ => Err(RuntimeError::TypeMismatch {
            expected: kind_name(left),
            found: kind_name(right),
            line: instr.line,
            col: instr.col,
        }),
    }
}
