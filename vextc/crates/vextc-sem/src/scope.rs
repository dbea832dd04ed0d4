//! Scope stack and definite-assignment tracking.
//!
//! Scopes form a flat vector of frames; popping shrinks the vector. Each
//! frame carries its own name bindings and a bitset of definitely-assigned
//! slots. A pushed frame starts with a copy of its parent's bitset; joins
//! across branches are computed by the analyzer (intersection for `if`,
//! union with the pre-loop state for loops).

use vextc_par::Ty;
use vextc_util::FxHashMap;

/// Bitset over slot indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotSet {
    words: Vec<u64>,
}

impl SlotSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `slot` as a member.
    pub fn insert(&mut self, slot: u32) {
        let word = (slot / 64) as usize;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (slot % 64);
    }

    /// Membership test.
    pub fn contains(&self, slot: u32) -> bool {
        let word = (slot / 64) as usize;
        self.words
            .get(word)
            .is_some_and(|w| w & (1 << (slot % 64)) != 0)
    }

    /// In-place union.
    pub fn union_with(&mut self, other: &SlotSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (i, word) in other.words.iter().enumerate() {
            self.words[i] |= word;
        }
    }

    /// In-place intersection.
    pub fn intersect_with(&mut self, other: &SlotSet) {
        for (i, word) in self.words.iter_mut().enumerate() {
            *word &= other.words.get(i).copied().unwrap_or(0);
        }
    }
}

/// A resolved variable: its storage slot and declared type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VarBinding {
    pub slot: u32,
    pub ty: Ty,
}

/// One scope frame.
struct ScopeFrame {
    bindings: FxHashMap<String, VarBinding>,
    assigned: SlotSet,
}

/// The scope stack. A fresh frame is pushed on entering a function body,
/// an `if`/`else` branch, a `while` body or a `for` statement.
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// New stack holding only the global frame.
    pub fn new() -> Self {
        Self {
            frames: vec![ScopeFrame {
                bindings: FxHashMap::default(),
                assigned: SlotSet::new(),
            }],
        }
    }

    /// Push a nested frame; its assigned set starts as a copy of the
    /// parent's.
    pub fn push(&mut self) {
        let assigned = self.frames.last().map(|f| f.assigned.clone()).unwrap_or_default();
        self.frames.push(ScopeFrame {
            bindings: FxHashMap::default(),
            assigned,
        });
    }

    /// Pop the top frame, returning its assigned set for join computation.
    pub fn pop(&mut self) -> SlotSet {
        debug_assert!(self.frames.len() > 1, "cannot pop the global scope");
        self.frames.pop().map(|f| f.assigned).unwrap_or_default()
    }

    /// Declare a variable in the current frame. Returns false when the name
    /// is already bound in this frame (shadowing outer frames is fine).
    pub fn declare(&mut self, name: String, slot: u32, ty: Ty) -> bool {
        let frame = self.frames.last_mut().expect("scope stack is never empty");
        if frame.bindings.contains_key(&name) {
            return false;
        }
        frame.bindings.insert(name, VarBinding { slot, ty });
        true
    }

    /// Resolve a name, walking from the innermost frame to the root.
    pub fn resolve(&self, name: &str) -> Option<VarBinding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name).copied())
    }

    /// Mark a slot definitely-assigned in the current frame.
    pub fn mark_assigned(&mut self, slot: u32) {
        self.frames
            .last_mut()
            .expect("scope stack is never empty")
            .assigned
            .insert(slot);
    }

    /// Is the slot definitely-assigned at the current program point?
    pub fn is_assigned(&self, slot: u32) -> bool {
        self.frames
            .last()
            .is_some_and(|f| f.assigned.contains(slot))
    }

    /// Copy of the current frame's assigned set.
    pub fn snapshot_assigned(&self) -> SlotSet {
        self.frames
            .last()
            .map(|f| f.assigned.clone())
            .unwrap_or_default()
    }

    /// Replace the current frame's assigned set with a joined result.
    pub fn set_assigned(&mut self, set: SlotSet) {
        self.frames
            .last_mut()
            .expect("scope stack is never empty")
            .assigned = set;
    }

    /// Current nesting depth (1 = global only).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
