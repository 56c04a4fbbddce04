// ABOUTME: Lexical scope stack: name->slot frames with parent-chain lookup

use std::collections::HashMap;

use crate::value::Value;

/// Index of the global scope; it is always the root of the stack and
/// every function frame parents directly onto it.
pub const GLOBAL: usize = 0;

/// A stable handle to one storage slot on the stack. Handles survive map
/// growth because values live in a per-scope vector, not in the name map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub scope: usize,
    pub index: usize,
}

#[derive(Debug, Default)]
struct Scope<'a> {
    names: HashMap<&'a str, usize>,
    slots: Vec<Value<'a>>,
    parent: Option<usize>,
}

/// The stack of live scopes. Scopes push and pop strictly LIFO, so a
/// scope's index identifies it for as long as it is alive; popping a
/// scope drops every value it owns.
#[derive(Debug)]
pub struct ScopeStack<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> ScopeStack<'a> {
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push(&mut self, parent: usize) -> usize {
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.scopes.len() - 1
    }

    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "can't exit the root scope");
        self.scopes.pop();
    }

    /// Walk from `from` toward the root and return the first binding for
    /// `name`, or `None` on a miss.
    pub fn find(&self, from: usize, name: &str) -> Option<Slot> {
        let mut scope = from;
        loop {
            let s = &self.scopes[scope];
            if let Some(&index) = s.names.get(name) {
                return Some(Slot { scope, index });
            }
            scope = s.parent?;
        }
    }

    /// Bind `name` in exactly the given scope, overwriting any binding it
    /// already holds there.
    pub fn define(&mut self, scope: usize, name: &'a str, value: Value<'a>) -> Slot {
        let s = &mut self.scopes[scope];
        match s.names.get(name) {
            Some(&index) => {
                s.slots[index] = value;
                Slot { scope, index }
            }
            None => {
                let index = s.slots.len();
                s.slots.push(value);
                s.names.insert(name, index);
                Slot { scope, index }
            }
        }
    }

    /// Overwrite the first visible binding for `name`, or create one in
    /// the current scope. This is what lets inner-scope assignments
    /// mutate outer variables without any declaration form.
    pub fn set_var(&mut self, from: usize, name: &'a str, value: Value<'a>) -> Slot {
        match self.find(from, name) {
            Some(slot) => {
                self.set(slot, value);
                slot
            }
            None => self.define(from, name, value),
        }
    }

    pub fn get(&self, slot: Slot) -> &Value<'a> {
        &self.scopes[slot.scope].slots[slot.index]
    }

    pub fn set(&mut self, slot: Slot, value: Value<'a>) {
        self.scopes[slot.scope].slots[slot.index] = value;
    }

    /// Follow a chain of `Ref` values to the slot holding the final
    /// non-Ref value.
    pub fn resolve(&self, slot: Slot) -> Slot {
        let mut slot = slot;
        while let Value::Ref(next) = self.get(slot) {
            slot = *next;
        }
        slot
    }
}
