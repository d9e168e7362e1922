//! Runtime storage for lexical scopes.
//!
//! A frame is an ordered, append-only slot array plus an optional link to the
//! enclosing frame.  The link is *shared*, not owned: every closure created in
//! a scope aliases the same frame, which is exactly what keeps the frame alive
//! after its creating call returns.
//!
//! Slot indices are assigned by the resolver; [`Environment::define`] must be
//! called in the same order the resolver called `declare` for that scope, so
//! the indices agree.  A lookup that walks past the chain or indexes a missing
//! slot is a resolver/interpreter mismatch -- a bug in this crate, never a user
//! error -- and panics.
//!
//! Globals do not live here.  Top-level bindings stay in a flat name-keyed
//! table owned by the interpreter, because REPL-style incremental definition
//! makes static slotting unsafe at the top level.

use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Environment {
    slots: Vec<Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A frame with no parent (used for tests and synthetic scopes).
    pub fn new() -> Self {
        Environment {
            slots: Vec::new(),
            enclosing: None,
        }
    }

    /// A frame chained onto `enclosing`.  `None` means the frame sits directly
    /// at the top level, where lookups fall through to the global table.
    pub fn with_enclosing(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment {
            slots: Vec::new(),
            enclosing,
        }
    }

    /// Append a value to this frame, returning its slot index.
    pub fn define(&mut self, value: Value) -> usize {
        let slot = self.slots.len();
        debug!("Defining slot {} = {}", slot, value);
        self.slots.push(value);
        slot
    }

    /// Walk `depth` parent links from `env`.
    fn ancestor(env: &Rc<RefCell<Environment>>, depth: usize) -> Rc<RefCell<Environment>> {
        let mut frame = Rc::clone(env);

        for _ in 0..depth {
            let parent = frame
                .borrow()
                .enclosing
                .clone()
                .unwrap_or_else(|| panic!("scope chain shorter than resolved depth {}", depth));
            frame = parent;
        }

        frame
    }

    /// Read the value at (`depth`, `slot`) relative to `env`.  O(depth), no
    /// hashing; cannot fail for a correctly resolved reference.
    pub fn get_at(env: &Rc<RefCell<Environment>>, depth: usize, slot: usize) -> Value {
        let frame = Self::ancestor(env, depth);
        let frame = frame.borrow();

        frame
            .slots
            .get(slot)
            .cloned()
            .unwrap_or_else(|| panic!("no slot {} in frame at depth {}", slot, depth))
    }

    /// Overwrite the value at (`depth`, `slot`) relative to `env`.
    pub fn assign_at(env: &Rc<RefCell<Environment>>, depth: usize, slot: usize, value: Value) {
        let frame = Self::ancestor(env, depth);
        let mut frame = frame.borrow_mut();

        match frame.slots.get_mut(slot) {
            Some(cell) => *cell = value,
            None => panic!("no slot {} in frame at depth {}", slot, depth),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
