// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Runtime environment for variable bindings.
//!
//! Each binding owns one [`Slot`]. Reads go through [`Environment::read`], which
//! applies the canonical evolution rule in place; observers that must not
//! disturb evolution use [`Environment::peek`].

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{Slot, Value};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::rc::Rc;

/// Runtime environment for variable bindings.
#[derive(Debug, Clone)]
pub struct Environment {
    inner: Rc<RefCell<EnvInner>>,
}

#[derive(Debug)]
struct EnvInner {
    slots: FxHashMap<SmolStr, Slot>,
    parent: Option<Environment>,
}

impl Environment {
    /// Create a new empty environment.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EnvInner {
                slots: FxHashMap::default(),
                parent: None,
            })),
        }
    }

    /// Create a child environment with this as parent.
    pub fn child(&self) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EnvInner {
                slots: FxHashMap::default(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Bind `name` in this scope, replacing any slot it held here.
    pub fn define(&self, name: SmolStr, slot: Slot) {
        self.inner.borrow_mut().slots.insert(name, slot);
    }

    /// Run `f` on the slot bound to `name`, searching parent scopes.
    pub fn with_slot_mut<R>(&self, name: &str, f: impl FnOnce(&mut Slot) -> R) -> Option<R> {
        let mut inner = self.inner.borrow_mut();
        if let Some(slot) = inner.slots.get_mut(name) {
            return Some(f(slot));
        }
        let parent = inner.parent.clone();
        drop(inner);
        parent.and_then(|parent| parent.with_slot_mut(name, f))
    }

    /// The canonical read: evolves unstable slots in place.
    pub fn read(&self, name: &str) -> RuntimeResult<Value> {
        self.with_slot_mut(name, Slot::read)
            .unwrap_or_else(|| Err(self.unbound(name)))
    }

    /// Copy of the slot bound to `name`, without evolving it.
    pub fn peek(&self, name: &str) -> Option<Slot> {
        let inner = self.inner.borrow();
        if let Some(slot) = inner.slots.get(name) {
            Some(slot.clone())
        } else if let Some(parent) = &inner.parent {
            parent.peek(name)
        } else {
            None
        }
    }

    /// Like [`Environment::peek`], failing with `UnboundVariable`.
    pub fn lookup(&self, name: &str) -> RuntimeResult<Slot> {
        self.peek(name).ok_or_else(|| self.unbound(name))
    }

    /// Replace the slot bound to `name`, searching parent scopes.
    ///
    /// The replacement is computed from the current slot and may fail, in
    /// which case the binding is left untouched.
    pub fn update(
        &self,
        name: &str,
        f: impl FnOnce(&Slot) -> RuntimeResult<Slot>,
    ) -> RuntimeResult<()> {
        self.with_slot_mut(name, |slot| {
            *slot = f(slot)?;
            Ok(())
        })
        .unwrap_or_else(|| Err(self.unbound(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.peek(name).is_some()
    }

    /// Names visible from this scope, sorted.
    pub fn names(&self) -> Vec<SmolStr> {
        let mut names = Vec::new();
        let mut scope = Some(self.clone());
        while let Some(env) = scope {
            let inner = env.inner.borrow();
            names.extend(inner.slots.keys().cloned());
            scope = inner.parent.clone();
        }
        names.sort();
        names.dedup();
        names
    }

    /// Get all local bindings, sorted by name (for debugging and tests).
    pub fn locals(&self) -> Vec<(SmolStr, Slot)> {
        let mut locals: Vec<_> = self
            .inner
            .borrow()
            .slots
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        locals.sort_by(|a, b| a.0.cmp(&b.0));
        locals
    }

    fn unbound(&self, name: &str) -> RuntimeError {
        let names = self.names();
        let available: Vec<&str> = names.iter().map(SmolStr::as_str).collect();
        RuntimeError::unbound_with_suggestions(name, &available)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_evolves_in_place() {
        let env = Environment::new();
        env.define("x".into(), Slot::unstable(Value::Int(10)));
        assert_eq!(env.read("x").unwrap(), Value::Int(10));
        assert_eq!(env.read("x").unwrap(), Value::Int(11));
        assert_eq!(
            env.peek("x"),
            Some(Slot::Unstable { value: Value::Int(11), access_count: 2 })
        );
    }

    #[test]
    fn test_peek_does_not_evolve() {
        let env = Environment::new();
        env.define("x".into(), Slot::unstable(Value::Int(1)));
        env.peek("x");
        env.peek("x");
        assert_eq!(env.read("x").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_child_reads_parent_slot() {
        let global = Environment::new();
        global.define("x".into(), Slot::unstable(Value::Int(0)));
        let local = global.child();
        local.read("x").unwrap();
        local.read("x").unwrap();
        assert_eq!(
            global.peek("x"),
            Some(Slot::Unstable { value: Value::Int(1), access_count: 2 })
        );
    }

    #[test]
    fn test_child_shadowing() {
        let global = Environment::new();
        global.define("n".into(), Slot::stable(Value::Int(1)));
        let local = global.child();
        local.define("n".into(), Slot::stable(Value::Int(2)));
        assert_eq!(local.read("n").unwrap(), Value::Int(2));
        assert_eq!(global.read("n").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_failed_update_keeps_slot() {
        let env = Environment::new();
        env.define("s".into(), Slot::stable(Value::Int(3)));
        let err = env
            .update("s", |_| Err(RuntimeError::ImmutableBinding { name: "s".into() }))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ImmutableBinding { .. }));
        assert_eq!(env.peek("s"), Some(Slot::stable(Value::Int(3))));
    }

    #[test]
    fn test_unbound_read_suggests() {
        let env = Environment::new();
        env.define("total".into(), Slot::stable(Value::Int(0)));
        match env.read("totl") {
            Err(RuntimeError::UnboundVariable { name, hint }) => {
                assert_eq!(name, "totl");
                assert_eq!(hint.as_deref(), Some("did you mean 'total'?"));
            }
            other => panic!("expected unbound variable, got {:?}", other),
        }
    }
}
