//! Lexical scopes as an arena of records linked by parent index.
//!
//! Scopes are strictly LIFO: entering pushes a record whose parent may be any
//! live scope (the enclosing one for blocks, the root for function bodies),
//! and leaving truncates the arena back to where it was.

use std::collections::HashMap;

use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

/// Returned by [`Scopes::enter`]; hand it back to [`Scopes::leave`].
#[must_use]
#[derive(Debug)]
pub struct Frame {
    previous: ScopeId,
}

#[derive(Debug)]
pub struct Scopes {
    arena: Vec<Scope>,
    current: ScopeId,
}

impl Scopes {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Self {
            arena: vec![Scope::default()],
            current: Self::ROOT,
        }
    }

    #[cfg(test)]
    fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of live scopes, root included.
    #[cfg(test)]
    fn depth(&self) -> usize {
        self.arena.len()
    }

    /// Open a child of `parent` and make it current.
    pub fn enter(&mut self, parent: ScopeId) -> Frame {
        let previous = self.current;
        self.arena.push(Scope {
            vars: HashMap::new(),
            parent: Some(parent),
        });
        self.current = ScopeId(self.arena.len() - 1);
        Frame { previous }
    }

    /// Open a child of the current scope.
    pub fn enter_child(&mut self) -> Frame {
        self.enter(self.current)
    }

    /// Discard the current scope (and anything above it).
    pub fn leave(&mut self, frame: Frame) {
        self.arena.truncate(self.current.0.max(1));
        self.current = frame.previous;
    }

    /// Bind `name` in the current scope, shadowing outer bindings.
    pub fn define(&mut self, name: &str, value: Value) {
        self.arena[self.current.0]
            .vars
            .insert(name.to_string(), value);
    }

    /// Overwrite the nearest binding of `name`. Returns false if none exists.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        let mut id = Some(self.current);
        while let Some(ScopeId(idx)) = id {
            let scope = &mut self.arena[idx];
            if let Some(slot) = scope.vars.get_mut(name) {
                *slot = value;
                return true;
            }
            id = scope.parent;
        }
        false
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut id = Some(self.current);
        while let Some(ScopeId(idx)) = id {
            let scope = &self.arena[idx];
            if let Some(v) = scope.vars.get(name) {
                return Some(v);
            }
            id = scope.parent;
        }
        None
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parents() {
        let mut scopes = Scopes::new();
        scopes.define("a", Value::Number(1.0));
        let frame = scopes.enter_child();
        assert_eq!(scopes.lookup("a"), Some(&Value::Number(1.0)));
        scopes.leave(frame);
    }

    #[test]
    fn child_bindings_vanish_on_leave() {
        let mut scopes = Scopes::new();
        let frame = scopes.enter_child();
        scopes.define("x", Value::Bool(true));
        scopes.leave(frame);
        assert_eq!(scopes.lookup("x"), None);
        assert_eq!(scopes.depth(), 1);
        assert_eq!(scopes.current(), Scopes::ROOT);
    }

    #[test]
    fn assign_updates_nearest_definition() {
        let mut scopes = Scopes::new();
        scopes.define("n", Value::Number(1.0));
        let frame = scopes.enter_child();
        assert!(scopes.assign("n", Value::Number(2.0)));
        scopes.leave(frame);
        assert_eq!(scopes.lookup("n"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn assign_undefined_fails() {
        let mut scopes = Scopes::new();
        assert!(!scopes.assign("missing", Value::Null));
    }

    #[test]
    fn shadowing_keeps_outer_value() {
        let mut scopes = Scopes::new();
        scopes.define("v", Value::Number(1.0));
        let frame = scopes.enter_child();
        scopes.define("v", Value::Number(2.0));
        assert_eq!(scopes.lookup("v"), Some(&Value::Number(2.0)));
        scopes.leave(frame);
        assert_eq!(scopes.lookup("v"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn root_parented_scope_skips_caller_locals() {
        let mut scopes = Scopes::new();
        let outer = scopes.enter_child();
        scopes.define("local", Value::Number(1.0));
        let call = scopes.enter(Scopes::ROOT);
        assert_eq!(scopes.lookup("local"), None);
        scopes.leave(call);
        assert_eq!(scopes.lookup("local"), Some(&Value::Number(1.0)));
        scopes.leave(outer);
    }
}
