// ABOUTME: Lexically scoped environment frames with outer-chain lookup

use crate::object::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new top-level environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment frame.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Binds `name` in this frame. Used by declarations and by iteration
    /// variable binding; callers are responsible for rejecting local
    /// shadowing before calling this.
    pub fn set(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// True if `name` is already bound in this frame specifically.
    pub fn is_locally_bound(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Looks up `name` starting in this frame and walking outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Looks up `name` in this frame only, ignoring any outer frame.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Walks the outer chain and mutates the nearest frame that already
    /// binds `name`. Silently does nothing if no frame binds it — callers
    /// are expected to pre-check with `get`.
    pub fn reassign(&self, name: &str, value: Value) {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return;
        }
        if let Some(ref parent) = self.parent {
            parent.reassign(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let env = Environment::new();
        env.set("x".to_string(), Value::Integer(42));
        assert_eq!(env.get("x"), Some(Value::Integer(42)));
    }

    #[test]
    fn test_undefined_name() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.set("x".to_string(), Value::Integer(1));

        let child = Environment::with_parent(parent);
        child.set("x".to_string(), Value::Integer(2));

        assert_eq!(child.get("x"), Some(Value::Integer(2)));
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.set("x".to_string(), Value::Integer(42));

        let child = Environment::with_parent(parent);
        assert_eq!(child.get("x"), Some(Value::Integer(42)));
    }

    #[test]
    fn test_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.set("a".to_string(), Value::Integer(1));

        let parent = Environment::with_parent(grandparent);
        parent.set("b".to_string(), Value::Integer(2));

        let child = Environment::with_parent(parent);
        child.set("c".to_string(), Value::Integer(3));

        assert_eq!(child.get("a"), Some(Value::Integer(1)));
        assert_eq!(child.get("b"), Some(Value::Integer(2)));
        assert_eq!(child.get("c"), Some(Value::Integer(3)));
    }

    #[test]
    fn test_reassign_finds_nearest_binding_frame() {
        let parent = Environment::new();
        parent.set("x".to_string(), Value::Integer(1));

        let child = Environment::with_parent(parent.clone());
        child.reassign("x", Value::Integer(99));

        // Mutated in the parent frame, not shadowed locally.
        assert!(!child.is_locally_bound("x"));
        assert_eq!(parent.get("x"), Some(Value::Integer(99)));
        assert_eq!(child.get("x"), Some(Value::Integer(99)));
    }

    #[test]
    fn test_reassign_missing_name_is_silent() {
        let env = Environment::new();
        env.reassign("ghost", Value::Integer(1));
        assert!(env.get("ghost").is_none());
    }

    #[test]
    fn test_get_local_does_not_see_parent() {
        let parent = Environment::new();
        parent.set("x".to_string(), Value::Integer(1));
        let child = Environment::with_parent(parent);
        assert!(child.get_local("x").is_none());
        assert!(child.get("x").is_some());
    }
}
