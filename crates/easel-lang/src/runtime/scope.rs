//! Lexical scope chain for the script engine.
//!
//! `var` declarations land in the nearest function (or global) frame. A
//! `with (receiver)` frame resolves names against the receiver's members and
//! is the explicit receiver for unqualified calls found through it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

#[derive(Debug)]
pub enum ScopeKind {
    Global,
    Function { this: Value },
    With(Value),
    /// Holds only the `catch (e)` binding.
    Catch,
}

#[derive(Debug)]
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    kind: ScopeKind,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn global() -> Rc<Self> {
        Rc::new(Self { vars: RefCell::default(), kind: ScopeKind::Global, parent: None })
    }

    pub fn child(parent: &Rc<Scope>, kind: ScopeKind) -> Rc<Self> {
        Rc::new(Self { vars: RefCell::default(), kind, parent: Some(parent.clone()) })
    }

    /// Binds `name` in this frame regardless of its kind.
    pub fn bind(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).cloned()
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// Resolves `name` along the chain. The second element is the receiver
    /// when the name came from a `with` frame.
    pub fn lookup(&self, name: &str) -> Option<(Value, Option<Value>)> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let ScopeKind::With(recv) = &s.kind {
                if let Some(v) = receiver_member(recv, name) {
                    return Some((v, Some(recv.clone())));
                }
            } else if let Some(v) = s.get_own(name) {
                return Some((v, None));
            }
            scope = s.parent.as_deref();
        }
        None
    }

    /// Overwrites an existing binding. Returns false when `name` is bound
    /// nowhere on the chain.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = Some(self);
        while let Some(s) = scope {
            match &s.kind {
                ScopeKind::With(Value::Object(obj)) => {
                    let mut obj = obj.borrow_mut();
                    if let Some(slot) = obj.members.get_mut(name) {
                        *slot = value;
                        return true;
                    }
                    if let Some(owner) = obj.static_owner(name) {
                        owner.statics.borrow_mut().insert(name.to_string(), value);
                        return true;
                    }
                }
                ScopeKind::With(_) => {}
                _ => {
                    let mut vars = s.vars.borrow_mut();
                    if let Some(slot) = vars.get_mut(name) {
                        *slot = value;
                        return true;
                    }
                }
            }
            scope = s.parent.as_deref();
        }
        false
    }

    /// `var name [= value]`. Without an initializer an existing binding keeps
    /// its value.
    pub fn declare(&self, name: &str, value: Option<Value>) {
        let target = self.frame();
        let mut vars = target.vars.borrow_mut();
        match value {
            Some(v) => { vars.insert(name.to_string(), v); }
            None => { vars.entry(name.to_string()).or_insert(Value::Undefined); }
        }
    }

    /// The nearest function or global frame.
    fn frame(&self) -> &Scope {
        let mut scope = self;
        loop {
            match (&scope.kind, scope.parent.as_deref()) {
                (ScopeKind::Global | ScopeKind::Function { .. }, _) | (_, None) => return scope,
                (_, Some(parent)) => scope = parent,
            }
        }
    }

    /// `this` of the nearest function frame; the sketch at global level.
    pub fn this(&self) -> Value {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let ScopeKind::Function { this } = &s.kind {
                return this.clone();
            }
            scope = s.parent.as_deref();
        }
        Value::Sketch
    }
}

fn receiver_member(recv: &Value, name: &str) -> Option<Value> {
    match recv {
        Value::Object(obj) => {
            let obj = obj.borrow();
            obj.members.get(name).cloned()
                .or_else(|| obj.static_owner(name).and_then(|c| c.statics.borrow().get(name).cloned()))
        }
        Value::Vector(v) => {
            let v = v.borrow();
            match name {
                "x" => Some(Value::Number(v[0])),
                "y" => Some(Value::Number(v[1])),
                "z" => Some(Value::Number(v[2])),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::value::Object;
    use std::cell::RefCell;

    #[test]
    fn var_without_initializer_keeps_value() {
        let g = Scope::global();
        g.declare("a", Some(Value::Number(3.0)));
        g.declare("a", None);
        assert_eq!(g.lookup("a").unwrap().0.to_number(), 3.0);
    }

    #[test]
    fn declare_skips_with_frames() {
        let g = Scope::global();
        let obj = Value::Object(Rc::new(RefCell::new(Object::new("P"))));
        let f = Scope::child(&g, ScopeKind::Function { this: obj.clone() });
        let w = Scope::child(&f, ScopeKind::With(obj));
        w.declare("tmp", Some(Value::Bool(true)));
        assert!(f.has_own("tmp"));
        assert!(!g.has_own("tmp"));
    }

    #[test]
    fn with_frame_reads_and_writes_members() {
        let g = Scope::global();
        let mut o = Object::new("P");
        o.members.insert("x".into(), Value::Number(1.0));
        let obj = Rc::new(RefCell::new(o));
        let w = Scope::child(&g, ScopeKind::With(Value::Object(obj.clone())));

        let (v, recv) = w.lookup("x").unwrap();
        assert_eq!(v.to_number(), 1.0);
        assert!(recv.is_some());

        assert!(w.assign("x", Value::Number(5.0)));
        assert_eq!(obj.borrow().members["x"].to_number(), 5.0);
        assert!(!w.assign("missing", Value::Null));
    }

    #[test]
    fn this_defaults_to_sketch() {
        let g = Scope::global();
        assert!(matches!(g.this(), Value::Sketch));
    }
}
