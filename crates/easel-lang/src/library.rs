//! Optional libraries a sketch can activate with `import(name)`.
//!
//! A library is any [`NamespaceProvider`]. The host registers libraries
//! before the sketch is built; `Import` only switches them on, so an
//! imported library's functions and constants resolve after the built-ins in
//! import order.

use std::rc::Rc;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::Value;

pub use crate::namespaces::NamespaceProvider as Library;

#[derive(Default)]
pub struct LibraryRegistry {
    libraries: Vec<Rc<dyn Library>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations under an existing name are ignored.
    pub fn register(&mut self, library: Rc<dyn Library>) {
        if self.index_of(library.name()).is_some() {
            log::warn!("library {} registered twice", library.name());
            return;
        }
        self.libraries.push(library);
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.libraries.iter().position(|l| l.name() == name)
    }

    pub fn get(&self, index: usize) -> Option<Rc<dyn Library>> {
        self.libraries.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

/// Looks `name` up as a function in the imported libraries.
pub fn exports_function(env: &Environment, name: &str) -> bool {
    env.imported.iter()
        .filter_map(|&i| env.libraries.get(i))
        .any(|l| l.get_export(name).is_some())
}

/// Calls `name` on the first imported library that handles it.
pub fn call_imported(
    env: &mut Environment,
    name: &str,
    args: &[Value],
    line: usize,
) -> Result<Option<Value>, RuntimeError> {
    let libs: Vec<Rc<dyn Library>> = env.imported.iter()
        .filter_map(|&i| env.libraries.get(i))
        .collect();
    for lib in libs {
        if let Some(v) = lib.call(name, args, env, line)? {
            return Ok(Some(v));
        }
    }
    Ok(None)
}

pub fn imported_constant(env: &Environment, name: &str) -> Option<Value> {
    env.imported.iter()
        .filter_map(|&i| env.libraries.get(i))
        .find_map(|l| l.get_constant(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{Export, functions, test_env};

    struct Tau;

    impl Library for Tau {
        fn name(&self) -> &'static str { "tau" }
        fn exports(&self) -> Vec<Export> { functions(&["half"]) }
        fn call(&self, name: &str, args: &[Value], _: &mut Environment, _: usize)
            -> Result<Option<Value>, RuntimeError>
        {
            Ok((name == "half").then(|| Value::Number(args[0].to_number() / 2.0)))
        }
        fn get_constant(&self, name: &str) -> Option<Value> {
            (name == "TAU").then_some(Value::Number(std::f64::consts::TAU))
        }
    }

    #[test]
    fn nothing_resolves_until_imported() {
        let mut registry = LibraryRegistry::new();
        registry.register(Rc::new(Tau));
        registry.register(Rc::new(Tau));
        assert_eq!(registry.len(), 1);

        let mut env = test_env(1, 1);
        env.libraries = Rc::new(registry);
        assert!(!exports_function(&env, "half"));
        assert!(imported_constant(&env, "TAU").is_none());

        env.imported.push(0);
        assert!(exports_function(&env, "half"));
        let v = call_imported(&mut env, "half", &[Value::Number(3.0)], 1).unwrap();
        assert_eq!(v.map(|v| v.to_number()), Some(1.5));
        assert!(imported_constant(&env, "TAU").is_some());
    }
}
