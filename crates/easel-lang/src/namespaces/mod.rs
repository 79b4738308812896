use std::collections::HashMap;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::Value;

pub mod color;
pub mod constants;
pub mod core;
pub mod data;
pub mod image;
pub mod shapes;
pub mod strings;
pub mod style;
pub mod system;
pub mod text;

// ─── Export ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ExportKind { Function, Constant }

#[derive(Debug, Clone)]
pub struct Export {
    pub name: &'static str,
    pub kind: ExportKind,
}

pub fn functions(names: &[&'static str]) -> Vec<Export> {
    names.iter().map(|&name| Export { name, kind: ExportKind::Function }).collect()
}

// ─── Provider ─────────────────────────────────────────────────────────────────

/// A group of built-in functions and constants. Built-ins and imported
/// libraries implement the same trait.
pub trait NamespaceProvider {
    fn name(&self) -> &'static str;
    fn exports(&self) -> Vec<Export>;

    /// `Ok(None)` when `name` is not handled here.
    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError>;

    fn get_constant(&self, _name: &str) -> Option<Value> {
        None
    }

    fn get_export(&self, name: &str) -> Option<Export> {
        self.exports().into_iter().find(|e| e.name == name)
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct NamespaceRegistry {
    providers: Vec<Box<dyn NamespaceProvider>>,
    /// Function name → provider index. The first registration wins.
    functions: HashMap<&'static str, usize>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self { providers: Vec::new(), functions: HashMap::new() }
    }

    pub fn register(&mut self, p: Box<dyn NamespaceProvider>) {
        let index = self.providers.len();
        for e in p.exports() {
            if e.kind == ExportKind::Function {
                self.functions.entry(e.name).or_insert(index);
            }
        }
        self.providers.push(p);
    }

    pub fn get(&self, name: &str) -> Option<&dyn NamespaceProvider> {
        self.providers.iter().find(|p| p.name() == name).map(|p| p.as_ref())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn call_any(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        match self.functions.get(name) {
            Some(&i) => self.providers[i].call(name, args, env, line),
            None => Ok(None),
        }
    }

    pub fn get_constant(&self, name: &str) -> Option<Value> {
        self.providers.iter().find_map(|p| p.get_constant(name))
    }

    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register(Box::new(core::CoreNamespace));
        r.register(Box::new(color::ColorNamespace));
        r.register(Box::new(style::StyleNamespace));
        r.register(Box::new(shapes::ShapesNamespace));
        r.register(Box::new(image::ImageNamespace));
        r.register(Box::new(text::TextNamespace));
        r.register(Box::new(strings::StringsNamespace));
        r.register(Box::new(data::DataNamespace));
        r.register(Box::new(system::SystemNamespace));
        r
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self { Self::standard() }
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

/// Missing arguments read as `undefined`.
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

/// Numeric argument; missing or non-numeric arguments coerce like the script
/// language does.
pub(crate) fn num(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(f64::NAN, Value::to_number)
}

/// All arguments as numbers.
pub(crate) fn nums(args: &[Value]) -> Vec<f64> {
    args.iter().map(Value::to_number).collect()
}

pub(crate) fn check_argc(name: &str, args: &[Value], n: usize, line: usize) -> Result<(), RuntimeError> {
    if args.len() < n {
        Err(RuntimeError::new(line, format!("`{name}` expects {n} args, got {}", args.len())))
    } else {
        Ok(())
    }
}

pub(crate) fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Undefined   => "undefined",
        Value::Null        => "null",
        Value::Bool(_)     => "boolean",
        Value::Number(_)   => "number",
        Value::Str(_)      => "string",
        Value::Array(_)    => "array",
        Value::Object(_)   => "object",
        Value::Function(_) => "function",
        Value::Native(_)   => "function",
        Value::Method(_)   => "function",
        Value::Image(_)    => "PImage",
        Value::Font(_)     => "PFont",
        Value::Vector(_)   => "PVector",
        Value::Sketch      => "sketch",
    }
}

/// A session on a blank `Recorder`, for provider tests.
#[cfg(test)]
pub(crate) fn test_env(width: u32, height: u32) -> Environment {
    use std::rc::Rc;
    Environment::new(
        Box::new(crate::surface::Recorder::new(width, height)),
        Rc::new(crate::harness::ManualClock::new()),
        Rc::new(crate::library::LibraryRegistry::new()),
        Rc::new(crate::loader::MemoryLoader::new()),
        Some(1),
    )
}
