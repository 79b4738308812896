use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::font::Font;
use crate::runtime::scope::Scope;
use crate::syntax::ast::FnDef;
use crate::types::image::PImage;

pub type Array = Rc<RefCell<Vec<Value>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Array),
    Object(Rc<RefCell<Object>>),
    Function(Rc<Closure>),
    /// A built-in function, looked up by name at call time.
    Native(String),
    /// Arity dispatch table installed by `addMethod`.
    Method(Rc<RefCell<Vec<Overload>>>),
    Image(Rc<RefCell<PImage>>),
    Font(Rc<Font>),
    Vector(Rc<RefCell<[f64; 3]>>),
    /// The sketch itself: members are the globals.
    Sketch,
}

/// An instance created by `new` on a script function.
#[derive(Debug, Default)]
pub struct Object {
    pub class: String,
    /// The class and every superclass that has been run against it.
    pub classes: Vec<String>,
    pub members: HashMap<String, Value>,
    /// Superclass nesting while the constructor chain runs.
    pub depth: usize,
    /// Constructor functions run against this object, most derived first.
    /// Their static members resolve as unqualified names inside methods.
    pub constructors: Vec<Rc<Closure>>,
}

impl Object {
    pub fn new(class: impl Into<String>) -> Self {
        let class = class.into();
        Self { classes: vec![class.clone()], class, ..Default::default() }
    }

    /// The constructor whose static table holds `name`.
    pub fn static_owner(&self, name: &str) -> Option<Rc<Closure>> {
        self.constructors.iter().find(|c| c.statics.borrow().contains_key(name)).cloned()
    }
}

pub struct Closure {
    pub def: Rc<FnDef>,
    pub scope: Rc<Scope>,
    /// `Name.field` members of a constructor function.
    pub statics: RefCell<HashMap<String, Value>>,
}

impl Closure {
    pub fn new(def: Rc<FnDef>, scope: Rc<Scope>) -> Self {
        Self { def, scope, statics: RefCell::default() }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({})", self.def.name.as_deref().unwrap_or("<anonymous>"))
    }
}

#[derive(Debug, Clone)]
pub struct Overload {
    pub arity: usize,
    pub depth: usize,
    pub func: Rc<Closure>,
}

/// Adds `func` to an arity table. An entry of the same arity registered at a
/// shallower extension depth wins over the new one.
pub fn add_overload(table: &mut Vec<Overload>, func: Rc<Closure>, depth: usize) {
    let arity = func.def.params.len();
    if table.iter().any(|o| o.arity == arity && o.depth < depth) {
        return;
    }
    table.retain(|o| o.arity != arity);
    table.push(Overload { arity, depth, func });
}

/// Latest exact arity match, else the most recently registered entry.
pub fn select_overload(table: &[Overload], argc: usize) -> Option<Rc<Closure>> {
    table.iter().rev()
        .find(|o| o.arity == argc)
        .or_else(|| table.last())
        .map(|o| o.func.clone())
}

// ─── Size limits ──────────────────────────────────────────────────────────────

/// Most elements an array may grow to, and most pixels an image or surface
/// may hold.
pub const MAX_ELEMENTS: usize = 1 << 24;

/// A script number as a length. Negative and NaN read as zero; anything above
/// [`MAX_ELEMENTS`] is an error.
pub fn checked_len(n: f64, line: usize) -> Result<usize, RuntimeError> {
    let n = if n.is_nan() { 0.0 } else { n.max(0.0) };
    if n > MAX_ELEMENTS as f64 {
        return Err(RuntimeError::new(line, format!("length {n} is larger than {MAX_ELEMENTS}")));
    }
    Ok(n as usize)
}

/// Image or surface dimensions whose area stays within [`MAX_ELEMENTS`].
pub fn checked_dims(w: f64, h: f64, line: usize) -> Result<(u32, u32), RuntimeError> {
    let (w, h) = (checked_len(w, line)?, checked_len(h, line)?);
    if w * h > MAX_ELEMENTS {
        return Err(RuntimeError::new(line, format!("{w}x{h} is larger than {MAX_ELEMENTS} pixels")));
    }
    Ok((w as u32, h as u32))
}

// ─── Conversions ──────────────────────────────────────────────────────────────

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn vector(x: f64, y: f64, z: f64) -> Self {
        Value::Vector(Rc::new(RefCell::new([x, y, z])))
    }

    pub fn image(img: PImage) -> Self {
        Value::Image(Rc::new(RefCell::new(img)))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => if *b { 1.0 } else { 0.0 },
            Value::Number(n) => *n,
            Value::Str(s) => parse_number(s),
            Value::Array(a) => {
                let a = a.borrow();
                match a.len() {
                    0 => 0.0,
                    1 => a[0].to_number(),
                    _ => f64::NAN,
                }
            }
            _ => f64::NAN,
        }
    }

    pub fn to_int32(&self) -> i32 {
        to_int32(self.to_number())
    }

    pub fn to_uint32(&self) -> u32 {
        to_int32(self.to_number()) as u32
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) | Value::Native(_) | Value::Method(_) => "function",
            _ => "object",
        }
    }

    pub fn is_callable(&self) -> bool {
        self.type_of() == "function"
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// `===`
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
            (Value::Image(a), Value::Image(b)) => Rc::ptr_eq(a, b),
            (Value::Font(a), Value::Font(b)) => Rc::ptr_eq(a, b),
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b),
            (Value::Sketch, Value::Sketch) => true,
            _ => false,
        }
    }

    /// `==`
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, _) | (_, a) if a.is_nullish() => false,
            (Value::Number(_), Value::Str(_))
            | (Value::Str(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => {
                if self.is_primitive() && other.is_primitive() {
                    self.to_number() == other.to_number()
                } else {
                    self.to_primitive().loose_eq(&other.to_primitive())
                }
            }
            (a, b) if a.is_primitive() != b.is_primitive() => {
                a.to_primitive().loose_eq(&b.to_primitive())
            }
            _ => self.strict_eq(other),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::Str(_)
        )
    }

    /// Objects compare through their string form.
    pub fn to_primitive(&self) -> Value {
        if self.is_primitive() { self.clone() } else { Value::Str(self.to_string()) }
    }
}

pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(4_294_967_296.0);
    m as u32 as i32
}

/// String → number the way the script language coerces it.
pub fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    match t {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => t.parse().unwrap_or(f64::NAN),
    }
}

/// Number → string, integers without a fraction.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        "0".into()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(a) => {
                let items: Vec<String> = a.borrow().iter()
                    .map(|v| if v.is_nullish() { String::new() } else { v.to_string() })
                    .collect();
                write!(f, "{}", items.join(","))
            }
            Value::Object(o) => match o.borrow().members.get("toString") {
                Some(Value::Str(s)) => write!(f, "{s}"),
                _ => write!(f, "[object Object]"),
            },
            Value::Function(c) => {
                write!(f, "function {}() {{ [code] }}", c.def.name.as_deref().unwrap_or(""))
            }
            Value::Native(name) => write!(f, "function {name}() {{ [native code] }}"),
            Value::Method(_) => write!(f, "function () {{ [overloaded] }}"),
            Value::Image(_) => write!(f, "[object PImage]"),
            Value::Font(font) => write!(f, "[object PFont {}]", font.name),
            Value::Vector(v) => {
                let v = v.borrow();
                write!(f, "[ {}, {}, {} ]", format_number(v[0]), format_number(v[1]), format_number(v[2]))
            }
            Value::Sketch => write!(f, "[object Processing]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_are_bounded() {
        assert_eq!(checked_len(-3.0, 1).unwrap(), 0);
        assert_eq!(checked_len(f64::NAN, 1).unwrap(), 0);
        assert_eq!(checked_len(12.7, 1).unwrap(), 12);
        assert!(checked_len(1e300, 1).is_err());
        assert!(checked_dims(4096.0, 4096.0, 1).is_ok());
        assert!(checked_dims(100_000.0, 100_000.0, 1).is_err());
    }

    #[test]
    fn numbers_print_like_script_numbers() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn string_coercion() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("0x1F"), 31.0);
        assert!(parse_number("abc").is_nan());
    }

    #[test]
    fn int32_wraps() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(-3.7), -3);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(Value::Number(1.0).loose_eq(&Value::str("1")));
        assert!(Value::Bool(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
        assert!(!Value::Number(1.0).strict_eq(&Value::str("1")));
    }

    #[test]
    fn arrays_join_with_commas() {
        let a = Value::array(vec![Value::Number(1.0), Value::Null, Value::str("x")]);
        assert_eq!(a.to_string(), "1,,x");
    }
}
