//! Type descriptor registry: fields and methods of built-in value types.
//!
//! The interpreter resolves `value.field` and `value.method(...)` on arrays,
//! strings, vectors and images through `get_field` / `set_field` /
//! `call_method`. Adding a method to a built-in type means adding one
//! descriptor here; the interpreter needs no edits.

use std::collections::HashMap;

use crate::error::RuntimeError;
use crate::runtime::value::{Array, Value, checked_len, to_int32};
use crate::types::color;
use crate::types::image::PImage;

// ─── Function pointer aliases ─────────────────────────────────────────────────

/// Read a field from a value. Caller guarantees `v` is the right variant.
pub type FieldGetter = fn(&Value) -> Value;

/// Store a field. Shared values are updated in place and returned.
pub type FieldSetter = fn(Value, Value, usize) -> Result<Value, RuntimeError>;

/// Call a method on a receiver with pre-evaluated args.
pub type MethodFn = fn(&Value, &[Value], usize) -> Result<Value, RuntimeError>;

// ─── Descriptors ──────────────────────────────────────────────────────────────

pub struct FieldDesc {
    pub name: &'static str,
    pub get:  FieldGetter,
    /// None means the field is read-only.
    pub set:  Option<FieldSetter>,
}

pub struct MethodDesc {
    pub name: &'static str,
    pub call: MethodFn,
}

pub struct TypeDesc {
    pub name:    &'static str,
    pub fields:  Vec<FieldDesc>,
    pub methods: Vec<MethodDesc>,
}

fn method(name: &'static str, call: MethodFn) -> MethodDesc {
    MethodDesc { name, call }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct TypeRegistry {
    types: HashMap<&'static str, TypeDesc>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self { types: HashMap::new() }
    }

    pub fn register(&mut self, desc: TypeDesc) {
        self.types.insert(desc.name, desc);
    }

    /// Get the value of `field` from `v`.
    /// Returns None if the type or field isn't registered.
    pub fn get_field(&self, v: &Value, field: &str) -> Option<Value> {
        let key = value_type_key(v);
        self.types.get(key)?
            .fields.iter()
            .find(|f| f.name == field)
            .map(|f| (f.get)(v))
    }

    /// Returns None if the type/field isn't registered or the field is read-only.
    pub fn set_field(&self, v: Value, field: &str, new_val: Value, line: usize) -> Option<Result<Value, RuntimeError>> {
        let key = value_type_key(&v);
        let setter = self.types.get(key)?
            .fields.iter()
            .find(|f| f.name == field)?
            .set?;
        Some(setter(v, new_val, line))
    }

    pub fn has_method(&self, recv: &Value, method: &str) -> bool {
        self.types.get(value_type_key(recv))
            .is_some_and(|t| t.methods.iter().any(|m| m.name == method))
    }

    /// Call `method` on `recv` with pre-evaluated `args`. Methods take a
    /// variable number of arguments; missing ones read as `undefined`.
    /// Returns None if the type or method isn't registered.
    pub fn call_method(
        &self,
        recv:   &Value,
        method: &str,
        args:   &[Value],
        line:   usize,
    ) -> Option<Result<Value, RuntimeError>> {
        let key = value_type_key(recv);
        self.types.get(key)?
            .methods.iter()
            .find(|m| m.name == method)
            .map(|m| (m.call)(recv, args, line))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        r.register(array_desc());
        r.register(string_desc());
        r.register(vector_desc());
        r.register(image_desc());
        r
    }
}

// ─── Type key ─────────────────────────────────────────────────────────────────

/// Map a Value to its type registry key. Returns "" for values without
/// registered descriptors (objects and functions are handled by the
/// interpreter).
pub fn value_type_key(v: &Value) -> &'static str {
    match v {
        Value::Array(_)  => "array",
        Value::Str(_)    => "string",
        Value::Vector(_) => "PVector",
        Value::Image(_)  => "PImage",
        _                => "",
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn num(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(f64::NAN, Value::to_number)
}

fn index(args: &[Value], i: usize) -> i64 {
    to_int32(num(args, i)) as i64
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

fn items(v: &Value) -> &Array {
    let Value::Array(a) = v else { unreachable!() };
    a
}

fn text(v: &Value) -> &str {
    let Value::Str(s) = v else { unreachable!() };
    s
}

fn out_of_bounds(line: usize, i: i64, len: usize) -> RuntimeError {
    RuntimeError::new(line, format!("index {i} out of bounds for length {len}"))
}

// ─── array / ArrayList ────────────────────────────────────────────────────────

fn array_desc() -> TypeDesc {
    TypeDesc {
        name: "array",
        fields: vec![
            FieldDesc {
                name: "length",
                get:  |v| Value::Number(items(v).borrow().len() as f64),
                set:  Some(|v, n, line| {
                    let len = checked_len(n.to_number(), line)?;
                    items(&v).borrow_mut().resize(len, Value::Undefined);
                    Ok(v)
                }),
            },
        ],
        methods: vec![
            method("size", |v, _, _| Ok(Value::Number(items(v).borrow().len() as f64))),
            method("get", |v, args, line| {
                let a = items(v).borrow();
                let i = index(args, 0);
                usize::try_from(i).ok()
                    .and_then(|i| a.get(i).cloned())
                    .ok_or_else(|| out_of_bounds(line, i, a.len()))
            }),
            method("set", |v, args, line| {
                let mut a = items(v).borrow_mut();
                let i = index(args, 0);
                let len = a.len();
                let slot = usize::try_from(i).ok()
                    .and_then(|i| a.get_mut(i))
                    .ok_or_else(|| out_of_bounds(line, i, len))?;
                Ok(std::mem::replace(slot, arg(args, 1)))
            }),
            // add(item) appends, add(index, item) inserts.
            method("add", |v, args, line| {
                let mut a = items(v).borrow_mut();
                if args.len() >= 2 {
                    let i = index(args, 0);
                    let at = usize::try_from(i).ok()
                        .filter(|&at| at <= a.len())
                        .ok_or_else(|| out_of_bounds(line, i, a.len()))?;
                    a.insert(at, args[1].clone());
                } else {
                    a.push(arg(args, 0));
                }
                Ok(Value::Bool(true))
            }),
            method("push", |v, args, _| {
                let mut a = items(v).borrow_mut();
                a.extend(args.iter().cloned());
                Ok(Value::Number(a.len() as f64))
            }),
            method("pop", |v, _, _| Ok(items(v).borrow_mut().pop().unwrap_or(Value::Undefined))),
            method("clear", |v, _, _| {
                items(v).borrow_mut().clear();
                Ok(Value::Undefined)
            }),
            // remove(index) returns the removed element; remove(item) removes
            // the first match.
            method("remove", |v, args, _| {
                let mut a = items(v).borrow_mut();
                match args.first() {
                    Some(Value::Number(n)) => {
                        let i = to_int32(*n);
                        Ok(match usize::try_from(i).ok().filter(|&i| i < a.len()) {
                            Some(i) => a.remove(i),
                            None => Value::Undefined,
                        })
                    }
                    Some(item) => {
                        let found = a.iter().position(|x| x.strict_eq(item));
                        if let Some(i) = found {
                            a.remove(i);
                        }
                        Ok(Value::Bool(found.is_some()))
                    }
                    None => Ok(Value::Undefined),
                }
            }),
            method("isEmpty", |v, _, _| Ok(Value::Bool(items(v).borrow().is_empty()))),
            method("clone", |v, _, _| Ok(Value::array(items(v).borrow().clone()))),
            method("toArray", |v, _, _| Ok(Value::array(items(v).borrow().clone()))),
            method("indexOf", |v, args, _| {
                let item = arg(args, 0);
                let pos = items(v).borrow().iter().position(|x| x.strict_eq(&item));
                Ok(Value::Number(pos.map_or(-1.0, |p| p as f64)))
            }),
            method("contains", |v, args, _| {
                let item = arg(args, 0);
                Ok(Value::Bool(items(v).borrow().iter().any(|x| x.strict_eq(&item))))
            }),
            method("join", |v, args, _| {
                let sep = args.first().map_or_else(|| ",".to_string(), Value::to_string);
                let parts: Vec<String> = items(v).borrow().iter()
                    .map(|x| if x.is_nullish() { String::new() } else { x.to_string() })
                    .collect();
                Ok(Value::Str(parts.join(&sep)))
            }),
            method("slice", |v, args, _| {
                let a = items(v).borrow();
                let len = a.len() as i64;
                let clamp = |i: i64| (if i < 0 { (len + i).max(0) } else { i.min(len) }) as usize;
                let start = clamp(if args.is_empty() { 0 } else { index(args, 0) });
                let end = match args.get(1) {
                    Some(e) if !matches!(e, Value::Undefined) => clamp(to_int32(e.to_number()) as i64),
                    _ => len as usize,
                };
                Ok(Value::array(if start < end { a[start..end].to_vec() } else { Vec::new() }))
            }),
            method("concat", |v, args, _| {
                let mut out = items(v).borrow().clone();
                for a in args {
                    match a {
                        Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                        other => out.push(other.clone()),
                    }
                }
                Ok(Value::array(out))
            }),
        ],
    }
}

// ─── string ───────────────────────────────────────────────────────────────────

/// Char index of byte offset `at` in `s`.
fn char_index(s: &str, at: usize) -> usize {
    s[..at].chars().count()
}

fn string_desc() -> TypeDesc {
    TypeDesc {
        name: "string",
        fields: vec![
            FieldDesc {
                name: "length",
                get:  |v| Value::Number(text(v).chars().count() as f64),
                set:  None,
            },
        ],
        methods: vec![
            method("length", |v, _, _| Ok(Value::Number(text(v).chars().count() as f64))),
            method("charAt", |v, args, _| {
                let c = usize::try_from(index(args, 0)).ok().and_then(|i| text(v).chars().nth(i));
                Ok(Value::Str(c.map(String::from).unwrap_or_default()))
            }),
            method("charCodeAt", |v, args, _| {
                let c = usize::try_from(index(args, 0)).ok().and_then(|i| text(v).chars().nth(i));
                Ok(Value::Number(c.map_or(f64::NAN, |c| c as u32 as f64)))
            }),
            method("indexOf", |v, args, _| {
                let s = text(v);
                let needle = arg(args, 0).to_string();
                let from = args.get(1).map_or(0, |f| f.to_number().max(0.0) as usize);
                let skip: usize = s.chars().take(from).map(char::len_utf8).sum();
                let found = s[skip..].find(&needle).map(|b| char_index(s, skip + b));
                Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
            }),
            method("substring", |v, args, _| {
                let chars: Vec<char> = text(v).chars().collect();
                let clamp = |n: f64| if n.is_nan() { 0 } else { (n.max(0.0) as usize).min(chars.len()) };
                let mut start = clamp(num(args, 0));
                let mut end = match args.get(1) {
                    Some(e) if !matches!(e, Value::Undefined) => clamp(e.to_number()),
                    _ => chars.len(),
                };
                if start > end {
                    std::mem::swap(&mut start, &mut end);
                }
                Ok(Value::Str(chars[start..end].iter().collect()))
            }),
            method("toUpperCase", |v, _, _| Ok(Value::Str(text(v).to_uppercase()))),
            method("toLowerCase", |v, _, _| Ok(Value::Str(text(v).to_lowercase()))),
            method("equals", |v, args, _| Ok(Value::Bool(arg(args, 0).to_string() == text(v)))),
            method("split", |v, args, _| {
                let s = text(v);
                let parts: Vec<Value> = match args.first() {
                    None | Some(Value::Undefined) => vec![Value::str(s)],
                    Some(d) => {
                        let delim = d.to_string();
                        if delim.is_empty() {
                            s.chars().map(|c| Value::Str(c.to_string())).collect()
                        } else {
                            s.split(delim.as_str()).map(Value::str).collect()
                        }
                    }
                };
                Ok(Value::array(parts))
            }),
            // First occurrence only.
            method("replace", |v, args, _| {
                let from = arg(args, 0).to_string();
                let to = arg(args, 1).to_string();
                Ok(Value::Str(text(v).replacen(&from, &to, 1)))
            }),
            method("trim", |v, _, _| Ok(Value::str(text(v).trim()))),
            method("startsWith", |v, args, _| Ok(Value::Bool(text(v).starts_with(&arg(args, 0).to_string())))),
            method("endsWith", |v, args, _| Ok(Value::Bool(text(v).ends_with(&arg(args, 0).to_string())))),
        ],
    }
}

// ─── PVector ──────────────────────────────────────────────────────────────────

fn components(v: &Value) -> [f64; 3] {
    let Value::Vector(p) = v else { unreachable!() };
    *p.borrow()
}

fn update(v: &Value, f: impl FnOnce(&mut [f64; 3])) {
    let Value::Vector(p) = v else { unreachable!() };
    f(&mut p.borrow_mut());
}

/// Either a vector argument or up to three numbers; missing numbers are 0.
fn operand(args: &[Value]) -> [f64; 3] {
    match args.first() {
        Some(Value::Vector(p)) => *p.borrow(),
        _ => {
            let n = |i: usize| args.get(i).map_or(0.0, Value::to_number);
            [n(0), n(1), n(2)]
        }
    }
}

fn magnitude(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn vector_desc() -> TypeDesc {
    TypeDesc {
        name: "PVector",
        fields: vec![
            FieldDesc {
                name: "x",
                get:  |v| Value::Number(components(v)[0]),
                set:  Some(|v, n, _| { update(&v, |c| c[0] = n.to_number()); Ok(v) }),
            },
            FieldDesc {
                name: "y",
                get:  |v| Value::Number(components(v)[1]),
                set:  Some(|v, n, _| { update(&v, |c| c[1] = n.to_number()); Ok(v) }),
            },
            FieldDesc {
                name: "z",
                get:  |v| Value::Number(components(v)[2]),
                set:  Some(|v, n, _| { update(&v, |c| c[2] = n.to_number()); Ok(v) }),
            },
        ],
        methods: vec![
            method("set", |v, args, _| {
                let o = operand(args);
                update(v, |c| *c = o);
                Ok(Value::Undefined)
            }),
            method("get", |v, _, _| {
                let [x, y, z] = components(v);
                Ok(Value::vector(x, y, z))
            }),
            method("mag", |v, _, _| Ok(Value::Number(magnitude(components(v))))),
            method("add", |v, args, _| {
                let o = operand(args);
                update(v, |c| (0..3).for_each(|i| c[i] += o[i]));
                Ok(Value::Undefined)
            }),
            method("sub", |v, args, _| {
                let o = operand(args);
                update(v, |c| (0..3).for_each(|i| c[i] -= o[i]));
                Ok(Value::Undefined)
            }),
            method("mult", |v, args, _| {
                let k = num(args, 0);
                update(v, |c| c.iter_mut().for_each(|x| *x *= k));
                Ok(Value::Undefined)
            }),
            method("div", |v, args, _| {
                let k = num(args, 0);
                update(v, |c| c.iter_mut().for_each(|x| *x /= k));
                Ok(Value::Undefined)
            }),
            method("dist", |v, args, _| {
                let (a, b) = (components(v), operand(args));
                Ok(Value::Number(magnitude([a[0] - b[0], a[1] - b[1], a[2] - b[2]])))
            }),
            method("dot", |v, args, _| {
                let (a, b) = (components(v), operand(args));
                Ok(Value::Number(a[0] * b[0] + a[1] * b[1] + a[2] * b[2]))
            }),
            method("cross", |v, args, _| {
                let (a, b) = (components(v), operand(args));
                Ok(Value::vector(
                    a[1] * b[2] - b[1] * a[2],
                    a[2] * b[0] - b[2] * a[0],
                    a[0] * b[1] - b[0] * a[1],
                ))
            }),
            // A zero vector is left alone.
            method("normalize", |v, _, _| {
                let m = magnitude(components(v));
                if m > 0.0 {
                    update(v, |c| c.iter_mut().for_each(|x| *x /= m));
                }
                Ok(Value::Undefined)
            }),
            method("limit", |v, args, _| {
                let max = num(args, 0);
                let m = magnitude(components(v));
                if m > max {
                    update(v, |c| c.iter_mut().for_each(|x| *x *= max / m));
                }
                Ok(Value::Undefined)
            }),
            method("heading2D", |v, _, _| {
                let [x, y, _] = components(v);
                Ok(Value::Number(y.atan2(x)))
            }),
            method("array", |v, _, _| {
                Ok(Value::array(components(v).iter().map(|&c| Value::Number(c)).collect()))
            }),
        ],
    }
}

// ─── PImage ───────────────────────────────────────────────────────────────────

fn with_image<T>(v: &Value, f: impl FnOnce(&mut PImage) -> T) -> T {
    let Value::Image(img) = v else { unreachable!() };
    f(&mut img.borrow_mut())
}

fn rect(args: &[Value], from: usize) -> [i64; 4] {
    [0, 1, 2, 3].map(|k| num(args, from + k) as i64)
}

fn image_desc() -> TypeDesc {
    TypeDesc {
        name: "PImage",
        fields: vec![
            FieldDesc {
                name: "width",
                get:  |v| with_image(v, |i| Value::Number(i.width() as f64)),
                set:  None,
            },
            FieldDesc {
                name: "height",
                get:  |v| with_image(v, |i| Value::Number(i.height() as f64)),
                set:  None,
            },
            FieldDesc {
                name: "pixels",
                get:  |v| with_image(v, |i| Value::Array(i.pixels.clone())),
                set:  None,
            },
        ],
        methods: vec![
            // get() copies, get(x, y) reads a pixel, get(x, y, w, h) copies a region.
            method("get", |v, args, _| {
                Ok(with_image(v, |img| match args.len() {
                    0 => Value::image(img.clone()),
                    1..=3 => {
                        let c = img.data.get(num(args, 0) as i64, num(args, 1) as i64);
                        Value::Number(color::to_number(c))
                    }
                    _ => {
                        let [x, y, w, h] = rect(args, 0);
                        let data = img.data.region(x, y, w.max(0) as u32, h.max(0) as u32);
                        Value::image(PImage::new(data))
                    }
                }))
            }),
            method("set", |v, args, _| {
                let c = color::from_number(num(args, 2));
                with_image(v, |img| img.data.set(num(args, 0) as i64, num(args, 1) as i64, c));
                Ok(Value::Undefined)
            }),
            method("loadPixels", |v, _, _| {
                with_image(v, |img| img.load_pixels());
                Ok(Value::Undefined)
            }),
            method("updatePixels", |v, _, _| {
                with_image(v, |img| img.update_pixels());
                Ok(Value::Undefined)
            }),
            // copy() clones; copy([src,] sx, sy, sw, sh, dx, dy, dw, dh) blits.
            method("copy", |v, args, line| {
                let (src, from) = match args.first() {
                    None => return Ok(with_image(v, |img| Value::image(img.clone()))),
                    Some(Value::Image(src)) => (src.borrow().data.clone(), 1),
                    Some(_) => (with_image(v, |img| img.data.clone()), 0),
                };
                if args.len() < from + 8 {
                    return Err(RuntimeError::new(line, "`copy` expects 8 coordinates"));
                }
                with_image(v, |img| img.blit(&src, rect(args, from), rect(args, from + 4)));
                Ok(Value::Undefined)
            }),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn call(recv: &Value, method: &str, args: &[Value]) -> Value {
        TypeRegistry::default().call_method(recv, method, args, 1).unwrap().unwrap()
    }

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn array_list_operations() {
        let list = Value::array(Vec::new());
        call(&list, "add", &[n(1.0)]);
        call(&list, "add", &[n(3.0)]);
        call(&list, "add", &[n(1.0), n(2.0)]);
        assert_eq!(list.to_string(), "1,2,3");
        assert_eq!(call(&list, "size", &[]).to_number(), 3.0);
        assert_eq!(call(&list, "remove", &[n(0.0)]).to_number(), 1.0);
        assert_eq!(call(&list, "indexOf", &[n(3.0)]).to_number(), 1.0);
        assert!(call(&list, "contains", &[n(2.0)]).truthy());
        call(&list, "clear", &[]);
        assert!(call(&list, "isEmpty", &[]).truthy());
    }

    #[test]
    fn array_get_out_of_bounds_is_an_error() {
        let list = Value::array(vec![n(1.0)]);
        let err = TypeRegistry::default().call_method(&list, "get", &[n(4.0)], 9).unwrap().unwrap_err();
        assert_eq!(err.line, 9);
    }

    #[test]
    fn length_field_truncates() {
        let r = TypeRegistry::default();
        let list = Value::array(vec![n(1.0), n(2.0), n(3.0)]);
        assert_eq!(r.get_field(&list, "length").unwrap().to_number(), 3.0);
        r.set_field(list.clone(), "length", n(1.0), 1).unwrap().unwrap();
        assert_eq!(list.to_string(), "1");
    }

    #[test]
    fn length_field_rejects_huge_values() {
        let r = TypeRegistry::default();
        let list = Value::array(vec![n(1.0)]);
        let err = r.set_field(list.clone(), "length", n(2e9), 4).unwrap().unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(list.to_string(), "1");
    }

    #[test]
    fn string_methods_count_chars() {
        let s = Value::str("héllo world");
        assert_eq!(call(&s, "charAt", &[n(1.0)]).to_string(), "é");
        assert_eq!(call(&s, "indexOf", &[Value::str("o")]).to_number(), 4.0);
        assert_eq!(call(&s, "indexOf", &[Value::str("o"), n(5.0)]).to_number(), 7.0);
        assert_eq!(call(&s, "substring", &[n(6.0)]).to_string(), "world");
        assert_eq!(call(&s, "substring", &[n(5.0), n(1.0)]).to_string(), "éllo");
        assert_eq!(call(&Value::str("a,b"), "split", &[Value::str(",")]).to_string(), "a,b");
        assert_eq!(call(&Value::str("aa"), "replace", &[Value::str("a"), Value::str("b")]).to_string(), "ba");
        assert!(call(&s, "startsWith", &[Value::str("hé")]).truthy());
        assert_eq!(TypeRegistry::default().get_field(&s, "length").unwrap().to_number(), 11.0);
    }

    #[test]
    fn vector_math_mutates_in_place() {
        let v = Value::vector(3.0, 4.0, 0.0);
        assert_approx_eq!(call(&v, "mag", &[]).to_number(), 5.0);
        call(&v, "add", &[Value::vector(1.0, 1.0, 1.0)]);
        call(&v, "mult", &[n(2.0)]);
        assert_eq!(v.to_string(), "[ 8, 10, 2 ]");
        call(&v, "normalize", &[]);
        assert_approx_eq!(call(&v, "mag", &[]).to_number(), 1.0);

        let x = Value::vector(1.0, 0.0, 0.0);
        let c = call(&x, "cross", &[Value::vector(0.0, 1.0, 0.0)]);
        assert_eq!(c.to_string(), "[ 0, 0, 1 ]");
        assert_approx_eq!(call(&Value::vector(0.0, 2.0, 0.0), "heading2D", &[]).to_number(), std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn vector_fields_write_through() {
        let r = TypeRegistry::default();
        let v = Value::vector(1.0, 2.0, 3.0);
        r.set_field(v.clone(), "y", n(9.0), 1).unwrap().unwrap();
        assert_eq!(r.get_field(&v, "y").unwrap().to_number(), 9.0);
    }

    #[test]
    fn image_pixels_and_copy() {
        let img = Value::image(PImage::blank(4, 4));
        call(&img, "set", &[n(1.0), n(1.0), n(0xffff0000u32 as f64)]);
        assert_eq!(call(&img, "get", &[n(1.0), n(1.0)]).to_uint32(), 0xffff0000);
        let copy = call(&img, "get", &[]);
        assert!(!copy.strict_eq(&img));
        let args: Vec<Value> = [1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0].map(n).to_vec();
        call(&img, "copy", &args);
        assert_eq!(call(&img, "get", &[n(3.0), n(3.0)]).to_uint32(), 0xffff0000);
        let r = TypeRegistry::default();
        assert_eq!(r.get_field(&img, "width").unwrap().to_number(), 4.0);
        assert!(r.set_field(img, "width", n(1.0), 1).is_none());
    }
}
