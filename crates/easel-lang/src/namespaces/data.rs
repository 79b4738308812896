//! Array utilities and the `ArrayList` and `PVector` constructors.

use std::cmp::Ordering;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::{Array, MAX_ELEMENTS, Value, checked_len, format_number};
use super::{Export, NamespaceProvider, arg, check_argc, functions, num, value_type_name};

pub struct DataNamespace;

impl NamespaceProvider for DataNamespace {
    fn name(&self) -> &'static str { "data" }

    fn exports(&self) -> Vec<Export> {
        functions(&[
            "append", "concat", "expand", "shorten", "splice", "subset", "reverse", "sort",
            "arrayCopy", "ArrayList", "PVector", "PVector.angleBetween",
        ])
    }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        _env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let v = match name {
            "append" => {
                check_argc(name, args, 2, line)?;
                let a = array(&args[0], name, line)?;
                a.borrow_mut().push(args[1].clone());
                args[0].clone()
            }
            "concat" => {
                check_argc(name, args, 2, line)?;
                let mut out = array(&args[0], name, line)?.borrow().clone();
                out.extend(array(&args[1], name, line)?.borrow().iter().cloned());
                Value::array(out)
            }
            "expand" => {
                check_argc(name, args, 1, line)?;
                let mut out = array(&args[0], name, line)?.borrow().clone();
                let size = match args.get(1) {
                    Some(n) => checked_len(n.to_number(), line)?,
                    None => checked_len((out.len() * 2) as f64, line)?,
                };
                out.resize(size, Value::Undefined);
                Value::array(out)
            }
            "shorten" => {
                check_argc(name, args, 1, line)?;
                let mut out = array(&args[0], name, line)?.borrow().clone();
                out.pop();
                Value::array(out)
            }
            "splice" => {
                check_argc(name, args, 3, line)?;
                let a = array(&args[0], name, line)?;
                let at = (num(args, 2).max(0.0) as usize).min(a.borrow().len());
                let items = match &args[1] {
                    Value::Array(v) => v.borrow().clone(),
                    v => vec![v.clone()],
                };
                a.borrow_mut().splice(at..at, items);
                args[0].clone()
            }
            "subset" => {
                check_argc(name, args, 2, line)?;
                let a = array(&args[0], name, line)?.borrow().clone();
                let start = (num(args, 1).max(0.0) as usize).min(a.len());
                let end = match args.get(2) {
                    Some(n) => start.saturating_add(n.to_number().max(0.0) as usize).min(a.len()),
                    None => a.len(),
                };
                Value::array(a[start..end].to_vec())
            }
            "reverse" => {
                check_argc(name, args, 1, line)?;
                array(&args[0], name, line)?.borrow_mut().reverse();
                args[0].clone()
            }
            "sort" => {
                check_argc(name, args, 1, line)?;
                let mut out = array(&args[0], name, line)?.borrow().clone();
                let count = args.get(1).map_or(out.len(), |n| (n.to_number().max(0.0) as usize).min(out.len()));
                out[..count].sort_by(compare);
                Value::array(out)
            }
            "arrayCopy" => {
                check_argc(name, args, 2, line)?;
                array_copy(args, line)?;
                Value::Undefined
            }
            "ArrayList" => array_list(args, line)?,
            "PVector" => Value::vector(num0(args, 0), num0(args, 1), num0(args, 2)),
            "PVector.angleBetween" => {
                check_argc(name, args, 2, line)?;
                let (a, b) = (vector(&args[0], line)?, vector(&args[1], line)?);
                let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
                let mags = length(a) * length(b);
                Value::Number((dot / mags).clamp(-1.0, 1.0).acos())
            }
            _ => return Ok(None),
        };
        Ok(Some(v))
    }
}

fn array(v: &Value, name: &str, line: usize) -> Result<Array, RuntimeError> {
    match v {
        Value::Array(a) => Ok(a.clone()),
        other => Err(RuntimeError::new(
            line,
            format!("`{name}` expects an array, got {}", value_type_name(other)),
        )),
    }
}

fn vector(v: &Value, line: usize) -> Result<[f64; 3], RuntimeError> {
    match v {
        Value::Vector(p) => Ok(*p.borrow()),
        other => Err(RuntimeError::new(line, format!("expected PVector, got {}", value_type_name(other)))),
    }
}

fn length(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Missing components are 0.
fn num0(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(0.0, Value::to_number)
}

/// Numbers sort numerically, everything else by its string form.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// A position or length argument of `arrayCopy`: a non-negative integer.
fn copy_arg(n: f64, line: usize) -> Result<usize, RuntimeError> {
    if !(n >= 0.0 && n.fract() == 0.0) {
        return Err(RuntimeError::new(line, format!("arrayCopy: {} is not a valid position or length", format_number(n))));
    }
    checked_len(n, line)
}

/// `arrayCopy(src, dst[, length])` or
/// `arrayCopy(src, srcPos, dst, dstPos, length)`.
fn array_copy(args: &[Value], line: usize) -> Result<(), RuntimeError> {
    let (src, src_pos, dst, dst_pos, len) = if args.len() >= 5 {
        let src = array(&args[0], "arrayCopy", line)?;
        let dst = array(&args[2], "arrayCopy", line)?;
        (src, copy_arg(num(args, 1), line)?, dst, copy_arg(num(args, 3), line)?, copy_arg(num(args, 4), line)?)
    } else {
        let src = array(&args[0], "arrayCopy", line)?;
        let dst = array(&args[1], "arrayCopy", line)?;
        let len = match args.get(2) {
            Some(n) => copy_arg(n.to_number(), line)?,
            None => src.borrow().len(),
        };
        (src, 0, dst, 0, len)
    };
    let items: Vec<Value> = src.borrow().iter().skip(src_pos).take(len).cloned().collect();
    let mut dst = dst.borrow_mut();
    for (i, v) in items.into_iter().enumerate() {
        let at = dst_pos.checked_add(i)
            .ok_or_else(|| RuntimeError::new(line, "arrayCopy: destination position overflows"))?;
        if at < dst.len() {
            dst[at] = v;
        } else {
            dst.push(v);
        }
    }
    Ok(())
}

/// `ArrayList(d1[, d2[, d3]])`: nested arrays of zeros. A missing or zero
/// first dimension gives an empty list. The total element count is bounded by
/// `MAX_ELEMENTS`.
fn array_list(args: &[Value], line: usize) -> Result<Value, RuntimeError> {
    let dim = |i: usize| checked_len(arg(args, i).to_number(), line);
    let (d1, d2, d3) = (dim(0)?, dim(1)?, dim(2)?);
    let total = d1.saturating_mul(d2.max(1)).saturating_mul(d3.max(1));
    if total > MAX_ELEMENTS {
        return Err(RuntimeError::new(line, format!("new array of {total} elements is larger than {MAX_ELEMENTS}")));
    }
    let zeros = |n: usize| Value::array(vec![Value::Number(0.0); n]);
    let rows = (0..d1)
        .map(|_| match (d2, d3) {
            (0, _) => Value::Number(0.0),
            (_, 0) => zeros(d2),
            _ => Value::array((0..d2).map(|_| zeros(d3)).collect()),
        })
        .collect();
    Ok(Value::array(rows))
}
