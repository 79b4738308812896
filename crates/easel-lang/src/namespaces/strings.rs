//! Number formatting, radix conversion and string utilities.

use regex::Regex;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::{Value, format_number};
use super::{Export, NamespaceProvider, check_argc, functions, num};

pub struct StringsNamespace;

impl NamespaceProvider for StringsNamespace {
    fn name(&self) -> &'static str { "strings" }

    fn exports(&self) -> Vec<Export> {
        functions(&[
            "nf", "nfs", "nfp", "nfc", "hex", "unhex", "binary", "unbinary",
            "trim", "split", "splitTokens", "join", "match", "matchAll", "loadStrings",
        ])
    }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let v = match name {
            "nf" | "nfs" | "nfp" => {
                check_argc(name, args, 2, line)?;
                let left = num(args, 1).max(0.0) as usize;
                let right = args.get(2).map_or(0, |r| r.to_number().max(0.0) as usize);
                let positive = match name {
                    "nfs" => " ",
                    "nfp" => "+",
                    _ => "",
                };
                map_numbers(&args[0], &|n| {
                    let sign = if n < 0.0 { "-" } else { positive };
                    format!("{sign}{}", pad_digits(n.abs(), left, right))
                })
            }
            "nfc" => {
                check_argc(name, args, 1, line)?;
                let right = args.get(1).map(|r| r.to_number().max(0.0) as usize);
                map_numbers(&args[0], &|n| group_thousands(n, right))
            }
            "hex" => {
                check_argc(name, args, 1, line)?;
                let digits = args.get(1).map(|d| d.to_number().max(0.0) as usize);
                Value::Str(hex(&args[0], digits, line)?)
            }
            "unhex" => {
                check_argc(name, args, 1, line)?;
                Value::Number(unhex(&args[0].to_string()))
            }
            "binary" => {
                check_argc(name, args, 1, line)?;
                let (bits, width) = match &args[0] {
                    Value::Str(s) => (s.chars().next().map_or(0, |c| c as u32), 16),
                    v => (v.to_uint32(), 32),
                };
                let digits = args.get(1).map_or(width, |d| d.to_number().clamp(1.0, 32.0) as usize);
                let full = format!("{bits:032b}");
                Value::Str(full[32 - digits..].to_string())
            }
            "unbinary" => {
                check_argc(name, args, 1, line)?;
                Value::Number(unbinary(&args[0].to_string(), line)?)
            }
            "trim" => {
                check_argc(name, args, 1, line)?;
                map_strings(&args[0], &|s| s.trim().to_string())
            }
            "split" => {
                check_argc(name, args, 2, line)?;
                let (s, delim) = (args[0].to_string(), args[1].to_string());
                let parts: Vec<Value> = if delim.is_empty() {
                    s.chars().map(|c| Value::Str(c.to_string())).collect()
                } else {
                    s.split(delim.as_str()).map(Value::str).collect()
                };
                Value::array(parts)
            }
            "splitTokens" => {
                check_argc(name, args, 1, line)?;
                let tokens = args.get(1).map_or_else(|| "\n\t\r\x0c ".to_string(), Value::to_string);
                let s = args[0].to_string();
                Value::array(
                    s.split(|c: char| tokens.contains(c))
                        .filter(|p| !p.is_empty())
                        .map(Value::str)
                        .collect(),
                )
            }
            "join" => {
                check_argc(name, args, 2, line)?;
                let sep = args[1].to_string();
                match &args[0] {
                    Value::Array(a) => {
                        let parts: Vec<String> = a.borrow().iter().map(Value::to_string).collect();
                        Value::Str(parts.join(&sep))
                    }
                    v => Value::Str(v.to_string()),
                }
            }
            "match" => {
                check_argc(name, args, 2, line)?;
                let re = regex(&args[1], line)?;
                let s = args[0].to_string();
                re.captures(&s).map_or(Value::Null, |c| captures(&c))
            }
            "matchAll" => {
                check_argc(name, args, 2, line)?;
                let re = regex(&args[1], line)?;
                let s = args[0].to_string();
                Value::array(re.captures_iter(&s).map(|c| captures(&c)).collect())
            }
            "loadStrings" => {
                check_argc(name, args, 1, line)?;
                match env.loader.load_text(&args[0].to_string()) {
                    Some(text) => Value::array(text.split('\n').map(Value::str).collect()),
                    None => Value::Null,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(v))
    }
}

/// Applies `f` to a number, or to each element of an array.
fn map_numbers(v: &Value, f: &dyn Fn(f64) -> String) -> Value {
    match v {
        Value::Array(a) => Value::array(a.borrow().iter().map(|x| Value::Str(f(x.to_number()))).collect()),
        x => Value::Str(f(x.to_number())),
    }
}

fn map_strings(v: &Value, f: &dyn Fn(&str) -> String) -> Value {
    match v {
        Value::Array(a) => Value::array(a.borrow().iter().map(|x| Value::Str(f(&x.to_string()))).collect()),
        x => Value::Str(f(&x.to_string())),
    }
}

/// Zero-pads the integer part of a non-negative number to `left` digits and
/// the fraction to at least `right` digits. Existing fraction digits are
/// never dropped.
fn pad_digits(n: f64, left: usize, right: usize) -> String {
    let s = format_number(n);
    let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), ""));
    let mut out = format!("{int:0>left$}");
    if !frac.is_empty() || right > 0 {
        out.push('.');
        out.push_str(&format!("{frac:0<right$}"));
    }
    out
}

/// `nfc`: thousands separated by commas. With `right` the fraction is rounded
/// to that many digits.
fn group_thousands(n: f64, right: Option<usize>) -> String {
    let body = match right {
        Some(r) if r > 0 => format!("{:.r$}", n.abs()),
        Some(_) => format!("{:.0}", n.abs()),
        None => format_number(n.abs()),
    };
    let (int, frac) = body.split_once('.').map_or((body.as_str(), None), |(i, f)| (i, Some(f)));
    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if n < 0.0 { "-" } else { "" };
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Numbers become eight uppercase digits of their 32-bit pattern, or the
/// last `digits` of them. `#rrggbb` strings gain an opaque alpha byte.
fn hex(v: &Value, digits: Option<usize>, line: usize) -> Result<String, RuntimeError> {
    if let Value::Str(s) = v {
        if let Some(rest) = s.strip_prefix('#') {
            if rest.len() < 6 {
                return Err(RuntimeError::format(line, format!("`{s}` is not in #RRGGBB form")));
            }
            let mut out = rest.to_ascii_uppercase();
            while out.len() < 8 {
                out.insert_str(0, "FF");
            }
            return Ok(out);
        }
    }
    let full = format!("{:08X}", v.to_uint32());
    Ok(match digits {
        Some(d) if d < full.len() => full[full.len() - d..].to_string(),
        Some(d) => format!("{full:0>d$}"),
        None => full,
    })
}

/// Invalid digits yield 0; results wrap to a signed 32-bit integer.
fn unhex(s: &str) -> f64 {
    let mut value: u32 = 0;
    for c in s.chars() {
        let Some(d) = c.to_digit(16) else { return 0.0 };
        value = value.wrapping_mul(16).wrapping_add(d);
    }
    value as i32 as f64
}

fn unbinary(s: &str, line: usize) -> Result<f64, RuntimeError> {
    let t = s.trim();
    if t.is_empty() || t.len() > 32 || !t.chars().all(|c| c == '0' || c == '1') {
        return Err(RuntimeError::format(line, format!("`{s}` is not a binary number")));
    }
    u32::from_str_radix(t, 2)
        .map(|v| v as f64)
        .map_err(|e| RuntimeError::format(line, e.to_string()))
}

fn regex(pattern: &Value, line: usize) -> Result<Regex, RuntimeError> {
    Regex::new(&pattern.to_string()).map_err(|e| RuntimeError::format(line, e.to_string()))
}

/// Whole match followed by each group; unmatched groups are `undefined`.
fn captures(c: &regex::Captures<'_>) -> Value {
    Value::array(
        c.iter()
            .map(|m| m.map_or(Value::Undefined, |m| Value::str(m.as_str())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeErrorKind;
    use crate::loader::MemoryLoader;
    use crate::namespaces::test_env;
    use std::rc::Rc;

    fn call(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let mut e = test_env(1, 1);
        StringsNamespace.call(name, args, &mut e, 7).map(|v| v.unwrap())
    }

    fn s(name: &str, args: &[Value]) -> String {
        call(name, args).unwrap().to_string()
    }

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    #[test]
    fn fixed_width_formatting() {
        assert_eq!(s("nf", &[n(42.0), n(5.0)]), "00042");
        assert_eq!(s("nf", &[n(-7.0), n(3.0)]), "-007");
        assert_eq!(s("nfs", &[n(3.5), n(2.0), n(3.0)]), " 03.500");
        assert_eq!(s("nfs", &[n(-3.0), n(1.0), n(2.0)]), "-3.00");
        assert_eq!(s("nfp", &[n(12.0), n(3.0)]), "+012");
        assert_eq!(s("nfp", &[n(-12.0), n(3.0)]), "-012");
    }

    #[test]
    fn comma_grouping() {
        assert_eq!(s("nfc", &[n(1234567.0)]), "1,234,567");
        assert_eq!(s("nfc", &[n(-1234.5), n(2.0)]), "-1,234.50");
        assert_eq!(s("nfc", &[n(999.0)]), "999");
    }

    #[test]
    fn formatting_maps_over_arrays() {
        let arr = Value::array(vec![n(1.0), n(22.0)]);
        assert_eq!(s("nf", &[arr, n(3.0)]), "001,022");
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(s("hex", &[n(255.0)]), "000000FF");
        assert_eq!(s("hex", &[n(255.0), n(2.0)]), "FF");
        assert_eq!(s("hex", &[Value::str("#ff8000")]), "FFFF8000");
        assert_eq!(call("unhex", &[Value::str("FF")]).unwrap().to_number(), 255.0);
        assert_eq!(call("unhex", &[Value::str("FFFFFFFF")]).unwrap().to_number(), -1.0);
        assert_eq!(call("unhex", &[Value::str("zz")]).unwrap().to_number(), 0.0);
    }

    #[test]
    fn short_hex_color_is_a_format_error() {
        let err = call("hex", &[Value::str("#fff")]).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::Format);
    }

    #[test]
    fn binary_conversions() {
        assert_eq!(s("binary", &[n(5.0), n(8.0)]), "00000101");
        assert_eq!(call("unbinary", &[Value::str("00000101")]).unwrap().to_number(), 5.0);
        let err = call("unbinary", &[Value::str("10201")]).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::Format);
        assert_eq!(err.line, 7);
    }

    #[test]
    fn splitting_and_joining() {
        assert_eq!(s("split", &[Value::str("a,b,,c"), Value::str(",")]), "a,b,,c");
        let toks = call("splitTokens", &[Value::str("  a b\tc ")]).unwrap();
        let Value::Array(t) = &toks else { panic!() };
        assert_eq!(t.borrow().len(), 3);
        assert_eq!(s("join", &[toks, Value::str("-")]), "a-b-c");
        assert_eq!(s("trim", &[Value::str("  x ")]), "x");
    }

    #[test]
    fn regex_matching() {
        let m = call("match", &[Value::str("x=12"), Value::str(r"(\w)=(\d+)")]).unwrap();
        assert_eq!(m.to_string(), "x=12,x,12");
        assert!(matches!(call("match", &[Value::str("none"), Value::str(r"\d")]).unwrap(), Value::Null));
        let all = call("matchAll", &[Value::str("a1 b2"), Value::str(r"[a-z](\d)")]).unwrap();
        let Value::Array(all) = all else { panic!() };
        assert_eq!(all.borrow().len(), 2);
        assert_eq!(all.borrow()[1].to_string(), "b2,2");
    }

    #[test]
    fn load_strings_splits_lines() {
        let mut e = test_env(1, 1);
        e.loader = Rc::new(MemoryLoader::new().with("data.txt", "one\ntwo"));
        let v = StringsNamespace.call("loadStrings", &[Value::str("data.txt")], &mut e, 1).unwrap().unwrap();
        assert_eq!(v.to_string(), "one,two");
        let missing = StringsNamespace.call("loadStrings", &[Value::str("nope")], &mut e, 1).unwrap().unwrap();
        assert!(matches!(missing, Value::Null));
    }
}
