//! Always-available built-ins: math, randomness, noise, conversions and the
//! constant table.

use rand::Rng;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::{Value, parse_number, to_int32};
use super::{Export, NamespaceProvider, arg, check_argc, constants, functions, num, nums};

pub fn core_exports() -> Vec<Export> {
    functions(&[
        // Math
        "abs", "ceil", "floor", "round", "sqrt", "sq", "pow", "exp", "log",
        "sin", "cos", "tan", "asin", "acos", "atan", "atan2",
        "degrees", "radians", "min", "max", "constrain", "dist", "lerp", "mag", "map", "norm",
        // Conversions
        "int", "float", "parseInt", "parseFloat", "byte", "boolean", "str", "char",
        // Randomness
        "random", "randomSeed", "randomGaussian", "noise", "noiseSeed",
    ])
}

// ─── CoreNamespace ────────────────────────────────────────────────────────────

pub struct CoreNamespace;

impl NamespaceProvider for CoreNamespace {
    fn name(&self) -> &'static str { "core" }
    fn exports(&self) -> Vec<Export> { core_exports() }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let x = num(args, 0);
        let v = match name {
            // ── 1-arg math ────────────────────────────────────────────────
            "abs"   => x.abs(),
            "ceil"  => x.ceil(),
            "floor" => x.floor(),
            "round" => (x + 0.5).floor(),
            "sqrt"  => x.sqrt(),
            "sq"    => x * x,
            "exp"   => x.exp(),
            "log"   => x.ln(),
            "sin"   => x.sin(),
            "cos"   => x.cos(),
            "tan"   => x.tan(),
            "asin"  => x.asin(),
            "acos"  => x.acos(),
            "atan"  => x.atan(),
            "radians" => x / 180.0 * std::f64::consts::PI,
            "degrees" => {
                let d = x * 180.0 / std::f64::consts::PI;
                if d < 0.0 { 360.0 + d } else { d }
            }

            // ── n-arg math ────────────────────────────────────────────────
            "pow"   => { check_argc(name, args, 2, line)?; x.powf(num(args, 1)) }
            "atan2" => { check_argc(name, args, 2, line)?; x.atan2(num(args, 1)) }
            "min" | "max" => extremum(name == "max", args),
            "constrain" => {
                check_argc(name, args, 3, line)?;
                x.max(num(args, 1)).min(num(args, 2))
            }
            "lerp" => {
                check_argc(name, args, 3, line)?;
                (num(args, 1) - x) * num(args, 2) + x
            }
            "norm" => {
                check_argc(name, args, 3, line)?;
                let range = num(args, 2) - num(args, 1);
                (1.0 / range) * x - (1.0 / range) * num(args, 1)
            }
            "map" => {
                check_argc(name, args, 5, line)?;
                let [v, istart, istop, ostart, ostop] = [x, num(args, 1), num(args, 2), num(args, 3), num(args, 4)];
                ostart + (ostop - ostart) * ((v - istart) / (istop - istart))
            }
            "dist" => match *nums(args).as_slice() {
                [x1, y1, x2, y2] => ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt(),
                [x1, y1, z1, x2, y2, z2] => ((x2 - x1).powi(2) + (y2 - y1).powi(2) + (z2 - z1).powi(2)).sqrt(),
                _ => return Err(RuntimeError::new(line, "`dist` expects 4 or 6 args")),
            },
            "mag" => nums(args).iter().map(|c| c * c).sum::<f64>().sqrt(),

            // ── Conversions ───────────────────────────────────────────────
            "int" => return Ok(Some(map_array(&arg(args, 0), &|v| Value::Number(to_int(v))))),
            "float" | "parseFloat" => {
                return Ok(Some(map_array(&arg(args, 0), &|v| Value::Number(parse_float(&v.to_string())))));
            }
            "parseInt" => {
                let radix = args.get(1).map_or(10, |r| r.to_number() as u32);
                parse_int(&arg(args, 0).to_string(), radix)
            }
            "byte" => {
                let v = arg(args, 0);
                return Ok(Some(if v.truthy() { v } else { Value::Number(0.0) }));
            }
            "boolean" => return Ok(Some(map_array(&arg(args, 0), &|v| Value::Bool(to_boolean(v))))),
            "str" => return Ok(Some(Value::str(arg(args, 0).to_string()))),
            "char" => {
                return Ok(Some(match arg(args, 0) {
                    Value::Number(n) => char::from_u32(n as u32).map_or(Value::Number(n), |c| Value::str(c)),
                    other => other,
                }));
            }

            // ── Randomness ────────────────────────────────────────────────
            "random" => {
                let r: f64 = env.rng.r#gen();
                match args.len() {
                    0 => r,
                    1 => r * x,
                    _ => x + r * (num(args, 1) - x),
                }
            }
            "randomSeed" => {
                use rand::SeedableRng;
                env.rng = rand_chacha::ChaCha8Rng::seed_from_u64(x as i64 as u64);
                env.gaussian_spare = None;
                return Ok(Some(Value::Undefined));
            }
            "randomGaussian" => gaussian(env),
            "noise" => match args.len() {
                1 => perlin_2d(x + env.noise_offset, x + env.noise_offset),
                2 => perlin_2d(x + env.noise_offset, num(args, 1) + env.noise_offset),
                3 => 0.0,
                _ => return Err(RuntimeError::new(line, "`noise` expects 1 to 3 args")),
            },
            "noiseSeed" => {
                env.noise_offset = (x as i64).rem_euclid(4096) as f64 * 57.0;
                return Ok(Some(Value::Undefined));
            }
            _ => return Ok(None),
        };
        Ok(Some(Value::Number(v)))
    }

    fn get_constant(&self, name: &str) -> Option<Value> {
        constants::lookup(name)
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// `min(a, b, ...)` or `min(array)`.
fn extremum(max: bool, args: &[Value]) -> f64 {
    let values: Vec<f64> = match args {
        [Value::Array(items)] => items.borrow().iter().map(Value::to_number).collect(),
        _ => nums(args),
    };
    let pick = |a: f64, b: f64| if max { a.max(b) } else { a.min(b) };
    values.into_iter().reduce(pick).unwrap_or(if max { f64::NEG_INFINITY } else { f64::INFINITY })
}

/// Applies `f` element-wise to arrays, directly to anything else.
fn map_array(v: &Value, f: &dyn Fn(&Value) -> Value) -> Value {
    match v {
        Value::Array(items) => Value::array(items.borrow().iter().map(|i| map_array(i, f)).collect()),
        other => f(other),
    }
}

fn to_int(v: &Value) -> f64 {
    match v {
        Value::Bool(b) => if *b { 1.0 } else { 0.0 },
        Value::Str(s) => parse_int(s, 10),
        other => other.to_number().floor(),
    }
}

fn to_boolean(v: &Value) -> bool {
    match v {
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::Bool(b) => *b,
        Value::Str(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Leading-integer parse: `"42px"` is 42, `"px"` is NaN.
pub(crate) fn parse_int(s: &str, radix: u32) -> f64 {
    let t = s.trim_start();
    let (neg, t) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let (radix, t) = match t.get(..2) {
        Some("0x" | "0X") if radix == 16 || radix == 10 => (16, &t[2..]),
        _ => (radix, t),
    };
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let digits: String = t.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let v = digits.chars().fold(0.0, |acc, c| acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64);
    if neg { -v } else { v }
}

/// Leading-decimal parse: `"3.5kg"` is 3.5.
pub(crate) fn parse_float(s: &str) -> f64 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end = 1;
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            b'e' | b'E' if seen_digit => {
                let mut k = end + 1;
                if matches!(bytes.get(k), Some(b'-' | b'+')) { k += 1; }
                if bytes.get(k).is_some_and(u8::is_ascii_digit) {
                    end = k;
                    while bytes.get(end).is_some_and(u8::is_ascii_digit) { end += 1; }
                }
                break;
            }
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return if t.starts_with("Infinity") { f64::INFINITY } else { f64::NAN };
    }
    parse_number(&t[..end])
}

/// Polar Box-Muller; every other call returns the cached spare.
fn gaussian(env: &mut Environment) -> f64 {
    if let Some(spare) = env.gaussian_spare.take() {
        return spare;
    }
    loop {
        let v1 = 2.0 * env.rng.r#gen::<f64>() - 1.0;
        let v2 = 2.0 * env.rng.r#gen::<f64>() - 1.0;
        let s = v1 * v1 + v2 * v2;
        if s < 1.0 && s != 0.0 {
            let m = (-2.0 * s.ln() / s).sqrt();
            env.gaussian_spare = Some(v2 * m);
            return v1 * m;
        }
    }
}

// ─── Noise ────────────────────────────────────────────────────────────────────

fn noise_gen(x: f64, y: f64) -> f64 {
    let n = to_int32(x + y * 57.0);
    let n = (n.wrapping_shl(13) ^ n) as f64;
    let v = n * (n * n * 15731.0 + 789_221.0) + 1_376_312_589.0;
    let masked = to_int32(v) & 0x7fff_ffff;
    (1.0 - masked as f64 / 1_073_741_824.0).abs()
}

fn smoothed(x: f64, y: f64) -> f64 {
    let corners = (noise_gen(x - 1.0, y - 1.0) + noise_gen(x + 1.0, y - 1.0)
        + noise_gen(x - 1.0, y + 1.0) + noise_gen(x + 1.0, y + 1.0)) / 16.0;
    let sides = (noise_gen(x - 1.0, y) + noise_gen(x + 1.0, y)
        + noise_gen(x, y - 1.0) + noise_gen(x, y + 1.0)) / 8.0;
    corners + sides + noise_gen(x, y) / 4.0
}

fn cosine_lerp(a: f64, b: f64, t: f64) -> f64 {
    let f = (1.0 - (t * std::f64::consts::PI).cos()) * 0.5;
    a * (1.0 - f) + b * f
}

fn interpolated(x: f64, y: f64) -> f64 {
    let (ix, iy) = (x.floor(), y.floor());
    let (fx, fy) = (x - ix, y - iy);
    let top = cosine_lerp(smoothed(ix, iy), smoothed(ix + 1.0, iy), fx);
    let bottom = cosine_lerp(smoothed(ix, iy + 1.0), smoothed(ix + 1.0, iy + 1.0), fx);
    cosine_lerp(top, bottom, fy)
}

/// Four octaves with persistence 0.25.
pub fn perlin_2d(x: f64, y: f64) -> f64 {
    (0..=3).map(|i| {
        let frequency = 2f64.powi(i);
        interpolated(x * frequency, y * frequency) * 0.25f64.powi(i)
    }).sum()
}
