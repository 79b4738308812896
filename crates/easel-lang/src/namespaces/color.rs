//! Color construction, channel accessors and blending.

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::Value;
use crate::types::color::{self, BlendMode, ColorMode};
use super::{Export, NamespaceProvider, check_argc, functions, num, nums};

pub struct ColorNamespace;

impl NamespaceProvider for ColorNamespace {
    fn name(&self) -> &'static str { "color" }

    fn exports(&self) -> Vec<Export> {
        functions(&[
            "color", "DefaultColor", "red", "green", "blue", "alpha",
            "hue", "saturation", "brightness", "lerpColor", "colorMode", "blendColor",
        ])
    }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let space = env.style.color_space;
        let c = || color::from_number(num(args, 0));
        let v = match name {
            "color" => color::to_number(env.color_of(&nums(args))),
            "DefaultColor" => {
                check_argc(name, args, 3, line)?;
                color::to_number(color::default_color(num(args, 0), num(args, 1), num(args, 2)))
            }
            "red" | "green" | "blue" | "alpha" => {
                check_argc(name, args, 1, line)?;
                let (a, r, g, b) = color::unpack(c());
                let (raw, range) = match name {
                    "red" => (r, space.range[0]),
                    "green" => (g, space.range[1]),
                    "blue" => (b, space.range[2]),
                    _ => (a, space.range[3]),
                };
                if space.mode == ColorMode::Rgb || name == "alpha" {
                    raw as f64 / 255.0 * range
                } else {
                    raw as f64
                }
            }
            "hue" => { check_argc(name, args, 1, line)?; space.hue(c()) }
            "saturation" => { check_argc(name, args, 1, line)?; space.saturation(c()) }
            "brightness" => { check_argc(name, args, 1, line)?; space.brightness(c()) }
            "lerpColor" => {
                check_argc(name, args, 3, line)?;
                let to = color::from_number(num(args, 1));
                color::to_number(color::lerp_color(c(), to, num(args, 2)))
            }
            "blendColor" => {
                check_argc(name, args, 3, line)?;
                let mode = BlendMode::from_constant(num(args, 2)).ok_or_else(|| {
                    RuntimeError::api(line, format!("unknown blend mode {}", args[2]))
                })?;
                color::to_number(color::blend(c(), color::from_number(num(args, 1)), mode))
            }
            "colorMode" => {
                check_argc(name, args, 1, line)?;
                let mode = ColorMode::from_constant(num(args, 0)).ok_or_else(|| {
                    RuntimeError::api(line, format!("unknown color mode {}", args[0]))
                })?;
                env.style.color_space.set(mode, &nums(&args[1..]));
                return Ok(Some(Value::Undefined));
            }
            _ => return Ok(None),
        };
        Ok(Some(Value::Number(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::test_env;

    fn env() -> Environment {
        test_env(4, 4)
    }

    fn call(env: &mut Environment, name: &str, args: &[f64]) -> f64 {
        let args: Vec<Value> = args.iter().map(|&n| Value::Number(n)).collect();
        ColorNamespace.call(name, &args, env, 1).unwrap().unwrap().to_number()
    }

    #[test]
    fn channels_follow_rgb_ranges() {
        let mut e = env();
        let red = call(&mut e, "color", &[255.0, 0.0, 0.0]);
        assert_eq!(call(&mut e, "red", &[red]), 255.0);
        call(&mut e, "colorMode", &[1.0, 1.0]);
        assert_eq!(call(&mut e, "red", &[red]), 1.0);
        assert_eq!(call(&mut e, "green", &[red]), 0.0);
    }

    #[test]
    fn hsb_mode_builds_from_hue() {
        let mut e = env();
        call(&mut e, "colorMode", &[2.0, 360.0, 100.0, 100.0]);
        let c = call(&mut e, "color", &[120.0, 100.0, 100.0]);
        assert_eq!(color::unpack(color::from_number(c)), (255, 0, 255, 0));
    }

    #[test]
    fn unknown_color_mode_is_an_api_error() {
        let mut e = env();
        let err = ColorNamespace.call("colorMode", &[Value::Number(9.0)], &mut e, 4).unwrap_err();
        assert_eq!(err.kind, crate::error::RuntimeErrorKind::Api);
    }
}
