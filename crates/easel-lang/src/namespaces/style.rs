//! Fill/stroke state, drawing modes, the style stack, the matrix stack and
//! `background`.

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::Value;
use crate::types::color;
use crate::types::mat::{m3_from_affine, m3_identity};
use super::{Export, NamespaceProvider, check_argc, functions, num, nums};

pub struct StyleNamespace;

impl NamespaceProvider for StyleNamespace {
    fn name(&self) -> &'static str { "style" }

    fn exports(&self) -> Vec<Export> {
        functions(&[
            "fill", "noFill", "stroke", "noStroke", "strokeWeight", "strokeCap", "strokeJoin",
            "smooth", "noSmooth", "tint", "noTint", "rectMode", "ellipseMode", "imageMode",
            "pushStyle", "popStyle", "background",
            "pushMatrix", "popMatrix", "translate", "rotate", "scale", "resetMatrix", "applyMatrix",
        ])
    }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        match name {
            "fill" => env.style.fill = Some(env.color_of(&nums(args))),
            "noFill" => env.style.fill = None,
            "stroke" => env.style.stroke = Some(env.color_of(&nums(args))),
            "noStroke" => env.style.stroke = None,
            "strokeWeight" => {
                check_argc(name, args, 1, line)?;
                env.style.stroke_weight = num(args, 0);
            }
            "strokeCap" => {
                check_argc(name, args, 1, line)?;
                env.style.stroke_cap = args[0].to_string();
            }
            "strokeJoin" => {
                check_argc(name, args, 1, line)?;
                env.style.stroke_join = args[0].to_string();
            }
            "smooth" => env.style.smooth = true,
            "noSmooth" => env.style.smooth = false,
            "tint" => env.style.tint = Some(env.color_of(&nums(args))),
            "noTint" => env.style.tint = None,
            "rectMode" => { check_argc(name, args, 1, line)?; env.style.rect_mode = num(args, 0); }
            "ellipseMode" => { check_argc(name, args, 1, line)?; env.style.ellipse_mode = num(args, 0); }
            "imageMode" => { check_argc(name, args, 1, line)?; env.style.image_mode = num(args, 0); }
            "pushStyle" => env.push_style(),
            "popStyle" => env.pop_style(line)?,
            "background" => background(args, env),

            // ── Matrix stack ──────────────────────────────────────────────
            "pushMatrix" => env.surface.save(),
            "popMatrix" => env.surface.restore(),
            "translate" => {
                check_argc(name, args, 2, line)?;
                env.surface.translate(num(args, 0), num(args, 1));
            }
            "rotate" => {
                check_argc(name, args, 1, line)?;
                env.surface.rotate(num(args, 0));
            }
            "scale" => {
                check_argc(name, args, 1, line)?;
                let sx = num(args, 0);
                let sy = if args.len() > 1 { num(args, 1) } else { sx };
                env.surface.scale(sx, sy);
            }
            "resetMatrix" => env.surface.set_transform(m3_identity()),
            "applyMatrix" => {
                let m = match *nums(args).as_slice() {
                    [a, b, c, d, e, f] => m3_from_affine(a, b, c, d, e, f),
                    [a, b, _, c, d, e, _, f, ..] if args.len() == 16 => m3_from_affine(a, b, c, d, e, f),
                    _ => return Err(RuntimeError::new(line, "`applyMatrix` expects 6 or 16 args")),
                };
                env.surface.transform(m);
            }
            _ => return Ok(None),
        }
        Ok(Some(Value::Undefined))
    }
}

/// `background()` repaints the default gray; an image argument is drawn at
/// the origin; otherwise the arguments are a color.
fn background(args: &[Value], env: &mut Environment) {
    if let [Value::Image(img)] = args {
        let img = img.borrow();
        let (w, h) = (img.width() as f64, img.height() as f64);
        env.surface.draw_image(&img.data, 0.0, 0.0, w, h);
        return;
    }
    let c = if args.is_empty() { env.color_of(&[204.0]) } else { env.color_of(&nums(args)) };
    let (a, ..) = color::unpack(c);
    if a == 255 {
        env.surface.clear(c);
    } else {
        let saved = env.surface.current_transform();
        env.surface.set_transform(m3_identity());
        env.surface.fill_rect(0.0, 0.0, env.width(), env.height(), c);
        env.surface.set_transform(saved);
    }
}
