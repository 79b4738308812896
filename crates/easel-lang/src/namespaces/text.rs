//! Fonts and text drawing.

use std::rc::Rc;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::font::{Font, FontKind, GlyphTable, PathCmd};
use crate::runtime::value::Value;
use super::constants::{self, is_center};
use super::{Export, NamespaceProvider, check_argc, functions, num};

pub struct TextNamespace;

impl NamespaceProvider for TextNamespace {
    fn name(&self) -> &'static str { "text" }

    fn exports(&self) -> Vec<Export> {
        functions(&["loadFont", "createFont", "textFont", "textSize", "textAlign", "textWidth", "text"])
    }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let v = match name {
            "loadFont" | "createFont" => {
                check_argc(name, args, 1, line)?;
                load_font(env, &args[0].to_string())
            }
            "textFont" => {
                check_argc(name, args, 1, line)?;
                env.style.text_font = match &args[0] {
                    Value::Font(f) => Some(f.clone()),
                    Value::Str(s) => Some(Rc::new(Font::native(s.as_str()))),
                    _ => None,
                };
                set_size(env, args.get(1));
                Value::Undefined
            }
            "textSize" => {
                set_size(env, args.first());
                Value::Undefined
            }
            "textAlign" => {
                check_argc(name, args, 1, line)?;
                env.style.text_align = num(args, 0);
                Value::Undefined
            }
            "textWidth" => {
                check_argc(name, args, 1, line)?;
                Value::Number(text_width(env, &args[0].to_string()))
            }
            "text" => {
                check_argc(name, args, 3, line)?;
                draw_text(env, &args[0].to_string(), num(args, 1), num(args, 2));
                Value::Undefined
            }
            _ => return Ok(None),
        };
        Ok(Some(v))
    }
}

/// Only a truthy size replaces the current one.
fn set_size(env: &mut Environment, size: Option<&Value>) {
    if let Some(v) = size.filter(|v| v.truthy()) {
        env.style.text_size = v.to_number();
    }
}

/// Names ending in `.svg` are read as glyph tables; anything else is left to
/// the surface. An unreadable SVG font yields `null`.
fn load_font(env: &Environment, name: &str) -> Value {
    if !Font::is_svg_name(name) {
        return Value::Font(Rc::new(Font::native(name)));
    }
    match env.loader.load_text(name) {
        Some(markup) => Value::Font(Rc::new(Font::svg(name, &markup))),
        None => Value::Null,
    }
}

fn text_width(env: &Environment, text: &str) -> f64 {
    let size = env.style.text_size;
    match &env.style.text_font {
        Some(font) => font.text_width(text, size, env.surface.as_ref()),
        None => env.surface.text_width(text, size),
    }
}

fn draw_text(env: &mut Environment, text: &str, mut x: f64, y: f64) {
    let align = env.style.text_align;
    if is_center(align) {
        x -= text_width(env, text) / 2.0;
    } else if align == constants::RIGHT {
        x -= text_width(env, text);
    }
    let font = env.style.text_font.clone();
    match font.as_deref() {
        Some(Font { kind: FontKind::Svg(table), .. }) => draw_glyphs(env, table, text, x, y),
        _ => {
            if let Some(c) = env.style.fill {
                let size = env.style.text_size;
                env.surface.fill_text(text, x, y, size, c);
            }
        }
    }
}

/// Glyph outlines sit on the baseline one text size below `y`, scaled from
/// font units.
fn draw_glyphs(env: &mut Environment, table: &GlyphTable, text: &str, x: f64, y: f64) {
    let size = env.style.text_size;
    let k = size / table.units_per_em;
    env.surface.save();
    env.surface.translate(x, y + size);
    env.surface.scale(k, k);
    for ch in text.chars() {
        let Some(glyph) = table.glyph(ch) else {
            log::warn!("no glyph for {ch:?}");
            env.surface.translate(table.horiz_adv_x, 0.0);
            continue;
        };
        env.surface.begin_path();
        for cmd in &glyph.path {
            match *cmd {
                PathCmd::MoveTo(px, py) => env.surface.move_to(px, py),
                PathCmd::LineTo(px, py) => env.surface.line_to(px, py),
                PathCmd::QuadTo(cx, cy, px, py) => env.surface.quadratic_to(cx, cy, px, py),
                PathCmd::Close => env.surface.close_path(),
            }
        }
        if let Some(c) = env.style.stroke {
            env.surface.stroke(c, env.style.stroke_weight);
        }
        if let Some(c) = env.style.fill {
            env.surface.fill(c);
        }
        env.surface.translate(glyph.horiz_adv_x, 0.0);
    }
    env.surface.restore();
}
