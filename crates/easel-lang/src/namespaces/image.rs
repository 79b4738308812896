//! Images and direct pixel access.

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::{Value, checked_dims};
use crate::types::color;
use crate::types::image::PImage;
use super::constants::{self, is_center};
use super::{Export, NamespaceProvider, check_argc, functions, num};

pub struct ImageNamespace;

impl NamespaceProvider for ImageNamespace {
    fn name(&self) -> &'static str { "image" }

    fn exports(&self) -> Vec<Export> {
        functions(&["loadImage", "createImage", "image", "get", "set", "loadPixels", "updatePixels"])
    }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let v = match name {
            "loadImage" => {
                check_argc(name, args, 1, line)?;
                load_image(env, &args[0].to_string())
            }
            "createImage" => {
                check_argc(name, args, 2, line)?;
                let (w, h) = checked_dims(num(args, 0), num(args, 1), line)?;
                Value::image(PImage::blank(w, h))
            }
            "image" => {
                check_argc(name, args, 3, line)?;
                draw_image(env, args);
                Value::Undefined
            }
            "get" => get(env, args),
            "set" => {
                check_argc(name, args, 3, line)?;
                let (x, y) = (num(args, 0), num(args, 1));
                if let Value::Image(_) = &args[2] {
                    draw_image(env, &[args[2].clone(), Value::Number(x), Value::Number(y)]);
                } else {
                    let c = color::from_number(num(args, 2));
                    env.surface.fill_rect(x.round(), y.round(), 1.0, 1.0, c);
                }
                Value::Undefined
            }
            "loadPixels" => {
                let (w, h) = env.surface.size();
                let data = env.surface.get_image_data(0, 0, w, h);
                let mut px = env.pixels.borrow_mut();
                px.clear();
                px.extend(data.pixels.iter().map(|&c| Value::Number(color::to_number(c))));
                Value::Undefined
            }
            "updatePixels" => {
                let (w, h) = env.surface.size();
                let mut data = env.surface.get_image_data(0, 0, w, h);
                for (slot, v) in data.pixels.iter_mut().zip(env.pixels.borrow().iter()) {
                    *slot = color::from_number(v.to_number());
                }
                env.surface.put_image_data(&data, 0, 0);
                Value::Undefined
            }
            _ => return Ok(None),
        };
        Ok(Some(v))
    }
}

/// A missing or undecodable image yields `null`.
fn load_image(env: &Environment, path: &str) -> Value {
    let Some(bytes) = env.loader.load(path) else {
        return Value::Null;
    };
    match PImage::decode(&bytes) {
        Ok(img) => {
            log::debug!("loaded image {path} ({}x{})", img.width(), img.height());
            Value::image(img)
        }
        Err(e) => {
            log::warn!("could not decode image {path}: {e}");
            Value::Null
        }
    }
}

/// `image(img, x, y[, w, h])`. Anything other than an image is ignored. The
/// tint's alpha scales the image's alpha.
fn draw_image(env: &mut Environment, args: &[Value]) {
    let Value::Image(img) = &args[0] else { return };
    let img = img.borrow();
    let or_zero = |v: f64| if v.is_nan() { 0.0 } else { v };
    let (mut x, mut y) = (or_zero(num(args, 1)), or_zero(num(args, 2)));
    let (mut w, mut h) = if args.len() >= 5 {
        (num(args, 3), num(args, 4))
    } else {
        (img.width() as f64, img.height() as f64)
    };
    let mode = env.style.image_mode;
    if mode == constants::CORNERS {
        w -= x;
        h -= y;
    } else if is_center(mode) {
        x -= w / 2.0;
        y -= h / 2.0;
    }
    match env.style.tint {
        Some(tint) => {
            let (ta, ..) = color::unpack(tint);
            let mut data = img.data.clone();
            for px in &mut data.pixels {
                let (a, r, g, b) = color::unpack(*px);
                *px = color::pack((a as u32 * ta as u32 / 255) as u8, r, g, b);
            }
            env.surface.draw_image(&data, x, y, w, h);
        }
        None => env.surface.draw_image(&img.data, x, y, w, h),
    }
}

/// `get()` copies the whole surface, `get(x, y)` reads one pixel and
/// `get(x, y, w, h)` copies a region.
fn get(env: &Environment, args: &[Value]) -> Value {
    let coord = |i: usize| num(args, i).floor() as i64;
    match args.len() {
        0 => {
            let (w, h) = env.surface.size();
            Value::image(PImage::new(env.surface.get_image_data(0, 0, w, h)))
        }
        1..=3 => {
            let c = env.surface.get_image_data(coord(0), coord(1), 1, 1).get(0, 0);
            Value::Number(color::to_number(c))
        }
        _ => {
            let (w, h) = (num(args, 2).max(0.0) as u32, num(args, 3).max(0.0) as u32);
            Value::image(PImage::new(env.surface.get_image_data(coord(0), coord(1), w, h)))
        }
    }
}
