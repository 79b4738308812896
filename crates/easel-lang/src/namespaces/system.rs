//! Canvas setup, loop control, output, library imports and time.

use chrono::{Datelike, Local, Timelike};

use crate::environment::{Environment, LoopRequest};
use crate::error::RuntimeError;
use crate::runtime::value::{Value, checked_dims};
use super::constants;
use super::{Export, NamespaceProvider, check_argc, functions, num};

const CURSORS: [&str; 7] = ["default", "crosshair", "pointer", "move", "text", "wait", "none"];

pub struct SystemNamespace;

impl NamespaceProvider for SystemNamespace {
    fn name(&self) -> &'static str { "system" }

    fn exports(&self) -> Vec<Export> {
        functions(&[
            "size", "frameRate", "loop", "noLoop", "exit", "cursor", "noCursor",
            "println", "print", "Import", "millis",
            "second", "minute", "hour", "day", "month", "year",
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
            "size" => {
                check_argc(name, args, 2, line)?;
                size(env, args, line)?;
                Value::Undefined
            }
            "frameRate" => {
                check_argc(name, args, 1, line)?;
                let rate = num(args, 0);
                if rate > 0.0 {
                    env.request(LoopRequest::FrameRate(rate));
                }
                Value::Undefined
            }
            "loop" => { env.request(LoopRequest::Loop); Value::Undefined }
            "noLoop" => { env.request(LoopRequest::NoLoop); Value::Undefined }
            "exit" => { env.request(LoopRequest::Exit); Value::Undefined }
            "cursor" => {
                let mode = args.first().map_or_else(|| constants::ARROW.to_string(), Value::to_string);
                if !CURSORS.contains(&mode.as_str()) {
                    log::warn!("unknown cursor {mode:?}");
                }
                env.cursor = mode;
                Value::Undefined
            }
            "noCursor" => {
                env.cursor = constants::NOCURSOR.into();
                Value::Undefined
            }
            "println" => {
                let text = args.first().map(Value::to_string).unwrap_or_default();
                env.println(&text);
                Value::Undefined
            }
            "print" => {
                let text = args.first().map(Value::to_string).unwrap_or_default();
                env.print(&text);
                Value::Undefined
            }
            "Import" => {
                check_argc(name, args, 1, line)?;
                import(env, &args[0].to_string(), line)?;
                Value::Undefined
            }
            "millis" => Value::Number(env.millis()),
            "second" | "minute" | "hour" | "day" | "month" | "year" => {
                let now = Local::now();
                Value::Number(match name {
                    "second" => now.second() as f64,
                    "minute" => now.minute() as f64,
                    "hour" => now.hour() as f64,
                    "day" => now.day() as f64,
                    "month" => now.month() as f64,
                    _ => now.year() as f64,
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(v))
    }
}

/// `size(w, h[, mode])`. A 3D mode needs a surface that supports it.
fn size(env: &mut Environment, args: &[Value], line: usize) -> Result<(), RuntimeError> {
    let wants_3d = match args.get(2) {
        Some(Value::Str(s)) => s == constants::OPENGL,
        Some(Value::Number(n)) => *n == constants::P3D,
        _ => false,
    };
    if wants_3d {
        if !env.surface.supports_3d() {
            return Err(RuntimeError::api(line, "3D rendering context is not supported by this surface"));
        }
        env.uses_3d = true;
    }
    let (w, h) = checked_dims(num(args, 0), num(args, 1), line)?;
    log::debug!("size {w}x{h}{}", if wants_3d { " (3D)" } else { "" });
    env.surface.resize(w, h);
    env.pixels.borrow_mut().clear();
    Ok(())
}

fn import(env: &mut Environment, name: &str, line: usize) -> Result<(), RuntimeError> {
    let Some(index) = env.libraries.index_of(name) else {
        return Err(RuntimeError::api(line, format!("unknown library `{name}`")));
    };
    if !env.imported.contains(&index) {
        log::info!("imported library {name}");
        env.imported.push(index);
    }
    Ok(())
}
