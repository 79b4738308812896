//! Primitive shapes and vertex-built shapes.
//!
//! Every primitive paints with the current style: fill first, then stroke.
//! `beginShape`/`vertex`/`endShape` keep their state in
//! [`ShapeState`](crate::environment::ShapeState) between calls.

use std::f64::consts::PI;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::runtime::value::Value;
use super::constants::{self, is_center};
use super::{Export, NamespaceProvider, check_argc, functions, nums};

/// Control-point distance for a quarter ellipse drawn as a cubic bezier.
const KAPPA: f64 = 0.552_284_749_830_793_3;

pub struct ShapesNamespace;

impl NamespaceProvider for ShapesNamespace {
    fn name(&self) -> &'static str { "shapes" }

    fn exports(&self) -> Vec<Export> {
        functions(&[
            "point", "line", "triangle", "quad", "rect", "ellipse", "arc", "bezier", "curve",
            "beginShape", "vertex", "bezierVertex", "curveVertex", "endShape",
            "bezierPoint", "bezierTangent", "curvePoint", "curveTangent", "curveTightness",
        ])
    }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        env: &mut Environment,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let a = nums(args);
        match name {
            "point" => {
                check_argc(name, args, 2, line)?;
                point(env, a[0], a[1]);
            }
            "line" => {
                check_argc(name, args, 4, line)?;
                let a: Vec<f64> = a.iter().map(|&v| or_zero(v)).collect();
                // line(x1, y1, z1, x2, y2, z2)
                let (x2, y2) = if a.len() >= 6 { (a[3], a[4]) } else { (a[2], a[3]) };
                env.surface.begin_path();
                env.surface.move_to(a[0], a[1]);
                env.surface.line_to(x2, y2);
                stroke(env);
                env.surface.close_path();
            }
            "triangle" => {
                check_argc(name, args, 6, line)?;
                polygon(env, &[(a[0], a[1]), (a[2], a[3]), (a[4], a[5])]);
            }
            "quad" => {
                check_argc(name, args, 8, line)?;
                polygon(env, &[(a[0], a[1]), (a[2], a[3]), (a[4], a[5]), (a[6], a[7])]);
            }
            "rect" => {
                check_argc(name, args, 4, line)?;
                let radius = a.get(4).copied().filter(|r| *r > 0.0).unwrap_or(0.0);
                rect(env, a[0], a[1], a[2], a[3], radius);
            }
            "ellipse" => {
                check_argc(name, args, 4, line)?;
                ellipse(env, a[0], a[1], a[2], a[3]);
            }
            "arc" => {
                check_argc(name, args, 6, line)?;
                arc(env, a[0], a[1], a[2], a[3], a[4], a[5]);
            }
            "bezier" => {
                check_argc(name, args, 8, line)?;
                env.surface.begin_path();
                env.surface.move_to(a[0], a[1]);
                env.surface.bezier_to(a[2], a[3], a[4], a[5], a[6], a[7]);
                stroke(env);
                env.surface.close_path();
            }
            "curve" => {
                check_argc(name, args, 8, line)?;
                env.shape.kind = 0.0;
                env.shape.count = 0;
                env.shape.curve_points.clear();
                for p in a.chunks_exact(2).take(4) {
                    curve_vertex(env, p[0], p[1]);
                }
                end_shape(env, false);
            }

            "beginShape" => {
                env.shape.kind = a.first().copied().filter(|k| !k.is_nan()).unwrap_or(0.0);
                env.shape.count = 0;
                env.shape.curve_points.clear();
            }
            "vertex" | "bezierVertex" => {
                check_argc(name, args, 2, line)?;
                vertex(env, &a);
            }
            "curveVertex" => {
                check_argc(name, args, 2, line)?;
                curve_vertex(env, a[0], a[1]);
            }
            "endShape" => {
                let close = args.first().is_some_and(Value::truthy);
                end_shape(env, close);
            }
            "curveTightness" => {
                check_argc(name, args, 1, line)?;
                env.shape.tightness = a[0];
            }

            "bezierPoint" | "bezierTangent" | "curvePoint" | "curveTangent" => {
                check_argc(name, args, 5, line)?;
                let (p0, p1, p2, p3, t) = (a[0], a[1], a[2], a[3], a[4]);
                let v = match name {
                    "bezierPoint" => bezier_point(p0, p1, p2, p3, t),
                    "bezierTangent" => bezier_tangent(p0, p1, p2, p3, t),
                    "curvePoint" => curve_point(p0, p1, p2, p3, t),
                    _ => curve_tangent(p0, p1, p2, p3, t),
                };
                return Ok(Some(Value::Number(v)));
            }
            _ => return Ok(None),
        }
        Ok(Some(Value::Undefined))
    }
}

fn or_zero(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

fn fill(env: &mut Environment) {
    if let Some(c) = env.style.fill {
        env.surface.fill(c);
    }
}

fn stroke(env: &mut Environment) {
    if let Some(c) = env.style.stroke {
        env.surface.stroke(c, env.style.stroke_weight);
    }
}

fn paint(env: &mut Environment) {
    fill(env);
    stroke(env);
}

/// A one-pixel square in the stroke color.
fn point(env: &mut Environment, x: f64, y: f64) {
    if let Some(c) = env.style.stroke {
        env.surface.fill_rect(x.round(), y.round(), 1.0, 1.0, c);
    }
}

fn polygon(env: &mut Environment, pts: &[(f64, f64)]) {
    env.shape.kind = 0.0;
    env.shape.count = 0;
    for &(x, y) in pts {
        vertex(env, &[x, y]);
    }
    end_shape(env, false);
}

fn rect(env: &mut Environment, mut x: f64, mut y: f64, mut w: f64, mut h: f64, radius: f64) {
    let falsy = |v: f64| v == 0.0 || v.is_nan();
    if falsy(w) && falsy(h) {
        return;
    }
    let mode = env.style.rect_mode;
    if mode == constants::CORNERS {
        w -= x;
        h -= y;
    }
    if mode == constants::RADIUS {
        w *= 2.0;
        h *= 2.0;
    }
    if is_center(mode) || mode == constants::RADIUS {
        x -= w / 2.0;
        y -= h / 2.0;
    }
    let (x, y, w, h) = (x.round(), y.round(), w.round(), h.round());
    let r = radius.min(w.abs() / 2.0).min(h.abs() / 2.0);
    let s = &mut env.surface;
    s.begin_path();
    if r > 0.0 {
        s.move_to(x + r, y);
        s.line_to(x + w - r, y);
        s.quadratic_to(x + w, y, x + w, y + r);
        s.line_to(x + w, y + h - r);
        s.quadratic_to(x + w, y + h, x + w - r, y + h);
        s.line_to(x + r, y + h);
        s.quadratic_to(x, y + h, x, y + h - r);
        s.line_to(x, y + r);
        s.quadratic_to(x, y, x + r, y);
    } else {
        s.move_to(x, y);
        s.line_to(x + w, y);
        s.line_to(x + w, y + h);
        s.line_to(x, y + h);
    }
    s.close_path();
    paint(env);
    env.surface.close_path();
}

fn ellipse(env: &mut Environment, x: f64, y: f64, mut w: f64, mut h: f64) {
    let (mut x, mut y) = (or_zero(x), or_zero(y));
    if w <= 0.0 && h <= 0.0 {
        return;
    }
    let mode = env.style.ellipse_mode;
    if mode == constants::RADIUS {
        w *= 2.0;
        h *= 2.0;
    } else if mode == constants::CORNERS {
        w -= x;
        h -= y;
    }
    if mode == constants::CORNER || mode == constants::CORNERS {
        x += w / 2.0;
        y += h / 2.0;
    }
    let (rx, ry) = (w / 2.0, h / 2.0);
    let (cx, cy) = (KAPPA * rx, KAPPA * ry);
    let s = &mut env.surface;
    s.begin_path();
    s.move_to(x + rx, y);
    s.bezier_to(x + rx, y - cy, x + cx, y - ry, x, y - ry);
    s.bezier_to(x - cx, y - ry, x - rx, y - cy, x - rx, y);
    s.bezier_to(x - rx, y + cy, x - cx, y + ry, x, y + ry);
    s.bezier_to(x + cx, y + ry, x + rx, y + cy, x + rx, y);
    s.close_path();
    paint(env);
}

/// Arcs are circular: only `w` sets the radius. The outline is stroked before
/// the wedge back to the center is added for the fill.
fn arc(env: &mut Environment, mut x: f64, mut y: f64, w: f64, h: f64, start: f64, stop: f64) {
    if w <= 0.0 {
        return;
    }
    let mode = env.style.ellipse_mode;
    if mode == constants::CORNER {
        x += w / 2.0;
        y += h / 2.0;
    }
    let r = if mode == constants::CENTER_RADIUS { w } else { w / 2.0 };
    let sweep = stop - start;
    let steps = ((sweep.abs() / (PI / 32.0)).ceil() as usize).clamp(1, 256);

    env.surface.begin_path();
    env.surface.move_to(x + r * start.cos(), y + r * start.sin());
    for i in 1..=steps {
        let t = start + sweep * i as f64 / steps as f64;
        env.surface.line_to(x + r * t.cos(), y + r * t.sin());
    }
    stroke(env);
    env.surface.line_to(x, y);
    fill(env);
    env.surface.close_path();
}

// ─── Vertex shapes ────────────────────────────────────────────────────────────

fn end_shape(env: &mut Environment, close: bool) {
    if env.shape.count != 0 {
        if close || env.style.fill.is_some() {
            let (fx, fy) = env.shape.first;
            env.surface.line_to(fx, fy);
        }
        paint(env);
        env.surface.close_path();
        env.shape.count = 0;
        env.shape.path_open = false;
    }
    if env.shape.path_open {
        paint(env);
        env.surface.close_path();
        env.shape.count = 0;
        env.shape.path_open = false;
    }
}

/// Starts a fresh segment from `from` to `to` after a strip or fan has
/// emitted a finished piece.
fn restart(env: &mut Environment, from: (f64, f64), to: (f64, f64)) {
    end_shape(env, true);
    env.shape.path_open = true;
    env.surface.begin_path();
    env.surface.move_to(from.0, from.1);
    env.surface.line_to(to.0, to.1);
    env.shape.count = 1;
}

/// `vertex(x, y)` adds a corner. Four numbers add a quadratic curve whose
/// control point is the first vertex; six add a cubic bezier.
fn vertex(env: &mut Environment, a: &[f64]) {
    let (x, y) = (a[0], a[1]);
    let kind = env.shape.kind;

    if env.shape.count == 0 && kind != constants::POINTS {
        env.shape.path_open = true;
        env.surface.begin_path();
        env.surface.move_to(x, y);
        env.shape.first = (x, y);
    } else if kind == constants::POINTS {
        point(env, x, y);
    } else if a.len() <= 3 {
        let count = env.shape.count;
        let prev = env.shape.prev;
        if kind != constants::QUAD_STRIP || count != 2 {
            env.surface.line_to(x, y);
        }
        if kind == constants::TRIANGLE_STRIP {
            if count == 2 {
                restart(env, prev, (x, y));
            }
            env.shape.first = prev;
        }
        if kind == constants::TRIANGLE_FAN && count == 2 {
            let first = env.shape.first;
            restart(env, first, (x, y));
        }
        if kind == constants::QUAD_STRIP && count == 3 {
            env.surface.line_to(prev.0, prev.1);
            restart(env, prev, (x, y));
        }
        if kind == constants::QUAD_STRIP {
            env.shape.first = env.shape.second;
            env.shape.second = prev;
        }
    } else if a.len() < 6 {
        if env.shape.count > 1 {
            let (px, py) = env.shape.prev;
            let (fx, fy) = env.shape.first;
            env.surface.move_to(px, py);
            env.surface.quadratic_to(fx, fy, x, y);
            env.shape.count = 1;
        }
    } else {
        env.surface.bezier_to(a[0], a[1], a[2], a[3], a[4], a[5]);
    }

    env.shape.prev = (x, y);
    env.shape.count += 1;

    let n = env.shape.count;
    if (kind == constants::LINES && n == 2)
        || (kind == constants::TRIANGLES && n == 3)
        || (kind == constants::QUADS && n == 4)
    {
        end_shape(env, true);
    }
}

/// Catmull-Rom vertex. Nothing is drawn until four points are known; each
/// later point draws the span between the middle two as a bezier.
fn curve_vertex(env: &mut Environment, x: f64, y: f64) {
    env.shape.curve_points.push((x, y));
    if env.shape.curve_points.len() < 4 {
        return;
    }
    let s = 1.0 - env.shape.tightness;
    let [p0, p1, p2, p3] = [0, 1, 2, 3].map(|i| env.shape.curve_points[i]);
    let b1 = (p1.0 + (s * p2.0 - s * p0.0) / 6.0, p1.1 + (s * p2.1 - s * p0.1) / 6.0);
    let b2 = (p2.0 + (s * p1.0 - s * p3.0) / 6.0, p2.1 + (s * p1.1 - s * p3.1) / 6.0);

    if !env.shape.path_open {
        vertex(env, &[p1.0, p1.1]);
    } else {
        env.shape.count = 1;
    }
    vertex(env, &[b1.0, b1.1, b2.0, b2.1, p2.0, p2.1]);
    env.shape.curve_points.remove(0);
}

// ─── Curve evaluation ─────────────────────────────────────────────────────────

pub fn bezier_point(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * a + 3.0 * u * u * t * b + 3.0 * u * t * t * c + t * t * t * d
}

pub fn bezier_tangent(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
    3.0 * t * t * (-a + 3.0 * b - 3.0 * c + d) + 6.0 * t * (a - 2.0 * b + c) + 3.0 * (-a + b)
}

pub fn curve_point(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
    0.5 * ((2.0 * b)
        + (-a + c) * t
        + (2.0 * a - 5.0 * b + 4.0 * c - d) * t * t
        + (-a + 3.0 * b - 3.0 * c + d) * t * t * t)
}

pub fn curve_tangent(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
    0.5 * ((-a + c)
        + 2.0 * (2.0 * a - 5.0 * b + 4.0 * c - d) * t
        + 3.0 * (-a + 3.0 * b - 3.0 * c + d) * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::test_env;
    use crate::types::color;
    use assert_approx_eq::assert_approx_eq;

    const RED: u32 = 0xffff_0000;
    const BLACK: u32 = 0xff00_0000;

    fn call(env: &mut Environment, name: &str, args: &[f64]) {
        let args: Vec<Value> = args.iter().map(|&n| Value::Number(n)).collect();
        ShapesNamespace.call(name, &args, env, 1).unwrap();
    }

    fn setup() -> Environment {
        let mut e = test_env(20, 20);
        e.surface.clear(BLACK);
        e.style.fill = Some(RED);
        e.style.stroke = None;
        e
    }

    #[test]
    fn rect_modes_place_the_same_square() {
        for (mode, args) in [
            (constants::CORNER, [4.0, 4.0, 4.0, 4.0]),
            (constants::CORNERS, [4.0, 4.0, 8.0, 8.0]),
            (constants::CENTER, [6.0, 6.0, 4.0, 4.0]),
            (constants::RADIUS, [6.0, 6.0, 2.0, 2.0]),
        ] {
            let mut e = setup();
            e.style.rect_mode = mode;
            call(&mut e, "rect", &args);
            let img = e.surface.get_image_data(0, 0, 20, 20);
            assert_eq!(img.get(5, 5), RED, "mode {mode}");
            assert_eq!(img.get(8, 8), BLACK, "mode {mode}");
            assert_eq!(img.get(3, 3), BLACK, "mode {mode}");
        }
    }

    #[test]
    fn rounded_rect_leaves_corners_empty() {
        let mut e = setup();
        call(&mut e, "rect", &[2.0, 2.0, 12.0, 12.0, 5.0]);
        let img = e.surface.get_image_data(0, 0, 20, 20);
        assert_eq!(img.get(2, 2), BLACK);
        assert_eq!(img.get(8, 8), RED);
        assert_eq!(img.get(8, 2), RED);
    }

    #[test]
    fn zero_sized_rect_draws_nothing() {
        let mut e = setup();
        call(&mut e, "rect", &[2.0, 2.0, 0.0, 0.0]);
        assert!(e.surface.get_image_data(0, 0, 20, 20).pixels.iter().all(|&p| p == BLACK));
    }

    #[test]
    fn ellipse_fills_its_center_only() {
        let mut e = setup();
        call(&mut e, "ellipse", &[10.0, 10.0, 10.0, 10.0]);
        let img = e.surface.get_image_data(0, 0, 20, 20);
        assert_eq!(img.get(10, 10), RED);
        assert_eq!(img.get(5, 5), BLACK);
        assert_eq!(img.get(1, 10), BLACK);
    }

    #[test]
    fn triangles_close_after_three_vertices() {
        let mut e = setup();
        call(&mut e, "beginShape", &[constants::TRIANGLES]);
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (19.0, 10.0)] {
            call(&mut e, "vertex", &[x, y]);
        }
        assert_eq!(e.shape.count, 2);
        call(&mut e, "endShape", &[]);
        assert_eq!(e.shape.count, 0);
        assert!(!e.shape.path_open);
        let img = e.surface.get_image_data(0, 0, 20, 20);
        assert_eq!(img.get(2, 2), RED);
    }

    #[test]
    fn points_mode_uses_stroke_color() {
        let mut e = setup();
        e.style.stroke = Some(color::pack(255, 0, 255, 0));
        call(&mut e, "beginShape", &[constants::POINTS]);
        call(&mut e, "vertex", &[3.0, 3.0]);
        call(&mut e, "vertex", &[7.2, 6.8]);
        call(&mut e, "endShape", &[]);
        let img = e.surface.get_image_data(0, 0, 20, 20);
        assert_eq!(img.get(7, 7), color::pack(255, 0, 255, 0));
    }

    #[test]
    fn curve_vertex_waits_for_four_points() {
        let mut e = test_env(20, 20);
        e.style.fill = None;
        call(&mut e, "beginShape", &[]);
        for (x, y) in [(0.0, 0.0), (5.0, 5.0), (10.0, 5.0)] {
            call(&mut e, "curveVertex", &[x, y]);
        }
        assert!(!e.shape.path_open);
        call(&mut e, "curveVertex", &[15.0, 0.0]);
        assert!(e.shape.path_open);
        assert_eq!(e.shape.curve_points.len(), 3);
        call(&mut e, "endShape", &[]);
    }

    #[test]
    fn line_uses_stroke_even_without_fill() {
        let mut e = test_env(10, 10);
        e.surface.clear(0xffff_ffff);
        e.style.fill = None;
        call(&mut e, "line", &[0.0, 5.5, 10.0, 5.5]);
        let img = e.surface.get_image_data(0, 0, 10, 10);
        assert_eq!(img.get(5, 5), BLACK);
        assert_eq!(img.get(5, 1), 0xffff_ffff);
    }

    #[test]
    fn curve_math() {
        assert_approx_eq!(bezier_point(0.0, 0.0, 10.0, 10.0, 0.5), 5.0);
        assert_approx_eq!(curve_point(0.0, 1.0, 2.0, 3.0, 0.5), 1.5);
        assert_approx_eq!(curve_tangent(0.0, 1.0, 2.0, 3.0, 0.0), 1.0);
        assert_approx_eq!(bezier_tangent(0.0, 0.0, 10.0, 10.0, 0.5), 15.0);
    }
}
