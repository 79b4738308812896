//! Drawing surface abstraction and the recording implementation.
//!
//! The environment only ever talks to a `Surface`. `Recorder` flattens every
//! path into device-space polylines, keeps them as `DrawCommand`s for a host
//! to paint, and rasterizes fills and strokes into its own pixel buffer so
//! pixel reads see what was drawn.

use std::rc::Rc;

use crate::types::color::over;
use crate::types::draw::{DrawCommand, ImageData, Point, Subpath};
use crate::types::mat::{
    M3, m3_apply, m3_identity, m3_inverse, m3_mul, m3_rotate2d, m3_scale2d, m3_scale_factor,
    m3_translate2d,
};

const CUBIC_SEGMENTS: usize = 16;
const QUADRATIC_SEGMENTS: usize = 12;
/// Oldest commands are dropped past this many.
pub const MAX_COMMANDS: usize = 20_000;

// ─── Surface ──────────────────────────────────────────────────────────────────

pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn supports_3d(&self) -> bool { false }

    // Transform stack
    fn save(&mut self);
    fn restore(&mut self);
    fn current_transform(&self) -> M3;
    fn set_transform(&mut self, m: M3);
    /// Post-multiply the current transform.
    fn transform(&mut self, m: M3) {
        let t = m3_mul(&self.current_transform(), &m);
        self.set_transform(t);
    }
    fn translate(&mut self, x: f64, y: f64) { self.transform(m3_translate2d(x, y)); }
    fn rotate(&mut self, angle: f64) { self.transform(m3_rotate2d(angle)); }
    fn scale(&mut self, x: f64, y: f64) { self.transform(m3_scale2d(x, y)); }

    // Paths
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);
    fn bezier_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64);
    fn close_path(&mut self);
    fn fill(&mut self, color: u32);
    fn stroke(&mut self, color: u32, width: f64);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: u32);
    fn clear(&mut self, color: u32);

    // Pixels
    fn get_image_data(&self, x: i64, y: i64, w: u32, h: u32) -> ImageData;
    fn put_image_data(&mut self, data: &ImageData, x: i64, y: i64);
    fn draw_image(&mut self, image: &ImageData, x: f64, y: f64, w: f64, h: f64);

    // Text
    fn fill_text(&mut self, text: &str, x: f64, y: f64, size: f64, color: u32);
    fn text_width(&self, text: &str, size: f64) -> f64;

    /// Commands a host can paint. Surfaces that draw directly keep none.
    fn recorded(&self) -> &[DrawCommand] { &[] }
}

// ─── Recorder ─────────────────────────────────────────────────────────────────

pub struct Recorder {
    raster: ImageData,
    transform: M3,
    stack: Vec<M3>,
    subpaths: Vec<Subpath>,
    /// Device-space point where the next implicit subpath starts after
    /// `close_path`.
    reopen_at: Option<Point>,
    commands: Vec<DrawCommand>,
    supports_3d: bool,
}

impl Recorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: ImageData::new(width, height, 0),
            transform: m3_identity(),
            stack: Vec::new(),
            subpaths: Vec::new(),
            reopen_at: None,
            commands: Vec::new(),
            supports_3d: false,
        }
    }

    /// Claim 3D support so `size(w, h, OPENGL)` is accepted. Drawing stays 2D.
    pub fn with_3d(mut self) -> Self {
        self.supports_3d = true;
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn raster(&self) -> &ImageData {
        &self.raster
    }

    fn record(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
        if self.commands.len() > MAX_COMMANDS {
            let excess = self.commands.len() - MAX_COMMANDS;
            self.commands.drain(..excess);
        }
    }

    fn device(&self, x: f64, y: f64) -> Point {
        m3_apply(&self.transform, (x, y))
    }

    fn current(&mut self) -> &mut Subpath {
        if self.subpaths.last().is_none_or(|s| s.closed) {
            let start = self.reopen_at.take().unwrap_or((0.0, 0.0));
            self.subpaths.push(Subpath::starting_at(start));
        }
        let last = self.subpaths.len() - 1;
        &mut self.subpaths[last]
    }

    fn last_point(&self) -> Option<Point> {
        match self.subpaths.last() {
            Some(s) if !s.closed => s.points.last().copied(),
            _ => self.reopen_at,
        }
    }

    fn paint(&mut self, mask: &[bool], color: u32) {
        for (px, covered) in self.raster.pixels.iter_mut().zip(mask) {
            if *covered {
                *px = over(*px, color);
            }
        }
    }

    fn mask(&self) -> Vec<bool> {
        vec![false; self.raster.pixels.len()]
    }
}

impl Surface for Recorder {
    fn recorded(&self) -> &[DrawCommand] {
        &self.commands
    }

    fn size(&self) -> (u32, u32) {
        (self.raster.width, self.raster.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.raster = ImageData::new(width, height, 0);
        self.transform = m3_identity();
        self.stack.clear();
        self.commands.clear();
    }

    fn supports_3d(&self) -> bool {
        self.supports_3d
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn current_transform(&self) -> M3 {
        self.transform
    }

    fn set_transform(&mut self, m: M3) {
        self.transform = m;
    }

    fn begin_path(&mut self) {
        self.subpaths.clear();
        self.reopen_at = None;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.device(x, y);
        self.subpaths.push(Subpath::starting_at(p));
        self.reopen_at = None;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = self.device(x, y);
        if self.last_point().is_none() {
            self.subpaths.push(Subpath::starting_at(p));
            return;
        }
        self.current().points.push(p);
    }

    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        let Some(p0) = self.last_point() else { return self.move_to(x, y) };
        let c = self.device(cx, cy);
        let p1 = self.device(x, y);
        let pts: Vec<Point> = (1..=QUADRATIC_SEGMENTS)
            .map(|i| {
                let t = i as f64 / QUADRATIC_SEGMENTS as f64;
                let u = 1.0 - t;
                (
                    u * u * p0.0 + 2.0 * u * t * c.0 + t * t * p1.0,
                    u * u * p0.1 + 2.0 * u * t * c.1 + t * t * p1.1,
                )
            })
            .collect();
        self.current().points.extend(pts);
    }

    fn bezier_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        let Some(p0) = self.last_point() else { return self.move_to(x, y) };
        let c1 = self.device(c1x, c1y);
        let c2 = self.device(c2x, c2y);
        let p1 = self.device(x, y);
        let pts: Vec<Point> = (1..=CUBIC_SEGMENTS)
            .map(|i| {
                let t = i as f64 / CUBIC_SEGMENTS as f64;
                let u = 1.0 - t;
                let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                (
                    a * p0.0 + b * c1.0 + c * c2.0 + d * p1.0,
                    a * p0.1 + b * c1.1 + c * c2.1 + d * p1.1,
                )
            })
            .collect();
        self.current().points.extend(pts);
    }

    fn close_path(&mut self) {
        if let Some(s) = self.subpaths.last_mut().filter(|s| !s.closed) {
            s.closed = true;
            self.reopen_at = s.points.first().copied();
        }
    }

    fn fill(&mut self, color: u32) {
        let subpaths: Vec<Subpath> =
            self.subpaths.iter().filter(|s| s.points.len() > 2).cloned().collect();
        if subpaths.is_empty() {
            return;
        }
        let mut mask = self.mask();
        let polys: Vec<&[Point]> = subpaths.iter().map(|s| s.points.as_slice()).collect();
        cover_nonzero(&self.raster, &polys, &mut mask);
        self.paint(&mask, color);
        self.record(DrawCommand::Fill { subpaths, color });
    }

    fn stroke(&mut self, color: u32, width: f64) {
        let subpaths = self.subpaths.clone();
        if subpaths.is_empty() {
            return;
        }
        let width = width * m3_scale_factor(&self.transform);
        let mut mask = self.mask();
        for s in &subpaths {
            for quad in stroke_quads(s, width) {
                cover_nonzero(&self.raster, &[quad.as_slice()], &mut mask);
            }
        }
        self.paint(&mask, color);
        self.record(DrawCommand::Stroke { subpaths, color, width });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: u32) {
        let points = vec![
            self.device(x, y),
            self.device(x + w, y),
            self.device(x + w, y + h),
            self.device(x, y + h),
        ];
        let mut mask = self.mask();
        cover_nonzero(&self.raster, &[points.as_slice()], &mut mask);
        self.paint(&mask, color);
        self.record(DrawCommand::Fill { subpaths: vec![Subpath { points, closed: true }], color });
    }

    fn clear(&mut self, color: u32) {
        self.raster.pixels.fill(color);
        self.commands.clear();
        self.record(DrawCommand::Clear(color));
    }

    fn get_image_data(&self, x: i64, y: i64, w: u32, h: u32) -> ImageData {
        self.raster.region(x, y, w, h)
    }

    fn put_image_data(&mut self, data: &ImageData, x: i64, y: i64) {
        self.raster.put(data, x, y);
        let (x, y) = (x as f64, y as f64);
        let (w, h) = (data.width as f64, data.height as f64);
        self.record(DrawCommand::Image {
            image: Rc::new(data.clone()),
            corners: [(x, y), (x + w, y), (x + w, y + h), (x, y + h)],
        });
    }

    fn draw_image(&mut self, image: &ImageData, x: f64, y: f64, w: f64, h: f64) {
        if image.width == 0 || image.height == 0 || w == 0.0 || h == 0.0 {
            return;
        }
        let corners = [
            self.device(x, y),
            self.device(x + w, y),
            self.device(x + w, y + h),
            self.device(x, y + h),
        ];
        // Image space → device space, then sample back through the inverse.
        let place = m3_mul(
            &self.transform,
            &m3_mul(
                &m3_translate2d(x, y),
                &m3_scale2d(w / image.width as f64, h / image.height as f64),
            ),
        );
        if let Ok(inv) = m3_inverse(&place, 0) {
            let (x0, y0, x1, y1) = bounds(&corners, &self.raster);
            for py in y0..y1 {
                for px in x0..x1 {
                    let (u, v) = m3_apply(&inv, (px as f64 + 0.5, py as f64 + 0.5));
                    if u < 0.0 || v < 0.0 || u >= image.width as f64 || v >= image.height as f64 {
                        continue;
                    }
                    let src = image.get(u as i64, v as i64);
                    let dst = self.raster.get(px, py);
                    self.raster.set(px, py, over(dst, src));
                }
            }
        }
        self.record(DrawCommand::Image { image: Rc::new(image.clone()), corners });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, size: f64, color: u32) {
        let position = self.device(x, y);
        let size = size * m3_scale_factor(&self.transform);
        self.record(DrawCommand::Text { text: text.to_string(), position, size, color });
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * size * 0.6
    }
}

// ─── Rasterization ────────────────────────────────────────────────────────────

/// Pixel bounding box of `pts`, clipped to the raster: `(x0, y0, x1, y1)`.
fn bounds(pts: &[Point], raster: &ImageData) -> (i64, i64, i64, i64) {
    let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for &(x, y) in pts {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    (
        x0.floor().max(0.0) as i64,
        y0.floor().max(0.0) as i64,
        (x1.ceil() as i64).min(raster.width as i64),
        (y1.ceil() as i64).min(raster.height as i64),
    )
}

/// Mark every pixel whose center lies inside `polys` under the nonzero rule.
/// Each polygon is implicitly closed.
fn cover_nonzero(raster: &ImageData, polys: &[&[Point]], mask: &mut [bool]) {
    let all: Vec<Point> = polys.iter().flat_map(|p| p.iter().copied()).collect();
    if all.is_empty() {
        return;
    }
    let (x0, y0, x1, y1) = bounds(&all, raster);
    let width = raster.width as usize;
    let mut crossings: Vec<(f64, i32)> = Vec::new();

    for py in y0..y1 {
        let sy = py as f64 + 0.5;
        crossings.clear();
        for poly in polys {
            for i in 0..poly.len() {
                let (ax, ay) = poly[i];
                let (bx, by) = poly[(i + 1) % poly.len()];
                if ay == by {
                    continue;
                }
                let upward = ay < by;
                let (lo, hi) = if upward { (ay, by) } else { (by, ay) };
                if sy < lo || sy >= hi {
                    continue;
                }
                let x = ax + (sy - ay) * (bx - ax) / (by - ay);
                crossings.push((x, if upward { 1 } else { -1 }));
            }
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            let start = (pair[0].0 - 0.5).ceil().max(x0 as f64) as i64;
            let end = (pair[1].0 - 0.5).ceil().min(x1 as f64) as i64;
            for px in start..end {
                mask[py as usize * width + px as usize] = true;
            }
        }
    }
}

/// One quad per segment, `width` wide. A lone point becomes a square.
fn stroke_quads(s: &Subpath, width: f64) -> Vec<Vec<Point>> {
    let half = (width / 2.0).max(0.5);
    let mut pts = s.points.clone();
    if s.closed && pts.len() > 2 {
        pts.push(pts[0]);
    }
    let square = |(x, y): Point| {
        vec![(x - half, y - half), (x + half, y - half), (x + half, y + half), (x - half, y + half)]
    };
    if pts.len() == 1 {
        return vec![square(pts[0])];
    }
    pts.windows(2)
        .map(|seg| {
            let ((ax, ay), (bx, by)) = (seg[0], seg[1]);
            let len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
            if len == 0.0 {
                return square(seg[0]);
            }
            let (nx, ny) = (-(by - ay) / len * half, (bx - ax) / len * half);
            vec![(ax + nx, ay + ny), (bx + nx, by + ny), (bx - nx, by - ny), (ax - nx, ay - ny)]
        })
        .collect()
}
