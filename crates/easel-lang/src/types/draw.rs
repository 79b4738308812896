use std::rc::Rc;

/// A point in device pixels, transforms already applied.
pub type Point = (f64, f64);

/// One flattened subpath of a fill or stroke.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subpath {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Subpath {
    pub fn starting_at(p: Point) -> Self {
        Self { points: vec![p], closed: false }
    }
}

// ─── Image data ───────────────────────────────────────────────────────────────

/// Row-major pixel buffer. Each pixel is packed `0xAARRGGBB`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, fill: u32) -> Self {
        Self { width, height, pixels: vec![fill; width as usize * height as usize] }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    /// Out-of-range reads return transparent black.
    pub fn get(&self, x: i64, y: i64) -> u32 {
        self.index(x, y).map_or(0, |i| self.pixels[i])
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, x: i64, y: i64, c: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = c;
        }
    }

    /// Copy of the `w × h` region at `(x, y)`; pixels outside are transparent.
    pub fn region(&self, x: i64, y: i64, w: u32, h: u32) -> ImageData {
        let mut out = ImageData::new(w, h, 0);
        for dy in 0..h as i64 {
            for dx in 0..w as i64 {
                out.set(dx, dy, self.get(x + dx, y + dy));
            }
        }
        out
    }

    /// Write `src` with its top-left corner at `(x, y)`.
    pub fn put(&mut self, src: &ImageData, x: i64, y: i64) {
        for sy in 0..src.height as i64 {
            for sx in 0..src.width as i64 {
                self.set(x + sx, y + sy, src.get(sx, sy));
            }
        }
    }
}

// ─── Draw commands ────────────────────────────────────────────────────────────

/// What a `Recorder` hands to the host for painting, in device pixels.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Replace everything with one color.
    Clear(u32),
    Fill { subpaths: Vec<Subpath>, color: u32 },
    Stroke { subpaths: Vec<Subpath>, color: u32, width: f64 },
    /// `corners` are top-left, top-right, bottom-right, bottom-left after the
    /// current transform.
    Image { image: Rc<ImageData>, corners: [Point; 4] },
    Text { text: String, position: Point, size: f64, color: u32 },
}
