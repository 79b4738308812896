//! Session state of one running sketch: the surface it draws on, style and
//! shape-assembly state, timing, input, randomness and printed output.

use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::RuntimeError;
use crate::font::Font;
use crate::harness::Clock;
use crate::library::LibraryRegistry;
use crate::loader::ResourceLoader;
use crate::namespaces::constants;
use crate::runtime::value::{Array, Value};
use crate::surface::Surface;
use crate::types::color::{self, ColorSpace};
use crate::types::draw::Point;

// ─── Style ────────────────────────────────────────────────────────────────────

/// Everything `pushStyle` saves and `popStyle` restores.
#[derive(Debug, Clone)]
pub struct Style {
    pub fill: Option<u32>,
    pub stroke: Option<u32>,
    pub stroke_weight: f64,
    pub stroke_cap: String,
    pub stroke_join: String,
    pub color_space: ColorSpace,
    pub rect_mode: f64,
    pub ellipse_mode: f64,
    pub image_mode: f64,
    pub tint: Option<u32>,
    pub text_font: Option<Rc<Font>>,
    pub text_size: f64,
    pub text_align: f64,
    pub smooth: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(color::pack(255, 255, 255, 255)),
            stroke: Some(color::pack(255, 0, 0, 0)),
            stroke_weight: 1.0,
            stroke_cap: "round".into(),
            stroke_join: "miter".into(),
            color_space: ColorSpace::default(),
            rect_mode: constants::CORNER,
            ellipse_mode: constants::CENTER,
            image_mode: constants::CORNER,
            tint: None,
            text_font: None,
            text_size: 12.0,
            text_align: constants::LEFT,
            smooth: false,
        }
    }
}

// ─── Shape assembly ───────────────────────────────────────────────────────────

/// State between `beginShape` and `endShape`.
#[derive(Debug, Clone, Default)]
pub struct ShapeState {
    /// Shape kind constant; 0 for a plain polygon.
    pub kind: f64,
    pub count: usize,
    pub first: Point,
    pub prev: Point,
    /// Second-to-last vertex, for quad strips.
    pub second: Point,
    pub curve_points: Vec<Point>,
    pub tightness: f64,
    pub path_open: bool,
}

// ─── Timing and input ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Timing {
    pub frame_count: u64,
    /// Measured frames per second (`FRAME_RATE`).
    pub measured_rate: f64,
    /// Requested frames per second.
    pub target_rate: f64,
    pub last_sample_ms: f64,
    pub frames_since_sample: u32,
}

#[derive(Debug, Clone)]
pub struct InputState {
    pub mouse_x: f64,
    pub mouse_y: f64,
    pub pmouse_x: f64,
    pub pmouse_y: f64,
    pub mouse_button: f64,
    pub mouse_pressed: bool,
    pub key_pressed: bool,
    pub key: Value,
    pub key_code: Value,
    pub focused: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            mouse_x: 0.0,
            mouse_y: 0.0,
            pmouse_x: 0.0,
            pmouse_y: 0.0,
            mouse_button: 0.0,
            mouse_pressed: false,
            key_pressed: false,
            key: Value::Number(0.0),
            key_code: Value::Null,
            focused: true,
        }
    }
}

/// Loop control raised by script calls, applied by the harness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopRequest {
    Loop,
    NoLoop,
    Exit,
    FrameRate(f64),
}

// ─── Environment ──────────────────────────────────────────────────────────────

pub struct Environment {
    pub surface: Box<dyn Surface>,
    pub style: Style,
    style_stack: Vec<Style>,
    pub shape: ShapeState,
    pub timing: Timing,
    pub input: InputState,
    pub rng: ChaCha8Rng,
    pub gaussian_spare: Option<f64>,
    pub noise_offset: f64,
    /// The sketch-level `pixels` array.
    pub pixels: Array,
    pub output: Vec<String>,
    print_buffer: String,
    pub libraries: Rc<LibraryRegistry>,
    /// Indices into `libraries`, in import order.
    pub imported: Vec<usize>,
    pub loader: Rc<dyn ResourceLoader>,
    pub cursor: String,
    pub uses_3d: bool,
    pub in_setup: bool,
    pub in_draw: bool,
    /// Cleared by `noLoop`.
    pub looping: bool,
    pub clock: Rc<dyn Clock>,
    pub start_ms: f64,
    requests: Vec<LoopRequest>,
}

impl Environment {
    pub fn new(
        surface: Box<dyn Surface>,
        clock: Rc<dyn Clock>,
        libraries: Rc<LibraryRegistry>,
        loader: Rc<dyn ResourceLoader>,
        seed: Option<u64>,
    ) -> Self {
        let now = clock.now_ms();
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            surface,
            style: Style::default(),
            style_stack: Vec::new(),
            shape: ShapeState::default(),
            timing: Timing {
                frame_count: 0,
                measured_rate: 0.0,
                target_rate: 60.0,
                last_sample_ms: now,
                frames_since_sample: 0,
            },
            input: InputState::default(),
            rng,
            gaussian_spare: None,
            noise_offset: 0.0,
            pixels: Rc::default(),
            output: Vec::new(),
            print_buffer: String::new(),
            libraries,
            imported: Vec::new(),
            loader,
            cursor: "default".into(),
            uses_3d: false,
            in_setup: false,
            in_draw: false,
            looping: true,
            clock,
            start_ms: now,
            requests: Vec::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.surface.size().0 as f64
    }

    pub fn height(&self) -> f64 {
        self.surface.size().1 as f64
    }

    pub fn millis(&self) -> f64 {
        (self.clock.now_ms() - self.start_ms).floor()
    }

    // ── Style stack ───────────────────────────────────────────────────────────

    pub fn push_style(&mut self) {
        self.surface.save();
        self.style_stack.push(self.style.clone());
    }

    pub fn pop_style(&mut self, line: usize) -> Result<(), RuntimeError> {
        let Some(saved) = self.style_stack.pop() else {
            return Err(RuntimeError::new(line, "Too many popStyle() without enough pushStyle()"));
        };
        self.surface.restore();
        self.style = saved;
        Ok(())
    }

    pub fn style_depth(&self) -> usize {
        self.style_stack.len()
    }

    /// Color built from script arguments in the current color mode.
    pub fn color_of(&self, args: &[f64]) -> u32 {
        self.style.color_space.color(args)
    }

    // ── Loop requests ─────────────────────────────────────────────────────────

    pub fn request(&mut self, r: LoopRequest) {
        match r {
            LoopRequest::NoLoop => self.looping = false,
            LoopRequest::Loop => self.looping = true,
            LoopRequest::FrameRate(rate) => self.timing.target_rate = rate,
            LoopRequest::Exit => {}
        }
        self.requests.push(r);
    }

    pub fn take_requests(&mut self) -> Vec<LoopRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Recomputes `FRAME_RATE` once more than half a second has passed since
    /// the last sample.
    pub fn tick_fps(&mut self) {
        let now = self.clock.now_ms();
        let sec = (now - self.timing.last_sample_ms) / 1000.0;
        self.timing.frames_since_sample += 1;
        if sec > 0.5 {
            self.timing.measured_rate = self.timing.frames_since_sample as f64 / sec;
            self.timing.last_sample_ms = now;
            self.timing.frames_since_sample = 0;
        }
    }

    // ── Output ────────────────────────────────────────────────────────────────

    pub fn println(&mut self, text: &str) {
        let line = std::mem::take(&mut self.print_buffer) + text;
        log::info!("{line}");
        self.output.push(line);
    }

    /// `print` without a newline; flushed by the next `println`.
    pub fn print(&mut self, text: &str) {
        self.print_buffer.push_str(text);
    }

    /// Printed output, including an unterminated `print` line.
    pub fn output_text(&self) -> String {
        let mut out = self.output.join("\n");
        if !self.print_buffer.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.print_buffer);
        }
        out
    }

    // ── Live variables ────────────────────────────────────────────────────────

    /// Script-visible variables backed by session state.
    pub fn live_var(&self, name: &str) -> Option<Value> {
        let i = &self.input;
        Some(match name {
            "mouseX" => Value::Number(i.mouse_x),
            "mouseY" => Value::Number(i.mouse_y),
            "pmouseX" => Value::Number(i.pmouse_x),
            "pmouseY" => Value::Number(i.pmouse_y),
            "mouseButton" => Value::Number(i.mouse_button),
            "mousePressed" => Value::Bool(i.mouse_pressed),
            "keyPressed" => Value::Bool(i.key_pressed),
            "key" => i.key.clone(),
            "keyCode" => i.key_code.clone(),
            "focused" => Value::Bool(i.focused),
            "width" => Value::Number(self.width()),
            "height" => Value::Number(self.height()),
            "frameCount" => Value::Number(self.timing.frame_count as f64),
            "FRAME_RATE" => Value::Number(self.timing.measured_rate),
            "pixels" => Value::Array(self.pixels.clone()),
            "online" => Value::Bool(false),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ManualClock;
    use crate::loader::MemoryLoader;
    use crate::surface::Recorder;

    fn env(clock: Rc<ManualClock>) -> Environment {
        Environment::new(
            Box::new(Recorder::new(10, 10)),
            clock,
            Rc::new(LibraryRegistry::new()),
            Rc::new(MemoryLoader::new()),
            Some(1),
        )
    }

    #[test]
    fn pop_without_push_fails() {
        let mut e = env(Rc::new(ManualClock::new()));
        e.push_style();
        e.style.fill = None;
        e.pop_style(1).unwrap();
        assert!(e.style.fill.is_some());
        let err = e.pop_style(2).unwrap_err();
        assert_eq!(err.message, "Too many popStyle() without enough pushStyle()");
    }

    #[test]
    fn fps_is_sampled_every_half_second() {
        let clock = Rc::new(ManualClock::new());
        let mut e = env(clock.clone());
        for _ in 0..10 {
            clock.advance(40.0);
            e.tick_fps();
        }
        assert_eq!(e.timing.measured_rate, 0.0);
        clock.advance(200.0);
        e.tick_fps();
        assert!((e.timing.measured_rate - 11.0 / 0.6).abs() < 1e-9);
        assert_eq!(e.timing.frames_since_sample, 0);
    }

    #[test]
    fn print_is_flushed_by_println() {
        let mut e = env(Rc::new(ManualClock::new()));
        e.print("a");
        e.print("b");
        assert_eq!(e.output_text(), "ab");
        e.println("c");
        assert_eq!(e.output, vec!["abc".to_string()]);
    }
}
