//! Execution harness: builds a sketch from dialect source, runs `setup`, and
//! drives `draw` from a fixed-interval scheduler that the host pumps.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::config::SketchConfig;
use crate::environment::{Environment, LoopRequest};
use crate::error::{RuntimeError, SketchError};
use crate::library::{Library, LibraryRegistry};
use crate::loader::{FsLoader, ResourceLoader};
use crate::namespaces::constants;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;
use crate::surface::Surface;
use crate::syntax::lexer::Lexer;
use crate::syntax::parser::Parser;
use crate::translate::{Translation, translate};

// ─── Clocks ───────────────────────────────────────────────────────────────────

pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

// ─── Loop state ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No frame scheduled: there is no `draw`, or `noLoop` paused the loop.
    Idle,
    /// `draw` ran once because looping was off when setup finished.
    SingleShot,
    Scheduled,
    /// Stopped by an error or `exit()`. Terminal.
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
struct Scheduler {
    interval_ms: f64,
    next_due: f64,
}

impl Scheduler {
    fn arm(&mut self, now: f64) {
        self.next_due = now + self.interval_ms;
    }

    /// Consumes the due frame, if any. A host that fell behind gets one frame
    /// and a deadline re-anchored to now.
    fn take_due(&mut self, now: f64) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval_ms;
        if self.next_due <= now {
            self.next_due = now + self.interval_ms;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Center,
    Right,
}

impl MouseButton {
    fn constant(self) -> f64 {
        match self {
            MouseButton::Left => constants::LEFT,
            MouseButton::Center => constants::CENTER,
            MouseButton::Right => constants::RIGHT,
        }
    }
}

// ─── Builder ──────────────────────────────────────────────────────────────────

pub struct SketchBuilder {
    config: SketchConfig,
    libraries: LibraryRegistry,
    loader: Option<Rc<dyn ResourceLoader>>,
    clock: Option<Rc<dyn Clock>>,
}

impl SketchBuilder {
    pub fn new(config: SketchConfig) -> Self {
        Self { config, libraries: LibraryRegistry::new(), loader: None, clock: None }
    }

    /// Makes `library` available to `Import`. Registration order is the
    /// resolution order.
    pub fn library(mut self, library: Rc<dyn Library>) -> Self {
        self.libraries.register(library);
        self
    }

    /// Defaults to an `FsLoader` over `library_root`.
    pub fn loader(mut self, loader: Rc<dyn ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Defaults to the system clock.
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Translate, evaluate the top level, run `setup`, then either run `draw`
    /// once or schedule it. Any failure up to that point is fatal.
    pub fn build(self, source: &str, surface: Box<dyn Surface>) -> Result<Sketch, SketchError> {
        let translation = translate(source)?;
        log::debug!(
            "translated {} class(es) and {} function(s)",
            translation.classes.len(),
            translation.functions.len()
        );

        let clock = self.clock.unwrap_or_else(|| Rc::new(SystemClock::new()));
        let loader = self.loader
            .unwrap_or_else(|| Rc::new(FsLoader::new(self.config.library_root.clone())));
        let mut env = Environment::new(surface, clock.clone(), Rc::new(self.libraries), loader, self.config.seed);
        env.surface.resize(self.config.width, self.config.height);
        env.timing.target_rate = self.config.frame_rate;
        if translation.uses_3d {
            if !env.surface.supports_3d() {
                let err = RuntimeError::api(0, "3D rendering context is not supported by this surface");
                return Err(err.into());
            }
            log::debug!("sketch requests a 3D context");
            env.uses_3d = true;
        }

        let tokens = Lexer::new(&translation.code).tokenize()?;
        let program = Parser::new(tokens).parse()?;
        let mut interp = Interpreter::new(program, env);
        interp.run()?;

        let interval_ms = 1000.0 / interp.env.timing.target_rate;
        let mut sketch = Sketch {
            interp,
            translation,
            state: LoopState::Idle,
            scheduler: Scheduler { interval_ms, next_due: 0.0 },
            clock,
            error: None,
        };
        sketch.init()?;
        Ok(sketch)
    }
}

// ─── Sketch ───────────────────────────────────────────────────────────────────

pub struct Sketch {
    interp: Interpreter,
    translation: Translation,
    state: LoopState,
    scheduler: Scheduler,
    clock: Rc<dyn Clock>,
    error: Option<RuntimeError>,
}

impl Sketch {
    /// Builds with the default loader, the system clock and no libraries.
    pub fn from_source(source: &str, surface: Box<dyn Surface>, config: SketchConfig) -> Result<Self, SketchError> {
        SketchBuilder::new(config).build(source, surface)
    }

    fn init(&mut self) -> Result<(), SketchError> {
        let env = &mut self.interp.env;
        env.in_setup = true;
        let setup = self.interp.call_global("setup", Vec::new());
        self.interp.env.in_setup = false;
        setup.map_err(|e| e.in_callback("setup"))?;
        log::info!("setup finished");

        self.apply_requests();
        if self.state == LoopState::Cancelled || !self.interp.has_function("draw") {
            return Ok(());
        }
        if self.interp.env.looping {
            self.start();
        } else {
            self.interp.draw_frame()?;
            self.state = LoopState::SingleShot;
            self.apply_requests();
        }
        Ok(())
    }

    fn start(&mut self) {
        self.scheduler.arm(self.clock.now_ms());
        self.state = LoopState::Scheduled;
        log::info!("loop started at {:.1} ms per frame", self.scheduler.interval_ms);
    }

    fn cancel(&mut self) {
        if self.state != LoopState::Cancelled {
            log::info!("loop cancelled after frame {}", self.interp.env.timing.frame_count);
            self.state = LoopState::Cancelled;
        }
    }

    /// Applies `frameRate`, `loop`, `noLoop` and `exit` calls made by the
    /// script since the last check.
    fn apply_requests(&mut self) {
        for request in self.interp.env.take_requests() {
            match request {
                LoopRequest::FrameRate(rate) => {
                    self.scheduler.interval_ms = 1000.0 / rate;
                    if self.state == LoopState::Scheduled {
                        self.scheduler.arm(self.clock.now_ms());
                    }
                }
                LoopRequest::NoLoop => {
                    if self.state == LoopState::Scheduled {
                        self.state = LoopState::Idle;
                    }
                }
                LoopRequest::Loop => {
                    let paused = matches!(self.state, LoopState::Idle | LoopState::SingleShot);
                    if paused && self.interp.has_function("draw") {
                        self.start();
                    }
                }
                LoopRequest::Exit => self.cancel(),
            }
        }
    }

    /// Records a callback error and stops the loop.
    fn fail(&mut self, err: RuntimeError) -> RuntimeError {
        log::warn!("{err}");
        self.cancel();
        self.error = Some(err.clone());
        err
    }

    /// Runs at most one due frame. Returns whether a frame ran.
    pub fn pump(&mut self) -> Result<bool, RuntimeError> {
        if self.state != LoopState::Scheduled || !self.scheduler.take_due(self.clock.now_ms()) {
            return Ok(false);
        }
        let result = self.interp.draw_frame();
        self.apply_requests();
        match result {
            Ok(()) => Ok(true),
            Err(e) => Err(self.fail(e)),
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Invokes a user handler when one is registered. Ignored once cancelled.
    fn dispatch(&mut self, handler: &str) -> Result<(), RuntimeError> {
        if self.state == LoopState::Cancelled || !self.interp.has_function(handler) {
            return Ok(());
        }
        let result = self.interp.call_global(handler, Vec::new());
        self.apply_requests();
        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(self.fail(e.in_callback(handler))),
        }
    }

    pub fn mouse_moved(&mut self, x: f64, y: f64) -> Result<(), RuntimeError> {
        let input = &mut self.interp.env.input;
        input.pmouse_x = input.mouse_x;
        input.pmouse_y = input.mouse_y;
        input.mouse_x = x;
        input.mouse_y = y;
        let dragging = input.mouse_pressed;
        self.dispatch("mouseMoved")?;
        if dragging {
            self.dispatch("mouseDragged")?;
        }
        Ok(())
    }

    pub fn mouse_pressed(&mut self, button: MouseButton) -> Result<(), RuntimeError> {
        let input = &mut self.interp.env.input;
        input.mouse_pressed = true;
        input.mouse_button = button.constant();
        self.dispatch("mousePressed")
    }

    pub fn mouse_released(&mut self) -> Result<(), RuntimeError> {
        self.interp.env.input.mouse_pressed = false;
        self.dispatch("mouseClicked")?;
        self.dispatch("mouseReleased")
    }

    /// `code` is a host key code: arrows are 37..40, letters 65..90.
    pub fn key_pressed(&mut self, code: u32, shift: bool) -> Result<(), RuntimeError> {
        let input = &mut self.interp.env.input;
        input.key_pressed = true;
        let coded = match code {
            37 => Some(constants::LEFT),
            38 => Some(constants::UP),
            39 => Some(constants::RIGHT),
            40 => Some(constants::DOWN),
            _ => None,
        };
        match coded {
            Some(k) => {
                input.key = Value::Number(constants::CODED);
                input.key_code = Value::Number(k);
            }
            None => {
                let key = match code {
                    65..=90 if !shift => code + 32,
                    97..=122 if shift => code - 32,
                    _ => code,
                };
                input.key = Value::Number(key as f64);
                input.key_code = Value::Null;
            }
        }
        self.dispatch("keyPressed")
    }

    pub fn key_released(&mut self) -> Result<(), RuntimeError> {
        self.interp.env.input.key_pressed = false;
        self.dispatch("keyReleased")
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.interp.env.timing.frame_count
    }

    /// Current frame interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.scheduler.interval_ms
    }

    /// The error that cancelled the loop, if any.
    pub fn error(&self) -> Option<&RuntimeError> {
        self.error.as_ref()
    }

    pub fn translation(&self) -> &Translation {
        &self.translation
    }

    pub fn output(&self) -> String {
        self.interp.env.output_text()
    }

    pub fn env(&self) -> &Environment {
        &self.interp.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.interp.env
    }

    pub fn surface(&self) -> &dyn Surface {
        self.interp.env.surface.as_ref()
    }

    /// A top-level binding of the running script.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.interp.global(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_reanchors_when_behind() {
        let mut s = Scheduler { interval_ms: 10.0, next_due: 10.0 };
        assert!(!s.take_due(5.0));
        assert!(s.take_due(10.0));
        assert_eq!(s.next_due, 20.0);
        assert!(s.take_due(55.0));
        assert_eq!(s.next_due, 65.0);
        assert!(!s.take_due(60.0));
    }

    #[test]
    fn manual_clock_moves_on_demand() {
        let c = ManualClock::new();
        c.advance(12.5);
        assert_eq!(c.now_ms(), 12.5);
        c.set(3.0);
        assert_eq!(c.now_ms(), 3.0);
    }
}
