//! Execution harness tests: setup/draw lifecycle, the fixed-interval
//! scheduler and input dispatch, all on a manual clock.

use std::rc::Rc;

use easel_lang::{
    LoopState, ManualClock, MemoryLoader, MouseButton, Recorder, RuntimeErrorKind, Sketch,
    SketchBuilder, SketchConfig, Value,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn start(src: &str) -> (Sketch, Rc<ManualClock>) {
    let clock = Rc::new(ManualClock::new());
    let sketch = SketchBuilder::new(SketchConfig { seed: Some(3), ..Default::default() })
        .clock(clock.clone())
        .loader(Rc::new(MemoryLoader::new()))
        .build(src, Box::new(Recorder::new(100, 100)))
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    (sketch, clock)
}

/// Advances by one interval and pumps once.
fn step(sketch: &mut Sketch, clock: &ManualClock) -> bool {
    clock.advance(sketch.interval_ms());
    sketch.pump().unwrap_or_else(|e| panic!("frame failed: {e}"))
}

fn f(s: &Sketch, name: &str) -> f64 {
    match s.global(name) {
        Some(Value::Number(n)) => n,
        other => panic!("expected number for `{name}`, got {other:?}"),
    }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn without_draw_the_sketch_stays_idle() {
    let (mut s, clock) = start("void setup() { }");
    assert_eq!(s.state(), LoopState::Idle);
    assert!(!step(&mut s, &clock));
    assert_eq!(s.frame_count(), 0);
}

#[test]
fn no_loop_in_setup_draws_once() {
    let (mut s, clock) = start("int n = 0;\nvoid setup() { noLoop(); }\nvoid draw() { n++; }");
    assert_eq!(s.state(), LoopState::SingleShot);
    assert_eq!(s.frame_count(), 1);
    assert!(!step(&mut s, &clock));
    assert_eq!(f(&s, "n"), 1.0);
}

#[test]
fn looping_sketch_is_scheduled_not_run() {
    let (s, _) = start("void draw() { }");
    assert_eq!(s.state(), LoopState::Scheduled);
    assert_eq!(s.frame_count(), 0);
}

#[test]
fn draw_sees_frame_count() {
    let (mut s, clock) = start("int seen = 0;\nvoid draw() { seen = frameCount; }");
    for _ in 0..3 {
        assert!(step(&mut s, &clock));
    }
    assert_eq!(f(&s, "seen"), 3.0);
}

#[test]
fn throwing_on_third_draw_cancels_the_loop() {
    let src = "
int calls = 0;
void draw() {
  calls++;
  if (calls == 3) { explode(); }
}";
    let (mut s, clock) = start(src);
    assert!(step(&mut s, &clock));
    assert!(step(&mut s, &clock));

    clock.advance(s.interval_ms());
    let err = s.pump().unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Callback("draw".into()));
    assert_eq!(s.state(), LoopState::Cancelled);
    assert_eq!(s.frame_count(), 3);
    assert_eq!(f(&s, "calls"), 3.0);
    assert!(s.error().is_some());

    // cancellation is terminal
    for _ in 0..5 {
        assert!(!step(&mut s, &clock));
    }
    assert_eq!(f(&s, "calls"), 3.0);
}

#[test]
fn exit_stops_the_loop() {
    let (mut s, clock) = start("void draw() { if (frameCount == 2) { exit(); } }");
    assert!(step(&mut s, &clock));
    assert!(step(&mut s, &clock));
    assert_eq!(s.state(), LoopState::Cancelled);
    assert!(s.error().is_none());
}

#[test]
fn out_of_range_write_in_draw_cancels_the_loop() {
    let src = "
int[] cells = new int[4];
void draw() { cells[frameCount * 1e12] = 1; }";
    let (mut s, clock) = start(src);
    clock.advance(s.interval_ms());
    let err = s.pump().unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Callback("draw".into()));
    assert_eq!(s.state(), LoopState::Cancelled);
}

// ─── Scheduling ──────────────────────────────────────────────────────────────

#[test]
fn frames_wait_for_the_interval() {
    let (mut s, clock) = start("void draw() { }");
    assert_eq!(s.interval_ms(), 1000.0 / 60.0);
    clock.advance(5.0);
    assert!(!s.pump().unwrap());
    clock.advance(12.0);
    assert!(s.pump().unwrap());
    assert!(!s.pump().unwrap());
}

#[test]
fn a_late_host_gets_one_frame() {
    let (mut s, clock) = start("void draw() { }");
    clock.advance(1000.0);
    assert!(s.pump().unwrap());
    assert!(!s.pump().unwrap());
    assert_eq!(s.frame_count(), 1);
}

#[test]
fn frame_rate_sets_the_interval() {
    let (mut s, clock) = start("void setup() { frameRate(10); }\nvoid draw() { }");
    assert_eq!(s.interval_ms(), 100.0);
    clock.advance(60.0);
    assert!(!s.pump().unwrap());
    clock.advance(40.0);
    assert!(s.pump().unwrap());
}

#[test]
fn config_frame_rate_is_the_default() {
    let config = SketchConfig { frame_rate: 25.0, ..Default::default() };
    let s = SketchBuilder::new(config)
        .clock(Rc::new(ManualClock::new()))
        .build("void draw() { }", Box::new(Recorder::new(1, 1)))
        .unwrap();
    assert_eq!(s.interval_ms(), 40.0);
}

#[test]
fn frame_rate_estimate_updates_every_half_second() {
    let (mut s, clock) = start("float fps = 0;\nvoid draw() { fps = frameRate; }");
    for _ in 0..20 {
        step(&mut s, &clock);
    }
    // 20 frames over 333 ms: no sample yet
    assert_eq!(f(&s, "fps"), 0.0);
    for _ in 0..20 {
        step(&mut s, &clock);
    }
    assert!((f(&s, "fps") - 60.0).abs() < 1.0, "{}", f(&s, "fps"));
}

#[test]
fn millis_follows_the_clock() {
    let (mut s, clock) = start("float t = -1;\nvoid draw() { t = millis(); }");
    clock.advance(250.0);
    s.pump().unwrap();
    assert_eq!(f(&s, "t"), 250.0);
}

#[test]
fn no_loop_pauses_and_loop_resumes() {
    let src = "
void draw() { if (frameCount == 1) { noLoop(); } }
void mousePressed() { loop(); }";
    let (mut s, clock) = start(src);
    assert!(step(&mut s, &clock));
    assert_eq!(s.state(), LoopState::Idle);
    assert!(!step(&mut s, &clock));

    s.mouse_pressed(MouseButton::Left).unwrap();
    assert_eq!(s.state(), LoopState::Scheduled);
    assert!(step(&mut s, &clock));
    assert_eq!(s.frame_count(), 2);
}

#[test]
fn redraw_runs_one_frame() {
    let src = "
int n = 0;
void setup() { noLoop(); }
void draw() { n++; }
void keyPressed() { redraw(); }";
    let (mut s, _) = start(src);
    s.key_pressed(32, false).unwrap();
    assert_eq!(f(&s, "n"), 2.0);
    assert_eq!(s.frame_count(), 2);
}

// ─── Input ───────────────────────────────────────────────────────────────────

#[test]
fn mouse_motion_tracks_previous_position() {
    let src = "
int moved = 0;
int dragged = 0;
void mouseMoved() { moved++; }
void mouseDragged() { dragged++; }";
    let (mut s, _) = start(src);
    s.mouse_moved(10.0, 20.0).unwrap();
    s.mouse_moved(15.0, 25.0).unwrap();
    let input = &s.env().input;
    assert_eq!((input.mouse_x, input.mouse_y), (15.0, 25.0));
    assert_eq!((input.pmouse_x, input.pmouse_y), (10.0, 20.0));

    s.mouse_pressed(MouseButton::Left).unwrap();
    s.mouse_moved(16.0, 25.0).unwrap();
    assert_eq!((f(&s, "moved"), f(&s, "dragged")), (3.0, 1.0));
}

#[test]
fn mouse_press_and_release_handlers() {
    let src = "
String events = \"\";
boolean right = false;
void mousePressed() { events += \"p\"; right = mouseButton == RIGHT; }
void mouseClicked() { events += \"c\"; }
void mouseReleased() { events += \"r\"; }";
    let (mut s, _) = start(src);
    s.mouse_pressed(MouseButton::Right).unwrap();
    s.mouse_released().unwrap();
    assert_eq!(s.global("events").unwrap().to_string(), "pcr");
    assert!(s.global("right").unwrap().truthy());
    assert!(!s.env().input.mouse_pressed);
}

#[test]
fn mouse_pressed_variable_without_handler() {
    let src = "boolean down = false;\nvoid draw() { down = mousePressed; }";
    let (mut s, clock) = start(src);
    s.mouse_pressed(MouseButton::Left).unwrap();
    step(&mut s, &clock);
    assert!(s.global("down").unwrap().truthy());
    s.mouse_released().unwrap();
    step(&mut s, &clock);
    assert!(!s.global("down").unwrap().truthy());
}

#[test]
fn letters_are_lower_case_unless_shifted() {
    let src = "int k = 0;\nboolean coded = true;\nvoid keyPressed() { k = key; coded = keyCode != null; }";
    let (mut s, _) = start(src);
    s.key_pressed(65, false).unwrap();
    assert_eq!(f(&s, "k"), 97.0);
    assert!(!s.global("coded").unwrap().truthy());
    s.key_pressed(65, true).unwrap();
    assert_eq!(f(&s, "k"), 65.0);
}

#[test]
fn arrow_keys_are_coded() {
    let src = "boolean left = false;\nvoid keyPressed() { left = key == CODED && keyCode == LEFT; }";
    let (mut s, _) = start(src);
    s.key_pressed(37, false).unwrap();
    assert!(s.global("left").unwrap().truthy());
    s.key_released().unwrap();
    assert!(!s.env().input.key_pressed);
}

#[test]
fn handler_errors_cancel_the_loop() {
    let (mut s, clock) = start("void draw() { }\nvoid keyReleased() { nope(); }");
    assert!(step(&mut s, &clock));
    let err = s.key_released().unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Callback("keyReleased".into()));
    assert_eq!(s.state(), LoopState::Cancelled);
    assert!(!step(&mut s, &clock));
}
