//! Runtime environment tests.
//!
//! Tests the full stack: dialect source → translate → parse → evaluate →
//! setup/draw. Globals are inspected after setup; draw commands are read
//! back from the recording surface.

use std::rc::Rc;

use easel_lang::namespaces::{Export, functions};
use easel_lang::{
    DrawCommand, Environment, Library, ManualClock, MemoryLoader, Recorder, RuntimeError,
    RuntimeErrorKind, Sketch, SketchBuilder, SketchConfig, SketchError, Value,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn builder() -> SketchBuilder {
    SketchBuilder::new(SketchConfig { seed: Some(7), ..Default::default() })
        .clock(Rc::new(ManualClock::new()))
        .loader(Rc::new(MemoryLoader::new()))
}

fn run(src: &str) -> Sketch {
    builder()
        .build(src, Box::new(Recorder::new(100, 100)))
        .unwrap_or_else(|e| panic!("build failed: {e}"))
}

fn run_err(src: &str) -> RuntimeError {
    match builder().build(src, Box::new(Recorder::new(100, 100))) {
        Ok(_) => panic!("expected the sketch to fail"),
        Err(SketchError::Runtime(e)) => e,
        Err(other) => panic!("expected a runtime error, got {other}"),
    }
}

fn f(s: &Sketch, name: &str) -> f64 {
    match s.global(name) {
        Some(Value::Number(n)) => n,
        other => panic!("expected number for `{name}`, got {other:?}"),
    }
}

fn text(s: &Sketch, name: &str) -> String {
    match s.global(name) {
        Some(v) => v.to_string(),
        None => panic!("`{name}` is not bound"),
    }
}

fn commands(s: &Sketch) -> Vec<DrawCommand> {
    s.surface().recorded().to_vec()
}

// ─── Script semantics ────────────────────────────────────────────────────────

#[test]
fn arithmetic_follows_precedence() {
    let s = run("float x = (2 + 3) * 4 - 1;\nfloat y = 2 + 3 * 4;\nfloat m = 10 % 3;");
    assert_eq!((f(&s, "x"), f(&s, "y"), f(&s, "m")), (19.0, 14.0, 1.0));
}

#[test]
fn integer_division_is_floating_point() {
    let s = run("float x = 10 / 4;");
    assert_eq!(f(&s, "x"), 2.5);
}

#[test]
fn string_concatenation_formats_numbers() {
    let s = run("String s = \"x=\" + 3 + \",\" + 0.5;");
    assert_eq!(text(&s, "s"), "x=3,0.5");
}

#[test]
fn loops_and_conditionals() {
    let src = "
int total = 0;
void setup() {
  for (int i = 0; i < 10; i++) {
    if (i % 2 == 0) { continue; }
    total += i;
  }
  int j = 0;
  while (j < 3) { j++; }
  total += j;
}";
    assert_eq!(f(&run(src), "total"), 1.0 + 3.0 + 5.0 + 7.0 + 9.0 + 3.0);
}

#[test]
fn switch_with_fall_through() {
    let src = "
String out = \"\";
void setup() {
  switch (2) {
    case 1: out += \"a\";
    case 2: out += \"b\";
    case 3: out += \"c\"; break;
    default: out += \"d\";
  }
}";
    assert_eq!(text(&run(src), "out"), "bc");
}

#[test]
fn recursion_works_and_is_bounded() {
    let s = run("int fact(int n) { return n <= 1 ? 1 : n * fact(n - 1); }\nint v = fact(5);");
    assert_eq!(f(&s, "v"), 120.0);

    let err = run_err("int forever(int n) { return forever(n + 1); }\nint v = forever(0);");
    assert_eq!(err.message, "too much recursion");
}

#[test]
fn undefined_name_reports_its_line() {
    let err = run_err("int a = 1;\nint b = 2;\nint c = missing + 1;");
    assert_eq!(err.kind, RuntimeErrorKind::Script);
    assert_eq!(err.line, 3);
}

// ─── Setup and draw ──────────────────────────────────────────────────────────

#[test]
fn setup_runs_once_before_draw() {
    let src = "
int setups = 0;
int draws = 0;
void setup() { setups++; noLoop(); }
void draw() { draws++; }";
    let s = run(src);
    assert_eq!((f(&s, "setups"), f(&s, "draws")), (1.0, 1.0));
}

#[test]
fn size_resizes_the_surface() {
    let s = run("void setup() { size(200, 150); }");
    assert_eq!(s.surface().size(), (200, 150));
    assert_eq!((s.env().width(), s.env().height()), (200.0, 150.0));
}

#[test]
fn config_size_applies_before_setup() {
    let config = SketchConfig { width: 40, height: 30, ..Default::default() };
    let s = SketchBuilder::new(config)
        .clock(Rc::new(ManualClock::new()))
        .build("int w = 0;\nvoid setup() { w = width; }", Box::new(Recorder::new(1, 1)))
        .unwrap();
    assert_eq!(f(&s, "w"), 40.0);
}

#[test]
fn errors_in_setup_are_callback_errors() {
    let err = run_err("void setup() { int x = nothing; }");
    assert_eq!(err.kind, RuntimeErrorKind::Callback("setup".into()));
}

// ─── Style stack ─────────────────────────────────────────────────────────────

#[test]
fn balanced_push_and_pop_style() {
    let src = "void setup() { pushStyle(); strokeWeight(5); popStyle(); }";
    let s = run(src);
    assert_eq!(s.env().style.stroke_weight, 1.0);
    assert_eq!(s.env().style_depth(), 0);
}

#[test]
fn too_many_pop_style_is_fatal() {
    let err = run_err("void setup() { pushStyle(); popStyle(); popStyle(); }");
    assert!(err.message.contains("Too many popStyle()"), "{}", err.message);
    assert!(err.is_callback());
}

// ─── Drawing ─────────────────────────────────────────────────────────────────

#[test]
fn background_then_rect_records_fill_and_stroke() {
    let s = run("void setup() { background(0); rect(10, 10, 20, 20); }");
    let cmds = commands(&s);
    assert!(matches!(cmds[0], DrawCommand::Clear(0xff00_0000)));
    assert!(matches!(cmds[1], DrawCommand::Fill { color: 0xffff_ffff, .. }));
    assert!(matches!(cmds[2], DrawCommand::Stroke { color: 0xff00_0000, .. }));
}

#[test]
fn no_stroke_only_fills() {
    let s = run("void setup() { background(0); noStroke(); fill(255, 0, 0); rect(0, 0, 5, 5); }");
    let cmds = commands(&s);
    assert_eq!(cmds.len(), 2);
    assert!(matches!(cmds[1], DrawCommand::Fill { color: 0xffff_0000, .. }));
}

#[test]
fn translate_moves_recorded_points() {
    let s = run("void setup() { background(0); pushMatrix(); translate(5, 7); rect(0, 0, 10, 10); popMatrix(); }");
    let DrawCommand::Fill { subpaths, .. } = &commands(&s)[1] else { panic!("fill expected") };
    assert_eq!(subpaths[0].points[0], (5.0, 7.0));
}

#[test]
fn pixels_round_trip_through_get_and_set() {
    let src = "
float r = 0;
float g = 0;
void setup() {
  background(0);
  set(3, 4, #ff8000);
  color c = get(3, 4);
  r = red(c);
  g = green(c);
}";
    let s = run(src);
    assert_eq!((f(&s, "r"), f(&s, "g")), (255.0, 128.0));
}

// ─── Math and strings ────────────────────────────────────────────────────────

#[test]
fn seeded_random_is_reproducible() {
    let src = "float a = random(10);\nfloat b = random(5, 6);";
    let (s1, s2) = (run(src), run(src));
    assert_eq!(f(&s1, "a"), f(&s2, "a"));
    assert!((0.0..10.0).contains(&f(&s1, "a")));
    assert!((5.0..6.0).contains(&f(&s1, "b")));
}

#[test]
fn math_helpers() {
    let s = run("float a = constrain(15, 0, 10);\nfloat b = map(5, 0, 10, 0, 100);\nfloat c = dist(0, 0, 3, 4);\nfloat d = floor(7.8);");
    assert_eq!((f(&s, "a"), f(&s, "b"), f(&s, "c"), f(&s, "d")), (10.0, 50.0, 5.0, 7.0));
}

#[test]
fn number_formatting() {
    let s = run("String a = nf(3, 3);\nString b = nfc(1234567);\nString c = hex(255, 2);");
    assert_eq!(text(&s, "a"), "003");
    assert_eq!(text(&s, "b"), "1,234,567");
    assert_eq!(text(&s, "c"), "FF");
}

#[test]
fn malformed_binary_is_a_format_error() {
    let err = run_err("int v = unbinary(\"102\");");
    assert_eq!(err.kind, RuntimeErrorKind::Format);
}

#[test]
fn println_collects_output() {
    let s = run("void setup() { print(\"a\"); println(\"b\"); println(1 + 1); }");
    assert_eq!(s.output(), "ab\n2");
}

// ─── Collections ─────────────────────────────────────────────────────────────

#[test]
fn array_list_methods() {
    let src = "
ArrayList<Integer> xs = new ArrayList<Integer>();
void setup() {
  xs.add(3);
  xs.add(4);
  xs.add(0, 1);
  xs.remove(1);
}
";
    let s = run(src);
    assert_eq!(text(&s, "xs"), "1,4");
}

#[test]
fn vectors_and_static_angle() {
    let src = "
PVector v = new PVector(3, 4);
float m = v.mag();
float a = PVector.angleBetween(new PVector(1, 0), new PVector(0, 1));
void setup() { v.normalize(); }";
    let s = run(src);
    assert_eq!(f(&s, "m"), 5.0);
    assert!((f(&s, "a") - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    let Some(Value::Vector(v)) = s.global("v") else { panic!("vector expected") };
    assert!((v.borrow()[0] - 0.6).abs() < 1e-12);
}

#[test]
fn writing_far_past_the_end_is_a_script_error() {
    let err = run_err("int[] a = new int[3];\nfloat big = pow(10, 300);\na[big] = 1;");
    assert_eq!(err.kind, RuntimeErrorKind::Script);
    assert_eq!(err.line, 3);
}

#[test]
fn array_copy_with_a_huge_destination_fails_cleanly() {
    let src = "
int[] a = {1, 2, 3};
int[] b = new int[3];
void setup() { arrayCopy(a, 0, b, pow(10, 300), 3); }";
    let err = run_err(src);
    assert!(err.is_callback());
    assert!(err.message.contains("arrayCopy"), "{}", err.message);
}

#[test]
fn oversized_arrays_are_rejected() {
    let err = run_err("int[] big = new int[2000000000];");
    assert_eq!(err.kind, RuntimeErrorKind::Script);

    let err = run_err("ArrayList<Integer> xs = new ArrayList<Integer>();\nxs.length = 2000000000;");
    assert_eq!(err.line, 2);

    let s = run("int[] grid = new int[64][64];\nint n = grid.length * grid[0].length;");
    assert_eq!(f(&s, "n"), 4096.0);
}

// ─── Resources and libraries ─────────────────────────────────────────────────

#[test]
fn missing_image_loads_as_null() {
    let s = run("PImage img = loadImage(\"nope.png\");\nboolean ok = img != null;");
    assert!(matches!(s.global("img"), Some(Value::Null)));
    assert!(!s.global("ok").unwrap().truthy());
}

#[test]
fn load_strings_reads_through_the_loader() {
    let loader = MemoryLoader::new().with("lines.txt", "one\ntwo");
    let s = builder()
        .loader(Rc::new(loader))
        .build("String[] lines = loadStrings(\"lines.txt\");\nint n = lines.length;", Box::new(Recorder::new(1, 1)))
        .unwrap();
    assert_eq!(f(&s, "n"), 2.0);
}

struct Doubler;

impl Library for Doubler {
    fn name(&self) -> &'static str { "doubler" }

    fn exports(&self) -> Vec<Export> { functions(&["twice"]) }

    fn call(&self, name: &str, args: &[Value], _: &mut Environment, _: usize)
        -> Result<Option<Value>, RuntimeError>
    {
        Ok((name == "twice").then(|| Value::Number(args[0].to_number() * 2.0)))
    }
}

#[test]
fn imported_library_functions_resolve() {
    let s = builder()
        .library(Rc::new(Doubler))
        .build("import(\"doubler\");\nfloat d = twice(21);", Box::new(Recorder::new(1, 1)))
        .unwrap();
    assert_eq!(f(&s, "d"), 42.0);
}

#[test]
fn unknown_library_is_an_api_error() {
    let err = run_err("void setup() { import(\"nothing\"); }");
    assert_eq!(err.kind, RuntimeErrorKind::Api);
}
