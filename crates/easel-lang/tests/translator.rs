//! Translator behavior tests.
//!
//! Dialect source in, script text out. Where the exact text is incidental the
//! translated program is executed instead and its results inspected.

use easel_lang::translate::braces::balanced_prefix;
use easel_lang::{MemoryLoader, Recorder, Sketch, SketchBuilder, SketchConfig, SketchError, TranslateError, Value, ManualClock, translate};
use std::rc::Rc;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn code(src: &str) -> String {
    translate(src).unwrap_or_else(|e| panic!("translate failed: {e}")).code
}

fn sketch(src: &str) -> Sketch {
    SketchBuilder::new(SketchConfig { seed: Some(1), ..Default::default() })
        .clock(Rc::new(ManualClock::new()))
        .loader(Rc::new(MemoryLoader::new()))
        .build(src, Box::new(Recorder::new(100, 100)))
        .unwrap_or_else(|e| panic!("build failed: {e}"))
}

fn num(s: &Sketch, name: &str) -> f64 {
    match s.global(name) {
        Some(v) => v.to_number(),
        None => panic!("`{name}` is not bound"),
    }
}

fn object(s: &Sketch, name: &str) -> Value {
    match s.global(name) {
        Some(v @ Value::Object(_)) => v,
        other => panic!("expected object for `{name}`, got {other:?}"),
    }
}

fn member_names(v: &Value) -> Vec<String> {
    let Value::Object(o) = v else { panic!("not an object") };
    let mut names: Vec<String> = o.borrow().members.keys().cloned().collect();
    names.sort();
    names
}

fn member(v: &Value, name: &str) -> Value {
    let Value::Object(o) = v else { panic!("not an object") };
    o.borrow().members.get(name).cloned().unwrap_or(Value::Undefined)
}

// ─── Declarations ────────────────────────────────────────────────────────────

#[test]
fn uninitialized_int_declares_zero() {
    assert_eq!(code("int foo;"), "var foo = 0;");
}

#[test]
fn several_uninitialized_declarators() {
    let s = sketch("int a, b = 2, c;\nfloat d;");
    assert_eq!((num(&s, "a"), num(&s, "b"), num(&s, "c"), num(&s, "d")), (0.0, 2.0, 0.0, 0.0));
}

#[test]
fn typed_parameters_are_dropped() {
    assert!(code("void grid(int n, float[] xs) { }").contains("function grid(n, xs)"));
}

#[test]
fn top_level_functions_become_sketch_members() {
    let t = translate("void setup() { }\nint twice(int v) { return v * 2; }").unwrap();
    assert_eq!(t.functions, vec!["setup", "twice"]);
    assert!(t.code.contains("sketch.twice = function twice(v)"));
}

// ─── Literals and casts ──────────────────────────────────────────────────────

#[test]
fn hex_color_decodes_to_default_color() {
    assert_eq!(code("color c = #ff0000;"), "var c = DefaultColor(255,0,0);");
}

#[test]
fn hex_color_evaluates_to_red() {
    let s = sketch("color c = #ff0000;\nfloat r = red(c);\nfloat g = green(c);\nfloat b = blue(c);");
    assert_eq!((num(&s, "r"), num(&s, "g"), num(&s, "b")), (255.0, 0.0, 0.0));
}

#[test]
fn int_cast_truncates() {
    let s = sketch("float x = 7.9;\nint y = (int) x * 2;");
    assert_eq!(num(&s, "y"), 14.0);
}

#[test]
fn char_literal_is_a_char_code() {
    let s = sketch("int k = 'a';");
    assert_eq!(num(&s, "k"), 97.0);
}

#[test]
fn float_suffix_is_stripped() {
    let s = sketch("float x = 1.5f + 2f;");
    assert_eq!(num(&s, "x"), 3.5);
}

#[test]
fn array_allocation_and_initializer() {
    let s = sketch("int[][] grid = new int[2][3];\nint[] xs = new int[] {4, 5};\nint n = grid[1].length + xs[1];");
    assert_eq!(num(&s, "n"), 8.0);
}

#[test]
fn length_call_becomes_property() {
    let s = sketch("String s = \"hello\";\nint n = s.length();");
    assert_eq!(num(&s, "n"), 5.0);
}

// ─── 3D detection ────────────────────────────────────────────────────────────

#[test]
fn opengl_size_requests_3d() {
    assert!(translate("void setup() { size(200, 200, OPENGL); }").unwrap().uses_3d);
    assert!(translate("void setup() { size(200, 200, P3D); }").unwrap().uses_3d);
    assert!(!translate("void setup() { size(200, 200); }").unwrap().uses_3d);
}

#[test]
fn opengl_on_a_2d_surface_fails_before_setup() {
    let src = "int ran = 0;\nvoid setup() { size(200, 200, OPENGL); ran = 1; }";
    let err = Sketch::from_source(src, Box::new(Recorder::new(10, 10)), SketchConfig::default())
        .err()
        .expect("build should fail");
    assert!(matches!(err, SketchError::Runtime(ref e) if e.kind == easel_lang::RuntimeErrorKind::Api));
}

// ─── Brace matcher ───────────────────────────────────────────────────────────

#[test]
fn brace_matcher_skips_nested_pairs() {
    let text = "a { b { c } } d } tail";
    assert_eq!(balanced_prefix(text, '{').unwrap(), "a { b { c } } d ");
}

#[test]
fn brace_matcher_rejects_unmatched_opener() {
    assert!(matches!(
        balanced_prefix("a { b", '{'),
        Err(TranslateError::UnbalancedDelimiter { open: '{', .. })
    ));
}

#[test]
fn unbalanced_source_is_a_translation_error() {
    let err = Sketch::from_source("void setup() { if (a) {", Box::new(Recorder::new(1, 1)), SketchConfig::default())
        .err()
        .expect("build should fail");
    assert!(matches!(err, SketchError::Translation(_)));
}

// ─── Classes ─────────────────────────────────────────────────────────────────

#[test]
fn field_only_class_round_trip() {
    let src = "class P { int a = 1; String name; float f; boolean on = true; }\nP p = new P();";
    let s = sketch(src);
    let p = object(&s, "p");
    assert_eq!(member_names(&p), vec!["a", "f", "name", "on"]);
    assert_eq!(member(&p, "a").to_number(), 1.0);
    assert!(matches!(member(&p, "name"), Value::Null));
    assert_eq!(member(&p, "f").to_number(), 0.0);
    assert!(member(&p, "on").truthy());
}

#[test]
fn every_class_is_rewritten() {
    let t = translate("class A { } class B { } class C { }").unwrap();
    let names: Vec<_> = t.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert!(!t.code.contains("class "));
}

#[test]
fn subclass_constructor_extends_superclass() {
    let src = "
class Shape {
  int sides;
  Shape(int n) { sides = n; }
}
class Ball extends Shape {
  float x;
  Ball(float ix) { x = ix; }
}
Ball b = new Ball(4);";
    let t = translate(src).unwrap();
    assert!(t.code.contains("extendClass(this, arguments, Shape);"));
    let s = sketch(src);
    let b = object(&s, "b");
    assert_eq!(member(&b, "x").to_number(), 4.0);
    // the superclass constructor saw the same argument list
    assert_eq!(member(&b, "sides").to_number(), 4.0);
}

#[test]
fn super_call_runs_the_superclass_constructor() {
    let src = "
class A {
  int v;
  A(int a, int b) { v = a + b; }
}
class B extends A {
  B(int n) { super(n, n); }
}
B b = new B(3);";
    let s = sketch(src);
    assert_eq!(member(&object(&s, "b"), "v").to_number(), 6.0);
}

#[test]
fn methods_dispatch_on_parameter_count() {
    let src = "
class Mover {
  String last = \"\";
  void move(float x) { last = \"one\"; }
  void move(float x, float y) { last = \"two\"; }
}
Mover m = new Mover();
m.move(1);
String a = m.last;
m.move(1, 2);
String b = m.last;";
    let s = sketch(src);
    assert_eq!(s.global("a").unwrap().to_string(), "one");
    assert_eq!(s.global("b").unwrap().to_string(), "two");
}

#[test]
fn subclass_methods_override_superclass_methods() {
    let src = "
class Animal {
  String speak() { return \"...\"; }
  String name() { return \"animal\"; }
}
class Dog extends Animal {
  String speak() { return \"woof\"; }
}
Dog d = new Dog();
String s1 = d.speak();
String s2 = d.name();";
    let s = sketch(src);
    assert_eq!(s.global("s1").unwrap().to_string(), "woof");
    assert_eq!(s.global("s2").unwrap().to_string(), "animal");
}

#[test]
fn methods_read_fields_unqualified() {
    let src = "
class Counter {
  int n = 10;
  void bump() { n++; }
  int get() { bump(); return n; }
}
Counter c = new Counter();
int v = c.get();";
    assert_eq!(num(&sketch(src), "v"), 11.0);
}

#[test]
fn static_constants_are_read_through_the_class_name() {
    let src = "
class Ball {
  static final int MAX = 5;
  int r = 1;
  int limit() { return MAX * r; }
}
int m = Ball.MAX;
Ball b = new Ball();
int l = b.limit();";
    assert!(code(src).contains("Ball.MAX = 5;"));
    let s = sketch(src);
    assert_eq!(num(&s, "m"), 5.0);
    assert_eq!(num(&s, "l"), 5.0);
    assert!(!member_names(&object(&s, "b")).contains(&"MAX".to_string()));
}

#[test]
fn static_counters_are_shared_between_instances() {
    let src = "
class Ball {
  static int count;
  Ball() { count++; }
}
Ball a = new Ball();
Ball b = new Ball();
Ball c = new Ball();
int n = Ball.count;";
    assert_eq!(num(&sketch(src), "n"), 3.0);
}

#[test]
fn shift_compound_assignments() {
    let s = sketch("int x = 8; x >>= 1; int y = -8; y >>>= 28;");
    assert_eq!(num(&s, "x"), 4.0);
    assert_eq!(num(&s, "y"), 15.0);
}
