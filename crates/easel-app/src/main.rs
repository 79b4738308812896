use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use eframe::egui::{self, Color32, RichText};
use easel_lang::types::color::unpack;
use easel_lang::{
    DrawCommand, ImageData, LoopState, MouseButton, Recorder, Sketch, SketchBuilder, SketchConfig,
    SketchError, translate,
};

const DEFAULT_SOURCE: &str = "// write sketch code here
float x = 0;

void setup() {
  size(300, 200);
  frameRate(30);
}

void draw() {
  background(30);
  fill(180, 160, 255);
  ellipse(x, height / 2, 40, 40);
  x = (x + 2) % width;
}
";

fn argb(c: u32) -> Color32 {
    let (a, r, g, b) = unpack(c);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Host key code for an egui key: arrows 37..40, letters and digits by
/// their upper-case ASCII code.
fn key_code(key: egui::Key) -> Option<u32> {
    use egui::Key;
    Some(match key {
        Key::ArrowLeft  => 37,
        Key::ArrowUp    => 38,
        Key::ArrowRight => 39,
        Key::ArrowDown  => 40,
        Key::Backspace  => 8,
        Key::Tab        => 9,
        Key::Enter      => 10,
        Key::Escape     => 27,
        Key::Space      => 32,
        Key::Delete     => 127,
        other => {
            let name = other.name();
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => c.to_ascii_uppercase() as u32,
                _ => return None,
            }
        }
    })
}

/// `<sketch>.toml` next to the sketch, with `library_root` made relative to
/// the sketch's directory.
fn load_config(sketch_path: &Path) -> Result<SketchConfig, SketchError> {
    let toml_path = sketch_path.with_extension("toml");
    let mut config = if toml_path.exists() {
        log::info!("reading {}", toml_path.display());
        SketchConfig::load(&toml_path)?
    } else {
        SketchConfig::default()
    };
    if let Some(dir) = sketch_path.parent() {
        config.library_root = dir.join(&config.library_root);
    }
    Ok(config)
}

fn main() -> eframe::Result {
    env_logger::init();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let (source, config, mut errors) = match &path {
        Some(p) => {
            let mut errors = Vec::new();
            let source = std::fs::read_to_string(p).unwrap_or_else(|e| {
                errors.push(format!("[io] {}: {e}", p.display()));
                DEFAULT_SOURCE.to_string()
            });
            let config = load_config(p).unwrap_or_else(|e| {
                errors.push(format!("[config] {e}"));
                SketchConfig::default()
            });
            (source, config, errors)
        }
        None => (DEFAULT_SOURCE.to_string(), SketchConfig::default(), Vec::new()),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1400.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Easel",
        options,
        Box::new(move |_cc| {
            let mut app = App::new(source, config);
            app.result.errors.append(&mut errors);
            Ok(Box::new(app))
        }),
    )
}

// ─── App state ────────────────────────────────────────────────────────────────

#[derive(PartialEq)]
enum Tab { Errors, Translated, Output, Canvas }

struct App {
    source: String,
    config: SketchConfig,
    result: RunResult,
    tab: Tab,
    sketch: Option<Sketch>,
    textures: HashMap<usize, egui::TextureHandle>,
    last_pointer: Option<egui::Pos2>,
}

impl App {
    fn new(source: String, config: SketchConfig) -> Self {
        let (result, sketch) = run(&source, &config);
        Self {
            source,
            config,
            result,
            tab: Tab::Canvas,
            sketch,
            textures: HashMap::new(),
            last_pointer: None,
        }
    }

    fn rerun(&mut self) {
        let (result, sketch) = run(&self.source, &self.config);
        self.result = result;
        self.sketch = sketch;
        self.textures.clear();
        self.last_pointer = None;
    }
}

// ─── Run result ───────────────────────────────────────────────────────────────

struct RunResult {
    errors: Vec<String>,
    translated: String,
}

fn run(source: &str, config: &SketchConfig) -> (RunResult, Option<Sketch>) {
    let mut errors: Vec<String> = Vec::new();

    // Translated text is shown even when the sketch fails to start.
    let translated = match translate(source) {
        Ok(t) => t.code,
        Err(e) => {
            errors.push(format!("[translate] {e}"));
            return (RunResult { errors, translated: String::new() }, None);
        }
    };

    let surface = Box::new(Recorder::new(config.width, config.height));
    let sketch = match SketchBuilder::new(config.clone()).build(source, surface) {
        Ok(s) => Some(s),
        Err(SketchError::Parse(errs)) => {
            errors.extend(errs.iter().map(|e| format!("[parse] {e}")));
            None
        }
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };

    (RunResult { errors, translated }, sketch)
}

// ─── UI ───────────────────────────────────────────────────────────────────────

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Pump the scheduler every UI frame ─────────────────────────────────
        if let Some(sketch) = &mut self.sketch {
            if let Err(e) = sketch.pump() {
                self.result.errors.push(e.to_string());
            }
            if sketch.state() == LoopState::Scheduled {
                ctx.request_repaint();
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                // ── Left: editor ──────────────────────────────────────────────
                cols[0].vertical(|ui| {
                    ui.label("Source");
                    ui.add(
                        egui::TextEdit::multiline(&mut self.source)
                            .font(egui::TextStyle::Monospace)
                            .desired_width(f32::INFINITY)
                            .desired_rows(44),
                    );
                });

                // ── Right: output ─────────────────────────────────────────────
                cols[1].vertical(|ui| {
                    // ── Status bar ────────────────────────────────────────────
                    ui.horizontal(|ui| {
                        let error_count = self.result.errors.len();
                        if error_count == 0 {
                            ui.label(RichText::new("✓  no errors").color(Color32::from_rgb(80, 200, 80)));
                        } else {
                            ui.label(RichText::new(format!("✗  {error_count} error(s)")).color(Color32::from_rgb(220, 80, 80)));
                        }
                        if let Some(sketch) = &self.sketch {
                            ui.label(RichText::new(format!(
                                "{:?}  frame {}",
                                sketch.state(),
                                sketch.frame_count()
                            )).monospace().color(Color32::GRAY));
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("run").clicked() {
                                self.rerun();
                            }
                        });
                    });

                    ui.separator();

                    // ── Tab bar ───────────────────────────────────────────────
                    ui.horizontal(|ui| {
                        let err_label = if self.result.errors.is_empty() {
                            "Errors".into()
                        } else {
                            format!("Errors ({})", self.result.errors.len())
                        };
                        ui.selectable_value(&mut self.tab, Tab::Errors, err_label);
                        ui.selectable_value(&mut self.tab, Tab::Translated, "Translated");
                        ui.selectable_value(&mut self.tab, Tab::Output, "Output");
                        ui.selectable_value(&mut self.tab, Tab::Canvas, "Canvas");
                    });

                    ui.separator();

                    // ── Tab content ───────────────────────────────────────────
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        match self.tab {
                            Tab::Errors     => self.show_errors(ui),
                            Tab::Translated => self.show_translated(ui),
                            Tab::Output     => self.show_output(ui),
                            Tab::Canvas     => self.show_canvas(ui),
                        }
                    });
                });
            });
        });
    }
}

impl App {
    fn show_errors(&self, ui: &mut egui::Ui) {
        if self.result.errors.is_empty() {
            ui.label(RichText::new("No errors.").color(Color32::GRAY));
            return;
        }
        for msg in &self.result.errors {
            ui.label(RichText::new(msg).monospace().color(Color32::from_rgb(220, 80, 80)));
        }
    }

    fn show_translated(&self, ui: &mut egui::Ui) {
        if self.result.translated.is_empty() {
            ui.label(RichText::new("Nothing translated.").color(Color32::GRAY));
            return;
        }
        ui.add(
            egui::TextEdit::multiline(&mut self.result.translated.as_str())
                .font(egui::TextStyle::Monospace)
                .desired_width(f32::INFINITY),
        );
    }

    fn show_output(&self, ui: &mut egui::Ui) {
        let text = self.sketch.as_ref().map(Sketch::output).unwrap_or_default();
        if text.is_empty() {
            ui.label(RichText::new("No output.").color(Color32::GRAY));
            return;
        }
        ui.label(RichText::new(text).monospace());
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(sketch) = &self.sketch else {
            ui.label(RichText::new("Fix errors to run.").color(Color32::GRAY));
            return;
        };

        let (w, h) = sketch.surface().size();
        let (canvas_rect, response) =
            ui.allocate_exact_size(egui::vec2(w as f32, h as f32), egui::Sense::click_and_drag());
        let painter = ui.painter_at(canvas_rect);
        let offset = canvas_rect.min;
        let to_screen = |(x, y): (f64, f64)| egui::pos2(offset.x + x as f32, offset.y + y as f32);

        painter.rect_filled(canvas_rect, 0.0, Color32::from_gray(204));

        for cmd in sketch.surface().recorded() {
            match cmd {
                DrawCommand::Clear(c) => {
                    painter.rect_filled(canvas_rect, 0.0, argb(*c));
                }
                DrawCommand::Fill { subpaths, color } => {
                    for sub in subpaths.iter().filter(|s| s.points.len() >= 3) {
                        let pts: Vec<egui::Pos2> = sub.points.iter().copied().map(to_screen).collect();
                        painter.add(egui::Shape::convex_polygon(pts, argb(*color), egui::Stroke::NONE));
                    }
                }
                DrawCommand::Stroke { subpaths, color, width } => {
                    let stroke = egui::Stroke::new(*width as f32, argb(*color));
                    for sub in subpaths.iter().filter(|s| s.points.len() >= 2) {
                        let pts: Vec<egui::Pos2> = sub.points.iter().copied().map(to_screen).collect();
                        if sub.closed {
                            painter.add(egui::Shape::closed_line(pts, stroke));
                        } else {
                            painter.add(egui::Shape::line(pts, stroke));
                        }
                    }
                }
                DrawCommand::Image { image, corners } => {
                    let key = Rc::as_ptr(image) as usize;
                    let texture = self.textures.entry(key).or_insert_with(|| {
                        ui.ctx().load_texture(format!("image-{key}"), color_image(image), Default::default())
                    });
                    let mut mesh = egui::Mesh::with_texture(texture.id());
                    let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
                    for (corner, (u, v)) in corners.iter().zip(uvs) {
                        mesh.vertices.push(egui::epaint::Vertex {
                            pos: to_screen(*corner),
                            uv: egui::pos2(u, v),
                            color: Color32::WHITE,
                        });
                    }
                    mesh.add_triangle(0, 1, 2);
                    mesh.add_triangle(0, 2, 3);
                    painter.add(egui::Shape::mesh(mesh));
                }
                DrawCommand::Text { text, position, size, color } => {
                    painter.text(
                        to_screen(*position),
                        egui::Align2::LEFT_BOTTOM,
                        text,
                        egui::FontId::proportional(*size as f32),
                        argb(*color),
                    );
                }
            }
        }

        self.forward_input(ui, &response, canvas_rect);
    }

    /// Pointer and key events over the canvas go to the sketch.
    fn forward_input(&mut self, ui: &egui::Ui, response: &egui::Response, canvas_rect: egui::Rect) {
        let Some(sketch) = &mut self.sketch else { return };
        let mut failures = Vec::new();

        if let Some(pos) = response.hover_pos().or_else(|| response.interact_pointer_pos()) {
            if self.last_pointer != Some(pos) {
                self.last_pointer = Some(pos);
                let local = pos - canvas_rect.min;
                failures.extend(sketch.mouse_moved(local.x as f64, local.y as f64).err());
            }
        }

        let (pressed, released, events) = ui.input(|i| {
            let button = [
                (egui::PointerButton::Primary, MouseButton::Left),
                (egui::PointerButton::Middle, MouseButton::Center),
                (egui::PointerButton::Secondary, MouseButton::Right),
            ]
            .into_iter()
            .find(|(b, _)| i.pointer.button_pressed(*b))
            .map(|(_, m)| m);
            (button, i.pointer.any_released(), i.events.clone())
        });
        if response.hovered() {
            if let Some(button) = pressed {
                failures.extend(sketch.mouse_pressed(button).err());
            }
        }
        if released && sketch.env().input.mouse_pressed {
            failures.extend(sketch.mouse_released().err());
        }

        for event in events {
            if let egui::Event::Key { key, pressed, repeat: false, modifiers, .. } = event {
                let Some(code) = key_code(key) else { continue };
                let result = if pressed {
                    sketch.key_pressed(code, modifiers.shift)
                } else {
                    sketch.key_released()
                };
                failures.extend(result.err());
            }
        }

        self.result.errors.extend(failures.into_iter().map(|e| e.to_string()));
    }
}

fn color_image(image: &ImageData) -> egui::ColorImage {
    let rgba: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|&c| {
            let (a, r, g, b) = unpack(c);
            [r, g, b, a]
        })
        .collect();
    egui::ColorImage::from_rgba_unmultiplied([image.width as usize, image.height as usize], &rgba)
}
