pub mod config;
pub mod environment;
pub mod error;
pub mod font;
pub mod harness;
pub mod library;
pub mod loader;
pub mod namespaces;
pub mod runtime;
pub mod surface;
pub mod syntax;
pub mod translate;
pub mod types;

pub use config::SketchConfig;
pub use environment::Environment;
pub use error::{Error, ErrorCode, RuntimeError, RuntimeErrorKind, SketchError, TranslateError};
pub use harness::{Clock, LoopState, ManualClock, MouseButton, Sketch, SketchBuilder, SystemClock};
pub use library::{Library, LibraryRegistry};
pub use loader::{FsLoader, MemoryLoader, ResourceLoader};
pub use runtime::value::Value;
pub use surface::{Recorder, Surface};
pub use translate::{Translation, translate};
pub use types::draw::{DrawCommand, ImageData, Point, Subpath};

use syntax::ast::Program;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Translate dialect source and parse the result, without running it.
pub fn compile(source: &str) -> Result<(Translation, Program), SketchError> {
    let translation = translate(source)?;
    let tokens = syntax::lexer::Lexer::new(&translation.code).tokenize()?;
    let program = syntax::parser::Parser::new(tokens).parse()?;
    Ok((translation, program))
}
