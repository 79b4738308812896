/// Error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // unterminated block comment

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // invalid assignment target
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
        }
    }
}

/// A lexing or parsing error in translated script text.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{}] {line}:{column} {message}", .code.as_str())]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─── Translation ─────────────────────────────────────────────────────────────

/// Structural failures of the dialect translator. Always fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslateError {
    #[error("unbalanced `{open}` opened on line {line}")]
    UnbalancedDelimiter { open: char, line: usize },

    #[error("class rewriting made no progress with {remaining} class definition(s) left")]
    ClassRewriteStalled { remaining: usize },
}

// ─── Runtime ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Host surface or environment API is unsupported or misused.
    Api,
    /// Raised from inside `setup`, `draw` or an input handler.
    Callback(String),
    /// Malformed input to a formatting or parsing utility.
    Format,
    /// Type and reference errors in the running script.
    Script,
    /// A value thrown by the script itself.
    Thrown,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("[runtime] {line} {message}")]
pub struct RuntimeError {
    pub line: usize,
    pub message: String,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into(), kind: RuntimeErrorKind::Script }
    }

    pub fn api(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into(), kind: RuntimeErrorKind::Api }
    }

    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into(), kind: RuntimeErrorKind::Format }
    }

    pub fn thrown(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into(), kind: RuntimeErrorKind::Thrown }
    }

    /// Re-tag an error escaping a user callback. API errors keep their kind.
    pub fn in_callback(mut self, callback: &str) -> Self {
        if self.kind != RuntimeErrorKind::Api {
            self.kind = RuntimeErrorKind::Callback(callback.to_string());
        }
        self
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.kind, RuntimeErrorKind::Callback(_))
    }
}

// ─── Sketch ──────────────────────────────────────────────────────────────────

/// Everything that can abort building or running a sketch.
#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    #[error("translation failed: {0}")]
    Translation(#[from] TranslateError),

    #[error("translated program could not be read: {}", first_error(.0))]
    Parse(Vec<Error>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn first_error(errors: &[Error]) -> String {
    match errors.first() {
        Some(e) if errors.len() > 1 => format!("{e} (+{} more)", errors.len() - 1),
        Some(e) => e.to_string(),
        None => "no details".into(),
    }
}

impl From<Vec<Error>> for SketchError {
    fn from(errors: Vec<Error>) -> Self {
        SketchError::Parse(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_code_and_position() {
        let e = Error::new(ErrorCode::P002, 3, 7, "expected `)`");
        assert_eq!(e.to_string(), "[P002] 3:7 expected `)`");
    }

    #[test]
    fn callback_tag_keeps_api_kind() {
        let api = RuntimeError::api(1, "no 3D").in_callback("setup");
        assert_eq!(api.kind, RuntimeErrorKind::Api);
        let script = RuntimeError::new(4, "boom").in_callback("draw");
        assert_eq!(script.kind, RuntimeErrorKind::Callback("draw".into()));
        assert!(script.is_callback());
    }

    #[test]
    fn parse_error_summary_counts_extra_errors() {
        let errs = vec![
            Error::new(ErrorCode::P001, 1, 1, "a"),
            Error::new(ErrorCode::P001, 2, 1, "b"),
        ];
        let msg = SketchError::from(errs).to_string();
        assert!(msg.contains("(+1 more)"));
    }
}
