/// Token classes of the dialect. Trivia (whitespace, comments) is kept so the
/// token stream can be written back out as text after rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    Ident,
    Number,
    Str,
    Char,
    /// `#rrggbb`
    HexColor,
    Punct,
    Space,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tok {
    pub kind: TokKind,
    pub text: String,
    pub line: usize,
}

impl Tok {
    pub fn new(kind: TokKind, text: impl Into<String>, line: usize) -> Self {
        Self { kind, text: text.into(), line }
    }

    /// Synthesized tokens carry no useful position.
    pub fn synth(kind: TokKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into(), line: 0 }
    }

    pub fn ident(text: impl Into<String>) -> Self { Self::synth(TokKind::Ident, text) }
    pub fn punct(text: impl Into<String>) -> Self { Self::synth(TokKind::Punct, text) }
    pub fn space() -> Self { Self::synth(TokKind::Space, " ") }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokKind::Space | TokKind::LineComment | TokKind::BlockComment)
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokKind::Punct && self.text == p
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokKind::Ident
    }

    pub fn is_word(&self, w: &str) -> bool {
        self.kind == TokKind::Ident && self.text == w
    }
}

/// Words that can never name a type or a declared variable.
pub fn is_reserved(word: &str) -> bool {
    matches!(
        word,
        "if" | "else" | "for" | "while" | "do" | "switch" | "case" | "default"
            | "return" | "new" | "break" | "continue" | "throw" | "try" | "catch"
            | "finally" | "var" | "function" | "typeof" | "instanceof" | "in"
            | "class" | "extends" | "import" | "with" | "this" | "super"
            | "true" | "false" | "null" | "delete"
    )
}

/// Declaration modifiers the translator discards.
pub fn is_modifier(word: &str) -> bool {
    matches!(
        word,
        "public" | "private" | "protected" | "static" | "final" | "abstract" | "synchronized"
    )
}

/// Writes a token slice back out as text.
pub fn render(toks: &[Tok]) -> String {
    let mut out = String::with_capacity(toks.iter().map(|t| t.text.len()).sum());
    for t in toks {
        out.push_str(&t.text);
    }
    out
}

// ─── Navigation over significant tokens ───────────────────────────────────────

/// Index of the first non-trivia token at or after `i`.
pub fn next_sig(toks: &[Tok], mut i: usize) -> Option<usize> {
    while i < toks.len() {
        if !toks[i].is_trivia() { return Some(i); }
        i += 1;
    }
    None
}

/// Index of the first non-trivia token strictly before `i`.
pub fn prev_sig(toks: &[Tok], i: usize) -> Option<usize> {
    let mut j = i;
    while j > 0 {
        j -= 1;
        if !toks[j].is_trivia() { return Some(j); }
    }
    None
}

/// Index of the non-trivia token after `i` (exclusive).
pub fn after(toks: &[Tok], i: usize) -> Option<usize> {
    next_sig(toks, i + 1)
}

/// True when the significant token before `i` ends a statement, or `i` is first.
pub fn at_statement_start(toks: &[Tok], i: usize) -> bool {
    match prev_sig(toks, i) {
        None => true,
        Some(p) => {
            let t = &toks[p];
            t.is_punct(";") || t.is_punct("{") || t.is_punct("}")
        }
    }
}
