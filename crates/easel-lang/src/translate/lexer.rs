use crate::translate::token::{Tok, TokKind};

/// Splits dialect source into tokens without dropping anything: concatenating
/// the token texts reproduces the input exactly. Unterminated strings and
/// comments run to end of line / end of input rather than failing, since the
/// translator is a best-effort rewriter.
pub struct DialectLexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> DialectLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, bytes: source.as_bytes(), pos: 0, line: 1 }
    }

    pub fn tokenize(mut self) -> Vec<Tok> {
        let mut toks = Vec::new();
        while !self.is_at_end() {
            toks.push(self.next_token());
        }
        toks
    }

    fn next_token(&mut self) -> Tok {
        let start = self.pos;
        let line = self.line;
        let ch = self.advance();

        let kind = match ch {
            b' ' | b'\t' | b'\r' | b'\n' => {
                while matches!(self.peek(), b' ' | b'\t' | b'\r' | b'\n') { self.advance(); }
                TokKind::Space
            }
            b'/' if self.peek() == b'/' => {
                while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
                TokKind::LineComment
            }
            b'/' if self.peek() == b'*' => {
                self.advance();
                while !self.is_at_end() {
                    if self.peek() == b'*' && self.peek_next() == b'/' {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                TokKind::BlockComment
            }
            b'"' => { self.read_quoted(b'"'); TokKind::Str }
            b'\'' => { self.read_quoted(b'\''); TokKind::Char }
            b'#' if self.is_hex_color() => {
                for _ in 0..6 { self.advance(); }
                TokKind::HexColor
            }
            b'0'..=b'9' => { self.read_number(); TokKind::Number }
            b'.' if self.peek().is_ascii_digit() => { self.read_number(); TokKind::Number }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => {
                while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$') {
                    self.advance();
                }
                TokKind::Ident
            }
            _ => { self.read_punct(); TokKind::Punct }
        };

        Tok::new(kind, &self.source[start..self.pos], line)
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.bytes[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; }
        // keep `pos` on a char boundary for multi-byte UTF-8 input
        while self.pos < self.bytes.len() && !self.source.is_char_boundary(self.pos) {
            self.pos += 1;
        }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.bytes[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.bytes.len() { 0 } else { self.bytes[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Exactly six hex digits not followed by another identifier character.
    fn is_hex_color(&self) -> bool {
        let end = self.pos + 6;
        end <= self.bytes.len()
            && self.bytes[self.pos..end].iter().all(|b| b.is_ascii_hexdigit())
            && !self.bytes.get(end).is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
    }

    fn read_quoted(&mut self, quote: u8) {
        while !self.is_at_end() && self.peek() != b'\n' {
            let ch = self.advance();
            if ch == b'\\' && !self.is_at_end() {
                self.advance();
            } else if ch == quote {
                return;
            }
        }
    }

    /// Digits, one fraction, an exponent and a trailing `f`/`F`/`d`/`L` suffix.
    fn read_number(&mut self) {
        if self.bytes[self.pos - 1] == b'0' && matches!(self.peek(), b'x' | b'X') {
            self.advance();
            while self.peek().is_ascii_hexdigit() { self.advance(); }
            return;
        }
        while self.peek().is_ascii_digit() || self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && !self.peek_next().is_ascii_alphabetic() {
            self.advance();
        }
        if matches!(self.peek(), b'e' | b'E')
            && (self.peek_next().is_ascii_digit() || matches!(self.peek_next(), b'+' | b'-'))
        {
            self.advance();
            if matches!(self.peek(), b'+' | b'-') { self.advance(); }
            while self.peek().is_ascii_digit() { self.advance(); }
        }
        if matches!(self.peek(), b'f' | b'F' | b'd' | b'D' | b'l' | b'L')
            && !self.peek_next().is_ascii_alphanumeric()
        {
            self.advance();
        }
    }

    /// Extends a single punctuation byte into the longest known operator.
    fn read_punct(&mut self) {
        const FOUR: [&[u8; 4]; 1] = [b">>>="];
        const THREE: [&[u8; 3]; 5] = [b">>>", b">>=", b"===", b"!==", b"<<="];
        const TWO: [&[u8; 2]; 19] = [
            b"==", b"!=", b"<=", b">=", b"&&", b"||", b"++", b"--", b"+=", b"-=",
            b"*=", b"/=", b"%=", b"&=", b"|=", b"^=", b"<<", b">>", b"::",
        ];
        let rest = &self.bytes[self.pos - 1..];
        if FOUR.iter().any(|op| rest.starts_with(*op)) {
            self.advance();
            self.advance();
            self.advance();
        } else if THREE.iter().any(|op| rest.starts_with(*op)) {
            self.advance();
            self.advance();
        } else if TWO.iter().any(|op| rest.starts_with(*op)) {
            self.advance();
        }
    }
}

pub fn tokenize(source: &str) -> Vec<Tok> {
    DialectLexer::new(source).tokenize()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::token::render;

    fn kinds(src: &str) -> Vec<(TokKind, String)> {
        tokenize(src).into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn round_trips_text_exactly() {
        let src = "int x = 5; // five\nfloat[] a = {1.5f, 2};\n/* block */ String s = \"a\\\"b\";";
        assert_eq!(render(&tokenize(src)), src);
    }

    #[test]
    fn float_suffix_stays_in_number() {
        assert_eq!(kinds("3.0f"), vec![(TokKind::Number, "3.0f".into())]);
        assert_eq!(kinds("10f"), vec![(TokKind::Number, "10f".into())]);
    }

    #[test]
    fn member_access_after_number_is_not_fraction() {
        let k = kinds("a.length");
        assert_eq!(k[1], (TokKind::Punct, ".".into()));
    }

    #[test]
    fn hex_color_needs_exactly_six_digits() {
        assert_eq!(kinds("#ff0000"), vec![(TokKind::HexColor, "#ff0000".into())]);
        assert_eq!(kinds("#ff00001")[0].0, TokKind::Punct);
    }

    #[test]
    fn multi_char_operators() {
        let k: Vec<String> = kinds("a >>> b != c && d++").into_iter().map(|(_, t)| t).collect();
        assert_eq!(k, vec!["a", ">>>", "b", "!=", "c", "&&", "d", "++"]);
    }

    #[test]
    fn shift_assignments_are_single_tokens() {
        let k: Vec<String> = kinds("a >>= 1; b >>>= 2; c <<= 3").into_iter().map(|(_, t)| t).collect();
        assert_eq!(k, vec!["a", ">>=", "1", ";", "b", ">>>=", "2", ";", "c", "<<=", "3"]);
    }

    #[test]
    fn char_literal_with_escape() {
        assert_eq!(kinds(r"'\n'"), vec![(TokKind::Char, r"'\n'".into())]);
    }

    #[test]
    fn line_numbers_follow_newlines() {
        let toks: Vec<Tok> = tokenize("a\n\nb").into_iter().filter(|t| !t.is_trivia()).collect();
        assert_eq!((toks[0].line, toks[1].line), (1, 3));
    }

    #[test]
    fn non_ascii_text_survives() {
        let src = "String s = \"héllo\"; // ü";
        assert_eq!(render(&tokenize(src)), src);
    }
}
