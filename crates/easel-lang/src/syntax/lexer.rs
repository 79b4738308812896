use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

/// Lexer for translated script text.
pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'+' => {
                if self.matches(b'+') { TokenKind::PlusPlus }
                else if self.matches(b'=') { TokenKind::PlusEq }
                else { TokenKind::Plus }
            }
            b'-' => {
                if self.matches(b'-') { TokenKind::MinusMinus }
                else if self.matches(b'=') { TokenKind::MinusEq }
                else { TokenKind::Minus }
            }
            b'*' => if self.matches(b'=') { TokenKind::StarEq } else { TokenKind::Star },
            b'%' => if self.matches(b'=') { TokenKind::PercentEq } else { TokenKind::Percent },
            b'^' => if self.matches(b'=') { TokenKind::CaretEq } else { TokenKind::Caret },
            b'~' => TokenKind::Tilde,
            b'?' => TokenKind::Question,
            b':' => TokenKind::Colon,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'/' => {
                if self.peek() == b'/' { self.skip_line(); return Ok(None); }
                else if self.peek() == b'*' { self.skip_block_comment(line, col)?; return Ok(None); }
                else if self.matches(b'=') { TokenKind::SlashEq }
                else { TokenKind::Slash }
            }
            b'=' => {
                if self.matches(b'=') {
                    if self.matches(b'=') { TokenKind::EqEqEq } else { TokenKind::EqEq }
                } else {
                    TokenKind::Eq
                }
            }
            b'!' => {
                if self.matches(b'=') {
                    if self.matches(b'=') { TokenKind::BangEqEq } else { TokenKind::BangEq }
                } else {
                    TokenKind::Bang
                }
            }
            b'&' => {
                if self.matches(b'&') { TokenKind::AmpAmp }
                else if self.matches(b'=') { TokenKind::AmpEq }
                else { TokenKind::Amp }
            }
            b'|' => {
                if self.matches(b'|') { TokenKind::PipePipe }
                else if self.matches(b'=') { TokenKind::PipeEq }
                else { TokenKind::Pipe }
            }
            b'<' => {
                if self.matches(b'<') {
                    if self.matches(b'=') { TokenKind::LtLtEq } else { TokenKind::LtLt }
                } else if self.matches(b'=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if self.matches(b'>') {
                    if self.matches(b'>') {
                        if self.matches(b'=') { TokenKind::GtGtGtEq } else { TokenKind::GtGtGt }
                    } else if self.matches(b'=') {
                        TokenKind::GtGtEq
                    } else {
                        TokenKind::GtGt
                    }
                } else if self.matches(b'=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }

            b'.' if self.peek().is_ascii_digit() => TokenKind::Number(self.read_number(ch)),
            b'.' => TokenKind::Dot,
            b'"' | b'\'' => TokenKind::StringLit(self.read_string(ch, line, col)?),
            b'0'..=b'9' => TokenKind::Number(self.read_number(ch)),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => keyword_or_ident(self.read_ident(ch)),

            other => {
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{}`", other as char)));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        else if ch & 0xC0 != 0x80 { self.column += 1; }
        ch
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == expected { self.advance(); true } else { false }
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() { 0 } else { self.source[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
    }

    fn skip_block_comment(&mut self, line: usize, col: usize) -> Result<(), Error> {
        self.advance(); // consume *
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance(); // *
                self.advance(); // /
                return Ok(());
            }
            self.advance();
        }
        Err(Error::new(ErrorCode::L003, line, col, "unterminated block comment"))
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Unknown escapes keep the escaped character.
    fn read_string(&mut self, quote: u8, start_line: usize, start_col: usize) -> Result<String, Error> {
        let mut bytes = Vec::new();
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(Error::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal"));
            }
            let ch = self.advance();
            if ch == quote { break; }
            if ch != b'\\' {
                bytes.push(ch);
                continue;
            }
            if self.is_at_end() { continue; }
            match self.advance() {
                b'n' => bytes.push(b'\n'),
                b't' => bytes.push(b'\t'),
                b'r' => bytes.push(b'\r'),
                b'b' => bytes.push(0x08),
                b'f' => bytes.push(0x0C),
                b'0' => bytes.push(0),
                b'u' => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        match (self.peek() as char).to_digit(16) {
                            Some(d) => { self.advance(); code = code * 16 + d; }
                            None => break,
                        }
                    }
                    let c = char::from_u32(code).unwrap_or('\u{FFFD}');
                    bytes.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
                }
                other => bytes.push(other),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_number(&mut self, first: u8) -> f64 {
        if first == b'0' && matches!(self.peek(), b'x' | b'X') {
            self.advance();
            let mut value = 0f64;
            while let Some(d) = (self.peek() as char).to_digit(16) {
                self.advance();
                value = value * 16.0 + d as f64;
            }
            return value;
        }

        let mut s = String::new();
        s.push(first as char);
        while self.peek().is_ascii_digit() {
            s.push(self.advance() as char);
        }
        // consume decimal only if followed by a digit (keeps `a.b` on numbers)
        if first != b'.' && self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            s.push(self.advance() as char);
            while self.peek().is_ascii_digit() {
                s.push(self.advance() as char);
            }
        }
        if matches!(self.peek(), b'e' | b'E')
            && (self.peek_next().is_ascii_digit() || matches!(self.peek_next(), b'+' | b'-'))
        {
            s.push(self.advance() as char);
            if matches!(self.peek(), b'+' | b'-') { s.push(self.advance() as char); }
            while self.peek().is_ascii_digit() {
                s.push(self.advance() as char);
            }
        }
        s.parse().unwrap_or(0.0)
    }

    fn read_ident(&mut self, first: u8) -> String {
        let mut s = String::new();
        s.push(first as char);
        while self.peek().is_ascii_alphanumeric() || matches!(self.peek(), b'_' | b'$') {
            s.push(self.advance() as char);
        }
        s
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
