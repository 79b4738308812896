#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Bool(bool),
    Ident(String),
    StringLit(String),

    // Keywords
    Var,
    Function,
    If,
    Else,
    While,
    Do,
    For,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Throw,
    Try,
    Catch,
    Finally,
    New,
    This,
    Null,
    With,
    Typeof,
    Instanceof,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    PlusPlus,   // ++
    MinusMinus, // --
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    LtLtEq,     // <<=
    GtGtEq,     // >>=
    GtGtGtEq,   // >>>=
    Eq,         // =
    EqEq,       // ==
    BangEq,     // !=
    EqEqEq,     // ===
    BangEqEq,   // !==
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    LtLt,       // <<
    GtGt,       // >>
    GtGtGt,     // >>>
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    Bang,       // !
    AmpAmp,     // &&
    PipePipe,   // ||
    Question,   // ?

    // Punctuation
    Colon,      // :
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Bool(_) | Self::StringLit(_) | Self::Null)
    }

    /// Compound assignment operators and the binary operator they apply.
    pub fn compound_op(&self) -> Option<crate::syntax::ast::BinOp> {
        use crate::syntax::ast::BinOp;
        Some(match self {
            Self::PlusEq    => BinOp::Add,
            Self::MinusEq   => BinOp::Sub,
            Self::StarEq    => BinOp::Mul,
            Self::SlashEq   => BinOp::Div,
            Self::PercentEq => BinOp::Mod,
            Self::AmpEq     => BinOp::BitAnd,
            Self::PipeEq    => BinOp::BitOr,
            Self::CaretEq   => BinOp::BitXor,
            Self::LtLtEq    => BinOp::Shl,
            Self::GtGtEq    => BinOp::Shr,
            Self::GtGtGtEq  => BinOp::UShr,
            _ => return None,
        })
    }

    /// Tokens that begin a statement; used for error recovery.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Var | Self::Function | Self::If | Self::While | Self::Do | Self::For
            | Self::Switch | Self::Return | Self::Throw | Self::Try | Self::With
        )
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "var"        => TokenKind::Var,
        "function"   => TokenKind::Function,
        "if"         => TokenKind::If,
        "else"       => TokenKind::Else,
        "while"      => TokenKind::While,
        "do"         => TokenKind::Do,
        "for"        => TokenKind::For,
        "switch"     => TokenKind::Switch,
        "case"       => TokenKind::Case,
        "default"    => TokenKind::Default,
        "break"      => TokenKind::Break,
        "continue"   => TokenKind::Continue,
        "return"     => TokenKind::Return,
        "throw"      => TokenKind::Throw,
        "try"        => TokenKind::Try,
        "catch"      => TokenKind::Catch,
        "finally"    => TokenKind::Finally,
        "new"        => TokenKind::New,
        "this"       => TokenKind::This,
        "null"       => TokenKind::Null,
        "with"       => TokenKind::With,
        "typeof"     => TokenKind::Typeof,
        "instanceof" => TokenKind::Instanceof,
        "true"       => TokenKind::Bool(true),
        "false"      => TokenKind::Bool(false),
        _            => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
