use std::rc::Rc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
}

// ─── Functions ───────────────────────────────────────────────────────────────

/// `function name(a, b) { ... }`, as a declaration or an expression. Shared
/// between every closure created from it.
#[derive(Debug)]
pub struct FnDef {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `var a = 1, b`
    Var(Vec<(String, Option<Expr>)>, Span),
    /// `function f() { }` — hoisted to the top of its block.
    Function(Rc<FnDef>),
    If(IfStmt),
    While(WhileStmt),
    /// `do { } while (cond)`
    DoWhile(WhileStmt),
    For(ForStmt),
    Switch(SwitchStmt),
    Try(TryStmt),
    /// `with (receiver) { }`
    With {
        object: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Return(Option<Expr>, Span),
    Throw(Expr, Span),
    Block(Vec<Stmt>),
    /// A standalone expression used as a statement (e.g. a function call).
    Expr(Expr),
    Empty,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub step: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub discriminant: Expr,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

/// `case test:` or `default:` (test = None).
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub param: Option<String>,
    pub handler: Option<Vec<Stmt>>,
    pub finalizer: Option<Vec<Stmt>>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64, Span),
    Bool(bool, Span),
    StringLit(String, Span),
    Null(Span),
    This(Span),
    Ident(String, Span),

    /// `[1, 2, 3]`
    Array(Vec<Expr>, Span),

    /// `function (a) { ... }`
    Function(Rc<FnDef>),

    /// `a + b`, `a == b`, `a && b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `!x`, `-x`, `typeof x`
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `++x`, `x--`
    Update {
        increment: bool,
        prefix: bool,
        target: Box<Expr>,
        span: Span,
    },

    /// `target = value`, `target += value`
    Assign {
        target: Box<Expr>,
        op: Option<BinOp>,
        value: Box<Expr>,
        span: Span,
    },

    /// `cond ? then : else`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: Span,
    },

    /// `callee(args)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// `new Callee(args)`
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// `expr.field`
    Member {
        object: Box<Expr>,
        property: String,
        span: Span,
    },

    /// `expr[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// `a, b`
    Sequence(Vec<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Number(_, s)      => s,
            Expr::Bool(_, s)        => s,
            Expr::StringLit(_, s)   => s,
            Expr::Null(s)           => s,
            Expr::This(s)           => s,
            Expr::Ident(_, s)       => s,
            Expr::Array(_, s)       => s,
            Expr::Function(f)       => &f.span,
            Expr::Binary { span, .. }   => span,
            Expr::Unary { span, .. }    => span,
            Expr::Update { span, .. }   => span,
            Expr::Assign { span, .. }   => span,
            Expr::Ternary { span, .. }  => span,
            Expr::Call { span, .. }     => span,
            Expr::New { span, .. }      => span,
            Expr::Member { span, .. }   => span,
            Expr::Index { span, .. }    => span,
            Expr::Sequence(_, s)    => s,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }

    /// Valid left-hand side of an assignment or update.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Ident(..) | Expr::Member { .. } | Expr::Index { .. })
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod,
    Eq, NotEq, StrictEq, StrictNotEq,
    Lt, LtEq, Gt, GtEq,
    BitAnd, BitOr, BitXor, Shl, Shr, UShr,
    And, Or,
    Instanceof,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Typeof,
}
