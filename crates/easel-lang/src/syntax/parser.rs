use std::rc::Rc;

use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

/// Recursive-descent parser for translated script text. Semicolons are
/// optional statement terminators.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Program, Vec<Error>> {
        let mut errors = Vec::new();
        let mut body = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            match self.parse_stmt() {
                Ok(s) => body.push(s),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // guarantee progress — if nothing was consumed, force-advance
            // to prevent an infinite loop on unrecognised tokens
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Program { body })
        } else {
            Err(errors)
        }
    }

    // ─── Functions ───────────────────────────────────────────────────────────

    /// After `function`: `[name](params) { body }`.
    fn parse_function(&mut self, span: Span) -> Result<Rc<FnDef>, Error> {
        let name = match self.peek_kind() {
            TokenKind::Ident(n) => { self.advance(); Some(n) }
            _ => None,
        };
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            params.push(self.expect_ident()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Rc::new(FnDef { name, params, body, span }))
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Vec<Stmt>, Error> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::Semicolon => { self.advance(); Ok(Stmt::Empty) }
            TokenKind::LBrace   => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Var      => {
                let stmt = self.parse_var()?;
                self.end_stmt();
                Ok(stmt)
            }
            TokenKind::Function => {
                // a named declaration; `function (..) {}` falls through to an expression
                if matches!(self.peek_at(1), TokenKind::Ident(_)) {
                    self.advance();
                    Ok(Stmt::Function(self.parse_function(span)?))
                } else {
                    self.parse_expr_stmt()
                }
            }
            TokenKind::If       => self.parse_if(),
            TokenKind::While    => self.parse_while(),
            TokenKind::Do       => self.parse_do_while(),
            TokenKind::For      => self.parse_for(),
            TokenKind::Switch   => self.parse_switch(),
            TokenKind::Try      => self.parse_try(),
            TokenKind::With     => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let object = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::With { object, body, span })
            }
            TokenKind::Break    => { self.advance(); self.end_stmt(); Ok(Stmt::Break(span)) }
            TokenKind::Continue => { self.advance(); self.end_stmt(); Ok(Stmt::Continue(span)) }
            TokenKind::Return   => {
                self.advance();
                let value = if self.at_stmt_end() { None } else { Some(self.parse_expr()?) };
                self.end_stmt();
                Ok(Stmt::Return(value, span))
            }
            TokenKind::Throw    => {
                self.advance();
                let value = self.parse_expr()?;
                self.end_stmt();
                Ok(Stmt::Throw(value, span))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, Error> {
        let expr = self.parse_expr()?;
        self.end_stmt();
        Ok(Stmt::Expr(expr))
    }

    /// `var a = 1, b` — without the terminator.
    fn parse_var(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Var)?;
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.matches(TokenKind::Eq) { Some(self.parse_assignment()?) } else { None };
            decls.push((name, init));
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(Stmt::Var(decls, span))
    }

    fn parse_paren_expr(&mut self) -> Result<Expr, Error> {
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        let condition = self.parse_paren_expr()?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { condition, then_branch, else_branch, span }))
    }

    fn parse_while(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::While)?;
        let condition = self.parse_paren_expr()?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    fn parse_do_while(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_stmt()?);
        self.expect(TokenKind::While)?;
        let condition = self.parse_paren_expr()?;
        self.end_stmt();
        Ok(Stmt::DoWhile(WhileStmt { condition, body, span }))
    }

    fn parse_for(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let init = match self.peek_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Var => Some(Box::new(self.parse_var()?)),
            _ => Some(Box::new(Stmt::Expr(self.parse_expr()?))),
        };
        self.expect(TokenKind::Semicolon)?;
        let condition = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(TokenKind::Semicolon)?;
        let step = if self.check(TokenKind::RParen) { None } else { Some(self.parse_expr()?) };
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For(ForStmt { init, condition, step, body, span }))
    }

    fn parse_switch(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Switch)?;
        let discriminant = self.parse_paren_expr()?;
        self.expect(TokenKind::LBrace)?;
        let mut cases = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let test = if self.matches(TokenKind::Default) {
                None
            } else {
                self.expect(TokenKind::Case)?;
                Some(self.parse_expr()?)
            };
            self.expect(TokenKind::Colon)?;
            let mut body = Vec::new();
            while !matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof) {
                body.push(self.parse_stmt()?);
            }
            cases.push(SwitchCase { test, body });
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Switch(SwitchStmt { discriminant, cases, span }))
    }

    fn parse_try(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Try)?;
        let body = self.parse_block()?;
        let (mut param, mut handler, mut finalizer) = (None, None, None);
        if self.matches(TokenKind::Catch) {
            self.expect(TokenKind::LParen)?;
            param = Some(self.expect_ident()?);
            self.expect(TokenKind::RParen)?;
            handler = Some(self.parse_block()?);
        }
        if self.matches(TokenKind::Finally) {
            finalizer = Some(self.parse_block()?);
        }
        if handler.is_none() && finalizer.is_none() {
            return Err(self.unexpected("`catch` or `finally`"));
        }
        Ok(Stmt::Try(TryStmt { body, param, handler, finalizer, span }))
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Expr, Error> {
        let first = self.parse_assignment()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let span = first.span().clone();
        let mut exprs = vec![first];
        while self.matches(TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(exprs, span))
    }

    fn parse_assignment(&mut self) -> Result<Expr, Error> {
        let target = self.parse_ternary()?;
        let kind = self.peek_kind();
        let op = match kind {
            TokenKind::Eq => None,
            ref k => match k.compound_op() {
                Some(op) => Some(op),
                None => return Ok(target),
            },
        };
        if !target.is_assignable() {
            let tok = self.peek().clone();
            return Err(Error::new(ErrorCode::P003, tok.line, tok.column, "invalid assignment target"));
        }
        let span = target.span().clone();
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign { target: Box::new(target), op, value: Box::new(value), span })
    }

    fn parse_ternary(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_binary(0)?;
        if self.matches(TokenKind::Question) {
            let span = expr.span().clone();
            let then_expr = self.parse_assignment()?;
            self.expect(TokenKind::Colon)?;
            let else_expr = self.parse_assignment()?;
            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span,
            });
        }
        Ok(expr)
    }

    /// Precedence climbing over the binary operator table, lowest level first.
    fn parse_binary(&mut self, level: usize) -> Result<Expr, Error> {
        if level == BINARY_LEVELS {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        loop {
            let Some(op) = binary_op(level, &self.peek_kind()) else { break };
            let span = left.span().clone();
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Minus  => Some(UnOp::Neg),
            TokenKind::Plus   => Some(UnOp::Plus),
            TokenKind::Bang   => Some(UnOp::Not),
            TokenKind::Tilde  => Some(UnOp::BitNot),
            TokenKind::Typeof => Some(UnOp::Typeof),
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.check(TokenKind::PlusPlus);
                self.advance();
                let target = self.parse_unary()?;
                if !target.is_assignable() {
                    return Err(self.error_here(ErrorCode::P003, "invalid update target"));
                }
                return Ok(Expr::Update { increment, prefix: true, target: Box::new(target), span });
            }
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op, operand: Box::new(operand), span });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_call()?;
        if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) && expr.is_assignable() {
            let span = expr.span().clone();
            let increment = self.check(TokenKind::PlusPlus);
            self.advance();
            return Ok(Expr::Update { increment, prefix: false, target: Box::new(expr), span });
        }
        Ok(expr)
    }

    fn parse_call(&mut self) -> Result<Expr, Error> {
        let mut expr = if self.check(TokenKind::New) { self.parse_new()? } else { self.parse_primary()? };

        loop {
            let span = expr.span().clone();
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.expect_property()?;
                    expr = Expr::Member { object: Box::new(expr), property, span };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { object: Box::new(expr), index: Box::new(index), span };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arg_list()?;
                    expr = Expr::Call { callee: Box::new(expr), args, span };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `new Callee.path[idx](args)` — the argument list is optional.
    fn parse_new(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::New)?;
        let mut callee = if self.check(TokenKind::New) { self.parse_new()? } else { self.parse_primary()? };
        loop {
            let cspan = callee.span().clone();
            if self.matches(TokenKind::Dot) {
                let property = self.expect_property()?;
                callee = Expr::Member { object: Box::new(callee), property, span: cspan };
            } else if self.matches(TokenKind::LBracket) {
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                callee = Expr::Index { object: Box::new(callee), index: Box::new(index), span: cspan };
            } else {
                break;
            }
        }
        let args = if self.matches(TokenKind::LParen) { self.parse_arg_list()? } else { Vec::new() };
        Ok(Expr::New { callee: Box::new(callee), args, span })
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let tok = self.advance();
        match tok.kind {
            TokenKind::Number(n)    => Ok(Expr::Number(n, span)),
            TokenKind::Bool(b)      => Ok(Expr::Bool(b, span)),
            TokenKind::StringLit(s) => Ok(Expr::StringLit(s, span)),
            TokenKind::Null         => Ok(Expr::Null(span)),
            TokenKind::This         => Ok(Expr::This(span)),
            TokenKind::Ident(name)  => Ok(Expr::Ident(name, span)),
            TokenKind::Function     => Ok(Expr::Function(self.parse_function(span)?)),

            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            TokenKind::LBracket => {
                let mut items = Vec::new();
                while !self.check(TokenKind::RBracket) && !self.is_at_end() {
                    items.push(self.parse_assignment()?);
                    if !self.matches(TokenKind::Comma) { break; }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::Array(items, span))
            }

            _ => Err(self.error_at(&tok, &format!("expected expression, found {:?}", tok.kind))),
        }
    }

    /// After `(`: comma-separated arguments and the closing `)`.
    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_assignment()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        let i = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[i].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            _ => Err(self.error_at(&tok, "expected identifier")),
        }
    }

    /// Property names may be keywords (`obj.default`, `list.new`).
    fn expect_property(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            TokenKind::Default => Ok("default".into()),
            TokenKind::New => Ok("new".into()),
            TokenKind::Null => Ok("null".into()),
            TokenKind::Catch => Ok("catch".into()),
            _ => Err(self.error_at(&tok, "expected property name")),
        }
    }

    fn at_stmt_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof)
    }

    fn end_stmt(&mut self) {
        self.matches(TokenKind::Semicolon);
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_here(&self, code: ErrorCode, msg: &str) -> Error {
        let tok = self.peek();
        Error::new(code, tok.line, tok.column, msg)
    }

    fn error_at(&self, tok: &Token, msg: &str) -> Error {
        Error::new(ErrorCode::P001, tok.line, tok.column, msg)
    }

    /// Skip tokens until we find something that looks like a new statement.
    /// Used after a parse error to attempt recovery.
    fn recover(&mut self) {
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Semicolon {
                self.advance();
                break;
            }
            if kind == TokenKind::Eof || kind == TokenKind::RBrace || kind.starts_statement() {
                break;
            }
            self.advance();
        }
    }
}

/// Number of binary precedence levels below unary.
const BINARY_LEVELS: usize = 10;

/// Binary operator for `kind` at precedence `level` (0 = loosest).
fn binary_op(level: usize, kind: &TokenKind) -> Option<BinOp> {
    use TokenKind as T;
    let op = match (level, kind) {
        (0, T::PipePipe)   => BinOp::Or,
        (1, T::AmpAmp)     => BinOp::And,
        (2, T::Pipe)       => BinOp::BitOr,
        (3, T::Caret)      => BinOp::BitXor,
        (4, T::Amp)        => BinOp::BitAnd,
        (5, T::EqEq)       => BinOp::Eq,
        (5, T::BangEq)     => BinOp::NotEq,
        (5, T::EqEqEq)     => BinOp::StrictEq,
        (5, T::BangEqEq)   => BinOp::StrictNotEq,
        (6, T::Lt)         => BinOp::Lt,
        (6, T::LtEq)       => BinOp::LtEq,
        (6, T::Gt)         => BinOp::Gt,
        (6, T::GtEq)       => BinOp::GtEq,
        (6, T::Instanceof) => BinOp::Instanceof,
        (7, T::LtLt)       => BinOp::Shl,
        (7, T::GtGt)       => BinOp::Shr,
        (7, T::GtGtGt)     => BinOp::UShr,
        (8, T::Plus)       => BinOp::Add,
        (8, T::Minus)      => BinOp::Sub,
        (9, T::Star)       => BinOp::Mul,
        (9, T::Slash)      => BinOp::Div,
        (9, T::Percent)    => BinOp::Mod,
        _ => return None,
    };
    Some(op)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_expr_src(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let mut p = Parser::new(tokens);
        p.parse_expr().expect("parse_expr failed")
    }

    fn parse_err(src: &str) -> Vec<Error> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse error")
    }

    #[test]
    fn var_with_several_declarators() {
        let p = parse("var a = 1, b;");
        let Stmt::Var(decls, _) = &p.body[0] else { panic!("expected var") };
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].0, "a");
        assert!(decls[1].1.is_none());
    }

    #[test]
    fn semicolons_are_optional() {
        let p = parse("a = 1\nb = 2\n");
        assert_eq!(p.body.len(), 2);
    }

    #[test]
    fn function_declaration_and_expression() {
        let p = parse("function f(a, b) { return a + b; } var g = function (x) { };");
        let Stmt::Function(f) = &p.body[0] else { panic!("expected function") };
        assert_eq!(f.name.as_deref(), Some("f"));
        assert_eq!(f.params, vec!["a", "b"]);
        assert!(matches!(&p.body[1], Stmt::Var(d, _) if matches!(d[0].1, Some(Expr::Function(_)))));
    }

    #[test]
    fn member_registration_statement() {
        let p = parse("sketch.draw = function draw() { background(0); }");
        let Stmt::Expr(Expr::Assign { target, value, .. }) = &p.body[0] else { panic!("expected assign") };
        assert!(matches!(target.as_ref(), Expr::Member { property, .. } if property == "draw"));
        assert!(matches!(value.as_ref(), Expr::Function(_)));
    }

    #[test]
    fn binary_precedence() {
        let e = parse_expr_src("1 + 2 * 3");
        let Expr::Binary { op: BinOp::Add, right, .. } = e else { panic!("expected add") };
        assert!(matches!(right.as_ref(), Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn bitwise_binds_looser_than_comparison() {
        let e = parse_expr_src("a & b == c");
        assert!(matches!(e, Expr::Binary { op: BinOp::BitAnd, .. }));
        let e = parse_expr_src("0|x * 2");
        assert!(matches!(e, Expr::Binary { op: BinOp::BitOr, .. }));
    }

    #[test]
    fn ternary_and_compound_assign() {
        let e = parse_expr_src("x += a ? 1 : 2");
        let Expr::Assign { op: Some(BinOp::Add), value, .. } = e else { panic!("expected compound") };
        assert!(matches!(value.as_ref(), Expr::Ternary { .. }));
    }

    #[test]
    fn new_with_and_without_arguments() {
        assert!(matches!(parse_expr_src("new Ball(1, 2)"), Expr::New { ref args, .. } if args.len() == 2));
        assert!(matches!(parse_expr_src("new Ball"), Expr::New { ref args, .. } if args.is_empty()));
        let e = parse_expr_src("new PVector(1, 2).mag()");
        assert!(matches!(e, Expr::Call { .. }));
    }

    #[test]
    fn update_expressions() {
        assert!(matches!(parse_expr_src("i++"), Expr::Update { increment: true, prefix: false, .. }));
        assert!(matches!(parse_expr_src("--a[0]"), Expr::Update { increment: false, prefix: true, .. }));
    }

    #[test]
    fn for_loop_with_sequence_step() {
        let p = parse("for (var i = 0, j = 9; i < j; i++, j--) { }");
        let Stmt::For(f) = &p.body[0] else { panic!("expected for") };
        assert!(matches!(f.step, Some(Expr::Sequence(ref v, _)) if v.len() == 2));
    }

    #[test]
    fn with_statement() {
        let p = parse("function Ball() { with (this) { this.x = 0; } }");
        let Stmt::Function(f) = &p.body[0] else { panic!("expected function") };
        assert!(matches!(f.body[0], Stmt::With { .. }));
    }

    #[test]
    fn switch_cases() {
        let p = parse("switch (k) { case 1: a(); break; case 2: default: b(); }");
        let Stmt::Switch(s) = &p.body[0] else { panic!("expected switch") };
        assert_eq!(s.cases.len(), 3);
        assert!(s.cases[2].test.is_none());
    }

    #[test]
    fn try_catch() {
        let p = parse("try { a(); } catch (e) { b(e); }");
        assert!(matches!(&p.body[0], Stmt::Try(t) if t.param.as_deref() == Some("e")));
    }

    #[test]
    fn iife_with_apply() {
        let p = parse("(function(a) { }).apply(this, arguments);");
        assert!(matches!(&p.body[0], Stmt::Expr(Expr::Call { .. })));
    }

    #[test]
    fn invalid_assignment_target() {
        let errs = parse_err("1 = 2;");
        assert_eq!(errs[0].code, ErrorCode::P003);
    }

    #[test]
    fn missing_paren_reports_and_recovers() {
        let errs = parse_err("if (a { }\nvar b = ;\nvar c = 1;");
        assert!(errs.len() >= 1);
        assert!(errs.iter().all(|e| matches!(e.code, ErrorCode::P001 | ErrorCode::P002)));
    }
}
