//! Tree-walking interpreter for translated sketch programs.
//! Built-in calls are dispatched through the NamespaceRegistry and the
//! TypeRegistry; the interpreter only implements the language itself plus the
//! three intrinsics the class rewriter emits (`addMethod`, `extendClass`) and
//! `redraw`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::library;
use crate::namespaces::{NamespaceRegistry, value_type_name};
use crate::runtime::scope::{Scope, ScopeKind};
use crate::runtime::value::{
    Closure, MAX_ELEMENTS, Object, Value, add_overload, parse_number, select_overload,
};
use crate::syntax::ast::{BinOp, Expr, Program, Span, Stmt, SwitchStmt, TryStmt, UnOp};
use crate::types::registry::TypeRegistry;

/// Script call nesting limit.
pub const MAX_CALL_DEPTH: usize = 100;

const INTRINSICS: [&str; 3] = ["addMethod", "extendClass", "redraw"];

/// Completion of a statement.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Assignable location, evaluated once for compound assignment.
enum Place {
    Name(String),
    Member(Value, String),
    Index(Value, Value),
}

// ─── Interpreter ──────────────────────────────────────────────────────────────

pub struct Interpreter {
    program: Rc<Program>,
    pub env: Environment,
    registry: NamespaceRegistry,
    types: TypeRegistry,
    global: Rc<Scope>,
    depth: usize,
    /// Value of the last `throw`, handed to the matching `catch`.
    thrown: Option<Value>,
}

impl Interpreter {
    pub fn new(program: Program, env: Environment) -> Self {
        Self {
            program: Rc::new(program),
            env,
            registry: NamespaceRegistry::standard(),
            types: TypeRegistry::default(),
            global: Scope::global(),
            depth: 0,
            thrown: None,
        }
    }

    // ─── Entry points ─────────────────────────────────────────────────────────

    /// Evaluates the top level; function and class registrations land in the
    /// global scope.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let program = self.program.clone();
        let global = self.global.clone();
        self.exec_block(&program.body, &global)?;
        Ok(())
    }

    /// A top-level binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.global.get_own(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.global(name).is_some_and(|v| v.is_callable())
    }

    /// Calls a top-level function. `Ok(None)` when none is registered.
    pub fn call_global(&mut self, name: &str, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
        let Some(f) = self.global(name).filter(Value::is_callable) else {
            return Ok(None);
        };
        self.call_value(&f, Value::Undefined, args, 0).map(Some)
    }

    /// One animation frame: FPS sample, `frameCount`, then `draw` between a
    /// transform save and restore.
    pub fn draw_frame(&mut self) -> Result<(), RuntimeError> {
        let Some(draw) = self.global("draw").filter(Value::is_callable) else {
            return Ok(());
        };
        self.env.tick_fps();
        self.env.timing.frame_count += 1;
        self.env.in_draw = true;
        self.env.surface.save();
        let result = self.call_value(&draw, Value::Undefined, Vec::new(), 0);
        self.env.surface.restore();
        self.env.in_draw = false;
        result.map(|_| ()).map_err(|e| e.in_callback("draw"))
    }

    // ─── Statements ───────────────────────────────────────────────────────────

    /// Function declarations are bound before the first statement runs.
    fn exec_block(&mut self, stmts: &[Stmt], scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                let f = Value::Function(Rc::new(Closure::new(def.clone(), scope.clone())));
                scope.declare(def.name.as_deref().unwrap_or_default(), Some(f));
            }
        }
        for stmt in stmts {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Var(decls, _) => {
                for (name, init) in decls {
                    let value = match init {
                        Some(e) => Some(self.eval_expr(e, scope)?),
                        None => None,
                    };
                    scope.declare(name, value);
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Expr(e) => {
                self.eval_expr(e, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => self.exec_block(stmts, scope),
            Stmt::If(s) => {
                if self.eval_expr(&s.condition, scope)?.truthy() {
                    self.exec_stmt(&s.then_branch, scope)
                } else if let Some(e) = &s.else_branch {
                    self.exec_stmt(e, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(s) => {
                while self.eval_expr(&s.condition, scope)?.truthy() {
                    match self.exec_stmt(&s.body, scope)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile(s) => {
                loop {
                    match self.exec_stmt(&s.body, scope)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.eval_expr(&s.condition, scope)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For(s) => {
                if let Some(init) = &s.init {
                    self.exec_stmt(init, scope)?;
                }
                loop {
                    if let Some(cond) = &s.condition {
                        if !self.eval_expr(cond, scope)?.truthy() {
                            break;
                        }
                    }
                    match self.exec_stmt(&s.body, scope)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(step) = &s.step {
                        self.eval_expr(step, scope)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Switch(s) => self.exec_switch(s, scope),
            Stmt::Try(t) => self.exec_try(t, scope),
            Stmt::With { object, body, span } => {
                let recv = self.eval_expr(object, scope)?;
                if recv.is_nullish() {
                    return Err(RuntimeError::new(span.line, format!("cannot use `with` on {recv}")));
                }
                let inner = Scope::child(scope, ScopeKind::With(recv));
                self.exec_stmt(body, &inner)
            }
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Return(value, _) => {
                let v = match value {
                    Some(e) => self.eval_expr(e, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(v))
            }
            Stmt::Throw(e, span) => {
                let v = self.eval_expr(e, scope)?;
                let message = v.to_string();
                self.thrown = Some(v);
                Err(RuntimeError::thrown(span.line, message))
            }
        }
    }

    /// Falls through from the first matching case until `break`.
    fn exec_switch(&mut self, s: &SwitchStmt, scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        let value = self.eval_expr(&s.discriminant, scope)?;
        let mut start = None;
        for (i, case) in s.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.eval_expr(test, scope)?.strict_eq(&value) {
                    start = Some(i);
                    break;
                }
            }
        }
        let start = start.or_else(|| s.cases.iter().position(|c| c.test.is_none()));
        let Some(start) = start else { return Ok(Flow::Normal) };
        for case in &s.cases[start..] {
            match self.exec_block(&case.body, scope)? {
                Flow::Normal => {}
                Flow::Break => break,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_try(&mut self, t: &TryStmt, scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        let mut result = self.exec_block(&t.body, scope);
        if let (Err(e), Some(handler)) = (&result, &t.handler) {
            let caught = match e.kind {
                RuntimeErrorKind::Thrown => self.thrown.take().unwrap_or_else(|| Value::str(e.message.as_str())),
                _ => Value::str(e.message.as_str()),
            };
            let inner = Scope::child(scope, ScopeKind::Catch);
            if let Some(param) = &t.param {
                inner.bind(param, caught);
            }
            result = self.exec_block(handler, &inner);
        }
        if let Some(finalizer) = &t.finalizer {
            match self.exec_block(finalizer, scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        result
    }

    // ─── Expression evaluator ─────────────────────────────────────────────────

    pub fn eval_expr(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(n, _)    => Ok(Value::Number(*n)),
            Expr::Bool(b, _)      => Ok(Value::Bool(*b)),
            Expr::StringLit(s, _) => Ok(Value::Str(s.clone())),
            Expr::Null(_)         => Ok(Value::Null),
            Expr::This(_)         => Ok(scope.this()),
            Expr::Ident(name, span) => self.lookup(name, scope, span.line),

            Expr::Array(items, _) => {
                let vals = self.eval_args(items, scope)?;
                Ok(Value::array(vals))
            }

            Expr::Function(def) => {
                Ok(Value::Function(Rc::new(Closure::new(def.clone(), scope.clone()))))
            }

            Expr::Binary { left, op: BinOp::And, right, .. } => {
                let l = self.eval_expr(left, scope)?;
                if l.truthy() { self.eval_expr(right, scope) } else { Ok(l) }
            }
            Expr::Binary { left, op: BinOp::Or, right, .. } => {
                let l = self.eval_expr(left, scope)?;
                if l.truthy() { Ok(l) } else { self.eval_expr(right, scope) }
            }
            Expr::Binary { left, op, right, .. } => {
                let l = self.eval_expr(left, scope)?;
                let r = self.eval_expr(right, scope)?;
                Ok(eval_binop(*op, &l, &r))
            }

            Expr::Unary { op: UnOp::Typeof, operand, .. } => {
                let v = match operand.as_ref() {
                    Expr::Ident(name, _) => scope.lookup(name).map(|(v, _)| v)
                        .or_else(|| self.resolve_free(name))
                        .unwrap_or(Value::Undefined),
                    e => self.eval_expr(e, scope)?,
                };
                Ok(Value::str(v.type_of()))
            }
            Expr::Unary { op, operand, .. } => {
                let v = self.eval_expr(operand, scope)?;
                Ok(eval_unop(*op, &v))
            }

            Expr::Update { increment, prefix, target, span } => {
                let place = self.place(target, scope)?;
                let old = self.read(&place, scope, span.line)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.write(place, Value::Number(new), scope, span.line)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expr::Assign { target, op, value, span } => {
                let place = self.place(target, scope)?;
                let v = match op {
                    None => self.eval_expr(value, scope)?,
                    Some(op) => {
                        let old = self.read(&place, scope, span.line)?;
                        let rhs = self.eval_expr(value, scope)?;
                        eval_binop(*op, &old, &rhs)
                    }
                };
                self.write(place, v.clone(), scope, span.line)?;
                Ok(v)
            }

            Expr::Ternary { condition, then_expr, else_expr, .. } => {
                if self.eval_expr(condition, scope)?.truthy() {
                    self.eval_expr(then_expr, scope)
                } else {
                    self.eval_expr(else_expr, scope)
                }
            }

            Expr::Call { callee, args, span } => self.eval_call(callee, args, span, scope),
            Expr::New { callee, args, span } => self.eval_new(callee, args, span, scope),

            Expr::Member { object, property, span } => {
                let obj = self.eval_expr(object, scope)?;
                self.get_member(&obj, property, span.line)
            }

            Expr::Index { object, index, span } => {
                let obj = self.eval_expr(object, scope)?;
                let idx = self.eval_expr(index, scope)?;
                self.get_index(&obj, &idx, span.line)
            }

            Expr::Sequence(exprs, _) => {
                let mut last = Value::Undefined;
                for e in exprs {
                    last = self.eval_expr(e, scope)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], scope: &Rc<Scope>) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|a| self.eval_expr(a, scope)).collect()
    }

    // ─── Name resolution ──────────────────────────────────────────────────────

    fn lookup(&self, name: &str, scope: &Rc<Scope>, line: usize) -> Result<Value, RuntimeError> {
        if let Some((v, _)) = scope.lookup(name) {
            return Ok(v);
        }
        self.resolve_free(name)
            .ok_or_else(|| RuntimeError::new(line, format!("`{name}` is not defined")))
    }

    /// Names not bound by the script: live environment variables, constants,
    /// built-in functions, then imported libraries.
    fn resolve_free(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.env.live_var(name) {
            return Some(v);
        }
        if let Some(v) = self.registry.get_constant(name) {
            return Some(v);
        }
        if self.registry.has_function(name)
            || INTRINSICS.contains(&name)
            || library::exports_function(&self.env, name)
        {
            return Some(Value::Native(name.to_string()));
        }
        if let Some(v) = library::imported_constant(&self.env, name) {
            return Some(v);
        }
        match name {
            "undefined" => Some(Value::Undefined),
            "NaN"       => Some(Value::Number(f64::NAN)),
            "Infinity"  => Some(Value::Number(f64::INFINITY)),
            "sketch"    => Some(Value::Sketch),
            _ => None,
        }
    }

    // ─── Places ───────────────────────────────────────────────────────────────

    fn place(&mut self, target: &Expr, scope: &Rc<Scope>) -> Result<Place, RuntimeError> {
        match target {
            Expr::Ident(name, _) => Ok(Place::Name(name.clone())),
            Expr::Member { object, property, .. } => {
                Ok(Place::Member(self.eval_expr(object, scope)?, property.clone()))
            }
            Expr::Index { object, index, .. } => {
                let obj = self.eval_expr(object, scope)?;
                Ok(Place::Index(obj, self.eval_expr(index, scope)?))
            }
            other => Err(RuntimeError::new(other.line(), "invalid assignment target")),
        }
    }

    fn read(&mut self, place: &Place, scope: &Rc<Scope>, line: usize) -> Result<Value, RuntimeError> {
        match place {
            Place::Name(name) => self.lookup(name, scope, line),
            Place::Member(obj, prop) => self.get_member(obj, prop, line),
            Place::Index(obj, idx) => self.get_index(obj, idx, line),
        }
    }

    /// An assignment to an unbound name creates a global.
    fn write(&mut self, place: Place, v: Value, scope: &Rc<Scope>, line: usize) -> Result<(), RuntimeError> {
        match place {
            Place::Name(name) => {
                if !scope.assign(&name, v.clone()) {
                    self.global.bind(&name, v);
                }
                Ok(())
            }
            Place::Member(obj, prop) => self.set_member(&obj, &prop, v, line),
            Place::Index(obj, idx) => self.set_index(&obj, &idx, v, line),
        }
    }

    // ─── Members ──────────────────────────────────────────────────────────────

    fn get_member(&self, obj: &Value, prop: &str, line: usize) -> Result<Value, RuntimeError> {
        match obj {
            Value::Object(o) => Ok(o.borrow().members.get(prop).cloned().unwrap_or(Value::Undefined)),
            Value::Sketch => Ok(self.global(prop).or_else(|| self.resolve_free(prop)).unwrap_or(Value::Undefined)),
            // `PVector.angleBetween`
            Value::Native(n) => Ok(Value::Native(format!("{n}.{prop}"))),
            Value::Function(c) => Ok(c.statics.borrow().get(prop).cloned().unwrap_or(Value::Undefined)),
            Value::Undefined | Value::Null => {
                Err(RuntimeError::new(line, format!("cannot read `{prop}` of {obj}")))
            }
            _ => Ok(self.types.get_field(obj, prop).unwrap_or(Value::Undefined)),
        }
    }

    /// Writes to read-only or unknown fields of built-in values are ignored.
    fn set_member(&mut self, obj: &Value, prop: &str, v: Value, line: usize) -> Result<(), RuntimeError> {
        match obj {
            Value::Object(o) => {
                o.borrow_mut().members.insert(prop.to_string(), v);
            }
            Value::Sketch => self.global.bind(prop, v),
            Value::Function(c) => {
                c.statics.borrow_mut().insert(prop.to_string(), v);
            }
            Value::Undefined | Value::Null => {
                return Err(RuntimeError::new(line, format!("cannot set `{prop}` of {obj}")));
            }
            _ => {
                match self.types.set_field(obj.clone(), prop, v, line) {
                    Some(result) => { result?; }
                    None => log::debug!("ignored write to `{prop}` of {}", value_type_name(obj)),
                }
            }
        }
        Ok(())
    }

    fn get_index(&self, obj: &Value, idx: &Value, line: usize) -> Result<Value, RuntimeError> {
        match (obj, array_index(idx)) {
            (Value::Array(a), Some(i)) => Ok(a.borrow().get(i).cloned().unwrap_or(Value::Undefined)),
            (Value::Str(s), Some(i)) => {
                Ok(s.chars().nth(i).map_or(Value::Undefined, |c| Value::Str(c.to_string())))
            }
            _ => self.get_member(obj, &idx.to_string(), line),
        }
    }

    /// Writing past the end of an array grows it with `undefined`, up to
    /// `MAX_ELEMENTS` entries.
    fn set_index(&mut self, obj: &Value, idx: &Value, v: Value, line: usize) -> Result<(), RuntimeError> {
        match (obj, array_index(idx)) {
            (Value::Array(a), Some(i)) => {
                let mut a = a.borrow_mut();
                if i >= a.len() {
                    if i >= MAX_ELEMENTS {
                        return Err(RuntimeError::new(line, format!("array index {idx} is out of range")));
                    }
                    a.resize(i + 1, Value::Undefined);
                }
                a[i] = v;
                Ok(())
            }
            _ => self.set_member(obj, &idx.to_string(), v, line),
        }
    }

    // ─── Calls ────────────────────────────────────────────────────────────────

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        span: &Span,
        scope: &Rc<Scope>,
    ) -> Result<Value, RuntimeError> {
        let line = span.line;
        match callee {
            Expr::Member { object, property, .. } => {
                let recv = self.eval_expr(object, scope)?;
                let mut vals = self.eval_args(args, scope)?;
                if recv.is_callable() && (property == "apply" || property == "call") {
                    let this = if vals.is_empty() { Value::Undefined } else { vals.remove(0) };
                    let rest = if property == "apply" { spread(vals.first()) } else { vals };
                    return self.call_value(&recv, this, rest, line);
                }
                self.call_method(recv, property, vals, line)
            }
            Expr::Ident(name, _) => {
                let (f, recv) = match scope.lookup(name) {
                    Some(found) => found,
                    None => match self.resolve_free(name) {
                        Some(f) => (f, None),
                        None => return Err(RuntimeError::new(line, format!("`{name}` is not defined"))),
                    },
                };
                if !f.is_callable() {
                    return Err(RuntimeError::new(line, format!("`{name}` is not a function")));
                }
                let vals = self.eval_args(args, scope)?;
                self.call_value(&f, recv.unwrap_or(Value::Undefined), vals, line)
            }
            other => {
                let f = self.eval_expr(other, scope)?;
                let vals = self.eval_args(args, scope)?;
                self.call_value(&f, Value::Undefined, vals, line)
            }
        }
    }

    fn call_method(&mut self, recv: Value, name: &str, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        match &recv {
            Value::Object(o) => {
                let member = o.borrow().members.get(name).cloned();
                match member {
                    Some(f) if f.is_callable() => self.call_value(&f, recv, args, line),
                    _ if name == "toString" => Ok(Value::Str(recv.to_string())),
                    Some(_) => Err(RuntimeError::new(line, format!("`{name}` is not a function"))),
                    None => Err(RuntimeError::new(
                        line,
                        format!("`{name}` is not a method of {}", o.borrow().class),
                    )),
                }
            }
            Value::Sketch => {
                let f = self.get_member(&recv, name, line)?;
                if !f.is_callable() {
                    return Err(RuntimeError::new(line, format!("`{name}` is not a function")));
                }
                self.call_value(&f, Value::Undefined, args, line)
            }
            Value::Native(n) => self.call_native(&format!("{n}.{name}"), args, line),
            Value::Undefined | Value::Null => {
                Err(RuntimeError::new(line, format!("cannot call `{name}` on {recv}")))
            }
            _ => match self.types.call_method(&recv, name, &args, line) {
                Some(result) => result,
                None if name == "toString" => Ok(Value::Str(recv.to_string())),
                None => Err(RuntimeError::new(
                    line,
                    format!("{} has no method `{name}`", value_type_name(&recv)),
                )),
            },
        }
    }

    /// Calls any callable value. An undefined receiver means the sketch.
    pub fn call_value(&mut self, f: &Value, this: Value, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        match f {
            Value::Function(c) => self.call_closure(c, this, args, line),
            Value::Method(table) => {
                let chosen = select_overload(&table.borrow(), args.len());
                match chosen {
                    Some(c) => self.call_closure(&c, this, args, line),
                    None => Err(RuntimeError::new(line, "method has no definitions")),
                }
            }
            Value::Native(name) => self.call_native(name, args, line),
            other => Err(RuntimeError::new(line, format!("{} is not a function", value_type_name(other)))),
        }
    }

    fn call_closure(&mut self, c: &Rc<Closure>, this: Value, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(line, "too much recursion"));
        }
        let this = if matches!(this, Value::Undefined) { Value::Sketch } else { this };
        let frame = Scope::child(&c.scope, ScopeKind::Function { this });
        if let Some(name) = &c.def.name {
            frame.bind(name, Value::Function(c.clone()));
        }
        for (i, p) in c.def.params.iter().enumerate() {
            frame.bind(p, args.get(i).cloned().unwrap_or(Value::Undefined));
        }
        frame.bind("arguments", Value::array(args));

        let def = c.def.clone();
        self.depth += 1;
        let result = self.exec_block(&def.body, &frame);
        self.depth -= 1;
        match result? {
            Flow::Return(v) => Ok(v),
            _ => Ok(Value::Undefined),
        }
    }

    fn call_native(&mut self, name: &str, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        match name {
            "addMethod" => self.add_method(&args, line),
            "extendClass" => self.extend_class(&args, line),
            "redraw" => {
                if !self.env.in_draw {
                    self.draw_frame()?;
                }
                Ok(Value::Undefined)
            }
            _ => {
                if let Some(v) = self.registry.call_any(name, &args, &mut self.env, line)? {
                    return Ok(v);
                }
                if let Some(v) = library::call_imported(&mut self.env, name, &args, line)? {
                    return Ok(v);
                }
                Err(RuntimeError::new(line, format!("`{name}` is not a function")))
            }
        }
    }

    // ─── Classes ──────────────────────────────────────────────────────────────

    /// `new F(args)` runs `F` against a fresh object. Built-in constructors
    /// (`ArrayList`, `PVector`) are plain calls.
    fn eval_new(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        span: &Span,
        scope: &Rc<Scope>,
    ) -> Result<Value, RuntimeError> {
        let ctor = self.eval_expr(callee, scope)?;
        let vals = self.eval_args(args, scope)?;
        match &ctor {
            Value::Function(c) => {
                let mut object = Object::new(c.def.name.clone().unwrap_or_default());
                object.constructors.push(c.clone());
                let obj = Value::Object(Rc::new(RefCell::new(object)));
                let result = self.call_closure(c, obj.clone(), vals, span.line)?;
                Ok(match result {
                    Value::Object(_) | Value::Array(_) => result,
                    _ => obj,
                })
            }
            Value::Native(name) => self.call_native(name, vals, span.line),
            other => Err(RuntimeError::new(span.line, format!("{other} is not a constructor"))),
        }
    }

    /// `addMethod(obj, name, fn)`: adds `fn` to the object's arity table for
    /// `name` at the object's current extension depth.
    fn add_method(&mut self, args: &[Value], line: usize) -> Result<Value, RuntimeError> {
        let [Value::Object(obj), name, Value::Function(f), ..] = args else {
            return Err(RuntimeError::new(line, "`addMethod` expects an object, a name and a function"));
        };
        let name = name.to_string();
        let mut o = obj.borrow_mut();
        let depth = o.depth;
        let existing = match o.members.get(&name) {
            Some(Value::Method(table)) => Some(table.clone()),
            _ => None,
        };
        match existing {
            Some(table) => add_overload(&mut table.borrow_mut(), f.clone(), depth),
            None => {
                let mut table = Vec::new();
                add_overload(&mut table, f.clone(), depth);
                o.members.insert(name, Value::Method(Rc::new(RefCell::new(table))));
            }
        }
        Ok(Value::Undefined)
    }

    /// `extendClass(obj, args, Super)`: runs `Super` against `obj` one
    /// extension level deeper.
    fn extend_class(&mut self, args: &[Value], line: usize) -> Result<Value, RuntimeError> {
        let [Value::Object(obj), argv, sup, ..] = args else {
            return Err(RuntimeError::new(line, "`extendClass` expects an object, arguments and a class"));
        };
        let Value::Function(sup) = sup else {
            return Err(RuntimeError::new(line, format!("superclass {sup} is not a constructor")));
        };
        {
            let mut o = obj.borrow_mut();
            o.depth += 1;
            if let Some(name) = &sup.def.name {
                if !o.classes.contains(name) {
                    o.classes.push(name.clone());
                }
            }
            if !o.constructors.iter().any(|c| Rc::ptr_eq(c, sup)) {
                o.constructors.push(sup.clone());
            }
        }
        let result = self.call_closure(sup, Value::Object(obj.clone()), spread(Some(argv)), line);
        obj.borrow_mut().depth -= 1;
        result.map(|_| Value::Undefined)
    }
}

// ─── Operators ────────────────────────────────────────────────────────────────

fn eval_binop(op: BinOp, l: &Value, r: &Value) -> Value {
    let num = |f: fn(f64, f64) -> f64| Value::Number(f(l.to_number(), r.to_number()));
    let int = |f: fn(i32, i32) -> i32| Value::Number(f(l.to_int32(), r.to_int32()) as f64);
    match op {
        BinOp::Add => {
            let (a, b) = (l.to_primitive(), r.to_primitive());
            if matches!(a, Value::Str(_)) || matches!(b, Value::Str(_)) {
                Value::Str(format!("{a}{b}"))
            } else {
                Value::Number(a.to_number() + b.to_number())
            }
        }
        BinOp::Sub => num(|a, b| a - b),
        BinOp::Mul => num(|a, b| a * b),
        BinOp::Div => num(|a, b| a / b),
        BinOp::Mod => num(|a, b| a % b),
        BinOp::Eq => Value::Bool(l.loose_eq(r)),
        BinOp::NotEq => Value::Bool(!l.loose_eq(r)),
        BinOp::StrictEq => Value::Bool(l.strict_eq(r)),
        BinOp::StrictNotEq => Value::Bool(!l.strict_eq(r)),
        BinOp::Lt => Value::Bool(compare(l, r) == Some(Ordering::Less)),
        BinOp::LtEq => Value::Bool(matches!(compare(l, r), Some(Ordering::Less | Ordering::Equal))),
        BinOp::Gt => Value::Bool(compare(l, r) == Some(Ordering::Greater)),
        BinOp::GtEq => Value::Bool(matches!(compare(l, r), Some(Ordering::Greater | Ordering::Equal))),
        BinOp::BitAnd => int(|a, b| a & b),
        BinOp::BitOr => int(|a, b| a | b),
        BinOp::BitXor => int(|a, b| a ^ b),
        BinOp::Shl => int(|a, b| a.wrapping_shl(b as u32 & 31)),
        BinOp::Shr => int(|a, b| a >> (b as u32 & 31)),
        BinOp::UShr => Value::Number((l.to_uint32() >> (r.to_uint32() & 31)) as f64),
        BinOp::And => if l.truthy() { r.clone() } else { l.clone() },
        BinOp::Or => if l.truthy() { l.clone() } else { r.clone() },
        BinOp::Instanceof => Value::Bool(instance_of(l, r)),
    }
}

/// Two strings compare lexically, anything else numerically. NaN compares
/// as unordered.
fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l.to_primitive(), r.to_primitive()) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn eval_unop(op: UnOp, v: &Value) -> Value {
    match op {
        UnOp::Neg => Value::Number(-v.to_number()),
        UnOp::Plus => Value::Number(v.to_number()),
        UnOp::Not => Value::Bool(!v.truthy()),
        UnOp::BitNot => Value::Number(!v.to_int32() as f64),
        UnOp::Typeof => Value::str(v.type_of()),
    }
}

fn instance_of(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Object(o), Value::Function(c)) => {
            c.def.name.as_ref().is_some_and(|n| o.borrow().classes.contains(n))
        }
        (Value::Vector(_), Value::Native(n)) => n == "PVector",
        (Value::Array(_), Value::Native(n)) => n == "ArrayList",
        _ => false,
    }
}

/// Non-negative integral index, from a number or a numeric string.
fn array_index(idx: &Value) -> Option<usize> {
    let n = match idx {
        Value::Number(n) => *n,
        Value::Str(s) if !s.trim().is_empty() => parse_number(s),
        _ => return None,
    };
    (n >= 0.0 && n.fract() == 0.0 && n.is_finite()).then_some(n as usize)
}

/// An `arguments`-style array as an argument list.
fn spread(v: Option<&Value>) -> Vec<Value> {
    match v {
        Some(Value::Array(a)) => a.borrow().clone(),
        Some(v) if !v.is_nullish() => vec![v.clone()],
        _ => Vec::new(),
    }
}
