//! Class definitions → constructor functions.
//!
//! ```text
//! class Ball extends Shape { float x; Ball(float ix) { x = ix; } }
//! ```
//! becomes (after the statement passes)
//! ```text
//! function Ball() { with (this) {
//!   this.x = 0;
//!   extendClass(this, arguments, Shape);
//!   if (arguments.length == 1) { (function(ix) { x = ix; }).apply(this, arguments); }
//! } }
//! ```
//! Static fields follow the function as `Ball.field = init;`.

use crate::error::TranslateError;
use crate::translate::braces::find_close;
use crate::translate::lexer::tokenize;
use crate::translate::methods::{
    Member, constructor_branch, extract_members, field_assignments, method_registration,
    static_assignments,
};
use crate::translate::token::{Tok, after, is_modifier, prev_sig, render};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    pub name: String,
    pub superclass: Option<String>,
    pub members: Vec<Member>,
}

impl ClassDescriptor {
    pub fn constructor_arities(&self) -> Vec<usize> {
        self.members.iter()
            .filter(|m| matches!(m, Member::Constructor { .. }))
            .filter_map(Member::arity)
            .collect()
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.members.iter()
            .filter_map(|m| match m {
                Member::Method { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Location of one class definition within the token stream.
struct ClassSpan {
    /// First token to replace (a leading modifier or `class`).
    start: usize,
    /// The closing `}` of the body.
    end: usize,
    descriptor: ClassDescriptor,
}

pub fn count_classes(toks: &[Tok]) -> usize {
    toks.iter().filter(|t| t.is_word("class")).count()
}

/// Rewrites the innermost-first class definition. Returns `None` when no
/// well-formed class is left.
pub fn rewrite_one(toks: &[Tok]) -> Result<Option<(String, ClassDescriptor)>, TranslateError> {
    let Some(span) = find_class(toks)? else { return Ok(None) };
    let mut out = render(&toks[..span.start]);
    out.push_str(&emit(&span.descriptor));
    out.push_str(&render(&toks[span.end + 1..]));
    Ok(Some((out, span.descriptor)))
}

/// Runs `rewrite_one` until no class marker is left. Each round must remove
/// exactly one marker.
pub fn rewrite_all(source: String) -> Result<(String, Vec<ClassDescriptor>), TranslateError> {
    let mut text = source;
    let mut classes = Vec::new();
    loop {
        let toks = tokenize(&text);
        let remaining = count_classes(&toks);
        if remaining == 0 {
            return Ok((text, classes));
        }
        let Some((next, desc)) = rewrite_one(&toks)? else {
            return Err(TranslateError::ClassRewriteStalled { remaining });
        };
        if count_classes(&tokenize(&next)) >= remaining {
            return Err(TranslateError::ClassRewriteStalled { remaining });
        }
        log::debug!("rewrote class {} ({} members)", desc.name, desc.members.len());
        classes.push(desc);
        text = next;
    }
}

fn find_class(toks: &[Tok]) -> Result<Option<ClassSpan>, TranslateError> {
    for (i, t) in toks.iter().enumerate() {
        if !t.is_word("class") { continue; }
        let Some(name_idx) = after(toks, i).filter(|&n| toks[n].is_ident()) else { continue };
        let mut k = match after(toks, name_idx) {
            Some(k) => k,
            None => continue,
        };

        let mut superclass = None;
        if toks[k].is_word("extends") {
            let Some(s) = after(toks, k).filter(|&s| toks[s].is_ident()) else { continue };
            superclass = Some(toks[s].text.clone());
            k = match after(toks, s) { Some(k) => k, None => continue };
        }
        if toks[k].is_word("implements") {
            while !toks[k].is_punct("{") {
                k = match after(toks, k) { Some(k) => k, None => break };
            }
        }
        if !toks[k].is_punct("{") { continue; }
        let close = find_close(toks, k)?;

        // inner classes first
        if toks[k + 1..close].iter().any(|t| t.is_word("class")) { continue; }

        let name = toks[name_idx].text.clone();
        let members = extract_members(&toks[k + 1..close], &name)?;
        let mut start = i;
        while let Some(p) = prev_sig(toks, start).filter(|&p| is_modifier(&toks[p].text)) {
            start = p;
        }
        return Ok(Some(ClassSpan {
            start,
            end: close,
            descriptor: ClassDescriptor { name, superclass, members },
        }));
    }
    Ok(None)
}

/// Renders a class as its constructor function.
pub fn emit(class: &ClassDescriptor) -> String {
    let mut body: Vec<String> = Vec::new();
    let uses_super = class.members.iter().any(|m| match m {
        Member::Method { body, .. } | Member::Constructor { body, .. } => body.contains("superMethod"),
        Member::Other(text) => text.contains("superMethod"),
        Member::Fields(_) | Member::Static(_) => false,
    });

    if let (Some(sup), true) = (&class.superclass, uses_super) {
        body.push(format!(
            "var __self = this; function superMethod() {{ extendClass(__self, arguments, {sup}); }}"
        ));
    }
    for m in &class.members {
        if let Member::Fields(fields) = m {
            body.push(field_assignments(fields));
        }
    }
    if let Some(sup) = &class.superclass {
        body.push(format!("extendClass(this, arguments, {sup});"));
    }
    for m in &class.members {
        match m {
            Member::Method { name, params, body: b } => body.push(method_registration(name, params, b)),
            Member::Other(text) => body.push(text.clone()),
            _ => {}
        }
    }
    for m in &class.members {
        if let Member::Constructor { params, body: b } = m {
            body.push(constructor_branch(params, b));
        }
    }

    let mut out = format!("function {}() {{ with (this) {{\n{}\n}} }}", class.name, body.join("\n"));
    for m in &class.members {
        if let Member::Static(fields) = m {
            out.push('\n');
            out.push_str(&static_assignments(&class.name, fields));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_without_constructor() {
        let (out, classes) = rewrite_all("class P { var a = 1; var b = null; }".into()).unwrap();
        assert_eq!(out, "function P() { with (this) {\nthis.a = 1;\nthis.b = null;\n} }");
        assert_eq!(classes[0].constructor_arities(), Vec::<usize>::new());
    }

    #[test]
    fn static_fields_follow_the_constructor() {
        let (out, _) = rewrite_all("class B { static var N = 3; var m; }".into()).unwrap();
        assert_eq!(out, "function B() { with (this) {\nthis.m = null;\n} }\nB.N = 3;");
    }

    #[test]
    fn subclass_calls_extension_logic() {
        let src = "class Ball extends Shape { var x = 0; Ball(ix) { x = ix; } }";
        let (out, classes) = rewrite_all(src.into()).unwrap();
        assert!(out.contains("this.x = 0;\nextendClass(this, arguments, Shape);"));
        assert!(out.contains("if (arguments.length == 1) { (function(ix) { x = ix; }).apply(this, arguments); }"));
        assert!(!out.contains("superMethod"));
        assert_eq!(classes[0].superclass.as_deref(), Some("Shape"));
    }

    #[test]
    fn super_delegate_emitted_when_used() {
        let src = "class B extends A { B(v) { superMethod(v); } }";
        let (out, _) = rewrite_all(src.into()).unwrap();
        assert!(out.contains("function superMethod() { extendClass(__self, arguments, A); }"));
    }

    #[test]
    fn methods_become_registrations() {
        let src = "class M { sketch.go = function go(a) { } sketch.go = function go(a, b) { } }";
        let (out, classes) = rewrite_all(src.into()).unwrap();
        assert_eq!(out.matches("addMethod(this, \"go\"").count(), 2);
        assert_eq!(classes[0].method_names(), vec!["go", "go"]);
    }

    #[test]
    fn every_class_is_rewritten_once() {
        let src = "class A { } class B { } class C { }";
        let (out, classes) = rewrite_all(src.into()).unwrap();
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(count_classes(&tokenize(&out)), 0);
    }

    #[test]
    fn inner_class_is_rewritten_first() {
        let src = "class Outer { class Inner { } }";
        let (out, classes) = rewrite_all(src.into()).unwrap();
        assert_eq!(classes[0].name, "Inner");
        assert!(out.contains("function Inner()"));
    }

    #[test]
    fn malformed_class_stalls() {
        let err = rewrite_all("class { }".into()).unwrap_err();
        assert_eq!(err, TranslateError::ClassRewriteStalled { remaining: 1 });
    }

    #[test]
    fn unbalanced_class_body_is_structural_error() {
        let err = rewrite_all("class A { void f() {".into()).unwrap_err();
        assert!(matches!(err, TranslateError::UnbalancedDelimiter { open: '{', .. }));
    }
}
