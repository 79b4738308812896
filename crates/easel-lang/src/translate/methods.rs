//! Splits a class body into its members and renders each one in
//! constructor-function form.

use crate::error::TranslateError;
use crate::translate::braces::find_close;
use crate::translate::token::{Tok, after, is_modifier, next_sig, render};

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// `var a = 1, b;` → one entry per declarator.
    Fields(Vec<Field>),
    /// `static var a = 1;`, assigned on the constructor function itself.
    Static(Vec<Field>),
    /// `sketch.name = function name(params) { body }`
    Method { name: String, params: Vec<String>, body: String },
    /// `ClassName(params) { body }`
    Constructor { params: Vec<String>, body: String },
    /// Anything else, kept verbatim.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub init: Option<String>,
}

impl Member {
    pub fn arity(&self) -> Option<usize> {
        match self {
            Member::Method { params, .. } | Member::Constructor { params, .. } => Some(params.len()),
            _ => None,
        }
    }
}

/// Walks the depth-0 statements of a class body.
pub fn extract_members(body: &[Tok], class_name: &str) -> Result<Vec<Member>, TranslateError> {
    let mut members = Vec::new();
    let mut k = 0;
    while let Some(mut start) = next_sig(body, k) {
        let mut is_static = false;
        while body[start].is_ident() && is_modifier(&body[start].text) {
            is_static |= body[start].is_word("static");
            match after(body, start) {
                Some(n) => start = n,
                None => return Ok(members),
            }
        }
        let t = &body[start];
        let end = if t.is_word("var") {
            let end = statement_end(body, start)?;
            let fields = fields(&body[start + 1..end]);
            members.push(if is_static { Member::Static(fields) } else { Member::Fields(fields) });
            end
        } else if let Some((name, open)) = method_head(body, start) {
            let (params, close) = params_at(body, open)?;
            let (block, end) = block_after(body, close)?;
            members.push(Member::Method { name, params, body: block });
            end
        } else if t.is_word(class_name) && after(body, start).is_some_and(|o| body[o].is_punct("(")) {
            let open = after(body, start).unwrap_or(start);
            let (params, close) = params_at(body, open)?;
            let (block, end) = block_after(body, close)?;
            members.push(Member::Constructor { params, body: block });
            end
        } else {
            let end = statement_end(body, start)?;
            members.push(Member::Other(render(&body[start..=end.min(body.len() - 1)])));
            end
        };
        k = end + 1;
    }
    Ok(members)
}

/// `sketch . name = function name (` → (name, index of `(`)
fn method_head(toks: &[Tok], i: usize) -> Option<(String, usize)> {
    if !toks[i].is_word("sketch") { return None; }
    let dot = after(toks, i)?;
    let name = after(toks, dot)?;
    let eq = after(toks, name)?;
    let func = after(toks, eq)?;
    if !(toks[dot].is_punct(".") && toks[name].is_ident() && toks[eq].is_punct("=") && toks[func].is_word("function")) {
        return None;
    }
    let mut open = after(toks, func)?;
    if toks[open].is_ident() {
        open = after(toks, open)?;
    }
    toks[open].is_punct("(").then(|| (toks[name].text.clone(), open))
}

/// Parameter names inside the parens at `open`; returns them with the `)` index.
fn params_at(toks: &[Tok], open: usize) -> Result<(Vec<String>, usize), TranslateError> {
    let close = find_close(toks, open)?;
    let mut params = Vec::new();
    let mut last_ident: Option<&str> = None;
    for t in &toks[open + 1..close] {
        if t.is_punct(",") {
            params.extend(last_ident.take().map(String::from));
        } else if t.is_ident() {
            last_ident = Some(&t.text);
        }
    }
    params.extend(last_ident.map(String::from));
    Ok((params, close))
}

/// The `{ ... }` following `close`, rendered without its braces; returns the
/// index of the last consumed token (a trailing `;` is swallowed).
fn block_after(toks: &[Tok], close: usize) -> Result<(String, usize), TranslateError> {
    let Some(open) = after(toks, close).filter(|&o| toks[o].is_punct("{")) else {
        return Ok((String::new(), close));
    };
    let end = find_close(toks, open)?;
    let text = render(&toks[open + 1..end]);
    match after(toks, end) {
        Some(semi) if toks[semi].is_punct(";") => Ok((text, semi)),
        _ => Ok((text, end)),
    }
}

/// Index of the token ending the statement at `start`: a depth-0 `;`, or the
/// `}` that closes a depth-0 block.
fn statement_end(toks: &[Tok], start: usize) -> Result<usize, TranslateError> {
    let mut k = start;
    while k < toks.len() {
        let t = &toks[k];
        if t.is_punct(";") {
            return Ok(k);
        }
        if t.is_punct("{") || t.is_punct("(") || t.is_punct("[") {
            let close = find_close(toks, k)?;
            if t.is_punct("{") {
                return Ok(match after(toks, close) {
                    Some(semi) if toks[semi].is_punct(";") => semi,
                    _ => close,
                });
            }
            k = close;
        }
        k += 1;
    }
    Ok(toks.len().saturating_sub(1))
}

/// Declarators of a `var` statement (the tokens after `var`, up to `;`).
fn fields(toks: &[Tok]) -> Vec<Field> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut seg_start = 0;
    let mut push = |seg: &[Tok]| {
        let Some(n) = next_sig(seg, 0) else { return };
        let init = after(seg, n)
            .filter(|&e| seg[e].is_punct("="))
            .map(|e| render(&seg[e + 1..]).trim().to_string());
        out.push(Field { name: seg[n].text.clone(), init });
    };
    for (k, t) in toks.iter().enumerate() {
        if t.is_punct("(") || t.is_punct("[") || t.is_punct("{") {
            depth += 1;
        } else if t.is_punct(")") || t.is_punct("]") || t.is_punct("}") {
            depth -= 1;
        } else if depth == 0 && t.is_punct(",") {
            push(&toks[seg_start..k]);
            seg_start = k + 1;
        } else if depth == 0 && t.is_punct(";") {
            break;
        }
    }
    let end = toks.iter().position(|t| t.is_punct(";")).unwrap_or(toks.len());
    if seg_start < end {
        push(&toks[seg_start..end]);
    }
    out
}

// ─── Emission ────────────────────────────────────────────────────────────────

pub fn field_assignments(fields: &[Field]) -> String {
    fields.iter()
        .map(|f| format!("this.{} = {};", f.name, f.init.as_deref().unwrap_or("null")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Name.a = 1; Name.b = null;`
pub fn static_assignments(class: &str, fields: &[Field]) -> String {
    fields.iter()
        .map(|f| format!("{class}.{} = {};", f.name, f.init.as_deref().unwrap_or("null")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `addMethod(this, "name", function(params) { body });`
pub fn method_registration(name: &str, params: &[String], body: &str) -> String {
    format!("addMethod(this, \"{name}\", function({}) {{{body}}});", params.join(", "))
}

/// An arity-gated branch that binds the caller's arguments by position.
pub fn constructor_branch(params: &[String], body: &str) -> String {
    format!(
        "if (arguments.length == {}) {{ (function({}) {{{body}}}).apply(this, arguments); }}",
        params.len(),
        params.join(", "),
    )
}
