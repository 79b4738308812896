//! Statement rewriting: the ordered pass list applied to the dialect token
//! stream before classes are rewritten.
//!
//! Every pass is total over its input. Later passes rely on the normalized
//! output of earlier ones, so `PASSES` is applied strictly in order.

use std::ops::Range;

use crate::error::TranslateError;
use crate::translate::braces::find_close;
use crate::translate::token::{
    Tok, TokKind, after, at_statement_start, is_modifier, is_reserved, next_sig, prev_sig,
};

/// State shared across passes.
#[derive(Debug, Default)]
pub struct PassContext {
    /// Names following a `class` keyword, collected before any pass runs.
    pub class_names: Vec<String>,
    /// Rounds the zero-initializer pass needed to reach its fixed point.
    pub zero_fill_rounds: usize,
    /// Top-level functions registered by the function-declaration pass.
    pub functions: Vec<String>,
}

pub type Pass = fn(&mut Vec<Tok>, &mut PassContext) -> Result<(), TranslateError>;

pub const PASSES: [(&str, Pass); 16] = [
    ("strip-comments", strip_comments),
    ("frame-rate-property", frame_rate_property),
    ("function-declarations", function_declarations),
    ("import", import_directive),
    ("length-call", length_call),
    ("parameter-types", parameter_types),
    ("array-allocation", array_allocation),
    ("typed-array-literals", typed_array_literals),
    ("zero-initializers", zero_initializers),
    ("declaration-types", declaration_types),
    ("brace-initializers", brace_initializers),
    ("super-call", super_call),
    ("casts", casts),
    ("char-literals", char_literals),
    ("hex-colors", hex_colors),
    ("float-suffix", float_suffix),
];

pub fn run_all(toks: &mut Vec<Tok>, ctx: &mut PassContext) -> Result<(), TranslateError> {
    for (name, pass) in PASSES {
        pass(toks, ctx)?;
        log::trace!("pass {name}: {} tokens", toks.len());
    }
    Ok(())
}

/// Collects `class Name` occurrences in source order.
pub fn collect_class_names(toks: &[Tok]) -> Vec<String> {
    let mut names = Vec::new();
    for (i, t) in toks.iter().enumerate() {
        if t.is_word("class") {
            if let Some(n) = after(toks, i).filter(|&n| toks[n].is_ident()) {
                names.push(toks[n].text.clone());
            }
        }
    }
    names
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

/// Replaces `range` with `with`; returns the index just past the insertion.
pub(crate) fn splice(toks: &mut Vec<Tok>, range: Range<usize>, with: Vec<Tok>) -> usize {
    let end = range.start + with.len();
    toks.splice(range, with);
    end
}

fn is_type_word(t: &Tok) -> bool {
    t.is_ident() && !is_reserved(&t.text) && !is_modifier(&t.text)
}

/// Skips a generic argument list starting at `i` (`<` token). Returns the
/// index just past the closing `>`.
fn skip_generic(toks: &[Tok], i: usize) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut k = i;
    while k < toks.len() {
        let t = &toks[k];
        match (t.kind, t.text.as_str()) {
            (TokKind::Punct, "<") => depth += 1,
            (TokKind::Punct, ">") => depth -= 1,
            (TokKind::Punct, ">>") => depth -= 2,
            (TokKind::Punct, ">>>") => depth -= 3,
            (TokKind::Punct, "," | "[" | "]" | "?" | ".") => {}
            (TokKind::Ident, _) => {}
            _ if t.is_trivia() => {}
            _ => return None,
        }
        if depth <= 0 {
            return if depth == 0 { Some(k + 1) } else { None };
        }
        k += 1;
    }
    None
}

/// At a type word, skips `Type<Generic>[][]`. Returns the next significant
/// index after the type.
fn type_head_end(toks: &[Tok], i: usize) -> Option<usize> {
    if !is_type_word(&toks[i]) { return None; }
    let mut k = after(toks, i)?;
    if toks[k].is_punct("<") {
        k = next_sig(toks, skip_generic(toks, k)?)?;
    }
    while toks[k].is_punct("[") {
        let close = after(toks, k)?;
        if !toks[close].is_punct("]") { return None; }
        k = after(toks, close)?;
    }
    Some(k)
}

/// Walks back from `i` over modifiers and `@Annotation`s.
fn modifiers_start(toks: &[Tok], i: usize) -> usize {
    let mut start = i;
    while let Some(p) = prev_sig(toks, start) {
        if toks[p].is_ident() && is_modifier(&toks[p].text) {
            start = p;
        } else if toks[p].is_ident() && prev_sig(toks, p).is_some_and(|a| toks[a].is_punct("@")) {
            start = prev_sig(toks, p).unwrap_or(p);
        } else {
            break;
        }
    }
    start
}

/// Rewrites every `{`/`}` between `open` and its matching closer to brackets.
fn braces_to_brackets(toks: &mut [Tok], open: usize) -> Result<usize, TranslateError> {
    let close = find_close(toks, open)?;
    for t in &mut toks[open..=close] {
        if t.is_punct("{") {
            t.text = "[".into();
        } else if t.is_punct("}") {
            t.text = "]".into();
        }
    }
    Ok(close)
}

// ─── 1. Comments ──────────────────────────────────────────────────────────────

/// Drops comments. Newlines inside block comments are kept so line numbers in
/// runtime errors still point at the source.
pub fn strip_comments(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    for t in toks.iter_mut() {
        match t.kind {
            TokKind::LineComment => {
                t.kind = TokKind::Space;
                t.text = String::new();
            }
            TokKind::BlockComment => {
                let newlines = t.text.matches('\n').count();
                t.kind = TokKind::Space;
                t.text = if newlines == 0 { " ".into() } else { "\n".repeat(newlines) };
            }
            _ => {}
        }
    }
    toks.retain(|t| !(t.kind == TokKind::Space && t.text.is_empty()));
    Ok(())
}

// ─── 2. frameRate property ────────────────────────────────────────────────────

/// `frameRate` read as a value becomes `FRAME_RATE`; `frameRate(n)` stays a call.
pub fn frame_rate_property(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    for i in 0..toks.len() {
        if !toks[i].is_word("frameRate") { continue; }
        let is_call = after(toks, i).is_some_and(|n| toks[n].is_punct("("));
        let is_member = prev_sig(toks, i).is_some_and(|p| toks[p].is_punct("."));
        let is_decl = prev_sig(toks, i).is_some_and(|p| is_type_word(&toks[p]));
        if !is_call && !is_member && !is_decl {
            toks[i].text = "FRAME_RATE".into();
        }
    }
    Ok(())
}

// ─── 3. Function declarations ─────────────────────────────────────────────────

/// `[mods] Type name(args) {` → `sketch.name = function name(args) {`
pub fn function_declarations(toks: &mut Vec<Tok>, ctx: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        let Some((start, name_idx)) = match_function_decl(toks, i) else {
            i += 1;
            continue;
        };
        let name = toks[name_idx].text.clone();
        ctx.functions.push(name.clone());
        let with = vec![
            Tok::ident("sketch"), Tok::punct("."), Tok::ident(name.clone()), Tok::space(),
            Tok::punct("="), Tok::space(), Tok::ident("function"), Tok::space(), Tok::ident(name),
        ];
        i = splice(toks, start..name_idx + 1, with);
    }
    Ok(())
}

fn match_function_decl(toks: &[Tok], i: usize) -> Option<(usize, usize)> {
    if !is_type_word(&toks[i]) { return None; }
    let start = modifiers_start(toks, i);
    if !at_statement_start(toks, start) { return None; }
    let name = type_head_end(toks, i)?;
    if !toks[name].is_ident() || is_reserved(&toks[name].text) { return None; }
    let open = after(toks, name)?;
    if !toks[open].is_punct("(") { return None; }
    let close = find_close(toks, open).ok()?;
    let brace = after(toks, close)?;
    toks[brace].is_punct("{").then_some((start, name))
}

// ─── 4. import( ───────────────────────────────────────────────────────────────

pub fn import_directive(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    for i in 0..toks.len() {
        if toks[i].is_word("import") && after(toks, i).is_some_and(|n| toks[n].is_punct("(")) {
            toks[i].text = "Import".into();
        }
    }
    Ok(())
}

// ─── 5. .length() ─────────────────────────────────────────────────────────────

pub fn length_call(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        if toks[i].is_word("length") && prev_sig(toks, i).is_some_and(|p| toks[p].is_punct(".")) {
            if let Some(open) = after(toks, i).filter(|&o| toks[o].is_punct("(")) {
                if let Some(close) = after(toks, open).filter(|&c| toks[c].is_punct(")")) {
                    toks.drain(i + 1..=close);
                }
            }
        }
        i += 1;
    }
    Ok(())
}

// ─── 6. Parameter types ───────────────────────────────────────────────────────

/// `(int a, float[] b)` → `(a, b)`
pub fn parameter_types(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        if toks[i].is_punct("(") || toks[i].is_punct(",") {
            if let Some(ty) = after(toks, i) {
                if let Some(name) = type_head_end(toks, ty) {
                    let is_param = toks[name].is_ident()
                        && !is_reserved(&toks[name].text)
                        && after(toks, name).is_some_and(|n| toks[n].is_punct(")") || toks[n].is_punct(","));
                    if is_param {
                        toks.drain(ty..name);
                    }
                }
            }
        }
        i += 1;
    }
    Ok(())
}

// ─── 7. new Type[a][b] ────────────────────────────────────────────────────────

/// `new T[a][b]` → `new ArrayList(a, b)`; an empty dimension becomes `0`.
/// `new T[] { ... }` becomes a bracket literal; `new T<G>(` drops the generic.
pub fn array_allocation(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        if !toks[i].is_word("new") {
            i += 1;
            continue;
        }
        let Some(ty) = after(toks, i).filter(|&t| is_type_word(&toks[t])) else { i += 1; continue };
        let Some(mut k) = after(toks, ty) else { break };
        if toks[k].is_punct("<") {
            if let Some(end) = skip_generic(toks, k) {
                toks.drain(ty + 1..end);
                let Some(n) = after(toks, ty) else { break };
                k = n;
            }
        }
        let mut dims: Vec<Vec<Tok>> = Vec::new();
        let mut last = ty;
        while toks[k].is_punct("[") {
            let close = find_close(toks, k)?;
            let inner: Vec<Tok> = toks[k + 1..close].to_vec();
            dims.push(if inner.iter().all(Tok::is_trivia) {
                vec![Tok::synth(TokKind::Number, "0")]
            } else {
                inner
            });
            last = close;
            match after(toks, close) {
                Some(n) => k = n,
                None => break,
            }
        }
        if dims.is_empty() {
            i = ty + 1;
            continue;
        }
        let all_empty = toks[ty + 1..=last].iter()
            .filter(|t| !t.is_trivia())
            .all(|t| t.is_punct("[") || t.is_punct("]"));
        if all_empty && toks[k].is_punct("{") {
            braces_to_brackets(toks, k)?;
            toks.drain(i..k);
            continue;
        }
        let mut with = vec![Tok::ident("new"), Tok::space(), Tok::ident("ArrayList"), Tok::punct("(")];
        for (n, dim) in dims.into_iter().enumerate() {
            if n > 0 {
                with.push(Tok::punct(","));
                with.push(Tok::space());
            }
            with.extend(dim);
        }
        with.push(Tok::punct(")"));
        i = splice(toks, i..last + 1, with);
    }
    Ok(())
}

// ─── 8. Typed array literals ──────────────────────────────────────────────────

/// `T[] name = { ... }` → `T[] name = [ ... ]`
pub fn typed_array_literals(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        if is_type_word(&toks[i]) && after(toks, i).is_some_and(|b| toks[b].is_punct("[")) {
            if let Some(open) = typed_array_initializer(toks, i) {
                i = braces_to_brackets(toks, open)?;
            }
        }
        i += 1;
    }
    Ok(())
}

fn typed_array_initializer(toks: &[Tok], ty: usize) -> Option<usize> {
    let name = type_head_end(toks, ty)?;
    if !toks[name].is_ident() { return None; }
    let mut k = after(toks, name)?;
    if toks[k].is_punct("[") {
        k = after(toks, after(toks, k)?)?;
    }
    if !toks[k].is_punct("=") { return None; }
    let open = after(toks, k)?;
    toks[open].is_punct("{").then_some(open)
}

// ─── 9. Zero initializers ─────────────────────────────────────────────────────

/// `int a, b = 2, c;` → `int a = 0, b = 2, c = 0;`
///
/// Each round fills exactly one declarator, so the number of rounds equals
/// the number of declarators that lacked an initializer.
pub fn zero_initializers(toks: &mut Vec<Tok>, ctx: &mut PassContext) -> Result<(), TranslateError> {
    let mut rounds = 0;
    while let Some(at) = next_uninitialized(toks) {
        let with = vec![
            Tok::space(), Tok::punct("="), Tok::space(), Tok::synth(TokKind::Number, "0"),
        ];
        splice(toks, at + 1..at + 1, with);
        rounds += 1;
    }
    ctx.zero_fill_rounds += rounds;
    Ok(())
}

/// Index of the first `int`/`float` declarator name not followed by `=`.
fn next_uninitialized(toks: &[Tok]) -> Option<usize> {
    for i in 0..toks.len() {
        let t = &toks[i];
        if !(t.is_word("int") || t.is_word("float")) { continue; }
        if !at_statement_start(toks, modifiers_start(toks, i)) { continue; }
        let first = after(toks, i)?;
        if !toks[first].is_ident() { continue; }

        // walk declarators up to the depth-0 terminator
        let mut depth = 0i32;
        let mut expect_name = true;
        let mut k = first;
        while k < toks.len() {
            let tk = &toks[k];
            if tk.is_trivia() { k += 1; continue; }
            if expect_name {
                if !tk.is_ident() { break; }
                let n = after(toks, k);
                let terminated = n.is_none_or(|n| toks[n].is_punct(",") || toks[n].is_punct(";"));
                if terminated {
                    return Some(k);
                }
                expect_name = false;
            } else if tk.is_punct("(") || tk.is_punct("[") || tk.is_punct("{") {
                depth += 1;
            } else if tk.is_punct(")") || tk.is_punct("]") || tk.is_punct("}") {
                depth -= 1;
                if depth < 0 { break; }
            } else if depth == 0 && tk.is_punct(",") {
                expect_name = true;
            } else if depth == 0 && tk.is_punct(";") {
                break;
            }
            k += 1;
        }
    }
    None
}

// ─── 10. Declaration types ────────────────────────────────────────────────────

/// `[static] [final] T[] name[] = / , / ;` → `var name = / , / ;`
///
/// A `static` member of a class body keeps its modifier (`static var name`)
/// for the class rewriter.
pub fn declaration_types(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        let Some(name) = match_declaration(toks, i) else {
            i += 1;
            continue;
        };
        let start = modifiers_start(toks, i);
        let keep_static = toks[start..i].iter().any(|t| t.is_word("static")) && in_class_body(toks, start);
        // trailing C-style `name[]`
        let mut end = name + 1;
        if let Some(b) = after(toks, name).filter(|&b| toks[b].is_punct("[")) {
            if let Some(c) = after(toks, b).filter(|&c| toks[c].is_punct("]")) {
                end = c + 1;
            }
        }
        let mut with = Vec::new();
        if keep_static {
            with.extend([Tok::ident("static"), Tok::space()]);
        }
        with.extend([Tok::ident("var"), Tok::space(), toks[name].clone()]);
        i = splice(toks, start..end, with);
    }
    Ok(())
}

/// The innermost bracket enclosing `i` is a class body's `{`.
fn in_class_body(toks: &[Tok], i: usize) -> bool {
    let mut depth = 0i32;
    for k in (0..i).rev() {
        let t = &toks[k];
        if t.is_punct("}") || t.is_punct(")") || t.is_punct("]") {
            depth += 1;
        } else if t.is_punct("{") || t.is_punct("(") || t.is_punct("[") {
            if depth == 0 {
                return t.is_punct("{") && is_class_head(toks, k);
            }
            depth -= 1;
        }
    }
    false
}

/// `class Name [extends A] [implements B, C] {` ends at `open`.
fn is_class_head(toks: &[Tok], open: usize) -> bool {
    let mut k = open;
    while let Some(p) = prev_sig(toks, k) {
        let t = &toks[p];
        if t.is_word("class") {
            return true;
        }
        if !(t.is_ident() || t.is_punct(",") || t.is_punct("<") || t.is_punct(">")) {
            return false;
        }
        k = p;
    }
    false
}

fn match_declaration(toks: &[Tok], i: usize) -> Option<usize> {
    if !is_type_word(&toks[i]) { return None; }
    // `a.b c` is never a declaration; `x < y > z` only parses as one when generic
    if prev_sig(toks, i).is_some_and(|p| toks[p].is_punct(".")) { return None; }
    let name = type_head_end(toks, i)?;
    if !toks[name].is_ident() || is_reserved(&toks[name].text) { return None; }
    let mut sep = after(toks, name)?;
    if toks[sep].is_punct("[") {
        let c = after(toks, sep)?;
        if !toks[c].is_punct("]") { return None; }
        sep = after(toks, c)?;
    }
    let t = &toks[sep];
    (t.is_punct("=") || t.is_punct(",") || t.is_punct(";")).then_some(name)
}

// ─── 11. Brace initializers ───────────────────────────────────────────────────

/// `= { ... }` → `= [ ... ]`
pub fn brace_initializers(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        if toks[i].is_punct("=") {
            if let Some(open) = after(toks, i).filter(|&o| toks[o].is_punct("{")) {
                i = braces_to_brackets(toks, open)?;
            }
        }
        i += 1;
    }
    Ok(())
}

// ─── 12. super( ───────────────────────────────────────────────────────────────

pub fn super_call(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    for i in 0..toks.len() {
        if toks[i].is_word("super") && after(toks, i).is_some_and(|n| toks[n].is_punct("(")) {
            toks[i].text = "superMethod".into();
        }
    }
    Ok(())
}

// ─── 13. Casts ────────────────────────────────────────────────────────────────

const CAST_TYPES: [&str; 8] = ["float", "boolean", "String", "byte", "double", "long", "char", "short"];

/// `(int) x` → `(0|x)`; `(float) x`, `(Ball) x` → `x`.
pub fn casts(toks: &mut Vec<Tok>, ctx: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        if !toks[i].is_punct("(") {
            i += 1;
            continue;
        }
        let Some((ty, close)) = cast_at(toks, i) else { i += 1; continue };
        let operand = after(toks, close);
        let word = toks[ty].text.clone();

        if word == "int" {
            match operand.and_then(|o| operand_end(toks, o).map(|e| (o, e))) {
                Some((o, e)) => {
                    toks.insert(e + 1, Tok::punct(")"));
                    splice(toks, i..o, vec![
                        Tok::punct("("), Tok::synth(TokKind::Number, "0"), Tok::punct("|"),
                    ]);
                }
                None => {
                    splice(toks, i..close + 1, vec![Tok::synth(TokKind::Number, "0"), Tok::punct("|")]);
                }
            }
            i += 1;
        } else if CAST_TYPES.contains(&word.as_str()) || ctx.class_names.contains(&word) {
            let starts_operand = operand.is_some_and(|o| starts_operand(&toks[o]));
            if starts_operand {
                toks.drain(i..close + 1);
            } else {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// `( Type [] )` at `open`; returns (type index, close index).
fn cast_at(toks: &[Tok], open: usize) -> Option<(usize, usize)> {
    let ty = after(toks, open)?;
    if !toks[ty].is_ident() { return None; }
    let mut k = after(toks, ty)?;
    while toks[k].is_punct("[") {
        let c = after(toks, k)?;
        if !toks[c].is_punct("]") { return None; }
        k = after(toks, c)?;
    }
    toks[k].is_punct(")").then_some((ty, k))
}

fn starts_operand(t: &Tok) -> bool {
    match t.kind {
        TokKind::Ident => !matches!(t.text.as_str(), "instanceof" | "in"),
        TokKind::Number | TokKind::Str | TokKind::Char | TokKind::HexColor => true,
        TokKind::Punct => matches!(t.text.as_str(), "(" | "-" | "!" | "~" | "+"),
        _ => false,
    }
}

/// Last index of the unary/postfix operand starting at `start`.
fn operand_end(toks: &[Tok], start: usize) -> Option<usize> {
    let mut k = start;
    while toks[k].is_punct("-") || toks[k].is_punct("+") || toks[k].is_punct("!") || toks[k].is_punct("~") {
        k = after(toks, k)?;
    }
    let t = &toks[k];
    if t.is_punct("(") {
        k = find_close(toks, k).ok()?;
    } else if t.is_word("new") {
        k = after(toks, k)?;
    } else if !matches!(t.kind, TokKind::Ident | TokKind::Number | TokKind::Str | TokKind::Char) {
        return None;
    }
    loop {
        let Some(n) = after(toks, k) else { break };
        if toks[n].is_punct(".") {
            match after(toks, n) {
                Some(m) if toks[m].is_ident() => k = m,
                _ => break,
            }
        } else if toks[n].is_punct("(") || toks[n].is_punct("[") {
            k = find_close(toks, n).ok()?;
        } else {
            break;
        }
    }
    Some(k)
}

// ─── 14. Char literals ────────────────────────────────────────────────────────

pub fn char_literals(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    for t in toks.iter_mut().filter(|t| t.kind == TokKind::Char) {
        if let Some(code) = char_code(&t.text) {
            t.kind = TokKind::Number;
            t.text = code.to_string();
        }
    }
    Ok(())
}

/// Code point of a quoted char literal such as `'a'`, `'\n'` or `'A'`.
pub fn char_code(literal: &str) -> Option<u32> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let first = chars.next()?;
    if first != '\\' {
        return chars.next().is_none().then_some(first as u32);
    }
    let esc = chars.next()?;
    let code = match esc {
        'n' => 10,
        't' => 9,
        'r' => 13,
        'b' => 8,
        'f' => 12,
        '0' => 0,
        '\\' => 92,
        '\'' => 39,
        '"' => 34,
        'u' => u32::from_str_radix(chars.as_str(), 16).ok()?,
        _ => return None,
    };
    Some(code)
}

// ─── 15. Hex colors ───────────────────────────────────────────────────────────

/// `#rrggbb` → `DefaultColor(r,g,b)`
pub fn hex_colors(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    let mut i = 0;
    while i < toks.len() {
        if toks[i].kind != TokKind::HexColor {
            i += 1;
            continue;
        }
        let hex = &toks[i].text[1..];
        let channel = |k: usize| u8::from_str_radix(&hex[k..k + 2], 16).unwrap_or(0);
        let (r, g, b) = (channel(0), channel(2), channel(4));
        let num = |v: u8| Tok::synth(TokKind::Number, v.to_string());
        let with = vec![
            Tok::ident("DefaultColor"), Tok::punct("("),
            num(r), Tok::punct(","), num(g), Tok::punct(","), num(b),
            Tok::punct(")"),
        ];
        i = splice(toks, i..i + 1, with);
    }
    Ok(())
}

// ─── 16. Float suffix ─────────────────────────────────────────────────────────

pub fn float_suffix(toks: &mut Vec<Tok>, _: &mut PassContext) -> Result<(), TranslateError> {
    for t in toks.iter_mut().filter(|t| t.kind == TokKind::Number) {
        let is_hex = t.text.starts_with("0x") || t.text.starts_with("0X");
        if !is_hex && t.text.ends_with(['f', 'F', 'd', 'D', 'l', 'L']) {
            t.text.pop();
        }
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::lexer::tokenize;
    use crate::translate::token::render;

    fn apply(pass: Pass, src: &str) -> String {
        let mut toks = tokenize(src);
        let mut ctx = PassContext { class_names: collect_class_names(&toks), ..Default::default() };
        pass(&mut toks, &mut ctx).unwrap();
        render(&toks)
    }

    #[test]
    fn comments_are_removed_but_lines_kept() {
        assert_eq!(apply(strip_comments, "a; // x\nb;"), "a; \nb;");
        assert_eq!(apply(strip_comments, "a; /* x\ny */ b;"), "a; \n b;");
    }

    #[test]
    fn frame_rate_value_is_renamed() {
        assert_eq!(apply(frame_rate_property, "x = frameRate;"), "x = FRAME_RATE;");
        assert_eq!(apply(frame_rate_property, "frameRate(30);"), "frameRate(30);");
    }

    #[test]
    fn function_declaration_is_registered() {
        assert_eq!(
            apply(function_declarations, "void draw() {\n}"),
            "sketch.draw = function draw() {\n}"
        );
        assert_eq!(
            apply(function_declarations, "static float[] grid(int n) { }"),
            "sketch.grid = function grid(int n) { }"
        );
    }

    #[test]
    fn control_flow_is_not_a_function() {
        let src = "void f() { if (a) { } else if (b) { } while (c) { } }";
        let out = apply(function_declarations, src);
        assert_eq!(out, "sketch.f = function f() { if (a) { } else if (b) { } while (c) { } }");
    }

    #[test]
    fn generic_return_type() {
        assert_eq!(
            apply(function_declarations, "ArrayList<Ball> balls() { }"),
            "sketch.balls = function balls() { }"
        );
    }

    #[test]
    fn import_call_is_routed_to_registry() {
        assert_eq!(apply(import_directive, "import(\"sound\");"), "Import(\"sound\");");
    }

    #[test]
    fn length_call_becomes_property() {
        assert_eq!(apply(length_call, "s.length() + a.length"), "s.length + a.length");
    }

    #[test]
    fn parameter_types_are_stripped() {
        assert_eq!(apply(parameter_types, "f(int a, float[] b, Ball c)"), "f(a, b, c)");
        assert_eq!(apply(parameter_types, "f(a, b)"), "f(a, b)");
    }

    #[test]
    fn array_allocation_becomes_constructor() {
        assert_eq!(apply(array_allocation, "new float[5]"), "new ArrayList(5)");
        assert_eq!(apply(array_allocation, "new int[w][h * 2]"), "new ArrayList(w, h * 2)");
        assert_eq!(apply(array_allocation, "new int[3][]"), "new ArrayList(3, 0)");
        assert_eq!(apply(array_allocation, "new ArrayList<Ball>()"), "new ArrayList()");
        assert_eq!(apply(array_allocation, "new Ball(1)"), "new Ball(1)");
    }

    #[test]
    fn anonymous_array_literal() {
        assert_eq!(apply(array_allocation, "x = new int[] {1, 2};"), "x = [1, 2];");
    }

    #[test]
    fn typed_array_literal_uses_brackets() {
        assert_eq!(
            apply(typed_array_literals, "int[][] m = {{1, 2}, {3, 4}};"),
            "int[][] m = [[1, 2], [3, 4]];"
        );
    }

    #[test]
    fn zero_initializers_fill_each_declarator() {
        let mut toks = tokenize("\nint a, b = 2, c;\nfloat d;\nString s;");
        let mut ctx = PassContext::default();
        zero_initializers(&mut toks, &mut ctx).unwrap();
        assert_eq!(render(&toks), "\nint a = 0, b = 2, c = 0;\nfloat d = 0;\nString s;");
        assert_eq!(ctx.zero_fill_rounds, 3);
    }

    #[test]
    fn zero_initializers_skip_arrays_and_calls() {
        assert_eq!(apply(zero_initializers, "int[] a;"), "int[] a;");
        assert_eq!(apply(zero_initializers, "int a = f(b, c);"), "int a = f(b, c);");
    }

    #[test]
    fn declaration_types_become_var() {
        assert_eq!(apply(declaration_types, "float x = 5;"), "var x = 5;");
        assert_eq!(apply(declaration_types, "static final int N = 3;"), "var N = 3;");
        assert_eq!(
            apply(declaration_types, "class B { static final int N = 3; int m() { int k = 1; } }"),
            "class B { static var N = 3; int m() { var k = 1; } }"
        );
        assert_eq!(apply(declaration_types, "int a[] = b;"), "var a = b;");
        assert_eq!(apply(declaration_types, "for (int i = 0; i < n; i++)"), "for (var i = 0; i < n; i++)");
        assert_eq!(apply(declaration_types, "ArrayList<Ball> bs;"), "var bs;");
    }

    #[test]
    fn return_is_never_a_declaration() {
        assert_eq!(apply(declaration_types, "return x;"), "return x;");
    }

    #[test]
    fn brace_initializer_becomes_array() {
        assert_eq!(apply(brace_initializers, "var a = {1, {2}};"), "var a = [1, [2]];");
    }

    #[test]
    fn super_call_renamed() {
        assert_eq!(apply(super_call, "super(x);"), "superMethod(x);");
    }

    #[test]
    fn int_cast_truncates() {
        assert_eq!(apply(casts, "y = (int) x * 2;"), "y = (0|x) * 2;");
        assert_eq!(apply(casts, "y = (int)(a / b);"), "y = (0|(a / b));");
        assert_eq!(apply(casts, "y = (int) p.pos[i];"), "y = (0|p.pos[i]);");
    }

    #[test]
    fn other_casts_are_stripped() {
        assert_eq!(apply(casts, "y = (float) x;"), "y = x;");
        assert_eq!(apply(casts, "class Ball {} b = (Ball) o;"), "class Ball {} b = o;");
        assert_eq!(apply(casts, "f(a) + (b)"), "f(a) + (b)");
    }

    #[test]
    fn char_literal_to_code() {
        assert_eq!(apply(char_literals, "k == 'a' || k == '\\n'"), "k == 97 || k == 10");
        assert_eq!(char_code("'\\u0041'"), Some(65));
    }

    #[test]
    fn hex_color_to_default_color() {
        assert_eq!(apply(hex_colors, "fill(#ff8000);"), "fill(DefaultColor(255,128,0));");
    }

    #[test]
    fn float_suffix_dropped() {
        assert_eq!(apply(float_suffix, "x = 3.5f + 2f + 0xFF;"), "x = 3.5 + 2 + 0xFF;");
    }
}
