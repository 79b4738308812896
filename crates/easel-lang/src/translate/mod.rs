//! Dialect → script translator.
//!
//! The dialect is tokenized once, rewritten by the ordered statement passes,
//! then class definitions are rewritten one at a time, and a final cleanup
//! runs over the result.

pub mod braces;
pub mod classes;
pub mod lexer;
pub mod methods;
pub mod passes;
pub mod token;

use crate::error::TranslateError;
use classes::ClassDescriptor;
use passes::{PassContext, splice};
use token::{Tok, after, render};

/// Output of `translate`.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub code: String,
    /// `size(w, h, OPENGL)` (or `P3D`) appears in the source.
    pub uses_3d: bool,
    pub classes: Vec<ClassDescriptor>,
    /// Names registered as top-level functions.
    pub functions: Vec<String>,
}

pub fn translate(source: &str) -> Result<Translation, TranslateError> {
    let mut toks = lexer::tokenize(source);
    let uses_3d = detect_3d(&toks);

    let mut ctx = PassContext {
        class_names: passes::collect_class_names(&toks),
        ..Default::default()
    };
    passes::run_all(&mut toks, &mut ctx)?;
    log::debug!(
        "statement passes done: {} function(s), {} zero-initialized declarator(s)",
        ctx.functions.len(),
        ctx.zero_fill_rounds,
    );

    let (text, classes) = classes::rewrite_all(render(&toks))?;

    let mut toks = lexer::tokenize(&text);
    cleanup(&mut toks);
    if uses_3d {
        log::debug!("3D context requested by size()");
    }

    Ok(Translation {
        code: render(&toks),
        uses_3d,
        classes,
        functions: ctx.functions,
    })
}

/// `size(a, b, OPENGL)` / `size(a, b, P3D)`.
fn detect_3d(toks: &[Tok]) -> bool {
    toks.iter().enumerate().any(|(i, t)| {
        if !t.is_word("size") { return false; }
        let Some(open) = after(toks, i).filter(|&o| toks[o].is_punct("(")) else { return false };
        let Ok(close) = braces::find_close(toks, open) else { return false };
        let args: Vec<&Tok> = toks[open + 1..close].iter().filter(|t| !t.is_trivia()).collect();
        let commas = args.iter().filter(|t| t.is_punct(",")).count();
        commas == 2 && args.last().is_some_and(|t| t.is_word("OPENGL") || t.is_word("P3D"))
    })
}

/// `sketch.X = function addMethod` → `addMethod`
fn cleanup(toks: &mut Vec<Tok>) {
    let mut i = 0;
    while i < toks.len() {
        let target = [".", "", "=", "function"];
        let mut k = i;
        let mut ok = toks[i].is_word("sketch");
        for expected in target {
            if !ok { break; }
            match after(toks, k) {
                Some(n) if expected.is_empty() && toks[n].is_ident() => k = n,
                Some(n) if toks[n].text == expected => k = n,
                _ => ok = false,
            }
        }
        let add = if ok { after(toks, k).filter(|&n| toks[n].is_word("addMethod")) } else { None };
        match add {
            Some(add) => i = splice(toks, i..add + 1, vec![Tok::ident("addMethod")]),
            None => i += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(src: &str) -> String {
        translate(src).unwrap().code
    }

    #[test]
    fn uninitialized_int_becomes_zero_var() {
        assert_eq!(code("int foo;"), "var foo = 0;");
    }

    #[test]
    fn hex_literal_becomes_default_color() {
        assert_eq!(code("color c = #ff0000;"), "var c = DefaultColor(255,0,0);");
    }

    #[test]
    fn opengl_size_sets_flag() {
        assert!(translate("void setup() { size(200, 200, OPENGL); }").unwrap().uses_3d);
        assert!(!translate("void setup() { size(200, 200); }").unwrap().uses_3d);
    }

    #[test]
    fn cleanup_collapses_registration_artifact() {
        let mut toks = lexer::tokenize("sketch.go = function addMethod(this, \"go\", f);");
        cleanup(&mut toks);
        assert_eq!(render(&toks), "addMethod(this, \"go\", f);");
    }

    #[test]
    fn functions_are_reported() {
        let t = translate("void setup() { }\nvoid draw() { }").unwrap();
        assert_eq!(t.functions, vec!["setup", "draw"]);
    }
}
