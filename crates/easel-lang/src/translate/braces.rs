//! Balanced-delimiter matching over dialect tokens.
//!
//! Delimiters inside string/char literals and comments are single tokens and
//! therefore never counted.

use crate::error::TranslateError;
use crate::translate::lexer::tokenize;
use crate::translate::token::{Tok, render};

/// Closing counterpart of an opening delimiter.
pub fn closer_of(open: &str) -> Option<&'static str> {
    match open {
        "{" => Some("}"),
        "(" => Some(")"),
        "[" => Some("]"),
        _ => None,
    }
}

/// Given the index of an opening delimiter token, returns the index of its
/// matching closer. Only delimiters of the same kind affect the count.
pub fn find_close(toks: &[Tok], open_idx: usize) -> Result<usize, TranslateError> {
    let open_tok = &toks[open_idx];
    let unbalanced = || TranslateError::UnbalancedDelimiter {
        open: open_tok.text.chars().next().unwrap_or('?'),
        line: open_tok.line,
    };
    let close = closer_of(&open_tok.text).ok_or_else(unbalanced)?;
    scan(toks, open_idx + 1, &open_tok.text, close).ok_or_else(unbalanced)
}

/// Counts from depth 1 at `start`; returns the index where the depth hits zero.
fn scan(toks: &[Tok], start: usize, open: &str, close: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, t) in toks.iter().enumerate().skip(start) {
        if t.is_punct(open) {
            depth += 1;
        } else if t.is_punct(close) {
            depth -= 1;
            if depth == 0 { return Some(i); }
        }
    }
    None
}

/// Text form: `text` begins just after an opening `open` delimiter. Returns
/// everything before the matching closer.
pub fn balanced_prefix(text: &str, open: char) -> Result<String, TranslateError> {
    let open_s = open.to_string();
    let close = closer_of(&open_s)
        .ok_or(TranslateError::UnbalancedDelimiter { open, line: 1 })?;
    let toks = tokenize(text);
    match scan(&toks, 0, &open_s, close) {
        Some(end) => Ok(render(&toks[..end])),
        None => Err(TranslateError::UnbalancedDelimiter { open, line: 1 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_block() {
        assert_eq!(balanced_prefix("a = 1; } rest", '{').unwrap(), "a = 1; ");
    }

    #[test]
    fn nested_blocks_are_skipped() {
        let text = "if (x) { y(); } while (z) { { } } } tail }";
        assert_eq!(balanced_prefix(text, '{').unwrap(), "if (x) { y(); } while (z) { { } } ");
    }

    #[test]
    fn delimiters_in_strings_do_not_count() {
        assert_eq!(balanced_prefix("s = \"}\"; } x", '{').unwrap(), "s = \"}\"; ");
    }

    #[test]
    fn unmatched_opener_is_an_error() {
        let err = balanced_prefix("{ a; ", '{').unwrap_err();
        assert!(matches!(err, TranslateError::UnbalancedDelimiter { open: '{', .. }));
    }

    #[test]
    fn parens_and_brackets() {
        assert_eq!(balanced_prefix("f(a), b) c", '(').unwrap(), "f(a), b");
        assert_eq!(balanced_prefix("i][j]", '[').unwrap(), "i");
    }

    #[test]
    fn token_index_form() {
        let toks = tokenize("{ a { b } }");
        let close = find_close(&toks, 0).unwrap();
        assert_eq!(close, toks.len() - 1);
    }

    #[test]
    fn token_index_form_reports_line() {
        let toks = tokenize("\n\n( a");
        let open = toks.iter().position(|t| t.is_punct("(")).unwrap();
        assert_eq!(
            find_close(&toks, open),
            Err(TranslateError::UnbalancedDelimiter { open: '(', line: 3 })
        );
    }
}
