//! Escaping of text interpolated into generated Python.
//!
//! Every renderer routes descriptions, ids and payload keys through this
//! module before handing them to a template. Templates never escape on
//! their own (the Handlebars engine runs with escaping disabled).
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::escape;
//!
//! assert_eq!(escape::docstring(r#"Say "hi""#), "Say 'hi'");
//! assert_eq!(escape::comment("line one\nline two"), "line one line two");
//! assert_eq!(escape::string_literal("a\"b"), r#""a\"b""#);
//! ```

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Makes text safe inside a `"""` docstring.
///
/// Double quotes become single quotes, so a triple quote can never be
/// formed, and backslashes are doubled so they are not read as escapes.
#[must_use]
pub fn docstring(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "'")
}

/// Flattens text onto one line for a trailing `#` comment.
///
/// Literal `\n` sequences and real newlines become spaces and runs of
/// whitespace collapse to one.
#[must_use]
pub fn comment(text: &str) -> String {
    let flattened = text.replace("\\n", " ");
    WHITESPACE_RUN
        .replace_all(&flattened, " ")
        .trim()
        .to_string()
}

/// Renders text as a double-quoted Python string literal, quotes included.
#[must_use]
pub fn string_literal(text: &str) -> String {
    quoted(text, '"')
}

/// Renders text as a single-quoted Python string literal, quotes included.
///
/// Used for payload keys, which keep the remote parameter name verbatim.
#[must_use]
pub fn single_quoted(text: &str) -> String {
    quoted(text, '\'')
}

fn quoted(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Indents every line after the first by `indent`.
///
/// Used to nest multi-line text (docstrings, embedded code) under a block.
#[must_use]
pub fn indent_continuation(text: &str, indent: &str) -> String {
    text.split('\n').collect::<Vec<_>>().join(&format!("\n{indent}"))
}
