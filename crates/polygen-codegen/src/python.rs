//! Python naming rules.
//!
//! Identifier normalization, reserved-word escaping, primitive type mapping
//! and the import-path qualification used to reference per-function type
//! modules from an aggregator.
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::python::{qualify_type, rewrite_arg_name};
//!
//! assert_eq!(rewrite_arg_name("conversation-sid"), "conversationSid");
//! assert_eq!(rewrite_arg_name("from"), "_from");
//! assert_eq!(qualify_type("getPet", "Pet"), "_getPet.Pet");
//! assert_eq!(qualify_type("getPet", "List[str]"), "List[str]");
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// Python keywords.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Typing names imported by every generated preamble.
pub const PREAMBLE_NAMES: &[&str] = &["List", "Dict", "Any", "Optional", "Callable"];

/// Type expressions that never need an import path.
pub const BASIC_TYPES: &[&str] = &[
    "Any", "List", "Dict", "int", "float", "str", "bool", "None", "Callable",
];

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_-]+").expect("valid separator regex"));

static PASCAL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|_)([a-z])").expect("valid pascal regex"));

/// Returns `true` if `name` is a keyword or a preamble typing name.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    is_keyword(name) || PREAMBLE_NAMES.contains(&name)
}

/// Returns `true` for Python keywords, which cannot be used as field names
/// in class-style `TypedDict` declarations.
#[must_use]
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Returns `true` for type expressions that need no qualification.
#[must_use]
pub fn is_basic_type(expr: &str) -> bool {
    BASIC_TYPES.contains(&expr)
}

/// Prefixes reserved names with `_`.
#[must_use]
pub fn rewrite_reserved(name: &str) -> String {
    if is_reserved(name) {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

/// Title-cases words the way Python's `str.title` does.
///
/// Every letter that follows a non-letter is upper-cased, all other letters
/// are lower-cased.
///
/// # Examples
///
/// ```
/// use polygen_codegen::python::python_title;
///
/// assert_eq!(python_title("hello wORLD"), "Hello World");
/// assert_eq!(python_title("user_id"), "User_Id");
/// ```
#[must_use]
pub fn python_title(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Converts space or hyphen separated names to camelCase.
///
/// Names without spaces or hyphens are assumed to already be camelCase and
/// are only trimmed.
///
/// # Examples
///
/// ```
/// use polygen_codegen::python::to_camel_case;
///
/// assert_eq!(to_camel_case("Account Id"), "accountId");
/// assert_eq!(to_camel_case("x-api-key"), "xApiKey");
/// assert_eq!(to_camel_case("already_snake"), "already_snake");
/// ```
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let trimmed = name.trim();
    if !trimmed.contains([' ', '-']) {
        return trimmed.to_string();
    }
    let spaced = SEPARATOR_RUN.replace_all(trimmed, " ");
    let joined: String = python_title(&spaced).split_whitespace().collect();
    let mut chars = joined.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// Upper-cases the first letter and every lowercase letter after `_`,
/// dropping those underscores.
///
/// # Examples
///
/// ```
/// use polygen_codegen::python::to_pascal_case;
///
/// assert_eq!(to_pascal_case("shop_pet"), "ShopPet");
/// assert_eq!(to_pascal_case("order"), "Order");
/// ```
#[must_use]
pub fn to_pascal_case(name: &str) -> String {
    PASCAL_BOUNDARY
        .replace_all(name, |caps: &regex::Captures<'_>| caps[2].to_uppercase())
        .into_owned()
}

/// Replaces characters that cannot appear in a Python identifier.
///
/// A leading digit gets a `_` prefix; an empty result becomes `arg`.
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return "arg".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Local variable name for a remote argument name.
#[must_use]
pub fn rewrite_arg_name(name: &str) -> String {
    rewrite_reserved(&sanitize_identifier(&to_camel_case(name)))
}

/// Name of the companion module that holds a leaf's type definitions.
#[must_use]
pub fn type_module(leaf: &str) -> String {
    format!("_{leaf}")
}

/// Strips spaces from a schema title and suffixes names that would shadow
/// a reserved word.
///
/// # Examples
///
/// ```
/// use polygen_codegen::python::clean_title;
///
/// assert_eq!(clean_title("Pet Store"), "PetStore");
/// assert_eq!(clean_title("List"), "List_");
/// ```
#[must_use]
pub fn clean_title(title: &str) -> String {
    let stripped = title.replace(' ', "");
    if is_reserved(&stripped) {
        format!("{stripped}_")
    } else {
        stripped
    }
}

/// Maps a JSON primitive name to a Python type; unknown names become `Any`.
#[must_use]
pub fn map_primitive_type(type_name: &str) -> &'static str {
    match type_name {
        "integer" => "int",
        "number" => "float",
        "string" => "str",
        "boolean" => "bool",
        "array" => "List",
        "object" => "Dict",
        _ => "Any",
    }
}

/// Returns `true` if `type_name` has a fixed primitive mapping.
#[must_use]
pub fn is_primitive(type_name: &str) -> bool {
    matches!(
        type_name,
        "integer" | "number" | "string" | "boolean" | "array" | "object"
    )
}

/// Prefixes non-basic type names with the owner's type module.
///
/// `List[...]` wrappers are kept and their element qualified; forward
/// references written as `"Name"` stay quoted. Callables are left alone.
#[must_use]
pub fn qualify_type(owner: &str, expr: &str) -> String {
    let expr = expr.trim();
    if expr.is_empty() || expr.starts_with("Callable") || is_basic_type(expr) {
        return expr.to_string();
    }
    if let Some(inner) = expr.strip_prefix("List[").and_then(|s| s.strip_suffix(']')) {
        return format!("List[{}]", qualify_type(owner, inner));
    }
    if let Some(quoted) = expr.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return format!("\"{}.{}\"", type_module(owner), to_camel_case(quoted));
    }
    format!("{}.{}", type_module(owner), to_camel_case(expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_reserved() {
        assert_eq!(rewrite_reserved("class"), "_class");
        assert_eq!(rewrite_reserved("Dict"), "_Dict");
        assert_eq!(rewrite_reserved("name"), "name");
    }

    #[test]
    fn test_camel_case_collapses_separator_runs() {
        assert_eq!(to_camel_case("first__name here"), "firstNameHere");
        assert_eq!(to_camel_case("  padded  "), "padded");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("a.b"), "a_b");
        assert_eq!(sanitize_identifier("1st"), "_1st");
        assert_eq!(sanitize_identifier(""), "arg");
    }

    #[test]
    fn test_rewrite_arg_name_escapes_after_casing() {
        assert_eq!(rewrite_arg_name("locationId"), "locationId");
        assert_eq!(rewrite_arg_name("import"), "_import");
    }

    #[test]
    fn test_map_primitive_type_unknown_is_any() {
        assert_eq!(map_primitive_type("integer"), "int");
        assert_eq!(map_primitive_type("number"), "float");
        assert_eq!(map_primitive_type("string"), "str");
        assert_eq!(map_primitive_type("boolean"), "bool");
        assert_eq!(map_primitive_type("uuid"), "Any");
    }

    #[test]
    fn test_qualify_type_list_and_quoted() {
        assert_eq!(qualify_type("f", "List[Pet]"), "List[_f.Pet]");
        assert_eq!(qualify_type("f", "List[\"Pet\"]"), "List[\"_f.Pet\"]");
        assert_eq!(qualify_type("f", "List[List[int]]"), "List[List[int]]");
        assert_eq!(qualify_type("f", "Callable[[str], None]"), "Callable[[str], None]");
        assert_eq!(qualify_type("f", "None"), "None");
    }

    #[test]
    fn test_clean_title_suffixes_reserved() {
        assert_eq!(clean_title("Dict"), "Dict_");
        assert_eq!(clean_title("List[Pet]"), "List[Pet]");
    }
}
