//! Schema Renderer: JSON Schema to Python type declarations.
//!
//! [`SchemaRenderer::render`] is total. Whatever the engine does, the caller
//! receives a usable type expression: the declared root name on success,
//! the caller's fallback type with no definition on failure.
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::SchemaRenderer;
//! use serde_json::json;
//!
//! let renderer = SchemaRenderer::builtin();
//! let pet = renderer.render(
//!     &json!({"title": "Pet", "type": "object", "properties": {"id": {"type": "integer"}}}),
//!     "Pet Store",
//!     "Dict",
//! );
//! assert_eq!(pet.expr, "PetStore");
//! assert!(pet.definition.contains("class PetStore(TypedDict, total=False):"));
//! ```

mod command;
mod engine;
mod typed_dict;

pub use command::{CommandEngine, classify_failure};
pub use engine::{EngineError, SchemaEngine};
pub use typed_dict::{DEFAULT_MAX_DEPTH, TypedDictEngine};

pub(crate) use typed_dict::nested_name;

use crate::python;
use crate::resolver::POLY_REF_KEY;
use crate::types::TypeResolution;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};

static MALFORMED_EXAMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)# example: \{\n.*?^\}$").expect("valid malformed example regex")
});

/// Total wrapper around a [`SchemaEngine`].
#[derive(Debug, Clone)]
pub struct SchemaRenderer {
    engine: Arc<dyn SchemaEngine>,
}

impl SchemaRenderer {
    /// Renderer backed by the in-process [`TypedDictEngine`].
    #[must_use]
    pub fn builtin() -> Self {
        Self::with_engine(Arc::new(TypedDictEngine::new()))
    }

    /// Renderer backed by a custom engine.
    #[must_use]
    pub fn with_engine(engine: Arc<dyn SchemaEngine>) -> Self {
        Self { engine }
    }

    /// Name of the underlying engine.
    #[must_use]
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Renders `schema` with its root declared as `root`.
    ///
    /// An empty `root` is synthesized from the schema's unresolved poly-ref
    /// path, or `MyDict`/`MyList`. The root is sanitized into an identifier
    /// (spaces stripped, reserved names suffixed with `_`).
    ///
    /// Never fails: any engine error yields `fallback` with no definition.
    #[must_use]
    pub fn render(&self, schema: &Value, root: &str, fallback: &str) -> TypeResolution {
        let root = root_name(schema, root, fallback);

        let mut input = schema.clone();
        normalize_enums(&mut input);

        match self.engine.generate(&input, &root) {
            Ok(source) => TypeResolution::new(root, clean_malformed_examples(&source)),
            Err(err @ (EngineError::RecursionLimit { .. }
            | EngineError::CannotDetermineSpecification { .. })) => {
                tracing::warn!(
                    root = %root,
                    engine = self.engine.name(),
                    error = %err,
                    fallback,
                    "Schema rendering degraded to fallback type"
                );
                TypeResolution::simple(fallback)
            }
            Err(err) => {
                tracing::error!(
                    root = %root,
                    engine = self.engine.name(),
                    error = %err,
                    schema = %schema,
                    fallback,
                    "Error when generating schema type, using fallback type"
                );
                TypeResolution::simple(fallback)
            }
        }
    }
}

impl Default for SchemaRenderer {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Computes the sanitized root name for a schema.
///
/// # Examples
///
/// ```
/// use polygen_codegen::schema::root_name;
/// use serde_json::json;
///
/// assert_eq!(root_name(&json!({}), "", "Dict"), "MyDict");
/// assert_eq!(root_name(&json!({}), "", "List"), "MyList");
/// assert_eq!(
///     root_name(&json!({"x-poly-ref": {"path": "shop.pet_owner"}}), "", "Dict"),
///     "DictShopPetOwner"
/// );
/// assert_eq!(root_name(&json!({}), "List", "Dict"), "List_");
/// ```
#[must_use]
pub fn root_name(schema: &Value, root: &str, fallback: &str) -> String {
    let candidate = if root.trim().is_empty() {
        let base = if fallback == "List" { "List" } else { "Dict" };
        match schema
            .get(POLY_REF_KEY)
            .and_then(|r| r.get("path"))
            .and_then(Value::as_str)
        {
            Some(path) => path
                .split('.')
                .map(python::to_pascal_case)
                .fold(base.to_string(), |acc, segment| acc + &segment),
            None => format!("My{base}"),
        }
    } else {
        root.to_string()
    };
    let cleaned = python::clean_title(&candidate);
    if cleaned.chars().all(|c| c.is_alphanumeric() || c == '_') {
        cleaned
    } else {
        python::sanitize_identifier(&cleaned)
    }
}

/// Replaces double quotes in string `enum` members with single quotes.
pub fn normalize_enums(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "enum"
                    && let Value::Array(members) = child
                {
                    for member in members.iter_mut() {
                        if let Value::String(s) = member
                            && s.contains('"')
                        {
                            *s = s.replace('"', "'");
                        }
                    }
                } else {
                    normalize_enums(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_enums),
        _ => {}
    }
}

/// Removes `# example: {` blocks whose object body was emitted uncommented.
///
/// # Examples
///
/// ```
/// use polygen_codegen::schema::clean_malformed_examples;
///
/// let source = "class A(TypedDict):\n    # example: {\n\"a\": 1\n}\n    x: int\n";
/// assert_eq!(clean_malformed_examples(source), "class A(TypedDict):\n    \n    x: int\n");
/// ```
#[must_use]
pub fn clean_malformed_examples(source: &str) -> String {
    MALFORMED_EXAMPLE.replace_all(source, "").into_owned()
}
