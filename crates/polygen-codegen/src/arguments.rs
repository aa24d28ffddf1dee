//! Argument/Signature Renderer.
//!
//! Produces the parameter list of a generated function, the payload dict
//! sent on the wire (keyed by the original remote names) and the collected
//! type definitions of every argument.
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::arguments::ArgumentRenderer;
//! use polygen_codegen::{SchemaRenderer, TypeMapper};
//! use polygen_core::{PropertySpecification, PropertyType};
//!
//! let mapper = TypeMapper::new(SchemaRenderer::builtin());
//! let args = ArgumentRenderer::new(&mapper).render(
//!     "getWeather",
//!     &[
//!         PropertySpecification::new("locationId", PropertyType::primitive("integer")),
//!         PropertySpecification::new("units-system", PropertyType::primitive("string")).optional(),
//!     ],
//! );
//! assert_eq!(args.parameters, "    locationId: int,\n    unitsSystem: str = None,");
//! assert_eq!(args.payload, "{'locationId': locationId, 'units-system': unitsSystem}");
//! assert!(args.definitions.is_empty());
//! ```

use crate::escape;
use crate::python::{python_title, qualify_type, rewrite_arg_name};
use crate::type_mapper::{TypeMapper, with_fallback_title};
use polygen_core::PropertySpecification;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:class\s+(\w+)\s*[(:]|(\w+)\s*=)").expect("valid declaration regex")
});

/// Rendered signature pieces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedArguments {
    /// One indented parameter per line, each ending with a comma.
    pub parameters: String,
    /// Python dict literal mapping remote names to local variables.
    pub payload: String,
    /// Type definitions collected from every argument.
    pub definitions: DefinitionSet,
}

/// Renders argument lists against a [`TypeMapper`].
#[derive(Debug, Clone, Copy)]
pub struct ArgumentRenderer<'m> {
    mapper: &'m TypeMapper,
}

impl<'m> ArgumentRenderer<'m> {
    /// Creates a renderer using `mapper` for argument types.
    #[must_use]
    pub const fn new(mapper: &'m TypeMapper) -> Self {
        Self { mapper }
    }

    /// Renders `arguments` for the function whose leaf name is `owner`.
    ///
    /// Non-basic types are qualified with the owner's type module. Optional
    /// arguments default to `None`; a required argument following an
    /// optional one is made keyword-only so the signature stays valid.
    #[must_use]
    pub fn render(&self, owner: &str, arguments: &[PropertySpecification]) -> RenderedArguments {
        let mut lines = Vec::with_capacity(arguments.len() + 1);
        let mut payload = Vec::with_capacity(arguments.len());
        let mut definitions = DefinitionSet::default();
        let mut used = HashSet::new();
        let mut seen_optional = false;
        let mut keyword_only = false;

        for (idx, argument) in arguments.iter().enumerate() {
            let remote = if argument.name.is_empty() {
                format!("arg{idx}")
            } else {
                argument.name.clone()
            };
            let local = unique_local(rewrite_arg_name(&remote), &mut used);

            let ty = with_fallback_title(&argument.property_type, &argument.name);
            let resolved = self.mapper.resolve(&ty, &python_title(&argument.name));
            definitions.push(&resolved.definition);

            if argument.required && seen_optional && !keyword_only {
                lines.push("    *,".to_string());
                keyword_only = true;
            }
            seen_optional |= !argument.required;

            let mut line = format!("    {local}: {}", qualify_type(owner, &resolved.expr));
            if !argument.required {
                line.push_str(" = None");
            }
            line.push(',');
            let description = escape::comment(&argument.description);
            if !description.is_empty() {
                line.push_str("  # ");
                line.push_str(&description);
            }
            lines.push(line);

            payload.push(format!("{}: {local}", escape::single_quoted(&remote)));
        }

        RenderedArguments {
            parameters: lines.join("\n"),
            payload: format!("{{{}}}", payload.join(", ")),
            definitions,
        }
    }
}

fn unique_local(name: String, used: &mut HashSet<String>) -> String {
    let mut candidate = name.clone();
    let mut counter = 2;
    while used.contains(&candidate) {
        candidate = format!("{name}{counter}");
        counter += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Ordered, deduplicated Python declarations.
///
/// Definition blocks are split into top-level declarations; a declaration
/// whose name is already present is skipped, so shared schemas (and a
/// return type that an argument already declares) are emitted once.
/// Import lines are hoisted to the top and deduplicated.
///
/// # Examples
///
/// ```
/// use polygen_codegen::arguments::DefinitionSet;
///
/// let mut defs = DefinitionSet::default();
/// defs.push("from typing import List\n\n\nclass Pet(TypedDict):\n    id: int\n");
/// defs.push("from typing import List\n\n\nclass Pet(TypedDict):\n    id: int\n");
/// assert!(defs.declares("Pet"));
/// assert_eq!(defs.render().matches("class Pet").count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionSet {
    imports: Vec<String>,
    names: Vec<String>,
    blocks: Vec<String>,
}

impl DefinitionSet {
    /// Adds every declaration of `source` not already present.
    pub fn push(&mut self, source: &str) {
        let mut pending: Vec<&str> = Vec::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in source.lines() {
            if line.starts_with("from ") || line.starts_with("import ") {
                if !self.imports.iter().any(|i| i == line) {
                    self.imports.push(line.to_string());
                }
                continue;
            }
            if let Some(name) = declared_name(line) {
                if let Some((previous, previous_body)) = current.take() {
                    self.insert(previous, &previous_body);
                }
                let mut body = std::mem::take(&mut pending);
                body.push(line);
                current = Some((name, body));
                continue;
            }
            match current.as_mut() {
                Some((_, body)) if line.starts_with(char::is_whitespace) || line.is_empty() => {
                    body.push(line);
                }
                Some(_) if line.starts_with('#') => pending.push(line),
                Some((_, body)) => body.push(line),
                None => pending.push(line),
            }
        }
        if let Some((name, body)) = current.take() {
            self.insert(name, &body);
        }
    }

    /// Adds another set, preserving order and skipping known names.
    pub fn extend(&mut self, other: &Self) {
        for import in &other.imports {
            if !self.imports.contains(import) {
                self.imports.push(import.clone());
            }
        }
        for (name, block) in other.names.iter().zip(&other.blocks) {
            if !self.declares(name) {
                self.names.push(name.clone());
                self.blocks.push(block.clone());
            }
        }
    }

    /// Returns `true` if a top-level declaration named `name` is present.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns `true` if there are no declarations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Hoisted import lines.
    #[must_use]
    pub fn imports(&self) -> String {
        self.imports.join("\n")
    }

    /// Declarations separated by two blank lines.
    #[must_use]
    pub fn body(&self) -> String {
        self.blocks.join("\n\n\n")
    }

    /// Imports followed by the declarations.
    #[must_use]
    pub fn render(&self) -> String {
        if self.imports.is_empty() {
            self.body()
        } else {
            format!("{}\n\n\n{}", self.imports(), self.body())
        }
    }

    fn insert(&mut self, name: String, body: &[&str]) {
        if self.declares(&name) {
            return;
        }
        let mut lines = body.to_vec();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        while lines.first().is_some_and(|l| l.trim().is_empty()) {
            lines.remove(0);
        }
        self.names.push(name);
        self.blocks.push(lines.join("\n"));
    }
}

fn declared_name(line: &str) -> Option<String> {
    let caps = DECLARATION.captures(line)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaRenderer;
    use polygen_core::PropertyType;
    use serde_json::json;

    fn render(owner: &str, arguments: &[PropertySpecification]) -> RenderedArguments {
        let mapper = TypeMapper::new(SchemaRenderer::builtin());
        ArgumentRenderer::new(&mapper).render(owner, arguments)
    }

    #[test]
    fn test_integer_argument_has_no_definition() {
        let out = render(
            "getLocation",
            &[PropertySpecification::new("locationId", PropertyType::primitive("integer"))],
        );
        assert_eq!(out.parameters, "    locationId: int,");
        assert!(out.definitions.is_empty());
    }

    #[test]
    fn test_reserved_names_and_payload_keys() {
        let out = render(
            "send",
            &[
                PropertySpecification::new("from", PropertyType::primitive("string")),
                PropertySpecification::new("Dict", PropertyType::Any),
            ],
        );
        assert!(out.parameters.contains("    _from: str,"));
        assert!(out.parameters.contains("    _Dict: Any,"));
        assert_eq!(out.payload, "{'from': _from, 'Dict': _Dict}");
    }

    #[test]
    fn test_description_is_flattened_into_comment() {
        let out = render(
            "f",
            &[PropertySpecification::new("q", PropertyType::primitive("string"))
                .with_description("first line\nsecond\\nthird   line")],
        );
        assert_eq!(out.parameters, "    q: str,  # first line second third line");
    }

    #[test]
    fn test_required_after_optional_becomes_keyword_only() {
        let out = render(
            "f",
            &[
                PropertySpecification::new("a", PropertyType::primitive("string")).optional(),
                PropertySpecification::new("b", PropertyType::primitive("string")),
                PropertySpecification::new("c", PropertyType::primitive("string")),
            ],
        );
        assert_eq!(
            out.parameters,
            "    a: str = None,\n    *,\n    b: str,\n    c: str,"
        );
    }

    #[test]
    fn test_object_argument_is_qualified_and_named_after_argument() {
        let out = render(
            "createOrder",
            &[PropertySpecification::new(
                "shipping address",
                PropertyType::object(json!({
                    "type": "object",
                    "properties": {"street": {"type": "string"}}
                })),
            )],
        );
        assert!(out.parameters.contains("shippingAddress: _createOrder.ShippingAddress,"));
        assert!(out.definitions.declares("ShippingAddress"));
        assert!(out.payload.contains("'shipping address': shippingAddress"));
    }

    #[test]
    fn test_untitled_array_arguments_get_distinct_types() {
        let array = || -> PropertyType {
            serde_json::from_value(json!({
                "kind": "array",
                "items": {"type": "object", "properties": {"id": {"type": "string"}}}
            }))
            .unwrap()
        };
        let out = render(
            "assign",
            &[
                PropertySpecification::new("owners", array()),
                PropertySpecification::new("pets", array()),
            ],
        );
        assert!(out.parameters.contains("owners: _assign.Owners,"));
        assert!(out.parameters.contains("pets: _assign.Pets,"));
        assert!(out.definitions.declares("Owners"));
        assert!(out.definitions.declares("Pets"));
        assert!(!out.definitions.declares("ResponseType"));
    }

    #[test]
    fn test_colliding_local_names_are_suffixed() {
        let out = render(
            "f",
            &[
                PropertySpecification::new("user-id", PropertyType::Any),
                PropertySpecification::new("userId", PropertyType::Any),
            ],
        );
        assert!(out.parameters.contains("    userId: Any,"));
        assert!(out.parameters.contains("    userId2: Any,"));
    }

    #[test]
    fn test_list_argument_quoting() {
        let out = render(
            "f",
            &[PropertySpecification::new(
                "products",
                PropertyType::Array {
                    items: Some(polygen_core::ArrayItems::Type(Box::new(
                        PropertyType::primitive("string"),
                    ))),
                },
            )],
        );
        assert!(out.parameters.contains("products: List[str],"));
    }

    #[test]
    fn test_definition_set_splits_and_dedupes() {
        let mut defs = DefinitionSet::default();
        defs.push(
            "from typing import Any\n\n\nclass A(TypedDict, total=False):\n    x: \"_AX\"\n\n\nclass _AX(TypedDict, total=False):\n    y: int\n",
        );
        defs.push("from typing import Any\n\n\n# B doc\nB = TypedDict(\"B\", {\n    \"a-b\": int,\n}, total=False)\n\n\nclass A(TypedDict):\n    other: str\n");

        assert!(defs.declares("A"));
        assert!(defs.declares("_AX"));
        assert!(defs.declares("B"));
        let rendered = defs.render();
        assert_eq!(rendered.matches("from typing import Any").count(), 1);
        assert_eq!(rendered.matches("class A(").count(), 1);
        assert!(rendered.contains("# B doc\nB = TypedDict("));
        assert!(!rendered.contains("other: str"));
    }
}
