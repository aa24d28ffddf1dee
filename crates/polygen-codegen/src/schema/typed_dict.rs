//! In-process JSON Schema to `TypedDict` engine.
//!
//! Objects with properties become `TypedDict` classes (`total=False`, with
//! `Required[...]` on required fields); everything else becomes a type
//! alias. Nested inline objects are hoisted to `_<Parent><Prop>` classes and
//! every reference to a declared class is a quoted forward reference, so
//! declaration order never matters and recursive schemas terminate.

use super::engine::{EngineError, SchemaEngine};
use crate::{escape, python};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 48;

const HEADER: &str = "from typing import Any, Dict, List, Literal, Tuple, Union\n\
                      from typing_extensions import Required, TypedDict\n\n\n";

/// Built-in schema engine.
///
/// # Examples
///
/// ```
/// use polygen_codegen::schema::{SchemaEngine, TypedDictEngine};
/// use serde_json::json;
///
/// let source = TypedDictEngine::new()
///     .generate(&json!({"type": "object", "properties": {"id": {"type": "integer"}}, "required": ["id"]}), "Pet")
///     .unwrap();
/// assert!(source.contains("class Pet(TypedDict, total=False):"));
/// assert!(source.contains("id: Required[int]"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypedDictEngine {
    max_depth: usize,
}

impl TypedDictEngine {
    /// Creates an engine with [`DEFAULT_MAX_DEPTH`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Creates an engine with a custom nesting limit.
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for TypedDictEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaEngine for TypedDictEngine {
    fn name(&self) -> &'static str {
        "typeddict"
    }

    fn generate(&self, schema: &Value, root: &str) -> Result<String, EngineError> {
        let mut generator = Generator::new(schema, root, self.max_depth);
        generator.emit_root()?;
        Ok(generator.finish())
    }
}

struct Generator<'s> {
    document: &'s Value,
    root: String,
    max_depth: usize,
    declared: HashSet<String>,
    // JSON pointer -> declared name
    references: HashMap<String, String>,
    blocks: Vec<String>,
}

impl<'s> Generator<'s> {
    fn new(document: &'s Value, root: &str, max_depth: usize) -> Self {
        Self {
            document,
            root: root.to_string(),
            max_depth,
            declared: HashSet::new(),
            references: HashMap::new(),
            blocks: Vec::new(),
        }
    }

    fn finish(self) -> String {
        let mut out = String::from(HEADER);
        out.push_str(&self.blocks.join("\n\n\n"));
        out.push('\n');
        out
    }

    fn emit_root(&mut self) -> Result<(), EngineError> {
        let root = self.root.clone();
        self.declared.insert(root.clone());

        if let Some(reference) = self.document.get("$ref").and_then(Value::as_str)
            && let Some(key) = definition_key(reference)
            && definition_name(&key) == root
        {
            let definition = self.lookup(reference, &key)?;
            self.references.insert(reference.to_string(), root.clone());
            return self.declare(&root, &definition, 0);
        }

        let document = self.document.clone();
        self.declare(&root, &document, 0)
    }

    /// Declares `name` as a class when `schema` is an object with
    /// properties, otherwise as an alias.
    fn declare(&mut self, name: &str, schema: &Value, depth: usize) -> Result<(), EngineError> {
        let schema = self.flatten_all_of(schema)?;
        if let Some(map) = schema.as_object()
            && let Some(properties) = object_properties(map)
        {
            return self.declare_class(name, map, properties, depth);
        }
        let expr = self.type_expr(&schema, name, depth)?;
        self.blocks.push(format!("{name} = {}", unquote(&expr)));
        Ok(())
    }

    /// Unwraps single-member `allOf` and merges multi-member `allOf` so a
    /// declaration keeps its own name.
    fn flatten_all_of(&self, schema: &Value) -> Result<Value, EngineError> {
        let mut current = schema.clone();
        while let Some(Value::Array(members)) = current.get("allOf") {
            current = match members.as_slice() {
                [only] => only.clone(),
                _ => self.merge_all_of(members)?,
            };
        }
        Ok(current)
    }

    fn declare_class(
        &mut self,
        name: &str,
        map: &Map<String, Value>,
        properties: &Map<String, Value>,
        depth: usize,
    ) -> Result<(), EngineError> {
        let required: HashSet<&str> = map
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut fields = Vec::with_capacity(properties.len());
        for (property, schema) in properties {
            let hint = nested_name(name, property);
            let expr = self.type_expr(schema, &hint, depth + 1)?;
            let is_required = required.contains(property.as_str());
            let field = if is_required {
                format!("Required[{expr}]")
            } else {
                expr
            };
            let description = schema
                .get("description")
                .and_then(Value::as_str)
                .filter(|d| !d.trim().is_empty())
                .map(ToString::to_string)
                .or_else(|| is_required.then(|| "Required property".to_string()));
            fields.push((property.as_str(), field, description));
        }

        let class_doc = map
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.trim().is_empty());

        let block = if fields.iter().all(|(p, _, _)| is_field_identifier(p)) {
            let mut lines = vec![format!("class {name}(TypedDict, total=False):")];
            if let Some(doc) = class_doc {
                lines.push(format!("    \"\"\" {} \"\"\"", docstring_body(doc)));
                lines.push(String::new());
            }
            for (property, field, description) in &fields {
                lines.push(format!("    {property}: {field}"));
                if let Some(doc) = description {
                    lines.push(format!("    \"\"\" {} \"\"\"", docstring_body(doc)));
                }
                lines.push(String::new());
            }
            while lines.last().is_some_and(String::is_empty) {
                lines.pop();
            }
            lines.join("\n")
        } else {
            let mut lines = Vec::new();
            if let Some(doc) = class_doc {
                lines.push(format!("# {}", escape::comment(doc)));
            }
            lines.push(format!(
                "{name} = TypedDict({}, {{",
                escape::string_literal(name)
            ));
            for (property, field, description) in &fields {
                if let Some(doc) = description {
                    lines.push(format!("    # {}", escape::comment(doc)));
                }
                lines.push(format!("    {}: {field},", escape::string_literal(property)));
            }
            lines.push("}, total=False)".to_string());
            lines.join("\n")
        };

        self.blocks.push(block);
        Ok(())
    }

    fn type_expr(&mut self, schema: &Value, hint: &str, depth: usize) -> Result<String, EngineError> {
        if depth > self.max_depth {
            return Err(EngineError::RecursionLimit {
                detail: format!("depth {depth} > {}", self.max_depth),
            });
        }
        let Some(map) = schema.as_object() else {
            return Ok("Any".to_string());
        };

        if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            return self.reference(reference, depth);
        }
        if let Some(value) = map.get("const") {
            return Ok(match value {
                Value::Null => "None".to_string(),
                other => format!("Literal[{}]", literal(other)),
            });
        }
        if let Some(Value::Array(values)) = map.get("enum") {
            return Ok(enum_expr(values));
        }
        for key in ["anyOf", "oneOf"] {
            if let Some(Value::Array(members)) = map.get(key) {
                let mut exprs = Vec::with_capacity(members.len());
                for (idx, member) in members.iter().enumerate() {
                    let member_hint = if idx == 0 {
                        hint.to_string()
                    } else {
                        format!("{hint}{idx}")
                    };
                    exprs.push(self.type_expr(member, &member_hint, depth + 1)?);
                }
                return Ok(union(exprs));
            }
        }
        if let Some(Value::Array(members)) = map.get("allOf") {
            if let [only] = members.as_slice() {
                return self.type_expr(only, hint, depth + 1);
            }
            let merged = self.merge_all_of(members)?;
            return self.type_expr(&merged, hint, depth + 1);
        }

        match map.get("type") {
            Some(Value::Array(types)) => {
                let mut exprs = Vec::with_capacity(types.len());
                for ty in types {
                    let mut single = map.clone();
                    single.insert("type".to_string(), ty.clone());
                    exprs.push(self.type_expr(&Value::Object(single), hint, depth + 1)?);
                }
                Ok(union(exprs))
            }
            Some(Value::String(ty)) => match ty.as_str() {
                "string" => Ok("str".to_string()),
                "integer" => Ok("int".to_string()),
                "number" => Ok("float".to_string()),
                "boolean" => Ok("bool".to_string()),
                "null" => Ok("None".to_string()),
                "array" => self.array_expr(map, hint, depth),
                "object" => self.object_expr(map, hint, depth),
                _ => Ok("Any".to_string()),
            },
            _ if map.contains_key("properties") => self.object_expr(map, hint, depth),
            _ if map.contains_key("items") => self.array_expr(map, hint, depth),
            _ => Ok("Any".to_string()),
        }
    }

    fn array_expr(
        &mut self,
        map: &Map<String, Value>,
        hint: &str,
        depth: usize,
    ) -> Result<String, EngineError> {
        match map.get("items") {
            Some(Value::Array(tuple)) => {
                let mut exprs = Vec::with_capacity(tuple.len());
                for (idx, item) in tuple.iter().enumerate() {
                    exprs.push(self.type_expr(item, &format!("{hint}Item{idx}"), depth + 1)?);
                }
                Ok(format!("Tuple[{}]", exprs.join(", ")))
            }
            Some(items) => {
                let expr = self.type_expr(items, &format!("{hint}Item"), depth + 1)?;
                Ok(format!("List[{expr}]"))
            }
            None => Ok("List[Any]".to_string()),
        }
    }

    fn object_expr(
        &mut self,
        map: &Map<String, Value>,
        hint: &str,
        depth: usize,
    ) -> Result<String, EngineError> {
        if let Some(properties) = object_properties(map) {
            let name = self.claim(hint);
            self.declare_class(&name, map, properties, depth + 1)?;
            return Ok(quote(&name));
        }
        let values = map
            .get("additionalProperties")
            .filter(|v| v.is_object())
            .or_else(|| {
                map.get("patternProperties")
                    .and_then(Value::as_object)
                    .and_then(|p| p.values().next())
            });
        match values {
            Some(schema) => {
                let expr = self.type_expr(schema, &format!("{hint}Value"), depth + 1)?;
                Ok(format!("Dict[str, {expr}]"))
            }
            None => Ok("Dict[str, Any]".to_string()),
        }
    }

    fn reference(&mut self, reference: &str, depth: usize) -> Result<String, EngineError> {
        if reference == "#" {
            return Ok(quote(&self.root));
        }
        if let Some(name) = self.references.get(reference) {
            return Ok(quote(name));
        }
        let key = definition_key(reference).ok_or_else(|| {
            EngineError::CannotDetermineSpecification {
                reference: reference.to_string(),
            }
        })?;
        let definition = self.lookup(reference, &key)?;
        let name = self.claim(&definition_name(&key));
        self.references.insert(reference.to_string(), name.clone());
        self.declare(&name, &definition, depth + 1)?;
        Ok(quote(&name))
    }

    fn lookup(&self, reference: &str, key: &str) -> Result<Value, EngineError> {
        ["definitions", "$defs"]
            .iter()
            .find_map(|section| self.document.get(section).and_then(|d| d.get(key)))
            .cloned()
            .ok_or_else(|| EngineError::CannotDetermineSpecification {
                reference: reference.to_string(),
            })
    }

    fn merge_all_of(&self, members: &[Value]) -> Result<Value, EngineError> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for member in members {
            let resolved = match member.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    let key = definition_key(reference).ok_or_else(|| {
                        EngineError::CannotDetermineSpecification {
                            reference: reference.to_string(),
                        }
                    })?;
                    self.lookup(reference, &key)?
                }
                None => member.clone(),
            };
            if let Some(props) = resolved.get("properties").and_then(Value::as_object) {
                for (k, v) in props {
                    properties.insert(k.clone(), v.clone());
                }
            }
            if let Some(req) = resolved.get("required").and_then(Value::as_array) {
                required.extend(req.iter().cloned());
            }
        }
        Ok(json!({"type": "object", "properties": properties, "required": required}))
    }

    fn claim(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut counter = 2;
        while self.declared.contains(&candidate) {
            candidate = format!("{name}{counter}");
            counter += 1;
        }
        self.declared.insert(candidate.clone());
        candidate
    }
}

fn object_properties(map: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let is_object = map.get("type").is_none_or(|t| t == "object");
    map.get("properties")
        .and_then(Value::as_object)
        .filter(|p| is_object && !p.is_empty())
}

fn definition_key(reference: &str) -> Option<String> {
    reference
        .strip_prefix("#/definitions/")
        .or_else(|| reference.strip_prefix("#/$defs/"))
        .filter(|k| !k.is_empty() && !k.contains('/'))
        .map(|k| k.replace("~1", "/").replace("~0", "~"))
}

fn definition_name(key: &str) -> String {
    upper_first(&python::sanitize_identifier(&python::clean_title(key)))
}

pub(crate) fn nested_name(parent: &str, property: &str) -> String {
    format!(
        "_{}{}",
        parent.trim_start_matches('_'),
        upper_first(&python::sanitize_identifier(property))
    )
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn is_field_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !python::is_keyword(name)
}

fn docstring_body(text: &str) -> String {
    escape::indent_continuation(&escape::docstring(text.trim()), "    ")
}

fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

fn unquote(expr: &str) -> &str {
    expr.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(expr)
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => escape::string_literal(s),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        Value::Number(n) => n.to_string(),
        other => escape::string_literal(&other.to_string()),
    }
}

fn enum_expr(values: &[Value]) -> String {
    let literals: Vec<String> = values
        .iter()
        .filter(|v| !v.is_null())
        .map(literal)
        .collect();
    let has_null = values.iter().any(Value::is_null);
    match (literals.is_empty(), has_null) {
        (true, _) => "None".to_string(),
        (false, false) => format!("Literal[{}]", literals.join(", ")),
        (false, true) => format!("Union[Literal[{}], None]", literals.join(", ")),
    }
}

fn union(exprs: Vec<String>) -> String {
    let mut unique: Vec<String> = Vec::with_capacity(exprs.len());
    for expr in exprs {
        if !unique.contains(&expr) {
            unique.push(expr);
        }
    }
    match unique.len() {
        0 => "Any".to_string(),
        1 => unique.remove(0),
        _ => format!("Union[{}]", unique.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(schema: &Value, root: &str) -> String {
        TypedDictEngine::new().generate(schema, root).unwrap()
    }

    #[test]
    fn test_required_and_optional_fields() {
        let out = generate(
            &json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "name": {"type": "string", "description": "Display name"},
                    "tag": {"type": "string"}
                },
                "required": ["id", "name"]
            }),
            "Pet",
        );
        assert!(out.starts_with(HEADER));
        assert!(out.contains("class Pet(TypedDict, total=False):"));
        assert!(out.contains("    id: Required[int]\n    \"\"\" Required property \"\"\""));
        assert!(out.contains("    name: Required[str]\n    \"\"\" Display name \"\"\""));
        assert!(out.contains("    tag: str"));
    }

    #[test]
    fn test_nested_object_is_hoisted() {
        let out = generate(
            &json!({
                "type": "object",
                "properties": {
                    "owner": {"type": "object", "properties": {"email": {"type": "string"}}}
                }
            }),
            "Pet",
        );
        assert!(out.contains("class _PetOwner(TypedDict, total=False):"));
        assert!(out.contains("owner: \"_PetOwner\""));
        let nested = out.find("class _PetOwner").unwrap();
        let parent = out.find("class Pet(").unwrap();
        assert!(nested < parent);
    }

    #[test]
    fn test_definitions_reference_declared_once() {
        let out = generate(
            &json!({
                "type": "object",
                "properties": {
                    "a": {"$ref": "#/definitions/Tag"},
                    "b": {"type": "array", "items": {"$ref": "#/definitions/Tag"}}
                },
                "definitions": {"Tag": {"type": "object", "properties": {"label": {"type": "string"}}}}
            }),
            "Holder",
        );
        assert_eq!(out.matches("class Tag(").count(), 1);
        assert!(out.contains("b: List[\"Tag\"]"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let out = generate(
            &json!({
                "type": "object",
                "properties": {
                    "value": {"type": "integer"},
                    "children": {"type": "array", "items": {"$ref": "#"}}
                }
            }),
            "Node",
        );
        assert!(out.contains("children: List[\"Node\"]"));
    }

    #[test]
    fn test_recursive_definition_terminates() {
        let out = generate(
            &json!({
                "$ref": "#/definitions/Tree",
                "definitions": {
                    "Tree": {"type": "object", "properties": {"next": {"$ref": "#/definitions/Tree"}}}
                }
            }),
            "Tree",
        );
        assert!(out.contains("class Tree(TypedDict, total=False):"));
        assert!(out.contains("next: \"Tree\""));
        assert!(!out.contains("Tree = "));
    }

    #[test]
    fn test_dangling_ref_cannot_be_determined() {
        let err = TypedDictEngine::new()
            .generate(&json!({"$ref": "#/definitions/FinanceAccountListModel"}), "X")
            .unwrap_err();
        assert!(matches!(err, EngineError::CannotDetermineSpecification { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let mut schema = json!({"type": "string"});
        for _ in 0..10 {
            schema = json!({"type": "array", "items": schema});
        }
        let err = TypedDictEngine::with_max_depth(4)
            .generate(&schema, "Deep")
            .unwrap_err();
        assert!(matches!(err, EngineError::RecursionLimit { .. }));
        assert!(err.to_string().contains("> 4"));
    }

    #[test]
    fn test_enum_and_nullable_union() {
        let out = generate(
            &json!({"type": "object", "properties": {
                "status": {"enum": ["open", "closed", null]},
                "score": {"type": ["number", "null"]}
            }}),
            "Ticket",
        );
        assert!(out.contains("status: Union[Literal[\"open\", \"closed\"], None]"));
        assert!(out.contains("score: Union[float, None]"));
    }

    #[test]
    fn test_non_identifier_properties_use_functional_syntax() {
        let out = generate(
            &json!({"type": "object", "properties": {
                "first-name": {"type": "string"},
                "class": {"type": "integer"}
            }, "required": ["class"]}),
            "Person",
        );
        assert!(out.contains("Person = TypedDict(\"Person\", {"));
        assert!(out.contains("    \"first-name\": str,"));
        assert!(out.contains("    \"class\": Required[int],"));
        assert!(out.contains("}, total=False)"));
    }

    #[test]
    fn test_non_object_root_is_alias() {
        let out = generate(&json!({"type": "array", "items": {"type": "string"}}), "Names");
        assert!(out.contains("Names = List[str]"));
    }

    #[test]
    fn test_free_form_object_root() {
        let out = generate(&json!({"type": "object", "additionalProperties": {"type": "integer"}}), "Counts");
        assert!(out.contains("Counts = Dict[str, int]"));
    }

    #[test]
    fn test_multi_member_all_of_merges_properties() {
        let out = generate(
            &json!({"allOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]},
                {"type": "object", "properties": {"b": {"type": "integer"}}}
            ]}),
            "Both",
        );
        assert!(out.contains("a: Required[str]"));
        assert!(out.contains("b: int"));
    }
}
