//! Type Mapper: `PropertyType` to a Python type expression.
//!
//! Primitive kinds map through a fixed table. Structured object and array
//! types are delegated to the [`SchemaRenderer`], which never fails, so
//! resolution is total as well: unknown primitive names degrade to `Any`
//! and failed schemas degrade to `Dict`/`List` fallbacks.
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::{SchemaRenderer, TypeMapper};
//! use polygen_core::PropertyType;
//!
//! let mapper = TypeMapper::new(SchemaRenderer::builtin());
//! let resolved = mapper.resolve(&PropertyType::primitive("integer"), "");
//! assert_eq!(resolved.expr, "int");
//! assert!(resolved.definition.is_empty());
//! ```

use crate::python::{self, clean_title, is_basic_type, is_primitive, map_primitive_type};
use crate::schema::SchemaRenderer;
use crate::types::TypeResolution;
use polygen_core::{ArrayItems, FunctionSpecification, PropertyType};
use serde_json::{Map, Value, json};

/// Maps property types to type expressions and definitions.
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    schemas: SchemaRenderer,
}

impl TypeMapper {
    /// Creates a mapper delegating structured types to `schemas`.
    #[must_use]
    pub fn new(schemas: SchemaRenderer) -> Self {
        Self { schemas }
    }

    /// The schema renderer used for structured types.
    #[must_use]
    pub fn schemas(&self) -> &SchemaRenderer {
        &self.schemas
    }

    /// Resolves `ty` to a type expression plus definitions.
    ///
    /// `title_fallback` names an object schema that has neither `title` nor
    /// `name`, and roots an untitled array schema.
    #[must_use]
    pub fn resolve(&self, ty: &PropertyType, title_fallback: &str) -> TypeResolution {
        match ty {
            PropertyType::Void => TypeResolution::simple("None"),
            PropertyType::Any => TypeResolution::simple("Any"),
            PropertyType::Primitive { type_name } => {
                TypeResolution::simple(map_primitive_type(type_name))
            }
            PropertyType::Plain { value } => match value.strip_suffix("[]") {
                Some(item) => TypeResolution::simple(format!("List[{}]", map_primitive_type(item))),
                None => TypeResolution::simple(map_primitive_type(value)),
            },
            PropertyType::Array { items } => self.resolve_array(items.as_ref(), title_fallback),
            PropertyType::Object { schema, .. } => match schema {
                Some(schema) => self.resolve_object(schema, title_fallback),
                None => TypeResolution::simple("Dict"),
            },
            PropertyType::Function { spec } => match spec {
                Some(spec) => self.resolve_callable(spec),
                None => TypeResolution::simple("Callable"),
            },
        }
    }

    fn resolve_array(&self, items: Option<&ArrayItems>, title_fallback: &str) -> TypeResolution {
        match items {
            None => TypeResolution::simple("List"),
            Some(ArrayItems::Type(inner)) => {
                let item = self.resolve(inner, "");
                TypeResolution::new(clean_title(&format!("List[{}]", item.expr)), item.definition)
            }
            Some(ArrayItems::Schema(schema)) => {
                if let Some(Value::String(ty)) = schema.get("type")
                    && is_primitive(ty)
                    && ty != "object"
                    && ty != "array"
                {
                    return TypeResolution::simple(format!("List[{}]", map_primitive_type(ty)));
                }
                let root = if title_fallback.trim().is_empty() {
                    "ResponseType"
                } else {
                    title_fallback
                };
                self.schemas
                    .render(&json!({"type": "array", "items": schema}), root, "List[Dict]")
            }
        }
    }

    fn resolve_object(&self, schema: &Value, title_fallback: &str) -> TypeResolution {
        let title = schema_title(schema).unwrap_or(title_fallback);
        let schema_type = schema.get("type");

        if !title.is_empty() && schema_type.is_some_and(|t| t == "array") {
            return self.schemas.render(schema, title, "List");
        }
        if title == "ReturnType"
            && let Some(Value::String(ty)) = schema_type
        {
            return TypeResolution::simple(map_primitive_type(ty));
        }
        if !title.is_empty() {
            return self.schemas.render(schema, title, "Dict");
        }
        if let Some(Value::Array(members)) = schema.get("allOf")
            && let [only] = members.as_slice()
        {
            let title = schema_title(only).unwrap_or(title_fallback);
            return self.schemas.render(only, title, "Dict");
        }
        if let Some(items) = schema.get("items").filter(|i| i.is_object()) {
            return self.resolve_titled_items(schema, items, title_fallback);
        }
        if schema
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| !p.is_empty())
        {
            return self.schemas.render(schema, "ResponseType", "Dict");
        }
        TypeResolution::simple("Dict")
    }

    /// `List[<item>]` for an untitled array schema, the item named after its
    /// own title or the trailing segment of its `$ref`.
    fn resolve_titled_items(
        &self,
        schema: &Value,
        items: &Value,
        title_fallback: &str,
    ) -> TypeResolution {
        let title = items
            .get("title")
            .and_then(Value::as_str)
            .or_else(|| items.get("$ref").and_then(Value::as_str))
            .unwrap_or(title_fallback);
        let title = title.rsplit('/').next().unwrap_or_default();
        if title.is_empty() {
            return TypeResolution::simple("List");
        }

        let mut item_schema = items.clone();
        if let Some(target) = item_schema.as_object_mut() {
            carry_definitions(schema, target);
        }
        let item = self.schemas.render(&item_schema, title, "Dict");
        if item.has_definition() {
            TypeResolution::new(format!("List[{}]", item.expr), item.definition)
        } else {
            TypeResolution::simple("List[Dict]")
        }
    }

    fn resolve_callable(&self, spec: &FunctionSpecification) -> TypeResolution {
        let returns = self.resolve(&spec.return_type, "");
        let return_expr = if is_basic_type(&returns.expr) {
            returns.expr
        } else {
            "Any".to_string()
        };

        let mut arg_exprs = Vec::with_capacity(spec.arguments.len());
        let mut definitions = Vec::new();
        for argument in &spec.arguments {
            let resolved = self.resolve(&argument.property_type, "");
            if resolved.has_definition() {
                definitions.push(resolved.definition);
            }
            arg_exprs.push(resolved.expr);
        }

        TypeResolution::new(
            format!("Callable[[{}], {return_expr}]", arg_exprs.join(", ")),
            definitions.join("\n"),
        )
    }
}

fn schema_title(schema: &Value) -> Option<&str> {
    schema
        .get("title")
        .or_else(|| schema.get("name"))
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
}

fn carry_definitions(parent: &Value, target: &mut Map<String, Value>) {
    for key in ["definitions", "$defs"] {
        if let Some(defs) = parent.get(key)
            && !target.contains_key(key)
        {
            target.insert(key.to_string(), defs.clone());
        }
    }
}

/// Sets `title` on an untitled object schema, used to give argument schemas
/// a name derived from the argument.
///
/// # Examples
///
/// ```
/// use polygen_codegen::type_mapper::with_fallback_title;
/// use polygen_core::PropertyType;
/// use serde_json::json;
///
/// let ty = with_fallback_title(&PropertyType::object(json!({"type": "object"})), "shipping address");
/// let PropertyType::Object { schema: Some(schema), .. } = ty else { unreachable!() };
/// assert_eq!(schema["title"], "Shipping Address");
/// ```
#[must_use]
pub fn with_fallback_title(ty: &PropertyType, argument_name: &str) -> PropertyType {
    let mut ty = ty.clone();
    if let PropertyType::Object {
        schema: Some(Value::Object(schema)),
        ..
    } = &mut ty
        && !argument_name.is_empty()
        && !schema.contains_key("title")
        && !schema.contains_key("name")
    {
        schema.insert(
            "title".to_string(),
            Value::String(python::python_title(argument_name)),
        );
    }
    ty
}
