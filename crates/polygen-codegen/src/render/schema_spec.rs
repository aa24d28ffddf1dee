//! Schema spec renderer.
//!
//! Schema specs are declared directly in the `schemas/` aggregators. There
//! is no companion module: the declarations are the spec.

use super::{SpecRenderer, function_leaf};
use crate::schema::root_name;
use polygen_core::{NamespacePath, Result, SchemaSpecDto, Section, SpecificationDto};
use serde_json::{Value, json};

const SHAPE_KEYS: &[&str] = &["type", "$ref", "anyOf", "oneOf", "allOf", "enum"];

pub(super) fn render(
    renderer: &SpecRenderer,
    spec: &SpecificationDto,
) -> Result<crate::RenderedSpec> {
    let schema = SchemaSpecDto::try_from(spec)?;
    let leaf = function_leaf(&schema.name);
    let path = NamespacePath::new(Section::Schemas, &schema.context, &leaf)?;

    let mut definition = match schema.definition {
        Value::Object(map) => Value::Object(map),
        _ => json!({}),
    };
    if let Value::Object(map) = &mut definition
        && !SHAPE_KEYS.iter().any(|key| map.contains_key(*key))
    {
        map.insert("type".to_string(), json!("object"));
    }

    let resolved = renderer.mapper().schemas().render(&definition, &leaf, "Dict");
    let source = if resolved.has_definition() {
        resolved.definition
    } else {
        let root = root_name(&definition, &leaf, "Dict");
        tracing::warn!(
            spec = %spec.qualified_name(),
            root = %root,
            "Schema spec degraded to a permissive alias"
        );
        format!("{root} = Dict[str, Any]\n")
    };

    Ok(crate::RenderedSpec {
        path,
        source,
        type_defs: String::new(),
    })
}
