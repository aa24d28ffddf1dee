//! Server variable renderer.
//!
//! Each variable becomes a class in `vari/` with `get`, `update` and
//! `inject` static methods. Secret variables refuse `get` at runtime.

use super::{DocFields, SpecRenderer, function_leaf};
use crate::arguments::DefinitionSet;
use crate::python::qualify_type;
use polygen_core::{NamespacePath, Result, Section, SpecificationDto, VariableSpecDto};
use serde::Serialize;

#[derive(Serialize)]
struct VariableContext<'a> {
    name: &'a str,
    value_type: String,
    secret: &'static str,
    get_action: &'static str,
    #[serde(flatten)]
    doc: DocFields,
}

pub(super) fn render(
    renderer: &SpecRenderer,
    spec: &SpecificationDto,
) -> Result<crate::RenderedSpec> {
    let variable = VariableSpecDto::try_from(spec)?;
    let leaf = function_leaf(&variable.name);
    let path = NamespacePath::new(Section::Variables, &variable.context, &leaf)?;

    let resolved = renderer
        .mapper()
        .resolve(&variable.variable.value_type, &variable.name);
    let get_action = if resolved.expr == "str" {
        "resp.text"
    } else {
        "resp.json()"
    };

    let source = renderer.templates().render(
        "sections/variable",
        &VariableContext {
            name: &leaf,
            value_type: qualify_type(&leaf, &resolved.expr),
            secret: if variable.variable.secret { "True" } else { "False" },
            get_action,
            doc: DocFields::new(&variable.description, variable.id.as_str()),
        },
    )?;

    let mut definitions = DefinitionSet::default();
    definitions.push(&resolved.definition);

    Ok(crate::RenderedSpec {
        path,
        source,
        type_defs: renderer.type_module(&definitions)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::{SchemaRenderer, SpecRenderer};
    use polygen_core::SpecificationDto;
    use serde_json::json;

    fn render(variable: serde_json::Value) -> crate::RenderedSpec {
        let spec: SpecificationDto = serde_json::from_value(json!({
            "id": "var-1",
            "context": "shared.secrets",
            "name": "apiToken",
            "type": "serverVariable",
            "variable": variable
        }))
        .unwrap();
        SpecRenderer::new("polyapi", SchemaRenderer::builtin())
            .unwrap()
            .render(&spec)
            .unwrap()
    }

    #[test]
    fn test_string_variable() {
        let rendered = render(json!({
            "secret": false,
            "valueType": {"kind": "primitive", "type": "string"},
            "value": "abc"
        }));
        assert_eq!(rendered.path.to_string(), "vari.shared.secrets.apiToken");
        assert!(rendered.source.contains("class apiToken:"));
        assert!(rendered.source.contains("def get() -> str:"));
        assert!(rendered.source.contains("if False:"));
        assert!(rendered.source.contains("return resp.text"));
        assert!(rendered.source.contains("variable_get(\"var-1\")"));
        assert!(rendered.source.contains("\"type\": \"PolyVariable\""));
    }

    #[test]
    fn test_secret_variable_refuses_get() {
        let rendered = render(json!({
            "secret": true,
            "valueType": {"kind": "primitive", "type": "integer"}
        }));
        assert!(rendered.source.contains("if True:"));
        assert!(rendered.source.contains("return resp.json()"));
    }

    #[test]
    fn test_object_variable_declares_type_module() {
        let rendered = render(json!({
            "valueType": {"kind": "object", "schema": {
                "title": "Credentials",
                "type": "object",
                "properties": {"user": {"type": "string"}}
            }}
        }));
        assert!(rendered.source.contains("def get() -> _apiToken.Credentials:"));
        assert!(rendered.type_defs.contains("class Credentials(TypedDict, total=False):"));
    }
}
