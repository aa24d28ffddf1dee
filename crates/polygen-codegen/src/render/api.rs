//! API function renderer.
//!
//! API functions return a `{leaf}Response` envelope (`status`, `headers`,
//! `data`) declared in the companion type module next to the return type.

use super::{DocFields, FunctionBody, SpecRenderer};
use crate::arguments::ArgumentRenderer;
use crate::python::qualify_type;
use polygen_core::{FunctionSpecification, Result, SpecificationDto};
use serde::Serialize;

#[derive(Serialize)]
struct ApiContext<'a> {
    name: &'a str,
    parameters: String,
    response_type: String,
    payload: String,
    #[serde(flatten)]
    doc: DocFields,
}

#[derive(Serialize)]
struct EnvelopeContext<'a> {
    response_type: &'a str,
    data_type: &'a str,
}

pub(super) fn render(
    renderer: &SpecRenderer,
    spec: &SpecificationDto,
    leaf: &str,
    function: &FunctionSpecification,
) -> Result<FunctionBody> {
    let args = ArgumentRenderer::new(renderer.mapper()).render(leaf, &function.arguments);
    let returns = renderer.mapper().resolve(&function.return_type, "");

    let envelope_name = format!("{leaf}Response");
    let envelope = renderer.templates().render(
        "functions/api_response",
        &EnvelopeContext {
            response_type: &envelope_name,
            data_type: &returns.expr,
        },
    )?;

    let mut definitions = args.definitions;
    definitions.push(&returns.definition);
    definitions.push(&envelope);

    let source = renderer.templates().render(
        "functions/api",
        &ApiContext {
            name: leaf,
            parameters: args.parameters,
            response_type: qualify_type(leaf, &envelope_name),
            payload: args.payload,
            doc: DocFields::of(spec),
        },
    )?;

    Ok(FunctionBody::new(source, definitions))
}

#[cfg(test)]
mod tests {
    use crate::{SchemaRenderer, SpecRenderer};
    use polygen_core::SpecificationDto;
    use serde_json::json;

    fn render(value: serde_json::Value) -> crate::RenderedSpec {
        let spec: SpecificationDto = serde_json::from_value(value).unwrap();
        SpecRenderer::new("polyapi", SchemaRenderer::builtin())
            .unwrap()
            .render(&spec)
            .unwrap()
    }

    #[test]
    fn test_api_function_returns_qualified_envelope() {
        let rendered = render(json!({
            "id": "f7588018-2364-4586-b60d-b08a285f1ef3",
            "context": "shipping",
            "name": "getRates",
            "type": "apiFunction",
            "description": "Get shipping rates",
            "function": {
                "arguments": [{"name": "zip", "type": {"kind": "primitive", "type": "string"}}],
                "returnType": {"kind": "void"}
            }
        }));
        assert!(rendered.source.contains("def getRates(\n    zip: str,\n) -> _getRates.getRatesResponse:"));
        assert!(rendered.source.contains(
            "execute(\"api\", \"f7588018-2364-4586-b60d-b08a285f1ef3\", {'zip': zip})"
        ));
        assert!(rendered.source.contains("Function ID: f7588018-2364-4586-b60d-b08a285f1ef3"));
        assert!(rendered.type_defs.contains("class getRatesResponse(TypedDict):"));
        assert!(rendered.type_defs.contains("    data: None"));
    }

    #[test]
    fn test_api_return_schema_lands_in_type_module() {
        let rendered = render(json!({
            "id": "1",
            "context": "shop",
            "name": "getPet",
            "type": "apiFunction",
            "function": {
                "arguments": [],
                "returnType": {"kind": "object", "schema": {
                    "title": "Pet",
                    "type": "object",
                    "properties": {"id": {"type": "integer"}}
                }}
            }
        }));
        assert!(rendered.type_defs.contains("class Pet(TypedDict, total=False):"));
        assert!(rendered.type_defs.contains("    data: Pet"));
        assert_eq!(rendered.type_defs.matches("class Pet(").count(), 1);
    }
}
