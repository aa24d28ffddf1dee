//! Integration tests for the rendering pipeline.
//!
//! Drives `SpecRenderer`, `TypeMapper`, `SchemaRenderer` and `SchemaIndex`
//! through their public API with spec payloads shaped like the ones the
//! Poly service returns.

use polygen_codegen::{SchemaIndex, SchemaRenderer, SpecRenderer, TypeMapper, TypeResolution};
use polygen_core::{PropertyType, SpecificationDto};
use serde_json::{Value, json};

fn renderer() -> SpecRenderer {
    SpecRenderer::new("polyapi", SchemaRenderer::builtin()).unwrap()
}

fn spec(value: Value) -> SpecificationDto {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_primitive_kinds_map_to_fixed_types() {
    let mapper = TypeMapper::default();
    let cases = [
        ("integer", "int"),
        ("number", "float"),
        ("string", "str"),
        ("boolean", "bool"),
        ("array", "List"),
        ("object", "Dict"),
    ];
    for (primitive, expected) in cases {
        let resolved = mapper.resolve(&PropertyType::primitive(primitive), "");
        assert_eq!(resolved, TypeResolution::simple(expected), "{primitive}");
    }
}

#[test]
fn test_schema_rendering_is_total() {
    let schemas = SchemaRenderer::builtin();
    let hostile = [
        json!(null),
        json!("not a schema"),
        json!({"$ref": "#/definitions/Nowhere"}),
        json!({"allOf": [{"$ref": "http://example.com/remote.json"}, {"type": "object"}]}),
        json!({"type": "object", "properties": {"self": {"$ref": "#"}}}),
    ];
    for schema in hostile {
        let resolved = schemas.render(&schema, "Thing", "Dict");
        assert!(!resolved.expr.is_empty(), "{schema}");
    }
}

#[test]
fn test_title_round_trip() {
    let schemas = SchemaRenderer::builtin();
    let resolved = schemas.render(
        &json!({"title": "Order Line", "type": "object", "properties": {"sku": {"type": "string"}}}),
        "Order Line",
        "Dict",
    );
    assert_eq!(resolved.expr, "OrderLine");
    assert!(resolved.definition.contains("class OrderLine(TypedDict, total=False):"));

    let reserved = schemas.render(
        &json!({"title": "Dict", "type": "object", "properties": {"a": {"type": "string"}}}),
        "Dict",
        "Dict",
    );
    assert_eq!(reserved.expr, "Dict_");
}

#[test]
fn test_resolver_without_markers_is_pass_through() {
    let index = SchemaIndex::default();
    let tree = json!({
        "type": "object",
        "properties": {"tags": {"type": "array", "items": {"type": "string"}}},
        "required": ["tags"]
    });
    assert_eq!(index.resolve(&tree).unwrap(), tree);
}

#[test]
fn test_location_id_scenario() {
    let rendered = renderer()
        .render(&spec(json!({
            "id": "f1",
            "context": "weather",
            "name": "getForecast",
            "type": "serverFunction",
            "function": {
                "arguments": [{"name": "locationId", "type": {"kind": "primitive", "type": "integer"}}],
                "returnType": {"kind": "void"}
            }
        })))
        .unwrap();
    assert!(rendered.source.contains("    locationId: int,"));
    assert!(!rendered.has_type_defs());
}

#[test]
fn test_api_function_void_scenario() {
    let id = "f7588018-2364-4586-b60d-b08a285f1ef3";
    let rendered = renderer()
        .render(&spec(json!({
            "id": id,
            "context": "",
            "name": "sendMessage",
            "type": "apiFunction",
            "function": {"arguments": [], "returnType": {"kind": "void"}}
        })))
        .unwrap();
    assert!(rendered.source.contains(&format!("\"{id}\"")));
    assert!(rendered.source.contains("-> _sendMessage.sendMessageResponse:"));
    assert!(rendered.type_defs.contains("    data: None"));
}

#[test]
fn test_pet_return_type_scenario() {
    let rendered = renderer()
        .render(&spec(json!({
            "id": "p1",
            "context": "petstore",
            "name": "getPet",
            "type": "serverFunction",
            "function": {
                "arguments": [],
                "returnType": {"kind": "object", "schema": {
                    "title": "Pet",
                    "type": "object",
                    "properties": {"id": {"type": "integer"}, "name": {"type": "string"}},
                    "required": ["id", "name"]
                }}
            }
        })))
        .unwrap();
    assert!(rendered.source.contains(") -> _getPet.Pet:"));
    assert!(rendered.type_defs.contains("class Pet(TypedDict, total=False):"));
    assert!(rendered.type_defs.contains("id: Required[int]"));
    assert!(rendered.type_defs.contains("name: Required[str]"));
}

#[test]
fn test_return_type_shared_with_argument_is_declared_once() {
    let pet = json!({
        "title": "Pet",
        "type": "object",
        "properties": {"id": {"type": "integer"}}
    });
    let rendered = renderer()
        .render(&spec(json!({
            "id": "p2",
            "context": "petstore",
            "name": "updatePet",
            "type": "serverFunction",
            "function": {
                "arguments": [{"name": "pet", "type": {"kind": "object", "schema": pet}}],
                "returnType": {"kind": "object", "schema": pet}
            }
        })))
        .unwrap();
    assert!(rendered.source.contains("    pet: _updatePet.Pet,"));
    assert_eq!(rendered.type_defs.matches("class Pet(").count(), 1);
}

#[test]
fn test_untitled_object_argument_takes_argument_name() {
    let rendered = renderer()
        .render(&spec(json!({
            "id": "o1",
            "context": "crm",
            "name": "createLead",
            "type": "serverFunction",
            "function": {
                "arguments": [{"name": "lead info", "type": {"kind": "object", "schema": {
                    "type": "object",
                    "properties": {"email": {"type": "string"}}
                }}}],
                "returnType": {"kind": "void"}
            }
        })))
        .unwrap();
    assert!(rendered.source.contains("    leadInfo: _createLead.LeadInfo,"));
    assert!(rendered.type_defs.contains("class LeadInfo(TypedDict, total=False):"));
}

#[test]
fn test_resolved_poly_ref_renders_referenced_schema() {
    let specs = vec![
        spec(json!({
            "id": "s1",
            "context": "shop",
            "name": "Owner",
            "type": "schema",
            "contextName": "shop.Owner",
            "definition": {"type": "object", "properties": {"name": {"type": "string"}}}
        })),
        spec(json!({
            "id": "f1",
            "context": "shop",
            "name": "getOwner",
            "type": "serverFunction",
            "function": {
                "arguments": [],
                "returnType": {"kind": "object", "schema": {"title": "Owner", "x-poly-ref": {"path": "shop.Owner"}}}
            }
        })),
    ];
    let index = SchemaIndex::from_specs(&specs);
    let outcome = index.apply(specs);
    assert_eq!(outcome.dropped_count(), 0);

    let function = outcome
        .items
        .iter()
        .find(|s| s.name == "getOwner")
        .unwrap();
    let rendered = renderer().render(function).unwrap();
    assert!(rendered.type_defs.contains("name: str"));
}

#[test]
fn test_malformed_example_is_stripped() {
    let cleaned = polygen_codegen::schema::clean_malformed_examples(
        "class Item(TypedDict):\n    # example: {\n\"sku\": \"A-1\",\n\"qty\": 2\n}\n    sku: str\n",
    );
    assert!(!cleaned.contains("example"));
    assert!(!cleaned.contains("qty"));
    assert!(cleaned.contains("    sku: str"));
}
