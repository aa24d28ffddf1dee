//! Deserialization of realistic spec payloads.

use polygen_core::{
    ArrayItems, PropertyType, SpecType, SpecificationDto, TableSpecDto, VariableSpecDto,
};
use serde_json::json;

const fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_public_types_are_send_sync() {
    assert_send_sync::<polygen_core::Error>();
    assert_send_sync::<SpecificationDto>();
    assert_send_sync::<polygen_core::NamespacePath>();
    assert_send_sync::<polygen_core::ConfigContext>();
}

#[test]
fn test_auth_spec_with_legacy_object_properties() {
    let spec: SpecificationDto = serde_json::from_value(json!({
        "type": "authFunction",
        "id": "dummyid",
        "context": "auth0.authCodeFlow",
        "name": "getToken",
        "description": "Obtains a token.",
        "function": {
            "arguments": [
                {"name": "clientId", "required": true, "type": {"kind": "primitive", "type": "string"}},
                {"name": "scopes", "required": true,
                 "type": {"kind": "array", "items": {"kind": "primitive", "type": "string"}}},
                {"name": "callback", "required": true, "type": {
                    "kind": "function",
                    "name": "AuthFunctionCallback",
                    "spec": {
                        "arguments": [
                            {"name": "token", "required": false, "nullable": true,
                             "type": {"kind": "primitive", "type": "string"}}
                        ],
                        "returnType": {"kind": "void"},
                        "synchronous": true
                    }
                }},
                {"name": "options", "required": false, "type": {
                    "kind": "object",
                    "properties": [
                        {"name": "timeout", "required": false, "type": {"kind": "primitive", "type": "number"}}
                    ]
                }}
            ],
            "returnType": {"kind": "object", "properties": []},
            "synchronous": true
        },
        "visibilityMetadata": {"visibility": "ENVIRONMENT"}
    }))
    .unwrap();

    assert_eq!(spec.spec_type, SpecType::AuthFunction);
    assert_eq!(spec.qualified_name(), "auth0.authCodeFlow.getToken");
    let function = spec.function.unwrap();
    assert_eq!(function.arguments.len(), 4);
    assert!(!function.arguments[3].required);
    assert_eq!(function.arguments[2].property_type.kind(), "function");
    match &function.arguments[1].property_type {
        PropertyType::Array {
            items: Some(ArrayItems::Type(inner)),
        } => assert_eq!(**inner, PropertyType::primitive("string")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_variable_and_table_views() {
    let variable: SpecificationDto = serde_json::from_value(json!({
        "type": "serverVariable",
        "id": "181238j18231j",
        "name": "test",
        "context": "my3",
        "description": "a test variable",
        "variable": {
            "environmentId": "123818231",
            "secret": false,
            "valueType": {"kind": "primitive", "type": "string"},
            "value": "some mock value"
        }
    }))
    .unwrap();
    let variable = VariableSpecDto::try_from(&variable).unwrap();
    assert!(!variable.variable.secret);
    assert_eq!(variable.variable.value_type, PropertyType::primitive("string"));

    let table: SpecificationDto = serde_json::from_value(json!({
        "type": "table",
        "id": "123456789",
        "name": "MyTable",
        "context": "some.context.here",
        "contextName": "some.context.here.MyTable",
        "description": "stores users",
        "schema": {"type": "object", "properties": {"id": {"type": "string"}}}
    }))
    .unwrap();
    let table = TableSpecDto::try_from(&table).unwrap();
    assert_eq!(table.schema["properties"]["id"]["type"], "string");
}

#[test]
fn test_spec_roundtrips_through_json() {
    let original = json!({
        "id": "8f7d24b0-4a29-40c0-9091",
        "type": "serverFunction",
        "context": "test",
        "name": "getProductsCount",
        "description": "Count products.",
        "function": {
            "arguments": [{
                "name": "products",
                "description": "",
                "required": false,
                "type": {"kind": "array", "items": {"kind": "primitive", "type": "string"}}
            }],
            "returnType": {"kind": "plain", "value": "number"},
            "synchronous": true
        },
        "code": "",
        "language": "javascript"
    });
    let spec: SpecificationDto = serde_json::from_value(original).unwrap();
    let again: SpecificationDto =
        serde_json::from_value(serde_json::to_value(&spec).unwrap()).unwrap();
    assert_eq!(spec, again);
}
