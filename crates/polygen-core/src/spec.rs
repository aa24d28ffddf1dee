//! Spec data model.
//!
//! These types mirror the JSON returned by the spec source. `PropertyType`
//! is a closed enum tagged by `kind`; a spec carrying an unknown kind fails
//! to deserialize and is rejected individually by
//! [`SpecificationDto::parse_many`] instead of being rendered as invalid code.
//!
//! # Examples
//!
//! ```
//! use polygen_core::{PropertySpecification, PropertyType};
//!
//! let arg: PropertySpecification = serde_json::from_value(serde_json::json!({
//!     "name": "locationId",
//!     "required": true,
//!     "type": { "kind": "primitive", "type": "integer" }
//! })).unwrap();
//!
//! assert_eq!(arg.property_type, PropertyType::primitive("integer"));
//! ```

use crate::{Error, Result, SpecId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

const fn default_required() -> bool {
    true
}

fn default_primitive() -> String {
    "any".to_string()
}

/// One function argument or object property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpecification {
    /// Remote parameter name, sent on the wire unchanged.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Human readable description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Whether the caller must supply the argument.
    #[serde(default = "default_required")]
    pub required: bool,

    /// Whether `null` is an accepted value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    /// Declared type; absent types are treated as `any`.
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub property_type: PropertyType,
}

impl PropertySpecification {
    /// Creates a required property with no description.
    #[must_use]
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: true,
            nullable: None,
            property_type,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the property optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Items of an array type: either a nested property type or a raw schema
/// fragment (typically a `$ref`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayItems {
    /// Nested property type with its own `kind`.
    Type(Box<PropertyType>),
    /// Raw JSON Schema fragment.
    Schema(Value),
}

/// Declarative type of a property, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PropertyType {
    /// No value.
    Void,

    /// JSON primitive named by `type` (`string`, `integer`, ...).
    Primitive {
        /// Primitive type name.
        #[serde(rename = "type", default = "default_primitive")]
        type_name: String,
    },

    /// List of `items`.
    Array {
        /// Element type, absent for untyped lists.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<ArrayItems>,
    },

    /// Structured object described by a JSON Schema.
    Object {
        /// JSON Schema of the object.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<Value>,
        /// Legacy property list used by some auth specs.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        properties: Option<Vec<PropertySpecification>>,
        /// Optional explicit type name.
        #[serde(
            default,
            rename = "typeName",
            skip_serializing_if = "Option::is_none"
        )]
        type_name: Option<String>,
    },

    /// Callable parameter with a nested signature.
    Function {
        /// Nested signature, absent for an untyped callable.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spec: Option<Box<FunctionSpecification>>,
    },

    /// Plain type name such as `string` or `number[]`.
    Plain {
        /// Type name.
        #[serde(default)]
        value: String,
    },

    /// Any value.
    #[default]
    Any,
}

impl PropertyType {
    /// Shorthand for a primitive type.
    #[must_use]
    pub fn primitive(type_name: impl Into<String>) -> Self {
        Self::Primitive {
            type_name: type_name.into(),
        }
    }

    /// Shorthand for an object type with a schema.
    #[must_use]
    pub const fn object(schema: Value) -> Self {
        Self::Object {
            schema: Some(schema),
            properties: None,
            type_name: None,
        }
    }

    /// Name of the `kind` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Primitive { .. } => "primitive",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Function { .. } => "function",
            Self::Plain { .. } => "plain",
            Self::Any => "any",
        }
    }
}

/// Signature of a function spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpecification {
    /// Ordered arguments.
    #[serde(default, deserialize_with = "null_as_default")]
    pub arguments: Vec<PropertySpecification>,

    /// Return type; absent means `any`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub return_type: PropertyType,

    /// Whether the function runs synchronously on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronous: Option<bool>,
}

/// Category of a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecType {
    /// Remote API call.
    ApiFunction,
    /// Client function whose code is embedded in the package.
    CustomFunction,
    /// Function executed on the server.
    ServerFunction,
    /// OAuth-style token flow.
    AuthFunction,
    /// Webhook event subscription.
    WebhookHandle,
    /// Server-side variable.
    ServerVariable,
    /// Standalone JSON Schema.
    Schema,
    /// Table with a row schema.
    Table,
}

impl SpecType {
    /// Wire name of the type, used as the `function_type` of execute calls.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApiFunction => "apiFunction",
            Self::CustomFunction => "customFunction",
            Self::ServerFunction => "serverFunction",
            Self::AuthFunction => "authFunction",
            Self::WebhookHandle => "webhookHandle",
            Self::ServerVariable => "serverVariable",
            Self::Schema => "schema",
            Self::Table => "table",
        }
    }

    /// Returns `true` for specs rendered into `poly/`.
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(
            self,
            Self::ApiFunction
                | Self::CustomFunction
                | Self::ServerFunction
                | Self::AuthFunction
                | Self::WebhookHandle
        )
    }
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variable payload of a `serverVariable` spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VariableSpecification {
    /// Secret variables cannot be read from the client.
    #[serde(default)]
    pub secret: bool,

    /// Declared type of the value.
    #[serde(default, deserialize_with = "null_as_default")]
    pub value_type: PropertyType,

    /// Current value, only present for non-secret variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// One unit of generation as returned by the spec source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationDto {
    /// Remote identifier.
    pub id: SpecId,

    /// Dotted context, possibly empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,

    /// Leaf name.
    pub name: String,

    /// Human readable description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Spec category.
    #[serde(rename = "type")]
    pub spec_type: SpecType,

    /// Signature, present for function specs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionSpecification>,

    /// Embedded source for client functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Source language of `code`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Variable payload for `serverVariable` specs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<VariableSpecification>,

    /// JSON Schema for `schema` specs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Value>,

    /// Row schema for `table` specs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    /// Dotted key used to reference schema specs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_name: Option<String>,
}

impl SpecificationDto {
    /// `context.name`, or just `name` at the top level.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.context.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.context, self.name)
        }
    }

    /// Deserializes each element independently.
    ///
    /// Elements that fail to parse (unknown `kind`, unknown spec type,
    /// missing id) are returned alongside a description of the failure so
    /// one malformed spec never rejects the whole list.
    #[must_use]
    pub fn parse_many(values: Vec<Value>) -> (Vec<Self>, Vec<String>) {
        let mut specs = Vec::with_capacity(values.len());
        let mut rejected = Vec::new();
        for value in values {
            let identity = describe(&value);
            match serde_json::from_value::<Self>(value) {
                Ok(spec) => specs.push(spec),
                Err(err) => {
                    tracing::warn!(spec = %identity, error = %err, "Rejecting malformed spec");
                    rejected.push(format!("{identity}: {err}"));
                }
            }
        }
        (specs, rejected)
    }
}

fn describe(value: &Value) -> String {
    let field = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or("?");
    format!("{}.{} ({})", field("context"), field("name"), field("id"))
}

/// A `schema` spec viewed as a reference target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpecDto {
    /// Remote identifier.
    pub id: SpecId,
    /// Dotted context.
    pub context: String,
    /// Leaf name.
    pub name: String,
    /// Key used by poly-refs.
    pub context_name: String,
    /// JSON Schema document.
    pub definition: Value,
}

impl TryFrom<&SpecificationDto> for SchemaSpecDto {
    type Error = Error;

    fn try_from(spec: &SpecificationDto) -> Result<Self> {
        if spec.spec_type != SpecType::Schema {
            return Err(Error::InvalidArgument(format!(
                "{} is a {}, not a schema",
                spec.qualified_name(),
                spec.spec_type
            )));
        }
        Ok(Self {
            id: spec.id.clone(),
            context: spec.context.clone(),
            name: spec.name.clone(),
            context_name: spec
                .context_name
                .clone()
                .unwrap_or_else(|| spec.qualified_name()),
            definition: spec.definition.clone().unwrap_or(Value::Null),
        })
    }
}

/// A `serverVariable` spec.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpecDto {
    /// Remote identifier.
    pub id: SpecId,
    /// Dotted context.
    pub context: String,
    /// Leaf name.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Variable payload.
    pub variable: VariableSpecification,
}

impl TryFrom<&SpecificationDto> for VariableSpecDto {
    type Error = Error;

    fn try_from(spec: &SpecificationDto) -> Result<Self> {
        if spec.spec_type != SpecType::ServerVariable {
            return Err(Error::InvalidArgument(format!(
                "{} is a {}, not a variable",
                spec.qualified_name(),
                spec.spec_type
            )));
        }
        Ok(Self {
            id: spec.id.clone(),
            context: spec.context.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            variable: spec.variable.clone().unwrap_or_default(),
        })
    }
}

/// A `table` spec.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpecDto {
    /// Remote identifier.
    pub id: SpecId,
    /// Dotted context.
    pub context: String,
    /// Leaf name.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Row schema, an object schema with `properties`.
    pub schema: Value,
}

impl TryFrom<&SpecificationDto> for TableSpecDto {
    type Error = Error;

    fn try_from(spec: &SpecificationDto) -> Result<Self> {
        if spec.spec_type != SpecType::Table {
            return Err(Error::InvalidArgument(format!(
                "{} is a {}, not a table",
                spec.qualified_name(),
                spec.spec_type
            )));
        }
        let schema = spec.schema.clone().ok_or_else(|| Error::ValidationError {
            field: "schema".to_string(),
            reason: format!("table {} has no row schema", spec.qualified_name()),
        })?;
        Ok(Self {
            id: spec.id.clone(),
            context: spec.context.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            schema,
        })
    }
}
