//! Spec renderers.
//!
//! [`SpecRenderer`] dispatches a spec to the renderer of its category and
//! returns a [`RenderedSpec`]: the declaration appended to the parent
//! aggregator plus the companion type module. Each function category has
//! its own module; variables, schema specs and tables follow.

mod api;
mod auth;
mod client;
mod package;
mod schema_spec;
mod server;
mod table;
mod variable;
mod webhook;

pub use server::server_return_action;

use crate::arguments::DefinitionSet;
use crate::escape;
use crate::python::{rewrite_reserved, sanitize_identifier};
use crate::schema::SchemaRenderer;
use crate::template_engine::TemplateEngine;
use crate::type_mapper::TypeMapper;
use crate::types::{GeneratedFile, RenderedSpec};
use polygen_core::{
    Error, FunctionSpecification, NamespacePath, Result, Section, SpecType, SpecificationDto,
};
use serde::Serialize;

/// Source of one rendered function before it is placed in the tree.
#[derive(Debug, Default)]
struct FunctionBody {
    source: String,
    definitions: DefinitionSet,
}

impl FunctionBody {
    fn new(source: String, definitions: DefinitionSet) -> Self {
        Self {
            source,
            definitions,
        }
    }
}

/// Docstring fields shared by every template.
#[derive(Debug, Serialize)]
struct DocFields {
    description: String,
    id_doc: String,
    id_literal: String,
}

impl DocFields {
    fn new(description: &str, id: &str) -> Self {
        Self {
            description: escape::indent_continuation(&escape::docstring(description.trim()), "    "),
            id_doc: escape::docstring(id),
            id_literal: escape::string_literal(id),
        }
    }

    fn of(spec: &SpecificationDto) -> Self {
        Self::new(&spec.description, spec.id.as_str())
    }
}

/// Renders specs into Python source.
///
/// # Examples
///
/// ```
/// use polygen_codegen::{SchemaRenderer, SpecRenderer};
/// use polygen_core::Section;
///
/// let renderer = SpecRenderer::new("polyapi", SchemaRenderer::builtin()).unwrap();
/// let preamble = renderer.preamble(Section::Functions).unwrap();
/// assert!(preamble.contains("from polyapi.runtime import execute"));
/// ```
#[derive(Debug)]
pub struct SpecRenderer {
    templates: TemplateEngine<'static>,
    mapper: TypeMapper,
    package: String,
}

impl SpecRenderer {
    /// Creates a renderer for the Python package named `package`.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in templates fail to register.
    pub fn new(package: impl Into<String>, schemas: SchemaRenderer) -> Result<Self> {
        Ok(Self {
            templates: TemplateEngine::new()?,
            mapper: TypeMapper::new(schemas),
            package: package.into(),
        })
    }

    /// Python package name the generated code imports its runtime from.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The type mapper shared by every renderer.
    #[must_use]
    pub fn mapper(&self) -> &TypeMapper {
        &self.mapper
    }

    /// Renders one spec.
    ///
    /// An empty [`RenderedSpec::source`] means the spec has nothing to emit
    /// (an auxiliary auth entry, or a webhook whose rendering failed).
    ///
    /// # Errors
    ///
    /// Returns [`Error::RenderError`] when a template fails and
    /// [`Error::ValidationError`] for a spec whose name cannot form a path.
    pub fn render(&self, spec: &SpecificationDto) -> Result<RenderedSpec> {
        tracing::debug!(spec = %spec.qualified_name(), kind = %spec.spec_type, "Rendering spec");
        self.render_inner(spec).map_err(|err| match err {
            Error::SerializationError { message, source } => Error::RenderError {
                spec: spec.qualified_name(),
                message,
                source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
            },
            other => other,
        })
    }

    fn render_inner(&self, spec: &SpecificationDto) -> Result<RenderedSpec> {
        match spec.spec_type {
            SpecType::ServerVariable => variable::render(self, spec),
            SpecType::Schema => schema_spec::render(self, spec),
            SpecType::Table => table::render(self, spec),
            _ => {
                let leaf = function_leaf(&spec.name);
                let path = NamespacePath::new(Section::Functions, &spec.context, &leaf)?;
                let body = self.render_function(spec, &leaf)?;
                Ok(RenderedSpec {
                    path,
                    source: body.source,
                    type_defs: self.type_module(&body.definitions)?,
                })
            }
        }
    }

    fn render_function(&self, spec: &SpecificationDto, leaf: &str) -> Result<FunctionBody> {
        let fallback = FunctionSpecification::default();
        let function = spec.function.as_ref().unwrap_or(&fallback);
        match spec.spec_type {
            SpecType::ApiFunction => api::render(self, spec, leaf, function),
            SpecType::ServerFunction => server::render(self, spec, leaf, function),
            SpecType::CustomFunction => client::render(self, spec, leaf, function),
            SpecType::AuthFunction => auth::render(self, spec),
            SpecType::WebhookHandle => Ok(webhook::render(self, spec, leaf)),
            other => Err(Error::InvalidArgument(format!(
                "{} is a {other}, not a function",
                spec.qualified_name()
            ))),
        }
    }

    /// Aggregator preamble for a section directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails.
    pub fn preamble(&self, section: Section) -> Result<String> {
        package::preamble(self, section)
    }

    /// Package root files: `__init__.py` and `runtime.py`.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails.
    pub fn package_files(&self, default_base_url: &str) -> Result<Vec<GeneratedFile>> {
        package::root_files(self, default_base_url)
    }

    /// Renders a companion type module, empty when there is nothing to declare.
    fn type_module(&self, definitions: &DefinitionSet) -> Result<String> {
        #[derive(Serialize)]
        struct TypeModuleContext {
            imports: String,
            body: String,
        }

        if definitions.is_empty() {
            return Ok(String::new());
        }
        self.templates.render(
            "functions/type_module",
            &TypeModuleContext {
                imports: definitions.imports(),
                body: definitions.body(),
            },
        )
    }

    fn templates(&self) -> &TemplateEngine<'static> {
        &self.templates
    }
}

/// Python name of a function or class leaf.
///
/// # Examples
///
/// ```
/// use polygen_codegen::render::function_leaf;
///
/// assert_eq!(function_leaf("getPet"), "getPet");
/// assert_eq!(function_leaf("import"), "_import");
/// assert_eq!(function_leaf("send sms"), "send_sms");
/// ```
#[must_use]
pub fn function_leaf(name: &str) -> String {
    rewrite_reserved(&sanitize_identifier(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer() -> SpecRenderer {
        SpecRenderer::new("polyapi", SchemaRenderer::builtin()).unwrap()
    }

    fn spec(value: serde_json::Value) -> SpecificationDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_function_path_uses_context() {
        let rendered = renderer()
            .render(&spec(json!({
                "id": "1", "context": "billing.invoices", "name": "create", "type": "serverFunction",
                "function": {"arguments": [], "returnType": {"kind": "void"}}
            })))
            .unwrap();
        assert_eq!(rendered.path.to_string(), "poly.billing.invoices.create");
    }

    #[test]
    fn test_missing_function_signature_renders_defaults() {
        let rendered = renderer()
            .render(&spec(json!({
                "id": "1", "context": "", "name": "ping", "type": "serverFunction"
            })))
            .unwrap();
        assert!(rendered.source.contains("def ping(\n\n) -> Any:"));
    }

    #[test]
    fn test_description_quotes_are_escaped() {
        let rendered = renderer()
            .render(&spec(json!({
                "id": "1", "context": "", "name": "ping", "type": "serverFunction",
                "description": "Say \"\"\"hi\"\"\"",
                "function": {"arguments": [], "returnType": {"kind": "void"}}
            })))
            .unwrap();
        assert!(rendered.source.contains("Say '''hi'''"));
    }

    #[test]
    fn test_type_module_is_empty_without_definitions() {
        let rendered = renderer()
            .render(&spec(json!({
                "id": "1", "context": "", "name": "ping", "type": "serverFunction",
                "function": {"arguments": [], "returnType": {"kind": "primitive", "type": "string"}}
            })))
            .unwrap();
        assert!(rendered.type_defs.is_empty());
        assert!(!rendered.has_type_defs());
    }

    #[test]
    fn test_invalid_name_is_a_validation_error() {
        let err = renderer()
            .render(&spec(json!({
                "id": "1", "context": "a/b", "name": "x", "type": "apiFunction"
            })))
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError { .. }));
    }
}
