//! Template engine for Python generation using Handlebars.
//!
//! Wraps Handlebars in strict mode with HTML escaping disabled. Values are
//! escaped for Python by [`crate::escape`] before they reach a template.
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::template_engine::TemplateEngine;
//! use serde_json::json;
//!
//! let engine = TemplateEngine::new().unwrap();
//! let preamble = engine
//!     .render("package/schemas_preamble", &json!({"package": "polyapi"}))
//!     .unwrap();
//! assert!(preamble.contains("TypedDict"));
//! ```

use handlebars::Handlebars;
use polygen_core::{Error, Result};
use serde::Serialize;

/// Built-in templates, registered by name at construction.
const TEMPLATES: &[(&str, &str)] = &[
    (
        "functions/api",
        include_str!("../templates/functions/api.py.hbs"),
    ),
    (
        "functions/api_response",
        include_str!("../templates/functions/api_response.py.hbs"),
    ),
    (
        "functions/server",
        include_str!("../templates/functions/server.py.hbs"),
    ),
    (
        "functions/client",
        include_str!("../templates/functions/client.py.hbs"),
    ),
    (
        "functions/webhook",
        include_str!("../templates/functions/webhook.py.hbs"),
    ),
    (
        "functions/auth_get_token",
        include_str!("../templates/functions/auth_get_token.py.hbs"),
    ),
    (
        "functions/auth_refresh_token",
        include_str!("../templates/functions/auth_refresh_token.py.hbs"),
    ),
    (
        "functions/auth_revoke_token",
        include_str!("../templates/functions/auth_revoke_token.py.hbs"),
    ),
    (
        "functions/type_module",
        include_str!("../templates/functions/type_module.py.hbs"),
    ),
    (
        "sections/variable",
        include_str!("../templates/sections/variable.py.hbs"),
    ),
    (
        "sections/table",
        include_str!("../templates/sections/table.py.hbs"),
    ),
    (
        "package/init",
        include_str!("../templates/package/init.py.hbs"),
    ),
    (
        "package/runtime",
        include_str!("../templates/package/runtime.py.hbs"),
    ),
    (
        "package/code_preamble",
        include_str!("../templates/package/code_preamble.py.hbs"),
    ),
    (
        "package/schemas_preamble",
        include_str!("../templates/package/schemas_preamble.py.hbs"),
    ),
    (
        "package/tables_preamble",
        include_str!("../templates/package/tables_preamble.py.hbs"),
    ),
];

/// Template engine for Python code generation.
///
/// # Thread Safety
///
/// This type is `Send` and `Sync`, allowing it to be used across
/// thread boundaries safely.
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> TemplateEngine<'a> {
    /// Creates a new template engine with every built-in template registered.
    ///
    /// # Errors
    ///
    /// Returns error if template registration fails (should not happen
    /// with valid built-in templates).
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Strict mode: fail on missing variables
        handlebars.set_strict_mode(true);
        // Output is Python, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        for (name, source) in TEMPLATES {
            handlebars
                .register_template_string(name, *source)
                .map_err(|e| Error::SerializationError {
                    message: format!("Failed to register {name} template: {e}"),
                    source: None,
                })?;
        }

        Ok(Self { handlebars })
    }

    /// Renders a template with the given context.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Template name is not registered
    /// - Context cannot be serialized
    /// - A referenced variable is missing (strict mode)
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(template_name, context)
            .map_err(|e| Error::SerializationError {
                message: format!("Template rendering failed: {e}"),
                source: None,
            })
    }

    /// Registers a custom template.
    ///
    /// # Errors
    ///
    /// Returns error if template string is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_codegen::template_engine::TemplateEngine;
    ///
    /// let mut engine = TemplateEngine::new().unwrap();
    /// engine.register_template_string("custom", "# {{name}}").unwrap();
    /// ```
    pub fn register_template_string(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| Error::SerializationError {
                message: format!("Failed to register template '{name}': {e}"),
                source: None,
            })
    }

    /// Returns `true` if a template with this name is registered.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_engine_creation() {
        let engine = TemplateEngine::new().unwrap();
        for (name, _) in TEMPLATES {
            assert!(engine.has_template(name), "{name} not registered");
        }
    }

    #[test]
    fn test_render_nonexistent_template() {
        let engine = TemplateEngine::new().unwrap();
        let err = engine.render("nonexistent/template", &json!({})).unwrap_err();
        assert!(matches!(err, Error::SerializationError { .. }));
    }

    #[test]
    fn test_strict_mode_fails_on_missing_variable() {
        let mut engine = TemplateEngine::new().unwrap();
        engine
            .register_template_string("strict", "value = {{missing_var}}")
            .unwrap();
        assert!(engine.render("strict", &json!({"other": 1})).is_err());
    }

    #[test]
    fn test_no_html_escaping() {
        let mut engine = TemplateEngine::new().unwrap();
        engine
            .register_template_string("raw", "x: {{ty}} = {{value}}")
            .unwrap();
        let out = engine
            .render("raw", &json!({"ty": "Dict[str, Any]", "value": "'<a & b>'"}))
            .unwrap();
        assert_eq!(out, "x: Dict[str, Any] = '<a & b>'");
    }

    #[test]
    fn test_register_invalid_template_syntax() {
        let mut engine = TemplateEngine::new().unwrap();
        let result = engine.register_template_string("invalid", "Hello {{name");
        assert!(matches!(
            result.unwrap_err(),
            Error::SerializationError { .. }
        ));
    }

    #[test]
    fn test_render_code_preamble_imports_runtime() {
        let engine = TemplateEngine::new().unwrap();
        let out = engine
            .render("package/code_preamble", &json!({"package": "acme_sdk"}))
            .unwrap();
        assert!(out.contains("from acme_sdk.runtime import"));
    }

    #[test]
    fn test_concurrent_template_usage() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TemplateEngine>();
    }
}
