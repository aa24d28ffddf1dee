//! Update-rendered-spec command implementation.
//!
//! Renders the cached API and server functions and uploads each Python
//! signature with its type definitions, so the Poly service can show them
//! in function documentation.

use super::common::{build_renderer, read_cached_specs};
use crate::formatters::{Report, failure_line, print_output, success_line};
use crate::http::PolyClient;
use anyhow::{Context, Result};
use colored::Colorize;
use polygen_codegen::{SchemaIndex, SpecRenderer};
use polygen_core::cli::{ExitCode, OutputFormat};
use polygen_core::traits::SpecQuery;
use polygen_core::{ConfigContext, SpecType, SpecificationDto};
use serde::Serialize;

/// Endpoint receiving rendered signatures.
pub const RENDERED_SPECS_PATH: &str = "/functions/rendered-specs";

/// Body of `POST /functions/rendered-specs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSpecUpload {
    /// Always `python`.
    pub language: &'static str,
    /// Rendered function declaration.
    pub signature: String,
    /// Companion type module, possibly empty.
    pub typedefs: String,
    /// Set for API functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_function_id: Option<String>,
    /// Set for server functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_function_id: Option<String>,
}

impl RenderedSpecUpload {
    /// Renders `spec`, or returns `Ok(None)` for specs that have no
    /// rendered-spec record on the service.
    ///
    /// # Errors
    ///
    /// Returns the render error of the spec.
    pub fn render(
        renderer: &SpecRenderer,
        spec: &SpecificationDto,
    ) -> polygen_core::Result<Option<Self>> {
        let id = spec.id.to_string();
        let (api_function_id, custom_function_id) = match spec.spec_type {
            SpecType::ApiFunction => (Some(id), None),
            SpecType::ServerFunction => (None, Some(id)),
            _ => return Ok(None),
        };
        let rendered = renderer.render(spec)?;
        Ok(Some(Self {
            language: "python",
            signature: rendered.source,
            typedefs: rendered.type_defs,
            api_function_id,
            custom_function_id,
        }))
    }
}

/// Outcome of an `update-rendered-spec` run.
#[derive(Debug, Default, Serialize)]
pub struct UpdateReport {
    updated: Vec<String>,
    failed: Vec<String>,
}

impl UpdateReport {
    /// Returns `true` if every upload succeeded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Report for UpdateReport {
    fn pretty(&self) -> String {
        let mut out = success_line(&format!(
            "Updated {} rendered specs",
            self.updated.len().to_string().cyan()
        ));
        for failure in &self.failed {
            out.push_str("\n  ");
            out.push_str(&failure_line(failure));
        }
        out
    }
}

/// Cached specs eligible for upload, restricted to `contexts` prefixes when
/// any are given.
#[must_use]
pub fn select_uploadable(
    specs: Vec<SpecificationDto>,
    contexts: &[String],
) -> Vec<SpecificationDto> {
    let query = SpecQuery {
        contexts: contexts.to_vec(),
        ..SpecQuery::default()
    };
    let outcome = SchemaIndex::from_specs(&specs).apply(specs);
    outcome
        .items
        .into_iter()
        .filter(|spec| matches!(spec.spec_type, SpecType::ApiFunction | SpecType::ServerFunction))
        .filter(|spec| query.matches_context(&spec.context))
        .collect()
}

/// Runs the update-rendered-spec command.
///
/// Each spec is uploaded independently. Failures are reported and turn the
/// exit code into [`ExitCode::ERROR`] without stopping the run.
///
/// # Errors
///
/// Returns an error if credentials or the spec cache are missing.
pub async fn run(
    ctx: &ConfigContext,
    contexts: &[String],
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let config = ctx.config();
    let client = PolyClient::from_config(config).context("cannot update rendered specs")?;
    let renderer = build_renderer(config)?;
    let specs = select_uploadable(read_cached_specs(config)?, contexts);

    let mut report = UpdateReport::default();
    for spec in &specs {
        let name = spec.qualified_name();
        match upload(&client, &renderer, spec).await {
            Ok(()) => report.updated.push(name),
            Err(err) => {
                tracing::warn!(
                    spec = %name,
                    id = %spec.id,
                    error = %format!("{err:#}"),
                    "Rendered spec upload failed"
                );
                report.failed.push(format!("{name} ({}): {err:#}", spec.id));
            }
        }
    }

    print_output(&report, output_format)?;
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::ERROR
    })
}

async fn upload(
    client: &PolyClient,
    renderer: &SpecRenderer,
    spec: &SpecificationDto,
) -> Result<()> {
    let Some(body) = RenderedSpecUpload::render(renderer, spec)? else {
        return Ok(());
    };
    client.post_json(RENDERED_SPECS_PATH, &body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polygen_codegen::SchemaRenderer;
    use serde_json::json;

    fn specs() -> Vec<SpecificationDto> {
        serde_json::from_value(json!([
            {"id": "api-1", "context": "shipping.fedex", "name": "track", "type": "apiFunction",
             "function": {"arguments": [{"name": "code", "type": {"kind": "primitive", "type": "string"}}],
                          "returnType": {"kind": "void"}}},
            {"id": "srv-1", "context": "billing", "name": "charge", "type": "serverFunction",
             "function": {"arguments": [], "returnType": {"kind": "primitive", "type": "boolean"}}},
            {"id": "var-1", "context": "billing", "name": "token", "type": "serverVariable",
             "variable": {"secret": true, "valueType": {"kind": "primitive", "type": "string"}}},
            {"id": "c-1", "context": "billing", "name": "local", "type": "customFunction",
             "language": "python", "code": "def local():\n    pass\n"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_select_uploadable_keeps_api_and_server() {
        let selected = select_uploadable(specs(), &[]);
        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["api-1", "srv-1"]);

        let shipping = select_uploadable(specs(), &["shipping".to_string()]);
        assert_eq!(shipping.len(), 1);
        assert_eq!(shipping[0].id.as_str(), "api-1");
    }

    #[test]
    fn test_upload_body_sets_one_id() {
        let renderer = SpecRenderer::new("polyapi", SchemaRenderer::builtin()).unwrap();
        let specs = specs();

        let api = RenderedSpecUpload::render(&renderer, &specs[0]).unwrap().unwrap();
        assert!(api.signature.contains("def track("));
        let body = serde_json::to_value(&api).unwrap();
        assert_eq!(body["language"], "python");
        assert_eq!(body["apiFunctionId"], "api-1");
        assert!(body.get("customFunctionId").is_none());

        let server = RenderedSpecUpload::render(&renderer, &specs[1]).unwrap().unwrap();
        assert_eq!(server.custom_function_id.as_deref(), Some("srv-1"));
        assert!(server.api_function_id.is_none());

        assert!(RenderedSpecUpload::render(&renderer, &specs[2]).unwrap().is_none());
    }

    #[test]
    fn test_report_marks_failures() {
        let mut report = UpdateReport::default();
        report.updated.push("billing.charge".to_string());
        assert!(report.is_clean());
        report.failed.push("a.b (1): boom".to_string());
        assert!(!report.is_clean());
        assert!(report.pretty().contains("a.b (1): boom"));
    }
}
