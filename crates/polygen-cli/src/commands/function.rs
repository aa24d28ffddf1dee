//! Function command implementation.
//!
//! - `function add` uploads a Python file as a server or client function.
//! - `function execute` looks a generated function up in the spec cache and
//!   runs it through the execute endpoint.

use super::common::read_cached_specs;
use crate::actions::FunctionAction;
use crate::formatters::{Report, print_output, success_line};
use crate::http::PolyClient;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use polygen_core::cli::{ExitCode, FunctionPath, OutputFormat};
use polygen_core::{ConfigContext, SpecType, SpecificationDto};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::path::Path;

/// Body of `POST /functions/server` and `POST /functions/client`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUpload {
    context: String,
    name: String,
    description: String,
    code: String,
    language: &'static str,
    type_schemas: Value,
    return_type: Option<String>,
    return_type_schema: Value,
    arguments: Vec<Value>,
    logs_enabled: bool,
}

impl FunctionUpload {
    /// Upload of Python `code` with an inferred signature.
    #[must_use]
    pub fn python(
        name: &str,
        context: &str,
        description: &str,
        code: String,
        logs_enabled: bool,
    ) -> Self {
        Self {
            context: context.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            code,
            language: "python",
            type_schemas: json!({}),
            return_type: None,
            return_type_schema: json!({}),
            arguments: Vec::new(),
            logs_enabled,
        }
    }
}

/// Endpoint for uploading a function.
#[must_use]
pub const fn upload_path(server: bool) -> &'static str {
    if server {
        "/functions/server"
    } else {
        "/functions/client"
    }
}

/// Function type segment of the execute endpoint, if the spec can be
/// executed remotely.
#[must_use]
pub const fn execute_kind(spec_type: SpecType) -> Option<&'static str> {
    match spec_type {
        SpecType::ApiFunction => Some("api"),
        SpecType::ServerFunction => Some("server"),
        _ => None,
    }
}

/// Finds the function spec for `path`.
#[must_use]
pub fn find_function<'a>(
    specs: &'a [SpecificationDto],
    path: &FunctionPath,
) -> Option<&'a SpecificationDto> {
    specs.iter().find(|spec| {
        spec.spec_type.is_function() && spec.context == path.context() && spec.name == path.name()
    })
}

/// Builds the execute payload from CLI arguments.
///
/// A JSON object is sent as is. A JSON array is matched positionally to
/// the function's declared argument names. No arguments send `{}`.
///
/// # Errors
///
/// Returns an error for invalid JSON, a scalar, or more positional values
/// than the function declares.
///
/// # Examples
///
/// ```
/// use polygen_cli::commands::function::build_payload;
/// use polygen_core::SpecificationDto;
/// use serde_json::json;
///
/// let spec: SpecificationDto = serde_json::from_value(json!({
///     "id": "1", "name": "getForecast", "type": "serverFunction",
///     "function": {"arguments": [{"name": "locationId", "type": {"kind": "primitive", "type": "integer"}}]}
/// })).unwrap();
///
/// let payload = build_payload(&spec, Some("[42]")).unwrap();
/// assert_eq!(payload, json!({"locationId": 42}));
/// ```
pub fn build_payload(spec: &SpecificationDto, raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(json!({}));
    };
    let parsed: Value = serde_json::from_str(raw).context("arguments must be valid JSON")?;
    match parsed {
        Value::Object(_) => Ok(parsed),
        Value::Array(values) => {
            let names: Vec<&str> = spec
                .function
                .as_ref()
                .map(|f| f.arguments.iter().map(|a| a.name.as_str()).collect())
                .unwrap_or_default();
            if values.len() > names.len() {
                bail!(
                    "{} takes {} arguments, {} given",
                    spec.qualified_name(),
                    names.len(),
                    values.len()
                );
            }
            let map: Map<String, Value> = names
                .into_iter()
                .zip(values)
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            Ok(Value::Object(map))
        }
        _ => bail!("arguments must be a JSON object or array"),
    }
}

/// Result of `function add`.
#[derive(Debug, Serialize)]
pub struct AddReport {
    id: String,
    name: String,
    context: String,
    kind: &'static str,
}

impl Report for AddReport {
    fn pretty(&self) -> String {
        let qualified = if self.context.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.context, self.name)
        };
        success_line(&format!(
            "Added {} function {} (id {})",
            self.kind,
            qualified.cyan(),
            self.id.bold()
        ))
    }
}

/// Result of `function execute`.
#[derive(Debug, Serialize)]
pub struct ExecuteReport {
    function: String,
    id: String,
    result: Value,
}

impl Report for ExecuteReport {
    fn pretty(&self) -> String {
        let body = serde_json::to_string_pretty(&self.result).unwrap_or_default();
        format!("{}\n{body}", success_line(&self.function.cyan().to_string()))
    }
}

/// Runs a function subcommand.
///
/// # Errors
///
/// Returns an error if credentials are missing, the input is invalid or
/// the Poly service rejects the request.
pub async fn run(
    ctx: &ConfigContext,
    action: FunctionAction,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let client =
        PolyClient::from_config(ctx.config()).context("cannot reach the Poly service")?;
    match action {
        FunctionAction::Add {
            name,
            file,
            context,
            description,
            server,
            logs,
        } => {
            let report = add(&client, &name, &file, &context, &description, server, logs).await?;
            print_output(&report, output_format)?;
        }
        FunctionAction::Execute { function, args } => {
            let specs = read_cached_specs(ctx.config())?;
            let report = execute(&client, &specs, &function, args.as_deref()).await?;
            print_output(&report, output_format)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn add(
    client: &PolyClient,
    name: &str,
    file: &Path,
    context: &str,
    description: &str,
    server: bool,
    logs: bool,
) -> Result<AddReport> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    if code.trim().is_empty() {
        bail!("{} is empty", file.display());
    }

    let kind = if server { "server" } else { "client" };
    tracing::info!(name, context, kind, "Adding function");
    let upload = FunctionUpload::python(name, context, description, code, logs);
    let response = client
        .post_json(upload_path(server), &upload)
        .await
        .with_context(|| format!("failed to add function '{name}'"))?;

    let id = response
        .get("id")
        .and_then(Value::as_str)
        .context("the service did not return a function id")?;
    Ok(AddReport {
        id: id.to_string(),
        name: name.to_string(),
        context: context.to_string(),
        kind,
    })
}

async fn execute(
    client: &PolyClient,
    specs: &[SpecificationDto],
    function: &str,
    args: Option<&str>,
) -> Result<ExecuteReport> {
    let path = FunctionPath::new(function)?;
    let spec = find_function(specs, &path)
        .with_context(|| format!("function '{function}' is not in the spec cache"))?;
    let Some(kind) = execute_kind(spec.spec_type) else {
        bail!(
            "{} is a {} and cannot be executed remotely",
            spec.qualified_name(),
            spec.spec_type
        );
    };
    let payload = build_payload(spec, args)?;

    tracing::debug!(function = %spec.qualified_name(), id = %spec.id, "Executing function");
    let result = client
        .post_json(&format!("/functions/{kind}/{}/execute", spec.id), &payload)
        .await
        .with_context(|| format!("failed to execute '{function}'"))?;

    Ok(ExecuteReport {
        function: spec.qualified_name(),
        id: spec.id.to_string(),
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<SpecificationDto> {
        serde_json::from_value(json!([
            {"id": "a1", "context": "weather", "name": "getForecast", "type": "apiFunction",
             "function": {"arguments": [
                 {"name": "city", "type": {"kind": "primitive", "type": "string"}},
                 {"name": "days", "type": {"kind": "primitive", "type": "integer"}}
             ]}},
            {"id": "c1", "context": "weather", "name": "localOnly", "type": "customFunction"},
            {"id": "s1", "context": "weather", "name": "getForecast", "type": "schema",
             "contextName": "weather.getForecast", "definition": {}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_find_function_ignores_non_functions() {
        let specs = specs();
        let found = find_function(&specs, &FunctionPath::new("weather.getForecast").unwrap());
        assert_eq!(found.unwrap().id.as_str(), "a1");
        assert!(find_function(&specs, &FunctionPath::new("weather.missing").unwrap()).is_none());
    }

    #[test]
    fn test_build_payload_shapes() {
        let specs = specs();
        let spec = &specs[0];
        assert_eq!(build_payload(spec, None).unwrap(), json!({}));
        assert_eq!(
            build_payload(spec, Some(r#"{"city": "Oslo"}"#)).unwrap(),
            json!({"city": "Oslo"})
        );
        assert_eq!(
            build_payload(spec, Some(r#"["Oslo", 3]"#)).unwrap(),
            json!({"city": "Oslo", "days": 3})
        );
        assert!(build_payload(spec, Some("[1, 2, 3]")).is_err());
        assert!(build_payload(spec, Some("42")).is_err());
        assert!(build_payload(spec, Some("{not json")).is_err());
    }

    #[test]
    fn test_execute_kind() {
        assert_eq!(execute_kind(SpecType::ApiFunction), Some("api"));
        assert_eq!(execute_kind(SpecType::ServerFunction), Some("server"));
        assert_eq!(execute_kind(SpecType::CustomFunction), None);
    }

    #[test]
    fn test_upload_body() {
        let code = "def hello():\n    pass\n".to_string();
        let upload = FunctionUpload::python("hello", "demo", "Says hi", code, true);
        let body = serde_json::to_value(&upload).unwrap();
        assert_eq!(body["language"], "python");
        assert_eq!(body["logsEnabled"], true);
        assert_eq!(body["returnType"], Value::Null);
        assert_eq!(body["typeSchemas"], json!({}));
        assert_eq!(upload_path(true), "/functions/server");
        assert_eq!(upload_path(false), "/functions/client");
    }
}
