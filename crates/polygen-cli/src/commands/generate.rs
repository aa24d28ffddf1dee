//! Generate command implementation.
//!
//! Fetches specs from the Poly service and regenerates the Python package:
//! 1. Resolves credentials from the configuration context
//! 2. Fetches `/specs` with the requested filters
//! 3. Runs the generation pipeline into the output directory
//! 4. Prints a summary of generated, skipped and failed specs

use crate::formatters::{Report, failure_line, print_output, success_line, warning_line};
use crate::http::{HttpSpecSource, PolyClient};
use anyhow::{Context, Result};
use colored::Colorize;
use polygen_core::cli::{ExitCode, OutputFormat};
use polygen_core::traits::{SpecQuery, SpecSource};
use polygen_core::{ConfigContext, GeneratorConfig};
use polygen_files::{GenerateOptions, GenerationSummary, LibraryGenerator};
use serde::Serialize;

use super::common::build_renderer;

/// Spec filters accepted by `generate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Context prefixes to include.
    pub contexts: Vec<String>,
    /// Spec names to include.
    pub names: Vec<String>,
    /// Spec ids to include.
    pub function_ids: Vec<String>,
    /// Skip type information and schema generation.
    pub no_types: bool,
}

impl GenerateArgs {
    /// Query passed to the spec source.
    #[must_use]
    pub fn query(&self) -> SpecQuery {
        SpecQuery {
            contexts: self.contexts.clone(),
            names: self.names.clone(),
            function_ids: self.function_ids.clone(),
            no_types: self.no_types,
        }
    }
}

/// Per-batch line of the generation report.
#[derive(Debug, Serialize)]
struct BatchLine {
    kind: &'static str,
    generated: usize,
    skipped: usize,
    failed: Vec<String>,
}

/// Result of a `generate` run.
#[derive(Debug, Serialize)]
pub struct GenerateReport {
    output_dir: String,
    fetched: usize,
    selected: usize,
    generated: usize,
    dropped: Vec<String>,
    batches: Vec<BatchLine>,
}

impl From<&GenerationSummary> for GenerateReport {
    fn from(summary: &GenerationSummary) -> Self {
        Self {
            output_dir: summary.root.display().to_string(),
            fetched: summary.fetched,
            selected: summary.selected,
            generated: summary.generated(),
            dropped: summary.dropped.clone(),
            batches: summary
                .reports
                .iter()
                .map(|report| BatchLine {
                    kind: report.kind,
                    generated: report.generated.len(),
                    skipped: report.skipped.len(),
                    failed: report.failures.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        }
    }
}

impl Report for GenerateReport {
    fn pretty(&self) -> String {
        let mut out = success_line(&format!(
            "Generated {} of {} specs into {}",
            self.generated.to_string().cyan(),
            self.selected,
            self.output_dir.bold()
        ));
        for batch in &self.batches {
            out.push_str(&format!(
                "\n  {:<10} {} generated, {} skipped",
                batch.kind, batch.generated, batch.skipped
            ));
            for failure in &batch.failed {
                out.push_str("\n    ");
                out.push_str(&failure_line(failure));
            }
        }
        if !self.dropped.is_empty() {
            out.push('\n');
            out.push_str(&warning_line(&format!(
                "{} specs dropped for unresolvable schema references: {}",
                self.dropped.len(),
                self.dropped.join(", ")
            )));
        }
        out
    }
}

/// Runs the generate command against the Poly service.
///
/// # Errors
///
/// Returns an error if credentials are missing, the service cannot be
/// reached, no spec matches the filters, or the package skeleton cannot be
/// written.
pub async fn run(
    ctx: &ConfigContext,
    args: &GenerateArgs,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let config = ctx.config();
    let client = PolyClient::from_config(config).context("cannot generate the client library")?;
    let base_url = client.base_url().to_string();
    run_with_source(
        HttpSpecSource::new(client),
        config,
        args,
        &base_url,
        output_format,
    )
    .await
}

/// Runs the generate command against any spec source.
///
/// Individual spec failures are part of the printed report and do not
/// change the exit code.
///
/// # Errors
///
/// Same as [`run`], minus the credential check.
pub async fn run_with_source<S: SpecSource>(
    source: S,
    config: &GeneratorConfig,
    args: &GenerateArgs,
    default_base_url: &str,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let renderer = build_renderer(config)?;
    let generator = LibraryGenerator::new(source, renderer, &config.output_dir)
        .context("failed to prepare the package writer")?;

    let options = GenerateOptions {
        query: args.query(),
        default_base_url: default_base_url.to_string(),
    };
    let summary = generator
        .generate(&options)
        .await
        .context("failed to generate the client library")?;

    print_output(&GenerateReport::from(&summary), output_format)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polygen_files::BatchReport;
    use std::path::PathBuf;

    #[test]
    fn test_args_become_query() {
        let args = GenerateArgs {
            contexts: vec!["billing".to_string()],
            no_types: true,
            ..GenerateArgs::default()
        };
        let query = args.query();
        assert_eq!(query.contexts, ["billing"]);
        assert!(query.no_types);
        assert!(query.names.is_empty());
    }

    #[test]
    fn test_report_lists_failures() {
        let mut functions = BatchReport::new("functions");
        functions.generated.push("a.ok".to_string());
        functions.failures.push(polygen_files::BatchFailure {
            spec: "a.bad".to_string(),
            id: "7".to_string(),
            error: "boom".to_string(),
        });
        let summary = GenerationSummary {
            root: PathBuf::from("polyapi"),
            fetched: 2,
            selected: 2,
            dropped: vec!["x.y (9)".to_string()],
            reports: vec![functions],
        };

        let report = GenerateReport::from(&summary);
        let pretty = report.pretty();
        assert!(pretty.contains("a.bad (7): boom"));
        assert!(pretty.contains("x.y (9)"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["generated"], 1);
        assert_eq!(json["batches"][0]["failed"][0], "a.bad (7): boom");
    }
}
