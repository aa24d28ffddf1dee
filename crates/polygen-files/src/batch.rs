//! Batch drivers.
//!
//! Every spec is rendered and written inside its own isolation boundary:
//! a failure is logged with the spec's identity, recorded in the
//! [`BatchReport`] and the batch moves on to the next spec.

use crate::writer::PackageWriter;
use polygen_codegen::SpecRenderer;
use polygen_core::{SpecType, SpecificationDto};
use std::fmt;

/// One spec that could not be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// `context.name` of the spec.
    pub spec: String,
    /// Remote id of the spec.
    pub id: String,
    /// Rendered error message.
    pub error: String,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.spec, self.id, self.error)
    }
}

/// Outcome of one batch.
///
/// # Examples
///
/// ```
/// use polygen_files::BatchReport;
///
/// let report = BatchReport::new("functions");
/// assert!(report.is_clean());
/// assert_eq!(report.attempted(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// What the batch generated, e.g. `functions`.
    pub kind: &'static str,
    /// `context.name` of every spec written.
    pub generated: Vec<String>,
    /// `context.name` of specs that rendered to nothing.
    pub skipped: Vec<String>,
    /// Specs that failed.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Empty report for a batch of `kind`.
    #[must_use]
    pub const fn new(kind: &'static str) -> Self {
        Self {
            kind,
            generated: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Returns `true` if nothing failed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of specs the batch looked at.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.generated.len() + self.skipped.len() + self.failures.len()
    }

    /// `context.name` of every failed spec, in batch order.
    #[must_use]
    pub fn failed_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.spec.as_str()).collect()
    }
}

/// Renders and writes specs one at a time.
#[derive(Debug, Clone, Copy)]
pub struct BatchDriver<'a> {
    renderer: &'a SpecRenderer,
    writer: &'a PackageWriter,
}

impl<'a> BatchDriver<'a> {
    /// Creates a driver writing through `writer`.
    #[must_use]
    pub const fn new(renderer: &'a SpecRenderer, writer: &'a PackageWriter) -> Self {
        Self { renderer, writer }
    }

    /// Generates every function spec in `specs` into `poly/`.
    #[must_use]
    pub fn generate_functions(&self, specs: &[SpecificationDto]) -> BatchReport {
        self.run(
            "functions",
            specs.iter().filter(|s| s.spec_type.is_function()),
        )
    }

    /// Generates every `serverVariable` spec in `specs` into `vari/`.
    #[must_use]
    pub fn generate_variables(&self, specs: &[SpecificationDto]) -> BatchReport {
        self.run(
            "variables",
            specs
                .iter()
                .filter(|s| s.spec_type == SpecType::ServerVariable),
        )
    }

    /// Generates every `schema` spec in `specs` into `schemas/`.
    #[must_use]
    pub fn generate_schemas(&self, specs: &[SpecificationDto]) -> BatchReport {
        self.run(
            "schemas",
            specs.iter().filter(|s| s.spec_type == SpecType::Schema),
        )
    }

    /// Generates every `table` spec in `specs` into `tabi/`.
    #[must_use]
    pub fn generate_tables(&self, specs: &[SpecificationDto]) -> BatchReport {
        self.run(
            "tables",
            specs.iter().filter(|s| s.spec_type == SpecType::Table),
        )
    }

    fn run<'s>(
        &self,
        kind: &'static str,
        specs: impl Iterator<Item = &'s SpecificationDto>,
    ) -> BatchReport {
        let mut report = BatchReport::new(kind);
        for spec in specs {
            let name = spec.qualified_name();
            match self.generate_one(spec) {
                Ok(true) => report.generated.push(name),
                Ok(false) => {
                    tracing::debug!(spec = %name, "Nothing rendered, skipping");
                    report.skipped.push(name);
                }
                Err(err) => {
                    tracing::warn!(
                        context = %spec.context,
                        name = %spec.name,
                        id = %spec.id,
                        error = %err,
                        "Failed to generate spec"
                    );
                    report.failures.push(BatchFailure {
                        spec: name,
                        id: spec.id.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        if !report.is_clean() {
            tracing::warn!(
                kind,
                failed = report.failures.len(),
                names = %report.failed_names().join(", "),
                "Some specs could not be generated"
            );
        }
        tracing::info!(
            kind,
            generated = report.generated.len(),
            skipped = report.skipped.len(),
            "Batch complete"
        );
        report
    }

    fn generate_one(&self, spec: &SpecificationDto) -> polygen_core::Result<bool> {
        let rendered = self.renderer.render(spec)?;
        if rendered.is_empty() {
            return Ok(false);
        }
        self.writer.write(&rendered)?;
        Ok(true)
    }
}
