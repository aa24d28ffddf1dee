//! Clear command implementation.
//!
//! Removes the generated sections, root files and spec cache from the
//! configured output directory.

use crate::formatters::{Report, print_output, success_line};
use anyhow::{Context, Result};
use colored::Colorize;
use polygen_core::ConfigContext;
use polygen_core::cli::{ExitCode, OutputFormat};
use polygen_files::clear_library;
use serde::Serialize;

/// Result of a `clear` run.
#[derive(Debug, Serialize)]
pub struct ClearReport {
    output_dir: String,
    removed: usize,
}

impl Report for ClearReport {
    fn pretty(&self) -> String {
        if self.removed == 0 {
            format!("Nothing to clear in {}", self.output_dir.bold())
        } else {
            success_line(&format!(
                "Cleared generated library in {} ({} entries)",
                self.output_dir.bold(),
                self.removed
            ))
        }
    }
}

/// Runs the clear command.
///
/// # Errors
///
/// Returns an error if an existing generated entry cannot be removed.
pub fn run(ctx: &ConfigContext, output_format: OutputFormat) -> Result<ExitCode> {
    let output_dir = &ctx.config().output_dir;
    let removed = clear_library(output_dir)
        .with_context(|| format!("failed to clear {}", output_dir.display()))?;

    print_output(
        &ClearReport {
            output_dir: output_dir.display().to_string(),
            removed,
        },
        output_format,
    )?;
    Ok(ExitCode::SUCCESS)
}
