//! Output formatters for CLI commands.
//!
//! Every command result is serializable and also knows how to describe
//! itself to a human. JSON and text modes print the serialized form; pretty
//! mode prints the colored description.

use anyhow::Result;
use colored::Colorize;
use polygen_core::cli::OutputFormat;
use serde::Serialize;

/// A command result that can be printed in every [`OutputFormat`].
pub trait Report: Serialize {
    /// Colored, human-readable rendering.
    fn pretty(&self) -> String;
}

/// Formats `data` according to `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Examples
///
/// ```
/// use polygen_cli::formatters::{Report, format_output};
/// use polygen_core::cli::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Cleared {
///     removed: usize,
/// }
///
/// impl Report for Cleared {
///     fn pretty(&self) -> String {
///         format!("removed {}", self.removed)
///     }
/// }
///
/// let output = format_output(&Cleared { removed: 3 }, OutputFormat::Text)?;
/// assert_eq!(output, r#"{"removed":3}"#);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Report>(data: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Text => serde_json::to_string(data)?,
        OutputFormat::Pretty => data.pretty(),
    })
}

/// Prints `data` to stdout in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_output<T: Report>(data: &T, format: OutputFormat) -> Result<()> {
    println!("{}", format_output(data, format)?);
    Ok(())
}

/// Green check mark followed by `message`.
#[must_use]
pub fn success_line(message: &str) -> String {
    format!("{} {message}", "✓".green().bold())
}

/// Yellow warning marker followed by `message`.
#[must_use]
pub fn warning_line(message: &str) -> String {
    format!("{} {message}", "!".yellow().bold())
}

/// Red cross followed by `message`.
#[must_use]
pub fn failure_line(message: &str) -> String {
    format!("{} {message}", "✗".red().bold())
}
