//! External schema engine driven through a temp-file round trip.
//!
//! Tools such as `jsonschema-gentypes` only read and write files, so the
//! schema is written to a temporary JSON file, the tool is pointed at a
//! temporary destination and the generated source is read back.

use super::engine::{EngineError, SchemaEngine};
use serde_json::Value;
use std::io::Write;
use std::process::Command;

/// Placeholder replaced with the input JSON path.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced with the output Python path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";
/// Placeholder replaced with the root type name.
pub const ROOT_PLACEHOLDER: &str = "{root}";

/// Runs an external program as the schema engine.
///
/// # Examples
///
/// ```
/// use polygen_codegen::schema::CommandEngine;
///
/// let engine = CommandEngine::from_argv(&[
///     "gentypes".to_string(),
///     "--root={root}".to_string(),
///     "{input}".to_string(),
///     "{output}".to_string(),
/// ])
/// .unwrap();
/// assert_eq!(engine.program(), "gentypes");
/// ```
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    /// Creates an engine from a program and its argument template.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Creates an engine from a full argv, as stored in configuration.
    ///
    /// Returns `None` for an empty argv.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Program that is executed.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn expand(&self, input: &str, output: &str, root: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, input)
                    .replace(OUTPUT_PLACEHOLDER, output)
                    .replace(ROOT_PLACEHOLDER, root)
            })
            .collect()
    }
}

impl SchemaEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn generate(&self, schema: &Value, root: &str) -> Result<String, EngineError> {
        let mut input = tempfile::Builder::new()
            .prefix("polygen_")
            .suffix(".json")
            .tempfile()
            .map_err(|e| io_failure("create schema input file", e))?;
        serde_json::to_writer(&mut input, schema).map_err(|e| EngineError::Other {
            message: "failed to serialize schema".to_string(),
            source: Some(Box::new(e)),
        })?;
        input
            .flush()
            .map_err(|e| io_failure("flush schema input file", e))?;

        let output = tempfile::Builder::new()
            .prefix("polygen_")
            .suffix(".py")
            .tempfile()
            .map_err(|e| io_failure("create schema output file", e))?;

        let input_path = input.path().to_string_lossy().into_owned();
        let output_path = output.path().to_string_lossy().into_owned();

        tracing::debug!(program = %self.program, root, "Running external schema engine");
        let result = Command::new(&self.program)
            .args(self.expand(&input_path, &output_path, root))
            .output()
            .map_err(|e| io_failure("spawn schema engine", e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(classify_failure(&stderr));
        }

        std::fs::read_to_string(output.path())
            .map_err(|e| io_failure("read schema engine output", e))
    }
}

fn io_failure(action: &str, err: std::io::Error) -> EngineError {
    EngineError::Other {
        message: format!("failed to {action}"),
        source: Some(Box::new(err)),
    }
}

/// Maps the stderr of a failed engine run to an [`EngineError`].
#[must_use]
pub fn classify_failure(stderr: &str) -> EngineError {
    if stderr.contains("RecursionError") {
        EngineError::RecursionLimit {
            detail: last_line(stderr),
        }
    } else if stderr.contains("CannotDetermineSpecification") {
        EngineError::CannotDetermineSpecification {
            reference: last_line(stderr),
        }
    } else {
        EngineError::other(last_line(stderr))
    }
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown failure")
        .trim()
        .to_string()
}
