//! Schema engine seam.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Failure classes of a schema engine.
///
/// The [`SchemaRenderer`](super::SchemaRenderer) degrades every variant to
/// the caller's fallback type; the classes only drive logging.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Nesting went deeper than the engine allows.
    #[error("schema nesting exceeds the recursion limit: {detail}")]
    RecursionLimit {
        /// Engine specific description of the limit that was hit
        detail: String,
    },

    /// A `$ref` points at nothing the engine can find, usually a dangling
    /// reference left behind after poly-ref substitution.
    #[error("cannot determine specification for reference '{reference}'")]
    CannotDetermineSpecification {
        /// The unresolved reference
        reference: String,
    },

    /// Any other engine failure.
    #[error("schema engine failed: {message}")]
    Other {
        /// Description of the failure
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EngineError {
    /// Shorthand for [`EngineError::Other`] without a source.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }
}

/// Converts one JSON Schema document into Python type declarations.
///
/// Implementations declare the root type under exactly `root`; everything
/// else they emit is free-form Python that the caller writes verbatim.
pub trait SchemaEngine: Send + Sync + fmt::Debug {
    /// Short engine name for diagnostics.
    fn name(&self) -> &'static str;

    /// Generates declarations for `schema` with the root named `root`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] classifying the failure.
    fn generate(&self, schema: &Value, root: &str) -> Result<String, EngineError>;
}
