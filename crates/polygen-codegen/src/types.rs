//! Output types of the rendering pipeline.

use polygen_core::NamespacePath;
use serde::{Deserialize, Serialize};

/// A type expression plus the standalone declarations it depends on.
///
/// `definition` is empty for primitives and bare containers.
///
/// # Examples
///
/// ```
/// use polygen_codegen::TypeResolution;
///
/// let plain = TypeResolution::simple("int");
/// assert_eq!(plain.expr, "int");
/// assert!(!plain.has_definition());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeResolution {
    /// Python type expression, e.g. `int` or `List[Pet]`.
    pub expr: String,
    /// Declarations referenced by `expr`.
    pub definition: String,
}

impl TypeResolution {
    /// Creates a resolution with a definition.
    #[must_use]
    pub fn new(expr: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            definition: definition.into(),
        }
    }

    /// Creates a resolution that needs no declaration.
    #[must_use]
    pub fn simple(expr: impl Into<String>) -> Self {
        Self::new(expr, String::new())
    }

    /// Returns `true` if a declaration block accompanies the expression.
    #[must_use]
    pub fn has_definition(&self) -> bool {
        !self.definition.trim().is_empty()
    }
}

/// Rendered source for one spec, ready for the package writer.
///
/// `source` is appended to the aggregator of the leaf's parent directory;
/// `type_defs` goes to the leaf's companion `_<leaf>.py` module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSpec {
    /// Where the declaration lives in the package.
    pub path: NamespacePath,
    /// Declaration appended to the aggregator.
    pub source: String,
    /// Companion type definitions, possibly empty.
    pub type_defs: String,
}

impl RenderedSpec {
    /// Returns `true` when the renderer produced nothing to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Returns `true` when a companion type module should be written.
    #[must_use]
    pub fn has_type_defs(&self) -> bool {
        !self.type_defs.trim().is_empty()
    }
}

/// A whole generated file, relative to the package root.
///
/// # Examples
///
/// ```
/// use polygen_codegen::GeneratedFile;
///
/// let file = GeneratedFile {
///     path: "runtime.py".to_string(),
///     content: "import requests\n".to_string(),
/// };
/// assert_eq!(file.path, "runtime.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Relative path using `/` separators.
    pub path: String,
    /// File contents.
    pub content: String,
}
