//! Strong domain types for the generator.
//!
//! Spec identifiers and namespace paths are newtypes so they cannot be
//! confused with the many other strings flowing through the pipeline.
//!
//! # Examples
//!
//! ```
//! use polygen_core::{NamespacePath, Section};
//!
//! let path = NamespacePath::new(Section::Functions, "billing.invoices", "create").unwrap();
//! assert_eq!(path.to_string(), "poly.billing.invoices.create");
//! assert_eq!(path.leaf(), "create");
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spec identifier (newtype over String).
///
/// Ids are opaque UUID-like strings assigned by the remote service.
///
/// # Examples
///
/// ```
/// use polygen_core::SpecId;
///
/// let id = SpecId::new("f7588018-2364-4586-b60d-b08a285f1ea3");
/// assert_eq!(id.as_str(), "f7588018-2364-4586-b60d-b08a285f1ea3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SpecId(String);

impl SpecId {
    /// Creates a new spec identifier.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `SpecId` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SpecId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SpecId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Top-level section of the generated package.
///
/// Each section is a directory directly under the package root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Remote functions (`poly/`)
    Functions,
    /// Server variables (`vari/`)
    Variables,
    /// Schema type declarations (`schemas/`)
    Schemas,
    /// Tables (`tabi/`)
    Tables,
}

impl Section {
    /// All sections, in the order their directories are created.
    pub const ALL: [Self; 4] = [Self::Functions, Self::Variables, Self::Schemas, Self::Tables];

    /// Directory name of the section.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_core::Section;
    ///
    /// assert_eq!(Section::Variables.as_str(), "vari");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Functions => "poly",
            Self::Variables => "vari",
            Self::Schemas => "schemas",
            Self::Tables => "tabi",
        }
    }

    /// Looks up a section by its directory name.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dotted namespace path such as `poly.billing.invoices.create`.
///
/// The first segment is always a [`Section`] directory, the last segment is
/// the leaf declaration and everything in between is the context. Segments
/// are never empty and never contain path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacePath {
    section: Section,
    segments: Vec<String>,
}

impl NamespacePath {
    /// Builds a path from a section, a dotted context (possibly empty) and a
    /// leaf name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the name is empty or any segment
    /// contains a path separator or is `.`/`..`.
    pub fn new(section: Section, context: &str, name: &str) -> Result<Self> {
        let mut segments: Vec<String> = context
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        segments.push(name.trim().to_string());
        Self::from_segments(section, segments)
    }

    /// Parses a full dotted path whose first segment names the section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for an unknown section, a path with
    /// no leaf, or an invalid segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_core::{NamespacePath, Section};
    ///
    /// let path = NamespacePath::parse("vari.shared.apiToken").unwrap();
    /// assert_eq!(path.section(), Section::Variables);
    /// assert_eq!(path.context(), "shared");
    /// assert!(NamespacePath::parse("nope.x").is_err());
    /// ```
    pub fn parse(dotted: &str) -> Result<Self> {
        let mut parts = dotted.split('.');
        let head = parts.next().unwrap_or_default();
        let section = Section::from_dir_name(head).ok_or_else(|| Error::ValidationError {
            field: "namespace_path".to_string(),
            reason: format!("'{dotted}' does not start with a known section"),
        })?;
        let segments = parts.map(ToString::to_string).collect();
        Self::from_segments(section, segments)
    }

    fn from_segments(section: Section, segments: Vec<String>) -> Result<Self> {
        if segments.is_empty() || segments.last().is_some_and(String::is_empty) {
            return Err(Error::ValidationError {
                field: "namespace_path".to_string(),
                reason: "path has no leaf name".to_string(),
            });
        }
        for segment in &segments {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['/', '\\'])
            {
                return Err(Error::ValidationError {
                    field: "namespace_path".to_string(),
                    reason: format!("invalid path segment '{segment}'"),
                });
            }
        }
        Ok(Self { section, segments })
    }

    /// Section this path lives in.
    #[must_use]
    pub const fn section(&self) -> Section {
        self.section
    }

    /// Leaf declaration name.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Context segments between the section and the leaf.
    #[must_use]
    pub fn context_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Dotted context, empty for top-level declarations.
    #[must_use]
    pub fn context(&self) -> String {
        self.context_segments().join(".")
    }

    /// Directory names from the package root down to the leaf's parent,
    /// section directory first.
    #[must_use]
    pub fn directories(&self) -> Vec<&str> {
        std::iter::once(self.section.as_str())
            .chain(self.context_segments().iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section.as_str())?;
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}
