//! Error types for the package writer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing the generated package.
///
/// # Examples
///
/// ```
/// use polygen_files::FilesError;
///
/// let err = FilesError::EmptyContent {
///     path: "poly.billing.getInvoice".to_string(),
/// };
/// assert!(err.is_empty_content());
/// assert!(err.to_string().contains("poly.billing.getInvoice"));
/// ```
#[derive(Error, Debug)]
pub enum FilesError {
    /// Upstream rendering produced no source for a leaf.
    #[error("Nothing to write for {path}: rendered source is empty")]
    EmptyContent {
        /// Dotted namespace path of the leaf
        path: String,
    },

    /// A path escapes the package root or has an unusable segment.
    #[error("Invalid package path {path}: {reason}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    IoError {
        /// Path involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The spec cache could not be encoded or decoded.
    #[error("Spec cache {} is unreadable: {source}", path.display())]
    CacheFormat {
        /// Location of the cache file
        path: PathBuf,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

impl FilesError {
    /// Returns `true` if the error is an empty-content rejection.
    #[must_use]
    pub const fn is_empty_content(&self) -> bool {
        matches!(self, Self::EmptyContent { .. })
    }

    /// Returns `true` if the error is an invalid path.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_files::FilesError;
    ///
    /// let err = FilesError::InvalidPath {
    ///     path: "../etc".to_string(),
    ///     reason: "parent traversal".to_string(),
    /// };
    /// assert!(err.is_invalid_path());
    /// assert!(!err.is_io_error());
    /// ```
    #[must_use]
    pub const fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }

    /// Returns `true` if the error is an I/O failure.
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::IoError { .. })
    }

    /// Returns `true` if the spec cache was malformed.
    #[must_use]
    pub const fn is_cache_format(&self) -> bool {
        matches!(self, Self::CacheFormat { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

impl From<FilesError> for polygen_core::Error {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::IoError { path, source } => Self::Io { path, source },
            FilesError::InvalidPath { path, reason } => Self::ValidationError {
                field: path,
                reason,
            },
            FilesError::EmptyContent { path } => Self::RenderError {
                spec: path,
                message: "rendered source is empty".to_string(),
                source: None,
            },
            FilesError::CacheFormat { path, source } => Self::SerializationError {
                message: format!("spec cache {} is unreadable", path.display()),
                source: Some(source),
            },
        }
    }
}

/// Result type for package writer operations.
pub type Result<T> = std::result::Result<T, FilesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts_to_core_io() {
        let err = FilesError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_io_error());
        let core: polygen_core::Error = err.into();
        assert!(matches!(core, polygen_core::Error::Io { .. }));
    }

    #[test]
    fn test_empty_content_converts_to_render_error() {
        let core: polygen_core::Error = FilesError::EmptyContent {
            path: "poly.a.b".to_string(),
        }
        .into();
        assert!(core.is_render_error());
    }
}
