//! Error types for the Poly Python SDK generator.
//!
//! This module provides one error hierarchy with contextual information
//! shared by every crate in the workspace.
//!
//! # Examples
//!
//! ```
//! use polygen_core::{Error, Result};
//!
//! fn require_base_url(url: &str) -> Result<()> {
//!     if url.is_empty() {
//!         return Err(Error::ConfigError {
//!             message: "API base URL cannot be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_base_url("").unwrap_err();
//! assert!(err.is_config_error());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the generator.
#[derive(Error, Debug)]
pub enum Error {
    /// The spec source could not be reached.
    ///
    /// Occurs when the HTTP request for specs fails before a response
    /// arrives (DNS, TLS, connection refused).
    #[error("Spec source unreachable: {endpoint}")]
    SourceUnavailable {
        /// URL or path of the spec source
        endpoint: String,
        /// Underlying error cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote service answered with a non-success status.
    #[error("Remote request failed with status {status}: {body}")]
    RemoteError {
        /// HTTP status code
        status: u16,
        /// Response body, decoded lossily
        body: String,
    },

    /// Authentication credentials are missing.
    ///
    /// Fatal for `generate`: without credentials no spec can be fetched.
    #[error("Missing credentials: {field} is not configured (run `polygen setup` or set the environment variable)")]
    MissingCredentials {
        /// The missing setting, e.g. `api_key`
        field: String,
    },

    /// Resource not found error.
    ///
    /// Occurs when a cached spec, config file or named function does not exist.
    #[error("Resource not found: {resource}")]
    ResourceNotFound {
        /// Identifier of the missing resource
        resource: String,
    },

    /// Configuration error.
    ///
    /// Raised when configuration is invalid, missing required fields,
    /// or contains contradictory settings.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Serialization/deserialization error.
    ///
    /// Raised when JSON or TOML conversion fails.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Validation error for domain types.
    ///
    /// Raised when constructing domain types like `NamespacePath` from
    /// values that do not satisfy their format requirements.
    #[error("Validation error in {field}: {reason}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Detailed reason for the validation failure
        reason: String,
    },

    /// A poly-ref points at a schema that is not in the index.
    #[error("Unresolved schema reference: {path}")]
    UnresolvedReference {
        /// Dotted context name of the missing schema
        path: String,
    },

    /// Rendering of one spec failed.
    #[error("Rendering failed for '{spec}': {message}")]
    RenderError {
        /// `context.name` of the spec being rendered
        spec: String,
        /// Description of the failure
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if the spec source could not be reached or answered
    /// with an error status.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_core::Error;
    ///
    /// let err = Error::RemoteError {
    ///     status: 500,
    ///     body: "boom".to_string(),
    /// };
    /// assert!(err.is_remote_error());
    /// ```
    #[must_use]
    pub const fn is_remote_error(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::RemoteError { .. }
        )
    }

    /// Returns `true` if credentials are missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_core::Error;
    ///
    /// let err = Error::MissingCredentials {
    ///     field: "api_key".to_string(),
    /// };
    /// assert!(err.is_missing_credentials());
    /// ```
    #[must_use]
    pub const fn is_missing_credentials(&self) -> bool {
        matches!(self, Self::MissingCredentials { .. })
    }

    /// Returns `true` if this is a resource not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "Invalid URL".to_string(),
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a validation error.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }

    /// Returns `true` if a poly-ref could not be resolved.
    #[must_use]
    pub const fn is_unresolved_reference(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }

    /// Returns `true` if this is a rendering error.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_core::Error;
    ///
    /// let err = Error::RenderError {
    ///     spec: "billing.createInvoice".to_string(),
    ///     message: "template failed".to_string(),
    ///     source: None,
    /// };
    /// assert!(err.is_render_error());
    /// ```
    #[must_use]
    pub const fn is_render_error(&self) -> bool {
        matches!(self, Self::RenderError { .. })
    }

    /// Convenience constructor for [`Error::Io`].
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Result type alias for generator operations.
///
/// # Examples
///
/// ```
/// use polygen_core::{Result, Error};
///
/// fn validate_count(count: usize) -> Result<usize> {
///     if count == 0 {
///         return Err(Error::ResourceNotFound {
///             resource: "specs".to_string(),
///         });
///     }
///     Ok(count)
/// }
///
/// assert!(validate_count(5).is_ok());
/// assert!(validate_count(0).is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;
