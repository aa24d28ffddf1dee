//! CLI-specific types shared by the binary and its tests.
//!
//! # Examples
//!
//! ```
//! use polygen_core::cli::{ExitCode, FunctionPath, OutputFormat};
//!
//! let format: OutputFormat = "json".parse().unwrap();
//! assert_eq!(format, OutputFormat::Json);
//!
//! assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
//!
//! let path = FunctionPath::new("billing.invoices.create").unwrap();
//! assert_eq!(path.context(), "billing.invoices");
//! assert_eq!(path.name(), "create");
//! ```

use std::fmt;
use std::str::FromStr;

/// CLI output format.
///
/// All formats carry the same information with different presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// JSON output for machine parsing
    Json,
    /// Plain text output for scripts
    Text,
    /// Pretty-printed output with colors for human reading
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Returns the string representation of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => Err(crate::Error::InvalidArgument(format!(
                "invalid output format: '{s}' (expected: json, text, or pretty)"
            ))),
        }
    }
}

/// CLI exit code with semantic meaning.
///
/// # Examples
///
/// ```
/// use polygen_core::cli::ExitCode;
///
/// assert!(ExitCode::SUCCESS.is_success());
/// assert!(!ExitCode::from_i32(3).is_success());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Successful execution (exit code 0).
    pub const SUCCESS: Self = Self(0);

    /// General error (exit code 1).
    pub const ERROR: Self = Self(1);

    /// Invalid input, arguments or configuration (exit code 2).
    pub const INVALID_INPUT: Self = Self(2);

    /// Spec source or remote service error (exit code 3).
    pub const SERVER_ERROR: Self = Self(3);

    /// Creates an exit code from an integer value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    /// Returns the exit code as an integer.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Checks if the exit code represents success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated `context.name` reference to a generated function.
///
/// The last dotted segment is the function name; anything before it is the
/// context. Only identifier characters, `-` and `.` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionPath {
    context: String,
    name: String,
}

impl FunctionPath {
    /// Parses and validates a function reference.
    ///
    /// A leading `poly.` is accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] for empty input, empty
    /// segments or characters outside `[A-Za-z0-9_.-]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_core::cli::FunctionPath;
    ///
    /// let path = FunctionPath::new("poly.ping").unwrap();
    /// assert_eq!(path.context(), "");
    /// assert!(FunctionPath::new("a..b").is_err());
    /// assert!(FunctionPath::new("a;rm").is_err());
    /// ```
    pub fn new(value: &str) -> crate::Result<Self> {
        let trimmed = value.trim();
        let trimmed = trimmed.strip_prefix("poly.").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidArgument(
                "function path cannot be empty".to_string(),
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(crate::Error::InvalidArgument(format!(
                "function path '{value}' contains invalid characters"
            )));
        }
        if trimmed.split('.').any(str::is_empty) {
            return Err(crate::Error::InvalidArgument(format!(
                "function path '{value}' contains an empty segment"
            )));
        }
        let (context, name) = trimmed.rsplit_once('.').unwrap_or(("", trimmed));
        Ok(Self {
            context: context.to_string(),
            name: name.to_string(),
        })
    }

    /// Dotted context, empty for top-level functions.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for FunctionPath {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for FunctionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.context, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str_valid() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!(
            "Pretty".parse::<OutputFormat>().unwrap(),
            OutputFormat::Pretty
        );
    }

    #[test]
    fn test_output_format_from_str_invalid() {
        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("invalid output format"));
    }

    #[test]
    fn test_exit_code_constants() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::ERROR.as_i32(), 1);
        assert_eq!(ExitCode::INVALID_INPUT.as_i32(), 2);
        assert_eq!(ExitCode::SERVER_ERROR.as_i32(), 3);
        assert_eq!(i32::from(ExitCode::default()), 0);
    }

    #[test]
    fn test_function_path_display() {
        let path = FunctionPath::new("shop.orders.list").unwrap();
        assert_eq!(path.to_string(), "shop.orders.list");
        assert_eq!(FunctionPath::new("ping").unwrap().to_string(), "ping");
    }

    #[test]
    fn test_function_path_rejects_injection() {
        for bad in ["a b", "a/b", "$(x)", "a|b", "a\nb"] {
            assert!(FunctionPath::new(bad).is_err(), "{bad} should be rejected");
        }
    }
}
