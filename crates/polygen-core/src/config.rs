//! Configuration for the generator.
//!
//! Settings are resolved once at process start into a [`ConfigContext`] and
//! passed to every component that needs them. Precedence, lowest first:
//! built-in defaults, the TOML file, environment variables, then whatever the
//! CLI applies through [`ConfigContext::config_mut`].
//!
//! # Examples
//!
//! ```
//! use polygen_core::ConfigContext;
//! use std::collections::HashMap;
//!
//! let env = HashMap::from([
//!     ("POLY_API_KEY", "secret-key"),
//!     ("POLY_API_BASE_URL", "https://na1.polyapi.io"),
//! ]);
//! let ctx = ConfigContext::load_with(None, |k| env.get(k).map(ToString::to_string)).unwrap();
//!
//! assert_eq!(ctx.config().api_base_url.as_deref(), Some("https://na1.polyapi.io"));
//! assert!(ctx.config().require_credentials().is_ok());
//! ```

use crate::{Error, Result};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "POLY_API_KEY";
/// Environment variable holding the API base URL.
pub const ENV_API_BASE_URL: &str = "POLY_API_BASE_URL";
/// Environment variable overriding the output directory.
pub const ENV_OUTPUT_DIR: &str = "POLY_OUTPUT_DIR";

static TENANT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(na[1-2]|eu[1-2]|dev)\.polyapi\.io/?$").expect("valid regex")
});
static LOCAL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(localhost|127\.0\.0\.1)(:\d+)?/?$").expect("valid regex")
});
static ANY_HTTPS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://[^\s/]+(/\S*)?$").expect("valid regex"));

/// Returns `true` if `url` is an accepted API base URL.
///
/// Local development hosts are always accepted over http or https. Hosted
/// tenants must be one of the known regions unless `allow_custom_hosts`
/// is set, in which case any https URL is accepted.
///
/// # Examples
///
/// ```
/// use polygen_core::is_valid_api_url;
///
/// assert!(is_valid_api_url("https://na1.polyapi.io", false));
/// assert!(is_valid_api_url("http://localhost:8000", false));
/// assert!(!is_valid_api_url("https://example.com", false));
/// assert!(is_valid_api_url("https://example.com", true));
/// assert!(!is_valid_api_url("http://example.com", true));
/// ```
#[must_use]
pub fn is_valid_api_url(url: &str, allow_custom_hosts: bool) -> bool {
    LOCAL_URL.is_match(url)
        || TENANT_URL.is_match(url)
        || (allow_custom_hosts && ANY_HTTPS_URL.is_match(url))
}

/// On-disk representation of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_engine: Option<Vec<String>>,
    allow_custom_hosts: bool,
}

/// Resolved generator settings.
#[derive(Debug)]
pub struct GeneratorConfig {
    /// API key used as a bearer token.
    pub api_key: Option<SecretString>,

    /// Base URL of the tenant, e.g. `https://na1.polyapi.io`.
    pub api_base_url: Option<String>,

    /// Directory the Python package is generated into.
    ///
    /// Default: `./polyapi`
    pub output_dir: PathBuf,

    /// Importable name of the generated package.
    ///
    /// Default: `polyapi`
    pub package_name: String,

    /// External schema engine command line. `None` selects the built-in
    /// `TypedDict` engine.
    pub schema_engine: Option<Vec<String>>,

    /// Accept any https base URL instead of the known tenant regions.
    pub allow_custom_hosts: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: None,
            output_dir: PathBuf::from("polyapi"),
            package_name: "polyapi".to_string(),
            schema_engine: None,
            allow_custom_hosts: false,
        }
    }
}

impl GeneratorConfig {
    /// Returns the API key and base URL, or the first missing one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] when either value is absent and
    /// [`Error::ConfigError`] when the base URL is not an accepted URL.
    pub fn require_credentials(&self) -> Result<(&SecretString, &str)> {
        let key = self.api_key.as_ref().ok_or_else(|| Error::MissingCredentials {
            field: format!("api_key ({ENV_API_KEY})"),
        })?;
        let url = self
            .api_base_url
            .as_deref()
            .ok_or_else(|| Error::MissingCredentials {
                field: format!("api_base_url ({ENV_API_BASE_URL})"),
            })?;
        self.validate()?;
        Ok((key, url.trim_end_matches('/')))
    }

    /// Validates the settings that have a fixed format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for an unaccepted base URL or an empty
    /// package name.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api_base_url
            && !is_valid_api_url(url, self.allow_custom_hosts)
        {
            return Err(Error::ConfigError {
                message: format!(
                    "'{url}' is not a valid API base URL (expected https://<region>.polyapi.io or a localhost URL)"
                ),
            });
        }
        if self.package_name.is_empty()
            || !self
                .package_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::ConfigError {
                message: format!("'{}' is not a valid package name", self.package_name),
            });
        }
        Ok(())
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(key) = file.api_key {
            self.api_key = Some(SecretString::from(key));
        }
        if file.api_base_url.is_some() {
            self.api_base_url = file.api_base_url;
        }
        if let Some(dir) = file.output_dir {
            self.output_dir = dir;
        }
        if let Some(name) = file.package_name {
            self.package_name = name;
        }
        if file.schema_engine.is_some() {
            self.schema_engine = file.schema_engine;
        }
        self.allow_custom_hosts = file.allow_custom_hosts;
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(key) = env(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = Some(SecretString::from(key));
        }
        if let Some(url) = env(ENV_API_BASE_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(dir) = env(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
    }

    fn to_file(&self) -> ConfigFile {
        ConfigFile {
            api_key: self
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().to_string()),
            api_base_url: self.api_base_url.clone(),
            output_dir: Some(self.output_dir.clone()),
            package_name: Some(self.package_name.clone()),
            schema_engine: self.schema_engine.clone(),
            allow_custom_hosts: self.allow_custom_hosts,
        }
    }
}

/// The configuration context object, constructed once per process.
///
/// Holds the resolved [`GeneratorConfig`] together with where it came from,
/// so it can be re-read ([`reload`](Self::reload)) or wiped
/// ([`clear`](Self::clear)) explicitly.
#[derive(Debug)]
pub struct ConfigContext {
    path: Option<PathBuf>,
    config: GeneratorConfig,
}

impl ConfigContext {
    /// Default location of the configuration file:
    /// `<config dir>/polygen/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("polygen").join("config.toml"))
    }

    /// Loads the configuration from `path` (if it exists) and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with(
        path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = GeneratorConfig::default();
        if let Some(path) = &path
            && let Some(file) = read_config_file(path)?
        {
            config.apply_file(file);
        }
        config.apply_env(&env);
        tracing::debug!(
            path = ?path,
            has_key = config.api_key.is_some(),
            base_url = ?config.api_base_url,
            "Configuration loaded"
        );
        Ok(Self { path, config })
    }

    /// Current settings.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Mutable settings, used to apply CLI flag overrides.
    pub const fn config_mut(&mut self) -> &mut GeneratorConfig {
        &mut self.config
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-reads the file and the process environment, discarding overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::load(self.path.clone())?;
        Ok(())
    }

    /// Deletes the stored file and resets every setting to its default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be removed.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(path) = &self.path
            && path.exists()
        {
            std::fs::remove_file(path).map_err(|e| Error::io(path, e))?;
            tracing::info!(path = %path.display(), "Removed stored configuration");
        }
        self.config = GeneratorConfig::default();
        Ok(())
    }

    /// Writes the current settings to the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if there is no backing path, or
    /// [`Error::Io`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or_else(|| Error::ConfigError {
            message: "no configuration file location available".to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let contents =
            toml::to_string_pretty(&self.config.to_file()).map_err(|e| Error::ConfigError {
                message: format!("failed to serialize configuration: {e}"),
            })?;
        std::fs::write(path, contents).map_err(|e| Error::io(path, e))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| Error::ConfigError {
            message: format!("failed to parse {}: {e}", path.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.package_name, "polyapi");
        assert_eq!(config.output_dir, PathBuf::from("polyapi"));
        assert!(config.schema_engine.is_none());
    }

    #[test]
    fn test_missing_credentials() {
        let ctx = ConfigContext::load_with(None, no_env).unwrap();
        let err = ctx.config().require_credentials().unwrap_err();
        assert!(err.is_missing_credentials());
        assert!(err.to_string().contains("POLY_API_KEY"));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_key = \"from-file\"\napi_base_url = \"https://eu1.polyapi.io\"\n",
        )
        .unwrap();

        let env = HashMap::from([(ENV_API_BASE_URL, "http://localhost:8000")]);
        let ctx =
            ConfigContext::load_with(Some(path), |k| env.get(k).map(ToString::to_string)).unwrap();

        let (key, url) = ctx.config().require_credentials().unwrap();
        assert_eq!(key.expose_secret(), "from-file");
        assert_eq!(url, "http://localhost:8000");
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let env = HashMap::from([
            (ENV_API_KEY, "k"),
            (ENV_API_BASE_URL, "https://evil.example.com"),
        ]);
        let ctx = ConfigContext::load_with(None, |k| env.get(k).map(ToString::to_string)).unwrap();
        assert!(ctx.config().require_credentials().unwrap_err().is_config_error());
    }

    #[test]
    fn test_save_and_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut ctx = ConfigContext::load_with(Some(path.clone()), no_env).unwrap();
        ctx.config_mut().api_key = Some(SecretString::from("abc".to_string()));
        ctx.config_mut().api_base_url = Some("https://na2.polyapi.io".to_string());
        ctx.save().unwrap();

        let reloaded = ConfigContext::load_with(Some(path.clone()), no_env).unwrap();
        assert_eq!(
            reloaded.config().api_base_url.as_deref(),
            Some("https://na2.polyapi.io")
        );

        ctx.clear().unwrap();
        assert!(!path.exists());
        assert!(ctx.config().api_key.is_none());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_key = [").unwrap();
        let err = ConfigContext::load_with(Some(path), no_env).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_package_name() {
        let config = GeneratorConfig {
            package_name: "my-package".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
