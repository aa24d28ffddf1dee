//! HTTP access to the Poly service.
//!
//! [`PolyClient`] wraps `reqwest` with bearer authentication and maps
//! transport and status failures onto [`polygen_core::Error`].
//! [`HttpSpecSource`] is the [`SpecSource`] used by `generate`.

use async_trait::async_trait;
use polygen_core::traits::{SpecQuery, SpecSource};
use polygen_core::{Error, GeneratorConfig, Result, SpecificationDto};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

/// Authenticated client for the Poly REST API.
#[derive(Debug, Clone)]
pub struct PolyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl PolyClient {
    /// Creates a client for `base_url` authenticating with `api_key`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Creates a client from the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] if the key or base URL is not
    /// configured, or [`Error::ConfigError`] for an invalid base URL.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let (key, url) = config.require_credentials()?;
        Ok(Self::new(url, key.clone()))
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API path.
    ///
    /// # Examples
    ///
    /// ```
    /// use polygen_cli::http::PolyClient;
    /// use secrecy::SecretString;
    ///
    /// let client = PolyClient::new("https://na1.polyapi.io/", SecretString::from("k"));
    /// assert_eq!(client.url("/specs"), "https://na1.polyapi.io/specs");
    /// ```
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends a GET request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceUnavailable`] on transport failure,
    /// [`Error::RemoteError`] for a non-success status and
    /// [`Error::SerializationError`] for a body that is not JSON.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");
        self.send(self.http.get(&url).query(query), &url).await
    }

    /// Sends a POST request with a JSON body and decodes the JSON response.
    ///
    /// An empty response body decodes to `Value::Null`.
    ///
    /// # Errors
    ///
    /// Same as [`get_json`](Self::get_json).
    pub async fn post_json<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");
        self.send(self.http.post(&url).json(body), &url).await
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<Value> {
        let unavailable = |e: reqwest::Error| Error::SourceUnavailable {
            endpoint: url.to_string(),
            source: Box::new(e),
        };
        let response = request
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(unavailable)?;
        let status = response.status();
        let body = response.text().await.map_err(unavailable)?;

        if !status.is_success() {
            return Err(Error::RemoteError {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// [`SpecSource`] reading `GET /specs`.
#[derive(Debug, Clone)]
pub struct HttpSpecSource {
    client: PolyClient,
}

impl HttpSpecSource {
    /// Creates a source using `client`.
    #[must_use]
    pub const fn new(client: PolyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpecSource for HttpSpecSource {
    async fn get_specs(&self, query: &SpecQuery) -> Result<Vec<SpecificationDto>> {
        let body = self.client.get_json("/specs", &query.query_pairs()).await?;
        let Value::Array(values) = body else {
            return Err(Error::SerializationError {
                message: format!("{} did not return a JSON array", self.describe()),
                source: None,
            });
        };

        let (mut specs, rejected) = SpecificationDto::parse_many(values);
        if !rejected.is_empty() {
            tracing::warn!(rejected = rejected.len(), "Some specs could not be parsed");
        }
        specs.retain(|spec| query.matches(spec));
        Ok(specs)
    }

    fn describe(&self) -> String {
        self.client.url("/specs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_credentials() {
        let config = GeneratorConfig::default();
        let err = PolyClient::from_config(&config).unwrap_err();
        assert!(err.is_missing_credentials());
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = GeneratorConfig {
            api_key: Some(SecretString::from("key")),
            api_base_url: Some("https://na1.polyapi.io/".to_string()),
            ..GeneratorConfig::default()
        };
        let client = PolyClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://na1.polyapi.io");
        assert_eq!(
            HttpSpecSource::new(client).describe(),
            "https://na1.polyapi.io/specs"
        );
    }
}
