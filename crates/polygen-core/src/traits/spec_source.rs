//! Spec source trait.
//!
//! The generator treats the remote service purely as a data source. This
//! module defines that seam and the filter passed through it.

use crate::{Result, SchemaSpecDto, SpecType, SpecificationDto};
use async_trait::async_trait;

/// Filter applied to a spec fetch.
///
/// Empty lists mean "no restriction". Schema specs are reference targets
/// for other specs, so only the context filter applies to them.
///
/// # Examples
///
/// ```
/// use polygen_core::traits::SpecQuery;
///
/// let query = SpecQuery {
///     contexts: vec!["billing".to_string()],
///     ..SpecQuery::default()
/// };
/// assert!(query.matches_context("billing.invoices"));
/// assert!(!query.matches_context("billingx"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecQuery {
    /// Context prefixes to include.
    pub contexts: Vec<String>,
    /// Leaf names to include.
    pub names: Vec<String>,
    /// Spec ids to include.
    pub function_ids: Vec<String>,
    /// Ask the source to omit type information and skip schema generation.
    pub no_types: bool,
}

impl SpecQuery {
    /// Returns `true` if `context` equals one of the context filters or is
    /// nested below one.
    #[must_use]
    pub fn matches_context(&self, context: &str) -> bool {
        self.contexts.is_empty()
            || self.contexts.iter().any(|wanted| {
                context == wanted
                    || context
                        .strip_prefix(wanted.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
    }

    /// Returns `true` if the spec passes every filter.
    #[must_use]
    pub fn matches(&self, spec: &SpecificationDto) -> bool {
        if !self.matches_context(&spec.context) {
            return false;
        }
        if spec.spec_type == SpecType::Schema {
            return true;
        }
        (self.names.is_empty() || self.names.iter().any(|n| n == &spec.name))
            && (self.function_ids.is_empty()
                || self.function_ids.iter().any(|id| id == spec.id.as_str()))
    }

    /// Query-string parameters understood by the remote `/specs` endpoint.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.contexts.is_empty() {
            pairs.push(("contexts", self.contexts.join(",")));
        }
        if !self.names.is_empty() {
            pairs.push(("names", self.names.join(",")));
        }
        if !self.function_ids.is_empty() {
            pairs.push(("ids", self.function_ids.join(",")));
        }
        if self.no_types {
            pairs.push(("noTypes", "true".to_string()));
        }
        pairs
    }
}

/// Source of specs.
///
/// Implementations must apply [`SpecQuery::matches`] to what they return,
/// whether or not the backing service already filtered.
///
/// # Examples
///
/// ```
/// use polygen_core::traits::{SpecQuery, SpecSource};
/// use polygen_core::{Result, SpecificationDto};
/// use async_trait::async_trait;
///
/// struct Empty;
///
/// #[async_trait]
/// impl SpecSource for Empty {
///     async fn get_specs(&self, _query: &SpecQuery) -> Result<Vec<SpecificationDto>> {
///         Ok(Vec::new())
///     }
///
///     fn describe(&self) -> String {
///         "empty".to_string()
///     }
/// }
/// ```
#[async_trait]
pub trait SpecSource: Send + Sync {
    /// Fetches the specs matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached or answers with an
    /// error status. Individual malformed specs are skipped, not errors.
    async fn get_specs(&self, query: &SpecQuery) -> Result<Vec<SpecificationDto>>;

    /// Fetches all schema specs.
    ///
    /// # Errors
    ///
    /// Same as [`get_specs`](Self::get_specs).
    async fn get_schemas(&self) -> Result<Vec<SchemaSpecDto>> {
        let specs = self.get_specs(&SpecQuery::default()).await?;
        Ok(specs
            .iter()
            .filter(|s| s.spec_type == SpecType::Schema)
            .filter_map(|s| SchemaSpecDto::try_from(s).ok())
            .collect())
    }

    /// Human readable identity of the source for logs.
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(context: &str, name: &str, spec_type: &str) -> SpecificationDto {
        serde_json::from_value(json!({
            "id": format!("{context}-{name}"),
            "context": context,
            "name": name,
            "type": spec_type,
        }))
        .unwrap()
    }

    struct Fixed(Vec<SpecificationDto>);

    #[async_trait]
    impl SpecSource for Fixed {
        async fn get_specs(&self, query: &SpecQuery) -> Result<Vec<SpecificationDto>> {
            Ok(self.0.iter().filter(|s| query.matches(s)).cloned().collect())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    #[test]
    fn test_names_filter_keeps_schemas() {
        let query = SpecQuery {
            names: vec!["getPet".to_string()],
            ..SpecQuery::default()
        };
        assert!(query.matches(&spec("shop", "getPet", "apiFunction")));
        assert!(!query.matches(&spec("shop", "listPets", "apiFunction")));
        assert!(query.matches(&spec("shop", "Pet", "schema")));
    }

    #[test]
    fn test_query_pairs() {
        let query = SpecQuery {
            contexts: vec!["a".to_string(), "b.c".to_string()],
            no_types: true,
            ..SpecQuery::default()
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("contexts", "a,b.c".to_string()),
                ("noTypes", "true".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_default_get_schemas_filters_schema_specs() {
        let source = Fixed(vec![
            spec("shop", "Pet", "schema"),
            spec("shop", "getPet", "apiFunction"),
        ]);
        let schemas = source.get_schemas().await.unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].context_name, "shop.Pet");
    }
}
