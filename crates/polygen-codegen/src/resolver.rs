//! Reference Resolver: poly-ref substitution.
//!
//! A poly-ref is a map of the form `{"x-poly-ref": {"path": "<contextName>"}}`
//! standing for the schema spec with that context name. The resolver builds
//! an index of every schema spec, then replaces each marker with the
//! (recursively resolved) definition it names.
//!
//! Markers whose path is not in the index are left in place so the owning
//! spec can be reported and dropped by [`SchemaIndex::apply`].
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::SchemaIndex;
//! use polygen_core::{SchemaSpecDto, SpecId};
//! use serde_json::json;
//!
//! let index = SchemaIndex::build(&[SchemaSpecDto {
//!     id: SpecId::new("s1"),
//!     context: "shop".to_string(),
//!     name: "Pet".to_string(),
//!     context_name: "shop.Pet".to_string(),
//!     definition: json!({"type": "object", "title": "Pet"}),
//! }]);
//!
//! let resolved = index
//!     .resolve(&json!({"kind": "object", "schema": {"x-poly-ref": {"path": "shop.Pet"}}}))
//!     .unwrap();
//! assert_eq!(resolved["schema"]["title"], "Pet");
//! ```

use polygen_core::{Error, FunctionSpecification, SchemaSpecDto, SpecType, SpecificationDto};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Key of the poly-ref marker.
pub const POLY_REF_KEY: &str = "x-poly-ref";

/// Maximum nesting depth the resolver walks.
pub const MAX_RESOLVE_DEPTH: usize = 128;

/// Failure to resolve a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A schema references itself, directly or through other schemas.
    #[error("poly-ref cycle through '{path}'")]
    Cycle {
        /// Context name at which the cycle closed
        path: String,
    },

    /// The tree nests deeper than [`MAX_RESOLVE_DEPTH`].
    #[error("poly-ref resolution exceeded depth {limit}")]
    DepthExceeded {
        /// The depth limit
        limit: usize,
    },

    /// A marker or a resolved spec has the wrong shape.
    #[error("malformed poly-ref: {reason}")]
    Malformed {
        /// What was wrong
        reason: String,
    },
}

/// Specs surviving resolution plus the identities of dropped ones.
#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    /// Resolved specs, in input order.
    pub items: Vec<SpecificationDto>,
    /// `context.name (id)` of every dropped spec.
    pub dropped: Vec<String>,
}

impl ResolveOutcome {
    /// Number of dropped specs.
    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Index from schema context name to schema definition.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    schemas: HashMap<String, Value>,
}

impl SchemaIndex {
    /// Builds the index from schema specs.
    ///
    /// Later entries win when two schemas share a context name.
    #[must_use]
    pub fn build(schemas: &[SchemaSpecDto]) -> Self {
        let schemas = schemas
            .iter()
            .map(|s| (s.context_name.clone(), s.definition.clone()))
            .collect();
        Self { schemas }
    }

    /// Builds the index from the `schema` specs of a mixed spec list.
    #[must_use]
    pub fn from_specs(specs: &[SpecificationDto]) -> Self {
        let schemas: Vec<SchemaSpecDto> = specs
            .iter()
            .filter(|s| s.spec_type == SpecType::Schema)
            .filter_map(|s| SchemaSpecDto::try_from(s).ok())
            .collect();
        Self::build(&schemas)
    }

    /// Number of indexed schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no schema is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Definition indexed under `context_name`.
    #[must_use]
    pub fn get(&self, context_name: &str) -> Option<&Value> {
        self.schemas.get(context_name)
    }

    /// Returns a copy of `value` with every resolvable marker substituted.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] on a reference cycle, a malformed marker or
    /// excessive nesting.
    pub fn resolve(&self, value: &Value) -> Result<Value, ResolveError> {
        let mut stack = Vec::new();
        self.resolve_at(value, &mut stack, 0)
    }

    fn resolve_at(
        &self,
        value: &Value,
        stack: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        if depth > MAX_RESOLVE_DEPTH {
            return Err(ResolveError::DepthExceeded {
                limit: MAX_RESOLVE_DEPTH,
            });
        }
        match value {
            Value::Object(map) => {
                if let Some(marker) = map.get(POLY_REF_KEY) {
                    return self.substitute(value, marker, stack, depth);
                }
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    out.insert(key.clone(), self.resolve_at(child, stack, depth + 1)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_at(item, stack, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            scalar => Ok(scalar.clone()),
        }
    }

    fn substitute(
        &self,
        original: &Value,
        marker: &Value,
        stack: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        let path = marker
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::Malformed {
                reason: format!("marker without a string path: {marker}"),
            })?;

        let Some(target) = self.schemas.get(path) else {
            return Ok(original.clone());
        };
        if stack.iter().any(|p| p == path) {
            return Err(ResolveError::Cycle {
                path: path.to_string(),
            });
        }

        stack.push(path.to_string());
        let resolved = self.resolve_at(target, stack, depth + 1);
        stack.pop();
        resolved
    }

    /// Resolves every spec, dropping the ones that cannot be rendered.
    ///
    /// Function and schema specs are dropped when resolution fails or a
    /// marker stays unresolved. Variables and tables are dropped only when
    /// resolution fails; leftover markers degrade to fallback types later.
    #[must_use]
    pub fn apply(&self, specs: Vec<SpecificationDto>) -> ResolveOutcome {
        let mut outcome = ResolveOutcome {
            items: Vec::with_capacity(specs.len()),
            dropped: Vec::new(),
        };
        for spec in specs {
            let identity = format!("{} ({})", spec.qualified_name(), spec.id);
            match self.resolve_spec(spec) {
                Ok(resolved) => outcome.items.push(resolved),
                Err(err) => {
                    tracing::warn!(spec = %identity, error = %err, "Dropping spec with unresolvable references");
                    outcome.dropped.push(identity);
                }
            }
        }
        if !outcome.dropped.is_empty() {
            tracing::warn!(
                dropped = outcome.dropped_count(),
                "Some specs were dropped during poly-ref resolution"
            );
        }
        outcome
    }

    fn resolve_spec(&self, mut spec: SpecificationDto) -> polygen_core::Result<SpecificationDto> {
        let strict = spec.spec_type.is_function() || spec.spec_type == SpecType::Schema;
        let qualified = spec.qualified_name();
        let render_error = |err: ResolveError| Error::RenderError {
            spec: qualified.clone(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        };

        if let Some(function) = spec.function.take() {
            let value = serde_json::to_value(&function)?;
            let resolved = self.resolve(&value).map_err(render_error)?;
            require_resolved(&resolved, strict)?;
            let function: FunctionSpecification =
                serde_json::from_value(resolved).map_err(|e| {
                    render_error(ResolveError::Malformed {
                        reason: e.to_string(),
                    })
                })?;
            spec.function = Some(function);
        }

        for slot in [&mut spec.definition, &mut spec.schema] {
            if let Some(value) = slot.take() {
                let resolved = self.resolve(&value).map_err(render_error)?;
                require_resolved(&resolved, strict)?;
                *slot = Some(resolved);
            }
        }

        if let Some(variable) = spec.variable.as_mut() {
            let value = serde_json::to_value(&variable.value_type)?;
            let resolved = self.resolve(&value).map_err(render_error)?;
            variable.value_type = serde_json::from_value(resolved)?;
        }

        Ok(spec)
    }
}

fn require_resolved(value: &Value, strict: bool) -> polygen_core::Result<()> {
    if !strict {
        return Ok(());
    }
    match unresolved_paths(value).into_iter().next() {
        Some(path) => Err(Error::UnresolvedReference { path }),
        None => Ok(()),
    }
}

/// Paths of every marker still present in `value`, in document order.
///
/// # Examples
///
/// ```
/// use polygen_codegen::resolver::unresolved_paths;
/// use serde_json::json;
///
/// let tree = json!({"a": [{"x-poly-ref": {"path": "shop.Missing"}}]});
/// assert_eq!(unresolved_paths(&tree), vec!["shop.Missing".to_string()]);
/// ```
#[must_use]
pub fn unresolved_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_markers(value, &mut paths);
    paths
}

fn collect_markers(value: &Value, paths: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(marker) = map.get(POLY_REF_KEY) {
                let path = marker.get("path").and_then(Value::as_str).unwrap_or("?");
                paths.push(path.to_string());
                return;
            }
            map.values().for_each(|child| collect_markers(child, paths));
        }
        Value::Array(items) => items.iter().for_each(|item| collect_markers(item, paths)),
        _ => {}
    }
}
