//! Rendering pipeline for the Poly Python SDK generator.
//!
//! Turns specs into Python source using Handlebars templates. The pipeline,
//! leaf first:
//!
//! - [`python`] / [`escape`]: identifier rules and the single escaping module
//! - [`schema`]: JSON Schema to `TypedDict` declarations, total by contract
//! - [`type_mapper`]: `PropertyType` to a type expression plus definitions
//! - [`arguments`]: parameter lists and collected type definitions
//! - [`render`]: one body renderer per spec category
//! - [`resolver`]: poly-ref substitution run before rendering
//!
//! # Examples
//!
//! ```
//! use polygen_codegen::{SchemaRenderer, SpecRenderer};
//! use polygen_core::SpecificationDto;
//! use serde_json::json;
//!
//! let renderer = SpecRenderer::new("polyapi", SchemaRenderer::builtin()).unwrap();
//! let spec: SpecificationDto = serde_json::from_value(json!({
//!     "id": "f7588018-2364-4586-b60d",
//!     "context": "weather",
//!     "name": "getLocation",
//!     "type": "serverFunction",
//!     "function": {
//!         "arguments": [{"name": "locationId", "type": {"kind": "primitive", "type": "integer"}}],
//!         "returnType": {"kind": "void"}
//!     }
//! })).unwrap();
//!
//! let rendered = renderer.render(&spec).unwrap();
//! assert!(rendered.source.contains("locationId: int,"));
//! assert!(rendered.source.contains("-> None"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod arguments;
pub mod escape;
pub mod python;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod template_engine;
pub mod type_mapper;
pub mod types;

pub use render::SpecRenderer;
pub use resolver::{ResolveError, ResolveOutcome, SchemaIndex};
pub use schema::{CommandEngine, EngineError, SchemaEngine, SchemaRenderer, TypedDictEngine};
pub use type_mapper::TypeMapper;
pub use types::{GeneratedFile, RenderedSpec, TypeResolution};
