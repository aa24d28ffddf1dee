//! Package tree writer and generation driver for the Poly Python SDK.
//!
//! Takes rendered specs from `polygen-codegen` and lays them out as an
//! importable Python package:
//!
//! ```text
//! polyapi/
//! ├── __init__.py          imports the sections
//! ├── runtime.py           HTTP helpers used by generated code
//! ├── specs.json           last fetched spec list
//! ├── poly/<context>/...   functions
//! ├── vari/<context>/...   variables
//! ├── schemas/<context>/.. schema declarations
//! └── tabi/<context>/...   tables
//! ```
//!
//! Writes are atomic per file (temp file, then rename) and all-or-nothing
//! per spec through a [`Transaction`] log.
//!
//! # Examples
//!
//! ```no_run
//! use polygen_codegen::{SchemaRenderer, SpecRenderer};
//! use polygen_files::{FileSpecSource, GenerateOptions, LibraryGenerator};
//!
//! # async fn run() -> polygen_core::Result<()> {
//! let renderer = SpecRenderer::new("polyapi", SchemaRenderer::builtin())?;
//! let source = FileSpecSource::from_path("fixtures/specs.json");
//! let generator = LibraryGenerator::new(source, renderer, "polyapi")?;
//!
//! let summary = generator.generate(&GenerateOptions::default()).await?;
//! println!("generated {} specs", summary.generated());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod batch;
pub mod cache;
pub mod filesystem;
pub mod generator;
pub mod transaction;
pub mod types;
pub mod writer;

pub use batch::{BatchDriver, BatchFailure, BatchReport};
pub use cache::{CACHE_FILE, FileSpecSource, SpecCache};
pub use filesystem::{expand_tilde, join_relative, write_atomic};
pub use generator::{
    GenerateOptions, GenerationSummary, LibraryGenerator, clear_library, select_specs,
};
pub use transaction::Transaction;
pub use types::{FilesError, Result};
pub use writer::{AGGREGATOR, PackageWriter};
