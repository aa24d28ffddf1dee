//! Library generation.
//!
//! [`LibraryGenerator`] runs the whole pipeline: fetch, filter, cache,
//! resolve poly-refs, replace the old package and run the batch drivers.

use crate::batch::{BatchDriver, BatchReport};
use crate::cache::SpecCache;
use crate::filesystem::expand_tilde;
use crate::writer::PackageWriter;
use polygen_codegen::{SchemaIndex, SpecRenderer};
use polygen_core::traits::{SpecQuery, SpecSource};
use polygen_core::{Error, Result, SpecType, SpecificationDto};
use std::path::{Path, PathBuf};

/// Parameters of one `generate` run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Filter forwarded to the spec source and enforced locally.
    pub query: SpecQuery,
    /// Base URL baked into the generated `runtime.py`.
    pub default_base_url: String,
}

/// What a `generate` run produced.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    /// Package root that was written.
    pub root: PathBuf,
    /// Specs returned by the source.
    pub fetched: usize,
    /// Specs kept after local filtering.
    pub selected: usize,
    /// Specs dropped during poly-ref resolution.
    pub dropped: Vec<String>,
    /// One report per batch, in generation order.
    pub reports: Vec<BatchReport>,
}

impl GenerationSummary {
    /// Specs written across all batches.
    #[must_use]
    pub fn generated(&self) -> usize {
        self.reports.iter().map(|r| r.generated.len()).sum()
    }

    /// Specs that failed across all batches.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum()
    }

    /// Returns `true` if no spec failed or was dropped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.dropped.is_empty()
    }
}

/// Drives generation of the Python package from a [`SpecSource`].
#[derive(Debug)]
pub struct LibraryGenerator<S> {
    source: S,
    renderer: SpecRenderer,
    writer: PackageWriter,
    cache: SpecCache,
}

impl<S: SpecSource> LibraryGenerator<S> {
    /// Creates a generator writing the package to `root`.
    ///
    /// A leading `~` in `root` is expanded to the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the section preambles fail to render.
    pub fn new(source: S, renderer: SpecRenderer, root: impl AsRef<Path>) -> Result<Self> {
        let root = expand_tilde(root.as_ref());
        let writer = PackageWriter::for_renderer(&root, &renderer)?;
        let cache = SpecCache::in_package(&root);
        Ok(Self {
            source,
            renderer,
            writer,
            cache,
        })
    }

    /// Package root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.writer.root()
    }

    /// Spec cache written by [`generate`](Self::generate).
    #[must_use]
    pub const fn cache(&self) -> &SpecCache {
        &self.cache
    }

    /// Regenerates the package.
    ///
    /// Nothing on disk changes when the source returns no usable specs.
    /// Once writing starts, individual spec failures are reported in the
    /// summary instead of aborting the run.
    ///
    /// # Errors
    ///
    /// Returns the source's error if fetching fails,
    /// [`Error::ResourceNotFound`] when no spec survives filtering, or an
    /// I/O error if the package skeleton or the cache cannot be written.
    pub async fn generate(&self, options: &GenerateOptions) -> Result<GenerationSummary> {
        tracing::info!(source = %self.source.describe(), root = %self.root().display(), "Fetching specs");
        let fetched = self.source.get_specs(&options.query).await?;
        let fetched_count = fetched.len();

        let specs = select_specs(fetched, &options.query);
        if specs.is_empty() {
            return Err(Error::ResourceNotFound {
                resource: format!("specs from {}", self.source.describe()),
            });
        }
        tracing::info!(fetched = fetched_count, selected = specs.len(), "Specs selected");

        self.writer.remove_old_library()?;
        self.writer
            .init_package(&self.renderer.package_files(&options.default_base_url)?)?;
        self.cache.write(&specs)?;

        let selected = specs.len();
        let index = SchemaIndex::from_specs(&specs);
        let outcome = index.apply(specs);

        let driver = BatchDriver::new(&self.renderer, &self.writer);
        let mut reports = vec![
            driver.generate_functions(&outcome.items),
            driver.generate_variables(&outcome.items),
        ];
        if !options.query.no_types {
            reports.push(driver.generate_schemas(&outcome.items));
        }
        reports.push(driver.generate_tables(&outcome.items));

        let summary = GenerationSummary {
            root: self.root().to_path_buf(),
            fetched: fetched_count,
            selected,
            dropped: outcome.dropped,
            reports,
        };
        tracing::info!(
            generated = summary.generated(),
            failed = summary.failed(),
            dropped = summary.dropped.len(),
            "Generation complete"
        );
        Ok(summary)
    }
}

/// Applies the local filters to a fetched spec list.
///
/// Keeps specs matching `query`, and drops `customFunction` specs whose
/// code is not Python.
#[must_use]
pub fn select_specs(specs: Vec<SpecificationDto>, query: &SpecQuery) -> Vec<SpecificationDto> {
    specs
        .into_iter()
        .filter(|spec| {
            if !query.matches(spec) {
                return false;
            }
            if spec.spec_type == SpecType::CustomFunction
                && !spec
                    .language
                    .as_deref()
                    .is_some_and(|lang| lang.eq_ignore_ascii_case("python"))
            {
                tracing::debug!(spec = %spec.qualified_name(), language = ?spec.language, "Skipping non-Python client function");
                return false;
            }
            true
        })
        .collect()
}

/// Removes a generated package's sections, root files and spec cache.
///
/// Returns the number of entries removed.
///
/// # Errors
///
/// Returns an I/O error if an existing entry cannot be removed.
pub fn clear_library(root: &Path) -> Result<usize> {
    let root = expand_tilde(root);
    let mut removed = PackageWriter::new(&root).remove_old_library()?;
    if SpecCache::in_package(&root).remove()? {
        removed += 1;
    }
    tracing::info!(root = %root.display(), removed, "Cleared generated library");
    Ok(removed)
}
