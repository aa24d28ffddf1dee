//! Local spec cache (`specs.json`).
//!
//! Each `generate` run overwrites the cache with the filtered spec list.
//! Auxiliary commands read it back through [`FileSpecSource`] instead of
//! fetching again.

use crate::filesystem::write_atomic;
use crate::types::{FilesError, Result};
use async_trait::async_trait;
use polygen_core::traits::{SpecQuery, SpecSource};
use polygen_core::SpecificationDto;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the cache inside the package root.
pub const CACHE_FILE: &str = "specs.json";

/// Handle to a `specs.json` file.
///
/// # Examples
///
/// ```
/// use polygen_files::SpecCache;
/// use tempfile::TempDir;
///
/// let root = TempDir::new().unwrap();
/// let cache = SpecCache::in_package(root.path());
/// assert!(!cache.exists());
/// cache.write(&[]).unwrap();
/// assert!(cache.read().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCache {
    path: PathBuf,
}

impl SpecCache {
    /// Cache at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at `<root>/specs.json`.
    #[must_use]
    pub fn in_package(root: &Path) -> Self {
        Self::new(root.join(CACHE_FILE))
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the cache file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces the cache with `specs`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::IoError`] if the directory cannot be created or
    /// the file cannot be written.
    pub fn write(&self, specs: &[SpecificationDto]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| FilesError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(specs).map_err(|source| FilesError::CacheFormat {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), count = specs.len(), "Spec cache written");
        Ok(())
    }

    /// Reads the cached specs.
    ///
    /// Entries that no longer parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::IoError`] if the file cannot be read and
    /// [`FilesError::CacheFormat`] if it is not a JSON array.
    pub fn read(&self) -> Result<Vec<SpecificationDto>> {
        let raw = fs::read_to_string(&self.path).map_err(|e| FilesError::io(&self.path, e))?;
        let values: Vec<Value> =
            serde_json::from_str(&raw).map_err(|source| FilesError::CacheFormat {
                path: self.path.clone(),
                source,
            })?;
        let (specs, rejected) = SpecificationDto::parse_many(values);
        if !rejected.is_empty() {
            tracing::warn!(
                path = %self.path.display(),
                rejected = rejected.len(),
                "Skipped unreadable cache entries"
            );
        }
        Ok(specs)
    }

    /// Deletes the cache file. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::IoError`] if an existing file cannot be removed.
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FilesError::io(&self.path, e)),
        }
    }
}

/// [`SpecSource`] backed by a spec cache.
#[derive(Debug, Clone)]
pub struct FileSpecSource {
    cache: SpecCache,
}

impl FileSpecSource {
    /// Reads specs from `cache`.
    #[must_use]
    pub const fn new(cache: SpecCache) -> Self {
        Self { cache }
    }

    /// Reads specs from a JSON file at `path`.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(SpecCache::new(path))
    }
}

#[async_trait]
impl SpecSource for FileSpecSource {
    async fn get_specs(&self, query: &SpecQuery) -> polygen_core::Result<Vec<SpecificationDto>> {
        let mut specs = self.cache.read()?;
        specs.retain(|spec| query.matches(spec));
        Ok(specs)
    }

    fn describe(&self) -> String {
        format!("file {}", self.cache.path().display())
    }
}
