//! Package tree writer.
//!
//! Maps dotted namespace paths onto the directory tree of the generated
//! Python package. Every directory holds an aggregator (`__init__.py`) that
//! starts with its section's preamble, imports its child directories and
//! accumulates the leaf declarations rendered into it.

use crate::filesystem::join_relative;
use crate::transaction::Transaction;
use crate::types::{FilesError, Result};
use polygen_codegen::{GeneratedFile, RenderedSpec, SpecRenderer};
use polygen_core::Section;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of every directory aggregator.
pub const AGGREGATOR: &str = "__init__.py";

/// Root-level files owned by the generator besides the section directories.
const ROOT_FILES: &[&str] = &[AGGREGATOR, "runtime.py"];

/// Writes rendered specs into a package directory.
///
/// Each call to [`write`](Self::write) is all-or-nothing: the changes it
/// makes are recorded in a [`Transaction`] and rolled back if any step
/// fails.
///
/// # Examples
///
/// ```
/// use polygen_codegen::RenderedSpec;
/// use polygen_core::{NamespacePath, Section};
/// use polygen_files::PackageWriter;
/// use tempfile::TempDir;
///
/// let root = TempDir::new().unwrap();
/// let writer = PackageWriter::new(root.path())
///     .with_preamble(Section::Functions, "from typing import Any\n\n\n");
///
/// writer.write(&RenderedSpec {
///     path: NamespacePath::new(Section::Functions, "billing", "getInvoice").unwrap(),
///     source: "def getInvoice() -> Any:\n    pass\n".to_string(),
///     type_defs: String::new(),
/// }).unwrap();
///
/// let poly = std::fs::read_to_string(root.path().join("poly/__init__.py")).unwrap();
/// assert!(poly.contains("from . import billing"));
/// ```
#[derive(Debug, Clone)]
pub struct PackageWriter {
    root: PathBuf,
    preambles: HashMap<Section, String>,
}

impl PackageWriter {
    /// Creates a writer rooted at `root` with empty preambles.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            preambles: HashMap::new(),
        }
    }

    /// Creates a writer whose preambles come from `renderer`.
    ///
    /// # Errors
    ///
    /// Returns an error if a preamble template fails to render.
    pub fn for_renderer(
        root: impl Into<PathBuf>,
        renderer: &SpecRenderer,
    ) -> polygen_core::Result<Self> {
        let mut writer = Self::new(root);
        for section in Section::ALL {
            writer
                .preambles
                .insert(section, renderer.preamble(section)?);
        }
        Ok(writer)
    }

    /// Sets the text every new aggregator in `section` starts with.
    #[must_use]
    pub fn with_preamble(mut self, section: Section, preamble: impl Into<String>) -> Self {
        self.preambles.insert(section, preamble.into());
        self
    }

    /// Package root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn preamble(&self, section: Section) -> &str {
        self.preambles.get(&section).map_or("", String::as_str)
    }

    /// Writes the root files and an aggregator for every section.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidPath`] for a file path outside the
    /// package, or [`FilesError::IoError`] if a write fails. Nothing is left
    /// behind on failure.
    pub fn init_package(&self, files: &[GeneratedFile]) -> Result<()> {
        let mut tx = Transaction::new();
        let result = self.init_in(&mut tx, files);
        finish(tx, result)
    }

    fn init_in(&self, tx: &mut Transaction, files: &[GeneratedFile]) -> Result<()> {
        tx.create_dir_all(&self.root)?;
        for file in files {
            let path = join_relative(&self.root, &file.path)?;
            if let Some(parent) = path.parent() {
                tx.create_dir_all(parent)?;
            }
            tx.write_file(&path, &file.content)?;
        }
        for section in Section::ALL {
            self.ensure_aggregator(tx, &self.root.join(section.as_str()), section)?;
        }
        Ok(())
    }

    /// Removes every section directory and root file of a previous run.
    ///
    /// Returns how many entries were removed. Files the generator does not
    /// own, such as `specs.json`, are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::IoError`] if an existing entry cannot be
    /// removed.
    pub fn remove_old_library(&self) -> Result<usize> {
        let mut removed = 0;
        for section in Section::ALL {
            let dir = self.root.join(section.as_str());
            if dir.is_dir() {
                fs::remove_dir_all(&dir).map_err(|e| FilesError::io(&dir, e))?;
                removed += 1;
            }
        }
        for name in ROOT_FILES {
            let file = self.root.join(name);
            if file.is_file() {
                fs::remove_file(&file).map_err(|e| FilesError::io(&file, e))?;
                removed += 1;
            }
        }
        tracing::debug!(root = %self.root.display(), removed, "Removed previous library");
        Ok(removed)
    }

    /// Appends `from . import <child>` to `aggregator` unless it is already
    /// there.
    ///
    /// Returns `true` if the line was added.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::IoError`] if the aggregator cannot be read or
    /// written.
    pub fn add_import(&self, aggregator: &Path, child: &str) -> Result<bool> {
        let mut tx = Transaction::new();
        let result = append_import(&mut tx, aggregator, child);
        finish(tx, result)
    }

    /// Writes one rendered spec into the package.
    ///
    /// Creates the directories along the spec's path, links each one into
    /// its parent aggregator, appends the declaration to the aggregator of
    /// the leaf's directory and writes the companion `_<leaf>.py` module
    /// when the spec has type definitions.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::EmptyContent`] when the rendered source is
    /// empty, or the first I/O failure. On failure every change made by
    /// this call is rolled back.
    pub fn write(&self, rendered: &RenderedSpec) -> Result<()> {
        if rendered.is_empty() {
            return Err(FilesError::EmptyContent {
                path: rendered.path.to_string(),
            });
        }

        let mut tx = Transaction::new();
        let result = self.write_in(&mut tx, rendered);
        if let Err(err) = &result {
            tracing::debug!(path = %rendered.path, error = %err, "Rolling back partial write");
        }
        finish(tx, result)
    }

    fn write_in(&self, tx: &mut Transaction, rendered: &RenderedSpec) -> Result<()> {
        let section = rendered.path.section();
        let mut dir = self.root.clone();
        let mut parent: Option<PathBuf> = None;
        for segment in rendered.path.directories() {
            dir.push(segment);
            let aggregator = self.ensure_aggregator(tx, &dir, section)?;
            if let Some(parent) = &parent {
                append_import(tx, parent, segment)?;
            }
            parent = Some(aggregator);
        }

        let aggregator = dir.join(AGGREGATOR);
        let mut content = read_or_empty(&aggregator)?;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }

        if rendered.has_type_defs() {
            let module = format!("_{}", rendered.path.leaf());
            let import = format!("from . import {module}");
            if !content.lines().any(|line| line.trim_end() == import) {
                content.push_str(&import);
                content.push('\n');
            }
            tx.write_file(&dir.join(format!("{module}.py")), &rendered.type_defs)?;
        }

        content.push('\n');
        content.push_str(rendered.source.trim_end());
        content.push_str("\n\n");
        tx.write_file(&aggregator, &content)
    }

    fn ensure_aggregator(
        &self,
        tx: &mut Transaction,
        dir: &Path,
        section: Section,
    ) -> Result<PathBuf> {
        tx.create_dir_all(dir)?;
        let aggregator = dir.join(AGGREGATOR);
        if !aggregator.exists() {
            tx.write_file(&aggregator, self.preamble(section))?;
        }
        Ok(aggregator)
    }
}

fn append_import(tx: &mut Transaction, aggregator: &Path, child: &str) -> Result<bool> {
    let mut content = read_or_empty(aggregator)?;
    let line = format!("from . import {child}");
    if content.lines().any(|existing| existing.trim_end() == line) {
        return Ok(false);
    }
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&line);
    content.push('\n');
    tx.write_file(aggregator, &content)?;
    Ok(true)
}

fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(FilesError::io(path, e)),
    }
}

fn finish<T>(tx: Transaction, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit();
            Ok(value)
        }
        Err(err) => {
            tx.rollback();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polygen_core::NamespacePath;
    use tempfile::TempDir;

    const PREAMBLE: &str = "from typing import Any\n\n\n";

    fn writer(root: &Path) -> PackageWriter {
        PackageWriter::new(root).with_preamble(Section::Functions, PREAMBLE)
    }

    fn rendered(context: &str, leaf: &str, type_defs: &str) -> RenderedSpec {
        RenderedSpec {
            path: NamespacePath::new(Section::Functions, context, leaf).unwrap(),
            source: format!("def {leaf}() -> Any:\n    pass\n"),
            type_defs: type_defs.to_string(),
        }
    }

    #[test]
    fn test_add_import_is_idempotent() {
        let root = TempDir::new().unwrap();
        let aggregator = root.path().join(AGGREGATOR);
        fs::write(&aggregator, PREAMBLE).unwrap();

        let writer = writer(root.path());
        assert!(writer.add_import(&aggregator, "billing").unwrap());
        assert!(!writer.add_import(&aggregator, "billing").unwrap());

        let content = fs::read_to_string(&aggregator).unwrap();
        assert_eq!(content.matches("from . import billing").count(), 1);
    }

    #[test]
    fn test_write_links_every_directory() {
        let root = TempDir::new().unwrap();
        let writer = writer(root.path());
        writer.write(&rendered("billing.invoices", "create", "")).unwrap();
        writer.write(&rendered("billing.invoices", "void", "")).unwrap();

        let poly = fs::read_to_string(root.path().join("poly/__init__.py")).unwrap();
        assert!(poly.starts_with(PREAMBLE));
        assert_eq!(poly.matches("from . import billing").count(), 1);

        let billing = fs::read_to_string(root.path().join("poly/billing/__init__.py")).unwrap();
        assert_eq!(billing.matches("from . import invoices").count(), 1);

        let invoices =
            fs::read_to_string(root.path().join("poly/billing/invoices/__init__.py")).unwrap();
        assert!(invoices.contains("def create() -> Any:"));
        assert!(invoices.contains("def void() -> Any:"));
    }

    #[test]
    fn test_type_defs_get_a_companion_module() {
        let root = TempDir::new().unwrap();
        let writer = writer(root.path());
        writer
            .write(&rendered("petstore", "getPet", "class Pet(TypedDict):\n    id: int\n"))
            .unwrap();

        let dir = root.path().join("poly/petstore");
        let aggregator = fs::read_to_string(dir.join(AGGREGATOR)).unwrap();
        assert!(aggregator.contains("from . import _getPet\n"));
        let companion = fs::read_to_string(dir.join("_getPet.py")).unwrap();
        assert!(companion.contains("class Pet(TypedDict):"));
    }

    #[test]
    fn test_top_level_leaf_goes_to_section_aggregator() {
        let root = TempDir::new().unwrap();
        writer(root.path()).write(&rendered("", "ping", "")).unwrap();
        let poly = fs::read_to_string(root.path().join("poly/__init__.py")).unwrap();
        assert!(poly.contains("def ping() -> Any:"));
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let root = TempDir::new().unwrap();
        let mut spec = rendered("auth", "other", "");
        spec.source = "  \n".to_string();
        let err = writer(root.path()).write(&spec).unwrap_err();
        assert!(err.is_empty_content());
        assert!(!root.path().join("poly").exists());
    }

    #[test]
    fn test_failed_write_is_rolled_back() {
        let root = TempDir::new().unwrap();
        let writer = writer(root.path());
        writer.init_package(&[]).unwrap();
        let poly_before = fs::read_to_string(root.path().join("poly/__init__.py")).unwrap();

        // A directory where the companion module should go makes the write fail.
        fs::create_dir_all(root.path().join("poly/shop/_getPet.py")).unwrap();
        let err = writer
            .write(&rendered("shop", "getPet", "class Pet(TypedDict):\n    id: int\n"))
            .unwrap_err();
        assert!(err.is_io_error());

        assert!(!root.path().join("poly/shop/__init__.py").exists());
        let poly_after = fs::read_to_string(root.path().join("poly/__init__.py")).unwrap();
        assert_eq!(poly_before, poly_after);
    }

    #[test]
    fn test_init_and_remove_old_library() {
        let root = TempDir::new().unwrap();
        let writer = writer(root.path());
        writer
            .init_package(&[GeneratedFile {
                path: "runtime.py".to_string(),
                content: "import requests\n".to_string(),
            }])
            .unwrap();
        for section in Section::ALL {
            assert!(root.path().join(section.as_str()).join(AGGREGATOR).is_file());
        }
        fs::write(root.path().join("specs.json"), "[]").unwrap();

        assert_eq!(writer.remove_old_library().unwrap(), 5);
        assert!(!root.path().join("poly").exists());
        assert!(root.path().join("specs.json").exists());
    }

    #[test]
    fn test_init_rejects_escaping_paths() {
        let root = TempDir::new().unwrap();
        let err = writer(root.path())
            .init_package(&[GeneratedFile {
                path: "../outside.py".to_string(),
                content: String::new(),
            }])
            .unwrap_err();
        assert!(err.is_invalid_path());
    }
}
