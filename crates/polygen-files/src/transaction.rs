//! Transaction log for multi-file writes.
//!
//! Every directory created and every file created or modified through a
//! [`Transaction`] is recorded. [`Transaction::rollback`] undoes the log in
//! reverse order; [`Transaction::commit`] discards it.

use crate::filesystem::write_atomic;
use crate::types::{FilesError, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum Entry {
    CreatedDir(PathBuf),
    CreatedFile(PathBuf),
    ModifiedFile { path: PathBuf, original: String },
}

impl Entry {
    fn path(&self) -> &Path {
        match self {
            Self::CreatedDir(path)
            | Self::CreatedFile(path)
            | Self::ModifiedFile { path, .. } => path,
        }
    }
}

/// Log of filesystem changes that can be undone as a unit.
///
/// # Examples
///
/// ```
/// use polygen_files::Transaction;
/// use tempfile::TempDir;
///
/// let root = TempDir::new().unwrap();
/// let dir = root.path().join("poly/billing");
///
/// let mut tx = Transaction::new();
/// tx.create_dir_all(&dir).unwrap();
/// tx.write_file(&dir.join("__init__.py"), "x = 1\n").unwrap();
/// tx.rollback();
///
/// assert!(!root.path().join("poly").exists());
/// ```
#[derive(Debug, Default)]
pub struct Transaction {
    entries: Vec<Entry>,
}

impl Transaction {
    /// Creates an empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded changes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creates `dir` and any missing ancestors, recording each one.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::IoError`] if a directory cannot be created.
    pub fn create_dir_all(&mut self, dir: &Path) -> Result<()> {
        let mut missing = Vec::new();
        let mut cursor = Some(dir);
        while let Some(current) = cursor {
            if current.as_os_str().is_empty() || current.is_dir() {
                break;
            }
            missing.push(current.to_path_buf());
            cursor = current.parent();
        }

        for path in missing.into_iter().rev() {
            match fs::create_dir(&path) {
                Ok(()) => self.entries.push(Entry::CreatedDir(path)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(FilesError::io(path, e)),
            }
        }
        Ok(())
    }

    /// Atomically writes `content` to `path`, remembering what was there.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::IoError`] if the existing file cannot be read
    /// or the new content cannot be written.
    pub fn write_file(&mut self, path: &Path, content: &str) -> Result<()> {
        if !self.entries.iter().any(|e| e.path() == path) {
            let entry = if path.exists() {
                let original = fs::read_to_string(path).map_err(|e| FilesError::io(path, e))?;
                Entry::ModifiedFile {
                    path: path.to_path_buf(),
                    original,
                }
            } else {
                Entry::CreatedFile(path.to_path_buf())
            };
            self.entries.push(entry);
        }
        write_atomic(path, content)
    }

    /// Keeps every recorded change.
    pub fn commit(mut self) {
        self.entries.clear();
    }

    /// Undoes every recorded change, newest first.
    ///
    /// Created files are removed, modified files get their original content
    /// back and created directories are removed if they are empty. Cleanup
    /// failures are logged and otherwise ignored.
    pub fn rollback(mut self) {
        while let Some(entry) = self.entries.pop() {
            let outcome = match &entry {
                Entry::CreatedFile(path) => match fs::remove_file(path) {
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    other => other.map_err(|e| FilesError::io(path, e)),
                },
                Entry::ModifiedFile { path, original } => write_atomic(path, original),
                Entry::CreatedDir(path) => fs::remove_dir(path).map_err(|e| FilesError::io(path, e)),
            };
            if let Err(err) = outcome {
                tracing::debug!(path = %entry.path().display(), error = %err, "Rollback step skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rollback_restores_modified_file() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("__init__.py");
        fs::write(&file, "original\n").unwrap();

        let mut tx = Transaction::new();
        tx.write_file(&file, "first\n").unwrap();
        tx.write_file(&file, "second\n").unwrap();
        assert_eq!(tx.len(), 1);
        tx.rollback();

        assert_eq!(fs::read_to_string(&file).unwrap(), "original\n");
    }

    #[test]
    fn test_rollback_keeps_non_empty_directories() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("poly");

        let mut tx = Transaction::new();
        tx.create_dir_all(&dir).unwrap();
        fs::write(dir.join("foreign.py"), "").unwrap();
        tx.rollback();

        assert!(dir.join("foreign.py").exists());
    }

    #[test]
    fn test_commit_keeps_changes() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("a/b");
        let mut tx = Transaction::new();
        tx.create_dir_all(&dir).unwrap();
        assert_eq!(tx.len(), 2);
        tx.commit();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_existing_directories_are_not_recorded() {
        let root = TempDir::new().unwrap();
        let mut tx = Transaction::new();
        tx.create_dir_all(root.path()).unwrap();
        assert!(tx.is_empty());
    }
}
