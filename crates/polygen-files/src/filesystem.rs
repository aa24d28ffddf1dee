//! Low-level filesystem helpers.

use crate::types::{FilesError, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes `content` to `path` atomically.
///
/// The content goes to a temporary file in the same directory first, is
/// synced, and is then renamed over `path`. The temporary file is removed
/// if any step fails, so readers see either the old file or the new one.
///
/// # Errors
///
/// Returns [`FilesError::InvalidPath`] if `path` has no parent directory,
/// or [`FilesError::IoError`] if writing or renaming fails.
///
/// # Examples
///
/// ```
/// use polygen_files::write_atomic;
/// use tempfile::TempDir;
///
/// let dir = TempDir::new().unwrap();
/// let target = dir.path().join("runtime.py");
/// write_atomic(&target, "import requests\n").unwrap();
/// assert_eq!(std::fs::read_to_string(&target).unwrap(), "import requests\n");
/// ```
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| FilesError::InvalidPath {
        path: path.display().to_string(),
        reason: "no parent directory".to_string(),
    })?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| FilesError::io(parent, e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| FilesError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| FilesError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| FilesError::io(path, e.error))?;
    Ok(())
}

/// Joins a `/`-separated relative path onto `root`, rejecting anything that
/// would escape it.
///
/// # Errors
///
/// Returns [`FilesError::InvalidPath`] for absolute paths and paths with
/// `..` components.
pub fn join_relative(root: &Path, relative: &str) -> Result<PathBuf> {
    let candidate = Path::new(relative);
    let escapes = candidate.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if relative.is_empty() || escapes {
        return Err(FilesError::InvalidPath {
            path: relative.to_string(),
            reason: "must be a relative path inside the package".to_string(),
        });
    }
    Ok(root.join(candidate))
}

/// Expands a leading `~` to the home directory.
///
/// Paths without a tilde, and all paths when no home directory is known,
/// are returned unchanged.
///
/// # Examples
///
/// ```
/// use polygen_files::expand_tilde;
/// use std::path::Path;
///
/// assert_eq!(expand_tilde(Path::new("out/polyapi")), Path::new("out/polyapi"));
/// ```
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}
