//! Temporary source trees.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// A temporary directory holding a source tree.
///
/// The tree lives under `<tempdir>/Sources` so the bundle can be written
/// beside it. Dropping the value removes everything.
#[derive(Debug)]
pub struct SourceTree {
    dir: TempDir,
    root: Utf8PathBuf,
}

impl SourceTree {
    /// Create a tree containing `files`, each holding a one-line stub.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory or a file cannot be
    /// created, or when the temporary path is not UTF-8.
    pub fn new(files: &[&str]) -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir for source tree")?;
        let base = Utf8Path::from_path(dir.path()).context("temp dir path is not UTF-8")?;
        let root = base.join("Sources");
        fs::create_dir_all(&root).with_context(|| format!("create {root}"))?;
        let tree = Self { dir, root };
        for file in files {
            tree.add(file)?;
        }
        Ok(tree)
    }

    /// Add `relative` below the source root, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn add(&self, relative: &str) -> Result<Utf8PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, format!("// {relative}\n")).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// The source root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The directory holding the source root; bundles are written here.
    #[must_use]
    pub fn base(&self) -> &Utf8Path {
        self.root.parent().unwrap_or(&self.root)
    }

    /// The underlying temporary directory.
    #[must_use]
    pub fn temp_dir(&self) -> &TempDir {
        &self.dir
    }
}
