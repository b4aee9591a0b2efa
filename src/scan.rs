//! Source tree scanner.
//!
//! Walks a source root and collects every file whose extension is eligible
//! for compilation. Hidden directories and the configured exclusions are
//! pruned before descent, and symbolic links are never followed, so a scan
//! only sees the tree as laid out on disk.

use crate::config::SourceSettings;
use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Eligible files keyed by their path relative to the scan root, mapped to
/// their file name. Iteration order is lexicographic by path.
pub type SourceFiles = BTreeMap<Utf8PathBuf, String>;

/// Errors raised while scanning a source root.
#[derive(Debug, Error, Diagnostic)]
pub enum ScanError {
    /// The root does not exist or is not a directory.
    #[error("source root {path} does not exist or is not a directory")]
    #[diagnostic(code(pbxgen::scan::not_found))]
    NotFound {
        /// Root that was requested.
        path: PathBuf,
    },
    /// A path below the root is not valid UTF-8.
    #[error("path {path:?} is not valid UTF-8")]
    #[diagnostic(code(pbxgen::scan::non_utf8))]
    NonUtf8 {
        /// Offending path.
        path: PathBuf,
    },
    /// The directory walk failed.
    #[error("failed to walk {root}")]
    #[diagnostic(code(pbxgen::scan::walk))]
    Walk {
        /// Root being scanned.
        root: Utf8PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },
}

/// Which entries a scan keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    extensions: Vec<String>,
    exclude: Vec<String>,
}

impl ScanFilter {
    /// Build a filter from explicit extension and exclusion lists.
    #[must_use]
    pub fn new(
        extensions: impl IntoIterator<Item = impl Into<String>>,
        exclude: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    fn keeps_dir(&self, name: &str) -> bool {
        !name.starts_with('.') && !self.exclude.iter().any(|skip| skip == name)
    }

    fn keeps_file(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|want| want == ext))
    }
}

impl From<&SourceSettings> for ScanFilter {
    fn from(settings: &SourceSettings) -> Self {
        Self::new(settings.extensions.clone(), settings.exclude.clone())
    }
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self::from(&SourceSettings::default())
    }
}

/// Collect the eligible files below `root`.
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] when `root` is not a directory,
/// [`ScanError::NonUtf8`] for paths that cannot be represented as UTF-8 and
/// [`ScanError::Walk`] when traversal fails.
pub fn scan(root: &Utf8Path, filter: &ScanFilter) -> Result<SourceFiles, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotFound {
            path: root.as_std_path().to_path_buf(),
        });
    }
    let mut files = SourceFiles::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !entry.file_type().is_dir() || keeps(entry, filter));
    for walked in walker {
        let entry = walked.map_err(|source| ScanError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8Path::from_path(entry.path()).ok_or_else(|| ScanError::NonUtf8 {
            path: entry.path().to_path_buf(),
        })?;
        if !filter.keeps_file(path) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let Some(name) = relative.file_name() else {
            continue;
        };
        debug!(path = %relative, "found source file");
        files.insert(relative.to_path_buf(), name.to_owned());
    }
    Ok(files)
}

fn keeps(entry: &DirEntry, filter: &ScanFilter) -> bool {
    entry
        .file_name()
        .to_str()
        .is_none_or(|name| filter.keeps_dir(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn tree(paths: &[&str]) -> Result<(TempDir, Utf8PathBuf)> {
        let dir = tempfile::tempdir()?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow::anyhow!("non-UTF-8 temp dir {}", p.display()))?;
        for rel in paths {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "// source\n").with_context(|| format!("write {path}"))?;
        }
        Ok((dir, root))
    }

    #[test]
    fn collects_eligible_files_in_path_order() -> Result<()> {
        let (_dir, root) = tree(&["B/z.swift", "A/y.swift", "A/x.swift", "Root.swift"])?;
        let files = scan(&root, &ScanFilter::default())?;
        let paths: Vec<_> = files.keys().map(|path| path.as_str()).collect();
        ensure!(
            paths == ["A/x.swift", "A/y.swift", "B/z.swift", "Root.swift"],
            "unexpected order {paths:?}"
        );
        ensure!(files.get(Utf8Path::new("A/x.swift")).map(String::as_str) == Some("x.swift"));
        Ok(())
    }

    #[rstest]
    #[case("build/Gen.swift")]
    #[case("DerivedData/Cache.swift")]
    #[case(".hidden/Secret.swift")]
    #[case("Assets/readme.md")]
    fn skips_ineligible_entries(#[case] skipped: &str) -> Result<()> {
        let (_dir, root) = tree(&["App.swift", skipped])?;
        let files = scan(&root, &ScanFilter::default())?;
        ensure!(files.len() == 1, "expected only App.swift, got {files:?}");
        Ok(())
    }

    #[test]
    fn custom_extensions_are_honoured() -> Result<()> {
        let (_dir, root) = tree(&["a.m", "a.h", "b.swift"])?;
        let files = scan(&root, &ScanFilter::new(["m", "h"], Vec::<String>::new()))?;
        ensure!(files.len() == 2);
        ensure!(!files.contains_key(Utf8Path::new("b.swift")));
        Ok(())
    }

    #[test]
    fn missing_root_is_not_found() -> Result<()> {
        let (_dir, root) = tree(&[])?;
        let err = scan(&root.join("absent"), &ScanFilter::default())
            .err()
            .context("scan of a missing root should fail")?;
        ensure!(matches!(err, ScanError::NotFound { .. }), "got {err:?}");
        Ok(())
    }
}
