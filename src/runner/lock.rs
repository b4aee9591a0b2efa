//! Advisory locking of a manifest path.
//!
//! Generation and patching both hold an exclusive lock (see [`lock_path`])
//! for their whole duration, so two runs never interleave writes to the same
//! manifest. Contention fails immediately instead of waiting.

use super::RunnerError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive lock held until dropped.
#[derive(Debug)]
pub struct ManifestLock {
    file: File,
    path: PathBuf,
}

impl ManifestLock {
    /// Lock the manifest at `manifest`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Locked`] when another holder exists and
    /// [`RunnerError::WriteFailure`] when the lock file cannot be created.
    pub fn acquire(manifest: &Path) -> Result<Self, RunnerError> {
        let path = lock_path(manifest);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RunnerError::WriteFailure {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| RunnerError::WriteFailure {
                path: path.clone(),
                source,
            })?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "acquired manifest lock");
                Ok(Self { file, path })
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock || is_contended(&err) => {
                Err(RunnerError::Locked { path })
            }
            Err(source) => Err(RunnerError::WriteFailure { path, source }),
        }
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %err, "failed to release manifest lock");
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Lock file guarding `manifest`.
///
/// Manifests inside a `.xcodeproj` bundle are locked through
/// `<bundle>.lock` beside the bundle, keeping the bundle itself free of
/// pbxgen files. Any other manifest uses `<manifest>.lock`.
#[must_use]
pub fn lock_path(manifest: &Path) -> PathBuf {
    let guarded = manifest
        .parent()
        .filter(|bundle| bundle.extension().is_some_and(|ext| ext == BUNDLE_EXTENSION))
        .unwrap_or(manifest);
    let mut name = guarded.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

const BUNDLE_EXTENSION: &str = "xcodeproj";
