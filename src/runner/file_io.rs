//! Output helpers for the runner.
//!
//! Every file is written to a temporary sibling, flushed, synced and then
//! renamed over the destination, so readers never observe a half-written
//! manifest.

use super::RunnerError;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Atomically replace `path` with `contents`, creating parent directories.
///
/// # Errors
///
/// Returns [`RunnerError::WriteFailure`] naming `path` when any step fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), RunnerError> {
    let failure = |source: io::Error| RunnerError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(failure)?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(failure)?;
    {
        let handle = tmp.as_file_mut();
        handle.write_all(contents.as_bytes()).map_err(failure)?;
        handle.flush().map_err(failure)?;
        handle.sync_all().map_err(failure)?;
    }
    tmp.persist(path).map_err(|err| failure(err.error))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn write_all_ignoring_broken_pipe(writer: &mut impl Write, buf: &[u8]) -> io::Result<()> {
    match writer.write_all(buf) {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

fn flush_ignoring_broken_pipe(writer: &mut impl Write) -> io::Result<()> {
    match writer.flush() {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Write `contents` to `writer`, treating a closed pipe as success.
///
/// # Errors
///
/// Returns any I/O error other than a broken pipe.
pub fn write_stream(writer: &mut impl Write, contents: &str) -> io::Result<()> {
    write_all_ignoring_broken_pipe(writer, contents.as_bytes())?;
    flush_ignoring_broken_pipe(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};

    #[test]
    fn write_atomic_creates_parents_and_replaces() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("Demo.xcodeproj").join("project.pbxproj");
        write_atomic(&path, "first")?;
        write_atomic(&path, "second")?;
        let written = fs::read_to_string(&path).context("read back")?;
        ensure!(written == "second", "unexpected contents {written:?}");
        let leftovers = fs::read_dir(path.parent().context("parent")?)?.count();
        ensure!(leftovers == 1, "temporary files left behind: {leftovers}");
        Ok(())
    }

    #[test]
    fn write_failure_names_the_destination() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory")?;
        let target = blocker.join("project.pbxproj");
        let err = write_atomic(&target, "x")
            .err()
            .context("writing below a regular file must fail")?;
        ensure!(
            matches!(&err, RunnerError::WriteFailure { path, .. } if path == &target),
            "got {err:?}"
        );
        Ok(())
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn broken_pipe_is_not_an_error() -> Result<()> {
        write_stream(&mut BrokenPipe, "manifest")?;
        Ok(())
    }
}
