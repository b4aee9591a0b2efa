//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint
//! suppressions narrowly.

// The unused_assignments lint fires on miette/thiserror derive expansions in
// some Rust versions only, so `#[expect]` is not usable here.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while executing a command.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The project manifest to patch does not exist.
    #[error("project manifest {path} not found")]
    #[diagnostic(
        code(pbxgen::runner::manifest_not_found),
        help("pass the .xcodeproj bundle or its project.pbxproj with --project")
    )]
    ManifestNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },
    /// Another process holds the manifest lock.
    #[error("{path} is locked by another pbxgen process")]
    #[diagnostic(
        code(pbxgen::runner::locked),
        help("wait for the other process to finish; the lock is released when it exits")
    )]
    Locked {
        /// Lock file that could not be acquired.
        path: PathBuf,
    },
    /// Persisting an output file failed.
    #[error("failed to write {path}")]
    #[diagnostic(code(pbxgen::runner::write_failure))]
    WriteFailure {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A path given on the command line is not valid UTF-8.
    #[error("path {path:?} is not valid UTF-8")]
    #[diagnostic(code(pbxgen::runner::non_utf8_path))]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
}
