//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. It has no
//! crate-internal dependencies so the build script can include it to render
//! the manual page.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A file to add to an existing project, given as `PATH[=GROUP]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Path of the file, relative to the source root unless stripped.
    pub path: PathBuf,
    /// Group the file should appear under.
    pub group: Option<String>,
}

fn parse_file_spec(s: &str) -> Result<FileSpec, String> {
    let (path, group) = match s.split_once('=') {
        Some((path, group)) if group.is_empty() => {
            return Err(format!("missing group name after '=' in '{path}='"));
        }
        Some((path, group)) => (path, Some(group.to_owned())),
        None => (s, None),
    };
    if path.is_empty() {
        return Err(format!("'{s}' does not name a file"));
    }
    Ok(FileSpec {
        path: PathBuf::from(path),
        group,
    })
}

/// Generate and patch Xcode project manifests deterministically.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR", global = true)]
    pub directory: Option<PathBuf>,

    /// Scaffold configuration file; defaults to `pbxgen.yml` when present.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments accepted by the `generate` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct GenerateArgs {
    /// Source root to scan.
    #[arg(value_name = "SOURCE", default_value = ".")]
    pub source: PathBuf,

    /// Directory the `.xcodeproj` bundle is written to; defaults to the
    /// working directory.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Project name; overrides the configuration file.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Print the manifest instead of writing the bundle.
    #[arg(long)]
    pub stdout: bool,
}

/// Arguments accepted by the `patch` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct PatchArgs {
    /// The `.xcodeproj` bundle or its `project.pbxproj`.
    #[arg(short, long, value_name = "PATH")]
    pub project: PathBuf,

    /// Use random identifiers without deduplication, as older tooling did.
    #[arg(long)]
    pub random_ids: bool,

    /// Leading directory removed from each file path before it is added.
    #[arg(long, value_name = "DIR")]
    pub strip_prefix: Option<PathBuf>,

    /// Files to add, each as `PATH` or `PATH=GROUP`.
    #[arg(value_name = "PATH[=GROUP]", required = true, value_parser = parse_file_spec)]
    pub files: Vec<FileSpec>,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Scan a source tree and write a complete project bundle.
    Generate(GenerateArgs),

    /// Add files to an existing project manifest in place.
    Patch(PatchArgs),
}
