//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution. Every command builds its output completely in
//! memory first; files are only written once nothing else can fail, and
//! each write is atomic.

mod error;
mod file_io;
mod lock;
mod workspace;

pub use error::RunnerError;
pub use file_io::{write_atomic, write_stream};
pub use lock::{ManifestLock, lock_path};
pub use workspace::{MANIFEST_FILE, bundle_path, manifest_path, write_workspace};

use crate::cli::{Cli, Commands, FileSpec, GenerateArgs, PatchArgs};
use crate::config::{self, DEFAULT_CONFIG_FILE, Scaffold};
use crate::graph::Graph;
use crate::patch::{IdStrategy, NewFile, PatchOptions, patch};
use crate::pbx_gen;
use crate::scan::{ScanFilter, scan};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if configuration loading, scanning, generation,
/// patching or writing fails.
pub fn run(cli: &Cli) -> Result<()> {
    let base = utf8(cli.directory.as_deref().unwrap_or_else(|| Path::new(".")))?;
    let scaffold = load_scaffold(&base, cli.config.as_deref())?;
    match &cli.command {
        Commands::Generate(args) => run_generate(&base, scaffold, args),
        Commands::Patch(args) => run_patch(&base, &scaffold, args),
    }
}

/// Load the scaffold from `explicit`, or from `pbxgen.yml` in `base` when
/// present, falling back to defaults.
///
/// # Errors
///
/// Returns an error when the chosen file cannot be read or parsed.
pub fn load_scaffold(base: &Utf8Path, explicit: Option<&Path>) -> Result<Scaffold> {
    let path = match explicit {
        Some(path) => base.as_std_path().join(path),
        None => {
            let default = base.join(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                debug!("no {DEFAULT_CONFIG_FILE} found; using default scaffold");
                return Ok(Scaffold::default());
            }
            default.into_std_path_buf()
        }
    };
    let scaffold = config::from_path(&path)
        .with_context(|| format!("loading configuration {}", path.display()))?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(scaffold)
}

/// The manifest text for `source` under `scaffold`, with the generated graph.
///
/// # Errors
///
/// Returns an error when scanning, graph construction or rendering fails.
pub fn render_project(source: &Utf8Path, scaffold: &Scaffold) -> Result<(Graph, String)> {
    let files = scan(source, &ScanFilter::from(&scaffold.source))
        .with_context(|| format!("scanning {source}"))?;
    let graph = Graph::build(&files, scaffold).context("building project graph")?;
    let text = pbx_gen::generate(&graph).context("rendering project manifest")?;
    info!(
        files = files.len(),
        omitted = graph.omitted().len(),
        nodes = graph.len(),
        "generated project manifest"
    );
    Ok((graph, text))
}

fn run_generate(base: &Utf8Path, mut scaffold: Scaffold, args: &GenerateArgs) -> Result<()> {
    if let Some(name) = &args.name {
        scaffold.project.name.clone_from(name);
    }
    let source = base.join(utf8(&args.source)?);
    let output = match &args.output {
        Some(dir) => base.join(utf8(dir)?),
        None => base.to_path_buf(),
    };
    if scaffold.source.path.is_none() {
        scaffold.source.path = Some(source_group_path(&source, &output));
    }
    let (_, text) = render_project(&source, &scaffold)?;

    if args.stdout {
        return write_stream(&mut io::stdout().lock(), &text).context("writing manifest to stdout");
    }
    let bundle = bundle_path(output.as_std_path(), &scaffold.project.name);
    let manifest = bundle.join(MANIFEST_FILE);
    let _lock = ManifestLock::acquire(&manifest)?;
    // The manifest goes last so a failed run never leaves a new manifest
    // without its workspace.
    write_workspace(&bundle)?;
    write_atomic(&manifest, &text)?;
    info!(bundle = %bundle.display(), "project written");
    Ok(())
}

/// `path` of the source root group: the source directory relative to the
/// directory holding the bundle.
fn source_group_path(source: &Utf8Path, output: &Utf8Path) -> String {
    match source.strip_prefix(output) {
        Ok(relative) if relative.as_str().is_empty() => ".".to_owned(),
        Ok(relative) => relative.as_str().to_owned(),
        Err(_) => {
            warn!(%source, %output, "source root is outside the output directory; using its full path");
            source.as_str().to_owned()
        }
    }
}

fn run_patch(base: &Utf8Path, scaffold: &Scaffold, args: &PatchArgs) -> Result<()> {
    let manifest = manifest_path(&base.as_std_path().join(&args.project));
    if !manifest.is_file() {
        return Err(RunnerError::ManifestNotFound { path: manifest }.into());
    }
    let strip = args.strip_prefix.as_deref().map(utf8).transpose()?;
    let files = args
        .files
        .iter()
        .map(|spec| new_file(spec, strip.as_deref()))
        .collect::<Result<Vec<_>>>()?;
    let options = PatchOptions {
        strategy: if args.random_ids {
            IdStrategy::Random
        } else {
            IdStrategy::ContentDerived
        },
        digest: scaffold.source.digest,
        root_group: scaffold.ids.source_group.clone(),
    };

    let _lock = ManifestLock::acquire(&manifest)?;
    let text = fs::read_to_string(&manifest)
        .with_context(|| format!("reading {}", manifest.display()))?;
    let outcome = patch(&text, &files, &options)
        .with_context(|| format!("patching {}", manifest.display()))?;
    for path in &outcome.added {
        info!(%path, "added");
    }
    for path in &outcome.skipped {
        info!(%path, "already present; skipped");
    }
    if outcome.added.is_empty() {
        info!("nothing to add");
        return Ok(());
    }
    write_atomic(&manifest, &outcome.text)?;
    Ok(())
}

fn new_file(spec: &FileSpec, strip: Option<&Utf8Path>) -> Result<NewFile> {
    let given = utf8(&spec.path)?;
    let relative = match strip {
        Some(prefix) => match given.strip_prefix(prefix) {
            Ok(rest) => rest.to_path_buf(),
            Err(_) => {
                warn!(path = %given, %prefix, "path does not start with the strip prefix; kept as given");
                given
            }
        },
        None => given,
    };
    let file = NewFile::new(relative);
    Ok(match &spec.group {
        Some(group) => file.in_group(group.clone()),
        None => file,
    })
}

fn utf8(path: &Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).map_err(|path_buf| {
        RunnerError::NonUtf8Path { path: path_buf }.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("./App", ".", "App")]
    #[case("work/Sources/App", "work", "Sources/App")]
    #[case("work", "work", ".")]
    fn source_group_path_is_relative_to_the_bundle(
        #[case] source: &str,
        #[case] output: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            source_group_path(Utf8Path::new(source), Utf8Path::new(output)),
            expected
        );
    }

    #[test]
    fn strip_prefix_is_applied_to_new_files() {
        let spec = FileSpec {
            path: "App/Sources/Models/User.swift".into(),
            group: Some("Models".into()),
        };
        let file = new_file(&spec, Some(Utf8Path::new("App/Sources"))).expect("new file");
        assert_eq!(file.path, Utf8PathBuf::from("Models/User.swift"));
        assert_eq!(file.name, "User.swift");
        assert_eq!(file.group.as_deref(), Some("Models"));
    }

    #[test]
    fn missing_default_config_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let base = Utf8Path::from_path(dir.path()).expect("utf-8 temp dir");
        let scaffold = load_scaffold(base, None).expect("defaults");
        assert_eq!(scaffold, Scaffold::default());
    }
}
