//! Incremental manifest patcher.
//!
//! Adds source files to an existing `project.pbxproj` without regenerating
//! it. The manifest is indexed once (see [`index`]), every insertion is
//! planned against that index, and only then is the patched text
//! assembled. A missing anchor therefore aborts the whole patch and the
//! caller never sees partially spliced text.
//!
//! New entries are rendered through [`crate::pbx_gen`], so a patched
//! manifest is textually consistent with one produced by full generation.
//! With [`IdStrategy::ContentDerived`] the new tokens are exactly the tokens
//! generation would assign, which makes patching idempotent.
//!
//! # Examples
//!
//! ```
//! use pbxgen::patch::{patch, NewFile, PatchOptions};
//!
//! let manifest = "\tobjects = {\n/* Begin PBXBuildFile section */\n/* End PBXBuildFile section */\n/* Begin PBXFileReference section */\n/* End PBXFileReference section */\n/* Begin PBXSourcesBuildPhase section */\n\t\t1F1234567890ABCDEF000006 /* Sources */ = {\n\t\t\tisa = PBXSourcesBuildPhase;\n\t\t\tfiles = (\n\t\t\t);\n\t\t};\n/* End PBXSourcesBuildPhase section */\n";
//! let outcome = patch(manifest, &[NewFile::new("A.swift")], &PatchOptions::default()).unwrap();
//! assert_eq!(outcome.added.len(), 1);
//! assert!(outcome.text.contains("A.swift in Sources"));
//! ```

mod index;

use crate::config::ScaffoldIds;
use crate::graph::{FileNodes, Node};
use crate::pbx_gen::{self, ENTRY_DEPTH, GenerateError};
use crate::token::{AllocError, DigestAlgorithm, IdAllocator, Token, group_key};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use index::{IndexedEntry, SectionIndex};
use miette::Diagnostic;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

const BUILD_FILE_SECTION: &str = "PBXBuildFile";
const FILE_REFERENCE_SECTION: &str = "PBXFileReference";
const GROUP_SECTION: &str = "PBXGroup";
const SOURCES_SECTION: &str = "PBXSourcesBuildPhase";
const LIST_ITEM_DEPTH: usize = ENTRY_DEPTH + 2;

/// A file to add to the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    /// File name shown in the navigator.
    pub name: String,
    /// Path relative to the source root, used for token derivation and
    /// group placement.
    pub path: Utf8PathBuf,
    /// Name of the group to place the file in; defaults to the group derived
    /// from the file's directory.
    pub group: Option<String>,
}

impl NewFile {
    /// Describe the file at `path`, naming it after its last component.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        let relative = path.into();
        Self {
            name: relative.file_name().unwrap_or_default().to_owned(),
            path: relative,
            group: None,
        }
    }

    /// Place the file in the group named `group`.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// How tokens for new entries are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Tokens derived from the file path, as full generation assigns them.
    /// Files already present are skipped.
    #[default]
    ContentDerived,
    /// Fresh random tokens on every run, without deduplication. Patching the
    /// same files twice adds them twice.
    Random,
}

/// Settings for [`patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
    /// Token strategy.
    pub strategy: IdStrategy,
    /// Digest used by [`IdStrategy::ContentDerived`]; must match the one the
    /// manifest was generated with.
    pub digest: DigestAlgorithm,
    /// Group receiving files that sit directly in the source root.
    pub root_group: Token,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            strategy: IdStrategy::default(),
            digest: DigestAlgorithm::default(),
            root_group: ScaffoldIds::default().source_group,
        }
    }
}

/// Result of a successful patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Patched manifest text. Equal to the input when nothing was added.
    pub text: String,
    /// Files that were added, in request order.
    pub added: Vec<Utf8PathBuf>,
    /// Files skipped because they were already present or repeated.
    pub skipped: Vec<Utf8PathBuf>,
}

/// Errors raised while patching a manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum PatchError {
    /// A structural anchor required for insertion is missing.
    #[error("manifest has no {section} section to insert into")]
    #[diagnostic(
        code(pbxgen::patch::section_not_found),
        help("regenerate the project, or check that the file is a project.pbxproj")
    )]
    SectionNotFound {
        /// Name of the missing section or list.
        section: String,
    },
    /// The requested group does not exist.
    #[error("group '{group}' requested for {path} does not exist")]
    #[diagnostic(code(pbxgen::patch::group_not_found))]
    GroupNotFound {
        /// Requested group name.
        group: String,
        /// File that asked for it.
        path: Utf8PathBuf,
    },
    /// Several groups share the requested name and none matches the file's
    /// directory.
    #[error("group name '{group}' matches {count} groups; cannot place {path}")]
    #[diagnostic(
        code(pbxgen::patch::ambiguous_group),
        help("move the file under the intended group's directory or rename a group")
    )]
    AmbiguousGroup {
        /// Requested group name.
        group: String,
        /// Number of matching groups.
        count: usize,
        /// File that asked for it.
        path: Utf8PathBuf,
    },
    /// The path has no file name, is absolute or leaves the source root.
    #[error("'{path}' does not name a file inside the source root")]
    #[diagnostic(
        code(pbxgen::patch::invalid_path),
        help("give paths relative to the source root, or use --strip-prefix")
    )]
    InvalidPath {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A derived token aliases another key.
    #[error(transparent)]
    #[diagnostic(transparent)]
    KeyCollision(#[from] AllocError),
    /// Rendering a new entry failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] GenerateError),
}

/// A block of text to insert before line `line`.
struct Insertion {
    line: usize,
    text: String,
}

/// Add `files` to `manifest`.
///
/// # Errors
///
/// Returns [`PatchError::SectionNotFound`] when the build file, file
/// reference or sources anchor is missing, and the group errors when an
/// explicit group cannot be resolved. No text is produced on error.
pub fn patch(
    manifest: &str,
    files: &[NewFile],
    options: &PatchOptions,
) -> Result<PatchOutcome, PatchError> {
    let index = SectionIndex::parse(manifest);
    let build_anchor = section_start(&index, BUILD_FILE_SECTION)?;
    let reference_anchor = section_start(&index, FILE_REFERENCE_SECTION)?;
    let sources_anchor = index
        .entries_in(SOURCES_SECTION)
        .find_map(|entry| entry.list_close("files"))
        .ok_or_else(|| PatchError::SectionNotFound {
            section: SOURCES_SECTION.into(),
        })?;

    let mut alloc = IdAllocator::new(options.digest);
    let mut requested = HashSet::new();
    let mut planned: Vec<(NewFile, FileNodes)> = Vec::new();
    let mut skipped = Vec::new();
    for given in files {
        let file = normalized(given)?;
        let nodes = match options.strategy {
            IdStrategy::ContentDerived => {
                let nodes = FileNodes::derive(&mut alloc, &file.path, &file.name)?;
                let present =
                    index.contains(&nodes.reference.id) || index.contains(&nodes.build.id);
                if present || !requested.insert(nodes.reference.id.clone()) {
                    debug!(path = %file.path, "file already in manifest");
                    skipped.push(file.path.clone());
                    continue;
                }
                nodes
            }
            IdStrategy::Random => FileNodes::with_ids(&file.name, Token::random(), Token::random()),
        };
        planned.push((file, nodes));
    }

    let lookup: Vec<Node> = planned
        .iter()
        .flat_map(|(_, nodes)| [nodes.reference.clone(), nodes.build.clone()])
        .collect();
    let mut insertions = Vec::with_capacity(planned.len() * 4);
    for (file, nodes) in &planned {
        insertions.push(Insertion {
            line: build_anchor,
            text: pbx_gen::render_entry(&nodes.build, lookup.as_slice())?,
        });
        insertions.push(Insertion {
            line: reference_anchor,
            text: pbx_gen::render_entry(&nodes.reference, lookup.as_slice())?,
        });
        insertions.push(Insertion {
            line: sources_anchor,
            text: pbx_gen::render_list_item(&nodes.build.id, LIST_ITEM_DEPTH, lookup.as_slice())?,
        });
        match place(&index, file, options)? {
            Some(group_close) => insertions.push(Insertion {
                line: group_close,
                text: pbx_gen::render_list_item(
                    &nodes.reference.id,
                    LIST_ITEM_DEPTH,
                    lookup.as_slice(),
                )?,
            }),
            None => warn!(
                path = %file.path,
                "no group found for file; added to the build without a navigator entry"
            ),
        }
    }

    let added: Vec<Utf8PathBuf> = planned.iter().map(|(file, _)| file.path.clone()).collect();
    info!(added = added.len(), skipped = skipped.len(), "patched manifest");
    Ok(PatchOutcome {
        text: splice(index.lines(), insertions),
        added,
        skipped,
    })
}

/// `file` with its path reduced to plain components relative to the source
/// root, so `./A/x.swift` derives the same keys as `A/x.swift`.
fn normalized(file: &NewFile) -> Result<NewFile, PatchError> {
    let invalid = || PatchError::InvalidPath {
        path: file.path.clone(),
    };
    let mut path = Utf8PathBuf::new();
    for component in file.path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::Normal(part) => path.push(part),
            Utf8Component::ParentDir | Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                return Err(invalid());
            }
        }
    }
    let name = path.file_name().ok_or_else(invalid)?.to_owned();
    Ok(NewFile {
        name,
        path,
        group: file.group.clone(),
    })
}

/// Line right after the `Begin` marker of section `isa`.
fn section_start(index: &SectionIndex<'_>, isa: &str) -> Result<usize, PatchError> {
    index
        .section(isa)
        .filter(|span| span.close.is_some())
        .map(|span| span.open + 1)
        .ok_or_else(|| PatchError::SectionNotFound {
            section: isa.into(),
        })
}

/// Closing line of the `children` list of the group `file` belongs in.
fn place(
    index: &SectionIndex<'_>,
    file: &NewFile,
    options: &PatchOptions,
) -> Result<Option<usize>, PatchError> {
    let dir = file.path.parent().unwrap_or_else(|| Utf8Path::new(""));
    let derived = if dir.as_str().is_empty() {
        options.root_group.clone()
    } else {
        options.digest.token(&group_key(dir.as_str()))
    };

    let group = match &file.group {
        Some(name) => Some(named_group(index, file, name, &derived)?),
        None => index.entry(&derived),
    };
    Ok(group.and_then(|entry| entry.list_close("children")))
}

fn named_group<'i, 'a>(
    index: &'i SectionIndex<'a>,
    file: &NewFile,
    name: &str,
    derived: &Token,
) -> Result<&'i IndexedEntry<'a>, PatchError> {
    let candidates: Vec<&IndexedEntry<'a>> = index
        .entries_in(GROUP_SECTION)
        .filter(|entry| {
            entry.comment == Some(name)
                || entry.scalar("name") == Some(name)
                || entry.scalar("path") == Some(name)
        })
        .collect();
    match candidates.as_slice() {
        [] => Err(PatchError::GroupNotFound {
            group: name.to_owned(),
            path: file.path.clone(),
        }),
        [only] => Ok(*only),
        many => many
            .iter()
            .find(|entry| &entry.id == derived)
            .copied()
            .ok_or_else(|| PatchError::AmbiguousGroup {
                group: name.to_owned(),
                count: many.len(),
                path: file.path.clone(),
            }),
    }
}

/// Assemble the patched text. Insertions sharing a line keep their order.
fn splice(lines: &[&str], mut insertions: Vec<Insertion>) -> String {
    insertions.sort_by_key(|insertion| insertion.line);
    let extra: usize = insertions.iter().map(|insertion| insertion.text.len()).sum();
    let mut out = String::with_capacity(lines.iter().map(|line| line.len()).sum::<usize>() + extra);
    let mut pending = insertions.into_iter().peekable();
    for (number, line) in lines.iter().enumerate() {
        while let Some(insertion) = pending.next_if(|insertion| insertion.line == number) {
            out.push_str(&insertion.text);
        }
        out.push_str(line);
    }
    for insertion in pending {
        out.push_str(&insertion.text);
    }
    out
}

#[cfg(test)]
mod tests;
