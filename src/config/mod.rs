//! Scaffold configuration.
//!
//! The [`Scaffold`] is the fixed part of a generated manifest: project and
//! target names, the hardcoded identifiers of the structural nodes, the group
//! topology and the build settings. It is read once from an optional
//! `pbxgen.yml` file and then passed explicitly to the graph builder, so
//! several manifests can be produced in one process without sharing state.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```rust
//! use pbxgen::config::{GroupLayout, Scaffold};
//!
//! let yaml = "project:\n  name: Demo\n  deployment_target: \"17.0\"\ngroups: [App, Views/Auth]";
//! let scaffold = pbxgen::config::from_str(yaml).expect("parse");
//! assert_eq!(scaffold.project.name, "Demo");
//! assert!(matches!(scaffold.layout(), GroupLayout::Declared(_)));
//! # let _ = Scaffold::default();
//! ```

mod defaults;
mod diagnostics;

pub use defaults::{project_settings, target_settings};
pub use diagnostics::map_yaml_error;

use crate::token::{DigestAlgorithm, Token};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fmt, fs, io};
use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pbxgen.yml";

/// Ordered build settings of one configuration.
pub type Settings = IndexMap<String, SettingValue>;

/// Value of a single build setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// A scalar such as `YES` or `16.0`.
    Text(String),
    /// A list such as `LD_RUNPATH_SEARCH_PATHS`.
    List(Vec<String>),
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The two build configurations every generated project carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildConfiguration {
    /// Unoptimised development build.
    Debug,
    /// Optimised distribution build.
    Release,
}

impl BuildConfiguration {
    /// Both configurations in manifest order.
    pub const ALL: [Self; 2] = [Self::Debug, Self::Release];

    /// Configuration name as written in the manifest.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete fixed description of a generated project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scaffold {
    /// Project-wide names and versions.
    pub project: ProjectSettings,
    /// Which files are picked up and how their tokens are derived.
    pub source: SourceSettings,
    /// Declared group topology as directory paths relative to the source
    /// root. Empty means groups are synthesised from the scanned tree.
    pub groups: Vec<String>,
    /// Hardcoded identifiers of the structural nodes.
    pub ids: ScaffoldIds,
}

/// How the group tree is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupLayout {
    /// Only the listed directories (and their ancestors) become groups.
    Declared(Vec<Utf8PathBuf>),
    /// Every directory holding a source file becomes a group.
    Synthesized,
}

impl Scaffold {
    /// Group layout selected by this configuration.
    #[must_use]
    pub fn layout(&self) -> GroupLayout {
        if self.groups.is_empty() {
            GroupLayout::Synthesized
        } else {
            GroupLayout::Declared(self.groups.iter().map(Utf8PathBuf::from).collect())
        }
    }

    /// Return a copy with the project name replaced.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.project.name = name.into();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.project.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        for group in &self.groups {
            let path = Utf8Path::new(group);
            let is_plain = !group.is_empty()
                && path
                    .components()
                    .all(|component| matches!(component, Utf8Component::Normal(_)));
            if !is_plain {
                return Err(ConfigError::InvalidGroup {
                    path: group.clone(),
                });
            }
        }
        if self.source.extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }
}

/// Names and versions of the project and its single application target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSettings {
    /// Project, target and product name.
    pub name: String,
    /// Bundle identifier; defaults to `com.example.<name>`.
    pub bundle_identifier: Option<String>,
    /// Minimum iOS version.
    pub deployment_target: String,
    /// Swift language version.
    pub swift_version: String,
    /// User-facing version string.
    pub marketing_version: String,
    /// Build number.
    pub current_project_version: String,
    /// Info.plist path relative to the project directory.
    pub info_plist: String,
    /// Extra target build settings applied to both configurations.
    pub build_settings: Settings,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            name: "App".into(),
            bundle_identifier: None,
            deployment_target: "16.0".into(),
            swift_version: "5.0".into(),
            marketing_version: "1.0".into(),
            current_project_version: "1".into(),
            info_plist: "Info.plist".into(),
            build_settings: Settings::new(),
        }
    }
}

impl ProjectSettings {
    /// Effective bundle identifier.
    #[must_use]
    pub fn bundle_identifier(&self) -> String {
        self.bundle_identifier
            .clone()
            .unwrap_or_else(|| format!("com.example.{}", self.name))
    }

    /// File name of the built product.
    #[must_use]
    pub fn product_name(&self) -> String {
        format!("{}.app", self.name)
    }
}

/// Scanner filters and token derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
    /// File extensions (without the dot) that are compiled.
    pub extensions: Vec<String>,
    /// Directory names skipped during the scan, in addition to dot-directories.
    pub exclude: Vec<String>,
    /// Digest used to derive node tokens.
    pub digest: DigestAlgorithm,
    /// `path` of the source root group, relative to the project directory.
    /// Derived from the scanned directory when absent.
    pub path: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["swift".into()],
            exclude: vec!["build".into(), "DerivedData".into()],
            digest: DigestAlgorithm::default(),
            path: None,
        }
    }
}

/// Fixed tokens of the structural nodes.
///
/// These stay stable for the lifetime of a project even if the derivation of
/// the other tokens changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaffoldIds {
    /// Root project object.
    pub project: Token,
    /// Native application target.
    pub target: Token,
    /// Group holding the build products.
    pub products_group: Token,
    /// Top-level group of the project navigator.
    pub main_group: Token,
    /// The built application.
    pub product: Token,
    /// Sources build phase.
    pub sources_phase: Token,
    /// Frameworks build phase.
    pub frameworks_phase: Token,
    /// Resources build phase.
    pub resources_phase: Token,
    /// Project configuration list.
    pub project_config_list: Token,
    /// Target configuration list.
    pub target_config_list: Token,
    /// Project Debug configuration.
    pub debug_project_config: Token,
    /// Project Release configuration.
    pub release_project_config: Token,
    /// Target Debug configuration.
    pub debug_target_config: Token,
    /// Target Release configuration.
    pub release_target_config: Token,
    /// Group mirroring the source root.
    pub source_group: Token,
}

fn fixed(suffix: u8) -> Token {
    Token::from_hex(format!("1F1234567890ABCDEF0000{suffix:02X}"))
}

impl Default for ScaffoldIds {
    fn default() -> Self {
        Self {
            project: fixed(0x01),
            target: fixed(0x02),
            products_group: fixed(0x03),
            main_group: fixed(0x04),
            product: fixed(0x05),
            sources_phase: fixed(0x06),
            frameworks_phase: fixed(0x07),
            resources_phase: fixed(0x08),
            project_config_list: fixed(0x09),
            target_config_list: fixed(0x0A),
            debug_project_config: fixed(0x0B),
            release_project_config: fixed(0x0C),
            debug_target_config: fixed(0x0D),
            release_target_config: fixed(0x0E),
            source_group: fixed(0x0F),
        }
    }
}

impl ScaffoldIds {
    /// Every fixed token paired with a stable reservation key.
    #[must_use]
    pub fn reservations(&self) -> [(&Token, &'static str); 15] {
        [
            (&self.project, "SCAFFOLD_project"),
            (&self.target, "SCAFFOLD_target"),
            (&self.products_group, "SCAFFOLD_products_group"),
            (&self.main_group, "SCAFFOLD_main_group"),
            (&self.product, "SCAFFOLD_product"),
            (&self.sources_phase, "SCAFFOLD_sources_phase"),
            (&self.frameworks_phase, "SCAFFOLD_frameworks_phase"),
            (&self.resources_phase, "SCAFFOLD_resources_phase"),
            (&self.project_config_list, "SCAFFOLD_project_config_list"),
            (&self.target_config_list, "SCAFFOLD_target_config_list"),
            (&self.debug_project_config, "SCAFFOLD_debug_project_config"),
            (&self.release_project_config, "SCAFFOLD_release_project_config"),
            (&self.debug_target_config, "SCAFFOLD_debug_target_config"),
            (&self.release_target_config, "SCAFFOLD_release_target_config"),
            (&self.source_group, "SCAFFOLD_source_group"),
        ]
    }
}

/// Errors raised while loading a scaffold configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}")]
    #[diagnostic(code(pbxgen::config::read))]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The YAML document is malformed or does not match the schema.
    #[error("configuration parse error")]
    #[diagnostic(code(pbxgen::config::parse))]
    Parse {
        /// Rendered YAML diagnostic.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },
    /// `project.name` is blank.
    #[error("project name must not be empty")]
    #[diagnostic(code(pbxgen::config::empty_name))]
    EmptyName,
    /// A declared group is not a plain relative directory path.
    #[error("group '{path}' must be a relative path without '.' or '..' components")]
    #[diagnostic(code(pbxgen::config::invalid_group))]
    InvalidGroup {
        /// Offending entry.
        path: String,
    },
    /// `source.extensions` is empty, so nothing would ever be scanned.
    #[error("source.extensions must list at least one extension")]
    #[diagnostic(code(pbxgen::config::no_extensions))]
    NoExtensions,
}

/// Parse a scaffold from YAML text labelled `name` in diagnostics.
///
/// # Errors
///
/// Returns [`ConfigError`] when the YAML is invalid or fails validation.
pub fn from_str_named(yaml: &str, name: &str) -> Result<Scaffold, ConfigError> {
    let scaffold: Scaffold = if yaml.trim().is_empty() {
        Scaffold::default()
    } else {
        serde_saphyr::from_str(yaml).map_err(|err| ConfigError::Parse {
            source: map_yaml_error(err, yaml, name),
        })?
    };
    scaffold.validate()?;
    Ok(scaffold)
}

/// Parse a scaffold from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError`] when the YAML is invalid or fails validation.
pub fn from_str(yaml: &str) -> Result<Scaffold, ConfigError> {
    from_str_named(yaml, DEFAULT_CONFIG_FILE)
}

/// Load a scaffold from `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read or parsed.
pub fn from_path(path: impl AsRef<Path>) -> Result<Scaffold, ConfigError> {
    let path_ref = path.as_ref();
    let data = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    from_str_named(&data, &path_ref.display().to_string())
}
