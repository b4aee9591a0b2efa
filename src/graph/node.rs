//! Manifest node types.

use crate::config::SettingValue;
use crate::token::{AllocError, IdAllocator, Token, build_key, file_key};
use camino::Utf8Path;
use indexmap::IndexMap;

/// Ordered attribute table of a node.
pub type Attributes = IndexMap<String, Value>;

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain string, quoted on output when necessary.
    Str(String),
    /// Reference to another node, rendered with that node's comment.
    Ref(Token),
    /// Parenthesised list.
    List(Vec<Value>),
    /// Braced dictionary; keys are sorted on output.
    Map(IndexMap<String, Value>),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Token> for Value {
    fn from(value: Token) -> Self {
        Self::Ref(value)
    }
}

impl From<&SettingValue> for Value {
    fn from(value: &SettingValue) -> Self {
        match value {
            SettingValue::Text(text) => Self::Str(text.clone()),
            SettingValue::List(items) => {
                Self::List(items.iter().map(|item| Self::Str(item.clone())).collect())
            }
        }
    }
}

/// Build phase flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Compiled sources.
    Sources,
    /// Linked frameworks.
    Frameworks,
    /// Bundled resources.
    Resources,
}

impl PhaseKind {
    /// Display name, also used in build-file comments.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sources => "Sources",
            Self::Frameworks => "Frameworks",
            Self::Resources => "Resources",
        }
    }
}

/// Kind of a manifest node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root project object.
    Project,
    /// Native target.
    Target,
    /// Navigator group.
    Group,
    /// Reference to a file on disk.
    FileReference,
    /// Membership of a file in a build phase.
    BuildFile,
    /// Build phase.
    Phase(PhaseKind),
    /// Named set of build settings.
    Configuration,
    /// List of configurations.
    ConfigurationList,
    /// Reference to the built product.
    ProductReference,
}

impl NodeKind {
    /// The `isa` written for this kind; also names its section.
    #[must_use]
    pub const fn isa(self) -> &'static str {
        match self {
            Self::Project => "PBXProject",
            Self::Target => "PBXNativeTarget",
            Self::Group => "PBXGroup",
            Self::FileReference | Self::ProductReference => "PBXFileReference",
            Self::BuildFile => "PBXBuildFile",
            Self::Phase(PhaseKind::Sources) => "PBXSourcesBuildPhase",
            Self::Phase(PhaseKind::Frameworks) => "PBXFrameworksBuildPhase",
            Self::Phase(PhaseKind::Resources) => "PBXResourcesBuildPhase",
            Self::Configuration => "XCBuildConfiguration",
            Self::ConfigurationList => "XCConfigurationList",
        }
    }

    /// Whether entries of this kind are written on a single line.
    #[must_use]
    pub const fn is_inline(self) -> bool {
        matches!(
            self,
            Self::BuildFile | Self::FileReference | Self::ProductReference
        )
    }

    /// Attribute under which a node's children are listed, if it has any.
    #[must_use]
    pub const fn children_key(self) -> Option<&'static str> {
        match self {
            Self::Group => Some("children"),
            Self::Phase(_) => Some("files"),
            Self::Target => Some("buildPhases"),
            Self::ConfigurationList => Some("buildConfigurations"),
            Self::Project => Some("targets"),
            Self::FileReference
            | Self::BuildFile
            | Self::Configuration
            | Self::ProductReference => None,
        }
    }
}

/// A single manifest object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Identifier; immutable once assigned.
    pub id: Token,
    /// What the node describes.
    pub kind: NodeKind,
    /// Comment written after the identifier wherever the node is referenced.
    pub name: Option<String>,
    /// Attributes other than `isa` and the children list.
    pub attributes: Attributes,
    /// Ordered child identifiers, written under [`NodeKind::children_key`].
    pub children: Vec<Token>,
}

impl Node {
    /// Create a node with no attributes or children.
    #[must_use]
    pub fn new(id: Token, kind: NodeKind, name: Option<String>) -> Self {
        Self {
            id,
            kind,
            name,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    /// Builder-style children setter.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Token>) -> Self {
        self.children = children;
        self
    }
}

/// `lastKnownFileType` for a file name, by extension.
#[must_use]
pub fn file_type(name: &str) -> &'static str {
    match Utf8Path::new(name).extension() {
        Some("swift") => "sourcecode.swift",
        Some("m") => "sourcecode.c.objc",
        Some("mm") => "sourcecode.cpp.objcpp",
        Some("h") => "sourcecode.c.h",
        Some("c") => "sourcecode.c.c",
        Some("cpp" | "cc" | "cxx") => "sourcecode.cpp.cpp",
        Some("metal") => "sourcecode.metal",
        _ => "text",
    }
}

/// The file reference and its Sources membership for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNodes {
    /// `PBXFileReference` node.
    pub reference: Node,
    /// `PBXBuildFile` node pointing at [`Self::reference`].
    pub build: Node,
}

impl FileNodes {
    /// Nodes for the file `name` at `path` with explicit tokens.
    #[must_use]
    pub fn with_ids(name: &str, reference_id: Token, build_id: Token) -> Self {
        let reference = Node::new(reference_id.clone(), NodeKind::FileReference, Some(name.to_owned()))
            .with("lastKnownFileType", file_type(name))
            .with("path", name)
            .with("sourceTree", "<group>");
        let build = Node::new(
            build_id,
            NodeKind::BuildFile,
            Some(format!("{name} in {}", PhaseKind::Sources.name())),
        )
        .with("fileRef", reference_id);
        Self { reference, build }
    }

    /// Nodes for the file `name` at `path` with content-derived tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::KeyCollision`] when a derived token aliases a
    /// token already issued by `ids`.
    pub fn derive(ids: &mut IdAllocator, path: &Utf8Path, name: &str) -> Result<Self, AllocError> {
        let reference_id = ids.allocate(&file_key(path.as_str()))?;
        let build_id = ids.allocate(&build_key(path.as_str()))?;
        Ok(Self::with_ids(name, reference_id, build_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("A.swift", "sourcecode.swift")]
    #[case("Bridge.h", "sourcecode.c.h")]
    #[case("Legacy.m", "sourcecode.c.objc")]
    #[case("Mixed.mm", "sourcecode.cpp.objcpp")]
    #[case("Shader.metal", "sourcecode.metal")]
    #[case("README", "text")]
    fn file_types_follow_the_extension(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(file_type(name), expected);
    }

    #[test]
    fn build_file_points_at_its_reference() {
        let mut ids = IdAllocator::default();
        let nodes = FileNodes::derive(&mut ids, Utf8Path::new("Models/Goal.swift"), "Goal.swift")
            .expect("derive");
        assert_eq!(nodes.reference.id.as_str(), "E7195A0AA373327086BDAC8E");
        assert_eq!(nodes.build.id.as_str(), "3AA6EB784A73A6C32E855C8C");
        assert_eq!(
            nodes.build.attributes.get("fileRef"),
            Some(&Value::Ref(nodes.reference.id.clone()))
        );
        assert_eq!(nodes.build.name.as_deref(), Some("Goal.swift in Sources"));
    }

    #[test]
    fn children_keys_match_kinds() {
        assert_eq!(NodeKind::Group.children_key(), Some("children"));
        assert_eq!(NodeKind::Phase(PhaseKind::Sources).children_key(), Some("files"));
        assert_eq!(NodeKind::BuildFile.children_key(), None);
        assert!(NodeKind::ProductReference.is_inline());
        assert_eq!(NodeKind::ProductReference.isa(), "PBXFileReference");
    }
}
