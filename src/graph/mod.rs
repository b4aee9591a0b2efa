//! Project graph.
//!
//! This module defines the node graph a manifest is rendered from. The graph
//! is a flat table of [`Node`]s keyed by [`Token`]; nodes refer to each other
//! only through tokens, so the table can be serialised in any section order
//! without chasing pointers. Insertion order is preserved and is the order in
//! which nodes appear within their section.
//!
//! # Examples
//!
//! ```
//! use pbxgen::config::Scaffold;
//! use pbxgen::graph::Graph;
//! use pbxgen::scan::SourceFiles;
//!
//! let mut files = SourceFiles::new();
//! files.insert("A/x.swift".into(), "x.swift".into());
//! let graph = Graph::build(&files, &Scaffold::default()).expect("graph");
//! assert_eq!(graph.root(), &Scaffold::default().ids.project);
//! ```

mod build;
mod groups;
mod node;

pub use node::{Attributes, FileNodes, Node, NodeKind, PhaseKind, Value, file_type};

use crate::token::{AllocError, Token};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while assembling a [`Graph`].
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// Two nodes were given the same identifier.
    #[error("node {id} is defined more than once")]
    #[diagnostic(code(pbxgen::graph::duplicate_id))]
    DuplicateId {
        /// Identifier that was reused.
        id: Token,
    },
    /// A derived identifier aliases another key.
    #[error(transparent)]
    #[diagnostic(transparent)]
    KeyCollision(#[from] AllocError),
}

/// Cross-referenced manifest nodes plus the root project object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    objects: IndexMap<Token, Node>,
    root: Token,
    omitted: Vec<Utf8PathBuf>,
}

impl Graph {
    /// Create an empty graph whose root object will be `root`.
    #[must_use]
    pub fn new(root: Token) -> Self {
        Self {
            objects: IndexMap::new(),
            root,
            omitted: Vec::new(),
        }
    }

    /// Add `node` to the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] when a node with the same
    /// identifier already exists.
    pub fn insert(&mut self, node: Node) -> Result<(), GraphError> {
        if self.objects.contains_key(&node.id) {
            return Err(GraphError::DuplicateId { id: node.id });
        }
        self.objects.insert(node.id.clone(), node);
        Ok(())
    }

    /// Look up a node by identifier.
    #[must_use]
    pub fn get(&self, id: &Token) -> Option<&Node> {
        self.objects.get(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.objects.values()
    }

    /// Identifier of the project object.
    #[must_use]
    pub const fn root(&self) -> &Token {
        &self.root
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Source files left out of every group because their directory is not
    /// a declared group. They are still compiled.
    #[must_use]
    pub fn omitted(&self) -> &[Utf8PathBuf] {
        &self.omitted
    }

    fn omit(&mut self, path: &Utf8Path) {
        self.omitted.push(path.to_path_buf());
    }
}
