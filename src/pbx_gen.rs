//! Project manifest generator.
//!
//! This module converts a [`crate::graph::Graph`] into the textual property
//! list format of `project.pbxproj`. Sections are written in a fixed order,
//! nodes keep graph insertion order within a section and attributes are
//! sorted by key, so identical graphs always serialise to identical bytes.
//!
//! The entry and list-item renderers are public so the patcher can splice
//! new entries that are indistinguishable from generated ones.

use crate::graph::{Graph, Node, Value};
use crate::token::Token;
use indexmap::IndexMap;
use itertools::Itertools;
use miette::Diagnostic;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter, Write};
use thiserror::Error;

/// First line of every manifest.
pub const HEADER: &str = "// !$*UTF8*$!";

/// Manifest format version written in the preamble.
pub const OBJECT_VERSION: u32 = 56;

/// Section order used by the IDE itself.
pub const SECTION_ORDER: [&str; 10] = [
    "PBXBuildFile",
    "PBXFileReference",
    "PBXFrameworksBuildPhase",
    "PBXGroup",
    "PBXNativeTarget",
    "PBXProject",
    "PBXResourcesBuildPhase",
    "PBXSourcesBuildPhase",
    "XCBuildConfiguration",
    "XCConfigurationList",
];

/// Indentation depth of entries inside the `objects` dictionary.
pub const ENTRY_DEPTH: usize = 2;

/// Errors raised while rendering a manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    /// A node refers to an identifier that is not in the graph.
    #[error("{owner} refers to unknown node {id}")]
    #[diagnostic(code(pbxgen::generate::dangling_reference))]
    DanglingReference {
        /// Node (or `rootObject`) holding the reference.
        owner: String,
        /// Identifier that could not be resolved.
        id: Token,
    },
    /// Writing to the output buffer failed.
    #[error("failed to format manifest")]
    #[diagnostic(code(pbxgen::generate::format))]
    Format(#[from] fmt::Error),
}

/// Resolves identifiers to nodes while rendering.
pub trait NodeLookup {
    /// The node with identifier `id`, if known.
    fn node(&self, id: &Token) -> Option<&Node>;
}

impl NodeLookup for Graph {
    fn node(&self, id: &Token) -> Option<&Node> {
        self.get(id)
    }
}

impl NodeLookup for [Node] {
    fn node(&self, id: &Token) -> Option<&Node> {
        self.iter().find(|node| &node.id == id)
    }
}

/// Render `graph` as manifest text.
///
/// # Errors
///
/// Returns [`GenerateError::DanglingReference`] when any node, or the root
/// object, refers to an identifier missing from the graph.
pub fn generate(graph: &Graph) -> Result<String, GenerateError> {
    for node in graph.nodes() {
        check_references(node, graph)?;
    }
    let root = graph
        .get(graph.root())
        .ok_or_else(|| GenerateError::DanglingReference {
            owner: "rootObject".into(),
            id: graph.root().clone(),
        })?;

    let mut out = String::new();
    writeln!(out, "{HEADER}")?;
    writeln!(out, "{{")?;
    writeln!(out, "\tarchiveVersion = 1;")?;
    writeln!(out, "\tclasses = {{\n\t}};")?;
    writeln!(out, "\tobjectVersion = {OBJECT_VERSION};")?;
    writeln!(out, "\tobjects = {{")?;

    let sections = graph.nodes().into_group_map_by(|node| node.kind.isa());
    for isa in SECTION_ORDER {
        // Empty sections are still written: the patcher anchors on them.
        let nodes = sections.get(isa).map(Vec::as_slice).unwrap_or_default();
        writeln!(out)?;
        writeln!(out, "/* Begin {isa} section */")?;
        for node in nodes {
            write!(out, "{}", Entry { node, lookup: graph })?;
        }
        writeln!(out, "/* End {isa} section */")?;
    }

    writeln!(out, "\t}};")?;
    writeln!(
        out,
        "\trootObject = {};",
        DisplayRef {
            id: &root.id,
            lookup: graph
        }
    )?;
    writeln!(out, "}}")?;
    Ok(out)
}

/// Render one node as a complete `objects` entry, including the trailing
/// newline.
///
/// # Errors
///
/// Returns [`GenerateError::DanglingReference`] when the node refers to an
/// identifier `lookup` cannot resolve.
pub fn render_entry<L: NodeLookup + ?Sized>(node: &Node, lookup: &L) -> Result<String, GenerateError> {
    check_references(node, lookup)?;
    let mut out = String::new();
    write!(out, "{}", Entry { node, lookup })?;
    Ok(out)
}

/// Render `id` as an item of a list nested at `depth`, e.g. a member of a
/// build phase's `files`.
///
/// # Errors
///
/// Returns [`GenerateError::DanglingReference`] when `lookup` cannot
/// resolve `id`.
pub fn render_list_item<L: NodeLookup + ?Sized>(
    id: &Token,
    depth: usize,
    lookup: &L,
) -> Result<String, GenerateError> {
    if lookup.node(id).is_none() {
        return Err(GenerateError::DanglingReference {
            owner: "list".into(),
            id: id.clone(),
        });
    }
    let mut out = String::new();
    writeln!(out, "{}{},", Indent(depth), DisplayRef { id, lookup })?;
    Ok(out)
}

/// Quote `value` unless it consists solely of characters that may appear
/// bare in a manifest.
#[must_use]
pub fn quote(value: &str) -> Cow<'_, str> {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.'));
    if bare {
        return Cow::Borrowed(value);
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

fn check_references<L: NodeLookup + ?Sized>(node: &Node, lookup: &L) -> Result<(), GenerateError> {
    let mut pending: Vec<&Value> = node.attributes.values().collect();
    let mut refs: Vec<&Token> = node.children.iter().collect();
    while let Some(value) = pending.pop() {
        match value {
            Value::Str(_) => {}
            Value::Ref(id) => refs.push(id),
            Value::List(items) => pending.extend(items),
            Value::Map(map) => pending.extend(map.values()),
        }
    }
    match refs.into_iter().find(|id| lookup.node(id).is_none()) {
        Some(id) => Err(GenerateError::DanglingReference {
            owner: node.id.to_string(),
            id: id.clone(),
        }),
        None => Ok(()),
    }
}

/// Attributes of `node` in output order: `isa` first, then sorted keys with
/// the children list merged in.
fn ordered_attributes(node: &Node) -> Vec<(&str, Cow<'_, Value>)> {
    let mut attrs: Vec<(&str, Cow<'_, Value>)> = node
        .attributes
        .iter()
        .map(|(key, value)| (key.as_str(), Cow::Borrowed(value)))
        .collect();
    if let Some(key) = node.kind.children_key() {
        let children = node.children.iter().cloned().map(Value::Ref).collect();
        attrs.push((key, Cow::Owned(Value::List(children))));
    }
    attrs.sort_by(|(a, _), (b, _)| a.cmp(b));
    attrs.insert(0, ("isa", Cow::Owned(Value::from(node.kind.isa()))));
    attrs
}

struct Indent(usize);

impl Display for Indent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_char('\t')?;
        }
        Ok(())
    }
}

/// Wrapper to display an identifier followed by its node's comment.
struct DisplayRef<'a, L: ?Sized> {
    id: &'a Token,
    lookup: &'a L,
}

impl<L: NodeLookup + ?Sized> Display for DisplayRef<'_, L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(name) = self.lookup.node(self.id).and_then(|node| node.name.as_deref()) {
            write!(f, " /* {name} */")?;
        }
        Ok(())
    }
}

/// Wrapper to display a complete `objects` entry.
struct Entry<'a, L: ?Sized> {
    node: &'a Node,
    lookup: &'a L,
}

impl<L: NodeLookup + ?Sized> Display for Entry<'_, L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let head = DisplayRef {
            id: &self.node.id,
            lookup: &OnlySelf(self.node),
        };
        let attrs = ordered_attributes(self.node);
        if self.node.kind.is_inline() {
            write!(f, "{}{head} = {{", Indent(ENTRY_DEPTH))?;
            for (key, value) in &attrs {
                write!(f, "{} = ", quote(key))?;
                self.inline_value(f, value)?;
                f.write_str("; ")?;
            }
            return writeln!(f, "}};");
        }
        writeln!(f, "{}{head} = {{", Indent(ENTRY_DEPTH))?;
        for (key, value) in &attrs {
            write!(f, "{}{} = ", Indent(ENTRY_DEPTH + 1), quote(key))?;
            self.value(f, value, ENTRY_DEPTH + 1)?;
            writeln!(f, ";")?;
        }
        writeln!(f, "{}}};", Indent(ENTRY_DEPTH))
    }
}

impl<L: NodeLookup + ?Sized> Entry<'_, L> {
    fn value(&self, f: &mut Formatter<'_>, value: &Value, depth: usize) -> fmt::Result {
        match value {
            Value::Str(text) => f.write_str(&quote(text)),
            Value::Ref(id) => write!(f, "{}", DisplayRef { id, lookup: self.lookup }),
            Value::List(items) => {
                writeln!(f, "(")?;
                for item in items {
                    write!(f, "{}", Indent(depth + 1))?;
                    self.value(f, item, depth + 1)?;
                    writeln!(f, ",")?;
                }
                write!(f, "{})", Indent(depth))
            }
            Value::Map(map) => {
                writeln!(f, "{{")?;
                for (key, item) in sorted(map) {
                    write!(f, "{}{} = ", Indent(depth + 1), quote(key))?;
                    self.value(f, item, depth + 1)?;
                    writeln!(f, ";")?;
                }
                write!(f, "{}}}", Indent(depth))
            }
        }
    }

    fn inline_value(&self, f: &mut Formatter<'_>, value: &Value) -> fmt::Result {
        match value {
            Value::Str(text) => f.write_str(&quote(text)),
            Value::Ref(id) => write!(f, "{}", DisplayRef { id, lookup: self.lookup }),
            Value::List(items) => {
                f.write_str("(")?;
                for item in items {
                    self.inline_value(f, item)?;
                    f.write_str(", ")?;
                }
                f.write_str(")")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (key, item) in sorted(map) {
                    write!(f, "{} = ", quote(key))?;
                    self.inline_value(f, item)?;
                    f.write_str("; ")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Lookup that only knows the node being written, so an entry header uses
/// that node's own comment.
struct OnlySelf<'a>(&'a Node);

impl NodeLookup for OnlySelf<'_> {
    fn node(&self, id: &Token) -> Option<&Node> {
        (&self.0.id == id).then_some(self.0)
    }
}

fn sorted(map: &IndexMap<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    map.iter().sorted_by(|(a, _), (b, _)| a.cmp(b))
}
