//! Group tree planning.
//!
//! Groups are planned as directory paths before any node is created. The
//! empty path stands for the source root group.

use crate::config::GroupLayout;
use crate::scan::SourceFiles;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;

/// Directory tree of the groups to emit.
#[derive(Debug, Default)]
pub(super) struct GroupTree {
    children: IndexMap<Utf8PathBuf, Vec<Utf8PathBuf>>,
}

impl GroupTree {
    /// Plan the tree for `files` under `layout`.
    pub(super) fn plan(layout: &GroupLayout, files: &SourceFiles) -> Self {
        let dirs: Vec<Utf8PathBuf> = match layout {
            GroupLayout::Declared(declared) => close_over_ancestors(declared.iter()),
            GroupLayout::Synthesized => {
                let sorted: BTreeSet<Utf8PathBuf> = files
                    .keys()
                    .filter_map(|path| path.parent())
                    .flat_map(ancestors)
                    .collect();
                sorted.into_iter().collect()
            }
        };
        let mut tree = Self::default();
        tree.children.insert(Utf8PathBuf::new(), Vec::new());
        for dir in dirs {
            let parent = dir.parent().map(Utf8Path::to_path_buf).unwrap_or_default();
            tree.children.entry(parent).or_default().push(dir.clone());
            tree.children.entry(dir).or_default();
        }
        tree
    }

    /// Whether `dir` is planned as a group. The root always is.
    pub(super) fn contains(&self, dir: &Utf8Path) -> bool {
        self.children.contains_key(dir)
    }

    /// Planned subgroups of `dir`.
    pub(super) fn subgroups(&self, dir: &Utf8Path) -> &[Utf8PathBuf] {
        self.children.get(dir).map_or(&[], Vec::as_slice)
    }

    /// Every non-root group in pre-order.
    pub(super) fn preorder(&self) -> Vec<&Utf8Path> {
        let mut out = Vec::new();
        self.visit(Utf8Path::new(""), &mut out);
        out
    }

    fn visit<'a>(&'a self, dir: &Utf8Path, out: &mut Vec<&'a Utf8Path>) {
        for child in self.subgroups(dir) {
            out.push(child.as_path());
            self.visit(child, out);
        }
    }
}

/// Non-empty ancestors of `dir` from the outermost down to `dir` itself.
fn ancestors(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut chain: Vec<Utf8PathBuf> = dir
        .ancestors()
        .filter(|ancestor| !ancestor.as_str().is_empty())
        .map(Utf8Path::to_path_buf)
        .collect();
    chain.reverse();
    chain
}

fn close_over_ancestors<'a>(declared: impl Iterator<Item = &'a Utf8PathBuf>) -> Vec<Utf8PathBuf> {
    let mut seen = IndexSet::new();
    for dir in declared {
        for ancestor in ancestors(dir) {
            seen.insert(ancestor);
        }
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> SourceFiles {
        paths
            .iter()
            .map(|path| {
                let path = Utf8PathBuf::from(*path);
                let name = path.file_name().unwrap_or_default().to_owned();
                (path, name)
            })
            .collect()
    }

    #[test]
    fn synthesized_tree_includes_intermediate_directories() {
        let tree = GroupTree::plan(
            &GroupLayout::Synthesized,
            &files(&["Views/Auth/Login.swift", "App.swift", "Models/User.swift"]),
        );
        let order: Vec<_> = tree.preorder().iter().map(|dir| dir.as_str()).collect();
        assert_eq!(order, ["Models", "Views", "Views/Auth"]);
    }

    #[test]
    fn declared_tree_keeps_declaration_order() {
        let declared = vec![
            Utf8PathBuf::from("Theme"),
            Utf8PathBuf::from("Views/Auth"),
            Utf8PathBuf::from("App"),
        ];
        let tree = GroupTree::plan(&GroupLayout::Declared(declared), &SourceFiles::new());
        let order: Vec<_> = tree.preorder().iter().map(|dir| dir.as_str()).collect();
        assert_eq!(order, ["Theme", "Views", "Views/Auth", "App"]);
        assert!(tree.contains(Utf8Path::new("")));
        assert!(!tree.contains(Utf8Path::new("Models")));
    }
}
