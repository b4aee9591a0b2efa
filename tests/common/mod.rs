//! Shared helpers for integration tests.
//!
//! Integration tests under `tests/` compile as independent crates. This module
//! is included via `mod common;` in individual test files to share fixtures and
//! helpers while keeping test modules small and avoiding duplication.

use anyhow::{Context, Result};
use pbxgen::config::Scaffold;
use pbxgen::graph::Graph;
use pbxgen::runner::render_project;
use test_support::SourceTree;

/// Scan `tree` and render its manifest under `scaffold`.
pub fn generate(tree: &SourceTree, scaffold: &Scaffold) -> Result<(Graph, String)> {
    render_project(tree.root(), scaffold)
        .with_context(|| format!("generate manifest for {}", tree.root()))
}

/// Number of entries in `text` whose `isa` is `isa`.
pub fn count_isa(text: &str, isa: &str) -> usize {
    text.matches(&format!("isa = {isa};")).count()
}
