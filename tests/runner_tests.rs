//! Integration tests for configuration loading through the runner.

use anyhow::{Context, Result, ensure};
use pbxgen::config::{DEFAULT_CONFIG_FILE, Scaffold};
use pbxgen::runner::load_scaffold;
use std::fs;
use std::path::Path;
use test_support::{SourceTree, display_error_chain};

#[test]
fn default_config_file_is_picked_up() -> Result<()> {
    let tree = SourceTree::new(&[])?;
    fs::write(
        tree.base().join(DEFAULT_CONFIG_FILE),
        "project:\n  name: Configured\n",
    )?;
    let scaffold = load_scaffold(tree.base(), None)?;
    ensure!(scaffold.project.name == "Configured");
    Ok(())
}

#[test]
fn explicit_config_is_resolved_against_the_base() -> Result<()> {
    let tree = SourceTree::new(&[])?;
    fs::write(tree.base().join("custom.yml"), "groups:\n  - Models\n")?;
    let scaffold = load_scaffold(tree.base(), Some(Path::new("custom.yml")))?;
    ensure!(scaffold.groups == ["Models"]);
    ensure!(scaffold.project == Scaffold::default().project);
    Ok(())
}

#[test]
fn malformed_config_reports_the_file() -> Result<()> {
    let tree = SourceTree::new(&[])?;
    fs::write(tree.base().join(DEFAULT_CONFIG_FILE), "project: [unclosed\n")?;
    let err = load_scaffold(tree.base(), None)
        .err()
        .context("malformed configuration must fail")?;
    let chain = display_error_chain(err.as_ref());
    ensure!(chain.contains("loading configuration"), "{chain}");
    ensure!(chain.contains(DEFAULT_CONFIG_FILE), "{chain}");
    Ok(())
}
