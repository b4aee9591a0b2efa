//! Integration tests for manifest generation from real source trees.

use anyhow::{Context, Result, ensure};
use camino::Utf8PathBuf;
use pbxgen::config::{self, Scaffold};
use pbxgen::graph::NodeKind;
use pbxgen::token::{DigestAlgorithm, file_key, group_key};
use rstest::rstest;
use test_support::SourceTree;

mod common;

use common::{count_isa, generate};

const WORKED_EXAMPLE: &[&str] = &["A/x.swift", "A/y.swift", "B/z.swift"];

#[test]
fn worked_example_produces_expected_sections() -> Result<()> {
    let tree = SourceTree::new(WORKED_EXAMPLE)?;
    let (graph, text) = generate(&tree, &Scaffold::default())?;

    ensure!(text.starts_with("// !$*UTF8*$!\n"), "missing header");
    ensure!(count_isa(&text, "PBXBuildFile") == 3);
    ensure!(text.matches("lastKnownFileType = sourcecode.swift;").count() == 3);
    ensure!(text.contains("x.swift in Sources"));

    let ids = Scaffold::default().ids;
    let sources = graph.get(&ids.sources_phase).context("sources phase")?;
    ensure!(sources.children.len() == 3);

    let group = |dir: &str| DigestAlgorithm::Md5.token(&group_key(dir));
    let root = graph.get(&ids.source_group).context("source group")?;
    ensure!(root.children == vec![group("A"), group("B")]);
    let a = graph.get(&group("A")).context("group A")?;
    ensure!(a.children.len() == 2);
    let b = graph.get(&group("B")).context("group B")?;
    ensure!(b.children == vec![DigestAlgorithm::Md5.token(&file_key("B/z.swift"))]);
    Ok(())
}

#[test]
fn identical_trees_render_identical_bytes() -> Result<()> {
    let first = SourceTree::new(WORKED_EXAMPLE)?;
    let second = SourceTree::new(WORKED_EXAMPLE)?;
    let (_, one) = generate(&first, &Scaffold::default())?;
    let (_, two) = generate(&second, &Scaffold::default())?;
    ensure!(one == two, "generation differs between identical trees");
    Ok(())
}

#[test]
fn adding_a_file_keeps_existing_entries() -> Result<()> {
    let tree = SourceTree::new(WORKED_EXAMPLE)?;
    let (_, before) = generate(&tree, &Scaffold::default())?;
    tree.add("A/w.swift")?;
    let (_, after) = generate(&tree, &Scaffold::default())?;
    for line in before.lines().filter(|line| line.contains(".swift")) {
        ensure!(
            after.lines().any(|candidate| candidate == line),
            "entry changed after adding a file: {line}"
        );
    }
    ensure!(after.contains("w.swift in Sources"));
    Ok(())
}

#[test]
fn excluded_and_foreign_files_are_not_scanned() -> Result<()> {
    let tree = SourceTree::new(&[
        "App.swift",
        "README.md",
        "build/Generated.swift",
        ".hidden/Secret.swift",
    ])?;
    let (graph, text) = generate(&tree, &Scaffold::default())?;
    let references = graph
        .nodes()
        .filter(|node| node.kind == NodeKind::FileReference)
        .count();
    ensure!(references == 1, "expected only App.swift, got {references}");
    ensure!(!text.contains("Generated.swift"));
    ensure!(!text.contains("README.md"));
    Ok(())
}

#[test]
fn declared_groups_leave_other_files_out_of_the_navigator() -> Result<()> {
    let tree = SourceTree::new(WORKED_EXAMPLE)?;
    let scaffold = config::from_str("groups:\n  - A\n")?;
    let (graph, text) = generate(&tree, &scaffold)?;
    ensure!(
        graph.omitted() == [Utf8PathBuf::from("B/z.swift")],
        "omitted {:?}",
        graph.omitted()
    );
    ensure!(count_isa(&text, "PBXBuildFile") == 3, "omitted files are still compiled");
    let group = DigestAlgorithm::Md5.token(&group_key("B"));
    ensure!(graph.get(&group).is_none(), "undeclared directory became a group");
    Ok(())
}

#[rstest]
#[case(DigestAlgorithm::Md5, "md5")]
#[case(DigestAlgorithm::Sha256, "sha256")]
fn configured_digest_selects_the_token_algorithm(
    #[case] algorithm: DigestAlgorithm,
    #[case] name: &str,
) -> Result<()> {
    let tree = SourceTree::new(&["App.swift"])?;
    let scaffold = config::from_str(&format!("source:\n  digest: {name}\n"))?;
    let (_, text) = generate(&tree, &scaffold)?;
    let expected = algorithm.token(&file_key("App.swift"));
    ensure!(
        text.contains(&format!("{expected} /* App.swift */")),
        "token {expected} missing"
    );
    Ok(())
}

#[test]
fn project_name_flows_into_the_scaffold() -> Result<()> {
    let tree = SourceTree::new(&["App.swift"])?;
    let scaffold = Scaffold::default().with_name("Demo");
    let (_, text) = generate(&tree, &scaffold)?;
    ensure!(text.contains("Demo.app"));
    ensure!(text.contains("PRODUCT_NAME"));
    Ok(())
}
